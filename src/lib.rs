pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod services;
pub mod session;
pub mod transport;

pub use cache::{Mutation, QueryCache, QueryKey, QuerySnapshot, QueryStatus};
pub use client::{AsmounClient, QueryData};
pub use config::Config;
pub use error::{ApiError, ErrorKind};
pub use session::{Session, SessionStore};
pub use transport::{HttpTransport, Transport};
