//! Domain services, one per backend resource.
//!
//! Each call is exactly one round trip through the [`Transport`]; results
//! are normalized before they are returned. Services neither cache nor
//! retry: caching lives in [`crate::cache`], and errors propagate as-is.
//!
//! [`Transport`]: crate::transport::Transport

pub mod activity;
pub mod auth;
pub mod reservation;

pub use activity::ActivityService;
pub use auth::AuthService;
pub use reservation::ReservationService;
