//! Canonical domain records shared by the normalizer, services and cache.
//!
//! Field names serialize in the canonical camelCase shape; keys the client
//! does not model are preserved in each record's `extra` map.

pub mod activity;
pub mod reservation;
pub mod user;

pub use activity::*;
pub use reservation::*;
pub use user::*;
