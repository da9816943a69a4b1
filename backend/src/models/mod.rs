//! Domain types for the Stock Control Platform backend
//!
//! Re-exports the pure models from the shared crate; persistence row types
//! live next to the services that query them.

pub use shared::models::*;
