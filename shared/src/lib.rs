//! Shared domain logic for the Stock Control Platform
//!
//! This crate holds the pure parts of the platform: movement arithmetic,
//! recipe availability math, report aggregation and validation. The backend
//! layers persistence and HTTP on top of these types.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
