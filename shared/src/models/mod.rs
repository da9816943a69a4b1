//! Domain models for the Stock Control Platform

mod ledger;
mod notification;
mod product;
mod reporting;
mod user;

pub use ledger::*;
pub use notification::*;
pub use product::*;
pub use reporting::*;
pub use user::*;
