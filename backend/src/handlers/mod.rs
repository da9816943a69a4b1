//! HTTP handlers for the stock control platform

pub mod auth;
pub mod category;
pub mod enterprise;
pub mod health;
pub mod ledger;
pub mod notification;
pub mod product;
pub mod realtime;
pub mod sector;
pub mod stock;
pub mod supplier;
pub mod user;

pub use auth::*;
pub use category::*;
pub use enterprise::*;
pub use health::*;
pub use ledger::*;
pub use notification::*;
pub use product::*;
pub use realtime::*;
pub use sector::*;
pub use stock::*;
pub use supplier::*;
pub use user::*;
