//! Business logic services for the stock control platform

pub mod auth;
pub mod category;
pub mod enterprise;
pub mod ledger;
pub mod movement;
pub mod notification;
pub mod product;
pub mod reporting;
pub mod sector;
pub mod stock;
pub mod supplier;
pub mod user;

pub use auth::AuthService;
pub use notification::NotificationService;
pub use reporting::ReportingService;
