//! External API integrations

pub mod mail;

pub use mail::MailClient;
