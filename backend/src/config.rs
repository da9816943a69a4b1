//! Configuration for the Stock Control Platform.
//!
//! Layered loading: in-code defaults, then an optional
//! `config/{environment}.toml`, then `STOCK__` environment overrides.

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Low stock alerting configuration
    pub alerts: AlertsConfig,

    /// Revoked token cleanup configuration
    pub auth_cleanup: AuthCleanupConfig,

    /// Transactional mail provider configuration
    pub mail: MailConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertsConfig {
    /// Minimum quantity applied when a product or component is created
    /// without an explicit minimum
    pub default_min_quantity: i64,

    /// Whether low stock alerts are also sent by email
    pub low_stock_email_enabled: bool,

    /// Cooldown between alert emails for the same subject, in seconds
    pub email_cooldown_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthCleanupConfig {
    /// Interval between purges of expired revoked tokens, in seconds
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// Mail provider HTTP endpoint; empty disables email alerts
    pub api_endpoint: String,

    /// Mail provider API key
    pub api_key: String,

    /// Sender address for alert emails
    pub from_address: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("STOCK_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.token_expiry", 86400)?
            .set_default("alerts.default_min_quantity", 10)?
            .set_default("alerts.low_stock_email_enabled", true)?
            .set_default("alerts.email_cooldown_secs", 360)?
            .set_default("auth_cleanup.interval_secs", 86400)?
            .set_default("mail.api_endpoint", "")?
            .set_default("mail.api_key", "")?
            .set_default("mail.from_address", "alerts@stockcontrol.app")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (STOCK_ prefix)
            .add_source(
                Environment::with_prefix("STOCK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
