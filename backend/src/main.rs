//! Stock Control Platform - Backend Server
//!
//! Multi-tenant inventory service: quantity movements with a full audit
//! ledger, composite product availability, low stock alerting, and
//! movement reporting.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod middleware;
mod models;
mod realtime;
mod routes;
mod services;

pub use config::Config;

use realtime::EventBroadcaster;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub events: EventBroadcaster,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!(environment = %config.environment, "Starting Stock Control Server");

    let db_pool = connect_database(&config).await?;

    if config.environment == "development" {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
    }

    let state = AppState {
        db: db_pool.clone(),
        config: Arc::new(config.clone()),
        events: EventBroadcaster::default(),
    };

    // Background purge of expired revoked tokens, stopped on shutdown
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let cleanup_handle = services::auth::spawn_revoked_token_cleanup(
        db_pool,
        Duration::from_secs(config.auth_cleanup.interval_secs),
        shutdown_rx,
    );

    let app = create_app(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the cleanup task once the server has drained
    let _ = shutdown_tx.send(true);
    if let Err(err) = cleanup_handle.await {
        tracing::warn!("Token cleanup task did not stop cleanly: {}", err);
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn connect_database(config: &Config) -> anyhow::Result<sqlx::PgPool> {
    tracing::info!("Connecting to database");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;
    tracing::info!("Database connection established");
    Ok(pool)
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(plain_health))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}

/// Root endpoint
async fn root() -> &'static str {
    "Stock Control Platform API v1.0"
}

/// Plain health endpoint for load balancer probes
async fn plain_health() -> &'static str {
    "OK"
}
