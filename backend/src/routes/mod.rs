//! Route definitions for the stock control platform

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (register/login public, logout protected)
        .nest("/auth", auth_routes(state.clone()))
        // Protected routes - enterprise profile
        .nest("/enterprise", enterprise_routes(state.clone()))
        // Protected routes - team members
        .nest("/users", user_routes(state.clone()))
        // Protected routes - sectors
        .nest("/sectors", sector_routes(state.clone()))
        // Protected routes - stock areas
        .nest("/stocks", stock_routes(state.clone()))
        // Protected routes - stock components
        .nest("/stock-components", component_routes(state.clone()))
        // Protected routes - products
        .nest("/products", product_routes(state.clone()))
        // Protected routes - ledger and reports
        .nest("/stock-history", history_routes(state.clone()))
        // Protected routes - notifications
        .nest("/notifications", notification_routes(state.clone()))
        // Protected routes - categories
        .nest("/categories", category_routes(state.clone()))
        // Protected routes - suppliers
        .nest("/suppliers", supplier_routes(state.clone()))
        // Protected route - realtime notification stream
        .merge(realtime_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(handlers::logout))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .merge(protected)
}

/// Enterprise profile routes (protected)
fn enterprise_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::get_enterprise).put(handlers::update_enterprise),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Team member routes (protected, admin checks in handlers)
fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/:user_id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Sector routes (protected)
fn sector_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sectors).post(handlers::create_sector))
        .route(
            "/:sector_id",
            get(handlers::get_sector)
                .put(handlers::update_sector)
                .delete(handlers::delete_sector),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Stock area routes (protected)
fn stock_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stocks).post(handlers::create_stock))
        .route(
            "/:stock_id",
            get(handlers::get_stock)
                .put(handlers::update_stock)
                .delete(handlers::delete_stock),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Stock component routes (protected)
fn component_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_components).post(handlers::create_component),
        )
        .route("/available", get(handlers::list_available_components))
        .route(
            "/:component_id",
            get(handlers::get_component)
                .put(handlers::update_component)
                .delete(handlers::delete_component),
        )
        .route("/:component_id/stock", put(handlers::move_component_stock))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Product routes (protected)
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:product_id/stock", put(handlers::move_product_stock))
        .route(
            "/:product_id/availability",
            get(handlers::get_product_availability),
        )
        .route(
            "/:product_id/components",
            get(handlers::list_product_components).post(handlers::add_product_component),
        )
        .route(
            "/:product_id/components/:component_id",
            delete(handlers::remove_product_component),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Ledger and report routes (protected)
fn history_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stock_history))
        .route("/report/daily", get(handlers::get_daily_report))
        .route("/report/monthly", get(handlers::get_monthly_report))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Notification routes (protected)
fn notification_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/unread-count", get(handlers::get_unread_count))
        .route(
            "/:notification_id/read",
            post(handlers::mark_notification_read),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Category routes (protected)
fn category_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/:category_id",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Supplier routes (protected)
fn supplier_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route(
            "/:supplier_id",
            put(handlers::update_supplier).delete(handlers::delete_supplier),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Realtime notification stream (protected)
fn realtime_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/realtime", get(handlers::realtime_events))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
