//! Stock area and stock component HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::movement::{MovementService, MoveStockInput, StockMovement};
use crate::services::stock::{
    ComponentSummary, CreateComponentInput, CreateStockInput, Stock, StockComponent, StockDetail,
    StockService, StockSummary, UpdateComponentInput, UpdateStockInput,
};
use crate::services::NotificationService;
use crate::AppState;
use shared::models::SubjectKind;
use shared::types::{PaginatedResponse, Pagination};

#[derive(Deserialize)]
pub struct StockListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Deserialize)]
pub struct ComponentListQuery {
    pub stock_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

// ============================================================================
// Stock areas
// ============================================================================

/// List stock areas
pub async fn list_stocks(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<StockListQuery>,
) -> Result<Json<PaginatedResponse<StockSummary>>, AppError> {
    let pagination = Pagination::new(query.page, query.per_page);
    let service = StockService::new(state.db.clone(), &state.config);

    let (stocks, total) = service
        .list_stocks(current_user.0.enterprise_id, pagination)
        .await?;

    Ok(Json(PaginatedResponse::new(stocks, pagination, total)))
}

/// Get a stock area with its components
pub async fn get_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(stock_id): Path<Uuid>,
) -> Result<Json<StockDetail>, AppError> {
    let service = StockService::new(state.db.clone(), &state.config);
    let stock = service
        .get_stock(current_user.0.enterprise_id, stock_id)
        .await?;

    Ok(Json(stock))
}

/// Create a stock area
pub async fn create_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateStockInput>,
) -> Result<(StatusCode, Json<Stock>), AppError> {
    let service = StockService::new(state.db.clone(), &state.config);
    let stock = service
        .create_stock(current_user.0.enterprise_id, input)
        .await?;

    Ok((StatusCode::CREATED, Json(stock)))
}

/// Update a stock area
pub async fn update_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(stock_id): Path<Uuid>,
    Json(input): Json<UpdateStockInput>,
) -> Result<Json<Stock>, AppError> {
    let service = StockService::new(state.db.clone(), &state.config);
    let stock = service
        .update_stock(current_user.0.enterprise_id, stock_id, input)
        .await?;

    Ok(Json(stock))
}

/// Delete a stock area and its components
pub async fn delete_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(stock_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let service = StockService::new(state.db.clone(), &state.config);
    service
        .delete_stock(current_user.0.enterprise_id, stock_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Stock components
// ============================================================================

/// List stock components, optionally for one stock area
pub async fn list_components(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ComponentListQuery>,
) -> Result<Json<PaginatedResponse<ComponentSummary>>, AppError> {
    let pagination = Pagination::new(query.page, query.per_page);
    let service = StockService::new(state.db.clone(), &state.config);

    let (components, total) = service
        .list_components(current_user.0.enterprise_id, query.stock_id, pagination)
        .await?;

    Ok(Json(PaginatedResponse::new(components, pagination, total)))
}

/// List components with stock on hand
pub async fn list_available_components(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<Vec<ComponentSummary>>, AppError> {
    let service = StockService::new(state.db.clone(), &state.config);
    let components = service
        .available_components(current_user.0.enterprise_id)
        .await?;

    Ok(Json(components))
}

/// Get a stock component
pub async fn get_component(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(component_id): Path<Uuid>,
) -> Result<Json<ComponentSummary>, AppError> {
    let service = StockService::new(state.db.clone(), &state.config);
    let component = service
        .get_component(current_user.0.enterprise_id, component_id)
        .await?;

    Ok(Json(component))
}

/// Create a stock component
pub async fn create_component(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateComponentInput>,
) -> Result<(StatusCode, Json<StockComponent>), AppError> {
    let service = StockService::new(state.db.clone(), &state.config);
    let component = service
        .create_component(current_user.0.enterprise_id, input)
        .await?;

    Ok((StatusCode::CREATED, Json(component)))
}

/// Update component attributes
pub async fn update_component(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(component_id): Path<Uuid>,
    Json(input): Json<UpdateComponentInput>,
) -> Result<Json<StockComponent>, AppError> {
    let service = StockService::new(state.db.clone(), &state.config);
    let component = service
        .update_component(current_user.0.enterprise_id, component_id, input)
        .await?;

    Ok(Json(component))
}

/// Delete a stock component
pub async fn delete_component(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(component_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let service = StockService::new(state.db.clone(), &state.config);
    service
        .delete_component(
            current_user.0.enterprise_id,
            component_id,
            &current_user.0.name,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Apply a quantity movement to a component
pub async fn move_component_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(component_id): Path<Uuid>,
    Json(input): Json<MoveStockInput>,
) -> Result<Json<StockMovement>, AppError> {
    let notifier = NotificationService::new(state.db.clone(), state.events.clone(), &state.config);
    let service = MovementService::new(state.db.clone(), notifier);

    let movement = service
        .apply(
            current_user.0.enterprise_id,
            SubjectKind::Component,
            component_id,
            input,
            &current_user.0.name,
        )
        .await?;

    Ok(Json(movement))
}
