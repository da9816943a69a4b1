//! Product management HTTP handlers

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
use crate::services::product::{
    ComponentRequirementInput, CreateProductInput, Product, ProductAvailability,
    ProductComponentLink, ProductDetail, ProductFilter, ProductService, UpdateProductInput,
};
use crate::services::NotificationService;
use crate::AppState;
use shared::models::SubjectKind;
use shared::types::{PaginatedResponse, Pagination};

#[derive(Deserialize)]
pub struct ProductListQuery {
    pub sector_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List products with optional filters
pub async fn list_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<PaginatedResponse<Product>>, AppError> {
    let pagination = Pagination::new(query.page, query.per_page);
    let filter = ProductFilter {
        sector_id: query.sector_id,
        category_id: query.category_id,
        search: query.search,
    };

    let service = ProductService::new(state.db.clone(), &state.config);
    let (products, total) = service
        .list(current_user.0.enterprise_id, &filter, pagination)
        .await?;

    Ok(Json(PaginatedResponse::new(products, pagination, total)))
}

/// Get a product with its recipe and availability
pub async fn get_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductDetail>, AppError> {
    let service = ProductService::new(state.db.clone(), &state.config);
    let product = service
        .get_detail(current_user.0.enterprise_id, product_id)
        .await?;

    Ok(Json(product))
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let service = ProductService::new(state.db.clone(), &state.config);
    let product = service.create(current_user.0.enterprise_id, input).await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// Update product attributes (edits are recorded in the ledger)
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> Result<Json<Product>, AppError> {
    let service = ProductService::new(state.db.clone(), &state.config);
    let product = service
        .update(
            current_user.0.enterprise_id,
            product_id,
            input,
            &current_user.0.name,
        )
        .await?;

    Ok(Json(product))
}

/// Delete a product, preserving its ledger history
pub async fn delete_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let service = ProductService::new(state.db.clone(), &state.config);
    service
        .delete(
            current_user.0.enterprise_id,
            product_id,
            &current_user.0.name,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Apply a quantity movement to a product
pub async fn move_product_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<MoveStockInput>,
) -> Result<Json<StockMovement>, AppError> {
    let notifier = NotificationService::new(state.db.clone(), state.events.clone(), &state.config);
    let service = MovementService::new(state.db.clone(), notifier);

    let movement = service
        .apply(
            current_user.0.enterprise_id,
            SubjectKind::Product,
            product_id,
            input,
            &current_user.0.name,
        )
        .await?;

    Ok(Json(movement))
}

/// Get availability (stored or assemblable) for a product
pub async fn get_product_availability(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductAvailability>, AppError> {
    let service = ProductService::new(state.db.clone(), &state.config);
    let availability = service
        .availability(current_user.0.enterprise_id, product_id)
        .await?;

    Ok(Json(availability))
}

/// List a product's recipe components
pub async fn list_product_components(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Vec<ProductComponentLink>>, AppError> {
    let service = ProductService::new(state.db.clone(), &state.config);
    let components = service
        .list_components(current_user.0.enterprise_id, product_id)
        .await?;

    Ok(Json(components))
}

/// Add a recipe component to a composite product
pub async fn add_product_component(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<ComponentRequirementInput>,
) -> Result<(StatusCode, Json<ProductComponentLink>), AppError> {
    let service = ProductService::new(state.db.clone(), &state.config);
    let link = service
        .add_component(current_user.0.enterprise_id, product_id, input)
        .await?;

    Ok((StatusCode::CREATED, Json(link)))
}

/// Remove a recipe component from a product
pub async fn remove_product_component(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((product_id, component_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let service = ProductService::new(state.db.clone(), &state.config);
    service
        .remove_component(current_user.0.enterprise_id, product_id, component_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
