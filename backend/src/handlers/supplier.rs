//! Supplier HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::supplier::{
    CreateSupplierInput, Supplier, SupplierService, UpdateSupplierInput,
};
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

#[derive(Deserialize)]
pub struct SupplierListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List suppliers
pub async fn list_suppliers(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SupplierListQuery>,
) -> Result<Json<PaginatedResponse<Supplier>>, AppError> {
    let pagination = Pagination::new(query.page, query.per_page);
    let service = SupplierService::new(state.db.clone());

    let (suppliers, total) = service
        .list(current_user.0.enterprise_id, pagination)
        .await?;

    Ok(Json(PaginatedResponse::new(suppliers, pagination, total)))
}

/// Create a supplier
pub async fn create_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSupplierInput>,
) -> Result<(StatusCode, Json<Supplier>), AppError> {
    let service = SupplierService::new(state.db.clone());
    let supplier = service.create(current_user.0.enterprise_id, input).await?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

/// Update a supplier
pub async fn update_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
    Json(input): Json<UpdateSupplierInput>,
) -> Result<Json<Supplier>, AppError> {
    let service = SupplierService::new(state.db.clone());
    let supplier = service
        .update(current_user.0.enterprise_id, supplier_id, input)
        .await?;

    Ok(Json(supplier))
}

/// Delete a supplier
pub async fn delete_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let service = SupplierService::new(state.db.clone());
    service
        .delete(current_user.0.enterprise_id, supplier_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
