//! Category HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::category::{
    Category, CategoryService, CreateCategoryInput, UpdateCategoryInput,
};
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

#[derive(Deserialize)]
pub struct CategoryListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List categories
pub async fn list_categories(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<PaginatedResponse<Category>>, AppError> {
    let pagination = Pagination::new(query.page, query.per_page);
    let service = CategoryService::new(state.db.clone());

    let (categories, total) = service
        .list(current_user.0.enterprise_id, pagination)
        .await?;

    Ok(Json(PaginatedResponse::new(categories, pagination, total)))
}

/// Create a category
pub async fn create_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCategoryInput>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let service = CategoryService::new(state.db.clone());
    let category = service.create(current_user.0.enterprise_id, input).await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Update a category
pub async fn update_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
    Json(input): Json<UpdateCategoryInput>,
) -> Result<Json<Category>, AppError> {
    let service = CategoryService::new(state.db.clone());
    let category = service
        .update(current_user.0.enterprise_id, category_id, input)
        .await?;

    Ok(Json(category))
}

/// Delete a category
pub async fn delete_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let service = CategoryService::new(state.db.clone());
    service
        .delete(current_user.0.enterprise_id, category_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
