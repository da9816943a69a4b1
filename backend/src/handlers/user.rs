//! Team member management HTTP handlers. All routes here are admin only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::user::{CreateUserInput, UpdateUserInput, UserProfile, UserService};
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

#[derive(Deserialize)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List team members
pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<UserListQuery>,
) -> Result<Json<PaginatedResponse<UserProfile>>, AppError> {
    require_admin(&current_user.0)?;

    let pagination = Pagination::new(query.page, query.per_page);
    let service = UserService::new(state.db.clone());

    let (users, total) = service
        .list(current_user.0.enterprise_id, pagination)
        .await?;

    Ok(Json(PaginatedResponse::new(users, pagination, total)))
}

/// Get a team member
pub async fn get_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserProfile>, AppError> {
    require_admin(&current_user.0)?;

    let service = UserService::new(state.db.clone());
    let user = service
        .get_by_id(current_user.0.enterprise_id, user_id)
        .await?;

    Ok(Json(user))
}

/// Create a team member
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    require_admin(&current_user.0)?;

    let service = UserService::new(state.db.clone());
    let user = service.create(current_user.0.enterprise_id, input).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Update a team member
pub async fn update_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(input): Json<UpdateUserInput>,
) -> Result<Json<UserProfile>, AppError> {
    require_admin(&current_user.0)?;

    let service = UserService::new(state.db.clone());
    let user = service
        .update(current_user.0.enterprise_id, user_id, input)
        .await?;

    Ok(Json(user))
}

/// Delete a team member
pub async fn delete_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_admin(&current_user.0)?;

    let service = UserService::new(state.db.clone());
    service
        .delete(current_user.0.enterprise_id, user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
