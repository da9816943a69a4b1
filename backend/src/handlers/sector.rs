//! Sector management HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::sector::{CreateSectorInput, Sector, SectorService, UpdateSectorInput};
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

#[derive(Deserialize)]
pub struct SectorListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List sectors for the current enterprise
pub async fn list_sectors(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SectorListQuery>,
) -> Result<Json<PaginatedResponse<Sector>>, AppError> {
    let pagination = Pagination::new(query.page, query.per_page);
    let service = SectorService::new(state.db.clone());

    let (sectors, total) = service
        .list(current_user.0.enterprise_id, pagination)
        .await?;

    Ok(Json(PaginatedResponse::new(sectors, pagination, total)))
}

/// Get a sector
pub async fn get_sector(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sector_id): Path<Uuid>,
) -> Result<Json<Sector>, AppError> {
    let service = SectorService::new(state.db.clone());
    let sector = service
        .get_by_id(current_user.0.enterprise_id, sector_id)
        .await?;

    Ok(Json(sector))
}

/// Create a sector (and its default stock area)
pub async fn create_sector(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSectorInput>,
) -> Result<(StatusCode, Json<Sector>), AppError> {
    let service = SectorService::new(state.db.clone());
    let sector = service.create(current_user.0.enterprise_id, input).await?;

    Ok((StatusCode::CREATED, Json(sector)))
}

/// Update a sector
pub async fn update_sector(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sector_id): Path<Uuid>,
    Json(input): Json<UpdateSectorInput>,
) -> Result<Json<Sector>, AppError> {
    let service = SectorService::new(state.db.clone());
    let sector = service
        .update(current_user.0.enterprise_id, sector_id, input)
        .await?;

    Ok(Json(sector))
}

/// Delete a sector and everything in it
pub async fn delete_sector(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sector_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let service = SectorService::new(state.db.clone());
    service
        .delete(current_user.0.enterprise_id, sector_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
