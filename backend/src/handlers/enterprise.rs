//! Enterprise profile HTTP handlers

use axum::{extract::State, Json};

use crate::error::AppError;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::enterprise::{
    Enterprise, EnterpriseProfile, EnterpriseService, UpdateEnterpriseInput,
};
use crate::AppState;

/// Get the current enterprise profile with inventory counters
pub async fn get_enterprise(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<EnterpriseProfile>, AppError> {
    let service = EnterpriseService::new(state.db.clone());
    let profile = service.get_profile(current_user.0.enterprise_id).await?;

    Ok(Json(profile))
}

/// Update enterprise contact details (admin only)
pub async fn update_enterprise(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<UpdateEnterpriseInput>,
) -> Result<Json<Enterprise>, AppError> {
    require_admin(&current_user.0)?;

    let service = EnterpriseService::new(state.db.clone());
    let enterprise = service
        .update(current_user.0.enterprise_id, input)
        .await?;

    Ok(Json(enterprise))
}
