//! Authentication handlers

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::AuthService;
use crate::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub enterprise_name: String,
    pub tax_id: String,
    pub owner_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub enterprise_id: String,
    pub user_id: String,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Register enterprise endpoint handler
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    use crate::services::auth::RegisterEnterpriseInput;

    let input = RegisterEnterpriseInput {
        enterprise_name: body.enterprise_name,
        tax_id: body.tax_id,
        owner_name: body.owner_name,
        email: body.email,
        password: body.password,
        phone: body.phone,
        address: body.address,
        city: body.city,
        state: body.state,
    };

    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let result = auth_service.register_enterprise(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            enterprise_id: result.enterprise_id.to_string(),
            user_id: result.user_id.to_string(),
            access_token: result.access_token,
            token_type: result.token_type,
            expires_in: result.expires_in,
        }),
    ))
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.login(&body.email, &body.password).await?;

    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        token_type: tokens.token_type,
        expires_in: tokens.expires_in,
    }))
}

/// Logout endpoint handler. Revokes the presented bearer token.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidToken)?;

    let auth_service = AuthService::new(state.db.clone(), &state.config);
    auth_service.logout(token).await?;

    Ok(Json(LogoutResponse {
        message: "Logged out successfully".to_string(),
    }))
}
