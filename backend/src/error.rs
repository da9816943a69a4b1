//! Error handling for the Stock Control Platform
//!
//! Every error leaving the API carries a stable code plus English and
//! Portuguese messages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::models::{MovementError, RecipeError};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_pt: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Conflict: {message}")]
    Conflict {
        resource: String,
        message: String,
        message_pt: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("Invalid change type: {0}")]
    InvalidChangeType(String),

    #[error("Invalid component requirement: {0}")]
    InvalidComponentRequirement(String),

    // External service errors
    #[error("External service error: {0}")]
    ExternalService(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<MovementError> for AppError {
    fn from(err: MovementError) -> Self {
        match err {
            MovementError::InsufficientStock {
                available,
                requested,
            } => AppError::InsufficientStock {
                available,
                requested,
            },
            MovementError::NonPositiveAmount => AppError::Validation {
                field: "amount".to_string(),
                message: "Amount must be greater than zero".to_string(),
                message_pt: "A quantidade deve ser maior que zero".to_string(),
            },
            MovementError::NegativeTarget => AppError::Validation {
                field: "amount".to_string(),
                message: "Adjusted quantity cannot be negative".to_string(),
                message_pt: "A quantidade ajustada não pode ser negativa".to_string(),
            },
            MovementError::QuantityOverflow => AppError::Validation {
                field: "amount".to_string(),
                message: "Resulting quantity exceeds the storable range".to_string(),
                message_pt: "A quantidade resultante excede o limite armazenável".to_string(),
            },
            MovementError::NotAQuantityChange(change) => {
                AppError::InvalidChangeType(change.as_str().to_string())
            }
        }
    }
}

impl From<RecipeError> for AppError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::NonPositiveRequirement => AppError::InvalidComponentRequirement(
                "required quantity per unit must be at least 1".to_string(),
            ),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_pt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    fn new(code: &str, en: impl Into<String>, pt: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message_en: en.into(),
            message_pt: pt.into(),
            field: None,
        }
    }

    fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::TokenExpired | AppError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AppError::Validation { .. }
            | AppError::ValidationError(_)
            | AppError::InvalidChangeType(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateEntry(_) | AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InsufficientStock { .. } | AppError::InvalidComponentRequirement(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn detail(&self) -> ErrorDetail {
        match self {
            AppError::InvalidCredentials => ErrorDetail::new(
                "INVALID_CREDENTIALS",
                "Invalid email or password",
                "Email ou senha inválidos",
            ),
            AppError::TokenExpired => {
                ErrorDetail::new("TOKEN_EXPIRED", "Token has expired", "O token expirou")
            }
            AppError::InvalidToken => {
                ErrorDetail::new("INVALID_TOKEN", "Invalid token", "Token inválido")
            }
            AppError::InsufficientPermissions => ErrorDetail::new(
                "INSUFFICIENT_PERMISSIONS",
                "You do not have permission to perform this action",
                "Você não tem permissão para realizar esta ação",
            ),
            AppError::Validation {
                field,
                message,
                message_pt,
            } => ErrorDetail::new("VALIDATION_ERROR", message.clone(), message_pt.clone())
                .with_field(field.clone()),
            AppError::ValidationError(msg) => ErrorDetail::new(
                "VALIDATION_ERROR",
                msg.clone(),
                format!("Dados inválidos: {}", msg),
            ),
            AppError::DuplicateEntry(field) => ErrorDetail::new(
                "DUPLICATE_ENTRY",
                format!("A record with this {} already exists", field),
                format!("Já existe um registro com este {}", field),
            )
            .with_field(field.clone()),
            AppError::Conflict {
                resource,
                message,
                message_pt,
            } => ErrorDetail::new("CONFLICT", message.clone(), message_pt.clone())
                .with_field(resource.clone()),
            AppError::NotFound(resource) => ErrorDetail::new(
                "NOT_FOUND",
                format!("{} not found", resource),
                format!("{} não encontrado", resource),
            ),
            AppError::InsufficientStock {
                available,
                requested,
            } => ErrorDetail::new(
                "INSUFFICIENT_STOCK",
                format!(
                    "Insufficient stock: {} available, {} requested",
                    available, requested
                ),
                format!(
                    "Estoque insuficiente: {} disponível, {} solicitado",
                    available, requested
                ),
            ),
            AppError::InvalidChangeType(change) => ErrorDetail::new(
                "INVALID_CHANGE_TYPE",
                format!("Change type '{}' is not allowed here", change),
                format!("Tipo de alteração '{}' não é permitido aqui", change),
            )
            .with_field("change_type"),
            AppError::InvalidComponentRequirement(msg) => ErrorDetail::new(
                "INVALID_COMPONENT_REQUIREMENT",
                msg.clone(),
                format!("Requisito de componente inválido: {}", msg),
            ),
            AppError::ExternalService(msg) => ErrorDetail::new(
                "EXTERNAL_SERVICE_ERROR",
                format!("External service error: {}", msg),
                format!("Erro ao comunicar com serviço externo: {}", msg),
            ),
            AppError::DatabaseError(_) => ErrorDetail::new(
                "DATABASE_ERROR",
                "A database error occurred",
                "Ocorreu um erro no banco de dados",
            ),
            AppError::Internal(msg) => ErrorDetail::new(
                "INTERNAL_ERROR",
                msg.clone(),
                "Ocorreu um erro interno no servidor",
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("Error: {:?}", self);

        let status = self.status();
        let body = ErrorResponse {
            error: self.detail(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::ChangeType;

    #[test]
    fn test_movement_errors_map_to_app_errors() {
        let err: AppError = MovementError::InsufficientStock {
            available: 2,
            requested: 5,
        }
        .into();
        assert!(matches!(
            err,
            AppError::InsufficientStock {
                available: 2,
                requested: 5
            }
        ));

        let err: AppError = MovementError::NotAQuantityChange(ChangeType::PriceEdit).into();
        assert!(matches!(err, AppError::InvalidChangeType(ref t) if t == "price_edit"));

        let err: AppError = RecipeError::NonPositiveRequirement.into();
        assert!(matches!(err, AppError::InvalidComponentRequirement(_)));
    }

    #[test]
    fn test_status_codes_separate_business_from_infrastructure() {
        assert_eq!(
            AppError::InsufficientStock {
                available: 0,
                requested: 1
            }
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::NotFound("Product".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::PoolClosed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
