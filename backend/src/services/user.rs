//! Team member management service
//!
//! Users always belong to one enterprise. Responses never carry the
//! password hash.

use bcrypt::{hash, DEFAULT_COST};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::UserRole;
use shared::types::Pagination;
use shared::validation;

/// User service
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

/// A user row without credentials
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub enterprise_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a team member
#[derive(Debug, Deserialize)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Input for updating a team member
#[derive(Debug, Deserialize)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
}

const PROFILE_COLUMNS: &str =
    "id, enterprise_id, name, email, role, last_login_at, created_at, updated_at";

impl UserService {
    /// Create a new UserService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a team member
    pub async fn create(&self, enterprise_id: Uuid, input: CreateUserInput) -> AppResult<UserProfile> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name is required".to_string(),
                message_pt: "O nome é obrigatório".to_string(),
            });
        }

        if let Err(msg) = validation::validate_email(&input.email) {
            return Err(AppError::Validation {
                field: "email".to_string(),
                message: msg.to_string(),
                message_pt: "Email inválido".to_string(),
            });
        }

        if let Err(msg) = validation::validate_password(&input.password) {
            return Err(AppError::Validation {
                field: "password".to_string(),
                message: msg.to_string(),
                message_pt: "Senha inválida".to_string(),
            });
        }

        let email_taken = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE email = $1",
        )
        .bind(&input.email)
        .fetch_one(&self.db)
        .await?;

        if email_taken > 0 {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            INSERT INTO users (enterprise_id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(enterprise_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&password_hash)
        .bind(input.role.as_str())
        .fetch_one(&self.db)
        .await?;

        Ok(user)
    }

    /// List team members
    pub async fn list(
        &self,
        enterprise_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<(Vec<UserProfile>, u64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE enterprise_id = $1",
        )
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        let users = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE enterprise_id = $1
            ORDER BY name ASC
            LIMIT $2 OFFSET $3
            "#,
            PROFILE_COLUMNS
        ))
        .bind(enterprise_id)
        .bind(i64::from(pagination.per_page))
        .bind(i64::from(pagination.offset()))
        .fetch_all(&self.db)
        .await?;

        Ok((users, total as u64))
    }

    /// Get a team member by id
    pub async fn get_by_id(&self, enterprise_id: Uuid, user_id: Uuid) -> AppResult<UserProfile> {
        let user = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {} FROM users WHERE id = $1 AND enterprise_id = $2",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(enterprise_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(user)
    }

    /// Update a team member
    pub async fn update(
        &self,
        enterprise_id: Uuid,
        user_id: Uuid,
        input: UpdateUserInput,
    ) -> AppResult<UserProfile> {
        let existing = self.get_by_id(enterprise_id, user_id).await?;

        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: "Name cannot be empty".to_string(),
                    message_pt: "O nome não pode ser vazio".to_string(),
                });
            }
        }

        if let Some(email) = &input.email {
            if let Err(msg) = validation::validate_email(email) {
                return Err(AppError::Validation {
                    field: "email".to_string(),
                    message: msg.to_string(),
                    message_pt: "Email inválido".to_string(),
                });
            }

            if email != &existing.email {
                let email_taken = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM users WHERE email = $1 AND id <> $2",
                )
                .bind(email)
                .bind(user_id)
                .fetch_one(&self.db)
                .await?;

                if email_taken > 0 {
                    return Err(AppError::DuplicateEntry("email".to_string()));
                }
            }
        }

        let password_hash = match &input.password {
            Some(password) => {
                if let Err(msg) = validation::validate_password(password) {
                    return Err(AppError::Validation {
                        field: "password".to_string(),
                        message: msg.to_string(),
                        message_pt: "Senha inválida".to_string(),
                    });
                }
                let hashed = hash(password, DEFAULT_COST)
                    .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
                Some(hashed)
            }
            None => None,
        };

        // Demoting the last admin would lock the tenant out of user management
        if existing.role == UserRole::Admin.as_str() {
            let demoting = input
                .role
                .as_ref()
                .is_some_and(|role| *role != UserRole::Admin);
            if demoting && self.admin_count(enterprise_id).await? <= 1 {
                return Err(AppError::Conflict {
                    resource: "user".to_string(),
                    message: "Cannot demote the only admin of the enterprise".to_string(),
                    message_pt: "Não é possível rebaixar o único administrador da empresa"
                        .to_string(),
                });
            }
        }

        let user = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($1, name),
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                role = COALESCE($4, role),
                updated_at = NOW()
            WHERE id = $5 AND enterprise_id = $6
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.email)
        .bind(&password_hash)
        .bind(input.role.as_ref().map(|role| role.as_str()))
        .bind(user_id)
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        Ok(user)
    }

    /// Delete a team member
    pub async fn delete(&self, enterprise_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let user = self.get_by_id(enterprise_id, user_id).await?;

        if user.role == UserRole::Admin.as_str() && self.admin_count(enterprise_id).await? <= 1 {
            return Err(AppError::Conflict {
                resource: "user".to_string(),
                message: "Cannot delete the only admin of the enterprise".to_string(),
                message_pt: "Não é possível remover o único administrador da empresa".to_string(),
            });
        }

        sqlx::query("DELETE FROM users WHERE id = $1 AND enterprise_id = $2")
            .bind(user_id)
            .bind(enterprise_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn admin_count(&self, enterprise_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE enterprise_id = $1 AND role = $2",
        )
        .bind(enterprise_id)
        .bind(UserRole::Admin.as_str())
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }
}
