//! Product category service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::Pagination;

/// Category service
#[derive(Clone)]
pub struct CategoryService {
    db: PgPool,
}

/// A category row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub enterprise_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub description: Option<String>,
}

/// Input for updating a category
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CategoryService {
    /// Create a new CategoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a category
    pub async fn create(&self, enterprise_id: Uuid, input: CreateCategoryInput) -> AppResult<Category> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Category name is required".to_string(),
                message_pt: "O nome da categoria é obrigatório".to_string(),
            });
        }

        let name_taken = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE enterprise_id = $1 AND name = $2",
        )
        .bind(enterprise_id)
        .bind(&input.name)
        .fetch_one(&self.db)
        .await?;

        if name_taken > 0 {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (enterprise_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, enterprise_id, name, description, created_at, updated_at
            "#,
        )
        .bind(enterprise_id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&self.db)
        .await?;

        Ok(category)
    }

    /// List categories
    pub async fn list(
        &self,
        enterprise_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<(Vec<Category>, u64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE enterprise_id = $1",
        )
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, enterprise_id, name, description, created_at, updated_at
            FROM categories
            WHERE enterprise_id = $1
            ORDER BY name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(enterprise_id)
        .bind(i64::from(pagination.per_page))
        .bind(i64::from(pagination.offset()))
        .fetch_all(&self.db)
        .await?;

        Ok((categories, total as u64))
    }

    /// Update a category
    pub async fn update(
        &self,
        enterprise_id: Uuid,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> AppResult<Category> {
        let existing = self.get_by_id(enterprise_id, category_id).await?;

        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: "Category name cannot be empty".to_string(),
                    message_pt: "O nome da categoria não pode ser vazio".to_string(),
                });
            }

            if name != &existing.name {
                let name_taken = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM categories WHERE enterprise_id = $1 AND name = $2 AND id <> $3",
                )
                .bind(enterprise_id)
                .bind(name)
                .bind(category_id)
                .fetch_one(&self.db)
                .await?;

                if name_taken > 0 {
                    return Err(AppError::DuplicateEntry("name".to_string()));
                }
            }
        }

        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                updated_at = NOW()
            WHERE id = $3 AND enterprise_id = $4
            RETURNING id, enterprise_id, name, description, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(category_id)
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        Ok(category)
    }

    /// Delete a category. Products and suppliers that referenced it are
    /// detached, not deleted.
    pub async fn delete(&self, enterprise_id: Uuid, category_id: Uuid) -> AppResult<()> {
        self.get_by_id(enterprise_id, category_id).await?;

        sqlx::query("DELETE FROM categories WHERE id = $1 AND enterprise_id = $2")
            .bind(category_id)
            .bind(enterprise_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn get_by_id(&self, enterprise_id: Uuid, category_id: Uuid) -> AppResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, enterprise_id, name, description, created_at, updated_at
            FROM categories
            WHERE id = $1 AND enterprise_id = $2
            "#,
        )
        .bind(category_id)
        .bind(enterprise_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))?;

        Ok(category)
    }
}
