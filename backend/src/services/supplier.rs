//! Supplier service
//!
//! Suppliers are registered under a category; a supplier outlives its
//! category, so the link is nullable in storage even though registration
//! requires one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::Pagination;
use shared::validation;

/// Supplier service
#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

/// A supplier row, joined with its category name
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Supplier {
    pub id: Uuid,
    pub enterprise_id: Uuid,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a supplier
#[derive(Debug, Deserialize)]
pub struct CreateSupplierInput {
    pub category_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
}

/// Input for updating a supplier
#[derive(Debug, Deserialize)]
pub struct UpdateSupplierInput {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

const SUPPLIER_QUERY: &str = r#"
    SELECT s.id, s.enterprise_id, s.category_id, c.name AS category_name,
           s.name, s.email, s.phone, s.created_at, s.updated_at
    FROM suppliers s
    LEFT JOIN categories c ON c.id = s.category_id
"#;

impl SupplierService {
    /// Create a new SupplierService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a supplier
    pub async fn create(&self, enterprise_id: Uuid, input: CreateSupplierInput) -> AppResult<Supplier> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Supplier name is required".to_string(),
                message_pt: "O nome do fornecedor é obrigatório".to_string(),
            });
        }

        if let Err(msg) = validation::validate_phone(&input.phone) {
            return Err(AppError::Validation {
                field: "phone".to_string(),
                message: msg.to_string(),
                message_pt: "Telefone inválido".to_string(),
            });
        }

        if let Some(email) = &input.email {
            if let Err(msg) = validation::validate_email(email) {
                return Err(AppError::Validation {
                    field: "email".to_string(),
                    message: msg.to_string(),
                    message_pt: "Email inválido".to_string(),
                });
            }
        }

        self.assert_category(enterprise_id, input.category_id).await?;

        let supplier_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO suppliers (enterprise_id, category_id, name, email, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(enterprise_id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .fetch_one(&self.db)
        .await?;

        self.get_by_id(enterprise_id, supplier_id).await
    }

    /// List suppliers
    pub async fn list(
        &self,
        enterprise_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<(Vec<Supplier>, u64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM suppliers WHERE enterprise_id = $1",
        )
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "{} WHERE s.enterprise_id = $1 ORDER BY s.name ASC LIMIT $2 OFFSET $3",
            SUPPLIER_QUERY
        ))
        .bind(enterprise_id)
        .bind(i64::from(pagination.per_page))
        .bind(i64::from(pagination.offset()))
        .fetch_all(&self.db)
        .await?;

        Ok((suppliers, total as u64))
    }

    /// Update a supplier
    pub async fn update(
        &self,
        enterprise_id: Uuid,
        supplier_id: Uuid,
        input: UpdateSupplierInput,
    ) -> AppResult<Supplier> {
        self.get_by_id(enterprise_id, supplier_id).await?;

        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: "Supplier name cannot be empty".to_string(),
                    message_pt: "O nome do fornecedor não pode ser vazio".to_string(),
                });
            }
        }

        if let Some(phone) = &input.phone {
            if let Err(msg) = validation::validate_phone(phone) {
                return Err(AppError::Validation {
                    field: "phone".to_string(),
                    message: msg.to_string(),
                    message_pt: "Telefone inválido".to_string(),
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
        }

        if let Some(category_id) = input.category_id {
            self.assert_category(enterprise_id, category_id).await?;
        }

        sqlx::query(
            r#"
            UPDATE suppliers
            SET category_id = COALESCE($1, category_id),
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                updated_at = NOW()
            WHERE id = $5 AND enterprise_id = $6
            "#,
        )
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(supplier_id)
        .bind(enterprise_id)
        .execute(&self.db)
        .await?;

        self.get_by_id(enterprise_id, supplier_id).await
    }

    /// Delete a supplier
    pub async fn delete(&self, enterprise_id: Uuid, supplier_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1 AND enterprise_id = $2")
            .bind(supplier_id)
            .bind(enterprise_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        Ok(())
    }

    async fn assert_category(&self, enterprise_id: Uuid, category_id: Uuid) -> AppResult<()> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE id = $1 AND enterprise_id = $2",
        )
        .bind(category_id)
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        if found == 0 {
            return Err(AppError::NotFound("Category".to_string()));
        }

        Ok(())
    }

    async fn get_by_id(&self, enterprise_id: Uuid, supplier_id: Uuid) -> AppResult<Supplier> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            "{} WHERE s.id = $1 AND s.enterprise_id = $2",
            SUPPLIER_QUERY
        ))
        .bind(supplier_id)
        .bind(enterprise_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))?;

        Ok(supplier)
    }
}
