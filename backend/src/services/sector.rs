//! Sector service
//!
//! Sectors partition an enterprise. Creating one also creates its default
//! stock area, so components can be registered right away. Deleting one
//! cascades to its stocks, components and products, but never to their
//! ledger history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::Pagination;

/// Sector service
#[derive(Clone)]
pub struct SectorService {
    db: PgPool,
}

/// A sector row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sector {
    pub id: Uuid,
    pub enterprise_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a sector
#[derive(Debug, Deserialize)]
pub struct CreateSectorInput {
    pub name: String,
    pub description: Option<String>,
}

/// Input for updating a sector
#[derive(Debug, Deserialize)]
pub struct UpdateSectorInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl SectorService {
    /// Create a new SectorService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a sector along with its default stock area
    pub async fn create(&self, enterprise_id: Uuid, input: CreateSectorInput) -> AppResult<Sector> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Sector name is required".to_string(),
                message_pt: "O nome do setor é obrigatório".to_string(),
            });
        }

        let name_taken = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sectors WHERE enterprise_id = $1 AND name = $2",
        )
        .bind(enterprise_id)
        .bind(&input.name)
        .fetch_one(&self.db)
        .await?;

        if name_taken > 0 {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let sector = sqlx::query_as::<_, Sector>(
            r#"
            INSERT INTO sectors (enterprise_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, enterprise_id, name, description, created_at, updated_at
            "#,
        )
        .bind(enterprise_id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO stocks (enterprise_id, sector_id, name) VALUES ($1, $2, $3)",
        )
        .bind(enterprise_id)
        .bind(sector.id)
        .bind(format!("{} stock", sector.name))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(sector)
    }

    /// List sectors
    pub async fn list(
        &self,
        enterprise_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<(Vec<Sector>, u64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sectors WHERE enterprise_id = $1",
        )
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        let sectors = sqlx::query_as::<_, Sector>(
            r#"
            SELECT id, enterprise_id, name, description, created_at, updated_at
            FROM sectors
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

        Ok((sectors, total as u64))
    }

    /// Get a sector by id
    pub async fn get_by_id(&self, enterprise_id: Uuid, sector_id: Uuid) -> AppResult<Sector> {
        let sector = sqlx::query_as::<_, Sector>(
            r#"
            SELECT id, enterprise_id, name, description, created_at, updated_at
            FROM sectors
            WHERE id = $1 AND enterprise_id = $2
            "#,
        )
        .bind(sector_id)
        .bind(enterprise_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sector".to_string()))?;

        Ok(sector)
    }

    /// Update a sector
    pub async fn update(
        &self,
        enterprise_id: Uuid,
        sector_id: Uuid,
        input: UpdateSectorInput,
    ) -> AppResult<Sector> {
        let existing = self.get_by_id(enterprise_id, sector_id).await?;

        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: "Sector name cannot be empty".to_string(),
                    message_pt: "O nome do setor não pode ser vazio".to_string(),
                });
            }

            if name != &existing.name {
                let name_taken = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM sectors WHERE enterprise_id = $1 AND name = $2 AND id <> $3",
                )
                .bind(enterprise_id)
                .bind(name)
                .bind(sector_id)
                .fetch_one(&self.db)
                .await?;

                if name_taken > 0 {
                    return Err(AppError::DuplicateEntry("name".to_string()));
                }
            }
        }

        let sector = sqlx::query_as::<_, Sector>(
            r#"
            UPDATE sectors
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                updated_at = NOW()
            WHERE id = $3 AND enterprise_id = $4
            RETURNING id, enterprise_id, name, description, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(sector_id)
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        Ok(sector)
    }

    /// Delete a sector and everything in it.
    ///
    /// Before the cascade removes components and products, their ledger
    /// entries and notifications are detached with the name snapshot filled
    /// in, so reports over past periods keep working.
    pub async fn delete(&self, enterprise_id: Uuid, sector_id: Uuid) -> AppResult<()> {
        self.get_by_id(enterprise_id, sector_id).await?;

        // Components in this sector may feed recipes of products in other
        // sectors; deleting them would silently change those products'
        // availability. Recipes of this sector's own products go away with
        // the sector and do not block.
        let outside_recipe_uses = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM product_components pc
            JOIN stock_components sc ON sc.id = pc.component_id
            JOIN stocks st ON st.id = sc.stock_id
            JOIN products p ON p.id = pc.product_id
            WHERE st.sector_id = $1 AND st.enterprise_id = $2
              AND p.sector_id <> $1
            "#,
        )
        .bind(sector_id)
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        if outside_recipe_uses > 0 {
            return Err(AppError::Conflict {
                resource: "sector".to_string(),
                message: format!(
                    "Sector contains components used by {} product recipe(s) in other sectors and cannot be deleted",
                    outside_recipe_uses
                ),
                message_pt:
                    "O setor contém componentes usados em receitas de produtos de outros setores e não pode ser removido"
                        .to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE stock_ledger sl
            SET subject_name = sc.name, subject_id = NULL
            FROM stock_components sc
            JOIN stocks st ON st.id = sc.stock_id
            WHERE st.sector_id = $1 AND st.enterprise_id = $2
              AND sl.subject_id = sc.id AND sl.enterprise_id = $2
            "#,
        )
        .bind(sector_id)
        .bind(enterprise_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE stock_ledger sl
            SET subject_name = p.name, subject_id = NULL
            FROM products p
            WHERE p.sector_id = $1 AND p.enterprise_id = $2
              AND sl.subject_id = p.id AND sl.enterprise_id = $2
            "#,
        )
        .bind(sector_id)
        .bind(enterprise_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE notifications n
            SET subject_id = NULL
            FROM stock_components sc
            JOIN stocks st ON st.id = sc.stock_id
            WHERE st.sector_id = $1 AND st.enterprise_id = $2
              AND n.subject_id = sc.id AND n.enterprise_id = $2
            "#,
        )
        .bind(sector_id)
        .bind(enterprise_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE notifications n
            SET subject_id = NULL
            FROM products p
            WHERE p.sector_id = $1 AND p.enterprise_id = $2
              AND n.subject_id = p.id AND n.enterprise_id = $2
            "#,
        )
        .bind(sector_id)
        .bind(enterprise_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM sectors WHERE id = $1 AND enterprise_id = $2")
            .bind(sector_id)
            .bind(enterprise_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
