//! Stock area and stock component service
//!
//! Stocks are named areas inside a sector; components are the stock-holding
//! rows that composite products draw from. Component quantities only change
//! through the movement engine, so this service covers attributes and
//! lifecycle, not quantities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::ledger::{self, NewLedgerEntry};
use shared::models::{ChangeType, SubjectKind};
use shared::types::Pagination;
use shared::validation;

const DEFAULT_UNIT: &str = "un";

/// Stock service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
    default_min_quantity: i64,
}

/// A stock area row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Stock {
    pub id: Uuid,
    pub enterprise_id: Uuid,
    pub sector_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock area with its sector name and component count
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockSummary {
    pub id: Uuid,
    pub enterprise_id: Uuid,
    pub sector_id: Uuid,
    pub sector_name: String,
    pub name: String,
    pub description: Option<String>,
    pub component_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock area with its components
#[derive(Debug, Serialize)]
pub struct StockDetail {
    #[serde(flatten)]
    pub stock: Stock,
    pub components: Vec<StockComponent>,
}

/// A stock component row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockComponent {
    pub id: Uuid,
    pub stock_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub min_quantity: i64,
    pub unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Component joined with the stock it belongs to
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ComponentSummary {
    pub id: Uuid,
    pub stock_id: Uuid,
    pub stock_name: String,
    pub name: String,
    pub quantity: i64,
    pub min_quantity: i64,
    pub unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a stock area
#[derive(Debug, Deserialize)]
pub struct CreateStockInput {
    pub sector_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Input for updating a stock area
#[derive(Debug, Deserialize)]
pub struct UpdateStockInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Input for creating a stock component
#[derive(Debug, Deserialize)]
pub struct CreateComponentInput {
    pub stock_id: Uuid,
    pub name: String,
    pub quantity: Option<i64>,
    pub min_quantity: Option<i64>,
    pub unit: Option<String>,
}

/// Input for updating component attributes. Quantity changes go through
/// the movement engine instead.
#[derive(Debug, Deserialize)]
pub struct UpdateComponentInput {
    pub name: Option<String>,
    pub min_quantity: Option<i64>,
    pub unit: Option<String>,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            default_min_quantity: config.alerts.default_min_quantity,
        }
    }

    // ========================================================================
    // Stock areas
    // ========================================================================

    /// Create a stock area in a sector
    pub async fn create_stock(&self, enterprise_id: Uuid, input: CreateStockInput) -> AppResult<Stock> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Stock name is required".to_string(),
                message_pt: "O nome do estoque é obrigatório".to_string(),
            });
        }

        self.assert_sector(enterprise_id, input.sector_id).await?;

        let name_taken = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stocks WHERE sector_id = $1 AND name = $2",
        )
        .bind(input.sector_id)
        .bind(&input.name)
        .fetch_one(&self.db)
        .await?;

        if name_taken > 0 {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }

        let stock = sqlx::query_as::<_, Stock>(
            r#"
            INSERT INTO stocks (enterprise_id, sector_id, name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, enterprise_id, sector_id, name, description, created_at, updated_at
            "#,
        )
        .bind(enterprise_id)
        .bind(input.sector_id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&self.db)
        .await?;

        Ok(stock)
    }

    /// List stock areas with sector names and component counts
    pub async fn list_stocks(
        &self,
        enterprise_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<(Vec<StockSummary>, u64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stocks WHERE enterprise_id = $1",
        )
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        let stocks = sqlx::query_as::<_, StockSummary>(
            r#"
            SELECT st.id, st.enterprise_id, st.sector_id, se.name AS sector_name,
                   st.name, st.description,
                   (SELECT COUNT(*) FROM stock_components sc WHERE sc.stock_id = st.id) AS component_count,
                   st.created_at, st.updated_at
            FROM stocks st
            JOIN sectors se ON se.id = st.sector_id
            WHERE st.enterprise_id = $1
            ORDER BY st.name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(enterprise_id)
        .bind(i64::from(pagination.per_page))
        .bind(i64::from(pagination.offset()))
        .fetch_all(&self.db)
        .await?;

        Ok((stocks, total as u64))
    }

    /// Get a stock area with its components
    pub async fn get_stock(&self, enterprise_id: Uuid, stock_id: Uuid) -> AppResult<StockDetail> {
        let stock = self.fetch_stock(enterprise_id, stock_id).await?;

        let components = sqlx::query_as::<_, StockComponent>(
            r#"
            SELECT id, stock_id, name, quantity, min_quantity, unit, created_at, updated_at
            FROM stock_components
            WHERE stock_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(stock_id)
        .fetch_all(&self.db)
        .await?;

        Ok(StockDetail { stock, components })
    }

    /// Update a stock area's attributes
    pub async fn update_stock(
        &self,
        enterprise_id: Uuid,
        stock_id: Uuid,
        input: UpdateStockInput,
    ) -> AppResult<Stock> {
        let existing = self.fetch_stock(enterprise_id, stock_id).await?;

        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: "Stock name cannot be empty".to_string(),
                    message_pt: "O nome do estoque não pode ser vazio".to_string(),
                });
            }

            if name != &existing.name {
                let name_taken = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM stocks WHERE sector_id = $1 AND name = $2 AND id <> $3",
                )
                .bind(existing.sector_id)
                .bind(name)
                .bind(stock_id)
                .fetch_one(&self.db)
                .await?;

                if name_taken > 0 {
                    return Err(AppError::DuplicateEntry("name".to_string()));
                }
            }
        }

        let stock = sqlx::query_as::<_, Stock>(
            r#"
            UPDATE stocks
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                updated_at = NOW()
            WHERE id = $3 AND enterprise_id = $4
            RETURNING id, enterprise_id, sector_id, name, description, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(stock_id)
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        Ok(stock)
    }

    /// Delete a stock area and its components.
    ///
    /// Ledger entries for the removed components keep their name snapshots;
    /// their notifications are detached rather than deleted.
    pub async fn delete_stock(&self, enterprise_id: Uuid, stock_id: Uuid) -> AppResult<()> {
        self.fetch_stock(enterprise_id, stock_id).await?;

        // The cascade would also drop recipe lines pointing at these
        // components, silently changing composite availability; refuse like
        // single-component deletion does.
        let recipe_uses = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM product_components pc
            JOIN stock_components sc ON sc.id = pc.component_id
            WHERE sc.stock_id = $1
            "#,
        )
        .bind(stock_id)
        .fetch_one(&self.db)
        .await?;

        if recipe_uses > 0 {
            return Err(AppError::Conflict {
                resource: "stock".to_string(),
                message: format!(
                    "Stock area contains components used by {} product recipe(s) and cannot be deleted",
                    recipe_uses
                ),
                message_pt:
                    "A área de estoque contém componentes usados em receitas de produtos e não pode ser removida"
                        .to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE stock_ledger sl
            SET subject_name = sc.name, subject_id = NULL
            FROM stock_components sc
            WHERE sc.stock_id = $1 AND sl.subject_id = sc.id AND sl.enterprise_id = $2
            "#,
        )
        .bind(stock_id)
        .bind(enterprise_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE notifications n
            SET subject_id = NULL
            FROM stock_components sc
            WHERE sc.stock_id = $1 AND n.subject_id = sc.id AND n.enterprise_id = $2
            "#,
        )
        .bind(stock_id)
        .bind(enterprise_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM stocks WHERE id = $1 AND enterprise_id = $2")
            .bind(stock_id)
            .bind(enterprise_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    // ========================================================================
    // Stock components
    // ========================================================================

    /// Create a stock component
    pub async fn create_component(
        &self,
        enterprise_id: Uuid,
        input: CreateComponentInput,
    ) -> AppResult<StockComponent> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Component name is required".to_string(),
                message_pt: "O nome do componente é obrigatório".to_string(),
            });
        }

        let unit = input.unit.unwrap_or_else(|| DEFAULT_UNIT.to_string());
        if let Err(msg) = validation::validate_unit(&unit) {
            return Err(AppError::Validation {
                field: "unit".to_string(),
                message: msg.to_string(),
                message_pt: "Unidade inválida".to_string(),
            });
        }

        let quantity = input.quantity.unwrap_or(0);
        if let Err(msg) = validation::validate_quantity(quantity) {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
                message_pt: "Quantidade inválida".to_string(),
            });
        }

        let min_quantity = input.min_quantity.unwrap_or(self.default_min_quantity);
        if min_quantity < 0 {
            return Err(AppError::Validation {
                field: "min_quantity".to_string(),
                message: "Minimum quantity cannot be negative".to_string(),
                message_pt: "A quantidade mínima não pode ser negativa".to_string(),
            });
        }

        self.fetch_stock(enterprise_id, input.stock_id).await?;

        let component = sqlx::query_as::<_, StockComponent>(
            r#"
            INSERT INTO stock_components (stock_id, name, quantity, min_quantity, unit)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, stock_id, name, quantity, min_quantity, unit, created_at, updated_at
            "#,
        )
        .bind(input.stock_id)
        .bind(&input.name)
        .bind(quantity)
        .bind(min_quantity)
        .bind(&unit)
        .fetch_one(&self.db)
        .await?;

        Ok(component)
    }

    /// List components, optionally restricted to one stock area
    pub async fn list_components(
        &self,
        enterprise_id: Uuid,
        stock_id: Option<Uuid>,
        pagination: Pagination,
    ) -> AppResult<(Vec<ComponentSummary>, u64)> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM stock_components sc
            JOIN stocks st ON st.id = sc.stock_id
            WHERE st.enterprise_id = $1
              AND ($2::uuid IS NULL OR sc.stock_id = $2)
            "#,
        )
        .bind(enterprise_id)
        .bind(stock_id)
        .fetch_one(&self.db)
        .await?;

        let components = sqlx::query_as::<_, ComponentSummary>(
            r#"
            SELECT sc.id, sc.stock_id, st.name AS stock_name, sc.name,
                   sc.quantity, sc.min_quantity, sc.unit, sc.created_at, sc.updated_at
            FROM stock_components sc
            JOIN stocks st ON st.id = sc.stock_id
            WHERE st.enterprise_id = $1
              AND ($2::uuid IS NULL OR sc.stock_id = $2)
            ORDER BY sc.name ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(enterprise_id)
        .bind(stock_id)
        .bind(i64::from(pagination.per_page))
        .bind(i64::from(pagination.offset()))
        .fetch_all(&self.db)
        .await?;

        Ok((components, total as u64))
    }

    /// List components with stock on hand, for recipe pickers
    pub async fn available_components(&self, enterprise_id: Uuid) -> AppResult<Vec<ComponentSummary>> {
        let components = sqlx::query_as::<_, ComponentSummary>(
            r#"
            SELECT sc.id, sc.stock_id, st.name AS stock_name, sc.name,
                   sc.quantity, sc.min_quantity, sc.unit, sc.created_at, sc.updated_at
            FROM stock_components sc
            JOIN stocks st ON st.id = sc.stock_id
            WHERE st.enterprise_id = $1 AND sc.quantity > 0
            ORDER BY sc.name ASC
            "#,
        )
        .bind(enterprise_id)
        .fetch_all(&self.db)
        .await?;

        Ok(components)
    }

    /// Get a component by id
    pub async fn get_component(
        &self,
        enterprise_id: Uuid,
        component_id: Uuid,
    ) -> AppResult<ComponentSummary> {
        let component = sqlx::query_as::<_, ComponentSummary>(
            r#"
            SELECT sc.id, sc.stock_id, st.name AS stock_name, sc.name,
                   sc.quantity, sc.min_quantity, sc.unit, sc.created_at, sc.updated_at
            FROM stock_components sc
            JOIN stocks st ON st.id = sc.stock_id
            WHERE sc.id = $1 AND st.enterprise_id = $2
            "#,
        )
        .bind(component_id)
        .bind(enterprise_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock component".to_string()))?;

        Ok(component)
    }

    /// Update component attributes
    pub async fn update_component(
        &self,
        enterprise_id: Uuid,
        component_id: Uuid,
        input: UpdateComponentInput,
    ) -> AppResult<StockComponent> {
        self.get_component(enterprise_id, component_id).await?;

        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: "Component name cannot be empty".to_string(),
                    message_pt: "O nome do componente não pode ser vazio".to_string(),
                });
            }
        }

        if let Some(unit) = &input.unit {
            if let Err(msg) = validation::validate_unit(unit) {
                return Err(AppError::Validation {
                    field: "unit".to_string(),
                    message: msg.to_string(),
                    message_pt: "Unidade inválida".to_string(),
                });
            }
        }

        if let Some(min_quantity) = input.min_quantity {
            if min_quantity < 0 {
                return Err(AppError::Validation {
                    field: "min_quantity".to_string(),
                    message: "Minimum quantity cannot be negative".to_string(),
                    message_pt: "A quantidade mínima não pode ser negativa".to_string(),
                });
            }
        }

        let component = sqlx::query_as::<_, StockComponent>(
            r#"
            UPDATE stock_components
            SET name = COALESCE($1, name),
                min_quantity = COALESCE($2, min_quantity),
                unit = COALESCE($3, unit),
                updated_at = NOW()
            WHERE id = $4
            RETURNING id, stock_id, name, quantity, min_quantity, unit, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(input.min_quantity)
        .bind(&input.unit)
        .bind(component_id)
        .fetch_one(&self.db)
        .await?;

        Ok(component)
    }

    /// Delete a component.
    ///
    /// Same shape as product deletion: earlier ledger entries keep the name
    /// snapshot, a final deletion entry zeroes the quantity, notifications
    /// are detached, then the row goes away.
    pub async fn delete_component(
        &self,
        enterprise_id: Uuid,
        component_id: Uuid,
        actor_name: &str,
    ) -> AppResult<()> {
        let component = self.get_component(enterprise_id, component_id).await?;

        // Recipe lines referencing this component would silently change
        // product availability; refuse instead.
        let recipe_uses = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM product_components WHERE component_id = $1",
        )
        .bind(component_id)
        .fetch_one(&self.db)
        .await?;

        if recipe_uses > 0 {
            return Err(AppError::Conflict {
                resource: "stock_component".to_string(),
                message: format!(
                    "Component '{}' is used by {} product recipe(s) and cannot be deleted",
                    component.name, recipe_uses
                ),
                message_pt: "O componente é usado em receitas de produtos e não pode ser removido"
                    .to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE stock_ledger
            SET subject_id = NULL, subject_name = $1
            WHERE subject_id = $2 AND enterprise_id = $3
            "#,
        )
        .bind(&component.name)
        .bind(component_id)
        .bind(enterprise_id)
        .execute(&mut *tx)
        .await?;

        ledger::record_entry(
            &mut *tx,
            &NewLedgerEntry {
                enterprise_id,
                subject_id: None,
                subject_kind: SubjectKind::Component,
                subject_name: Some(component.name.clone()),
                change_type: ChangeType::Deletion,
                previous_quantity: component.quantity,
                new_quantity: 0,
                description: Some(format!("Component '{}' deleted", component.name)),
                actor_name: Some(actor_name.to_string()),
            },
        )
        .await?;

        sqlx::query(
            "UPDATE notifications SET subject_id = NULL WHERE subject_id = $1 AND enterprise_id = $2",
        )
        .bind(component_id)
        .bind(enterprise_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM stock_components WHERE id = $1")
            .bind(component_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn fetch_stock(&self, enterprise_id: Uuid, stock_id: Uuid) -> AppResult<Stock> {
        let stock = sqlx::query_as::<_, Stock>(
            r#"
            SELECT id, enterprise_id, sector_id, name, description, created_at, updated_at
            FROM stocks
            WHERE id = $1 AND enterprise_id = $2
            "#,
        )
        .bind(stock_id)
        .bind(enterprise_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock".to_string()))?;

        Ok(stock)
    }

    async fn assert_sector(&self, enterprise_id: Uuid, sector_id: Uuid) -> AppResult<()> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sectors WHERE id = $1 AND enterprise_id = $2",
        )
        .bind(sector_id)
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        if found == 0 {
            return Err(AppError::NotFound("Sector".to_string()));
        }

        Ok(())
    }
}
