//! Product service
//!
//! Products are either simple (their own stored quantity) or composite
//! (assembled from stock components; availability is always derived, never
//! stored). Descriptive edits and deletions write ledger entries in the
//! same transaction as the change itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::ledger::{self, NewLedgerEntry};
use shared::models::{assemblable_units, ChangeType, RecipeLine, SubjectKind};
use shared::types::Pagination;
use shared::validation;

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
    default_min_quantity: i64,
}

/// A product row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub enterprise_id: Uuid,
    pub sector_id: Uuid,
    pub category_id: Option<Uuid>,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_composite: bool,
    pub quantity: i64,
    pub min_quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A recipe line joined with its component
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductComponentLink {
    pub id: Uuid,
    pub product_id: Uuid,
    pub component_id: Uuid,
    pub component_name: String,
    pub quantity_per_unit: i64,
    pub available_quantity: i64,
    pub unit: String,
}

/// Product with its recipe and derived availability
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub components: Vec<ProductComponentLink>,
    /// Assemblable units; only present for composite products
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_units: Option<i64>,
}

/// Availability of a product
#[derive(Debug, Serialize)]
pub struct ProductAvailability {
    pub product_id: Uuid,
    pub is_composite: bool,
    pub available_units: i64,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub sector_id: Uuid,
    pub category_id: Option<Uuid>,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_composite: Option<bool>,
    pub quantity: Option<i64>,
    pub min_quantity: Option<i64>,
    pub components: Option<Vec<ComponentRequirementInput>>,
}

/// One recipe line in a create or add request
#[derive(Debug, Deserialize)]
pub struct ComponentRequirementInput {
    pub component_id: Uuid,
    pub quantity_per_unit: i64,
}

/// Input for updating product attributes. Quantity is deliberately not
/// part of this input; it only changes through stock movements.
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub min_quantity: Option<i64>,
}

/// Filters for listing products
#[derive(Debug, Default)]
pub struct ProductFilter {
    pub sector_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
}

const PRODUCT_COLUMNS: &str = "id, enterprise_id, sector_id, category_id, sku, name, description, \
                               price, is_composite, quantity, min_quantity, created_at, updated_at";

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            default_min_quantity: config.alerts.default_min_quantity,
        }
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    /// Create a product, optionally with its recipe
    pub async fn create(&self, enterprise_id: Uuid, input: CreateProductInput) -> AppResult<Product> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Product name is required".to_string(),
                message_pt: "O nome do produto é obrigatório".to_string(),
            });
        }

        if let Err(msg) = validation::validate_sku(&input.sku) {
            return Err(AppError::Validation {
                field: "sku".to_string(),
                message: msg.to_string(),
                message_pt: "SKU inválido".to_string(),
            });
        }

        if let Err(msg) = validation::validate_price(input.price) {
            return Err(AppError::Validation {
                field: "price".to_string(),
                message: msg.to_string(),
                message_pt: "Preço inválido".to_string(),
            });
        }

        let is_composite = input.is_composite.unwrap_or(false);
        let quantity = input.quantity.unwrap_or(0);

        if let Err(msg) = validation::validate_quantity(quantity) {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
                message_pt: "Quantidade inválida".to_string(),
            });
        }

        if is_composite && quantity != 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Composite products do not store a quantity".to_string(),
                message_pt: "Produtos compostos não armazenam quantidade".to_string(),
            });
        }

        if !is_composite && input.components.as_ref().is_some_and(|c| !c.is_empty()) {
            return Err(AppError::Validation {
                field: "components".to_string(),
                message: "Only composite products have recipe components".to_string(),
                message_pt: "Apenas produtos compostos possuem componentes".to_string(),
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

        // Referenced entities must belong to the same enterprise
        self.assert_sector(enterprise_id, input.sector_id).await?;
        if let Some(category_id) = input.category_id {
            self.assert_category(enterprise_id, category_id).await?;
        }

        let sku_taken = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE enterprise_id = $1 AND sku = $2",
        )
        .bind(enterprise_id)
        .bind(&input.sku)
        .fetch_one(&self.db)
        .await?;

        if sku_taken > 0 {
            return Err(AppError::DuplicateEntry("sku".to_string()));
        }

        let components = input.components.unwrap_or_default();
        for component in &components {
            if component.quantity_per_unit < 1 {
                return Err(AppError::InvalidComponentRequirement(format!(
                    "component {} requires a quantity per unit of at least 1",
                    component.component_id
                )));
            }
        }
        self.assert_components(enterprise_id, &components).await?;

        let mut tx = self.db.begin().await?;

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products
                (enterprise_id, sector_id, category_id, sku, name, description, price,
                 is_composite, quantity, min_quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(enterprise_id)
        .bind(input.sector_id)
        .bind(input.category_id)
        .bind(&input.sku)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(is_composite)
        .bind(quantity)
        .bind(min_quantity)
        .fetch_one(&mut *tx)
        .await?;

        for component in &components {
            sqlx::query(
                r#"
                INSERT INTO product_components (product_id, component_id, quantity_per_unit)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(product.id)
            .bind(component.component_id)
            .bind(component.quantity_per_unit)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(product)
    }

    /// List products with optional filters
    pub async fn list(
        &self,
        enterprise_id: Uuid,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> AppResult<(Vec<Product>, u64)> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM products
            WHERE enterprise_id = $1
              AND ($2::uuid IS NULL OR sector_id = $2)
              AND ($3::uuid IS NULL OR category_id = $3)
              AND ($4::text IS NULL OR name ILIKE '%' || $4 || '%' OR sku ILIKE '%' || $4 || '%')
            "#,
        )
        .bind(enterprise_id)
        .bind(filter.sector_id)
        .bind(filter.category_id)
        .bind(&filter.search)
        .fetch_one(&self.db)
        .await?;

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {}
            FROM products
            WHERE enterprise_id = $1
              AND ($2::uuid IS NULL OR sector_id = $2)
              AND ($3::uuid IS NULL OR category_id = $3)
              AND ($4::text IS NULL OR name ILIKE '%' || $4 || '%' OR sku ILIKE '%' || $4 || '%')
            ORDER BY name ASC
            LIMIT $5 OFFSET $6
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(enterprise_id)
        .bind(filter.sector_id)
        .bind(filter.category_id)
        .bind(&filter.search)
        .bind(i64::from(pagination.per_page))
        .bind(i64::from(pagination.offset()))
        .fetch_all(&self.db)
        .await?;

        Ok((products, total as u64))
    }

    /// Get a product by id
    pub async fn get_by_id(&self, enterprise_id: Uuid, product_id: Uuid) -> AppResult<Product> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1 AND enterprise_id = $2",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .bind(enterprise_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(product)
    }

    /// Get a product with its recipe and derived availability
    pub async fn get_detail(&self, enterprise_id: Uuid, product_id: Uuid) -> AppResult<ProductDetail> {
        let product = self.get_by_id(enterprise_id, product_id).await?;
        let components = self.fetch_components(product_id).await?;

        let available_units = if product.is_composite {
            let lines: Vec<RecipeLine> = components
                .iter()
                .map(|c| RecipeLine {
                    available: c.available_quantity,
                    required_per_unit: c.quantity_per_unit,
                })
                .collect();
            Some(assemblable_units(&lines)?)
        } else {
            None
        };

        Ok(ProductDetail {
            product,
            components,
            available_units,
        })
    }

    /// Update product attributes, recording descriptive edits in the ledger
    pub async fn update(
        &self,
        enterprise_id: Uuid,
        product_id: Uuid,
        input: UpdateProductInput,
        actor_name: &str,
    ) -> AppResult<Product> {
        let existing = self.get_by_id(enterprise_id, product_id).await?;

        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: "Product name cannot be empty".to_string(),
                    message_pt: "O nome do produto não pode ser vazio".to_string(),
                });
            }
        }

        if let Some(price) = input.price {
            if let Err(msg) = validation::validate_price(price) {
                return Err(AppError::Validation {
                    field: "price".to_string(),
                    message: msg.to_string(),
                    message_pt: "Preço inválido".to_string(),
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

        if let Some(category_id) = input.category_id {
            self.assert_category(enterprise_id, category_id).await?;
        }

        let mut tx = self.db.begin().await?;

        let updated = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                price = COALESCE($3, price),
                category_id = COALESCE($4, category_id),
                min_quantity = COALESCE($5, min_quantity),
                updated_at = NOW()
            WHERE id = $6 AND enterprise_id = $7
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category_id)
        .bind(input.min_quantity)
        .bind(product_id)
        .bind(enterprise_id)
        .fetch_one(&mut *tx)
        .await?;

        // Descriptive edits become ledger entries with previous == new
        if updated.name != existing.name {
            ledger::record_entry(
                &mut *tx,
                &edit_entry(
                    &existing,
                    ChangeType::NameEdit,
                    format!("Name changed from '{}' to '{}'", existing.name, updated.name),
                    actor_name,
                ),
            )
            .await?;
        }

        if updated.description != existing.description {
            ledger::record_entry(
                &mut *tx,
                &edit_entry(
                    &existing,
                    ChangeType::DescriptionEdit,
                    "Description updated".to_string(),
                    actor_name,
                ),
            )
            .await?;
        }

        if updated.price != existing.price {
            ledger::record_entry(
                &mut *tx,
                &edit_entry(
                    &existing,
                    ChangeType::PriceEdit,
                    format!("Price changed from {} to {}", existing.price, updated.price),
                    actor_name,
                ),
            )
            .await?;
        }

        tx.commit().await?;

        Ok(updated)
    }

    /// Delete a product.
    ///
    /// Earlier ledger entries are detached from the id but keep the name
    /// snapshot, a final deletion entry records the removal of whatever
    /// quantity remained, and only then does the row go away. All of it
    /// commits atomically.
    pub async fn delete(
        &self,
        enterprise_id: Uuid,
        product_id: Uuid,
        actor_name: &str,
    ) -> AppResult<()> {
        let product = self.get_by_id(enterprise_id, product_id).await?;

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE stock_ledger
            SET subject_id = NULL, subject_name = $1
            WHERE subject_id = $2 AND enterprise_id = $3
            "#,
        )
        .bind(&product.name)
        .bind(product_id)
        .bind(enterprise_id)
        .execute(&mut *tx)
        .await?;

        ledger::record_entry(
            &mut *tx,
            &NewLedgerEntry {
                enterprise_id,
                subject_id: None,
                subject_kind: SubjectKind::Product,
                subject_name: Some(product.name.clone()),
                change_type: ChangeType::Deletion,
                previous_quantity: product.quantity,
                new_quantity: 0,
                description: Some(format!("Product '{}' deleted", product.name)),
                actor_name: Some(actor_name.to_string()),
            },
        )
        .await?;

        // Old notifications stay readable after the product is gone
        sqlx::query(
            "UPDATE notifications SET subject_id = NULL WHERE subject_id = $1 AND enterprise_id = $2",
        )
        .bind(product_id)
        .bind(enterprise_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM products WHERE id = $1 AND enterprise_id = $2")
            .bind(product_id)
            .bind(enterprise_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    // ========================================================================
    // Availability and recipe
    // ========================================================================

    /// Current availability: stored quantity for simple products, derived
    /// assemblable units for composite ones
    pub async fn availability(
        &self,
        enterprise_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<ProductAvailability> {
        let product = self.get_by_id(enterprise_id, product_id).await?;

        let available_units = if product.is_composite {
            let components = self.fetch_components(product_id).await?;
            let lines: Vec<RecipeLine> = components
                .iter()
                .map(|c| RecipeLine {
                    available: c.available_quantity,
                    required_per_unit: c.quantity_per_unit,
                })
                .collect();
            assemblable_units(&lines)?
        } else {
            product.quantity
        };

        Ok(ProductAvailability {
            product_id,
            is_composite: product.is_composite,
            available_units,
        })
    }

    /// List a product's recipe lines
    pub async fn list_components(
        &self,
        enterprise_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Vec<ProductComponentLink>> {
        // Ownership check before exposing the recipe
        self.get_by_id(enterprise_id, product_id).await?;
        self.fetch_components(product_id).await
    }

    /// Add a recipe line to a composite product
    pub async fn add_component(
        &self,
        enterprise_id: Uuid,
        product_id: Uuid,
        input: ComponentRequirementInput,
    ) -> AppResult<ProductComponentLink> {
        let product = self.get_by_id(enterprise_id, product_id).await?;

        if !product.is_composite {
            return Err(AppError::Validation {
                field: "product_id".to_string(),
                message: "Only composite products have recipe components".to_string(),
                message_pt: "Apenas produtos compostos possuem componentes".to_string(),
            });
        }

        if input.quantity_per_unit < 1 {
            return Err(AppError::InvalidComponentRequirement(format!(
                "component {} requires a quantity per unit of at least 1",
                input.component_id
            )));
        }

        self.assert_components(enterprise_id, std::slice::from_ref(&input))
            .await?;

        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM product_components
                WHERE product_id = $1 AND component_id = $2
            )
            "#,
        )
        .bind(product_id)
        .bind(input.component_id)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry("component".to_string()));
        }

        let link_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO product_components (product_id, component_id, quantity_per_unit)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(product_id)
        .bind(input.component_id)
        .bind(input.quantity_per_unit)
        .fetch_one(&self.db)
        .await?;

        let link = sqlx::query_as::<_, ProductComponentLink>(
            r#"
            SELECT pc.id, pc.product_id, pc.component_id, sc.name AS component_name,
                   pc.quantity_per_unit, sc.quantity AS available_quantity, sc.unit
            FROM product_components pc
            JOIN stock_components sc ON sc.id = pc.component_id
            WHERE pc.id = $1
            "#,
        )
        .bind(link_id)
        .fetch_one(&self.db)
        .await?;

        Ok(link)
    }

    /// Remove a recipe line
    pub async fn remove_component(
        &self,
        enterprise_id: Uuid,
        product_id: Uuid,
        component_id: Uuid,
    ) -> AppResult<()> {
        self.get_by_id(enterprise_id, product_id).await?;

        let result = sqlx::query(
            "DELETE FROM product_components WHERE product_id = $1 AND component_id = $2",
        )
        .bind(product_id)
        .bind(component_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product component".to_string()));
        }

        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn fetch_components(&self, product_id: Uuid) -> AppResult<Vec<ProductComponentLink>> {
        let components = sqlx::query_as::<_, ProductComponentLink>(
            r#"
            SELECT pc.id, pc.product_id, pc.component_id, sc.name AS component_name,
                   pc.quantity_per_unit, sc.quantity AS available_quantity, sc.unit
            FROM product_components pc
            JOIN stock_components sc ON sc.id = pc.component_id
            WHERE pc.product_id = $1
            ORDER BY sc.name ASC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(components)
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

    async fn assert_components(
        &self,
        enterprise_id: Uuid,
        components: &[ComponentRequirementInput],
    ) -> AppResult<()> {
        for component in components {
            let found = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*)
                FROM stock_components sc
                JOIN stocks s ON s.id = sc.stock_id
                WHERE sc.id = $1 AND s.enterprise_id = $2
                "#,
            )
            .bind(component.component_id)
            .bind(enterprise_id)
            .fetch_one(&self.db)
            .await?;

            if found == 0 {
                return Err(AppError::NotFound("Stock component".to_string()));
            }
        }

        Ok(())
    }
}

fn edit_entry(
    product: &Product,
    change_type: ChangeType,
    description: String,
    actor_name: &str,
) -> NewLedgerEntry {
    NewLedgerEntry {
        enterprise_id: product.enterprise_id,
        subject_id: Some(product.id),
        subject_kind: SubjectKind::Product,
        subject_name: Some(product.name.clone()),
        change_type,
        previous_quantity: product.quantity,
        new_quantity: product.quantity,
        description: Some(description),
        actor_name: Some(actor_name.to_string()),
    }
}
