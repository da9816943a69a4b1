//! Enterprise (tenant) service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::validation;

/// Enterprise service
#[derive(Clone)]
pub struct EnterpriseService {
    db: PgPool,
}

/// An enterprise row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Enterprise {
    pub id: Uuid,
    pub name: String,
    pub tax_id: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub plan: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inventory counters shown on the enterprise profile
#[derive(Debug, Serialize)]
pub struct EnterpriseStats {
    pub sector_count: i64,
    pub product_count: i64,
    pub component_count: i64,
    pub user_count: i64,
    pub low_stock_count: i64,
    pub unread_notification_count: i64,
}

/// Profile payload: the tenant plus its counters
#[derive(Debug, Serialize)]
pub struct EnterpriseProfile {
    #[serde(flatten)]
    pub enterprise: Enterprise,
    pub stats: EnterpriseStats,
}

/// Input for updating the enterprise. The tax id is fixed at registration.
#[derive(Debug, Deserialize)]
pub struct UpdateEnterpriseInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

const ENTERPRISE_COLUMNS: &str =
    "id, name, tax_id, email, phone, address, city, state, plan, status, created_at, updated_at";

impl EnterpriseService {
    /// Create a new EnterpriseService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get the current tenant with its inventory counters
    pub async fn get_profile(&self, enterprise_id: Uuid) -> AppResult<EnterpriseProfile> {
        let enterprise = self.get_by_id(enterprise_id).await?;

        let sector_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sectors WHERE enterprise_id = $1",
        )
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        let product_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE enterprise_id = $1",
        )
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        let component_count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM stock_components sc
            JOIN stocks st ON st.id = sc.stock_id
            WHERE st.enterprise_id = $1
            "#,
        )
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        let user_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE enterprise_id = $1",
        )
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        // Composite products have no stored quantity of their own
        let low_stock_products = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM products
            WHERE enterprise_id = $1 AND is_composite = FALSE AND quantity <= min_quantity
            "#,
        )
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        let low_stock_components = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM stock_components sc
            JOIN stocks st ON st.id = sc.stock_id
            WHERE st.enterprise_id = $1 AND sc.quantity <= sc.min_quantity
            "#,
        )
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        let unread_notification_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE enterprise_id = $1 AND read = FALSE",
        )
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        Ok(EnterpriseProfile {
            enterprise,
            stats: EnterpriseStats {
                sector_count,
                product_count,
                component_count,
                user_count,
                low_stock_count: low_stock_products + low_stock_components,
                unread_notification_count,
            },
        })
    }

    /// Update enterprise contact details
    pub async fn update(
        &self,
        enterprise_id: Uuid,
        input: UpdateEnterpriseInput,
    ) -> AppResult<Enterprise> {
        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: "Enterprise name cannot be empty".to_string(),
                    message_pt: "O nome da empresa não pode ser vazio".to_string(),
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

        if let Some(phone) = &input.phone {
            if let Err(msg) = validation::validate_phone(phone) {
                return Err(AppError::Validation {
                    field: "phone".to_string(),
                    message: msg.to_string(),
                    message_pt: "Telefone inválido".to_string(),
                });
            }
        }

        let enterprise = sqlx::query_as::<_, Enterprise>(&format!(
            r#"
            UPDATE enterprises
            SET name = COALESCE($1, name),
                email = COALESCE($2, email),
                phone = COALESCE($3, phone),
                address = COALESCE($4, address),
                city = COALESCE($5, city),
                state = COALESCE($6, state),
                updated_at = NOW()
            WHERE id = $7
            RETURNING {}
            "#,
            ENTERPRISE_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.state)
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        Ok(enterprise)
    }

    async fn get_by_id(&self, enterprise_id: Uuid) -> AppResult<Enterprise> {
        let enterprise = sqlx::query_as::<_, Enterprise>(&format!(
            "SELECT {} FROM enterprises WHERE id = $1",
            ENTERPRISE_COLUMNS
        ))
        .bind(enterprise_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Enterprise".to_string()))?;

        Ok(enterprise)
    }
}
