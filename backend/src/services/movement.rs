//! Stock movement engine
//!
//! Applies inbound/outbound/adjustment movements to products and stock
//! components. Concurrency control is optimistic: the UPDATE only matches
//! when the quantity still equals the snapshot the movement was computed
//! from, and a lost race reloads and retries a bounded number of times.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{self, NewLedgerEntry};
use crate::services::notification::NotificationService;
use shared::models::{apply_movement, ChangeType, SubjectKind};

/// How many times a movement is retried after losing a concurrent update
/// race before giving up with a conflict
pub const MAX_MOVEMENT_ATTEMPTS: u32 = 3;

/// Stock movement service
#[derive(Clone)]
pub struct MovementService {
    db: PgPool,
    notifier: NotificationService,
}

/// Input for a stock movement request
#[derive(Debug, Deserialize)]
pub struct MoveStockInput {
    pub change_type: ChangeType,
    pub amount: i64,
    pub description: Option<String>,
}

/// Result of an applied movement
#[derive(Debug, Serialize)]
pub struct StockMovement {
    pub subject_id: Uuid,
    pub subject_kind: SubjectKind,
    pub subject_name: String,
    pub change_type: ChangeType,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub ledger_entry_id: Uuid,
}

/// Snapshot of the subject a movement applies to
#[derive(Debug, FromRow)]
struct SubjectRow {
    name: String,
    quantity: i64,
    min_quantity: i64,
    is_composite: bool,
}

impl MovementService {
    /// Create a new MovementService instance
    pub fn new(db: PgPool, notifier: NotificationService) -> Self {
        Self { db, notifier }
    }

    /// Apply a movement to a product or stock component.
    ///
    /// On success the quantity update and the ledger entry are committed
    /// atomically; the low stock evaluation runs after the commit and its
    /// failures never undo the movement.
    pub async fn apply(
        &self,
        enterprise_id: Uuid,
        subject_kind: SubjectKind,
        subject_id: Uuid,
        input: MoveStockInput,
        actor_name: &str,
    ) -> AppResult<StockMovement> {
        if !input.change_type.is_stock_movement() {
            return Err(AppError::InvalidChangeType(
                input.change_type.as_str().to_string(),
            ));
        }

        for attempt in 1..=MAX_MOVEMENT_ATTEMPTS {
            let subject = self.load_subject(enterprise_id, subject_kind, subject_id).await?;

            if subject.is_composite {
                return Err(AppError::Validation {
                    field: "subject_id".to_string(),
                    message: "Composite product quantity is derived from its components"
                        .to_string(),
                    message_pt: "A quantidade de um produto composto é derivada dos componentes"
                        .to_string(),
                });
            }

            let new_quantity = apply_movement(input.change_type, subject.quantity, input.amount)?;

            let mut tx = self.db.begin().await?;

            // Compare-and-set: only update if nobody moved the quantity
            // since the snapshot was read
            let updated = match subject_kind {
                SubjectKind::Product => {
                    sqlx::query(
                        r#"
                        UPDATE products
                        SET quantity = $1, updated_at = NOW()
                        WHERE id = $2 AND enterprise_id = $3 AND quantity = $4
                        "#,
                    )
                    .bind(new_quantity)
                    .bind(subject_id)
                    .bind(enterprise_id)
                    .bind(subject.quantity)
                    .execute(&mut *tx)
                    .await?
                }
                SubjectKind::Component => {
                    sqlx::query(
                        r#"
                        UPDATE stock_components sc
                        SET quantity = $1, updated_at = NOW()
                        FROM stocks s
                        WHERE sc.id = $2
                          AND sc.stock_id = s.id
                          AND s.enterprise_id = $3
                          AND sc.quantity = $4
                        "#,
                    )
                    .bind(new_quantity)
                    .bind(subject_id)
                    .bind(enterprise_id)
                    .bind(subject.quantity)
                    .execute(&mut *tx)
                    .await?
                }
            };

            if updated.rows_affected() == 0 {
                // Lost the race: roll back, reload the fresh quantity and retry
                tx.rollback().await?;
                tracing::debug!(
                    "Movement on {} {} lost update race (attempt {}/{})",
                    subject_kind.as_str(),
                    subject_id,
                    attempt,
                    MAX_MOVEMENT_ATTEMPTS
                );
                continue;
            }

            let entry = ledger::record_entry(
                &mut *tx,
                &NewLedgerEntry {
                    enterprise_id,
                    subject_id: Some(subject_id),
                    subject_kind,
                    subject_name: Some(subject.name.clone()),
                    change_type: input.change_type,
                    previous_quantity: subject.quantity,
                    new_quantity,
                    description: input.description.clone(),
                    actor_name: Some(actor_name.to_string()),
                },
            )
            .await?;

            tx.commit().await?;

            // Post-commit side effect; errors are logged, never propagated
            if let Err(err) = self
                .notifier
                .evaluate_low_stock(
                    enterprise_id,
                    subject_id,
                    &subject.name,
                    new_quantity,
                    subject.min_quantity,
                )
                .await
            {
                tracing::warn!(
                    "Low stock evaluation failed for {} {}: {:?}",
                    subject_kind.as_str(),
                    subject_id,
                    err
                );
            }

            return Ok(StockMovement {
                subject_id,
                subject_kind,
                subject_name: subject.name,
                change_type: input.change_type,
                previous_quantity: subject.quantity,
                new_quantity,
                ledger_entry_id: entry.id,
            });
        }

        Err(AppError::Conflict {
            resource: "stock".to_string(),
            message: "Concurrent stock updates kept invalidating this movement; please retry"
                .to_string(),
            message_pt: "Atualizações simultâneas impediram o movimento; tente novamente"
                .to_string(),
        })
    }

    async fn load_subject(
        &self,
        enterprise_id: Uuid,
        subject_kind: SubjectKind,
        subject_id: Uuid,
    ) -> AppResult<SubjectRow> {
        let subject = match subject_kind {
            SubjectKind::Product => {
                sqlx::query_as::<_, SubjectRow>(
                    r#"
                    SELECT name, quantity, min_quantity, is_composite
                    FROM products
                    WHERE id = $1 AND enterprise_id = $2
                    "#,
                )
                .bind(subject_id)
                .bind(enterprise_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Product".to_string()))?
            }
            SubjectKind::Component => {
                sqlx::query_as::<_, SubjectRow>(
                    r#"
                    SELECT sc.name, sc.quantity, sc.min_quantity, FALSE AS is_composite
                    FROM stock_components sc
                    JOIN stocks s ON s.id = sc.stock_id
                    WHERE sc.id = $1 AND s.enterprise_id = $2
                    "#,
                )
                .bind(subject_id)
                .bind(enterprise_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Stock component".to_string()))?
            }
        };

        Ok(subject)
    }
}
