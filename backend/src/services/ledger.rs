//! Stock ledger service
//!
//! The ledger is append-only: every quantity movement, descriptive edit and
//! deletion lands here as one entry. Other services write entries through
//! `record_entry` inside their own transactions; this service covers reads.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{ChangeType, MovementRecord, SubjectKind};
use shared::types::Pagination;

/// Ledger service for reading stock history
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

/// A persisted ledger entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub enterprise_id: Uuid,
    pub subject_id: Option<Uuid>,
    pub subject_kind: String,
    pub subject_name: Option<String>,
    pub change_type: String,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub description: Option<String>,
    pub actor_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Convert the row into the pure record the report folds consume.
    /// Stored change types come from our own writes, so failing to parse
    /// one means the row is corrupt.
    pub fn as_record(&self) -> AppResult<MovementRecord> {
        let change_type = ChangeType::parse(&self.change_type).ok_or_else(|| {
            AppError::Internal(format!("Unknown change type in ledger: {}", self.change_type))
        })?;
        let subject_kind = SubjectKind::parse(&self.subject_kind).ok_or_else(|| {
            AppError::Internal(format!("Unknown subject kind in ledger: {}", self.subject_kind))
        })?;

        Ok(MovementRecord {
            subject_id: self.subject_id,
            subject_kind,
            subject_name: self.subject_name.clone(),
            change_type,
            previous_quantity: self.previous_quantity,
            new_quantity: self.new_quantity,
            description: self.description.clone(),
            actor_name: self.actor_name.clone(),
            created_at: self.created_at,
        })
    }
}

/// Data for a new ledger entry
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub enterprise_id: Uuid,
    pub subject_id: Option<Uuid>,
    pub subject_kind: SubjectKind,
    pub subject_name: Option<String>,
    pub change_type: ChangeType,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub description: Option<String>,
    pub actor_name: Option<String>,
}

/// Insert a ledger entry. Takes any executor so callers can write entries
/// inside the same transaction that mutates the subject.
pub async fn record_entry<'e, E>(executor: E, entry: &NewLedgerEntry) -> AppResult<LedgerEntry>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, LedgerEntry>(
        r#"
        INSERT INTO stock_ledger
            (enterprise_id, subject_id, subject_kind, subject_name, change_type,
             previous_quantity, new_quantity, description, actor_name)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, enterprise_id, subject_id, subject_kind, subject_name, change_type,
                  previous_quantity, new_quantity, description, actor_name, created_at
        "#,
    )
    .bind(entry.enterprise_id)
    .bind(entry.subject_id)
    .bind(entry.subject_kind.as_str())
    .bind(&entry.subject_name)
    .bind(entry.change_type.as_str())
    .bind(entry.previous_quantity)
    .bind(entry.new_quantity)
    .bind(&entry.description)
    .bind(&entry.actor_name)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List ledger entries newest first, optionally filtered by subject
    pub async fn list_entries(
        &self,
        enterprise_id: Uuid,
        subject_id: Option<Uuid>,
        pagination: Pagination,
    ) -> AppResult<(Vec<LedgerEntry>, u64)> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM stock_ledger
            WHERE enterprise_id = $1
              AND ($2::uuid IS NULL OR subject_id = $2)
            "#,
        )
        .bind(enterprise_id)
        .bind(subject_id)
        .fetch_one(&self.db)
        .await?;

        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, enterprise_id, subject_id, subject_kind, subject_name, change_type,
                   previous_quantity, new_quantity, description, actor_name, created_at
            FROM stock_ledger
            WHERE enterprise_id = $1
              AND ($2::uuid IS NULL OR subject_id = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(enterprise_id)
        .bind(subject_id)
        .bind(i64::from(pagination.per_page))
        .bind(i64::from(pagination.offset()))
        .fetch_all(&self.db)
        .await?;

        Ok((entries, total as u64))
    }

    /// Fetch all entries in a half-open window `[start, end)`, newest first
    pub async fn entries_between(
        &self,
        enterprise_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, enterprise_id, subject_id, subject_kind, subject_name, change_type,
                   previous_quantity, new_quantity, description, actor_name, created_at
            FROM stock_ledger
            WHERE enterprise_id = $1
              AND created_at >= $2
              AND created_at < $3
            ORDER BY created_at DESC
            "#,
        )
        .bind(enterprise_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }
}
