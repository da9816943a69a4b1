//! Stock movement reporting service
//!
//! Reports are folded from the ledger alone, so they survive subject
//! deletion and rename. The daily window is [00:00, next day 00:00) UTC;
//! the monthly window covers the whole calendar month.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::LedgerService;
use shared::models::{
    aggregate_movements, daily_activity, DailyActivity, MovementRecord, MovementReport,
};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    ledger: LedgerService,
}

/// Movement report for one calendar day
#[derive(Debug, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub report: MovementReport,
}

/// Movement report for one calendar month, with per-day counts
#[derive(Debug, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub report: MovementReport,
    pub daily_activity: BTreeMap<NaiveDate, DailyActivity>,
}

/// Flat per-subject row for CSV export
#[derive(Debug, Serialize)]
pub struct SubjectCsvRow {
    pub subject: String,
    pub inbound_total: i64,
    pub outbound_total: i64,
    pub adjustment_total: i64,
    pub movement_count: i64,
}

impl ReportingService {
    /// Create a new ReportingService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            ledger: LedgerService::new(db),
        }
    }

    /// Movement report for one day
    pub async fn daily_report(&self, enterprise_id: Uuid, date: NaiveDate) -> AppResult<DailyReport> {
        let start = day_start(date);
        let end = start + Duration::days(1);

        let records = self.load_records(enterprise_id, start, end).await?;
        let report = aggregate_movements(&records);

        Ok(DailyReport { date, report })
    }

    /// Movement report for one calendar month
    pub async fn monthly_report(
        &self,
        enterprise_id: Uuid,
        year: i32,
        month: u32,
    ) -> AppResult<MonthlyReport> {
        if !(1..=12).contains(&month) {
            return Err(AppError::ValidationError(
                "Month must be between 1 and 12".to_string(),
            ));
        }

        let first_day = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AppError::ValidationError("Invalid year or month".to_string()))?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| AppError::ValidationError("Invalid year or month".to_string()))?;

        let start = day_start(first_day);
        let end = day_start(next_month);

        let records = self.load_records(enterprise_id, start, end).await?;
        let report = aggregate_movements(&records);
        let activity = daily_activity(&records);

        Ok(MonthlyReport {
            year,
            month,
            report,
            daily_activity: activity,
        })
    }

    /// Flatten a report's per-subject breakdown for CSV export
    pub fn csv_rows(report: &MovementReport) -> Vec<SubjectCsvRow> {
        report
            .per_subject
            .iter()
            .map(|subject| SubjectCsvRow {
                subject: subject.subject_name.clone(),
                inbound_total: subject.inbound_total,
                outbound_total: subject.outbound_total,
                adjustment_total: subject.adjustment_total,
                movement_count: subject.movement_count,
            })
            .collect()
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }

    async fn load_records(
        &self,
        enterprise_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<MovementRecord>> {
        let entries = self.ledger.entries_between(enterprise_id, start, end).await?;
        entries.iter().map(|entry| entry.as_record()).collect()
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
