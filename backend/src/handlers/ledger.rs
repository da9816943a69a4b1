//! Stock history and movement report HTTP handlers

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::ledger::{LedgerEntry, LedgerService};
use crate::services::ReportingService;
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub subject_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Deserialize)]
pub struct DailyReportQuery {
    pub date: Option<NaiveDate>,
    pub format: Option<String>,
}

#[derive(Deserialize)]
pub struct MonthlyReportQuery {
    pub year: i32,
    pub month: u32,
    pub format: Option<String>,
}

/// List ledger entries for the enterprise, newest first
pub async fn list_stock_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<PaginatedResponse<LedgerEntry>>> {
    let pagination = Pagination::new(query.page, query.per_page);
    let service = LedgerService::new(state.db.clone());

    let (entries, total) = service
        .list_entries(current_user.0.enterprise_id, query.subject_id, pagination)
        .await?;

    Ok(Json(PaginatedResponse::new(entries, pagination, total)))
}

/// Movement report for one day (defaults to today, UTC)
pub async fn get_daily_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<DailyReportQuery>,
) -> AppResult<impl IntoResponse> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let service = ReportingService::new(state.db.clone());

    let report = service
        .daily_report(current_user.0.enterprise_id, date)
        .await?;

    if query.format.as_deref() == Some("csv") {
        let rows = ReportingService::csv_rows(&report.report);
        let csv = ReportingService::export_to_csv(&rows)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"daily_movements.csv\"",
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(report).into_response())
    }
}

/// Movement report for one calendar month
pub async fn get_monthly_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<MonthlyReportQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.db.clone());

    let report = service
        .monthly_report(current_user.0.enterprise_id, query.year, query.month)
        .await?;

    if query.format.as_deref() == Some("csv") {
        let rows = ReportingService::csv_rows(&report.report);
        let csv = ReportingService::export_to_csv(&rows)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"monthly_movements.csv\"",
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(report).into_response())
    }
}
