//! HTTP handlers for notification endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::notification::{Notification, NotificationService};
use crate::AppState;

const DEFAULT_FEED_LIMIT: i64 = 50;

/// Query parameters for listing notifications
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

/// List notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let service = NotificationService::new(state.db.clone(), state.events.clone(), &state.config);

    let limit = query.limit.unwrap_or(DEFAULT_FEED_LIMIT).clamp(1, 200);
    let notifications = service
        .list(
            current_user.0.enterprise_id,
            query.unread_only.unwrap_or(false),
            limit,
        )
        .await?;

    Ok(Json(notifications))
}

/// Count unread notifications
pub async fn get_unread_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<UnreadCountResponse>> {
    let service = NotificationService::new(state.db.clone(), state.events.clone(), &state.config);
    let unread_count = service.unread_count(current_user.0.enterprise_id).await?;

    Ok(Json(UnreadCountResponse { unread_count }))
}

/// Mark a notification as read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<Notification>> {
    let service = NotificationService::new(state.db.clone(), state.events.clone(), &state.config);
    let notification = service
        .mark_as_read(current_user.0.enterprise_id, notification_id)
        .await?;

    Ok(Json(notification))
}
