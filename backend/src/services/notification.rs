//! Notification service for low stock alerts and the in-app feed
//!
//! Supports:
//! - Threshold evaluation after every quantity mutation
//! - One unread notification per subject and kind
//! - Realtime push over the enterprise event room
//! - Cooldown-limited alert emails to the enterprise contact

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::MailClient;
use crate::realtime::{EventBroadcaster, EVENT_NEW_NOTIFICATION};
use shared::models::{cooldown_elapsed, is_low_stock, low_stock_message, LOW_STOCK_KIND};

/// Notification service
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
    events: EventBroadcaster,
    mail_client: Option<MailClient>,
    email_enabled: bool,
    email_cooldown: Duration,
}

/// In-app notification
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub enterprise_id: Uuid,
    pub subject_id: Option<Uuid>,
    pub kind: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(db: PgPool, events: EventBroadcaster, config: &Config) -> Self {
        Self {
            db,
            events,
            mail_client: MailClient::from_config(&config.mail),
            email_enabled: config.alerts.low_stock_email_enabled,
            email_cooldown: Duration::seconds(config.alerts.email_cooldown_secs as i64),
        }
    }

    // ========================================================================
    // Low stock evaluation
    // ========================================================================

    /// Evaluate the low stock threshold after a quantity mutation.
    ///
    /// Creates a notification when the subject sits at or below its minimum
    /// and no unread low stock notification exists for it yet, then pushes
    /// the notification into the enterprise event room and, cooldown
    /// permitting, emails the enterprise contact.
    pub async fn evaluate_low_stock(
        &self,
        enterprise_id: Uuid,
        subject_id: Uuid,
        subject_name: &str,
        quantity: i64,
        min_quantity: i64,
    ) -> AppResult<Option<Notification>> {
        if !is_low_stock(quantity, min_quantity) {
            return Ok(None);
        }

        let message = low_stock_message(subject_name, quantity, min_quantity);

        // The partial unique index on (subject_id, kind) WHERE read = FALSE
        // enforces one unread notification per subject; a concurrent
        // evaluation losing the race gets no row back and stays silent.
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (enterprise_id, subject_id, kind, message)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (subject_id, kind) WHERE read = FALSE DO NOTHING
            RETURNING id, enterprise_id, subject_id, kind, message, read, created_at
            "#,
        )
        .bind(enterprise_id)
        .bind(subject_id)
        .bind(LOW_STOCK_KIND)
        .bind(&message)
        .fetch_optional(&self.db)
        .await?;

        let Some(notification) = notification else {
            return Ok(None);
        };

        self.events
            .publish(enterprise_id, EVENT_NEW_NOTIFICATION, &notification);

        if self.email_enabled {
            self.send_alert_email(enterprise_id, subject_id, subject_name, quantity, min_quantity)
                .await;
        }

        Ok(Some(notification))
    }

    /// Email leg of the alert; failures are logged and never propagated
    async fn send_alert_email(
        &self,
        enterprise_id: Uuid,
        subject_id: Uuid,
        subject_name: &str,
        quantity: i64,
        min_quantity: i64,
    ) {
        if let Err(err) = self
            .try_send_alert_email(enterprise_id, subject_id, subject_name, quantity, min_quantity)
            .await
        {
            tracing::warn!(
                "Low stock alert email for subject {} failed: {:?}",
                subject_id,
                err
            );
        }
    }

    async fn try_send_alert_email(
        &self,
        enterprise_id: Uuid,
        subject_id: Uuid,
        subject_name: &str,
        quantity: i64,
        min_quantity: i64,
    ) -> AppResult<()> {
        let mail_client = match &self.mail_client {
            Some(client) => client,
            None => return Ok(()),
        };

        // Cooldown gate: at most one email per subject per window
        let last_sent = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT last_sent_at FROM email_alert_log WHERE subject_id = $1",
        )
        .bind(subject_id)
        .fetch_optional(&self.db)
        .await?;

        if let Some(last_sent_at) = last_sent {
            if !cooldown_elapsed(last_sent_at, Utc::now(), self.email_cooldown) {
                tracing::debug!(
                    "Skipping alert email for subject {}: cooldown active",
                    subject_id
                );
                return Ok(());
            }
        }

        let contact_email = sqlx::query_scalar::<_, Option<String>>(
            "SELECT email FROM enterprises WHERE id = $1",
        )
        .bind(enterprise_id)
        .fetch_optional(&self.db)
        .await?
        .flatten();

        let to = match contact_email {
            Some(email) => email,
            None => {
                tracing::debug!(
                    "Enterprise {} has no contact email, skipping alert email",
                    enterprise_id
                );
                return Ok(());
            }
        };

        mail_client
            .send_low_stock_alert(&to, subject_name, quantity, min_quantity)
            .await
            .map_err(AppError::ExternalService)?;

        // Record the send time only after the provider accepted the mail
        sqlx::query(
            r#"
            INSERT INTO email_alert_log (enterprise_id, subject_id, last_sent_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (subject_id) DO UPDATE SET last_sent_at = NOW()
            "#,
        )
        .bind(enterprise_id)
        .bind(subject_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    // ========================================================================
    // Notification feed
    // ========================================================================

    /// List notifications newest first
    pub async fn list(
        &self,
        enterprise_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, enterprise_id, subject_id, kind, message, read, created_at
            FROM notifications
            WHERE enterprise_id = $1
              AND ($2 = FALSE OR read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(enterprise_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(notifications)
    }

    /// Count unread notifications
    pub async fn unread_count(&self, enterprise_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE enterprise_id = $1 AND read = FALSE",
        )
        .bind(enterprise_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// Mark a notification as read. Reading is one-way: a later quantity
    /// mutation below the threshold creates a fresh notification instead.
    pub async fn mark_as_read(
        &self,
        enterprise_id: Uuid,
        notification_id: Uuid,
    ) -> AppResult<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET read = TRUE
            WHERE id = $1 AND enterprise_id = $2
            RETURNING id, enterprise_id, subject_id, kind, message, read, created_at
            "#,
        )
        .bind(notification_id)
        .bind(enterprise_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification".to_string()))?;

        Ok(notification)
    }
}
