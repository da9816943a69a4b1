//! Transactional mail provider client
//!
//! Low stock alert emails go through a JSON-over-HTTP mail provider. The
//! client is optional: with no endpoint configured the platform simply
//! skips the email channel and keeps in-app notifications working.

use serde::{Deserialize, Serialize};

use crate::config::MailConfig;

/// Mail provider API client
#[derive(Clone)]
pub struct MailClient {
    api_endpoint: String,
    api_key: String,
    from_address: String,
    http_client: reqwest::Client,
}

/// Outgoing mail request
#[derive(Debug, Serialize)]
struct SendMailRequest {
    from: String,
    to: String,
    subject: String,
    text: String,
}

/// Mail provider API response
#[derive(Debug, Deserialize)]
struct MailApiResponse {
    #[serde(default)]
    message: Option<String>,
}

impl MailClient {
    /// Create a new mail client
    pub fn new(api_endpoint: String, api_key: String, from_address: String) -> Self {
        Self {
            api_endpoint,
            api_key,
            from_address,
            http_client: reqwest::Client::new(),
        }
    }

    /// Create from configuration; `None` when no endpoint is configured
    pub fn from_config(config: &MailConfig) -> Option<Self> {
        if config.api_endpoint.is_empty() {
            return None;
        }
        Some(Self::new(
            config.api_endpoint.clone(),
            config.api_key.clone(),
            config.from_address.clone(),
        ))
    }

    /// Send a plain-text email
    pub async fn send_mail(&self, to: &str, subject: &str, text: &str) -> Result<(), String> {
        let request = SendMailRequest {
            from: self.from_address.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            text: text.to_string(),
        };

        let response = self
            .http_client
            .post(&self.api_endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Failed to send mail: {}", e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let error: MailApiResponse = response.json().await.unwrap_or(MailApiResponse {
                message: Some("Unknown error".to_string()),
            });
            Err(error.message.unwrap_or_else(|| "Unknown error".to_string()))
        }
    }

    /// Send a low stock alert email
    pub async fn send_low_stock_alert(
        &self,
        to: &str,
        subject_name: &str,
        quantity: i64,
        min_quantity: i64,
    ) -> Result<(), String> {
        let subject = format!("Low stock alert: {}", subject_name);
        let body = shared::models::low_stock_message(subject_name, quantity, min_quantity);
        self.send_mail(to, &subject, &body).await
    }
}
