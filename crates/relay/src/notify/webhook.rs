//! JSON webhook notifier.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::DeliveryError;

use super::Notifier;

/// Per-request timeout for webhook calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Webhook notifier posting `{"content": message}`.
pub struct WebhookNotifier {
    webhook_url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Create a notifier for a specific webhook URL.
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(webhook_url, client))
    }

    /// Create a notifier reusing an existing HTTP client.
    #[must_use]
    pub fn with_client(webhook_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        let payload = WebhookPayload { content: message };

        debug!(channel = self.name(), len = message.len(), "Sending notification");

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            debug!(channel = self.name(), "Notification sent successfully");
            return Ok(());
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());

        warn!(
            channel = self.name(),
            status = %status,
            body = %body,
            "Webhook request failed"
        );

        Err(DeliveryError::Status { status, body })
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}
