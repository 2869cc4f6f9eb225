// Copyright (c) 2025 - Cowboy AI, Inc.

//! HTTP Webhook Sink
//!
//! Delivers outbox events to the configured consumer endpoint:
//!
//! ```text
//! POST {webhook_url}
//! Content-Type: application/json
//! User-Agent: outbox-relay/<version>
//!
//! { "id", "type", "source", "data", "metadata", "created_at" }
//! ```
//!
//! Any 2xx answer is a successful delivery. Every other status, and any
//! transport failure including the request timeout, is a delivery failure.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::PublishConfig;
use crate::errors::{DeliveryError, OutboxError, OutboxResult};
use crate::publisher::{WebhookPayload, WebhookSink};

const USER_AGENT: &str = concat!("outbox-relay/", env!("CARGO_PKG_VERSION"));

/// Webhook sink over reqwest
#[derive(Clone)]
pub struct HttpWebhookSink {
    url: String,
    client: Client,
}

impl HttpWebhookSink {
    /// Create a sink for `url` with a bounded request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> OutboxResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                OutboxError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create a sink from the publish settings
    pub fn from_config(config: &PublishConfig) -> OutboxResult<Self> {
        Self::new(config.webhook_url.clone(), config.webhook_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WebhookSink for HttpWebhookSink {
    async fn deliver(&self, payload: &WebhookPayload) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(payload).map_err(|e| DeliveryError::Encode(e.to_string()))?;

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(event_id = %payload.id, status = status.as_u16(), "Webhook accepted event");
            Ok(())
        } else {
            Err(DeliveryError::Status(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("outbox-relay/"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_failure() {
        let sink = HttpWebhookSink::new("http://127.0.0.1:9/hook", Duration::from_secs(2)).unwrap();
        let payload = WebhookPayload {
            id: uuid::Uuid::now_v7(),
            event_type: "user.created".to_string(),
            source: "users".to_string(),
            data: serde_json::json!({}),
            metadata: None,
            created_at: chrono::Utc::now(),
        };

        let result = sink.deliver(&payload).await;
        assert!(matches!(result, Err(DeliveryError::Transport(_))));
    }
}
