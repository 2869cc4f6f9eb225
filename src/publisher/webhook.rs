// Copyright (c) 2025 - Cowboy AI, Inc.
//! Webhook wire format and delivery seam

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::DeliveryError;
use crate::events::Event;

/// JSON document POSTed to the webhook for one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    pub data: Value,
    /// Always present on the wire, `null` when the event has none
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<&Event> for WebhookPayload {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            event_type: event.event_type.clone(),
            source: event.source.clone(),
            data: event.data.clone(),
            metadata: event.metadata.clone(),
            created_at: event.created_at,
        }
    }
}

/// Transport that hands a payload to the webhook consumer
///
/// Returns `Ok` only for a 2xx answer.
#[async_trait]
pub trait WebhookSink: Send + Sync {
    async fn deliver(&self, payload: &WebhookPayload) -> Result<(), DeliveryError>;
}

#[async_trait]
impl<T: WebhookSink + ?Sized> WebhookSink for Arc<T> {
    async fn deliver(&self, payload: &WebhookPayload) -> Result<(), DeliveryError> {
        (**self).deliver(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventStatus;
    use serde_json::json;

    #[test]
    fn test_payload_wire_format() {
        let created_at = "2026-01-19T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let event = Event {
            id: Uuid::nil(),
            event_type: "user.created".to_string(),
            source: "users".to_string(),
            data: json!({"id": 1}),
            metadata: None,
            status: EventStatus::Failed,
            retry_count: 2,
            last_error: "boom".to_string(),
            created_at,
            updated_at: created_at,
            published_at: None,
        };

        let wire = serde_json::to_value(WebhookPayload::from(&event)).unwrap();

        assert_eq!(
            wire,
            json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "type": "user.created",
                "source": "users",
                "data": {"id": 1},
                "metadata": null,
                "created_at": "2026-01-19T12:00:00Z",
            })
        );
    }
}
