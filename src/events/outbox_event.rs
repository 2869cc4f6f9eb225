// Copyright (c) 2025 - Cowboy AI, Inc.
//! Outbox Event
//!
//! An outbox event is written once by a producer in `Pending` status and then
//! moved through its delivery lifecycle by the publisher:
//!
//! ```text
//! Pending ──publish ok──> Published
//!    │
//!    └──publish failed──> Failed ──retry ok──> Published
//!                           ↑  │
//!                           └──┘ retry failed (retry_count + 1)
//! ```
//!
//! `published_at` is set if and only if the status is `Published`, and
//! `retry_count` never decreases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::errors::{OutboxError, OutboxResult};

/// Delivery status of an outbox event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Waiting for its first delivery attempt
    Pending,
    /// Delivered to the webhook
    Published,
    /// Last delivery attempt failed
    Failed,
    /// Queued for another delivery attempt
    Retrying,
}

impl EventStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [EventStatus; 4] = [
        EventStatus::Pending,
        EventStatus::Published,
        EventStatus::Failed,
        EventStatus::Retrying,
    ];

    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Published => "published",
            EventStatus::Failed => "failed",
            EventStatus::Retrying => "retrying",
        }
    }

    /// Parse the storage representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(EventStatus::Pending),
            "published" => Some(EventStatus::Published),
            "failed" => Some(EventStatus::Failed),
            "retrying" => Some(EventStatus::Retrying),
            _ => None,
        }
    }

    /// Whether the publisher may pick this event up
    pub fn is_deliverable(&self) -> bool {
        matches!(self, EventStatus::Pending | EventStatus::Retrying)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted outbox event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,

    #[serde(rename = "type")]
    pub event_type: String,

    pub source: String,

    /// Opaque payload, stored verbatim
    pub data: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    pub status: EventStatus,

    pub retry_count: u32,

    /// Most recent failure, empty when not applicable
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_error: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Build a fresh `Pending` event from an already validated request
    pub(crate) fn pending(
        id: Uuid,
        event_type: String,
        source: String,
        data: Value,
        metadata: Option<Value>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            event_type,
            source,
            data,
            metadata,
            status: EventStatus::Pending,
            retry_count: 0,
            last_error: String::new(),
            created_at: now,
            updated_at: now,
            published_at: None,
        }
    }

    /// Apply a status mutation, keeping `published_at` in step with the status
    pub(crate) fn apply_status(
        &mut self,
        status: EventStatus,
        last_error: String,
        retry_count: u32,
        now: DateTime<Utc>,
    ) {
        self.status = status;
        self.last_error = last_error;
        self.retry_count = self.retry_count.max(retry_count);
        self.updated_at = now;
        self.published_at = match status {
            EventStatus::Published => Some(now),
            _ => None,
        };
    }
}

/// Request to create an outbox event
///
/// `data` and `metadata` carry raw JSON text as received from the producer.
/// They are parsed when the event is created, and creation fails with
/// [`OutboxError::Validation`] when either is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    pub data: String,
    #[serde(default)]
    pub metadata: Option<String>,
}

impl NewEvent {
    /// Create a request with raw JSON `data`
    pub fn new(
        event_type: impl Into<String>,
        source: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            source: source.into(),
            data: data.into(),
            metadata: None,
        }
    }

    /// Create a request from parsed JSON values
    pub fn from_values(
        event_type: impl Into<String>,
        source: impl Into<String>,
        data: &Value,
        metadata: Option<&Value>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            source: source.into(),
            data: data.to_string(),
            metadata: metadata.map(Value::to_string),
        }
    }

    /// Attach raw JSON metadata
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// Parse `data` and `metadata`
    ///
    /// Blank metadata is treated as absent.
    pub fn parse_payload(&self) -> OutboxResult<(Value, Option<Value>)> {
        let data = serde_json::from_str(&self.data).map_err(|e| {
            OutboxError::Validation(format!("invalid JSON in data field: {}", e))
        })?;

        let metadata = match self.metadata.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(serde_json::from_str(raw).map_err(|e| {
                OutboxError::Validation(format!("invalid JSON in metadata field: {}", e))
            })?),
        };

        Ok((data, metadata))
    }
}
