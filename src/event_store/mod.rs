// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Store Abstraction
//!
//! This module defines the storage interface for outbox events and their
//! delivery status, along with its implementations.
//!
//! # Architecture
//!
//! ```text
//! Producer → create_event → EventStore ← update_event_status ← Publisher
//!                               ↓
//!                   list / stats / pending batches
//! ```
//!
//! # Store Requirements
//!
//! 1. **Pending Order**: `get_pending_events` is oldest first (FIFO fairness)
//! 2. **Listing Order**: `list_events` is newest first
//! 3. **Publish Stamp**: `published_at` is set exactly when status is `Published`
//! 4. **Validation**: malformed `data`/`metadata` never reaches storage
//!
//! # Example
//!
//! ```rust
//! use outbox_relay::event_store::{EventStore, InMemoryEventStore};
//! use outbox_relay::events::{EventStatus, NewEvent};
//!
//! # tokio_test::block_on(async {
//! let store = InMemoryEventStore::new();
//!
//! let event = store
//!     .create_event(NewEvent::new("user.created", "users", r#"{"id":1}"#))
//!     .await?;
//! assert_eq!(event.status, EventStatus::Pending);
//!
//! let pending = store.get_pending_events(10).await?;
//! assert_eq!(pending.len(), 1);
//! # Ok::<(), outbox_relay::OutboxError>(())
//! # }).unwrap();
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::OutboxResult;
use crate::events::{Event, EventPage, EventStats, EventStatus, ListQuery, NewEvent};

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryEventStore;
#[cfg(feature = "postgres")]
pub use postgres::PgEventStore;

/// Event Store trait for persisting outbox events and their delivery status
///
/// Implementations must keep `published_at` in step with the status and must
/// report unknown ids as [`OutboxError::NotFound`](crate::OutboxError::NotFound).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Validate and persist a new `Pending` event
    ///
    /// # Errors
    ///
    /// - `Validation` if `data` or `metadata` is not well-formed JSON
    /// - `Storage` if writing fails
    async fn create_event(&self, request: NewEvent) -> OutboxResult<Event>;

    /// Fetch a single event
    ///
    /// # Errors
    ///
    /// - `NotFound` if no event has this id
    async fn get_event(&self, id: Uuid) -> OutboxResult<Event>;

    /// List events newest first
    ///
    /// Skips `(page - 1) * limit` rows; `total` counts every matching event.
    async fn list_events(&self, query: ListQuery) -> OutboxResult<EventPage>;

    /// Up to `limit` events in `Pending` or `Retrying`, oldest first
    async fn get_pending_events(&self, limit: usize) -> OutboxResult<Vec<Event>>;

    /// Overwrite status, last error and retry count
    ///
    /// Always advances `updated_at`. A `Published` status also stamps
    /// `published_at` with the current time.
    async fn update_event_status(
        &self,
        id: Uuid,
        status: EventStatus,
        last_error: &str,
        retry_count: u32,
    ) -> OutboxResult<()>;

    /// Record the publish time separately from the status
    async fn update_event_published_at(
        &self,
        id: Uuid,
        published_at: Option<DateTime<Utc>>,
    ) -> OutboxResult<()>;

    /// Remove an event
    ///
    /// # Errors
    ///
    /// - `NotFound` if nothing was deleted
    async fn delete_event(&self, id: Uuid) -> OutboxResult<()>;

    /// Aggregate counts over all events
    async fn get_stats(&self) -> OutboxResult<EventStats>;
}
