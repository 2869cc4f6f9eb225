// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for the Outbox
//!
//! This module provides the application service that thin transport
//! handlers call. Every operation is a direct pass-through to the store,
//! the publisher or the simulation gates.
//!
//! # Architecture
//!
//! ```text
//! Client Request
//!     ↓
//! OutboxService (this module)
//!     ↓                ↓                   ↓
//! EventStore       Publisher          SimulationGate
//!                      ↓
//!               WebhookSink (HTTP)
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use outbox_relay::{
//!     FlagCache, InMemoryEventStore, NewEvent, OutboxService, SimulationGates,
//! };
//! use outbox_relay::adapters::HttpWebhookSink;
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(InMemoryEventStore::new());
//! let gates = Arc::new(SimulationGates::new(FlagCache::new(), "local"));
//! let sink = Arc::new(
//!     HttpWebhookSink::new("http://localhost:3000/api/webhook", std::time::Duration::from_secs(30))?,
//! );
//!
//! let service = OutboxService::new(store, gates, sink);
//! let event = service
//!     .create_event(NewEvent::new("user.created", "users", r#"{"id": 1}"#))
//!     .await?;
//! assert_eq!(service.get_event(event.id).await?.id, event.id);
//! # Ok::<(), outbox_relay::OutboxError>(())
//! # });
//! ```

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::OutboxConfig;
use crate::errors::OutboxResult;
use crate::event_store::EventStore;
use crate::events::{Event, EventPage, EventStats, ListQuery, NewEvent};
use crate::gates::{SimulationGate, SimulationStatus};
use crate::publisher::{PublishRequest, PublishSummary, Publisher, RetryOutcome, WebhookSink};

/// Application service over the outbox
pub struct OutboxService {
    store: Arc<dyn EventStore>,
    gates: Arc<dyn SimulationGate>,
    publisher: Publisher,
}

impl OutboxService {
    pub fn new(
        store: Arc<dyn EventStore>,
        gates: Arc<dyn SimulationGate>,
        sink: Arc<dyn WebhookSink>,
    ) -> Self {
        let publisher = Publisher::new(store.clone(), gates.clone(), sink);
        Self::with_publisher(store, gates, publisher)
    }

    pub fn from_config(
        store: Arc<dyn EventStore>,
        gates: Arc<dyn SimulationGate>,
        sink: Arc<dyn WebhookSink>,
        config: &OutboxConfig,
    ) -> Self {
        let publisher = Publisher::from_config(store.clone(), gates.clone(), sink, config);
        Self::with_publisher(store, gates, publisher)
    }

    /// Use a preconfigured publisher; it should share `store` and `gates`
    pub fn with_publisher(
        store: Arc<dyn EventStore>,
        gates: Arc<dyn SimulationGate>,
        publisher: Publisher,
    ) -> Self {
        Self {
            store,
            gates,
            publisher,
        }
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Validate and persist a new `Pending` event
    pub async fn create_event(&self, request: NewEvent) -> OutboxResult<Event> {
        let event = self.store.create_event(request).await?;
        info!(event_id = %event.id, event_type = %event.event_type, source = %event.source, "Outbox event created");
        Ok(event)
    }

    pub async fn get_event(&self, id: Uuid) -> OutboxResult<Event> {
        self.store.get_event(id).await
    }

    /// List events newest first; out of range paging is clamped
    pub async fn list_events(&self, query: ListQuery) -> OutboxResult<EventPage> {
        self.store.list_events(query.normalized()).await
    }

    pub async fn retry_event(&self, id: Uuid) -> OutboxResult<RetryOutcome> {
        self.publisher.retry_event(id).await
    }

    pub async fn delete_event(&self, id: Uuid) -> OutboxResult<()> {
        self.store.delete_event(id).await?;
        info!(event_id = %id, "Outbox event deleted");
        Ok(())
    }

    pub async fn publish_batch(&self, request: PublishRequest) -> OutboxResult<PublishSummary> {
        self.publisher.publish_batch(request).await
    }

    pub async fn get_stats(&self) -> OutboxResult<EventStats> {
        self.store.get_stats().await
    }

    pub async fn get_simulation_status(&self) -> SimulationStatus {
        self.gates.get_simulation_status().await
    }
}
