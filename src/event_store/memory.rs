// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory event store
//!
//! Keeps events in a map behind a tokio `RwLock`. Timestamps handed out by
//! one store are strictly increasing, so creation order is total even when
//! the wall clock does not advance between two inserts.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::EventStore;
use crate::errors::{OutboxError, OutboxResult};
use crate::events::{Event, EventPage, EventStats, EventStatus, ListQuery, NewEvent};

#[derive(Default)]
struct Inner {
    events: HashMap<Uuid, Event>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Inner {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(next);
        next
    }

    fn event_mut(&mut self, id: Uuid) -> OutboxResult<&mut Event> {
        self.events.get_mut(&id).ok_or(OutboxError::NotFound(id))
    }
}

/// Event store held entirely in process memory
#[derive(Default)]
pub struct InMemoryEventStore {
    inner: RwLock<Inner>,
}

impl InMemoryEventStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events
    pub async fn len(&self) -> usize {
        self.inner.read().await.events.len()
    }

    /// Whether the store holds no events
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.events.is_empty()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn create_event(&self, request: NewEvent) -> OutboxResult<Event> {
        let (data, metadata) = request.parse_payload()?;

        let mut inner = self.inner.write().await;
        let now = inner.next_timestamp();
        let event = Event::pending(
            Uuid::now_v7(),
            request.event_type,
            request.source,
            data,
            metadata,
            now,
        );
        inner.events.insert(event.id, event.clone());

        debug!(event_id = %event.id, event_type = %event.event_type, "Created outbox event");
        Ok(event)
    }

    async fn get_event(&self, id: Uuid) -> OutboxResult<Event> {
        self.inner
            .read()
            .await
            .events
            .get(&id)
            .cloned()
            .ok_or(OutboxError::NotFound(id))
    }

    async fn list_events(&self, query: ListQuery) -> OutboxResult<EventPage> {
        let inner = self.inner.read().await;

        let mut matching: Vec<&Event> = inner
            .events
            .values()
            .filter(|e| query.status.map_or(true, |s| e.status == s))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let events = matching
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(EventPage {
            events,
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn get_pending_events(&self, limit: usize) -> OutboxResult<Vec<Event>> {
        let inner = self.inner.read().await;

        let mut pending: Vec<&Event> = inner
            .events
            .values()
            .filter(|e| e.status.is_deliverable())
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(pending.into_iter().take(limit).cloned().collect())
    }

    async fn update_event_status(
        &self,
        id: Uuid,
        status: EventStatus,
        last_error: &str,
        retry_count: u32,
    ) -> OutboxResult<()> {
        let mut inner = self.inner.write().await;
        let now = inner.next_timestamp();
        inner
            .event_mut(id)?
            .apply_status(status, last_error.to_string(), retry_count, now);
        Ok(())
    }

    async fn update_event_published_at(
        &self,
        id: Uuid,
        published_at: Option<DateTime<Utc>>,
    ) -> OutboxResult<()> {
        let mut inner = self.inner.write().await;
        let now = inner.next_timestamp();
        let event = inner.event_mut(id)?;
        event.published_at = published_at;
        event.updated_at = now;
        Ok(())
    }

    async fn delete_event(&self, id: Uuid) -> OutboxResult<()> {
        self.inner
            .write()
            .await
            .events
            .remove(&id)
            .map(|_| ())
            .ok_or(OutboxError::NotFound(id))
    }

    async fn get_stats(&self) -> OutboxResult<EventStats> {
        let inner = self.inner.read().await;
        let mut stats = EventStats::default();
        for event in inner.events.values() {
            stats.record(event);
        }
        Ok(stats)
    }
}
