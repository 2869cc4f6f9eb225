// Copyright (c) 2025 - Cowboy AI, Inc.
//! Shared fixtures and test doubles for outbox-relay integration tests
//!
//! - Flag sets are built on a [`FlagCache`] for the `test` environment
//! - [`RecordingSink`] stands in for the webhook consumer
//! - [`Relay`] wires an in-memory store, real gates and a manual clock

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use outbox_relay::circuit_breaker::ManualClock;
use outbox_relay::gates::keys;
use outbox_relay::publisher::{WebhookPayload, WebhookSink};
use outbox_relay::{
    CircuitBreaker, CircuitBreakerConfig, DeliveryError, EventStore, FlagCache,
    InMemoryEventStore, NewEvent, OutboxService, Publisher, SimulationGates,
};

pub const ENVIRONMENT: &str = "test";

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

pub fn fixed_time() -> DateTime<Utc> {
    FIXED_TIMESTAMP
        .parse()
        .expect("Invalid timestamp in test fixture")
}

/// Flags with the master switch on plus the given gates
pub fn simulation_flags(enabled: &[&str]) -> FlagCache {
    let cache = FlagCache::new().with_flag(ENVIRONMENT, keys::SIMULATION_MODE_ENABLED, true);
    for key in enabled {
        cache.set_flag(ENVIRONMENT, key, true);
    }
    cache
}

/// Flags with simulation mode off
pub fn production_flags() -> FlagCache {
    FlagCache::new().with_flag(ENVIRONMENT, keys::SIMULATION_MODE_ENABLED, false)
}

pub fn order_created(n: usize) -> NewEvent {
    NewEvent::from_values(
        "order.created",
        "orders",
        &json!({"order_id": n, "total": 42.5}),
        Some(&json!({"trace_id": format!("trace-{n}")})),
    )
}

/// Webhook double that records every payload it receives
#[derive(Default)]
pub struct RecordingSink {
    received: Mutex<Vec<WebhookPayload>>,
    failure: Mutex<Option<DeliveryError>>,
}

impl RecordingSink {
    pub fn failing(err: DeliveryError) -> Self {
        let sink = Self::default();
        sink.fail_with(Some(err));
        sink
    }

    pub fn fail_with(&self, err: Option<DeliveryError>) {
        *self.failure.lock().unwrap() = err;
    }

    pub fn received(&self) -> Vec<WebhookPayload> {
        self.received.lock().unwrap().clone()
    }

    pub fn received_ids(&self) -> Vec<Uuid> {
        self.received().iter().map(|p| p.id).collect()
    }
}

#[async_trait]
impl WebhookSink for RecordingSink {
    async fn deliver(&self, payload: &WebhookPayload) -> Result<(), DeliveryError> {
        self.received.lock().unwrap().push(payload.clone());
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Fully wired relay over in-memory collaborators
pub struct Relay {
    pub store: Arc<InMemoryEventStore>,
    pub flags: Arc<FlagCache>,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
    pub breaker: Arc<CircuitBreaker>,
    pub service: OutboxService,
}

impl Relay {
    pub fn new(flags: FlagCache) -> Self {
        Self::with_sink(flags, RecordingSink::default())
    }

    pub fn with_sink(flags: FlagCache, sink: RecordingSink) -> Self {
        let store = Arc::new(InMemoryEventStore::new());
        let flags = Arc::new(flags);
        let sink = Arc::new(sink);
        let clock = Arc::new(ManualClock::new(fixed_time()));
        let breaker = Arc::new(CircuitBreaker::with_clock(
            CircuitBreakerConfig::default(),
            clock.clone(),
        ));
        let gates = Arc::new(SimulationGates::with_circuit_breaker(
            flags.clone(),
            ENVIRONMENT,
            breaker.clone(),
        ));

        let publisher = Publisher::new(store.clone(), gates.clone(), sink.clone())
            .with_network_delay(std::time::Duration::from_millis(5));
        let service = OutboxService::with_publisher(store.clone(), gates, publisher);

        Self {
            store,
            flags,
            sink,
            clock,
            breaker,
            service,
        }
    }

    pub fn enable(&self, key: &str) {
        self.flags.set_flag(ENVIRONMENT, key, true);
    }

    pub fn disable(&self, key: &str) {
        self.flags.set_flag(ENVIRONMENT, key, false);
    }

    pub fn advance(&self, secs: i64) {
        self.clock.advance(Duration::seconds(secs));
    }

    /// Create `n` pending events, oldest first
    pub async fn seed(&self, n: usize) -> Vec<Uuid> {
        let mut ids = Vec::with_capacity(n);
        for i in 0..n {
            let event = self.store.create_event(order_created(i)).await.unwrap();
            ids.push(event.id);
        }
        ids
    }
}
