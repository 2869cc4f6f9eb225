// Copyright (c) 2025 - Cowboy AI, Inc.
//! Outbox Publisher
//!
//! Turns a set of candidate events into webhook delivery attempts and writes
//! the outcome of each attempt back to the [`EventStore`].
//!
//! # Decision Order
//!
//! Every attempt walks the same chain, and the first step that applies ends
//! the attempt:
//!
//! ```text
//! disable_publishing ──yes──> Skipped (status untouched)
//!        │
//! circuit breaker blocks ──yes──> Failed(CircuitOpen), no network
//!        │
//! network delay gate ──yes──> sleep, then continue
//!        │
//! force_webhook_failures ──yes──> breaker failure, Failed(SimulatedFailure)
//!        │
//! partial_failure_mode ──yes──> index % 3 == 2 fails, others succeed, no network
//!        │
//! POST webhook ──2xx──> breaker success, Published
//!        └─────other──> breaker failure, Failed
//! ```
//!
//! Events in a batch are processed strictly in selection order, one at a
//! time, so the counters and the partial-failure pattern are deterministic.

pub mod webhook;

pub use webhook::{WebhookPayload, WebhookSink};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::OutboxConfig;
use crate::errors::{DeliveryError, OutboxError, OutboxResult};
use crate::event_store::EventStore;
use crate::events::{Event, EventStatus};
use crate::gates::SimulationGate;

/// Which events a batch should publish
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    /// Explicit events to publish; empty means "pending events"
    #[serde(default)]
    pub event_ids: Vec<Uuid>,
    /// Upper bound on pending events picked up; `None` or 0 uses the default
    #[serde(default)]
    pub batch_size: Option<usize>,
}

impl PublishRequest {
    pub fn pending(batch_size: usize) -> Self {
        Self {
            event_ids: Vec::new(),
            batch_size: Some(batch_size),
        }
    }

    pub fn events(event_ids: Vec<Uuid>) -> Self {
        Self {
            event_ids,
            batch_size: None,
        }
    }
}

/// Result of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishSummary {
    pub published: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Result of retrying a single failed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryOutcome {
    pub published: bool,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a single delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
enum Attempt {
    Skipped,
    Delivered,
    Failed(DeliveryError),
}

/// Delivers outbox events to the webhook
pub struct Publisher {
    store: Arc<dyn EventStore>,
    gates: Arc<dyn SimulationGate>,
    sink: Arc<dyn WebhookSink>,
    batch_size: usize,
    network_delay: Duration,
}

impl Publisher {
    /// Create a publisher with default batch size and network delay
    pub fn new(
        store: Arc<dyn EventStore>,
        gates: Arc<dyn SimulationGate>,
        sink: Arc<dyn WebhookSink>,
    ) -> Self {
        let defaults = OutboxConfig::default();
        Self {
            store,
            gates,
            sink,
            batch_size: defaults.publish.batch_size,
            network_delay: defaults.simulation.network_delay(),
        }
    }

    /// Create a publisher using the configured batch size and network delay
    pub fn from_config(
        store: Arc<dyn EventStore>,
        gates: Arc<dyn SimulationGate>,
        sink: Arc<dyn WebhookSink>,
        config: &OutboxConfig,
    ) -> Self {
        Self::new(store, gates, sink)
            .with_batch_size(config.publish.batch_size)
            .with_network_delay(config.simulation.network_delay())
    }

    /// Default number of pending events per batch; 0 is ignored
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        if batch_size > 0 {
            self.batch_size = batch_size;
        }
        self
    }

    /// Pause injected by the network delay gate
    pub fn with_network_delay(mut self, delay: Duration) -> Self {
        self.network_delay = delay;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Publish a batch of events
    ///
    /// Individual delivery failures never fail the call; they are counted and
    /// reported in [`PublishSummary::errors`]. A delivered event only counts
    /// as published once its status has been written back.
    ///
    /// # Errors
    ///
    /// - `NotFound` if an explicit event id does not exist (nothing is
    ///   published in that case)
    /// - `Storage` if the selection query fails
    pub async fn publish_batch(&self, request: PublishRequest) -> OutboxResult<PublishSummary> {
        let events = self.select(&request).await?;
        let mut summary = PublishSummary::default();

        if events.is_empty() {
            debug!("No events to publish");
            return Ok(summary);
        }

        for (index, event) in events.iter().enumerate() {
            let written = match self.attempt(event, index).await {
                Attempt::Skipped => {
                    debug!(event_id = %event.id, "Publishing disabled, event left pending");
                    continue;
                }
                Attempt::Delivered => {
                    let written = self.mark_published(event).await;
                    if written.is_ok() {
                        summary.published += 1;
                    }
                    written
                }
                Attempt::Failed(reason) => {
                    warn!(event_id = %event.id, error = %reason, "Event delivery failed");
                    summary.failed += 1;
                    summary.errors.push(format!("Event {}: {}", event.id, reason));
                    self.mark_failed(event, &reason).await.map(|_| ())
                }
            };

            if let Err(e) = written {
                error!(event_id = %event.id, error = %e, "Failed to record delivery outcome");
                summary
                    .errors
                    .push(format!("Event {}: failed to update status: {}", event.id, e));
            }
        }

        info!(
            selected = events.len(),
            published = summary.published,
            failed = summary.failed,
            "Publish batch complete"
        );

        Ok(summary)
    }

    /// Retry delivery of a single `Failed` event
    ///
    /// # Errors
    ///
    /// - `NotFound` if the event does not exist
    /// - `InvalidState` if the event is not `Failed`
    /// - `Storage` if the outcome cannot be written back
    pub async fn retry_event(&self, id: Uuid) -> OutboxResult<RetryOutcome> {
        let event = self.store.get_event(id).await?;

        if event.status != EventStatus::Failed {
            return Err(OutboxError::InvalidState {
                id,
                status: event.status,
            });
        }

        match self.attempt(&event, 0).await {
            Attempt::Skipped => {
                debug!(event_id = %id, "Publishing disabled, retry skipped");
                Ok(RetryOutcome {
                    published: false,
                    retry_count: event.retry_count,
                    error: Some(OutboxError::PublishingSkipped.to_string()),
                })
            }
            Attempt::Delivered => {
                self.mark_published(&event).await?;
                info!(event_id = %id, retry_count = event.retry_count, "Retry delivered event");
                Ok(RetryOutcome {
                    published: true,
                    retry_count: event.retry_count,
                    error: None,
                })
            }
            Attempt::Failed(reason) => {
                warn!(event_id = %id, error = %reason, "Retry failed");
                let retry_count = self.mark_failed(&event, &reason).await?;
                Ok(RetryOutcome {
                    published: false,
                    retry_count,
                    error: Some(reason.to_string()),
                })
            }
        }
    }

    async fn select(&self, request: &PublishRequest) -> OutboxResult<Vec<Event>> {
        if request.event_ids.is_empty() {
            let limit = match request.batch_size {
                Some(size) if size > 0 => size,
                _ => self.batch_size,
            };
            return self.store.get_pending_events(limit).await;
        }

        let mut events = Vec::with_capacity(request.event_ids.len());
        for id in &request.event_ids {
            let event = self.store.get_event(*id).await?;
            if event.status.is_deliverable() {
                events.push(event);
            } else {
                debug!(event_id = %id, status = %event.status, "Event not deliverable, excluded");
            }
        }
        Ok(events)
    }

    async fn attempt(&self, event: &Event, index: usize) -> Attempt {
        if self.gates.should_disable_publishing().await {
            return Attempt::Skipped;
        }

        if self.gates.check_circuit_breaker().await {
            return Attempt::Failed(DeliveryError::CircuitOpen);
        }

        if self.gates.should_simulate_network_delays().await {
            let delay_ms = u64::try_from(self.network_delay.as_millis()).unwrap_or(u64::MAX);
            debug!(event_id = %event.id, delay_ms, "Simulating network delay");
            tokio::time::sleep(self.network_delay).await;
        }

        if self.gates.should_simulate_webhook_failures().await {
            self.gates.record_circuit_breaker_failure().await;
            return Attempt::Failed(DeliveryError::SimulatedFailure);
        }

        if self.gates.should_use_partial_failure_mode().await {
            if index % 3 == 2 {
                return Attempt::Failed(DeliveryError::PartialBatchFailure {
                    position: index + 1,
                });
            }
            debug!(event_id = %event.id, position = index + 1, "Simulated partial batch success");
            return Attempt::Delivered;
        }

        match self.sink.deliver(&WebhookPayload::from(event)).await {
            Ok(()) => {
                self.gates.record_circuit_breaker_success().await;
                Attempt::Delivered
            }
            Err(reason) => {
                self.gates.record_circuit_breaker_failure().await;
                Attempt::Failed(reason)
            }
        }
    }

    async fn mark_published(&self, event: &Event) -> OutboxResult<()> {
        self.store
            .update_event_status(event.id, EventStatus::Published, "", event.retry_count)
            .await
    }

    /// Returns the incremented retry count
    async fn mark_failed(&self, event: &Event, reason: &DeliveryError) -> OutboxResult<u32> {
        let retry_count = event.retry_count.saturating_add(1);
        self.store
            .update_event_status(event.id, EventStatus::Failed, &reason.to_string(), retry_count)
            .await?;
        Ok(retry_count)
    }
}
