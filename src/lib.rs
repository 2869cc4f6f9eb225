// Copyright (c) 2025 - Cowboy AI, Inc.
//! Transactional outbox relay
//!
//! Producers write events into a durable outbox; this crate delivers them to
//! a downstream webhook with explicit status tracking, retry accounting and
//! a circuit breaker. Feature-flag driven simulation gates can inject
//! controlled faults (disabled publishing, forced failures, network delays,
//! partial batch failures) for chaos testing.
//!
//! # Layout
//!
//! - [`event_store`] - persistence of events and their delivery status
//! - [`publisher`] - batch and single-event delivery
//! - [`circuit_breaker`] - process-wide delivery breaker
//! - [`gates`] - simulation gates over the [`flags`] boundary
//! - [`adapters`] - reqwest implementations of the outbound seams
//! - [`service`] - the facade thin transport handlers call

pub mod adapters;
pub mod circuit_breaker;
pub mod config;
pub mod errors;
pub mod event_store;
pub mod events;
pub mod flags;
pub mod gates;
pub mod publisher;
pub mod service;
pub mod state_machine;

// Re-export commonly used types
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, ManualClock};
pub use config::OutboxConfig;
pub use errors::{DeliveryError, FlagError, OutboxError, OutboxResult};
pub use event_store::{EventStore, InMemoryEventStore};
pub use events::{Event, EventPage, EventStats, EventStatus, ListQuery, NewEvent};
pub use flags::{FlagCache, FlagClient};
pub use gates::{SimulationGate, SimulationGates, SimulationStatus};
pub use publisher::{PublishRequest, PublishSummary, Publisher, RetryOutcome};
pub use service::OutboxService;
pub use state_machine::CircuitState;

#[cfg(feature = "postgres")]
pub use event_store::PgEventStore;
