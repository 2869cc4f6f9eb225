// Copyright (c) 2025 - Cowboy AI, Inc.
//! Simulation Gates
//!
//! Policy layer over the [`FlagClient`] that answers the yes/no questions the
//! publisher asks before every delivery attempt, and owns the delivery
//! [`CircuitBreaker`].
//!
//! # Master Switch
//!
//! Every gate is short-circuited by `simulation_mode_enabled`. When the
//! master flag is off, no other flag is consulted and every gate answers
//! `false`. Any lookup failure also reads as `false`, so an unreachable flag
//! service never injects faults.
//!
//! | Gate                                  | Flag                        |
//! |---------------------------------------|-----------------------------|
//! | `should_disable_publishing`           | `disable_publishing`        |
//! | `should_simulate_webhook_failures`    | `force_webhook_failures`    |
//! | `should_simulate_network_delays`      | `simulate_network_delays`   |
//! | `should_use_partial_failure_mode`     | `partial_failure_mode`      |
//! | `should_use_circuit_breaker_demo`     | `circuit_breaker_demo_mode` |
//!
//! The circuit breaker is inert unless the demo gate is on: checks always
//! allow and recordings are dropped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::flags::FlagClient;
use crate::state_machine::{Admission, CircuitState};

/// Flag keys read by the gates
pub mod keys {
    pub const SIMULATION_MODE_ENABLED: &str = "simulation_mode_enabled";
    pub const DISABLE_PUBLISHING: &str = "disable_publishing";
    pub const FORCE_WEBHOOK_FAILURES: &str = "force_webhook_failures";
    pub const SIMULATE_NETWORK_DELAYS: &str = "simulate_network_delays";
    pub const PARTIAL_FAILURE_MODE: &str = "partial_failure_mode";
    pub const CIRCUIT_BREAKER_DEMO_MODE: &str = "circuit_breaker_demo_mode";
}

/// Snapshot of every gate and the circuit breaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStatus {
    pub simulation_mode_enabled: bool,
    pub force_webhook_failures: bool,
    pub disable_publishing: bool,
    pub circuit_breaker_demo_mode: bool,
    pub partial_failure_mode: bool,
    pub simulate_network_delays: bool,
    pub circuit_breaker_state: CircuitState,
    pub circuit_failure_count: u32,
    pub circuit_last_failure: Option<DateTime<Utc>>,
}

/// Questions the publisher asks before a delivery
#[async_trait]
pub trait SimulationGate: Send + Sync {
    async fn is_simulation_mode_enabled(&self) -> bool;
    async fn should_disable_publishing(&self) -> bool;
    async fn should_simulate_webhook_failures(&self) -> bool;
    async fn should_simulate_network_delays(&self) -> bool;
    async fn should_use_partial_failure_mode(&self) -> bool;
    async fn should_use_circuit_breaker_demo(&self) -> bool;

    /// `true` when the circuit breaker blocks the request
    async fn check_circuit_breaker(&self) -> bool;
    async fn record_circuit_breaker_success(&self);
    async fn record_circuit_breaker_failure(&self);

    async fn get_simulation_status(&self) -> SimulationStatus;
}

/// Flag-backed gates for one environment
pub struct SimulationGates<F> {
    flags: F,
    environment: String,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl<F: FlagClient> SimulationGates<F> {
    /// Gates with a default circuit breaker
    pub fn new(flags: F, environment: impl Into<String>) -> Self {
        Self::with_circuit_breaker(
            flags,
            environment,
            Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default())),
        )
    }

    /// Gates sharing an existing circuit breaker
    pub fn with_circuit_breaker(
        flags: F,
        environment: impl Into<String>,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            flags,
            environment: environment.into(),
            circuit_breaker,
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.circuit_breaker
    }

    async fn flag(&self, key: &str) -> bool {
        match self.flags.get_flag(&self.environment, key).await {
            Ok(enabled) => enabled,
            Err(e) => {
                warn!(environment = %self.environment, key, error = %e, "Failed to get feature flag, treating as off");
                false
            }
        }
    }

    async fn gated_flag(&self, key: &str) -> bool {
        self.is_simulation_mode_enabled().await && self.flag(key).await
    }
}

#[async_trait]
impl<F: FlagClient> SimulationGate for SimulationGates<F> {
    async fn is_simulation_mode_enabled(&self) -> bool {
        self.flag(keys::SIMULATION_MODE_ENABLED).await
    }

    async fn should_disable_publishing(&self) -> bool {
        self.gated_flag(keys::DISABLE_PUBLISHING).await
    }

    async fn should_simulate_webhook_failures(&self) -> bool {
        self.gated_flag(keys::FORCE_WEBHOOK_FAILURES).await
    }

    async fn should_simulate_network_delays(&self) -> bool {
        self.gated_flag(keys::SIMULATE_NETWORK_DELAYS).await
    }

    async fn should_use_partial_failure_mode(&self) -> bool {
        self.gated_flag(keys::PARTIAL_FAILURE_MODE).await
    }

    async fn should_use_circuit_breaker_demo(&self) -> bool {
        self.gated_flag(keys::CIRCUIT_BREAKER_DEMO_MODE).await
    }

    async fn check_circuit_breaker(&self) -> bool {
        if !self.should_use_circuit_breaker_demo().await {
            return false;
        }
        self.circuit_breaker.check() == Admission::Block
    }

    async fn record_circuit_breaker_success(&self) {
        if self.should_use_circuit_breaker_demo().await {
            self.circuit_breaker.record_success();
        }
    }

    async fn record_circuit_breaker_failure(&self) {
        if self.should_use_circuit_breaker_demo().await {
            self.circuit_breaker.record_failure();
        }
    }

    async fn get_simulation_status(&self) -> SimulationStatus {
        let circuit = self.circuit_breaker.snapshot();

        SimulationStatus {
            simulation_mode_enabled: self.is_simulation_mode_enabled().await,
            force_webhook_failures: self.should_simulate_webhook_failures().await,
            disable_publishing: self.should_disable_publishing().await,
            circuit_breaker_demo_mode: self.should_use_circuit_breaker_demo().await,
            partial_failure_mode: self.should_use_partial_failure_mode().await,
            simulate_network_delays: self.should_simulate_network_delays().await,
            circuit_breaker_state: circuit.state,
            circuit_failure_count: circuit.failure_count,
            circuit_last_failure: circuit.last_failure_time,
        }
    }
}
