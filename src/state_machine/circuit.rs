// Copyright (c) 2025 - Cowboy AI, Inc.
//! Circuit Breaker State Machine
//!
//! Pure transition function for the delivery circuit breaker. The lock,
//! counters and clock live in [`crate::circuit_breaker::CircuitBreaker`];
//! this module only decides where a signal leads.
//!
//! # States
//!
//! - Closed: normal operation, requests pass
//! - Open: fail fast, requests are blocked until the timeout window elapses
//! - HalfOpen: a probing request is let through
//!
//! # Transitions
//!
//! ```text
//!            failures ≥ threshold
//!   Closed ───────────────────────> Open
//!     ↑                             │  ↑
//!     │ success      window elapsed │  │ failure
//!     │                             ↓  │
//!     └────────────────────────── HalfOpen
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation
    #[default]
    #[serde(rename = "CLOSED")]
    Closed,
    /// Tripped; requests fail fast
    #[serde(rename = "OPEN")]
    Open,
    /// Probing for recovery
    #[serde(rename = "HALF-OPEN")]
    HalfOpen,
}

impl CircuitState {
    /// Display form used in status snapshots and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF-OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs to the circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitSignal {
    /// A request is about to be made
    Probe {
        /// The timeout window since the last failure has passed
        window_elapsed: bool,
    },
    /// A request succeeded
    Success,
    /// A request failed; `failure_count` already includes this failure
    Failure { failure_count: u32, threshold: u32 },
}

/// Whether the resulting state lets requests through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Block,
}

impl StateMachine for CircuitState {
    type Input = CircuitSignal;
    type Output = Admission;

    fn transition(&self, input: &Self::Input) -> (Self, Self::Output) {
        use Admission::*;
        use CircuitSignal::*;
        use CircuitState::*;

        match (self, input) {
            // Probing
            (Closed, Probe { .. }) => (Closed, Allow),
            (Open, Probe { window_elapsed: false }) => (Open, Block),
            (Open, Probe { window_elapsed: true }) => (HalfOpen, Allow),
            (HalfOpen, Probe { .. }) => (HalfOpen, Allow),

            // Successes only matter while probing
            (Closed, Success) => (Closed, Allow),
            (HalfOpen, Success) => (Closed, Allow),
            (Open, Success) => (Open, Block),

            // Failures
            (Closed, Failure { failure_count, threshold }) if failure_count >= threshold => {
                (Open, Block)
            }
            (Closed, Failure { .. }) => (Closed, Allow),
            (Open, Failure { .. }) => (Open, Block),
            (HalfOpen, Failure { .. }) => (Open, Block),
        }
    }
}
