// Copyright (c) 2025 - Cowboy AI, Inc.
//! Delivery Circuit Breaker
//!
//! Lock-protected owner of the [`CircuitState`] machine. All reads and writes
//! of the state, the failure count and the last failure time go through one
//! reader-writer lock:
//!
//! - [`CircuitBreaker::check`] inspects the state under a read lock and only
//!   takes the write lock for the `Open → HalfOpen` move, re-validating the
//!   state once it holds it.
//! - [`CircuitBreaker::record_success`] and
//!   [`CircuitBreaker::record_failure`] always take the write lock.
//!
//! The breaker knows nothing about feature flags; gating it behind the demo
//! flag is the job of [`crate::gates::SimulationGates`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::info;

use crate::state_machine::{Admission, CircuitSignal, CircuitState, StateMachine};

/// Circuit breaker tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Failures in `Closed` before the circuit opens
    pub failure_threshold: u32,

    /// Seconds after the last failure before an open circuit lets a probe through
    pub timeout_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            timeout_secs: 5,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        let max_secs = i64::MAX / 1000;
        Duration::seconds(i64::try_from(self.timeout_secs).map_or(max_secs, |s| s.min(max_secs)))
    }
}

/// Time source for the breaker
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Point-in-time view of the breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub last_failure_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct BreakerData {
    state: CircuitState,
    failure_count: u32,
    last_failure_time: Option<DateTime<Utc>>,
}

impl BreakerData {
    fn window_elapsed(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        match self.last_failure_time {
            Some(last) => now - last > timeout,
            None => true,
        }
    }
}

/// Three-state circuit breaker shared by every delivery in one environment
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    data: RwLock<BreakerData>,
}

impl CircuitBreaker {
    /// Create a closed breaker on the wall clock
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a closed breaker on a custom clock
    pub fn with_clock(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            data: RwLock::new(BreakerData::default()),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Decide whether a request may proceed
    ///
    /// An open circuit whose timeout window has passed moves to `HalfOpen`
    /// and admits the caller. Concurrent callers race for the write lock but
    /// only the first performs the move; `HalfOpen` admits them all until an
    /// outcome is recorded.
    pub fn check(&self) -> Admission {
        let now = self.clock.now();
        let timeout = self.config.timeout();

        {
            let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
            let probe = CircuitSignal::Probe {
                window_elapsed: data.window_elapsed(now, timeout),
            };
            if !data.state.changes_state(&probe) {
                return data.state.transition(&probe).1;
            }
        }

        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let probe = CircuitSignal::Probe {
            window_elapsed: data.window_elapsed(now, timeout),
        };
        let (next, admission) = data.state.transition(&probe);
        if next != data.state {
            info!(from = %data.state, to = %next, "Circuit breaker: OPEN → HALF-OPEN (testing)");
            data.state = next;
        }
        admission
    }

    /// Record a successful delivery
    pub fn record_success(&self) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let (next, _) = data.state.transition(&CircuitSignal::Success);

        if data.state == CircuitState::HalfOpen && next == CircuitState::Closed {
            data.failure_count = 0;
            info!("Circuit breaker: HALF-OPEN → CLOSED (recovered)");
        }
        data.state = next;
    }

    /// Record a failed delivery
    pub fn record_failure(&self) {
        let now = self.clock.now();
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);

        data.failure_count = data.failure_count.saturating_add(1);
        data.last_failure_time = Some(now);

        let signal = CircuitSignal::Failure {
            failure_count: data.failure_count,
            threshold: self.config.failure_threshold,
        };
        let (next, _) = data.state.transition(&signal);

        match (data.state, next) {
            (CircuitState::Closed, CircuitState::Open) => info!(
                failure_count = data.failure_count,
                "Circuit breaker: CLOSED → OPEN (tripped)"
            ),
            (CircuitState::HalfOpen, CircuitState::Open) => {
                info!("Circuit breaker: HALF-OPEN → OPEN (test failed)")
            }
            _ => {}
        }
        data.state = next;
    }

    pub fn state(&self) -> CircuitState {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        CircuitSnapshot {
            state: data.state,
            failure_count: data.failure_count,
            last_failure_time: data.last_failure_time,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
