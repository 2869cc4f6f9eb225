//! Error types for outbox operations

use thiserror::Error;
use uuid::Uuid;

use crate::events::EventStatus;

/// Errors that can occur in outbox operations
#[derive(Debug, Error)]
pub enum OutboxError {
    /// Event data or metadata is not well-formed JSON
    #[error("Validation error: {0}")]
    Validation(String),

    /// No event with the given id
    #[error("event not found: {0}")]
    NotFound(Uuid),

    /// Operation is not legal for the event's current status
    #[error("invalid state for event {id}: status is {status}")]
    InvalidState { id: Uuid, status: EventStatus },

    /// Webhook delivery failed
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Publishing was administratively disabled; not a real failure
    #[error("publishing skipped due to simulation")]
    PublishingSkipped,

    /// Backing store failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for outbox operations
pub type OutboxResult<T> = Result<T, OutboxError>;

/// Reasons a single delivery attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Circuit breaker refused the attempt without touching the network
    #[error("circuit breaker is open — request blocked")]
    CircuitOpen,

    /// Failure forced by the `force_webhook_failures` flag
    #[error("simulated webhook failure (forced by feature gate)")]
    SimulatedFailure,

    /// Failure produced by partial failure mode (1-based batch position)
    #[error("simulated partial batch failure (event {position} in batch)")]
    PartialBatchFailure { position: usize },

    /// Network level failure
    #[error("failed to send webhook request: {0}")]
    Transport(String),

    /// Webhook answered with a non-2xx status
    #[error("webhook returned status {0}")]
    Status(u16),

    /// Payload could not be encoded
    #[error("failed to marshal event data: {0}")]
    Encode(String),
}

/// Errors from feature flag lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    /// Flag is not defined for the environment
    #[error("flag {key} not found")]
    NotFound { key: String },

    /// No flags have been loaded for the environment
    #[error("flags not loaded for env: {0}")]
    EnvironmentNotLoaded(String),

    /// Flag service answered with an unexpected status
    #[error("feature flags API returned status {0}")]
    Status(u16),

    /// Flag service could not be reached
    #[error("failed to fetch flags: {0}")]
    Transport(String),

    /// Flag payload could not be decoded
    #[error("failed to decode flag response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for OutboxError {
    fn from(err: serde_json::Error) -> Self {
        OutboxError::Serialization(err.to_string())
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for OutboxError {
    fn from(err: sqlx::Error) -> Self {
        OutboxError::Storage(err.to_string())
    }
}
