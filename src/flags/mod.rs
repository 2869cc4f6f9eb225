// Copyright (c) 2025 - Cowboy AI, Inc.
//! Feature Flag Boundary
//!
//! The relay resolves boolean flags by `(environment, key)` through the
//! [`FlagClient`] trait. Callers treat every lookup failure as "flag is off".
//!
//! Implementations:
//! - [`FlagCache`] - an owned, injectable in-process cache
//! - [`crate::adapters::HttpFlagClient`] - the feature-flags HTTP service

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::FlagError;

pub mod cache;

pub use cache::FlagCache;

/// Result type for flag lookups
pub type FlagResult<T> = Result<T, FlagError>;

/// Resolves feature flags for an environment
#[async_trait]
pub trait FlagClient: Send + Sync {
    /// Look up a single flag
    ///
    /// Fails when the flag is absent or the backing service errors.
    async fn get_flag(&self, environment: &str, key: &str) -> FlagResult<bool>;

    /// All flags defined for an environment
    async fn get_all_flags(&self, environment: &str) -> FlagResult<HashMap<String, bool>>;
}

#[async_trait]
impl<T: FlagClient + ?Sized> FlagClient for Arc<T> {
    async fn get_flag(&self, environment: &str, key: &str) -> FlagResult<bool> {
        (**self).get_flag(environment, key).await
    }

    async fn get_all_flags(&self, environment: &str) -> FlagResult<HashMap<String, bool>> {
        (**self).get_all_flags(environment).await
    }
}
