// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-process flag cache
//!
//! Holds `environment → key → enabled` behind a reader-writer lock. Each
//! owner builds its own cache and hands it to its consumers; there is no
//! process-wide instance.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use super::{FlagClient, FlagResult};
use crate::errors::FlagError;

/// Owned map of flags per environment
#[derive(Debug, Default)]
pub struct FlagCache {
    environments: RwLock<HashMap<String, HashMap<String, bool>>>,
}

impl FlagCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every flag of an environment
    pub fn load(&self, environment: impl Into<String>, flags: HashMap<String, bool>) {
        let environment = environment.into();
        debug!(environment = %environment, count = flags.len(), "Loaded feature flags");
        self.environments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(environment, flags);
    }

    /// Replace every flag of an environment from a JSON object of booleans
    pub fn load_json(&self, environment: impl Into<String>, json: &str) -> FlagResult<()> {
        let flags: HashMap<String, bool> =
            serde_json::from_str(json).map_err(|e| FlagError::Decode(e.to_string()))?;
        self.load(environment, flags);
        Ok(())
    }

    /// Set one flag, creating the environment if needed
    pub fn set_flag(&self, environment: &str, key: &str, enabled: bool) {
        self.environments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(environment.to_string())
            .or_default()
            .insert(key.to_string(), enabled);
    }

    /// Builder form of [`FlagCache::set_flag`]
    pub fn with_flag(self, environment: &str, key: &str, enabled: bool) -> Self {
        self.set_flag(environment, key, enabled);
        self
    }

    fn lookup(&self, environment: &str, key: &str) -> FlagResult<bool> {
        let environments = self
            .environments
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let flags = environments
            .get(environment)
            .ok_or_else(|| FlagError::EnvironmentNotLoaded(environment.to_string()))?;
        flags.get(key).copied().ok_or_else(|| FlagError::NotFound {
            key: key.to_string(),
        })
    }
}

#[async_trait]
impl FlagClient for FlagCache {
    async fn get_flag(&self, environment: &str, key: &str) -> FlagResult<bool> {
        self.lookup(environment, key)
    }

    async fn get_all_flags(&self, environment: &str) -> FlagResult<HashMap<String, bool>> {
        self.environments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(environment)
            .cloned()
            .ok_or_else(|| FlagError::EnvironmentNotLoaded(environment.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup_errors() {
        let cache = FlagCache::new().with_flag("local", "disable_publishing", true);

        tokio_test::block_on(async {
            assert_eq!(cache.get_flag("local", "disable_publishing").await, Ok(true));
            assert_eq!(
                cache.get_flag("local", "missing").await,
                Err(FlagError::NotFound {
                    key: "missing".to_string()
                })
            );
            assert_eq!(
                cache.get_flag("prod", "disable_publishing").await,
                Err(FlagError::EnvironmentNotLoaded("prod".to_string()))
            );
        });
    }

    #[tokio::test]
    async fn test_load_json_replaces_environment() {
        let cache = FlagCache::new().with_flag("local", "stale", true);
        cache
            .load_json("local", r#"{"simulation_mode_enabled": true, "partial_failure_mode": false}"#)
            .unwrap();

        let flags = cache.get_all_flags("local").await.unwrap();
        assert_eq!(flags.len(), 2);
        assert_eq!(flags.get("simulation_mode_enabled"), Some(&true));
        assert!(cache.get_flag("local", "stale").await.is_err());
    }

    #[test]
    fn test_load_json_rejects_non_boolean_values() {
        let cache = FlagCache::new();
        let result = cache.load_json("local", r#"{"simulation_mode_enabled": "yes"}"#);
        assert!(matches!(result, Err(FlagError::Decode(_))));
    }
}
