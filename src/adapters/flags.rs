// Copyright (c) 2025 - Cowboy AI, Inc.

//! Feature Flags HTTP Client
//!
//! Reads flags from the feature-flags service:
//!
//! ```text
//! GET {base_url}/flags/{key}?env={env}  → { "key": "...", "enabled": bool }
//! GET {base_url}/flags?env={env}        → { "<key>": bool, ... }
//! ```
//!
//! A 404 on a single flag means the flag is not defined.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::config::FlagsConfig;
use crate::errors::{FlagError, OutboxError, OutboxResult};
use crate::flags::{FlagClient, FlagResult};

#[derive(Debug, Deserialize)]
struct FlagResponse {
    #[allow(dead_code)]
    key: String,
    enabled: bool,
}

/// Flag client backed by the feature-flags HTTP API
#[derive(Clone)]
pub struct HttpFlagClient {
    base_url: String,
    client: Client,
}

impl HttpFlagClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> OutboxResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            OutboxError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &FlagsConfig) -> OutboxResult<Self> {
        Self::new(config.base_url.clone(), Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl FlagClient for HttpFlagClient {
    async fn get_flag(&self, environment: &str, key: &str) -> FlagResult<bool> {
        let url = format!("{}/flags/{}", self.base_url, key);
        let response = self
            .client
            .get(&url)
            .query(&[("env", environment)])
            .send()
            .await
            .map_err(|e| FlagError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                return Err(FlagError::NotFound {
                    key: key.to_string(),
                })
            }
            status => return Err(FlagError::Status(status.as_u16())),
        }

        let flag: FlagResponse = response
            .json()
            .await
            .map_err(|e| FlagError::Decode(e.to_string()))?;

        debug!(environment, key, enabled = flag.enabled, "Resolved feature flag");
        Ok(flag.enabled)
    }

    async fn get_all_flags(&self, environment: &str) -> FlagResult<HashMap<String, bool>> {
        let url = format!("{}/flags", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("env", environment)])
            .send()
            .await
            .map_err(|e| FlagError::Transport(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(FlagError::Status(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| FlagError::Decode(e.to_string()))
    }
}
