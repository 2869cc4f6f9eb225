// Copyright (c) 2025 - Cowboy AI, Inc.

//! HTTP adapter implementations
//!
//! This module contains the reqwest-backed implementations of the relay's
//! outbound seams: webhook delivery and feature flag lookups.

pub mod flags;
pub mod webhook;

pub use flags::HttpFlagClient;
pub use webhook::HttpWebhookSink;
