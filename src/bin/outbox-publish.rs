// Copyright (c) 2025 - Cowboy AI, Inc.
//! Outbox Publish Runner
//!
//! Runs one publish batch against the Postgres outbox and prints the summary
//! as JSON. Meant to be triggered by cron, a CI job or an operator.
//!
//! Run with: cargo run --bin outbox-publish --features postgres [EVENT_ID...]
//!
//! With no arguments the oldest pending events are published, up to
//! `BATCH_SIZE`. Event ids given as arguments are published instead.
//!
//! Prerequisites:
//! 1. Postgres with the `outbox_events` table (via DATABASE_URL or DB_* variables)
//! 2. Feature flags API reachable (via FEATURE_FLAGS_API_URL)
//! 3. Webhook consumer reachable (via WEBHOOK_URL)

use anyhow::{Context, Result};
use outbox_relay::adapters::{HttpFlagClient, HttpWebhookSink};
use outbox_relay::{
    CircuitBreaker, OutboxConfig, PgEventStore, PublishRequest, Publisher, SimulationGates,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

fn event_ids_from_args() -> Result<Vec<Uuid>> {
    std::env::args()
        .skip(1)
        .map(|arg| Uuid::parse_str(&arg).with_context(|| format!("invalid event id: {}", arg)))
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let event_ids = event_ids_from_args()?;
    let config = OutboxConfig::from_env().context("Failed to load configuration")?;

    info!(
        webhook_url = %config.publish.webhook_url,
        environment = %config.flags.environment,
        batch_size = config.publish.batch_size,
        "Starting outbox publish run"
    );

    let store = PgEventStore::connect(&config.database)
        .await
        .context("Failed to connect to Postgres")?;

    let flags = HttpFlagClient::from_config(&config.flags)
        .context("Failed to create feature flags client")?;
    let gates = SimulationGates::with_circuit_breaker(
        flags,
        config.flags.environment.clone(),
        Arc::new(CircuitBreaker::new(config.circuit.clone())),
    );

    let sink = HttpWebhookSink::from_config(&config.publish)
        .context("Failed to create webhook client")?;

    let publisher = Publisher::from_config(
        Arc::new(store),
        Arc::new(gates),
        Arc::new(sink),
        &config,
    );

    let summary = publisher
        .publish_batch(PublishRequest {
            event_ids,
            batch_size: None,
        })
        .await
        .context("Publish batch failed")?;

    if summary.failed > 0 {
        warn!(failed = summary.failed, "Some events failed to publish");
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to encode summary")?
    );

    Ok(())
}
