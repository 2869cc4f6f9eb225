// Copyright (c) 2025 - Cowboy AI, Inc.
//! HTTP Adapter Tests
//!
//! User Story: As a webhook consumer, I need each outbox event delivered as
//! one JSON document, and as an operator I need the relay to follow the
//! feature-flags service
//!
//! Test Requirements:
//! - Verify the webhook receives the canonical JSON body and headers
//! - Verify a non-2xx answer marks the event failed with the status
//! - Verify flags are read from the flags service, 404 meaning "not defined"
//!
//! Each test starts an axum server on an ephemeral port.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use outbox_relay::adapters::{HttpFlagClient, HttpWebhookSink};
use outbox_relay::{
    EventStatus, EventStore, FlagClient, FlagError, InMemoryEventStore, NewEvent, OutboxService,
    PublishRequest, SimulationGate, SimulationGates,
};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct Receiver {
    status: AtomicU16,
    bodies: Mutex<Vec<Value>>,
    headers: Mutex<Vec<HeaderMap>>,
}

async fn receive(
    State(receiver): State<Arc<Receiver>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    receiver.bodies.lock().unwrap().push(body);
    receiver.headers.lock().unwrap().push(headers);
    StatusCode::from_u16(receiver.status.load(Ordering::SeqCst)).unwrap()
}

/// Bind to port 0 and return the actual address.
async fn start_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn start_webhook(status: u16) -> (String, Arc<Receiver>) {
    let receiver = Arc::new(Receiver::default());
    receiver.status.store(status, Ordering::SeqCst);
    let app = Router::new()
        .route("/api/webhook", post(receive))
        .with_state(receiver.clone());
    let base = start_server(app).await;
    (format!("{base}/api/webhook"), receiver)
}

async fn flag(
    Path(key): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    match (params.get("env").map(String::as_str), key.as_str()) {
        (Some("staging"), "simulation_mode_enabled") => {
            Ok(Json(json!({"key": key, "enabled": true})))
        }
        (Some("staging"), "disable_publishing") => Ok(Json(json!({"key": key, "enabled": true}))),
        (Some("staging"), "boom") => Err(StatusCode::INTERNAL_SERVER_ERROR),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn all_flags(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    match params.get("env").map(String::as_str) {
        Some("staging") => Json(json!({
            "simulation_mode_enabled": true,
            "disable_publishing": true,
        })),
        _ => Json(json!({})),
    }
}

async fn start_flags() -> String {
    let app = Router::new()
        .route("/flags", get(all_flags))
        .route("/flags/:key", get(flag));
    start_server(app).await
}

fn service(
    webhook_url: &str,
    flags: impl FlagClient + 'static,
) -> (OutboxService, Arc<InMemoryEventStore>) {
    let store = Arc::new(InMemoryEventStore::new());
    let gates = Arc::new(SimulationGates::new(flags, "staging"));
    let sink = Arc::new(HttpWebhookSink::new(webhook_url, Duration::from_secs(5)).unwrap());
    (OutboxService::new(store.clone(), gates, sink), store)
}

#[tokio::test]
async fn test_webhook_receives_event_document() {
    let (url, receiver) = start_webhook(200).await;
    let (service, store) = service(&url, outbox_relay::FlagCache::new());

    let event = store
        .create_event(NewEvent::new("user.created", "users", r#"{"id": 1}"#))
        .await
        .unwrap();

    let summary = service.publish_batch(PublishRequest::default()).await.unwrap();
    assert_eq!(summary.published, 1);

    let bodies = receiver.bodies.lock().unwrap().clone();
    assert_eq!(
        bodies,
        vec![json!({
            "id": event.id,
            "type": "user.created",
            "source": "users",
            "data": {"id": 1},
            "metadata": null,
            "created_at": event.created_at,
        })]
    );

    let headers = receiver.headers.lock().unwrap()[0].clone();
    assert_eq!(headers["content-type"], "application/json");
    assert!(headers["user-agent"]
        .to_str()
        .unwrap()
        .starts_with("outbox-relay/"));
}

#[tokio::test]
async fn test_webhook_error_status_fails_event() {
    let (url, _receiver) = start_webhook(500).await;
    let (service, store) = service(&url, outbox_relay::FlagCache::new());

    let event = store
        .create_event(NewEvent::new("user.created", "users", "{}"))
        .await
        .unwrap();

    let summary = service.publish_batch(PublishRequest::default()).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(
        summary.errors,
        vec![format!("Event {}: webhook returned status 500", event.id)]
    );

    let stored = store.get_event(event.id).await.unwrap();
    assert_eq!(stored.status, EventStatus::Failed);
    assert_eq!(stored.retry_count, 1);
}

#[tokio::test]
async fn test_accepted_status_counts_as_delivered() {
    let (url, _receiver) = start_webhook(202).await;
    let (service, store) = service(&url, outbox_relay::FlagCache::new());
    store
        .create_event(NewEvent::new("user.created", "users", "{}"))
        .await
        .unwrap();

    let summary = service.publish_batch(PublishRequest::default()).await.unwrap();
    assert_eq!(summary.published, 1);
}

#[tokio::test]
async fn test_flag_client_reads_flags_service() {
    let base = start_flags().await;
    let client = HttpFlagClient::new(format!("{base}/"), Duration::from_secs(5)).unwrap();

    assert_eq!(client.get_flag("staging", "simulation_mode_enabled").await, Ok(true));
    assert_eq!(
        client.get_flag("staging", "partial_failure_mode").await,
        Err(FlagError::NotFound {
            key: "partial_failure_mode".to_string()
        })
    );
    assert_eq!(client.get_flag("staging", "boom").await, Err(FlagError::Status(500)));

    let all = client.get_all_flags("staging").await.unwrap();
    assert_eq!(all.get("disable_publishing"), Some(&true));
    assert!(client.get_all_flags("production").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remote_flags_drive_the_gates() {
    let base = start_flags().await;
    let (url, receiver) = start_webhook(200).await;
    let flags = HttpFlagClient::new(base, Duration::from_secs(5)).unwrap();

    let gates = SimulationGates::new(flags.clone(), "staging");
    assert!(gates.should_disable_publishing().await);
    assert!(!gates.should_use_partial_failure_mode().await);

    let (service, store) = service(&url, flags);
    let event = store
        .create_event(NewEvent::new("user.created", "users", "{}"))
        .await
        .unwrap();

    let summary = service.publish_batch(PublishRequest::default()).await.unwrap();
    assert_eq!(summary.published, 0);
    assert!(receiver.bodies.lock().unwrap().is_empty());
    assert_eq!(
        store.get_event(event.id).await.unwrap().status,
        EventStatus::Pending
    );

    let status = service.get_simulation_status().await;
    assert!(status.disable_publishing);
    assert_eq!(status.circuit_breaker_state.to_string(), "CLOSED");
}
