// Copyright (c) 2025 - Cowboy AI, Inc.
//! Postgres event store
//!
//! Thin adapter over an existing `outbox_events` table. Schema management is
//! left to the operator; the expected DDL lives in
//! `migrations/0001_outbox_events.sql`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};
use uuid::Uuid;

use super::EventStore;
use crate::config::DatabaseConfig;
use crate::errors::{OutboxError, OutboxResult};
use crate::events::{Event, EventPage, EventStats, EventStatus, ListQuery, NewEvent};

const EVENT_COLUMNS: &str = "id, type, source, data, metadata, status, retry_count, \
     last_error, created_at, updated_at, published_at";

/// Row shape of `outbox_events`
#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    #[sqlx(rename = "type")]
    event_type: String,
    source: String,
    data: Value,
    metadata: Option<Value>,
    status: String,
    retry_count: i32,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
}

impl TryFrom<EventRow> for Event {
    type Error = OutboxError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let status = EventStatus::parse(&row.status).ok_or_else(|| {
            OutboxError::Storage(format!("unknown status '{}' for event {}", row.status, row.id))
        })?;

        Ok(Event {
            id: row.id,
            event_type: row.event_type,
            source: row.source,
            data: row.data,
            metadata: row.metadata,
            status,
            retry_count: u32::try_from(row.retry_count).unwrap_or(0),
            last_error: row.last_error.unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            published_at: row.published_at,
        })
    }
}

fn into_events(rows: Vec<EventRow>) -> OutboxResult<Vec<Event>> {
    rows.into_iter().map(Event::try_from).collect()
}

/// Event store backed by a Postgres connection pool
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool for the configured database
    pub async fn connect(config: &DatabaseConfig) -> OutboxResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url())
            .await?;

        info!(host = %config.host, database = %config.name, "Connected to Postgres");
        Ok(Self { pool })
    }

    /// Underlying pool for advanced operations
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn create_event(&self, request: NewEvent) -> OutboxResult<Event> {
        let (data, metadata) = request.parse_payload()?;
        let now = Utc::now();

        let query = format!(
            "INSERT INTO outbox_events (id, type, source, data, metadata, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             RETURNING {EVENT_COLUMNS}"
        );
        let row: EventRow = sqlx::query_as(&query)
            .bind(Uuid::now_v7())
            .bind(&request.event_type)
            .bind(&request.source)
            .bind(&data)
            .bind(&metadata)
            .bind(EventStatus::Pending.as_str())
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        debug!(event_id = %row.id, event_type = %row.event_type, "Created outbox event");
        row.try_into()
    }

    async fn get_event(&self, id: Uuid) -> OutboxResult<Event> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM outbox_events WHERE id = $1");
        let row: Option<EventRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or(OutboxError::NotFound(id))?.try_into()
    }

    async fn list_events(&self, query: ListQuery) -> OutboxResult<EventPage> {
        let status = query.status.map(|s| s.as_str());

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM outbox_events WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM outbox_events \
             WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        let rows: Vec<EventRow> = sqlx::query_as(&sql)
            .bind(status)
            .bind(i64::from(query.limit))
            .bind(i64::try_from(query.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(EventPage {
            events: into_events(rows)?,
            total: u64::try_from(total).unwrap_or(0),
            page: query.page,
            limit: query.limit,
        })
    }

    async fn get_pending_events(&self, limit: usize) -> OutboxResult<Vec<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM outbox_events \
             WHERE status IN ('pending', 'retrying') \
             ORDER BY created_at ASC \
             LIMIT $1"
        );
        let rows: Vec<EventRow> = sqlx::query_as(&sql)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        into_events(rows)
    }

    async fn update_event_status(
        &self,
        id: Uuid,
        status: EventStatus,
        last_error: &str,
        retry_count: u32,
    ) -> OutboxResult<()> {
        let now = Utc::now();
        let published_at = (status == EventStatus::Published).then_some(now);

        let result = sqlx::query(
            "UPDATE outbox_events \
             SET status = $1, last_error = $2, retry_count = GREATEST(retry_count, $3), \
                 updated_at = $4, published_at = $5 \
             WHERE id = $6",
        )
        .bind(status.as_str())
        .bind(last_error)
        .bind(i32::try_from(retry_count).unwrap_or(i32::MAX))
        .bind(now)
        .bind(published_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(OutboxError::NotFound(id));
        }
        Ok(())
    }

    async fn update_event_published_at(
        &self,
        id: Uuid,
        published_at: Option<DateTime<Utc>>,
    ) -> OutboxResult<()> {
        let result = sqlx::query(
            "UPDATE outbox_events SET published_at = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(published_at)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(OutboxError::NotFound(id));
        }
        Ok(())
    }

    async fn delete_event(&self, id: Uuid) -> OutboxResult<()> {
        let result = sqlx::query("DELETE FROM outbox_events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(OutboxError::NotFound(id));
        }
        Ok(())
    }

    async fn get_stats(&self) -> OutboxResult<EventStats> {
        let (total, pending, published, failed, retries): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                "SELECT \
                    COUNT(*), \
                    COUNT(*) FILTER (WHERE status = 'pending'), \
                    COUNT(*) FILTER (WHERE status = 'published'), \
                    COUNT(*) FILTER (WHERE status = 'failed'), \
                    COALESCE(SUM(retry_count), 0)::BIGINT \
                 FROM outbox_events",
            )
            .fetch_one(&self.pool)
            .await?;

        let count = |n: i64| u64::try_from(n).unwrap_or(0);
        Ok(EventStats {
            total_events: count(total),
            pending_events: count(pending),
            published_events: count(published),
            failed_events: count(failed),
            retry_count: count(retries),
        })
    }
}
