//! Dead-letter store for deletion events that exhausted their retries.
//!
//! The purge consumer routes a poison event here, commits its offset and
//! moves on; this is what keeps one failing user key from blocking the
//! rest of the topic. Entries stay queryable for incident response and
//! manual replay through the internal deletion endpoint.

use crate::storage_err;
use arcana_core::Result;
use arcana_core::event::EventEnvelope;
use arcana_core::stores::DeadLetterSink;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

/// One dead-lettered event.
#[derive(Debug, Clone)]
pub struct FailedEvent {
    /// Entry id.
    pub id: i64,
    /// The failed envelope, reconstructed from the stored columns.
    pub envelope: EventEnvelope,
    /// Error message from the final attempt.
    pub error_message: String,
    /// How many times processing was attempted before giving up.
    pub retry_count: i32,
    /// When the entry was recorded.
    pub first_failed_at: DateTime<Utc>,
    /// `pending`, `resolved` or `discarded`.
    pub status: String,
}

/// `PostgreSQL`-backed dead-letter store.
#[derive(Clone)]
pub struct DeadLetterStore {
    pool: PgPool,
}

impl DeadLetterStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List pending entries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`arcana_core::Error::Storage`] if the query fails.
    pub async fn list_pending(&self, limit: i64) -> Result<Vec<FailedEvent>> {
        let rows = sqlx::query(
            r"
            SELECT id, event_type, event_version, key, payload, occurred_at,
                   error_message, retry_count, first_failed_at, status
            FROM failed_events
            WHERE status = 'pending'
            ORDER BY first_failed_at ASC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_err("failed to list dead letters", &e))?;

        Ok(rows
            .iter()
            .map(|row| FailedEvent {
                id: row.get("id"),
                envelope: EventEnvelope {
                    event_type: row.get("event_type"),
                    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                    event_version: row.get::<i32, _>("event_version") as u16,
                    key: row.get("key"),
                    data: row.get("payload"),
                    occurred_at: row.get("occurred_at"),
                },
                error_message: row.get("error_message"),
                retry_count: row.get("retry_count"),
                first_failed_at: row.get("first_failed_at"),
                status: row.get("status"),
            })
            .collect())
    }

    /// Count pending entries, for readiness checks and alerting.
    ///
    /// # Errors
    ///
    /// Returns [`arcana_core::Error::Storage`] if the query fails.
    pub async fn count_pending(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM failed_events WHERE status = 'pending'")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_err("failed to count dead letters", &e))
    }

    /// Mark an entry resolved after a successful manual replay.
    ///
    /// # Errors
    ///
    /// Returns [`arcana_core::Error::Storage`] if the update fails.
    pub async fn mark_resolved(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE failed_events SET status = 'resolved' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_err("failed to resolve dead letter", &e))?;
        tracing::info!(dlq_id = id, "dead letter resolved");
        Ok(())
    }
}

#[async_trait]
impl DeadLetterSink for DeadLetterStore {
    async fn record(
        &self,
        envelope: &EventEnvelope,
        error_message: &str,
        retry_count: u32,
    ) -> Result<()> {
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO failed_events
                (event_type, event_version, key, payload, occurred_at, error_message, retry_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(&envelope.event_type)
        .bind(i32::from(envelope.event_version))
        .bind(&envelope.key)
        .bind(&envelope.data)
        .bind(envelope.occurred_at)
        .bind(error_message)
        .bind(i32::try_from(retry_count).unwrap_or(i32::MAX))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_err("failed to record dead letter", &e))?;

        tracing::warn!(
            dlq_id = id,
            event_type = %envelope.event_type,
            error = error_message,
            retry_count,
            "event routed to dead letter store"
        );
        metrics::counter!("purge.dead_lettered").increment(1);
        Ok(())
    }
}
