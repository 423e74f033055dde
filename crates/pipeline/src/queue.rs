//! Retry queue store — durable bookkeeping for failed delivery attempts.
//!
//! Every mutation is a single-row operation. Claiming is the one place that
//! needs care: two overlapping processor invocations must never hand out the
//! same due entry, so `claim_due` takes a lease atomically
//! (`FOR UPDATE SKIP LOCKED` inside the claiming UPDATE) and `record_failure`
//! is conditioned on the retry_count the claimer read. A crashed invocation
//! simply lets its lease expire; the entry becomes claimable again.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use certhub_common::error::AppError;
use certhub_common::types::{NotificationDraft, RetryQueueEntry};

/// Default maximum entries claimed per invocation.
pub const DEFAULT_BATCH_SIZE: i64 = 50;

/// Default claim lease in seconds.
pub const DEFAULT_CLAIM_LEASE_SECS: i64 = 300;

/// Service layer for the notification retry queue.
pub struct RetryQueueStore;

impl RetryQueueStore {
    /// Enqueue a failed delivery for retry.
    ///
    /// The entry starts at `retry_count = 0` with `next_retry_at = now`, so
    /// the first retry happens on the next drain.
    pub async fn enqueue(
        pool: &PgPool,
        draft: &NotificationDraft,
        max_retries: i32,
        last_error: Option<&str>,
    ) -> Result<RetryQueueEntry, AppError> {
        if max_retries <= 0 {
            return Err(AppError::Validation(
                "max_retries must be positive".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        let entry: RetryQueueEntry = sqlx::query_as(
            r#"
            INSERT INTO notification_retry_queue
                (id, user_id, payload, retry_count, max_retries, last_error,
                 next_retry_at, created_at)
            VALUES ($1, $2, $3, 0, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(draft.user_id)
        .bind(Json(draft))
        .bind(max_retries)
        .bind(last_error)
        .bind(now)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            entry_id = %entry.id,
            user_id = %entry.user_id,
            max_retries,
            "Retry queue entry created"
        );

        Ok(entry)
    }

    /// Atomically claim up to `limit` due entries, oldest-scheduled first.
    ///
    /// Due means `next_retry_at <= now` and `retry_count < max_retries` and
    /// no live claim (unclaimed, or claimed longer than `lease` ago — a
    /// stale claim from a crashed invocation). Claimed entries are stamped
    /// with `claimed_at = now` in the same statement, so a concurrent
    /// invocation skips them.
    pub async fn claim_due(
        pool: &PgPool,
        limit: i64,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> Result<Vec<RetryQueueEntry>, AppError> {
        let stale_before = now - lease;

        let entries: Vec<RetryQueueEntry> = sqlx::query_as(
            r#"
            UPDATE notification_retry_queue
            SET claimed_at = $1
            WHERE id IN (
                SELECT id FROM notification_retry_queue
                WHERE next_retry_at <= $1
                  AND retry_count < max_retries
                  AND (claimed_at IS NULL OR claimed_at < $2)
                ORDER BY next_retry_at ASC
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(stale_before)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        // RETURNING does not preserve the inner SELECT's order
        let mut entries = entries;
        entries.sort_by_key(|e| e.next_retry_at);

        Ok(entries)
    }

    /// Remove an entry after successful redelivery.
    pub async fn record_success(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM notification_retry_queue WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Reschedule an entry after a retryable failure.
    ///
    /// Conditioned on the retry_count the claimer read, so a competing
    /// invocation that somehow processed the same entry first cannot be
    /// double-counted. Clears the claim so the entry is visible again once
    /// `next_retry_at` arrives.
    pub async fn record_failure(
        pool: &PgPool,
        id: Uuid,
        error: &str,
        new_retry_count: i32,
        new_next_retry_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE notification_retry_queue
            SET retry_count = $2,
                last_error = $3,
                next_retry_at = $4,
                claimed_at = NULL
            WHERE id = $1 AND retry_count = $2 - 1
            "#,
        )
        .bind(id)
        .bind(new_retry_count)
        .bind(error)
        .bind(new_next_retry_at)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(
                entry_id = %id,
                new_retry_count,
                "Stale retry bookkeeping update skipped"
            );
        }

        Ok(())
    }

    /// Remove an entry whose retry budget is exhausted.
    ///
    /// Called only after the escalation notifier has been given the entry.
    pub async fn record_terminal_failure(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM notification_retry_queue WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        tracing::warn!(entry_id = %id, "Retry queue entry removed after exhausting budget");

        Ok(())
    }

    /// Number of entries currently due (observability helper).
    pub async fn due_count(pool: &PgPool, now: DateTime<Utc>) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM notification_retry_queue
            WHERE next_retry_at <= $1 AND retry_count < max_retries
            "#,
        )
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Get a single entry by ID (used by tests and diagnostics).
    pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<RetryQueueEntry>, AppError> {
        let entry: Option<RetryQueueEntry> =
            sqlx::query_as("SELECT * FROM notification_retry_queue WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(entry)
    }
}
