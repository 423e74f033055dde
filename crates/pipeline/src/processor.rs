//! Retry processor — drains due queue entries and attempts redelivery.
//!
//! One invocation is stateless: claim a batch, walk it sequentially, and
//! report counters back to the caller. Per-entry failures are isolated — a
//! bad entry never aborts the batch — but a failure to read the queue itself
//! is fatal for the whole invocation.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;

use certhub_common::error::AppError;
use certhub_common::types::{RetryBatchReport, RetryQueueEntry};

use crate::backoff::BackoffPolicy;
use crate::delivery::Delivery;
use crate::escalation::EscalationNotifier;
use crate::queue::{DEFAULT_BATCH_SIZE, DEFAULT_CLAIM_LEASE_SECS, RetryQueueStore};

/// Default per-attempt delivery timeout.
const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry processor over a pluggable delivery primitive.
pub struct RetryProcessor<D: Delivery> {
    delivery: D,
    backoff: BackoffPolicy,
    batch_size: i64,
    claim_lease: chrono::Duration,
    /// Ceiling on a single delivery attempt so one stuck attempt cannot
    /// stall the rest of the batch.
    attempt_timeout: Duration,
}

impl<D: Delivery> RetryProcessor<D> {
    pub fn new(delivery: D) -> Self {
        Self {
            delivery,
            backoff: BackoffPolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            claim_lease: chrono::Duration::seconds(DEFAULT_CLAIM_LEASE_SECS),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_claim_lease(mut self, lease: chrono::Duration) -> Self {
        self.claim_lease = lease;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Run one processor invocation.
    ///
    /// Claims up to `batch_size` due entries (oldest-scheduled first) and for
    /// each one, independently:
    /// - redelivery succeeds → entry removed
    /// - redelivery fails with budget left → rescheduled per backoff
    /// - redelivery fails with budget spent → escalated to admins, removed
    ///
    /// The claim itself failing propagates as a fatal error; everything after
    /// is contained and aggregated into the report.
    pub async fn process(&self, pool: &PgPool) -> Result<RetryBatchReport, AppError> {
        let now = Utc::now();
        let entries =
            RetryQueueStore::claim_due(pool, self.batch_size, now, self.claim_lease).await?;

        if entries.is_empty() {
            tracing::debug!("No due retry queue entries");
            return Ok(RetryBatchReport::default());
        }

        tracing::info!(count = entries.len(), "Processing due retry queue entries");

        let mut report = RetryBatchReport::default();

        for entry in &entries {
            report.processed += 1;
            if let Err(err) = self.process_entry(pool, entry, &mut report).await {
                // Bookkeeping failed for this entry; the claim lease will
                // expire and a later invocation picks it up again.
                tracing::error!(
                    entry_id = %entry.id,
                    error = %err,
                    "Retry bookkeeping failed for entry"
                );
                report.errors.push(format!("entry {}: {}", entry.id, err));
            }
        }

        tracing::info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            "Retry queue drain complete"
        );

        Ok(report)
    }

    /// Handle a single claimed entry.
    async fn process_entry(
        &self,
        pool: &PgPool,
        entry: &RetryQueueEntry,
        report: &mut RetryBatchReport,
    ) -> Result<(), AppError> {
        match self.attempt_delivery(pool, entry).await {
            Ok(()) => {
                RetryQueueStore::record_success(pool, entry.id).await?;
                report.succeeded += 1;
                tracing::info!(
                    entry_id = %entry.id,
                    user_id = %entry.user_id,
                    retry_count = entry.retry_count,
                    "Redelivery succeeded"
                );
            }
            Err(error_text) => {
                report.failed += 1;
                report
                    .errors
                    .push(format!("entry {}: {}", entry.id, error_text));

                let new_retry_count = entry.retry_count + 1;

                if new_retry_count >= entry.max_retries {
                    // Budget spent: escalation first, then removal. Escalation
                    // is best-effort and never propagates.
                    EscalationNotifier::escalate(pool, entry, &error_text).await;
                    RetryQueueStore::record_terminal_failure(pool, entry.id).await?;
                } else {
                    let delay = self.backoff.delay(new_retry_count as u32);
                    let next_retry_at =
                        Utc::now() + chrono::Duration::from_std(delay).unwrap_or_default();
                    RetryQueueStore::record_failure(
                        pool,
                        entry.id,
                        &error_text,
                        new_retry_count,
                        next_retry_at,
                    )
                    .await?;
                    tracing::info!(
                        entry_id = %entry.id,
                        new_retry_count,
                        delay_secs = delay.as_secs(),
                        "Redelivery failed, rescheduled"
                    );
                }
            }
        }

        Ok(())
    }

    /// One timed delivery attempt. Returns the error text on failure so the
    /// queue can record it verbatim.
    async fn attempt_delivery(
        &self,
        pool: &PgPool,
        entry: &RetryQueueEntry,
    ) -> Result<(), String> {
        match tokio::time::timeout(
            self.attempt_timeout,
            self.delivery.deliver(pool, &entry.payload.0),
        )
        .await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err(format!(
                "delivery attempt timed out after {}s",
                self.attempt_timeout.as_secs()
            )),
        }
    }
}
