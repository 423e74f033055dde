//! Delivery primitive — the creation attempt the pipeline retries.
//!
//! The pipeline only cares about the success/failure outcome of persisting a
//! notification row, so the attempt sits behind a small trait. Production
//! uses [`PgDelivery`] (a straight `NotificationStore::create`); tests plug
//! in failure-injecting doubles to drive the retry paths.

use sqlx::PgPool;

use certhub_common::error::AppError;
use certhub_common::types::{Notification, NotificationDraft};

use crate::queue::RetryQueueStore;
use crate::store::NotificationStore;

/// One notification creation attempt.
pub trait Delivery: Send + Sync {
    fn deliver(
        &self,
        pool: &PgPool,
        draft: &NotificationDraft,
    ) -> impl Future<Output = Result<Notification, AppError>> + Send;
}

/// Production delivery: insert the row into the notification store.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgDelivery;

impl Delivery for PgDelivery {
    async fn deliver(
        &self,
        pool: &PgPool,
        draft: &NotificationDraft,
    ) -> Result<Notification, AppError> {
        NotificationStore::create(pool, draft).await
    }
}

/// Outcome of a producer-side delivery attempt.
#[derive(Debug, Clone)]
pub enum DeliveryOutcome {
    /// The notification row was created.
    Delivered(Notification),
    /// Creation failed; a retry queue entry now carries the draft. The first
    /// retry is due immediately on the next processor drain.
    Enqueued { entry_id: uuid::Uuid },
}

/// Producer entry point: attempt creation, and on failure hand the draft to
/// the retry queue instead of surfacing the error to the business event that
/// triggered it.
pub async fn deliver_or_enqueue(
    pool: &PgPool,
    draft: NotificationDraft,
    max_retries: i32,
) -> Result<DeliveryOutcome, AppError> {
    match NotificationStore::create(pool, &draft).await {
        Ok(notification) => Ok(DeliveryOutcome::Delivered(notification)),
        Err(err) => {
            tracing::warn!(
                user_id = %draft.user_id,
                error = %err,
                "Notification creation failed, enqueueing for retry"
            );
            let entry =
                RetryQueueStore::enqueue(pool, &draft, max_retries, Some(&err.to_string())).await?;
            Ok(DeliveryOutcome::Enqueued { entry_id: entry.id })
        }
    }
}
