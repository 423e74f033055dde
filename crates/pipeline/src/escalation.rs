//! Escalation notifier — informs administrators when a retry budget is spent.
//!
//! Best-effort by contract: a failure to write an escalation notification is
//! logged and swallowed, never propagated back into the processor's batch.
//! End users are never told their notification failed; only admins are.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use certhub_common::types::{NotificationDraft, NotificationType, RetryQueueEntry};

use crate::admin::AdminDirectory;
use crate::store::NotificationStore;

/// How long an escalation notification stays before the retention cleaner
/// may reclaim it.
const ESCALATION_EXPIRY_DAYS: i64 = 7;

pub struct EscalationNotifier;

impl EscalationNotifier {
    /// Notify every administrator that `entry` has terminally failed.
    ///
    /// No-op when there are zero administrators. Returns the number of
    /// escalation notifications actually created.
    pub async fn escalate(pool: &PgPool, entry: &RetryQueueEntry, error: &str) -> u32 {
        let admin_ids = match AdminDirectory::admin_ids(pool).await {
            Ok(ids) => ids,
            Err(err) => {
                tracing::error!(
                    entry_id = %entry.id,
                    error = %err,
                    "Failed to look up administrators for escalation"
                );
                return 0;
            }
        };

        if admin_ids.is_empty() {
            tracing::warn!(
                entry_id = %entry.id,
                "No administrators to escalate to, dropping terminally failed entry silently"
            );
            return 0;
        }

        let expires_at = Utc::now() + Duration::days(ESCALATION_EXPIRY_DAYS);
        let mut created = 0u32;

        for admin_id in &admin_ids {
            let draft = NotificationDraft {
                user_id: *admin_id,
                title: "Notification delivery failed permanently".to_string(),
                message: format!(
                    "Retry queue entry {} for user {} was dropped after {} failed attempts. \
                     Last error: {}",
                    entry.id, entry.user_id, entry.max_retries, error
                ),
                notification_type: NotificationType::Error,
                related_document_id: None,
                related_document_type: None,
                expires_at: Some(expires_at),
            };

            match NotificationStore::create(pool, &draft).await {
                Ok(_) => created += 1,
                Err(err) => {
                    tracing::error!(
                        entry_id = %entry.id,
                        admin_id = %admin_id,
                        error = %err,
                        "Failed to create escalation notification"
                    );
                }
            }
        }

        tracing::warn!(
            entry_id = %entry.id,
            user_id = %entry.user_id,
            retry_count = entry.retry_count,
            admins_notified = created,
            "Escalated terminally failed notification delivery"
        );

        created
    }
}
