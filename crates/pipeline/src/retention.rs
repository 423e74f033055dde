//! Retention cleaner — periodic sweep over the notification store.
//!
//! Two independent deletion rules per sweep, each isolated: a rule that
//! fails is logged and reported as zero, and the other rule still runs.
//! The sweep is idempotent — running it twice back-to-back deletes nothing
//! the second time.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use certhub_common::error::AppError;
use certhub_common::types::{CleanupStats, NotificationDraft, NotificationType};

use crate::admin::AdminDirectory;
use crate::store::NotificationStore;

/// Retention window applied when the setting is missing or unparseable.
pub const DEFAULT_RETENTION_DAYS: i64 = 90;

/// Setting key consumed by the cleaner.
pub const RETENTION_DAYS_KEY: &str = "notifications.retention_days";

/// Expiry on the sweep-summary notification sent to admins.
const SUMMARY_EXPIRY_DAYS: i64 = 7;

pub struct RetentionCleaner;

impl RetentionCleaner {
    /// Run one retention sweep.
    ///
    /// Rule 1 deletes every notification whose `expires_at` is strictly in
    /// the past, regardless of read state. Rule 2 deletes every notification
    /// whose `read_at` is older than the retention window. When anything was
    /// deleted, each administrator gets one info summary notification.
    pub async fn sweep(pool: &PgPool) -> Result<CleanupStats, AppError> {
        let now = Utc::now();
        let retention_days = Self::retention_days(pool).await;

        let expired_deleted = match Self::delete_expired(pool).await {
            Ok(count) => count,
            Err(err) => {
                tracing::error!(error = %err, "Expired-notification rule failed");
                0
            }
        };

        let read_before = now - Duration::days(retention_days);
        let old_read_deleted = match Self::delete_old_read(pool, read_before).await {
            Ok(count) => count,
            Err(err) => {
                tracing::error!(error = %err, "Old-read-notification rule failed");
                0
            }
        };

        let stats = CleanupStats {
            expired_deleted,
            old_read_deleted,
            total_deleted: expired_deleted + old_read_deleted,
            retention_days,
            executed_at: now,
        };

        tracing::info!(
            expired_deleted = stats.expired_deleted,
            old_read_deleted = stats.old_read_deleted,
            retention_days = stats.retention_days,
            "Retention sweep complete"
        );

        if stats.total_deleted > 0 {
            Self::send_summary(pool, &stats).await;
        }

        Ok(stats)
    }

    /// Read `notifications.retention_days`, defaulting to 90 when the
    /// setting is missing or not an integer. A broken setting is recovered
    /// locally, never surfaced as an error.
    pub async fn retention_days(pool: &PgPool) -> i64 {
        let value: Result<Option<String>, sqlx::Error> =
            sqlx::query_scalar("SELECT value FROM app_settings WHERE key = $1")
                .bind(RETENTION_DAYS_KEY)
                .fetch_optional(pool)
                .await;

        match value {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(
                    value = %raw,
                    "Unparseable retention_days setting, using default"
                );
                DEFAULT_RETENTION_DAYS
            }),
            Ok(None) => DEFAULT_RETENTION_DAYS,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read retention setting, using default");
                DEFAULT_RETENTION_DAYS
            }
        }
    }

    async fn delete_expired(pool: &PgPool) -> Result<u64, AppError> {
        let result = sqlx::query(
            "DELETE FROM notifications WHERE expires_at IS NOT NULL AND expires_at < now()",
        )
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_old_read(
        pool: &PgPool,
        read_before: chrono::DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE read_at IS NOT NULL AND read_at < $1")
                .bind(read_before)
                .execute(pool)
                .await?;

        Ok(result.rows_affected())
    }

    /// Best-effort sweep summary to every administrator.
    async fn send_summary(pool: &PgPool, stats: &CleanupStats) {
        let admin_ids = match AdminDirectory::admin_ids(pool).await {
            Ok(ids) => ids,
            Err(err) => {
                tracing::error!(error = %err, "Failed to look up administrators for sweep summary");
                return;
            }
        };

        let expires_at = Utc::now() + Duration::days(SUMMARY_EXPIRY_DAYS);

        for admin_id in &admin_ids {
            let draft = NotificationDraft {
                user_id: *admin_id,
                title: "Notification retention sweep".to_string(),
                message: format!(
                    "Removed {} notifications ({} expired, {} read more than {} days ago).",
                    stats.total_deleted,
                    stats.expired_deleted,
                    stats.old_read_deleted,
                    stats.retention_days
                ),
                notification_type: NotificationType::Info,
                related_document_id: None,
                related_document_type: None,
                expires_at: Some(expires_at),
            };

            if let Err(err) = NotificationStore::create(pool, &draft).await {
                tracing::error!(
                    admin_id = %admin_id,
                    error = %err,
                    "Failed to create sweep summary notification"
                );
            }
        }
    }
}
