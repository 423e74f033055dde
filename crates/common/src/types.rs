use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Platform roles. Only `admin` matters to the pipeline — administrators
/// receive escalation and sweep-summary notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Member,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Member => write!(f, "member"),
        }
    }
}

/// A user in the system.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Notification severity/kind shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Warning,
    Error,
    Success,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::Info => write!(f, "info"),
            NotificationType::Warning => write!(f, "warning"),
            NotificationType::Error => write!(f, "error"),
            NotificationType::Success => write!(f, "success"),
        }
    }
}

/// A persisted per-user notification.
///
/// `read_at` is monotonic: set at most once, never cleared.
/// `related_document_*` is an untyped reference into the document side of the
/// platform and may dangle (the document can be deleted independently).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub related_document_id: Option<Uuid>,
    pub related_document_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A full, self-contained snapshot of a notification to be (re)created.
///
/// This is the retry queue's payload: it deliberately carries everything
/// needed to insert the row, not a foreign key — the target row may never
/// have existed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDraft {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub related_document_id: Option<Uuid>,
    pub related_document_type: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A failed-delivery entry awaiting retry.
///
/// While the entry exists, `retry_count < max_retries`; the processor removes
/// it atomically on success or on reaching the budget. `claimed_at` is the
/// claim lease taken by `RetryQueueStore::claim_due` so overlapping
/// invocations cannot double-deliver the same entry.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RetryQueueEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payload: sqlx::types::Json<NotificationDraft>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub last_error: Option<String>,
    pub next_retry_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate result of one retry processor invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryBatchReport {
    pub processed: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

/// Result of one retention sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupStats {
    pub expired_deleted: u64,
    pub old_read_deleted: u64,
    pub total_deleted: u64,
    pub retention_days: i64,
    pub executed_at: DateTime<Utc>,
}

/// Read-only statistics over the notification store for a lookback window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationMetrics {
    pub window_hours: i64,
    pub total_created: i64,
    pub total_read: i64,
    pub total_unread: i64,
    pub total_expired: i64,
    pub by_type: HashMap<String, i64>,
    pub read_rate_percentage: f64,
}
