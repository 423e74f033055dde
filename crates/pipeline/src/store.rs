//! Notification store — single-row operations on the notification stream.
//!
//! `create` is the one creation primitive in the system: producers, the retry
//! processor, the escalation notifier, and the sweep summary all go through
//! it, so a notification row always looks the same regardless of who wrote it.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use certhub_common::error::AppError;
use certhub_common::types::{Notification, NotificationDraft};

/// Service layer for notification rows.
pub struct NotificationStore;

impl NotificationStore {
    /// Persist a notification from a draft snapshot.
    pub async fn create(pool: &PgPool, draft: &NotificationDraft) -> Result<Notification, AppError> {
        let id = Uuid::new_v4();

        let notification: Notification = sqlx::query_as(
            r#"
            INSERT INTO notifications
                (id, user_id, title, message, notification_type,
                 related_document_id, related_document_type, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(draft.user_id)
        .bind(&draft.title)
        .bind(&draft.message)
        .bind(draft.notification_type)
        .bind(draft.related_document_id)
        .bind(&draft.related_document_type)
        .bind(Utc::now())
        .bind(draft.expires_at)
        .fetch_one(pool)
        .await?;

        tracing::debug!(
            notification_id = %notification.id,
            user_id = %notification.user_id,
            notification_type = %notification.notification_type,
            "Notification created"
        );

        Ok(notification)
    }

    /// Get a single notification by ID.
    pub async fn get(pool: &PgPool, id: Uuid) -> Result<Notification, AppError> {
        let notification: Notification =
            sqlx::query_as("SELECT * FROM notifications WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))?;

        Ok(notification)
    }

    /// Mark a notification read.
    ///
    /// `read_at` is monotonic: the update only fires while it is NULL, so a
    /// repeat call (or a concurrent one) cannot move the timestamp. Returns
    /// `false` when the row doesn't exist, belongs to someone else, or was
    /// already read.
    pub async fn mark_read(pool: &PgPool, id: Uuid, owner: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET read_at = $3
            WHERE id = $1 AND user_id = $2 AND read_at IS NULL
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a notification on explicit owner action.
    pub async fn delete_for_owner(pool: &PgPool, id: Uuid, owner: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
