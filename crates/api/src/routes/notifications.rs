//! Interactive notification routes sharing the store with the pipeline.
//!
//! Only the paths the reliability pipeline must coexist with live here:
//! marking read (monotonic) and explicit owner deletion. The platform's full
//! notification UI is served elsewhere; owner identity arrives from its
//! gateway as an explicit id.

use axum::extract::{Path, Query, State};
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use certhub_common::error::AppError;
use certhub_pipeline::store::NotificationStore;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications/{id}/read", post(mark_read))
        .route("/api/notifications/{id}", delete(delete_notification))
}

#[derive(Debug, Deserialize)]
struct OwnerParams {
    user_id: Uuid,
}

/// POST /api/notifications/:id/read — mark a notification read.
///
/// Idempotent: an already-read notification keeps its original read_at and
/// the response reports `updated: false`.
async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(params): Json<OwnerParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let updated = NotificationStore::mark_read(&state.pool, id, params.user_id).await?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}

/// DELETE /api/notifications/:id?user_id=... — explicit owner deletion.
async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<OwnerParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = NotificationStore::delete_for_owner(&state.pool, id, params.user_id).await?;
    if deleted {
        Ok(Json(serde_json::json!({ "deleted": true })))
    } else {
        Err(AppError::NotFound(format!("Notification {} not found", id)))
    }
}
