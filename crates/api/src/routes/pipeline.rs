//! Manual pipeline triggers.
//!
//! The same units of work the scheduler drives on timers, exposed for cron
//! systems and operators. Each trigger takes the unit's run lock first; a
//! held lock answers 409 rather than double-running the invocation.

use std::time::Duration;

use axum::routing::post;
use axum::{Json, Router, extract::State};
use serde_json::json;

use certhub_common::error::AppError;
use certhub_pipeline::backoff::BackoffPolicy;
use certhub_pipeline::delivery::PgDelivery;
use certhub_pipeline::lock::RunLock;
use certhub_pipeline::processor::RetryProcessor;
use certhub_pipeline::retention::RetentionCleaner;

use crate::state::AppState;

const RETRY_LOCK: &str = "retry_processor";
const RETENTION_LOCK: &str = "retention_cleaner";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pipeline/retries/process", post(process_retries))
        .route("/api/pipeline/retention/run", post(run_retention))
}

/// POST /api/pipeline/retries/process — drain one batch of due retry entries.
async fn process_retries(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut redis = state.redis.clone();
    let lock_ttl = state.config.retry_claim_lease_secs.max(1) as u64;

    if !RunLock::acquire(&mut redis, RETRY_LOCK, lock_ttl)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    {
        return Err(AppError::Busy(
            "retry processor invocation already in progress".to_string(),
        ));
    }

    let processor = RetryProcessor::new(PgDelivery)
        .with_batch_size(state.config.retry_batch_size)
        .with_backoff(BackoffPolicy::new(Duration::from_secs(
            state.config.retry_backoff_cap_secs,
        )))
        .with_claim_lease(chrono::Duration::seconds(state.config.retry_claim_lease_secs))
        .with_attempt_timeout(Duration::from_secs(state.config.retry_attempt_timeout_secs));

    let result = processor.process(&state.pool).await;

    if let Err(e) = RunLock::release(&mut redis, RETRY_LOCK).await {
        tracing::warn!(error = %e, "Failed to release retry run lock");
    }

    let report = result?;

    Ok(Json(json!({
        "success": true,
        "result": &report,
        "message": format!(
            "Processed {} entries: {} succeeded, {} failed",
            report.processed, report.succeeded, report.failed
        ),
    })))
}

/// POST /api/pipeline/retention/run — run one retention sweep.
async fn run_retention(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let mut redis = state.redis.clone();
    let lock_ttl = state.config.retry_claim_lease_secs.max(1) as u64;

    if !RunLock::acquire(&mut redis, RETENTION_LOCK, lock_ttl)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    {
        return Err(AppError::Busy(
            "retention sweep already in progress".to_string(),
        ));
    }

    let result = RetentionCleaner::sweep(&state.pool).await;

    if let Err(e) = RunLock::release(&mut redis, RETENTION_LOCK).await {
        tracing::warn!(error = %e, "Failed to release retention run lock");
    }

    let stats = result?;

    Ok(Json(json!({
        "success": true,
        "stats": &stats,
        "message": format!("Deleted {} notifications", stats.total_deleted),
    })))
}
