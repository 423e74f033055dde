//! Notification metrics endpoint, polled by dashboards.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use certhub_common::error::AppError;
use certhub_common::types::NotificationMetrics;
use certhub_pipeline::metrics::MetricsAggregator;

use crate::state::AppState;

/// Default lookback window in hours.
const DEFAULT_WINDOW_HOURS: i64 = 24;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/metrics/notifications", get(notification_metrics))
}

#[derive(Debug, Deserialize)]
struct MetricsQuery {
    window_hours: Option<i64>,
}

/// GET /api/metrics/notifications?window_hours=24
async fn notification_metrics(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<NotificationMetrics>, AppError> {
    let window_hours = query.window_hours.unwrap_or(DEFAULT_WINDOW_HOURS);

    if window_hours <= 0 {
        return Err(AppError::Validation(
            "window_hours must be positive".to_string(),
        ));
    }

    let metrics = MetricsAggregator::collect(&state.pool, window_hours).await?;
    Ok(Json(metrics))
}
