pub mod health;
pub mod metrics;
pub mod notifications;
pub mod pipeline;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(pipeline::router())
        .merge(metrics::router())
        .merge(notifications::router())
        .with_state(state)
}
