//! CertHub notification pipeline API server binary entrypoint.

use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use certhub_common::config::AppConfig;
use certhub_common::db::create_pool;
use certhub_common::redis_pool::create_redis_pool;

use certhub_api::routes::create_router;
use certhub_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("certhub_api=debug,certhub_pipeline=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting CertHub pipeline API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database pool created");

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // Create Redis connection
    let redis = create_redis_pool(&config.redis_url).await?;
    tracing::info!("Redis connection established");

    // Build application state
    let state = AppState::new(pool, redis, config);

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
