//! CertHub scheduler — drives the reliability pipeline on timers.
//!
//! Stateless between ticks: all retry/retention state lives in Postgres, so
//! a crash mid-tick loses nothing — claimed entries resurface when their
//! lease expires.

use std::time::Duration;

use redis::aio::ConnectionManager;
use sqlx::PgPool;

use certhub_common::config::AppConfig;
use certhub_common::db;
use certhub_common::redis_pool;

use certhub_pipeline::backoff::BackoffPolicy;
use certhub_pipeline::delivery::PgDelivery;
use certhub_pipeline::lock::RunLock;
use certhub_pipeline::processor::RetryProcessor;
use certhub_pipeline::retention::RetentionCleaner;

const RETRY_LOCK: &str = "retry_processor";
const RETENTION_LOCK: &str = "retention_cleaner";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certhub_pipeline=info".into()),
        )
        .json()
        .init();

    tracing::info!("CertHub scheduler starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // Connect to Redis for run locks
    let redis = redis_pool::create_redis_pool(&config.redis_url).await?;

    let processor = RetryProcessor::new(PgDelivery)
        .with_batch_size(config.retry_batch_size)
        .with_backoff(BackoffPolicy::new(Duration::from_secs(
            config.retry_backoff_cap_secs,
        )))
        .with_claim_lease(chrono::Duration::seconds(config.retry_claim_lease_secs))
        .with_attempt_timeout(Duration::from_secs(config.retry_attempt_timeout_secs));

    tracing::info!(
        retry_poll_interval_secs = config.retry_poll_interval_secs,
        retention_sweep_interval_secs = config.retention_sweep_interval_secs,
        "Scheduler started"
    );

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        _ = run_retry_loop(&processor, &pool, redis.clone(), &config) => {}
        _ = run_retention_loop(&pool, redis.clone(), &config) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    tracing::info!("CertHub scheduler stopped.");
    Ok(())
}

/// Tick the retry processor on its poll interval.
async fn run_retry_loop(
    processor: &RetryProcessor<PgDelivery>,
    pool: &PgPool,
    mut redis: ConnectionManager,
    config: &AppConfig,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(config.retry_poll_interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        match RunLock::acquire(&mut redis, RETRY_LOCK, config.retry_poll_interval_secs).await {
            Ok(true) => {
                if let Err(e) = processor.process(pool).await {
                    tracing::error!(error = %e, "Retry processor invocation failed");
                }
                if let Err(e) = RunLock::release(&mut redis, RETRY_LOCK).await {
                    tracing::warn!(error = %e, "Failed to release retry run lock");
                }
            }
            Ok(false) => {}
            Err(e) => tracing::error!(error = %e, "Failed to acquire retry run lock"),
        }
    }
}

/// Tick the retention cleaner on its sweep interval.
async fn run_retention_loop(pool: &PgPool, mut redis: ConnectionManager, config: &AppConfig) {
    let mut interval =
        tokio::time::interval(Duration::from_secs(config.retention_sweep_interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // Skip the immediate first tick so a restart loop doesn't re-sweep
    interval.tick().await;

    loop {
        interval.tick().await;

        match RunLock::acquire(
            &mut redis,
            RETENTION_LOCK,
            config.retention_sweep_interval_secs,
        )
        .await
        {
            Ok(true) => {
                if let Err(e) = RetentionCleaner::sweep(pool).await {
                    tracing::error!(error = %e, "Retention sweep failed");
                }
                if let Err(e) = RunLock::release(&mut redis, RETENTION_LOCK).await {
                    tracing::warn!(error = %e, "Failed to release retention run lock");
                }
            }
            Ok(false) => {}
            Err(e) => tracing::error!(error = %e, "Failed to acquire retention run lock"),
        }
    }
}
