use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string (run locks)
    pub redis_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// Maximum retry queue entries claimed per processor invocation (default: 50)
    pub retry_batch_size: i64,

    /// Ceiling on the exponential backoff delay in seconds (default: 3600)
    pub retry_backoff_cap_secs: u64,

    /// Per-attempt delivery timeout in seconds (default: 30)
    pub retry_attempt_timeout_secs: u64,

    /// How long a claimed queue entry stays invisible to other invocations,
    /// in seconds (default: 300)
    pub retry_claim_lease_secs: i64,

    /// Scheduler: seconds between retry processor runs (default: 60)
    pub retry_poll_interval_secs: u64,

    /// Scheduler: seconds between retention sweeps (default: 86400)
    pub retention_sweep_interval_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            retry_batch_size: std::env::var("RETRY_BATCH_SIZE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_BATCH_SIZE must be a valid i64"))?,
            retry_backoff_cap_secs: std::env::var("RETRY_BACKOFF_CAP_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_BACKOFF_CAP_SECS must be a valid u64"))?,
            retry_attempt_timeout_secs: std::env::var("RETRY_ATTEMPT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_ATTEMPT_TIMEOUT_SECS must be a valid u64"))?,
            retry_claim_lease_secs: std::env::var("RETRY_CLAIM_LEASE_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_CLAIM_LEASE_SECS must be a valid i64"))?,
            retry_poll_interval_secs: std::env::var("RETRY_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_POLL_INTERVAL_SECS must be a valid u64"))?,
            retention_sweep_interval_secs: std::env::var("RETENTION_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("RETENTION_SWEEP_INTERVAL_SECS must be a valid u64")
                })?,
        })
    }
}
