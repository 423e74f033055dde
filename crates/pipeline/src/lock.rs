//! Run locks — Redis-backed mutual exclusion for pipeline invocations.
//!
//! The retry processor and the retention cleaner are externally triggered
//! (scheduler tick or manual API call); a run lock keeps two triggers for the
//! same unit of work from overlapping. Uses Redis `SET NX EX` for atomic
//! check-and-set with automatic TTL expiry, so a crashed holder cannot wedge
//! the pipeline.

use redis::aio::ConnectionManager;

/// Redis-backed run lock, one key per named unit of work.
pub struct RunLock;

impl RunLock {
    /// Try to acquire the lock for `name` with the given TTL.
    ///
    /// Returns `true` if the lock was taken (the invocation should proceed),
    /// `false` if another invocation holds it.
    pub async fn acquire(
        redis: &mut ConnectionManager,
        name: &str,
        ttl_secs: u64,
    ) -> anyhow::Result<bool> {
        let key = Self::key(name);

        // SET key "1" NX EX ttl
        // Some("OK") if the key was set, None if it already exists
        let result: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(redis)
            .await?;

        let acquired = result.is_some();

        if !acquired {
            tracing::debug!(lock = %name, "Run lock held by another invocation");
        }

        Ok(acquired)
    }

    /// Release the lock for `name`.
    pub async fn release(redis: &mut ConnectionManager, name: &str) -> anyhow::Result<()> {
        let key = Self::key(name);
        redis::cmd("DEL").arg(&key).query_async::<()>(redis).await?;
        Ok(())
    }

    fn key(name: &str) -> String {
        format!("pipeline:lock:{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_namespacing() {
        assert_eq!(RunLock::key("retry_processor"), "pipeline:lock:retry_processor");
    }
}
