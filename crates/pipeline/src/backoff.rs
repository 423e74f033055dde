//! Backoff policy — maps a retry count to the delay before the next attempt.
//!
//! Pure exponential doubling (1s, 2s, 4s, 8s, ...) with a hard ceiling.
//! Deterministic, no jitter: identical inputs always yield identical delays,
//! which keeps the queue's `next_retry_at` bookkeeping reproducible in tests.

use std::time::Duration;

/// Default ceiling on the backoff delay (1 hour).
pub const DEFAULT_BACKOFF_CAP_SECS: u64 = 3600;

/// Exponential backoff policy with a ceiling.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    cap: Duration,
}

impl BackoffPolicy {
    /// Create a policy with a custom ceiling.
    pub fn new(cap: Duration) -> Self {
        Self { cap }
    }

    /// Delay before the retry numbered `retry_count`.
    ///
    /// `retry_count = 0` yields the minimum delay of 1 second; each further
    /// retry doubles the delay until the ceiling is reached. Strictly
    /// increasing below the ceiling.
    pub fn delay(&self, retry_count: u32) -> Duration {
        let secs = 1u64
            .checked_shl(retry_count)
            .unwrap_or(u64::MAX)
            .min(self.cap.as_secs());
        Duration::from_secs(secs)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_BACKOFF_CAP_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_retry_is_one_second() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_secs(1));
    }

    #[test]
    fn test_doubles_per_retry() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(3), Duration::from_secs(8));
        assert_eq!(policy.delay(10), Duration::from_secs(1024));
    }

    #[test]
    fn test_strictly_increasing_below_cap() {
        let policy = BackoffPolicy::default();
        for n in 0..11 {
            assert!(policy.delay(n + 1) > policy.delay(n));
        }
    }

    #[test]
    fn test_capped_at_ceiling() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(12), Duration::from_secs(3600));
        assert_eq!(policy.delay(30), Duration::from_secs(3600));
        // Shift counts past u64 width must not wrap
        assert_eq!(policy.delay(200), Duration::from_secs(3600));
    }

    #[test]
    fn test_deterministic() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(5), policy.delay(5));
    }

    #[test]
    fn test_custom_cap() {
        let policy = BackoffPolicy::new(Duration::from_secs(10));
        assert_eq!(policy.delay(3), Duration::from_secs(8));
        assert_eq!(policy.delay(4), Duration::from_secs(10));
        assert_eq!(policy.delay(5), Duration::from_secs(10));
    }
}
