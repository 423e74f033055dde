//! Metrics aggregator — read-only statistics over the notification store.
//!
//! Polled by dashboards; never participates in the write path and tolerates
//! eventual consistency.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use sqlx::PgPool;

use certhub_common::error::AppError;
use certhub_common::types::NotificationMetrics;

pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Aggregate notification statistics over the trailing `window_hours`.
    pub async fn collect(pool: &PgPool, window_hours: i64) -> Result<NotificationMetrics, AppError> {
        let now = Utc::now();
        let since = now - Duration::hours(window_hours);

        let (total_created, total_read, total_expired): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE read_at IS NOT NULL),
                COUNT(*) FILTER (WHERE expires_at IS NOT NULL AND expires_at < $2)
            FROM notifications
            WHERE created_at >= $1
            "#,
        )
        .bind(since)
        .bind(now)
        .fetch_one(pool)
        .await?;

        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT notification_type, COUNT(*)
            FROM notifications
            WHERE created_at >= $1
            GROUP BY notification_type
            "#,
        )
        .bind(since)
        .fetch_all(pool)
        .await?;

        let by_type: HashMap<String, i64> = rows.into_iter().collect();

        Ok(NotificationMetrics {
            window_hours,
            total_created,
            total_read,
            total_unread: total_created - total_read,
            total_expired,
            by_type,
            read_rate_percentage: read_rate_percentage(total_read, total_created),
        })
    }
}

/// Percentage of created notifications that were read, 0 for an empty window.
pub fn read_rate_percentage(total_read: i64, total_created: i64) -> f64 {
    if total_created == 0 {
        return 0.0;
    }
    (total_read as f64 / total_created as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rate_zero_created() {
        assert_eq!(read_rate_percentage(0, 0), 0.0);
    }

    #[test]
    fn test_read_rate_half() {
        assert_eq!(read_rate_percentage(5, 10), 50.0);
    }

    #[test]
    fn test_read_rate_all_read() {
        assert_eq!(read_rate_percentage(7, 7), 100.0);
    }

    #[test]
    fn test_read_rate_within_bounds() {
        for (read, created) in [(0i64, 1i64), (1, 3), (2, 3), (999, 1000)] {
            let rate = read_rate_percentage(read, created);
            assert!((0.0..=100.0).contains(&rate), "rate {} out of bounds", rate);
        }
    }
}
