//! Admin directory — lookup of administrator user ids.
//!
//! The escalation notifier and the retention cleaner fan their summaries out
//! to everyone holding the administrator role.

use sqlx::PgPool;
use uuid::Uuid;

use certhub_common::error::AppError;

pub struct AdminDirectory;

impl AdminDirectory {
    /// All user ids holding the administrator role.
    pub async fn admin_ids(pool: &PgPool) -> Result<Vec<Uuid>, AppError> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE role = 'admin'")
            .fetch_all(pool)
            .await?;

        Ok(ids)
    }
}
