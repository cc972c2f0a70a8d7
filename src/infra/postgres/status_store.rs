//! PostgreSQL voting-status store.
//!
//! The status lives in a single-row table whose primary key only admits
//! TRUE. Partial updates run in one transaction: ensure the row exists,
//! then UPDATE with COALESCE so unspecified fields keep their stored
//! values instead of being clobbered.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPool, FromRow};

use crate::domain::{StatusUpdate, VotingStatus};
use crate::infra::{Result, StatusStore};

/// PostgreSQL-backed voting-status singleton.
pub struct PgStatusStore {
    pool: PgPool,
}

impl PgStatusStore {
    /// Create a new status store on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatusStore for PgStatusStore {
    async fn get_status(&self) -> Result<VotingStatus> {
        sqlx::query(
            "INSERT INTO voting_status (singleton) VALUES (TRUE) ON CONFLICT (singleton) DO NOTHING",
        )
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, StatusRow>(
            "SELECT is_active, display_results, last_updated FROM voting_status WHERE singleton = TRUE",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self))]
    async fn set_status(&self, update: StatusUpdate) -> Result<VotingStatus> {
        // An update that names no field is a read, not a write; it must not
        // advance last_updated.
        if update.is_empty() {
            return self.get_status().await;
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO voting_status (singleton) VALUES (TRUE) ON CONFLICT (singleton) DO NOTHING",
        )
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, StatusRow>(
            r#"
            UPDATE voting_status
            SET is_active = COALESCE($1, is_active),
                display_results = COALESCE($2, display_results),
                last_updated = now()
            WHERE singleton = TRUE
            RETURNING is_active, display_results, last_updated
            "#,
        )
        .bind(update.is_active)
        .bind(update.display_results)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }
}

#[derive(Debug, FromRow)]
struct StatusRow {
    is_active: bool,
    display_results: bool,
    last_updated: DateTime<Utc>,
}

impl From<StatusRow> for VotingStatus {
    fn from(row: StatusRow) -> Self {
        Self {
            is_active: row.is_active,
            display_results: row.display_results,
            last_updated: row.last_updated,
        }
    }
}
