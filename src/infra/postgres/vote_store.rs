//! PostgreSQL vote ledger.
//!
//! The ledger is append-only. Casting runs in one transaction:
//!
//! 1. Read the voting-status singleton; a missing or inactive row rejects
//!    the vote with `VotingClosed` before any duplicate check.
//! 2. `INSERT .. ON CONFLICT (user_id) DO NOTHING RETURNING ..`; no row back
//!    means the unique constraint held and the user has already voted.
//!
//! The unique constraint collapses concurrent duplicates from the same user
//! to exactly one ledger row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPool, FromRow};
use uuid::Uuid;

use crate::domain::{BookTitle, UserId, Vote, VoteRecord};
use crate::infra::{Result, VoteStore, VotingError};

/// PostgreSQL-backed vote ledger.
pub struct PgVoteStore {
    pool: PgPool,
}

impl PgVoteStore {
    /// Create a new ledger on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteStore for PgVoteStore {
    #[tracing::instrument(skip(self), fields(user_id = %user_id, book = %book))]
    async fn cast_vote(&self, user_id: UserId, book: &BookTitle) -> Result<Vote> {
        let mut tx = self.pool.begin().await?;

        let active = sqlx::query_as::<_, (bool,)>(
            "SELECT is_active FROM voting_status WHERE singleton = TRUE",
        )
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| row.0)
        .unwrap_or(false);

        if !active {
            return Err(VotingError::VotingClosed);
        }

        let row = sqlx::query_as::<_, VoteRow>(
            r#"
            INSERT INTO votes (user_id, book)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING id, user_id, book, created_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(book.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db) = e {
                if db.constraint() == Some("votes_user_id_fkey") {
                    return VotingError::UserNotFound(user_id);
                }
            }
            VotingError::Database(e)
        })?;

        let Some(row) = row else {
            return Err(VotingError::AlreadyVoted(user_id));
        };

        tx.commit().await?;
        Ok(row.into())
    }

    async fn list_votes(&self) -> Result<Vec<VoteRecord>> {
        let rows = sqlx::query_as::<_, VoteRecordRow>(
            r#"
            SELECT v.id, v.user_id, u.username, v.book, v.created_at
            FROM votes v
            JOIN users u ON u.id = v.user_id
            ORDER BY v.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, FromRow)]
struct VoteRow {
    id: i64,
    user_id: Uuid,
    book: String,
    created_at: DateTime<Utc>,
}

impl From<VoteRow> for Vote {
    fn from(row: VoteRow) -> Self {
        Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            book: BookTitle::new(row.book),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct VoteRecordRow {
    id: i64,
    user_id: Uuid,
    username: String,
    book: String,
    created_at: DateTime<Utc>,
}

impl From<VoteRecordRow> for VoteRecord {
    fn from(row: VoteRecordRow) -> Self {
        Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            username: row.username,
            book: BookTitle::new(row.book),
            created_at: row.created_at,
        }
    }
}
