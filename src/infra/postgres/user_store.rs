//! PostgreSQL account storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPool, FromRow};
use uuid::Uuid;

use crate::domain::{NewUser, User, UserId};
use crate::infra::{Result, UserStore, VotingError};

/// PostgreSQL-backed account store.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new account store on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[tracing::instrument(skip(self, user), fields(username = %user.username))]
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let id = UserId::new();

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, email, password_hash, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, is_admin, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &user))?;

        Ok(row.into())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, is_admin, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, is_admin, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    #[tracing::instrument(skip(self))]
    async fn set_admin(&self, username: &str, is_admin: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET is_admin = $2 WHERE username = $1")
            .bind(username)
            .bind(is_admin)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Map a unique-constraint violation to the offending field.
fn map_unique_violation(err: sqlx::Error, user: &NewUser) -> VotingError {
    if let sqlx::Error::Database(ref db) = err {
        match db.constraint() {
            Some("users_username_key") => {
                return VotingError::duplicate("username", user.username.clone())
            }
            Some("users_email_key") => return VotingError::duplicate("email", user.email.clone()),
            _ => {}
        }
    }
    VotingError::Database(err)
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}
