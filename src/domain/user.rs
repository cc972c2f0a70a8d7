//! User accounts.

use chrono::{DateTime, Utc};

use super::UserId;

/// A registered account.
///
/// `password_hash` is a bcrypt digest; the clear-text password never leaves
/// the registration and login handlers. API responses use their own DTOs, so
/// this type is not serialized.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an account. The caller hashes the password.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            is_admin: false,
        }
    }

    /// Mark the account as an admin. Registration never does this; only the
    /// operator CLI creates admin accounts.
    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}
