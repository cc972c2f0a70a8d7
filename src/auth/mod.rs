//! Authentication and authorization for the book poll.
//!
//! Credentials are username/password pairs exchanged at login for signed
//! bearer tokens (JWT). Router middleware validates the token on every
//! privileged call and threads the resulting context to handlers.
//!
//! # Authorization Model
//!
//! Two levels only:
//! - any authenticated account may read status/results and cast its one vote
//! - `admin` accounts may additionally toggle the voting status
//!
//! `admin` is a boolean claim on the account, set by the operator CLI and
//! never by registration.
//!
//! # Rate Limiting
//!
//! Per-account fixed-window limiting, configured via `RATE_LIMIT_PER_MINUTE`
//! (0 disables).

mod jwt;
mod middleware;
mod password;

pub use jwt::*;
pub use middleware::*;
pub use password::*;

use crate::domain::UserId;

/// Authentication context extracted from a validated token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Account the token was issued to
    pub user_id: UserId,

    /// Username at issue time (display only; the id is the identity)
    pub username: String,

    /// Admin claim on the account
    pub admin: bool,
}

impl AuthContext {
    /// Check if this context allows admin operations
    pub fn is_admin(&self) -> bool {
        self.admin
    }
}

/// Authentication error
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing authentication")]
    MissingAuth,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    TokenExpired,

    #[error("insufficient permissions")]
    InsufficientPermissions,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}
