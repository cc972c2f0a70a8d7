//! Error types for the store layer.

use thiserror::Error;

use crate::domain::UserId;

/// Errors that can occur in the poll's store layer.
#[derive(Error, Debug)]
pub enum VotingError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Second vote by the same user
    #[error("user {0} has already voted")]
    AlreadyVoted(UserId),

    /// Vote submitted while voting is inactive
    #[error("voting is currently closed")]
    VotingClosed,

    /// Title not on the ballot
    #[error("unknown ballot option: {title}")]
    UnknownOption { title: String },

    /// Bad username/password at login
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User lookup failure
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// Username or email already registered
    #[error("duplicate {field}: {value}")]
    DuplicateUser { field: String, value: String },

    /// Malformed or unacceptable registration input
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl VotingError {
    /// Duplicate-user error for a named column.
    pub fn duplicate(field: &str, value: impl Into<String>) -> Self {
        Self::DuplicateUser {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Validation error from any displayable message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, VotingError>;
