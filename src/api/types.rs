//! Shared request and response types for REST API handlers.
//!
//! The same types serve both sides of the wire: handlers serialize them,
//! [`crate::client::VotingClient`] deserializes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::TokenPair;
use crate::domain::{BookTitle, User, UserId, Vote, VoteRecord};
use crate::tally::OptionCount;

// ============================================================================
// Account types
// ============================================================================

/// Request body for account registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Request body for login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for login and token refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub is_admin: bool,
}

impl LoginResponse {
    pub fn new(pair: TokenPair, is_admin: bool) -> Self {
        Self {
            token: pair.token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            is_admin,
        }
    }
}

/// Request body for token refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

// ============================================================================
// Voting types
// ============================================================================

/// Request body for casting a vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastVoteRequest {
    pub book: BookTitle,
}

/// A vote as shown to clients: voter by username, not by internal id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteView {
    pub id: i64,
    pub username: String,
    pub book: BookTitle,
    pub created_at: DateTime<Utc>,
}

impl VoteView {
    /// View of a freshly cast vote; the caller supplies the voter's username
    /// from the authenticated context.
    pub fn from_cast(vote: Vote, username: String) -> Self {
        Self {
            id: vote.id,
            username,
            book: vote.book,
            created_at: vote.created_at,
        }
    }
}

impl From<VoteRecord> for VoteView {
    fn from(record: VoteRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            book: record.book,
            created_at: record.created_at,
        }
    }
}

/// Response for the combined ledger-and-counts read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotesResponse {
    pub votes: Vec<VoteView>,
    pub vote_counts: Vec<OptionCount>,
}

// ============================================================================
// Service types
// ============================================================================

/// Response for the liveness probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}
