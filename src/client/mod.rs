//! Typed HTTP client for the book poll API, plus a status poller.
//!
//! [`VotingClient`] wraps the REST endpoints with the same request/response
//! types the handlers serialize. [`StatusPoller`] re-fetches the voting
//! status (and, while results are visible, the aggregate counts) on a fixed
//! interval and emits snapshots on a channel, approximating real-time
//! updates without a push channel.

mod http;
mod poller;

pub use http::*;
pub use poller::*;

use thiserror::Error;

use crate::api::ErrorCode;

/// Errors that can occur when talking to a bookvote server.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server rejected the request with a structured error envelope
    #[error("server error ({status}) {code}: {message}")]
    Api {
        status: u16,
        code: ErrorCode,
        message: String,
    },

    /// Server returned a non-success status without a decodable envelope
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Call requires a token but none is set
    #[error("authentication required")]
    AuthRequired,

    /// Invalid base URL
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse a server response body
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Server is offline or unreachable
    #[error("server unreachable: {0}")]
    Unreachable(String),
}

impl ClientError {
    /// Structured code from the server, when one was decoded.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The voter already has a vote on record.
    pub fn is_already_voted(&self) -> bool {
        self.code() == Some(ErrorCode::AlreadyVoted)
    }

    /// Voting is not currently active.
    pub fn is_voting_closed(&self) -> bool {
        self.code() == Some(ErrorCode::VotingClosed)
    }

    /// The caller should re-authenticate before retrying.
    pub fn needs_reauth(&self) -> bool {
        matches!(self, ClientError::AuthRequired)
            || matches!(
                self.code(),
                Some(
                    ErrorCode::Unauthorized
                        | ErrorCode::TokenExpired
                        | ErrorCode::InvalidCredentials
                )
            )
    }
}

/// Result type for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;
