//! Structured API error responses with error codes
//!
//! Every endpoint fails through this module so clients see one envelope:
//! a machine-readable code, a numeric code, and a human-readable message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::infra::VotingError;

// ============================================================================
// Error Codes
// ============================================================================

/// Error codes for API responses
///
/// These codes are stable and can be used by clients for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication errors (1xxx)
    /// Missing or invalid credentials
    Unauthorized,
    /// Token has expired
    TokenExpired,
    /// Authenticated but not allowed to perform this operation
    Forbidden,
    /// Username/password pair did not match an account
    InvalidCredentials,

    // Rate limiting errors (2xxx)
    /// Too many requests, rate limit exceeded
    RateLimited,

    // Validation errors (3xxx)
    /// Request body is malformed or a field value is invalid
    ValidationError,
    /// Submitted book title is not on the ballot
    UnknownOption,

    // Resource errors (4xxx)
    /// Requested resource not found
    NotFound,

    // Conflict errors (5xxx)
    /// Username or email already registered
    DuplicateUser,
    /// The voter already has a vote on record
    AlreadyVoted,

    // State errors (7xxx)
    /// Voting is not currently active
    VotingClosed,

    // Infrastructure errors (8xxx)
    /// Internal server error
    InternalError,
    /// A dependency (the database) is unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn numeric_code(&self) -> u32 {
        match self {
            // Auth (1xxx)
            ErrorCode::Unauthorized => 1001,
            ErrorCode::TokenExpired => 1002,
            ErrorCode::Forbidden => 1003,
            ErrorCode::InvalidCredentials => 1004,

            // Rate limiting (2xxx)
            ErrorCode::RateLimited => 2001,

            // Validation (3xxx)
            ErrorCode::ValidationError => 3001,
            ErrorCode::UnknownOption => 3002,

            // Resource (4xxx)
            ErrorCode::NotFound => 4001,

            // Conflict (5xxx)
            ErrorCode::DuplicateUser => 5001,
            ErrorCode::AlreadyVoted => 5002,

            // State (7xxx)
            ErrorCode::VotingClosed => 7001,

            // Infrastructure (8xxx)
            ErrorCode::InternalError => 8001,
            ErrorCode::ServiceUnavailable => 8002,
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Auth errors -> 401/403
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::TokenExpired => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,

            // Rate limiting -> 429
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,

            // Validation -> 400
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::UnknownOption => StatusCode::BAD_REQUEST,

            // Resource -> 404
            ErrorCode::NotFound => StatusCode::NOT_FOUND,

            // Conflict -> 409
            ErrorCode::DuplicateUser => StatusCode::CONFLICT,
            ErrorCode::AlreadyVoted => StatusCode::CONFLICT,

            // State -> 403
            ErrorCode::VotingClosed => StatusCode::FORBIDDEN,

            // Infrastructure -> 500/503
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code_str = match self {
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::TokenExpired => "TOKEN_EXPIRED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::UnknownOption => "UNKNOWN_OPTION",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::DuplicateUser => "DUPLICATE_USER",
            ErrorCode::AlreadyVoted => "ALREADY_VOTED",
            ErrorCode::VotingClosed => "VOTING_CLOSED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        };
        write!(f, "{}", code_str)
    }
}

// ============================================================================
// Structured Error Response
// ============================================================================

/// Structured error response for API endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error details
    pub error: ErrorDetails,
}

/// Detailed error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Numeric error code for easy categorization
    pub numeric_code: u32,

    /// Human-readable error message
    pub message: String,

    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Retry information for rate limiting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,

    /// Related resource ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                code,
                numeric_code: code.numeric_code(),
                message: message.into(),
                details: None,
                retry_after: None,
                resource_id: None,
            },
        }
    }

    /// Set additional details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }

    /// Set retry-after seconds (for rate limiting)
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.error.retry_after = Some(seconds);
        self
    }

    /// Set related resource ID
    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.error.resource_id = Some(id.into());
        self
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.error.code.http_status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code_str = self.error.code.to_string();
        let mut response = (status, Json(self)).into_response();

        // Add error code header for easier debugging
        if let Ok(code_value) = axum::http::HeaderValue::from_str(&code_str) {
            response.headers_mut().insert(
                axum::http::header::HeaderName::from_static("x-error-code"),
                code_value,
            );
        }

        response
    }
}

// ============================================================================
// Conversions from domain errors
// ============================================================================

impl From<VotingError> for ApiError {
    fn from(err: VotingError) -> Self {
        match err {
            VotingError::Database(e) => {
                ApiError::new(ErrorCode::InternalError, format!("Database error: {}", e))
            }
            VotingError::AlreadyVoted(user_id) => {
                ApiError::new(ErrorCode::AlreadyVoted, "You have already voted")
                    .with_resource_id(user_id.to_string())
            }
            VotingError::VotingClosed => {
                ApiError::new(ErrorCode::VotingClosed, "Voting is not currently active")
            }
            VotingError::UnknownOption { title } => ApiError::new(
                ErrorCode::UnknownOption,
                format!("Not on the ballot: {}", title),
            )
            .with_details(serde_json::json!({ "book": title })),
            VotingError::InvalidCredentials => ApiError::new(
                ErrorCode::InvalidCredentials,
                "Invalid username or password",
            ),
            VotingError::UserNotFound(user_id) => {
                ApiError::new(ErrorCode::NotFound, format!("User not found: {}", user_id))
                    .with_resource_id(user_id.to_string())
            }
            VotingError::DuplicateUser { field, value } => ApiError::new(
                ErrorCode::DuplicateUser,
                format!("{} already registered: {}", field, value),
            )
            .with_details(serde_json::json!({ "field": field })),
            VotingError::Validation(msg) => ApiError::new(ErrorCode::ValidationError, msg),
            VotingError::Configuration(msg) => {
                ApiError::new(ErrorCode::InternalError, format!("Configuration error: {}", msg))
            }
            VotingError::Internal(msg) => ApiError::new(ErrorCode::InternalError, msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuth => {
                ApiError::new(ErrorCode::Unauthorized, "Missing authentication")
            }
            AuthError::InvalidToken(msg) => {
                ApiError::new(ErrorCode::Unauthorized, format!("Invalid token: {}", msg))
            }
            AuthError::TokenExpired => {
                ApiError::new(ErrorCode::TokenExpired, "Token has expired")
            }
            AuthError::InsufficientPermissions => {
                ApiError::new(ErrorCode::Forbidden, "Admin privileges required")
            }
            AuthError::RateLimited => {
                ApiError::new(ErrorCode::RateLimited, "Rate limit exceeded").with_retry_after(60)
            }
            AuthError::PasswordHash(_) => {
                ApiError::new(ErrorCode::InternalError, "Password hashing failed")
            }
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Create a validation error with field details
pub fn validation_error(field: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(ErrorCode::ValidationError, message.into())
        .with_details(serde_json::json!({ "field": field }))
}

/// Create a forbidden error
pub fn forbidden(message: impl Into<String>) -> ApiError {
    ApiError::new(ErrorCode::Forbidden, message.into())
}

// ============================================================================
// Tests
// ============================================================================
