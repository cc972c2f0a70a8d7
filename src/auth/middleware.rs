//! Authentication middleware for Axum
//!
//! Extracts the bearer token from requests and enforces authorization.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{AuthContext, AuthError, TokenSigner};

/// Validates bearer credentials on incoming requests.
pub struct Authenticator {
    signer: Arc<TokenSigner>,
}

impl Authenticator {
    pub fn new(signer: Arc<TokenSigner>) -> Self {
        Self { signer }
    }

    /// Authenticate a request from its Authorization header.
    pub fn authenticate(&self, auth_header: Option<&str>) -> Result<AuthContext, AuthError> {
        let header = auth_header.ok_or(AuthError::MissingAuth)?;

        if let Some(token) = header.strip_prefix("Bearer ") {
            return self.signer.validate(token.trim());
        }

        Err(AuthError::MissingAuth)
    }
}

/// Auth context extension for request
#[derive(Clone)]
pub struct AuthContextExt(pub AuthContext);

/// Authentication middleware configuration/state.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub authenticator: Arc<Authenticator>,
    /// Optional per-account rate limiter.
    pub rate_limiter: Option<Arc<RateLimiter>>,
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let context = match state.authenticator.authenticate(auth_header) {
        Ok(context) => context,
        Err(e) => return auth_error_response(e),
    };

    if let Some(ref limiter) = state.rate_limiter {
        let key = format!("user:{}", context.user_id);
        if let Err(e) = limiter.check(&key) {
            return auth_error_response(e);
        }
    }

    // Add auth context to request extensions
    request.extensions_mut().insert(AuthContextExt(context));
    next.run(request).await
}

/// Convert auth error to HTTP response
fn auth_error_response(error: AuthError) -> Response {
    crate::api::ApiError::from(error).into_response()
}

/// Rate limiter for API requests
pub struct RateLimiter {
    /// Requests per minute per key
    requests_per_minute: u32,
    /// In-memory fixed-window request counts
    counts: std::sync::RwLock<std::collections::HashMap<String, (u32, std::time::Instant)>>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            counts: std::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }

    /// Check if request is allowed
    pub fn check(&self, key: &str) -> Result<(), AuthError> {
        let mut counts = self.counts.write().unwrap();
        let now = std::time::Instant::now();

        let entry = counts.entry(key.to_string()).or_insert((0, now));

        // Reset counter if minute has passed
        if now.duration_since(entry.1).as_secs() >= 60 {
            *entry = (0, now);
        }

        if entry.0 >= self.requests_per_minute {
            return Err(AuthError::RateLimited);
        }

        entry.0 += 1;

        Ok(())
    }

    /// Get remaining requests for a key
    pub fn remaining(&self, key: &str) -> u32 {
        let counts = self.counts.read().unwrap();
        let now = std::time::Instant::now();

        match counts.get(key) {
            Some((count, started)) => {
                if now.duration_since(*started).as_secs() >= 60 {
                    self.requests_per_minute
                } else {
                    self.requests_per_minute.saturating_sub(*count)
                }
            }
            None => self.requests_per_minute,
        }
    }
}
