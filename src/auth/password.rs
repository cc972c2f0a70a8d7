//! Password hashing.

use super::AuthError;

/// Hash a clear-text password with bcrypt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a clear-text password against a stored bcrypt digest.
///
/// A malformed digest verifies as false rather than erroring, so account
/// lookup failure and hash mismatch stay indistinguishable to callers.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
