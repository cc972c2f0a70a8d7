//! JWT issuance and validation.
//!
//! Bearer tokens carry the account id, username, and admin claim. Access and
//! refresh tokens share the signing key but differ in the `token_type`
//! claim, so a refresh token cannot authorize API calls.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{User, UserId};

use super::{AuthContext, AuthError};

/// Token kind claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims for the voting API
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// JWT ID
    pub jti: String,

    /// Username at issue time
    #[serde(default)]
    pub name: String,

    /// Admin claim
    #[serde(default)]
    pub admin: bool,

    /// Access or refresh
    pub token_type: TokenType,
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// Issues and validates bearer tokens.
pub struct TokenSigner {
    /// Secret key for signing/verifying
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,

    /// Issuer string
    issuer: String,

    /// Audience string
    audience: String,

    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenSigner {
    /// Create a new signer with a shared secret.
    pub fn new(
        secret: &[u8],
        issuer: &str,
        audience: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue an access/refresh pair for an account.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            token: self.issue(user, TokenType::Access, self.access_ttl)?,
            refresh_token: self.issue(user, TokenType::Refresh, self.refresh_ttl)?,
        })
    }

    fn issue(&self, user: &User, token_type: TokenType, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + ttl;

        let claims = Claims {
            sub: user.id.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            name: user.username.clone(),
            admin: user.is_admin,
            token_type,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Validate an access token and return the auth context.
    pub fn validate(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = self.decode(token)?;

        if claims.token_type != TokenType::Access {
            return Err(AuthError::InvalidToken("not an access token".to_string()));
        }

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidToken("invalid subject".to_string()))?;

        Ok(AuthContext {
            user_id: UserId::from_uuid(user_id),
            username: claims.name,
            admin: claims.admin,
        })
    }

    /// Validate a refresh token and return the account id it was issued to.
    ///
    /// Callers must re-read the account before issuing a new pair; a deleted
    /// account cannot refresh, and a changed admin flag takes effect here.
    pub fn validate_refresh(&self, token: &str) -> Result<UserId, AuthError> {
        let claims = self.decode(token)?;

        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::InvalidToken("not a refresh token".to_string()));
        }

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidToken("invalid subject".to_string()))?;

        Ok(UserId::from_uuid(user_id))
    }

    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        Ok(token_data.claims)
    }
}
