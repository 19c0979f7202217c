//! JWT access tokens
//!
//! Login issues one HS256-signed access token per session. Each token
//! carries a random `jti`, which is what logout revokes; the token itself is
//! otherwise stateless.
//!
//! # Claims
//!
//! - `sub`: user ID
//! - `iss`: always `"tasklane"`
//! - `iat` / `nbf` / `exp`: Unix timestamps
//! - `jti`: unique token ID

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::SessionIdentity;

/// Issuer written into and required from every token
pub const ISSUER: &str = "tasklane";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was issued by someone else
    #[error("Invalid issuer")]
    InvalidIssuer,
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "tasklane"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Token ID, used for revocation
    pub jti: Uuid,
}

impl Claims {
    /// Creates claims for an identity, valid for `ttl` from now
    pub fn for_identity(identity: &impl SessionIdentity, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: identity.session_id(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4(),
        }
    }

    /// Expiration as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a token string
///
/// The secret should be at least 32 random bytes.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates signature, issuer, `exp` and `nbf`, and returns the claims
///
/// Revocation is not checked here; see [`crate::store::TokenRevocations`].
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}
