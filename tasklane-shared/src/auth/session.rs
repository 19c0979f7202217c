//! Requester identity
//!
//! Every request is resolved to an [`AuthContext`] before it reaches a
//! handler: either `Anonymous` or an authenticated [`Session`]. Resolution
//! never fails the request on a bad token; it just yields `Anonymous`, and
//! the handler's explicit `require_user()` guard decides whether that is
//! acceptable.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use super::jwt::{self, Claims};
use crate::store::{StoreResult, TokenRevocations, UserRepository};

/// What the session layer needs to know about an account
pub trait SessionIdentity {
    /// Stable identifier written into session tokens
    fn session_id(&self) -> Uuid;

    /// Inactive identities cannot start or continue sessions
    fn is_active(&self) -> bool;
}

/// An authenticated requester
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// `jti` of the presented token
    pub token_id: Uuid,

    /// When the presented token stops being valid
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            token_id: claims.jti,
            expires_at: claims.expires_at(),
        }
    }
}

/// Who is making the current request
///
/// Inserted into request extensions by the API's auth layer. Extracting it
/// from a request that never went through that layer yields `Anonymous`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthContext {
    #[default]
    Anonymous,
    Authenticated(Session),
}

/// Guard failure: the operation needs an authenticated requester
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Authentication required")]
pub struct Unauthenticated;

impl AuthContext {
    /// Guard for operations that need a logged-in user
    pub fn require_user(&self) -> Result<&Session, Unauthenticated> {
        match self {
            AuthContext::Authenticated(session) => Ok(session),
            AuthContext::Anonymous => Err(Unauthenticated),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::Authenticated(session) => Some(session.user_id),
            AuthContext::Anonymous => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, AuthContext::Anonymous)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Resolves an `Authorization` header value to a requester
///
/// A missing header, a non-Bearer scheme, a bad signature, an expired or
/// revoked token, or a token for an unknown or inactive user all resolve to
/// `Anonymous`. Only storage failures are returned as errors.
pub async fn resolve_bearer(
    authorization: Option<&str>,
    secret: &str,
    users: &dyn UserRepository,
    revocations: &dyn TokenRevocations,
) -> StoreResult<AuthContext> {
    let Some(header) = authorization else {
        return Ok(AuthContext::Anonymous);
    };

    let Some(token) = header.strip_prefix("Bearer ") else {
        debug!("Authorization header is not a Bearer token");
        return Ok(AuthContext::Anonymous);
    };

    let claims = match jwt::validate_token(token.trim(), secret) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, "Rejected access token");
            return Ok(AuthContext::Anonymous);
        }
    };

    if revocations.is_token_revoked(claims.jti).await? {
        debug!(jti = %claims.jti, "Access token has been revoked");
        return Ok(AuthContext::Anonymous);
    }

    match users.find_user_by_id(claims.sub).await? {
        Some(user) if SessionIdentity::is_active(&user) => {
            Ok(AuthContext::Authenticated(Session::from_claims(&claims)))
        }
        Some(_) => {
            debug!(user_id = %claims.sub, "Token belongs to an inactive user");
            Ok(AuthContext::Anonymous)
        }
        None => {
            debug!(user_id = %claims.sub, "Token belongs to an unknown user");
            Ok(AuthContext::Anonymous)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::create_token;
    use crate::models::user::CreateUser;
    use crate::store::MemoryStore;
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    async fn user_token(store: &MemoryStore) -> (Uuid, Claims, String) {
        let user = store
            .insert_user(CreateUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "$argon2id$test".to_string(),
            })
            .await
            .unwrap();
        let claims = Claims::for_identity(&user, Duration::hours(1));
        let token = create_token(&claims, SECRET).unwrap();
        (user.id, claims, token)
    }

    #[test]
    fn test_require_user() {
        assert_eq!(AuthContext::Anonymous.require_user(), Err(Unauthenticated));
        assert!(AuthContext::default().is_anonymous());

        let session = Session {
            user_id: Uuid::new_v4(),
            token_id: Uuid::new_v4(),
            expires_at: Utc::now(),
        };
        let ctx = AuthContext::Authenticated(session.clone());
        assert_eq!(ctx.require_user(), Ok(&session));
        assert_eq!(ctx.user_id(), Some(session.user_id));
    }

    #[tokio::test]
    async fn test_resolve_valid_token() {
        let store = MemoryStore::new();
        let (user_id, claims, token) = user_token(&store).await;
        let header = format!("Bearer {}", token);

        let ctx = resolve_bearer(Some(header.as_str()), SECRET, &store, &store)
            .await
            .unwrap();

        let session = ctx.require_user().unwrap();
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.token_id, claims.jti);
    }

    #[tokio::test]
    async fn test_resolve_anonymous_cases() {
        let store = MemoryStore::new();
        let (_, claims, token) = user_token(&store).await;

        let missing = resolve_bearer(None, SECRET, &store, &store).await.unwrap();
        assert!(missing.is_anonymous());

        let basic = resolve_bearer(Some("Basic abc"), SECRET, &store, &store)
            .await
            .unwrap();
        assert!(basic.is_anonymous());

        let garbage = resolve_bearer(Some("Bearer nonsense"), SECRET, &store, &store)
            .await
            .unwrap();
        assert!(garbage.is_anonymous());

        let header = format!("Bearer {}", token);
        let wrong_secret = resolve_bearer(
            Some(header.as_str()),
            "some-other-secret-at-least-32-bytes-long",
            &store,
            &store,
        )
        .await
        .unwrap();
        assert!(wrong_secret.is_anonymous());

        store.revoke_token(claims.jti, claims.expires_at()).await.unwrap();
        let revoked = resolve_bearer(Some(header.as_str()), SECRET, &store, &store)
            .await
            .unwrap();
        assert!(revoked.is_anonymous());
    }

    #[tokio::test]
    async fn test_resolve_unknown_user() {
        let store = MemoryStore::new();

        struct Ghost(Uuid);
        impl SessionIdentity for Ghost {
            fn session_id(&self) -> Uuid {
                self.0
            }
            fn is_active(&self) -> bool {
                true
            }
        }

        let claims = Claims::for_identity(&Ghost(Uuid::new_v4()), Duration::hours(1));
        let header = format!("Bearer {}", create_token(&claims, SECRET).unwrap());

        let ctx = resolve_bearer(Some(header.as_str()), SECRET, &store, &store)
            .await
            .unwrap();
        assert!(ctx.is_anonymous());
    }
}
