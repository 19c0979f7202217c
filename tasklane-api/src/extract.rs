//! Request extractors
//!
//! [`RequireUser`] runs the `require_user()` guard as an extractor. Listed
//! first in a handler's arguments, it rejects anonymous requests with `401`
//! before the path or body is looked at.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tasklane_shared::auth::session::{AuthContext, Session};

use crate::error::ApiError;

/// The requester's session; anonymous requests are rejected
#[derive(Debug, Clone)]
pub struct RequireUser(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or_default();
        let session = auth.require_user()?;
        Ok(RequireUser(session.clone()))
    }
}
