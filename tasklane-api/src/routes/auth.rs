//! Account endpoints
//!
//! - `POST /register` - Create an account
//! - `POST /login` - Exchange credentials for an access token
//! - `POST /logout` - Revoke the presented access token

use crate::{app::AppState, error::ApiResult, extract::RequireUser};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasklane_shared::{
    accounts,
    auth::jwt::{self, Claims},
    models::user::{Registration, User},
};
use tracing::info;

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username, matched exactly
    pub username: String,

    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header
    pub access_token: String,

    /// Always "Bearer"
    pub token_type: String,

    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,

    /// The authenticated account
    pub user: User,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "correct horse"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the new user (no password hash).
///
/// # Errors
///
/// - `409 Conflict`: Username or email already registered
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<Registration>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = accounts::register(
        state.store.as_users(),
        &state.config.password_params(),
        req,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/json
///
/// { "username": "alice", "password": "correct horse" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "token_type": "Bearer",
///   "expires_at": "2026-01-02T00:00:00Z",
///   "user": { "id": "uuid", "username": "alice", ... }
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid username or password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = accounts::verify_credentials(
        state.store.as_users(),
        &state.config.password_params(),
        &req.username,
        &req.password,
    )
    .await?;

    let claims = Claims::for_identity(&user, state.config.token_ttl());
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_at: claims.expires_at(),
        user,
    }))
}

/// Logout endpoint
///
/// Revokes the token used for this request. Other tokens issued to the same
/// user stay valid until they expire.
///
/// # Errors
///
/// - `401 Unauthorized`: No valid session
pub async fn logout(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
) -> ApiResult<StatusCode> {
    state
        .store
        .as_revocations()
        .revoke_token(session.token_id, session.expires_at)
        .await?;

    info!(user_id = %session.user_id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}
