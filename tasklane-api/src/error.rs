//! Error handling for the API server
//!
//! Handlers return `ApiResult<T>`. Domain, guard and storage failures convert
//! into [`ApiError`] with `?`, and `ApiError` renders as a JSON body:
//!
//! ```json
//! { "error": "not_found", "message": "Task not found" }
//! ```
//!
//! Infrastructure failures are logged here and reach the client only as a
//! generic `internal_error`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tasklane_shared::{
    auth::{jwt::JwtError, password::PasswordError, session::Unauthenticated},
    error::{DomainError, FieldError},
    store::StoreError,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409), e.g. a taken username
    Conflict(String),

    /// Unprocessable entity (422)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl From<FieldError> for ValidationErrorDetail {
    fn from(err: FieldError) -> Self {
        Self {
            field: err.field,
            message: err.message,
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "not_found", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Per-field validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => match errors.len() {
                1 => write!(f, "Validation failed: 1 error"),
                n => write!(f, "Validation failed: {} errors", n),
            },
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(details) => {
                ApiError::ValidationError(details.into_iter().map(Into::into).collect())
            }
            DomainError::DuplicateIdentity => {
                ApiError::Conflict("Username or email already registered".to_string())
            }
            DomainError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid username or password".to_string())
            }
            // The id is already in the request path; keep messages generic
            DomainError::NotFound(_) => ApiError::NotFound("Task not found".to_string()),
            DomainError::Forbidden(_) => {
                ApiError::Forbidden("Not permitted to access this task".to_string())
            }
            DomainError::Store(err) => err.into(),
            DomainError::Password(err) => err.into(),
        }
    }
}

impl From<Unauthenticated> for ApiError {
    fn from(_: Unauthenticated) -> Self {
        ApiError::Unauthorized("Authentication required".to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::InternalError(format!("Storage error: {}", err))
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Token issuance failures; validation failures never reach a handler
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::InternalError(format!("Token error: {}", err))
    }
}
