//! Domain error taxonomy
//!
//! Every account and task operation returns [`DomainError`] on failure. The
//! first five variants are caller-recoverable outcomes that the API layer
//! surfaces directly; `Store` and `Password` are infrastructure failures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// Result alias for account and task operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Error returned by account and task operations
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Input had the wrong shape (empty title, malformed email, ...)
    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<FieldError>),

    /// Username or email is already registered
    #[error("Username or email already registered")]
    DuplicateIdentity,

    /// Unknown username or wrong password; the two are not distinguished
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// No task with this id exists
    #[error("Task {0} not found")]
    NotFound(Uuid),

    /// The requester does not own this task
    #[error("Not permitted to access task {0}")]
    Forbidden(Uuid),

    /// Persistence layer failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Password hashing failure
    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Human-readable message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        // HashMap iteration order is arbitrary
        details.sort_by(|a, b| a.field.cmp(&b.field));

        DomainError::Validation(details)
    }
}
