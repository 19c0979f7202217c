//! User model
//!
//! A user owns zero or more tasks. Users are created on registration and are
//! never deleted. The password is held only as an Argon2id PHC string and is
//! skipped when a user is serialized.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     username VARCHAR(80) NOT NULL UNIQUE,
//!     email VARCHAR(120) NOT NULL UNIQUE,
//!     password_hash VARCHAR(255) NOT NULL,
//!     is_active BOOLEAN NOT NULL DEFAULT TRUE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::session::SessionIdentity;

/// User account
#[derive(Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Unique login name (case-sensitive)
    pub username: String,

    /// Unique email address (stored lowercase)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Inactive users cannot log in or act on existing tokens
    pub is_active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

// Hand-written so the hash never reaches a log line through `{:?}`
impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl SessionIdentity for User {
    fn session_id(&self) -> Uuid {
        self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

/// Registration input as submitted by the client
#[derive(Clone, Deserialize, Validate)]
pub struct Registration {
    #[validate(length(
        min = 1,
        max = 80,
        message = "Username must be between 1 and 80 characters"
    ))]
    pub username: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 120, message = "Email must be at most 120 characters")
    )]
    pub email: String,

    #[validate(length(
        min = 8,
        message = "Password must be at least 8 characters"
    ))]
    pub password: String,
}

impl Registration {
    /// Trims surrounding whitespace and lowercases the email
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password: self.password,
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Row to insert for a new user
///
/// Carries the hash, never the plaintext password.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(username: &str, email: &str, password: &str) -> Registration {
        Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_registration_normalized() {
        let reg = registration("  alice ", " Alice@Example.COM ", " pass word ").normalized();
        assert_eq!(reg.username, "alice");
        assert_eq!(reg.email, "alice@example.com");
        // Passwords are taken verbatim
        assert_eq!(reg.password, " pass word ");
    }

    #[test]
    fn test_registration_validation() {
        assert!(registration("alice", "alice@example.com", "password1")
            .validate()
            .is_ok());
        assert!(registration("", "alice@example.com", "password1")
            .validate()
            .is_err());
        assert!(registration("alice", "not-an-email", "password1")
            .validate()
            .is_err());
        assert!(registration("alice", "alice@example.com", "short")
            .validate()
            .is_err());
        assert!(registration(&"a".repeat(81), "alice@example.com", "password1")
            .validate()
            .is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        assert!(!format!("{:?}", user).contains("argon2id"));

        let reg = registration("alice", "alice@example.com", "hunter22");
        assert!(!format!("{:?}", reg).contains("hunter22"));
    }

    #[test]
    fn test_user_serialization_skips_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_session_identity() {
        let user = User {
            id: Uuid::new_v4(),
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password_hash: String::new(),
            is_active: false,
            created_at: Utc::now(),
        };
        assert_eq!(user.session_id(), user.id);
        assert!(!SessionIdentity::is_active(&user));
    }
}
