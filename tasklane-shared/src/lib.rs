//! # Tasklane Shared Library
//!
//! Domain types, persistence and session handling used by the Tasklane API
//! server.
//!
//! ## Module Organization
//!
//! - `models`: Users, tasks and their input types
//! - `store`: Repository traits with PostgreSQL and in-memory backends
//! - `db`: Connection pool and migrations
//! - `auth`: Password hashing, access tokens, sessions and ownership checks
//! - `accounts`: Registration and credential verification
//! - `lifecycle`: Task creation, transitions and per-owner views
//! - `error`: Domain error taxonomy

pub mod accounts;
pub mod auth;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod store;

/// Current version of the Tasklane shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
