//! Authentication and authorization utilities
//!
//! - [`password`]: Argon2id password hashing and verification
//! - [`jwt`]: access token issuing and validation
//! - [`session`]: requester resolution, the `SessionIdentity` capability and
//!   the `require_user` guard
//! - [`authorization`]: task ownership checks

pub mod authorization;
pub mod jwt;
pub mod password;
pub mod session;
