//! Password hashing module using Argon2id
//!
//! Credentials are stored as PHC strings
//! (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so the parameters a hash
//! was produced with travel with it and verification never needs the
//! current [`PasswordParams`].
//!
//! # Security
//!
//! - **Algorithm**: Argon2id
//! - **Memory**: 64 MB by default
//! - **Iterations**: 3 passes by default
//! - **Parallelism**: 4 lanes by default
//! - **Salt**: 16 random bytes from the OS RNG, fresh per hash
//! - **Output**: 32-byte hash
//!
//! Hashing is CPU-bound for hundreds of milliseconds at the default costs.
//! Async callers use [`hash_off_runtime`] and [`verify_off_runtime`], which
//! run the work on tokio's blocking pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use serde::{Deserialize, Serialize};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),

    /// The blocking task running the hash panicked or was cancelled
    #[error("Password task failed: {0}")]
    TaskFailed(String),
}

/// Argon2id cost parameters used for new hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordParams {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536, // 64 MB
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl PasswordParams {
    /// Minimal costs for test suites; never use for stored credentials
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Hashes a password using Argon2id
///
/// # Errors
///
/// Returns `PasswordError::HashError` if the parameters are out of range or
/// hashing fails.
pub fn hash_password(password: &str, params: &PasswordParams) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let argon_params = ParamsBuilder::new()
        .m_cost(params.memory_kib)
        .t_cost(params.iterations)
        .p_cost(params.parallelism)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, argon_params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored PHC hash
///
/// Comparison is constant-time. Returns `Ok(false)` for a wrong password and
/// an error only when the stored hash itself is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    // Parameters come from the PHC string
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// [`hash_password`] on the blocking pool
pub async fn hash_off_runtime(
    password: String,
    params: PasswordParams,
) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password, &params))
        .await
        .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
}

/// [`verify_password`] on the blocking pool
pub async fn verify_off_runtime(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> PasswordParams {
        PasswordParams::insecure_fast()
    }

    #[test]
    fn test_hash_password_default_params() {
        let hash = hash_password("test_password_123", &PasswordParams::default())
            .expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_password_embeds_custom_params() {
        let hash = hash_password("pw", &fast()).expect("Hash should succeed");
        assert!(hash.contains("m=1024"));
        assert!(hash.contains("t=1"));
        assert!(hash.contains("p=1"));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = hash_password("same_password", &fast()).expect("Hash 1 should succeed");
        let hash2 = hash_password("same_password", &fast()).expect("Hash 2 should succeed");

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_hash_does_not_contain_plaintext() {
        let hash = hash_password("plaintext-marker", &fast()).unwrap();
        assert!(!hash.contains("plaintext-marker"));
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct_password", &fast()).expect("Hash should succeed");

        assert!(verify_password("correct_password", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_is_independent_of_current_params() {
        let hash = hash_password("pw-123456", &fast()).unwrap();
        // Verification reads m/t/p from the hash, not from defaults
        assert!(verify_password("pw-123456", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(matches!(
            verify_password("password", "invalid_hash"),
            Err(PasswordError::InvalidHash(_))
        ));
        assert!(verify_password("password", "$argon2id$invalid").is_err());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = PasswordParams {
            memory_kib: 1,
            iterations: 0,
            parallelism: 0,
        };
        assert!(matches!(
            hash_password("pw", &params),
            Err(PasswordError::HashError(_))
        ));
    }

    #[tokio::test]
    async fn test_off_runtime_variants() {
        let hash = hash_off_runtime("pw-123456".to_string(), fast()).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(verify_off_runtime("pw-123456".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_off_runtime("pw-654321".to_string(), hash).await.unwrap());
        assert!(matches!(
            verify_off_runtime("pw".to_string(), "invalid_hash".to_string()).await,
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_unicode_roundtrip() {
        for password in ["with spaces", "unicode-密码-パスワード", "!@#$%^&*()"] {
            let hash = hash_password(password, &fast()).unwrap();
            assert!(verify_password(password, &hash).unwrap(), "{}", password);
        }
    }
}
