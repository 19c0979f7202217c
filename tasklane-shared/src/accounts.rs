//! Account store operations
//!
//! Registration and credential checks. Plaintext passwords only ever exist
//! inside these two functions and the blocking tasks they hand hashing to.

use tracing::{debug, info};
use validator::Validate;

use crate::auth::password::{self, PasswordParams};
use crate::auth::session::SessionIdentity;
use crate::error::{DomainError, DomainResult};
use crate::models::user::{CreateUser, Registration, User};
use crate::store::{StoreError, UserRepository};

/// Registers a new account
///
/// Input is trimmed (and the email lowercased) before validation.
///
/// # Errors
///
/// - `Validation` for a malformed username, email or short password
/// - `DuplicateIdentity` if the username or email is taken
pub async fn register(
    users: &dyn UserRepository,
    params: &PasswordParams,
    registration: Registration,
) -> DomainResult<User> {
    let registration = registration.normalized();
    registration.validate()?;

    let password_hash = password::hash_off_runtime(registration.password, *params).await?;

    let user = users
        .insert_user(CreateUser {
            username: registration.username,
            email: registration.email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(field) => {
                debug!(field = %field, "Registration rejected: identity already taken");
                DomainError::DuplicateIdentity
            }
            other => DomainError::Store(other),
        })?;

    info!(user_id = %user.id, username = %user.username, "Registered user");
    Ok(user)
}

/// Checks a username/password pair
///
/// Unknown username, wrong password and inactive account all produce the
/// same `InvalidCredentials`. An unknown username still pays for one Argon2
/// run at `params`, so response time does not reveal which usernames exist.
pub async fn verify_credentials(
    users: &dyn UserRepository,
    params: &PasswordParams,
    username: &str,
    password: &str,
) -> DomainResult<User> {
    let Some(user) = users.find_user_by_username(username).await? else {
        password::hash_off_runtime(password.to_string(), *params).await?;
        debug!("Login failed: unknown username");
        return Err(DomainError::InvalidCredentials);
    };

    let matches =
        password::verify_off_runtime(password.to_string(), user.password_hash.clone()).await?;
    if !matches {
        debug!(user_id = %user.id, "Login failed: wrong password");
        return Err(DomainError::InvalidCredentials);
    }

    if !SessionIdentity::is_active(&user) {
        debug!(user_id = %user.id, "Login failed: account inactive");
        return Err(DomainError::InvalidCredentials);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn params() -> PasswordParams {
        PasswordParams::insecure_fast()
    }

    fn registration(username: &str, email: &str, password: &str) -> Registration {
        Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_verify() {
        let store = MemoryStore::new();

        let user = register(
            &store,
            &params(),
            registration("alice", "alice@example.com", "correct horse"),
        )
        .await
        .unwrap();
        assert_eq!(user.username, "alice");
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert!(!user.password_hash.contains("correct horse"));

        let verified = verify_credentials(&store, &params(), "alice", "correct horse")
            .await
            .unwrap();
        assert_eq!(verified.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let store = MemoryStore::new();
        register(&store, &params(), registration("alice", "a@example.com", "password1"))
            .await
            .unwrap();

        let err = register(&store, &params(), registration("alice", "b@example.com", "password2"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateIdentity));
    }

    #[tokio::test]
    async fn test_duplicate_email_ignores_case() {
        let store = MemoryStore::new();
        register(&store, &params(), registration("alice", "a@example.com", "password1"))
            .await
            .unwrap();

        let err = register(&store, &params(), registration("bob", "A@Example.com", "password2"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateIdentity));
    }

    #[tokio::test]
    async fn test_username_is_case_sensitive() {
        let store = MemoryStore::new();
        register(&store, &params(), registration("alice", "a@example.com", "password1"))
            .await
            .unwrap();

        assert!(
            register(&store, &params(), registration("Alice", "b@example.com", "password1"))
                .await
                .is_ok()
        );
        assert!(matches!(
            verify_credentials(&store, &params(), "ALICE", "password1").await,
            Err(DomainError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let store = MemoryStore::new();

        let err = register(&store, &params(), registration("   ", "a@example.com", "password1"))
            .await
            .unwrap_err();
        match err {
            DomainError::Validation(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "username");
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        assert!(matches!(
            register(&store, &params(), registration("bob", "nope", "password1")).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            register(&store, &params(), registration("bob", "b@example.com", "short")).await,
            Err(DomainError::Validation(_))
        ));

        // Nothing was stored by the failed attempts
        assert!(store.find_user_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_credentials_indistinguishable() {
        let store = MemoryStore::new();
        register(&store, &params(), registration("alice", "a@example.com", "password1"))
            .await
            .unwrap();

        let unknown = verify_credentials(&store, &params(), "mallory", "password1")
            .await
            .unwrap_err();
        let wrong = verify_credentials(&store, &params(), "alice", "password2")
            .await
            .unwrap_err();

        assert!(matches!(unknown, DomainError::InvalidCredentials));
        assert!(matches!(wrong, DomainError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_unknown_username_costs_as_much_as_wrong_password() {
        let store = MemoryStore::new();
        let params = PasswordParams::default();
        register(&store, &params, registration("alice", "a@example.com", "password1"))
            .await
            .unwrap();

        let mut unknown = Duration::MAX;
        let mut wrong = Duration::MAX;
        for _ in 0..3 {
            let start = Instant::now();
            let result = verify_credentials(&store, &params, "mallory", "password1").await;
            unknown = unknown.min(start.elapsed());
            assert!(matches!(result, Err(DomainError::InvalidCredentials)));

            let start = Instant::now();
            let result = verify_credentials(&store, &params, "alice", "password2").await;
            wrong = wrong.min(start.elapsed());
            assert!(matches!(result, Err(DomainError::InvalidCredentials)));
        }

        assert!(
            unknown * 4 > wrong && wrong * 4 > unknown,
            "unknown user {:?}, wrong password {:?}",
            unknown,
            wrong
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_hashing_does_not_block_the_runtime() {
        let store = MemoryStore::new();
        let ticks = Arc::new(AtomicUsize::new(0));

        let ticker = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    ticks.fetch_add(1, Ordering::Relaxed);
                    tokio::task::yield_now().await;
                }
            })
        };

        // On a single-threaded runtime the ticker only runs if hashing yields
        register(
            &store,
            &PasswordParams::default(),
            registration("alice", "a@example.com", "password1"),
        )
        .await
        .unwrap();
        let during_register = ticks.load(Ordering::Relaxed);

        verify_credentials(&store, &PasswordParams::default(), "alice", "password1")
            .await
            .unwrap();
        let during_verify = ticks.load(Ordering::Relaxed);
        ticker.abort();

        assert!(during_register > 0);
        assert!(during_verify > during_register);
    }
}
