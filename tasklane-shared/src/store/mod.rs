//! Persistence seam
//!
//! The account and lifecycle code never touches a database directly. It
//! talks to the repository traits below, which have two implementations:
//!
//! - [`postgres::PgStore`]: PostgreSQL via sqlx (production)
//! - [`memory::MemoryStore`]: in-process maps (development and tests)
//!
//! Every flag mutation is a single atomic step inside the repository, so two
//! concurrent toggles of the same task cannot lose an update.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    task::{CreateTask, Task, TaskInput},
    user::{CreateUser, User},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the offending column
    #[error("Unique constraint violated on {0}")]
    UniqueViolation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result alias for repository operations
pub type StoreResult<T> = Result<T, StoreError>;

/// User persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user; `UniqueViolation("username" | "email")` on conflict
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Exact, case-sensitive lookup
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
}

/// Task persistence
///
/// Mutators return `None` when the task no longer exists.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Flips `completed` in one atomic step
    async fn toggle_completed(&self, id: Uuid) -> StoreResult<Option<Task>>;

    async fn set_archived(&self, id: Uuid, archived: bool) -> StoreResult<Option<Task>>;

    /// Replaces title and description, leaving flags and timestamp alone
    async fn update_content(&self, id: Uuid, input: TaskInput) -> StoreResult<Option<Task>>;

    /// Returns true if a row was removed
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    /// All of one owner's tasks, newest first
    async fn list_tasks_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Task>>;
}

/// Revoked access tokens, keyed by the token's `jti`
#[async_trait]
pub trait TokenRevocations: Send + Sync {
    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()>;

    async fn is_token_revoked(&self, jti: Uuid) -> StoreResult<bool>;

    /// Drops entries whose token would have expired anyway; returns the count
    async fn purge_expired_revocations(&self) -> StoreResult<u64>;
}

/// Everything the application needs from storage
#[async_trait]
pub trait Store: UserRepository + TaskRepository + TokenRevocations {
    /// Cheap connectivity probe for health checks
    async fn ping(&self) -> StoreResult<()>;

    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    fn as_users(&self) -> &dyn UserRepository;

    fn as_tasks(&self) -> &dyn TaskRepository;

    fn as_revocations(&self) -> &dyn TokenRevocations;
}
