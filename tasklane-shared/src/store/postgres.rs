//! PostgreSQL store
//!
//! Runtime-checked queries against the schema in `migrations/`. Flag changes
//! are single `UPDATE ... RETURNING` statements, so PostgreSQL's row lock
//! serializes concurrent writers to the same task.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, TaskRepository, TokenRevocations, UserRepository};
use crate::models::{
    task::{CreateTask, Task, TaskInput},
    user::{CreateUser, User},
};

const USER_COLUMNS: &str = "id, username, email, password_hash, is_active, created_at";

const TASK_COLUMNS: &str = "id, owner_id, title, description, completed, archived, created_at";

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Store backed by a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a unique-constraint failure to the column it guards
fn map_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let column = match db_err.constraint() {
                Some(c) if c.contains("username") => "username",
                Some(c) if c.contains("email") => "email",
                Some(c) => c,
                None => "unknown",
            };
            return StoreError::UniqueViolation(column.to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        let query = format!(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.username)
            .bind(data.email)
            .bind(data.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        let query = format!(
            "INSERT INTO tasks (owner_id, title, description) VALUES ($1, $2, $3) RETURNING {}",
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(data.owner_id)
            .bind(data.title)
            .bind(data.description)
            .fetch_one(&self.pool)
            .await?;

        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn toggle_completed(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let query = format!(
            "UPDATE tasks SET completed = NOT completed WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn set_archived(&self, id: Uuid, archived: bool) -> StoreResult<Option<Task>> {
        let query = format!(
            "UPDATE tasks SET archived = $2 WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(archived)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn update_content(&self, id: Uuid, input: TaskInput) -> StoreResult<Option<Task>> {
        let query = format!(
            "UPDATE tasks SET title = $2, description = $3 WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(input.title)
            .bind(input.description)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_tasks_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Task>> {
        // seq is a BIGSERIAL kept only to order rows inserted in the same instant
        let query = format!(
            "SELECT {} FROM tasks WHERE owner_id = $1 ORDER BY created_at DESC, seq DESC",
            TASK_COLUMNS
        );

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }
}

#[async_trait]
impl TokenRevocations for PgStore {
    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> StoreResult<bool> {
        let revoked: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1)")
                .bind(jti)
                .fetch_one(&self.pool)
                .await?;

        Ok(revoked)
    }

    async fn purge_expired_revocations(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        debug!(purged = result.rows_affected(), "Purged expired token revocations");
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        crate::db::pool::health_check(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn as_users(&self) -> &dyn UserRepository {
        self
    }

    fn as_tasks(&self) -> &dyn TaskRepository {
        self
    }

    fn as_revocations(&self) -> &dyn TokenRevocations {
        self
    }
}
