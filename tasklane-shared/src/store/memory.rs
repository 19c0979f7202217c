//! In-process store
//!
//! Keeps users, tasks and revocations in maps behind one `RwLock`. Each
//! operation holds the write guard for its whole read-modify-write, which
//! gives the same per-row atomicity the PostgreSQL store gets from single
//! `UPDATE ... RETURNING` statements. Data is lost when the process exits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, TaskRepository, TokenRevocations, UserRepository};
use crate::models::{
    task::{CreateTask, Task, TaskInput},
    user::{CreateUser, User},
};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    tasks: HashMap<Uuid, StoredTask>,
    revoked: HashMap<Uuid, DateTime<Utc>>,
    next_seq: u64,
}

struct StoredTask {
    task: Task,
    // Insertion order, breaks ties between equal timestamps
    seq: u64,
}

/// Store backed by process memory
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.username == data.username) {
            return Err(StoreError::UniqueViolation("username".to_string()));
        }
        if state.users.values().any(|u| u.email == data.email) {
            return Err(StoreError::UniqueViolation("email".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            is_active: true,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut state = self.state.write().await;

        let task = Task {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            title: data.title,
            description: data.description,
            completed: false,
            archived: false,
            created_at: Utc::now(),
        };

        let seq = state.next_seq;
        state.next_seq += 1;
        state.tasks.insert(
            task.id,
            StoredTask {
                task: task.clone(),
                seq,
            },
        );

        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.state.read().await.tasks.get(&id).map(|s| s.task.clone()))
    }

    async fn toggle_completed(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;
        Ok(state.tasks.get_mut(&id).map(|stored| {
            stored.task.completed = !stored.task.completed;
            stored.task.clone()
        }))
    }

    async fn set_archived(&self, id: Uuid, archived: bool) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;
        Ok(state.tasks.get_mut(&id).map(|stored| {
            stored.task.archived = archived;
            stored.task.clone()
        }))
    }

    async fn update_content(&self, id: Uuid, input: TaskInput) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;
        Ok(state.tasks.get_mut(&id).map(|stored| {
            stored.task.title = input.title;
            stored.task.description = input.description;
            stored.task.clone()
        }))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.write().await.tasks.remove(&id).is_some())
    }

    async fn list_tasks_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Task>> {
        let state = self.state.read().await;

        let mut owned: Vec<&StoredTask> = state
            .tasks
            .values()
            .filter(|s| s.task.owner_id == owner_id)
            .collect();
        owned.sort_by(|a, b| {
            b.task
                .created_at
                .cmp(&a.task.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        Ok(owned.into_iter().map(|s| s.task.clone()).collect())
    }
}

#[async_trait]
impl TokenRevocations for MemoryStore {
    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()> {
        self.state.write().await.revoked.insert(jti, expires_at);
        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> StoreResult<bool> {
        Ok(self.state.read().await.revoked.contains_key(&jti))
    }

    async fn purge_expired_revocations(&self) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let before = state.revoked.len();
        state.revoked.retain(|_, expires_at| *expires_at > now);
        Ok((before - state.revoked.len()) as u64)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
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
