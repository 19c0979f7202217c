//! Task model
//!
//! A task belongs to exactly one user for its whole life. Visibility is
//! driven by two independent flags, so four composite states are reachable:
//!
//! ```text
//!                 completed = false      completed = true
//! archived=false  Incomplete             Completed
//! archived=true   Archived               Archived
//! ```
//!
//! `toggle` flips `completed`; `archive`/`restore` set and clear `archived`.
//! Neither flag constrains the other. Deletion is permanent.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     seq BIGSERIAL NOT NULL,
//!     owner_id UUID NOT NULL REFERENCES users(id),
//!     title VARCHAR(100) NOT NULL CHECK (char_length(title) > 0),
//!     description VARCHAR(200),
//!     completed BOOLEAN NOT NULL DEFAULT FALSE,
//!     archived BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE INDEX idx_tasks_owner_created ON tasks (owner_id, created_at DESC, seq DESC);
//!
//! -- BEFORE UPDATE trigger: rejects any change to owner_id or created_at
//! CREATE TRIGGER tasks_freeze_identity
//!     BEFORE UPDATE ON tasks
//!     FOR EACH ROW EXECUTE FUNCTION tasks_freeze_identity();
//! ```
//!
//! `seq` is insertion order. It breaks `created_at` ties in listings and is
//! not part of [`Task`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Task model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user, fixed at creation
    pub owner_id: Uuid,

    /// Short title (1..=100 characters)
    pub title: String,

    /// Optional longer description (at most 200 characters)
    pub description: Option<String>,

    /// Whether the owner has marked the task done
    pub completed: bool,

    /// Whether the task is hidden from the active views
    pub archived: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Which list a task is shown in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskView {
    /// Active and not completed
    Incomplete,

    /// Active and completed
    Completed,

    /// Archived, regardless of completion
    Archived,
}

impl TaskView {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskView::Incomplete => "incomplete",
            TaskView::Completed => "completed",
            TaskView::Archived => "archived",
        }
    }
}

impl Task {
    /// Derives the list this task belongs in
    pub fn view(&self) -> TaskView {
        match (self.archived, self.completed) {
            (true, _) => TaskView::Archived,
            (false, true) => TaskView::Completed,
            (false, false) => TaskView::Incomplete,
        }
    }

    /// Checks whether the task is visible in the active views
    pub fn is_active(&self) -> bool {
        !self.archived
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

/// A user's tasks split into the three views
///
/// Each list is ordered by creation time, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskViews {
    pub incomplete: Vec<Task>,
    pub completed: Vec<Task>,
    pub archived: Vec<Task>,
}

impl TaskViews {
    /// Partitions tasks by [`Task::view`], preserving input order
    pub fn partition(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut views = Self::default();
        for task in tasks {
            match task.view() {
                TaskView::Incomplete => views.incomplete.push(task),
                TaskView::Completed => views.completed.push(task),
                TaskView::Archived => views.archived.push(task),
            }
        }
        views
    }

    pub fn len(&self) -> usize {
        self.incomplete.len() + self.completed.len() + self.archived.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds the view containing the given task id
    pub fn locate(&self, task_id: Uuid) -> Option<TaskView> {
        let contains = |tasks: &[Task]| tasks.iter().any(|t| t.id == task_id);
        if contains(&self.incomplete) {
            Some(TaskView::Incomplete)
        } else if contains(&self.completed) {
            Some(TaskView::Completed)
        } else if contains(&self.archived) {
            Some(TaskView::Archived)
        } else {
            None
        }
    }
}

/// Title and description as submitted for create and edit
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Title must be between 1 and 100 characters"
    ))]
    pub title: String,

    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    #[serde(default)]
    pub description: Option<String>,
}

impl TaskInput {
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: title.into(),
            description,
        }
    }

    /// Trims the title and drops a blank description
    pub fn normalized(self) -> Self {
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Self {
            title: self.title.trim().to_string(),
            description,
        }
    }
}

/// Row to insert for a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
}
