//! Task lifecycle engine
//!
//! Every operation that names an existing task runs the same check first:
//!
//! ```text
//! find_task(id) ── None ─────────────> NotFound
//!      │
//!      └─ owner_id != requester ─────> Forbidden   (nothing written)
//!      │
//!      └─ apply transition in the repository (atomic per row)
//! ```
//!
//! `owner_id` and `created_at` are never written after insert, so the check
//! cannot be invalidated by a concurrent writer. A concurrent delete is: the
//! repository then reports the row gone and the operation returns
//! `NotFound`.

use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::auth::authorization::require_owner;
use crate::error::{DomainError, DomainResult};
use crate::models::task::{CreateTask, Task, TaskInput, TaskViews};
use crate::store::TaskRepository;

/// Fetches a task and checks that `requester` owns it
async fn owned_task(tasks: &dyn TaskRepository, task_id: Uuid, requester: Uuid) -> DomainResult<Task> {
    let task = tasks
        .find_task(task_id)
        .await?
        .ok_or(DomainError::NotFound(task_id))?;

    require_owner(&task, requester)?;
    Ok(task)
}

fn validated(input: TaskInput) -> DomainResult<TaskInput> {
    let input = input.normalized();
    input.validate()?;
    Ok(input)
}

/// Creates a task owned by `owner`, incomplete and active
pub async fn create(tasks: &dyn TaskRepository, owner: Uuid, input: TaskInput) -> DomainResult<Task> {
    let input = validated(input)?;

    let task = tasks
        .insert_task(CreateTask {
            owner_id: owner,
            title: input.title,
            description: input.description,
        })
        .await?;

    info!(task_id = %task.id, owner_id = %owner, "Created task");
    Ok(task)
}

/// Returns one task to its owner
pub async fn get(tasks: &dyn TaskRepository, task_id: Uuid, requester: Uuid) -> DomainResult<Task> {
    owned_task(tasks, task_id, requester).await
}

/// Flips `completed`
pub async fn toggle_complete(
    tasks: &dyn TaskRepository,
    task_id: Uuid,
    requester: Uuid,
) -> DomainResult<Task> {
    owned_task(tasks, task_id, requester).await?;

    let task = tasks
        .toggle_completed(task_id)
        .await?
        .ok_or(DomainError::NotFound(task_id))?;

    debug!(task_id = %task_id, completed = task.completed, "Toggled task");
    Ok(task)
}

/// Hides a task from the active views; succeeds if already archived
pub async fn archive(tasks: &dyn TaskRepository, task_id: Uuid, requester: Uuid) -> DomainResult<Task> {
    set_archived(tasks, task_id, requester, true).await
}

/// Returns an archived task to the active views; succeeds if already active
pub async fn restore(tasks: &dyn TaskRepository, task_id: Uuid, requester: Uuid) -> DomainResult<Task> {
    set_archived(tasks, task_id, requester, false).await
}

async fn set_archived(
    tasks: &dyn TaskRepository,
    task_id: Uuid,
    requester: Uuid,
    archived: bool,
) -> DomainResult<Task> {
    let current = owned_task(tasks, task_id, requester).await?;
    if current.archived == archived {
        debug!(task_id = %task_id, archived, "Archive flag already set");
        return Ok(current);
    }

    let task = tasks
        .set_archived(task_id, archived)
        .await?
        .ok_or(DomainError::NotFound(task_id))?;

    debug!(task_id = %task_id, archived, "Updated archive flag");
    Ok(task)
}

/// Permanently removes a task
pub async fn delete(tasks: &dyn TaskRepository, task_id: Uuid, requester: Uuid) -> DomainResult<()> {
    owned_task(tasks, task_id, requester).await?;

    if !tasks.delete_task(task_id).await? {
        return Err(DomainError::NotFound(task_id));
    }

    info!(task_id = %task_id, owner_id = %requester, "Deleted task");
    Ok(())
}

/// Replaces title and description; flags and timestamp are untouched
///
/// Input is validated before the task is looked up.
pub async fn edit(
    tasks: &dyn TaskRepository,
    task_id: Uuid,
    requester: Uuid,
    input: TaskInput,
) -> DomainResult<Task> {
    let input = validated(input)?;
    owned_task(tasks, task_id, requester).await?;

    let task = tasks
        .update_content(task_id, input)
        .await?
        .ok_or(DomainError::NotFound(task_id))?;

    debug!(task_id = %task_id, "Edited task");
    Ok(task)
}

/// The owner's tasks split into incomplete, completed and archived views
pub async fn list_for(tasks: &dyn TaskRepository, owner: Uuid) -> DomainResult<TaskViews> {
    let all = tasks.list_tasks_by_owner(owner).await?;
    Ok(TaskViews::partition(all))
}
