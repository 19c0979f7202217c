//! Ownership checks
//!
//! A task is visible and mutable only to the user who created it. There
//! are no roles, sharing or admin overrides.

use tracing::warn;
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::task::Task;

/// Fails with `Forbidden` unless `requester` owns `task`
pub fn require_owner(task: &Task, requester: Uuid) -> Result<(), DomainError> {
    if task.is_owned_by(requester) {
        return Ok(());
    }

    warn!(
        task_id = %task.id,
        owner_id = %task.owner_id,
        requester = %requester,
        "Rejected access to task owned by another user"
    );
    Err(DomainError::Forbidden(task.id))
}
