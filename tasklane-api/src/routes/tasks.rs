//! Task endpoints
//!
//! All routes require a session. Each handler takes [`RequireUser`] ahead of
//! its path and body, so an anonymous request gets `401` whatever else is
//! wrong with it. The requester's id then goes to the lifecycle engine, which
//! enforces ownership.
//!
//! | Route | Result |
//! |---|---|
//! | `GET /` | `{incomplete, completed, archived}` |
//! | `POST /tasks` | `201` + task |
//! | `GET /tasks/:id` | task |
//! | `POST /tasks/:id/toggle` | task |
//! | `POST /tasks/:id/archive` | task |
//! | `POST /tasks/:id/restore` | task |
//! | `POST /tasks/:id/delete` | `204` |
//! | `POST /tasks/:id/edit` | task |

use crate::{app::AppState, error::ApiResult, extract::RequireUser};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tasklane_shared::{
    lifecycle,
    models::task::{Task, TaskInput, TaskViews},
};
use uuid::Uuid;

/// Lists the requester's tasks in three views, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
) -> ApiResult<Json<TaskViews>> {
    let views = lifecycle::list_for(state.store.as_tasks(), session.user_id).await?;
    Ok(Json(views))
}

/// Creates a task
///
/// ```text
/// POST /tasks
/// Content-Type: application/json
///
/// { "title": "Buy milk", "description": "2 litres" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: No valid session
/// - `422 Unprocessable Entity`: Empty or overlong title, overlong description
pub async fn create_task(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Json(input): Json<TaskInput>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = lifecycle::create(state.store.as_tasks(), session.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = lifecycle::get(state.store.as_tasks(), task_id, session.user_id).await?;
    Ok(Json(task))
}

/// Flips the completed flag
///
/// # Errors
///
/// - `401 Unauthorized`: No valid session
/// - `403 Forbidden`: Task belongs to someone else
/// - `404 Not Found`: No such task
pub async fn toggle_task(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = lifecycle::toggle_complete(state.store.as_tasks(), task_id, session.user_id).await?;
    Ok(Json(task))
}

pub async fn archive_task(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = lifecycle::archive(state.store.as_tasks(), task_id, session.user_id).await?;
    Ok(Json(task))
}

pub async fn restore_task(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = lifecycle::restore(state.store.as_tasks(), task_id, session.user_id).await?;
    Ok(Json(task))
}

/// Permanently deletes a task
pub async fn delete_task(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    lifecycle::delete(state.store.as_tasks(), task_id, session.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replaces title and description
///
/// Completion, archive state and creation time are left as they are.
pub async fn edit_task(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Path(task_id): Path<Uuid>,
    Json(input): Json<TaskInput>,
) -> ApiResult<Json<Task>> {
    let task = lifecycle::edit(state.store.as_tasks(), task_id, session.user_id, input).await?;
    Ok(Json(task))
}
