/// Single task endpoints
///
/// All endpoints require the owner's Basic credential. A task owned by
/// another account answers exactly like a missing one.
///
/// # Endpoints
///
/// - `POST /task` - Create a task
/// - `GET /task/:taskId` - Get a task
/// - `PUT /task/:taskId` - Update title and completion
/// - `DELETE /task/:taskId` - Delete a task

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ErrorType},
    extract::{Owner, PathId},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tasktrack_shared::models::task::{Task, TaskPatch};
use tracing::debug;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(max = 200, code = "PARAMETER_TOO_LONG", message = "max 200"))]
    pub title: String,
}

/// Create task response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskResponse {
    pub task_id: i64,
}

/// Update task request
///
/// `completed` defaults to `false`, which reopens the task.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(max = 200, code = "PARAMETER_TOO_LONG", message = "max 200"))]
    pub title: Option<String>,

    #[serde(default)]
    pub completed: bool,
}

impl From<UpdateTaskRequest> for TaskPatch {
    fn from(req: UpdateTaskRequest) -> Self {
        TaskPatch::new(req.title, req.completed)
    }
}

/// Create task
///
/// # Endpoint
///
/// ```text
/// POST /task
/// Authorization: Basic <owner credential>
///
/// { "title": "buy milk" }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "taskId": 1 }`
///
/// # Errors
///
/// - `400 PARAMETER_REQUIRED`: body is not JSON, or the title is missing or empty
/// - `400 PARAMETER_TOO_LONG`: title longer than 200 characters
/// - `401 Unauthorized`: missing credential or no matching account
pub async fn create_task(
    State(state): State<AppState>,
    Owner(owner): Owner,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateTaskResponse>)> {
    let title_required = || ApiError::bad_request(ErrorType::ParameterRequired, "title");

    let Json(req) = body.map_err(|rejection| {
        debug!(reason = %rejection.body_text(), "Rejected task body");
        title_required()
    })?;

    if req.title.is_empty() {
        return Err(title_required());
    }
    req.validate()?;

    let task_id = state.store.create_task(&owner, &req.title).await?;

    debug!(task_id, username = %owner.username, "Task created");

    Ok((StatusCode::CREATED, Json(CreateTaskResponse { task_id })))
}

/// Get task
///
/// # Errors
///
/// - `400 TASK_NOT_FOUND`: no such task for this owner
pub async fn get_task(
    State(state): State<AppState>,
    Owner(owner): Owner,
    PathId(task_id): PathId,
) -> ApiResult<Json<Task>> {
    let task = state.store.get_task(&owner, task_id).await?;

    Ok(Json(task))
}

/// Update task
///
/// # Endpoint
///
/// ```text
/// PUT /task/:taskId
///
/// { "title": "buy oat milk", "completed": true }
/// ```
///
/// An absent or empty title keeps the current one.
///
/// # Errors
///
/// - `400 PARAMETERS_REQUIRED`: body is not a JSON object of this shape
/// - `400 PARAMETER_TOO_LONG`: title longer than 200 characters
/// - `400 TASK_NOT_FOUND`: no such task for this owner
pub async fn update_task(
    State(state): State<AppState>,
    Owner(owner): Owner,
    PathId(task_id): PathId,
    body: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(req) = body.map_err(|rejection| {
        ApiError::bad_request(ErrorType::ParametersRequired, rejection.body_text())
    })?;
    req.validate()?;

    let patch = TaskPatch::from(req);
    state.store.update_task(&owner, task_id, &patch).await?;

    debug!(task_id, completed = patch.completed, "Task updated");

    Ok(StatusCode::NO_CONTENT)
}

/// Delete task
///
/// # Errors
///
/// - `400 TASK_NOT_FOUND`: no such task for this owner
pub async fn delete_task(
    State(state): State<AppState>,
    Owner(owner): Owner,
    PathId(task_id): PathId,
) -> ApiResult<StatusCode> {
    state.store.delete_task(&owner, task_id).await?;

    debug!(task_id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}
