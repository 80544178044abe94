/// Task collection endpoints
///
/// # Endpoints
///
/// - `GET /tasks` - List the caller's tasks in creation order
/// - `DELETE /tasks` - Delete all of the caller's tasks
///
/// A credential that matches no account sees an empty collection.

use crate::{app::AppState, error::ApiResult, extract::Owner};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tasktrack_shared::models::task::Task;
use tracing::info;

/// Delete all tasks response
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteAllResponse {
    /// Number of tasks removed
    pub quantity: u64,
}

/// List tasks
///
/// # Response
///
/// ```json
/// [
///   {
///     "id": 1,
///     "title": "buy milk",
///     "completed": false,
///     "createdAt": "2024-03-01T12:00:00Z",
///     "updatedAt": "2024-03-01T12:00:00Z",
///     "completedAt": null
///   }
/// ]
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.store.list_tasks(&owner).await?;

    Ok(Json(tasks))
}

/// Delete all tasks
///
/// # Response
///
/// `200 OK` with `{ "quantity": 2 }`
pub async fn delete_all_tasks(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> ApiResult<Json<DeleteAllResponse>> {
    let quantity = state.store.delete_all_tasks(&owner).await?;

    info!(quantity, username = %owner.username, "Deleted all tasks");

    Ok(Json(DeleteAllResponse { quantity }))
}
