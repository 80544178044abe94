/// Account management endpoints
///
/// Guarded by the manager credential from configuration; see
/// [`crate::app::manager_auth_layer`].
///
/// # Endpoints
///
/// - `POST /manage/user` - Create an account
/// - `DELETE /manage/user/:userId` - Delete an account and its tasks

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ErrorType},
    extract::PathId,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tasktrack_shared::{
    auth::Credential,
    models::user::{validate_password, validate_username},
};
use tracing::{debug, info};

/// Create user request
///
/// Missing fields read as empty; both must be present before the account
/// rules are checked.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

fn credentials_required() -> ApiError {
    ApiError::bad_request(
        ErrorType::ParametersRequired,
        "username and password required",
    )
}

/// Create user response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub user_id: i64,
}

/// Create user
///
/// # Endpoint
///
/// ```text
/// POST /manage/user
/// Authorization: Basic <manager credential>
///
/// { "username": "alice1", "password": "Secret1!" }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "userId": 1 }`
///
/// # Errors
///
/// - `400 PARAMETERS_REQUIRED`: body is not JSON, or a field is missing or empty
/// - `400 USERNAME_REQUIRED` / `PASSWORD_REQUIRED`: account rules violated
/// - `400 USERNAME_ALREADY_EXISTS`: username taken
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateUserResponse>)> {
    let req = match body {
        Ok(Json(req)) if !req.username.is_empty() && !req.password.is_empty() => req,
        Ok(_) => return Err(credentials_required()),
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "Rejected user body");
            return Err(credentials_required());
        }
    };

    validate_username(&req.username)?;
    validate_password(&req.password)?;

    let credential = Credential::new(req.username, state.salter.salt(&req.password));
    let user_id = state.store.create_user(&credential).await?;

    info!(user_id, username = %credential.username, "User created");

    Ok((StatusCode::CREATED, Json(CreateUserResponse { user_id })))
}

/// Delete user
///
/// # Endpoint
///
/// ```text
/// DELETE /manage/user/:userId
/// ```
///
/// # Errors
///
/// - `400 USER_NOT_FOUND`: no such account
/// - `400 PARAMETER_REQUIRED`: `userId` is not a positive integer
pub async fn delete_user(
    State(state): State<AppState>,
    PathId(user_id): PathId,
) -> ApiResult<StatusCode> {
    state.store.delete_user(user_id).await?;

    info!(user_id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
