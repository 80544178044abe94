/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`.
///
/// # Response format
///
/// ```json
/// { "type": "TASK_NOT_FOUND", "comment": "42" }
/// ```
///
/// | Error                               | Status | Body                       |
/// |-------------------------------------|--------|----------------------------|
/// | validation, conflict, missing row   | 400    | `{type, comment}`          |
/// | missing or unknown credential       | 401    | empty, with Basic challenge |
/// | store failure, timeout, panic       | 500    | `{"type": "INTERNAL", ...}` |
///
/// # Example
///
/// ```
/// use tasktrack_api::error::{ApiError, ApiResult, ErrorType};
///
/// fn parse_id(raw: &str) -> ApiResult<i64> {
///     raw.parse()
///         .map_err(|_| ApiError::bad_request(ErrorType::ParameterRequired, "taskId"))
/// }
///
/// assert!(parse_id("abc").is_err());
/// ```

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tasktrack_shared::store::StoreError;
use validator::{ValidationError, ValidationErrors};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Challenge sent with every 401
pub const BASIC_CHALLENGE: &str = "Basic realm=\"Restricted\"";

/// Comment used for every 500 response; details only go to the log
pub const INTERNAL_COMMENT: &str = "internal server error";

/// Machine-readable error type carried in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    ParameterTooLong,
    ParameterRequired,
    ParametersRequired,
    PasswordRequired,
    TaskAlreadyExists,
    TaskNotFound,
    UsernameAlreadyExists,
    UsernameRequired,
    UserNotFound,
    Internal,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParameterTooLong => "PARAMETER_TOO_LONG",
            Self::ParameterRequired => "PARAMETER_REQUIRED",
            Self::ParametersRequired => "PARAMETERS_REQUIRED",
            Self::PasswordRequired => "PASSWORD_REQUIRED",
            Self::TaskAlreadyExists => "TASK_ALREADY_EXISTS",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::UsernameAlreadyExists => "USERNAME_ALREADY_EXISTS",
            Self::UsernameRequired => "USERNAME_REQUIRED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::Internal => "INTERNAL",
        }
    }

    /// Maps a validation code back to its error type
    pub fn from_code(code: &str) -> Option<Self> {
        [
            Self::ParameterTooLong,
            Self::ParameterRequired,
            Self::ParametersRequired,
            Self::PasswordRequired,
            Self::UsernameRequired,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == code)
    }
}

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Rejected input, conflicting or missing resource (400)
    BadRequest { kind: ErrorType, comment: String },

    /// Missing credential or a credential matching no account (401)
    Unauthorized,

    /// Internal server error (500)
    InternalError(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub kind: ErrorType,

    pub comment: String,
}

impl ApiError {
    pub fn bad_request(kind: ErrorType, comment: impl Into<String>) -> Self {
        Self::BadRequest {
            kind,
            comment: comment.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest { kind, comment } => {
                write!(f, "Bad request: {}: {}", kind.as_str(), comment)
            }
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Bare 401 carrying the Basic challenge
pub fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, HeaderValue::from_static(BASIC_CHALLENGE))],
    )
        .into_response()
}

/// 500 response with the generic `INTERNAL` body
pub fn internal_response() -> Response {
    let body = Json(ErrorResponse {
        kind: ErrorType::Internal,
        comment: INTERNAL_COMMENT.to_string(),
    });

    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest { kind, comment } => {
                let body = Json(ErrorResponse { kind, comment });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Unauthorized => unauthorized_response(),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                internal_response()
            }
        }
    }
}

/// Convert store errors to API errors
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameTaken(username) => {
                ApiError::bad_request(ErrorType::UsernameAlreadyExists, username)
            }
            StoreError::UserNotFound(id) => {
                ApiError::bad_request(ErrorType::UserNotFound, id.to_string())
            }
            StoreError::OwnerNotFound => ApiError::Unauthorized,
            StoreError::DuplicateTask => {
                ApiError::bad_request(ErrorType::TaskAlreadyExists, "task already exists")
            }
            StoreError::TaskNotFound(id) => {
                ApiError::bad_request(ErrorType::TaskNotFound, id.to_string())
            }
            StoreError::Timeout(_) | StoreError::Database(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

/// Convert a single rule violation to an API error
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let kind = ErrorType::from_code(&err.code).unwrap_or(ErrorType::ParameterRequired);
        let comment = err
            .message
            .map(|m| m.into_owned())
            .unwrap_or_else(|| err.code.into_owned());

        ApiError::bad_request(kind, comment)
    }
}

/// Convert derived request validation to an API error
///
/// Only the first failing field is reported, in field-name order.
impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        fields
            .into_iter()
            .find_map(|(_, errs)| errs.first().cloned())
            .map(ApiError::from)
            .unwrap_or_else(|| ApiError::bad_request(ErrorType::ParameterRequired, "invalid body"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::bad_request(ErrorType::TaskNotFound, "42");
        assert_eq!(err.to_string(), "Bad request: TASK_NOT_FOUND: 42");
        assert_eq!(ApiError::Unauthorized.to_string(), "Unauthorized");
    }

    #[test]
    fn test_error_type_serializes_as_code() {
        for kind in [
            ErrorType::ParameterTooLong,
            ErrorType::ParametersRequired,
            ErrorType::UsernameAlreadyExists,
            ErrorType::Internal,
        ] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
        }
    }

    #[tokio::test]
    async fn test_bad_request_body() {
        let response = ApiError::bad_request(ErrorType::TaskNotFound, "42").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["type"], "TASK_NOT_FOUND");
        assert_eq!(json["comment"], "42");
    }

    #[tokio::test]
    async fn test_unauthorized_has_challenge_and_no_body() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"Restricted\""
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = ApiError::InternalError("connection reset".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["type"], "INTERNAL");
        assert_eq!(json["comment"], INTERNAL_COMMENT);
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            ApiError::from(StoreError::OwnerNotFound),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from(StoreError::TaskNotFound(7)),
            ApiError::BadRequest { kind: ErrorType::TaskNotFound, comment } if comment == "7"
        ));
        assert!(matches!(
            ApiError::from(StoreError::UsernameTaken("alice1".to_string())),
            ApiError::BadRequest { kind: ErrorType::UsernameAlreadyExists, .. }
        ));
        assert!(matches!(
            ApiError::from(StoreError::UserNotFound(3)),
            ApiError::BadRequest { kind: ErrorType::UserNotFound, .. }
        ));
        assert!(matches!(
            ApiError::from(StoreError::Timeout(Duration::from_secs(5))),
            ApiError::InternalError(_)
        ));
    }

    #[test]
    fn test_validation_error_mapping() {
        let err = tasktrack_shared::models::user::validate_username("a!").unwrap_err();
        match ApiError::from(err) {
            ApiError::BadRequest { kind, comment } => {
                assert_eq!(kind, ErrorType::UsernameRequired);
                assert_eq!(comment, "only letters and numbers required");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
