/// Metrics exposition endpoint
///
/// ```text
/// GET /metrics
/// ```
///
/// Served on the configured metrics route in the prometheus text format.
/// Requests to it are not counted.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

/// Renders every request counter
pub async fn metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let body = state
        .metrics
        .encode()
        .map_err(|e| ApiError::InternalError(format!("Failed to encode metrics: {}", e)))?;

    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
