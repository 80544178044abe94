/// Panic recovery
///
/// Used with `tower_http::catch_panic::CatchPanicLayer::custom`. A panicking
/// handler is logged and answered with the generic 500 body; the connection
/// and the process stay up.

use axum::response::Response;
use std::any::Any;
use tracing::error;

use crate::error::internal_response;

/// Converts a caught panic payload into the `INTERNAL` response
#[tracing::instrument(skip_all, name = "middleware.catch_panic")]
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "<unknown>".to_string()
    };

    error!(panic = %message, "Request handler panicked");
    internal_response()
}
