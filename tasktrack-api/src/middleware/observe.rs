/// Response observer middleware
///
/// Runs after routing, so the matched route template is known. For every
/// finished request it:
///
/// - increments `http_requests_total{code, method, path}`, except for the
///   metrics route itself
/// - for status >= 400, logs one error line with status, client address,
///   method, path and the response body with `"` characters removed
///
/// The body of a failed response is buffered and handed on unchanged; at
/// most the first 64 KiB of it is copied into the log.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{routing::get, Router};
/// use tasktrack_api::metrics::Metrics;
/// use tasktrack_api::middleware::observe::RequestObserverLayer;
///
/// # fn example() -> Result<(), prometheus::Error> {
/// let metrics = Arc::new(Metrics::new("/metrics")?);
/// let app: Router = Router::new()
///     .route("/tasks", get(|| async { "[]" }))
///     .layer(RequestObserverLayer::new(metrics));
/// # Ok(())
/// # }
/// ```

use axum::{
    body::Body,
    extract::{ConnectInfo, MatchedPath, Request},
    response::Response,
};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::error;

use crate::metrics::{Metrics, UNMATCHED_ROUTE};

/// Largest error body copied into the log
const MAX_LOGGED_BODY: usize = 64 * 1024;

/// Response observer layer
#[derive(Clone)]
pub struct RequestObserverLayer {
    metrics: Arc<Metrics>,
}

impl RequestObserverLayer {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

impl<S> Layer<S> for RequestObserverLayer {
    type Service = RequestObserver<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestObserver {
            inner,
            metrics: self.metrics.clone(),
        }
    }
}

/// Response observer service
#[derive(Clone)]
pub struct RequestObserver<S> {
    inner: S,
    metrics: Arc<Metrics>,
}

impl<S> Service<Request> for RequestObserver<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(|matched| matched.as_str().to_string())
            .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());
        let client = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| "-".to_string());
        let method = request.method().to_string();
        let uri = request.uri().to_string();

        let metrics = self.metrics.clone();
        let future = self.inner.call(request);

        Box::pin(async move {
            let response = future.await?;
            let status = response.status();

            metrics.observe(status.as_u16(), &method, &route);

            if !(status.is_client_error() || status.is_server_error()) {
                return Ok(response);
            }

            let (parts, body) = response.into_parts();
            let bytes = match axum::body::to_bytes(body, usize::MAX).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    error!(error = %err, "Failed to buffer error response body");
                    bytes::Bytes::new()
                }
            };
            let logged = &bytes[..bytes.len().min(MAX_LOGGED_BODY)];

            error!(
                status = status.as_u16(),
                client = %client,
                method = %method,
                path = %uri,
                route = %route,
                body = %String::from_utf8_lossy(logged).replace('"', ""),
                truncated = bytes.len() > MAX_LOGGED_BODY,
                "Request failed"
            );

            Ok(Response::from_parts(parts, Body::from(bytes)))
        })
    }
}
