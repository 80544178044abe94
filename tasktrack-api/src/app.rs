/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasktrack_api::{app::{build_router, AppState}, config::Config};
/// use tasktrack_shared::{db::pool, store::postgres::PgTaskStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::load()?;
/// let pool = pool::acquire(&config.pool_config()).await?;
/// let store = Arc::new(PgTaskStore::new(pool, config.query_timeout()));
///
/// let state = AppState::new(store, config)?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{Config, CorsConfig},
    error::ApiError,
    extract::Presented,
    metrics::Metrics,
    middleware::{observe::RequestObserverLayer, panic::handle_panic},
};
use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tasktrack_shared::{
    auth::{password::PasswordSalter, Credential},
    store::TaskStore,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Owner-scoped task persistence
    pub store: Arc<dyn TaskStore>,

    /// Salts presented passwords before they reach the store
    pub salter: PasswordSalter,

    /// Manager credential for `/manage/*`, already salted
    pub manager: Arc<Credential>,

    /// Request counters
    pub metrics: Arc<Metrics>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    ///
    /// # Errors
    ///
    /// Returns an error if the request counters cannot be registered.
    pub fn new(store: Arc<dyn TaskStore>, config: Config) -> Result<Self, prometheus::Error> {
        let salter = PasswordSalter::new(&config.security.password_salt);
        let manager = Credential::new(
            config.server.manage_username.clone(),
            salter.salt(&config.server.manage_password),
        );
        let metrics = Metrics::new(config.server.metrics_route.clone())?;

        Ok(Self {
            store,
            salter,
            manager: Arc::new(manager),
            metrics: Arc::new(metrics),
            config: Arc::new(config),
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET    /health                # Health check (public)
/// ├── GET    /metrics               # Prometheus exposition (public, configurable)
/// ├── /manage/                      # Manager credential required
/// │   ├── POST   /user
/// │   └── DELETE /user/:userId
/// ├── POST   /task                  # Owner credential required
/// ├── GET    /task/:taskId
/// ├── PUT    /task/:taskId
/// ├── DELETE /task/:taskId
/// ├── GET    /tasks
/// └── DELETE /tasks
/// ```
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Panic recovery (tower-http CatchPanicLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Request counters and error logging (RequestObserverLayer)
/// 4. Request deadline, 408 once `request_timeout_seconds` pass (TimeoutLayer)
/// 5. Body read deadline (RequestBodyTimeoutLayer)
/// 6. Body size cap, 413 above `max_body_bytes` (RequestBodyLimitLayer)
/// 7. Access log (tower-http TraceLayer)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let request_timeout = state.config.request_timeout();

    let manage_routes = Router::new()
        .route("/user", post(routes::manage::create_user))
        .route("/user/:userId", delete(routes::manage::delete_user))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            manager_auth_layer,
        ));

    let task_routes = Router::new()
        .route("/task", post(routes::task::create_task))
        .route(
            "/task/:taskId",
            get(routes::task::get_task)
                .put(routes::task::update_task)
                .delete(routes::task::delete_task),
        )
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).delete(routes::tasks::delete_all_tasks),
        );

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route(state.metrics.route(), get(routes::metrics::metrics))
        .nest("/manage", manage_routes)
        .merge(task_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(RequestBodyLimitLayer::new(state.config.server.max_body_bytes))
        .layer(RequestBodyTimeoutLayer::new(request_timeout))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(RequestObserverLayer::new(state.metrics.clone()))
        .layer(cors_layer(&state.config.server.cors))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|value| value == "*")
}

/// Builds the CORS policy; a `*` entry makes that dimension permissive
fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let layer = if is_wildcard(&cors.allow_origins) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = cors
            .allow_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    let layer = if is_wildcard(&cors.allow_methods) {
        layer.allow_methods(Any)
    } else {
        let methods: Vec<Method> = cors
            .allow_methods
            .iter()
            .filter_map(|method| Method::from_bytes(method.as_bytes()).ok())
            .collect();
        layer.allow_methods(methods)
    };

    if is_wildcard(&cors.allow_headers) {
        layer.allow_headers(Any)
    } else {
        let headers: Vec<HeaderName> = cors
            .allow_headers
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect();
        layer.allow_headers(headers)
    }
}

/// Manager authentication middleware layer
///
/// Lets the request through only when the Basic credential equals the
/// configured manager pair. The account table is never consulted.
pub async fn manager_auth_layer(
    State(state): State<AppState>,
    Presented(presented): Presented,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let username_matches = presented.username == state.manager.username;
    let password_matches = state
        .salter
        .verify(&presented.password, &state.manager.credential_hash);

    if !(username_matches && password_matches) {
        warn!(username = %presented.username, "Rejected manager credential");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(req).await)
}
