//! # tasktrack API Server
//!
//! Multi-user task tracking over HTTP with Basic authentication.
//!
//! ## Startup
//!
//! 1. load configuration (`.env`, `configs/tasktrack.toml`, `TASKTRACK_*`)
//! 2. open the store pool, retrying while connections are refused
//! 3. apply migrations
//! 4. serve until SIGINT, SIGTERM, SIGHUP or SIGQUIT, then drain
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p tasktrack-api
//! ```

use anyhow::Context;
use std::sync::Arc;
use tasktrack_api::{
    app::{build_router, AppState},
    config::{Config, LogConfig},
    lifecycle::{shutdown_signal, LifecycleCoordinator},
};
use tasktrack_shared::{
    db::{migrations::run_migrations, pool},
    store::postgres::PgTaskStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log.filter.clone().into());
    let registry = tracing_subscriber::registry().with(filter);

    if log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    init_tracing(&config.log);

    tracing::info!(
        "tasktrack API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let db = pool::acquire(&config.pool_config())
        .await
        .context("Failed to connect to the store")?;

    if config.database.run_migrations {
        run_migrations(&db)
            .await
            .context("Failed to run migrations")?;
    }

    let store = Arc::new(PgTaskStore::new(db.clone(), config.query_timeout()));
    let bind_address = config.bind_address();
    let max_shutdown = config.max_shutdown();

    let state = AppState::new(store, config).context("Failed to register metrics")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;

    let coordinator = LifecycleCoordinator::new(max_shutdown);
    let served = coordinator.run(listener, app, shutdown_signal()).await;

    pool::close_pool(db).await;
    served.context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}
