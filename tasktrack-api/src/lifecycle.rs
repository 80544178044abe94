/// Server lifecycle coordination
///
/// ```text
/// Starting ──▶ Serving ──stop signal──▶ Draining ──▶ Stopped
///                 │                                    ▲
///                 └──────── listener error ────────────┘
/// ```
///
/// [`LifecycleCoordinator::run`] serves the router on a background task and
/// waits for either the listener to fail or the stop signal. On a stop
/// signal it cancels the listener, lets in-flight requests finish, and
/// aborts the server task once the shutdown budget is spent.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use axum::Router;
/// use tasktrack_api::lifecycle::{shutdown_signal, LifecycleCoordinator};
///
/// # async fn example(app: Router) -> anyhow::Result<()> {
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// let coordinator = LifecycleCoordinator::new(Duration::from_secs(10));
///
/// coordinator.run(listener, app, shutdown_signal()).await?;
/// # Ok(())
/// # }
/// ```

use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Observable server state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Starting,
    Serving,
    Draining,
    Stopped,
}

/// Error type for a server run that did not end cleanly
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The listener failed while serving
    #[error("listener failed: {0}")]
    Serve(#[source] std::io::Error),

    /// In-flight requests outlived the shutdown budget
    #[error("in-flight requests did not finish within {0:?}")]
    ForcedShutdown(Duration),

    /// The server task panicked or was cancelled
    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Drives one server run from start to stop
#[derive(Debug)]
pub struct LifecycleCoordinator {
    state: watch::Sender<ServerState>,
    max_shutdown: Duration,
}

impl LifecycleCoordinator {
    pub fn new(max_shutdown: Duration) -> Self {
        let (state, _) = watch::channel(ServerState::Starting);

        Self {
            state,
            max_shutdown,
        }
    }

    /// Receiver that sees every state change
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    fn transition(&self, next: ServerState) {
        let previous = self.state.send_replace(next);
        info!(from = ?previous, to = ?next, "Server state changed");
    }

    /// Serves `router` on `listener` until `shutdown` resolves or the listener fails
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::Serve`] if the listener failed
    /// - [`LifecycleError::ForcedShutdown`] if draining exceeded the budget
    /// - [`LifecycleError::Join`] if the server task panicked
    pub async fn run<F>(
        &self,
        listener: TcpListener,
        router: Router,
        shutdown: F,
    ) -> Result<(), LifecycleError>
    where
        F: Future<Output = ()>,
    {
        let token = CancellationToken::new();
        let graceful = token.clone();
        let address = listener.local_addr().ok();

        let mut server = tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move { graceful.cancelled().await })
            .await
        });

        self.transition(ServerState::Serving);
        info!(address = ?address, "Server listening");

        tokio::select! {
            joined = &mut server => {
                self.transition(ServerState::Stopped);
                return match joined? {
                    Ok(()) => Ok(()),
                    Err(err) => {
                        error!(error = %err, "Listener failed");
                        Err(LifecycleError::Serve(err))
                    }
                };
            }
            () = shutdown => {
                info!("Shutdown signal received, draining in-flight requests");
            }
        }

        self.transition(ServerState::Draining);
        token.cancel();

        let drained = tokio::time::timeout(self.max_shutdown, &mut server).await;
        let result = match drained {
            Ok(joined) => joined?.map_err(LifecycleError::Serve),
            Err(_) => {
                warn!(
                    max_shutdown_ms = self.max_shutdown.as_millis() as u64,
                    "Shutdown budget exceeded, aborting in-flight requests"
                );
                server.abort();
                Err(LifecycleError::ForcedShutdown(self.max_shutdown))
            }
        };

        self.transition(ServerState::Stopped);
        result
    }
}

/// Resolves on the first stop signal
///
/// Ctrl-C everywhere; SIGTERM, SIGHUP and SIGQUIT on unix as well.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::hangup()),
            signal(SignalKind::quit()),
        ) {
            (Ok(mut term), Ok(mut hup), Ok(mut quit)) => {
                tokio::select! {
                    _ = term.recv() => {},
                    _ = hup.recv() => {},
                    _ = quit.recv() => {},
                }
            }
            _ => {
                warn!("Failed to install unix signal handlers");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
