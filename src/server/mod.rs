pub mod handler;
pub mod health;
pub mod state;

use crate::{Config, Error, Result};
use health::HealthCheckType;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub use handler::router;
pub use health::HealthCheck;
pub use state::AppState;

pub struct Server {
    config: Arc<Config>,
    cancellation_token: CancellationToken,
}

impl Server {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            cancellation_token: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn new_with_arc(config: Arc<Config>) -> Self {
        Self {
            config,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Build the services from configuration and serve until shutdown
    pub async fn run(&self) -> Result<()> {
        let state = AppState::from_config(&self.config).await?;
        self.run_with_state(state).await
    }

    /// Serve the HTTP API over already-wired services
    pub async fn run_with_state(&self, state: AppState) -> Result<()> {
        info!("Starting HTTP server infrastructure");

        let host = self.config.server.host.as_str();
        let port = self.config.server.port;
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| Error::Service(format!("Failed to bind {host}:{port}: {e}")))?;
        info!("Listening on http://{}", listener.local_addr()?);

        self.spawn_signal_handler();

        let health = state.health.clone();
        health.update_check(HealthCheckType::Server, true).await;

        let app = router(state);
        let shutdown_token = self.cancellation_token.clone();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown_token.cancelled().await });

        let server_result = tokio::select! {
            result = serve.into_future() => {
                result.map_err(|e| Error::Service(format!("HTTP server error: {e}")))
            }
            () = self.drain_deadline() => {
                warn!("Graceful shutdown timeout exceeded, forcing shutdown");
                Ok(())
            }
        };

        health.set_unhealthy("Service is shut down").await;
        info!("HTTP server shutdown complete");
        server_result
    }

    fn spawn_signal_handler(&self) {
        let shutdown_token = self.cancellation_token.clone();
        tokio::spawn(async move {
            let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(stream) => stream,
                Err(e) => {
                    error!("Failed to setup SIGTERM handler: {}", e);
                    return;
                }
            };

            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                }
                _ = signal::ctrl_c() => {
                    info!("Received SIGINT, initiating graceful shutdown");
                }
                () = shutdown_token.cancelled() => return,
            }

            shutdown_token.cancel();
        });
    }

    /// Resolves once shutdown was requested and in-flight requests had
    /// the configured grace period to finish
    async fn drain_deadline(&self) {
        self.cancellation_token.cancelled().await;
        let shutdown_timeout =
            tokio::time::Duration::from_secs(self.config.server.graceful_shutdown_timeout_secs);
        tokio::time::sleep(shutdown_timeout).await;
    }

    pub fn shutdown(&self) {
        warn!("Initiating server shutdown");
        self.cancellation_token.cancel();
    }

    /// Check if the server has been requested to shutdown
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// Get the server configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
