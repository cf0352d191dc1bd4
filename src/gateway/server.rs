//! Gateway server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use super::handler::{AppState, create_router};
use crate::config::Config;
use crate::engine::ExecutionEngine;
use crate::settings::RequestSettings;
use crate::{Error, Result};

/// Certificate gateway server
pub struct Gateway {
    /// Configuration
    config: Arc<Config>,
    /// Engine receiving canonical requests
    engine: Arc<dyn ExecutionEngine>,
}

impl Gateway {
    /// Create a new gateway
    pub fn new(config: Config, engine: Arc<dyn ExecutionEngine>) -> Self {
        Self {
            config: Arc::new(config),
            engine,
        }
    }

    /// The catch-all router, without a listener.
    pub fn router(&self) -> Router {
        create_router(Arc::new(AppState {
            config: Arc::clone(&self.config),
            engine: Arc::clone(&self.engine),
        }))
    }

    /// Run the gateway until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// Returns an error if the host is invalid, binding fails, or the server
    /// stops abnormally.
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let app = self.router();
        let listener = TcpListener::bind(addr).await?;

        info!("============================================================");
        info!("CERT GATEWAY v{}", env!("CARGO_PKG_VERSION"));
        info!("============================================================");
        info!(host = %self.config.server.host, port = %self.config.server.port, "Listening");
        info!(engine = %self.config.engine.url, timeout = ?self.config.engine.timeout, "Engine");

        let settings = RequestSettings::from_config(&self.config);
        if settings.allow_header_cert_info {
            warn!(
                dn_header = ?settings.ssl_client_header,
                verify_header = ?settings.ssl_client_verify_header,
                "Client identity taken from HTTP headers; only run behind a trusted TLS terminator"
            );
        } else {
            info!("Client identity taken from the TLS peer certificate");
        }

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(e.to_string()))?;

        info!("Gateway stopped");
        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
