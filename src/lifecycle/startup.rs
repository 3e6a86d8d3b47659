//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the external socket first (fail fast on bind errors)
//! - Spawn the readiness monitor
//! - Serve in the configured forwarding mode
//!
//! Serving starts before the backend is confirmed reachable: the readiness
//! gate (503 in HTTP mode, dropped connection in raw mode) covers the
//! window, so clients always get a bounded answer.

use tokio::net::TcpListener;

use crate::config::{ForwardMode, ProxyConfig};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::net::{Listener, ListenerError};
use crate::readiness::{ReadinessMonitor, SharedReadiness};
use crate::tcp::TcpRelay;

/// Unrecoverable startup error; the process exits non-zero.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("{0}")]
    Bind(#[from] ListenerError),

    #[error("failed to bind: {0}")]
    BindHttp(std::io::Error),

    #[error("serve error: {0}")]
    Serve(std::io::Error),
}

/// Run the proxy to completion: returns `Ok(())` after a graceful
/// shutdown, `Err` on bind or serve failure.
pub async fn run(config: ProxyConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    let endpoint = config.backend_endpoint();
    let readiness = SharedReadiness::new();

    tracing::info!(
        port = config.listener.port,
        backend = %endpoint,
        mode = ?config.mode,
        "Starting proxy"
    );

    let monitor = ReadinessMonitor::new(endpoint.clone(), readiness.clone(), config.readiness.clone());
    let monitor_handle = tokio::spawn(monitor.run(shutdown.subscribe()));

    match config.mode {
        ForwardMode::Http => {
            let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.listener.port));
            let listener = TcpListener::bind(addr)
                .await
                .map_err(StartupError::BindHttp)?;

            let server = HttpServer::new(&config, endpoint, readiness);
            server
                .run(listener, shutdown)
                .await
                .map_err(StartupError::Serve)?;
        }
        ForwardMode::Tcp => {
            let listener = Listener::bind(&config.listener).await?;
            let relay = TcpRelay::new(&config, endpoint, readiness);
            relay.run(listener, shutdown).await;
        }
    }

    // The monitor saw the same shutdown broadcast; join it so no probe is
    // left dangling.
    let _ = monitor_handle.await;

    Ok(())
}
