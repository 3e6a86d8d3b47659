use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uigate::config;
use uigate::lifecycle::{signals, startup, Shutdown};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uigate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "uigate starting");

    let config = match config::resolve_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Configuration error");
            std::process::exit(1);
        }
    };

    let shutdown = Shutdown::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            signals::wait_for_signal().await;
            shutdown.trigger();
        }
    });

    if let Err(e) = startup::run(config, &shutdown).await {
        tracing::error!(error = %e, "Fatal proxy error");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
}
