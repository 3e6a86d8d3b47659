//! Backend readiness monitoring.
//!
//! # Responsibilities
//! - Wait for the backend's listening socket to appear after launch
//! - Pre-warm the backend with a local GET so it finishes lazy asset
//!   fetches before external clients connect
//! - Keep probing while the state is not `Ready` and restore it on success
//!
//! # Design Decisions
//! - "Can I open a socket" and "did I get response bytes" are separate
//!   phases; the proxy starts serving gated answers before either completes
//! - Pre-warm failure is a warning, not a startup error (best effort by
//!   default, gating via `Degraded` when `prewarm.required`)
//! - The loop holds no probe across shutdown: every suspension point races
//!   the shutdown broadcast

use axum::body::Body;
use axum::http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::{BackendEndpoint, ReadinessConfig};
use crate::readiness::state::{ReadinessState, SharedReadiness};
use crate::resilience::{retry_until, RetryPolicy};

/// Background task that owns all writes of `Ready`/`Degraded`.
pub struct ReadinessMonitor {
    endpoint: BackendEndpoint,
    state: SharedReadiness,
    config: ReadinessConfig,
    client: Client<HttpConnector, Body>,
}

impl ReadinessMonitor {
    pub fn new(endpoint: BackendEndpoint, state: SharedReadiness, config: ReadinessConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            endpoint,
            state,
            config,
            client,
        }
    }

    /// Run the monitor until shutdown: initial reachability wait and
    /// pre-warm, then the continuous probe loop.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            backend = %self.endpoint,
            wait_timeout_secs = self.config.wait_timeout_secs,
            "Readiness monitor starting"
        );

        tokio::select! {
            _ = self.startup() => {}
            _ = shutdown.recv() => {
                tracing::info!("Readiness monitor received shutdown signal during startup");
                return;
            }
        }

        let mut ticker = time::interval(self.config.probe_interval());
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.state.is_ready() {
                        self.probe_and_restore().await;
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Readiness monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Initial phase: wait for the socket, then pre-warm, then publish the
    /// resulting state. Never fails the process.
    async fn startup(&self) {
        if !self.wait_for_reachable().await {
            tracing::warn!(
                backend = %self.endpoint,
                "Backend did not become reachable within the startup budget; requests stay gated"
            );
            return;
        }

        if self.prewarm().await {
            self.state.set(ReadinessState::Ready);
        } else if self.config.prewarm.required {
            tracing::warn!(
                backend = %self.endpoint,
                "Pre-warm failed and is required; holding degraded until it succeeds"
            );
            self.state.set(ReadinessState::Degraded);
        } else {
            tracing::warn!(
                backend = %self.endpoint,
                "Pre-warm failed; serving best effort (first clients may see slow loads)"
            );
            self.state.set(ReadinessState::Ready);
        }
    }

    /// Retry TCP connects until the backend accepts one or the startup
    /// budget elapses. Reports the outcome, never errors out.
    async fn wait_for_reachable(&self) -> bool {
        let policy = RetryPolicy {
            per_attempt: self.config.connect_attempt_timeout(),
            delay: self.config.retry_delay(),
            budget: self.config.wait_timeout(),
        };
        let authority = self.endpoint.authority();

        let result = retry_until(
            policy,
            || {
                let authority = authority.clone();
                async move { TcpStream::connect(&*authority).await }
            },
            |e| tracing::debug!(backend = %authority, error = %e, "Reachability probe failed"),
        )
        .await;

        match result {
            Ok(_) => {
                tracing::info!(backend = %self.endpoint, "Backend accepts TCP connections");
                true
            }
            Err(e) => {
                tracing::warn!(backend = %self.endpoint, error = %e, "Reachability wait gave up");
                false
            }
        }
    }

    /// GET the backend root repeatedly until a response arrives or the
    /// pre-warm budget is exhausted.
    async fn prewarm(&self) -> bool {
        let policy = RetryPolicy {
            per_attempt: self.config.prewarm.per_try(),
            delay: self.config.retry_delay(),
            budget: self.config.prewarm.total_budget(),
        };
        let url = self.endpoint.root_url();
        tracing::info!(url = %url, "Pre-warming backend UI");

        let result = retry_until(
            policy,
            || self.fetch_root(),
            |e| tracing::debug!(error = %e, "Pre-warm attempt failed"),
        )
        .await;

        match result {
            Ok((status, bytes)) => {
                tracing::info!(status = %status, bytes, "Pre-warm got a response");
                true
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Pre-warm budget exhausted");
                false
            }
        }
    }

    /// One pre-warm GET; success is any response from the backend, with the
    /// body drained (capped) so the backend actually serves bytes.
    async fn fetch_root(&self) -> Result<(axum::http::StatusCode, usize), String> {
        let request = Request::builder()
            .method("GET")
            .uri(self.endpoint.root_url())
            .header("user-agent", "uigate-prewarm/1.0")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = self.client.request(request).await.map_err(|e| e.to_string())?;
        let status = response.status();

        // A partial or over-cap body read still counts: the backend only
        // needs to have produced bytes.
        let bytes = axum::body::to_bytes(Body::new(response.into_body()), 1024 * 1024)
            .await
            .map(|b| b.len())
            .unwrap_or(0);

        Ok((status, bytes))
    }

    /// One tick of the continuous loop: a single timed connect, restoring
    /// `Ready` on success (a required-but-failed pre-warm is retried first).
    async fn probe_and_restore(&self) {
        let connect = TcpStream::connect(self.endpoint.authority());
        let reachable = time::timeout(self.config.connect_attempt_timeout(), connect)
            .await
            .map(|r| r.is_ok())
            .unwrap_or(false);

        if !reachable {
            tracing::debug!(backend = %self.endpoint, "Backend still unreachable");
            return;
        }

        if self.state.get() == ReadinessState::Degraded && self.config.prewarm.required {
            match time::timeout(self.config.prewarm.per_try(), self.fetch_root()).await {
                Ok(Ok((status, bytes))) => {
                    tracing::info!(status = %status, bytes, "Deferred pre-warm succeeded");
                    self.state.set(ReadinessState::Ready);
                }
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "Deferred pre-warm attempt failed")
                }
                Err(_) => tracing::debug!("Deferred pre-warm attempt timed out"),
            }
            return;
        }

        self.state.set(ReadinessState::Ready);
    }
}
