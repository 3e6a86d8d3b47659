//! HTTP streaming proxy.
//!
//! # Responsibilities
//! - Serve `GET /health` independently of backend state
//! - Gate every other request on the readiness state (instant 503 with
//!   `Retry-After` while not ready; no upstream connect is attempted)
//! - Relay request method, path, and headers (minus `Host`) to the backend
//! - Stream the backend response chunk by chunk, hop-by-hop headers removed
//! - Map upstream failures: connect/generic errors → 502 plus a readiness
//!   downgrade; slow reads after connect → 504, readiness untouched

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::future::IntoFuture;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time;
use tower_http::{timeout::TimeoutBody, trace::TraceLayer};

use crate::config::{BackendEndpoint, ProxyConfig};
use crate::http::headers::{forwardable_request_headers, strip_hop_by_hop};
use crate::lifecycle::Shutdown;
use crate::readiness::{ReadinessState, SharedReadiness};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub endpoint: BackendEndpoint,
    pub readiness: SharedReadiness,
    pub client: Client<HttpConnector, Body>,
    pub read_timeout: Duration,
    pub retry_after_secs: u64,
}

/// HTTP server for the readiness-gated proxy.
pub struct HttpServer {
    router: Router,
    drain: Duration,
}

impl HttpServer {
    /// Create the server: one shared upstream client (connect timeout set
    /// on the connector) and the gated router.
    pub fn new(config: &ProxyConfig, endpoint: BackendEndpoint, readiness: SharedReadiness) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.timeouts.connect()));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState {
            endpoint,
            readiness,
            client,
            read_timeout: config.timeouts.read(),
            retry_after_secs: config.readiness.retry_after_secs,
        };

        Self {
            router: Self::build_router(state),
            drain: config.shutdown.drain(),
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until the shutdown signal, then drain in-flight sessions for
    /// at most the configured deadline before force-closing.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP proxy serving");

        let mut graceful_rx = shutdown.subscribe();
        let mut force_rx = shutdown.subscribe();
        let drain = self.drain;

        let serve = axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = graceful_rx.recv().await;
            })
            .into_future();

        tokio::select! {
            result = serve => result?,
            _ = async {
                let _ = force_rx.recv().await;
                time::sleep(drain).await;
            } => {
                tracing::warn!(
                    drain_secs = drain.as_secs(),
                    "Drain deadline exceeded; force-closing in-flight sessions"
                );
            }
        }

        tracing::info!("HTTP proxy stopped");
        Ok(())
    }
}

/// Fixed liveness answer; says nothing about the backend.
async fn health_handler() -> &'static str {
    "ok"
}

/// Main proxy handler: gate, relay, stream.
async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let readiness = state.readiness.get();
    if readiness != ReadinessState::Ready {
        tracing::debug!(state = %readiness, path = %request.uri().path(), "Request gated");
        return not_ready_response(state.retry_after_secs);
    }

    let (parts, body) = request.into_parts();

    // The exchange is pass-through, but the request body is read in full
    // before contacting the backend (it is not replayed or retried).
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // Client went away or sent a broken body; nothing to relay.
            tracing::debug!(error = %e, "Failed to read request body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = format!("http://{}{}", state.endpoint.authority(), path_and_query);

    let mut upstream_request = match axum::http::Request::builder()
        .method(parts.method.clone())
        .uri(&target)
        .body(Body::from(body_bytes))
    {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!(target = %target, error = %e, "Failed to build upstream request");
            return bad_gateway_response(&e.to_string());
        }
    };
    *upstream_request.headers_mut() = forwardable_request_headers(&parts.headers);

    tracing::debug!(method = %parts.method, target = %target, "Proxying request");

    // The read timeout bounds the wait for response headers here, and each
    // body chunk below; total duration stays unbounded for long streams.
    match time::timeout(state.read_timeout, state.client.request(upstream_request)).await {
        Err(_) => {
            tracing::warn!(target = %target, "Backend timed out before sending headers");
            gateway_timeout_response()
        }
        Ok(Err(e)) => {
            tracing::warn!(target = %target, error = %e, "Upstream request failed");
            // Fast-fail subsequent requests instead of repeatedly paying
            // the connect timeout; the monitor restores Ready on its own.
            state.readiness.set(ReadinessState::NotReady);
            bad_gateway_response(&e.to_string())
        }
        Ok(Ok(upstream)) => {
            let (mut parts, upstream_body) = upstream.into_parts();
            strip_hop_by_hop(&mut parts.headers);

            // Stream as chunks arrive; redirects and all non-proxy status
            // codes are relayed verbatim. A mid-stream read timeout ends
            // the stream; no 5xx once headers are out.
            let body = Body::new(TimeoutBody::new(state.read_timeout, upstream_body));
            Response::from_parts(parts, body)
        }
    }
}

fn not_ready_response(retry_after_secs: u64) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::RETRY_AFTER, HeaderValue::from(retry_after_secs))],
        "Backend UI is not ready yet; retry shortly.\n",
    )
        .into_response()
}

fn bad_gateway_response(detail: &str) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        format!("Bad gateway: {detail}\n"),
    )
        .into_response()
}

fn gateway_timeout_response() -> Response {
    (
        StatusCode::GATEWAY_TIMEOUT,
        "Gateway timeout while contacting backend UI.\n",
    )
        .into_response()
}
