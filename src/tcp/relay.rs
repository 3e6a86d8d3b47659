//! Raw duplex relay (TCP forwarding mode).
//!
//! # Responsibilities
//! - Accept clients and open one backend connection per session
//! - Pump bytes both directions concurrently in fixed-size chunks
//! - End the session when either direction ends; cancel the other flow
//!   instead of letting it block forever
//!
//! # Design Decisions
//! - Fast fail: a refused backend connect closes the client with no bytes
//! - First-to-finish wins models real half-close behavior; a leaked half
//!   of a duplex session is a correctness bug
//! - Each session owns its transports and buffer exclusively; the only
//!   shared state is the readiness cell

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;

use crate::config::{BackendEndpoint, ProxyConfig};
use crate::lifecycle::Shutdown;
use crate::net::{ConnectionTracker, Listener, SessionId};
use crate::readiness::{ReadinessState, SharedReadiness};

/// Copy chunk size for each directional pump.
const CHUNK_SIZE: usize = 64 * 1024;

/// Byte-for-byte bidirectional relay, no HTTP semantics.
pub struct TcpRelay {
    endpoint: BackendEndpoint,
    readiness: SharedReadiness,
    connect_timeout: Duration,
    drain: Duration,
}

impl TcpRelay {
    pub fn new(config: &ProxyConfig, endpoint: BackendEndpoint, readiness: SharedReadiness) -> Self {
        Self {
            endpoint,
            readiness,
            connect_timeout: config.timeouts.connect(),
            drain: config.shutdown.drain(),
        }
    }

    /// Accept loop: one task per session, never blocking on any single
    /// session's lifetime. Exits on shutdown, then drains with a deadline.
    pub async fn run(self, listener: Listener, shutdown: &Shutdown) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, backend = %self.endpoint, "TCP relay serving");
        }

        let tracker = ConnectionTracker::new();
        let mut shutdown_rx = shutdown.subscribe();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((client, peer, permit)) => {
                            let guard = tracker.track();
                            let endpoint = self.endpoint.clone();
                            let readiness = self.readiness.clone();
                            let connect_timeout = self.connect_timeout;

                            tokio::spawn(async move {
                                let _permit = permit;
                                let session = guard.id();
                                tracing::debug!(session_id = %session, peer_addr = %peer, "Session opened");
                                relay_session(client, endpoint, readiness, connect_timeout, session).await;
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Accept failed");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("TCP relay received shutdown signal, closing listener");
                    break;
                }
            }
        }

        // Listener dropped here: no new sessions. In-flight sessions get
        // the drain deadline, then the process moves on regardless.
        drop(listener);
        if time::timeout(self.drain, tracker.wait_idle()).await.is_err() {
            tracing::warn!(
                active = tracker.active_count(),
                drain_secs = self.drain.as_secs(),
                "Drain deadline exceeded; abandoning remaining sessions"
            );
        }
        tracing::info!("TCP relay stopped");
    }
}

/// One proxied session: readiness check, timed backend connect, then two
/// concurrent pumps raced against each other.
async fn relay_session(
    mut client: TcpStream,
    endpoint: BackendEndpoint,
    readiness: SharedReadiness,
    connect_timeout: Duration,
    session: SessionId,
) {
    let state = readiness.get();
    if state != ReadinessState::Ready {
        tracing::debug!(session_id = %session, state = %state, "Session dropped while gated");
        close_client(client, session).await;
        return;
    }

    let connect = TcpStream::connect(endpoint.authority());
    let mut backend = match time::timeout(connect_timeout, connect).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            tracing::warn!(session_id = %session, backend = %endpoint, error = %e, "Backend connect failed");
            readiness.set(ReadinessState::NotReady);
            close_client(client, session).await;
            return;
        }
        Err(_) => {
            tracing::warn!(session_id = %session, backend = %endpoint, "Backend connect timed out");
            readiness.set(ReadinessState::NotReady);
            close_client(client, session).await;
            return;
        }
    };

    let (mut client_read, mut client_write) = client.split();
    let (mut backend_read, mut backend_write) = backend.split();

    // First flow to end (EOF or error) wins; the select drops the other
    // pump's pending read/write, and both transports close on return.
    tokio::select! {
        result = pump(&mut client_read, &mut backend_write) => {
            log_flow(session, "client->backend", result);
        }
        result = pump(&mut backend_read, &mut client_write) => {
            log_flow(session, "backend->client", result);
        }
    }
}

/// Close a session that never reached the backend so the client observes a
/// clean EOF. Dropping the stream with unread input still buffered makes the
/// kernel send a reset instead of a FIN, so send the FIN first and discard
/// whatever the client already wrote.
async fn close_client(mut client: TcpStream, session: SessionId) {
    if let Err(e) = client.shutdown().await {
        tracing::debug!(session_id = %session, error = %e, "Client shutdown failed");
        return;
    }
    let mut scratch = [0u8; 1024];
    let drain = async {
        loop {
            match client.read(&mut scratch).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    };
    let _ = time::timeout(Duration::from_millis(250), drain).await;
}

fn log_flow(session: SessionId, direction: &str, result: std::io::Result<u64>) {
    match result {
        Ok(bytes) => {
            tracing::debug!(session_id = %session, direction, bytes, "Flow finished")
        }
        Err(e) => {
            tracing::debug!(session_id = %session, direction, error = %e, "Flow errored")
        }
    }
}

/// Copy until EOF or I/O error, then propagate the half-close by shutting
/// down the write side.
async fn pump<R, W>(reader: &mut R, writer: &mut W) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            writer.shutdown().await?;
            return Ok(total);
        }
        writer.write_all(&buf[..n]).await?;
        total += n as u64;
    }
}
