//! Shared utilities for integration testing: hand-rolled mock backends and
//! a proxy harness with fast readiness settings.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use uigate::config::ProxyConfig;
use uigate::lifecycle::{startup, Shutdown};

/// Proxy config tuned for tests: short readiness budgets, fast probe loop.
pub fn test_config(proxy_port: u16, backend_port: u16) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.port = proxy_port;
    config.backend.port = Some(backend_port);
    config.readiness.wait_timeout_secs = 1;
    config.readiness.connect_attempt_timeout_secs = 1;
    config.readiness.retry_delay_ms = 50;
    config.readiness.probe_interval_ms = 100;
    config.readiness.prewarm.per_try_secs = 1;
    config.readiness.prewarm.total_budget_secs = 1;
    config.timeouts.connect_secs = 1;
    config.timeouts.read_secs = 2;
    config.shutdown.drain_secs = 1;
    config
}

/// Spawn the full proxy (listener + monitor) in-process.
pub async fn start_proxy(config: ProxyConfig) -> Shutdown {
    let shutdown = Shutdown::new();
    let handle = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = startup::run(config, &handle).await {
            panic!("proxy failed to start: {e}");
        }
    });
    // Give the listener a moment to bind.
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown
}

/// A parsed mock-backend request: method, path, body bytes.
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

/// Read one HTTP/1.1 request off the socket (head + content-length body).
pub async fn read_http_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return None,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
        }
    };

    let head = String::from_utf8_lossy(&raw[..head_end]).to_string();
    let mut lines = head.lines();
    let request_line = lines.next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = raw[head_end..].to_vec();
    while body.len() < content_length {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => body.extend_from_slice(&buf[..n]),
        }
    }
    body.truncate(content_length);

    Some(MockRequest { method, path, body })
}

async fn write_response(socket: &mut TcpStream, status: &str, extra_headers: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n",
        status,
        body.len(),
        extra_headers
    );
    let _ = socket.write_all(head.as_bytes()).await;
    let _ = socket.write_all(body).await;
    let _ = socket.shutdown().await;
}

/// Backend that answers every request with `200 OK` and a fixed body.
pub async fn start_ok_backend(addr: SocketAddr, body: &'static str) -> JoinHandle<()> {
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                if read_http_request(&mut socket).await.is_some() {
                    write_response(&mut socket, "200 OK", "", body.as_bytes()).await;
                }
            });
        }
    })
}

/// Backend that echoes the request body; `/slow` paths stall before
/// responding.
pub async fn start_echo_backend(addr: SocketAddr) -> JoinHandle<()> {
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                if let Some(request) = read_http_request(&mut socket).await {
                    if request.path.starts_with("/slow") {
                        tokio::time::sleep(Duration::from_secs(10)).await;
                    }
                    let body = if request.body.is_empty() {
                        b"OK".to_vec()
                    } else {
                        request.body
                    };
                    write_response(&mut socket, "200 OK", "", &body).await;
                }
            });
        }
    })
}

/// Backend whose responses carry hop-by-hop headers the proxy must strip,
/// plus a custom header it must keep.
pub async fn start_hop_header_backend(addr: SocketAddr) -> JoinHandle<()> {
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                if read_http_request(&mut socket).await.is_some() {
                    let extra = "Keep-Alive: timeout=5\r\n\
                                 Proxy-Authenticate: Basic realm=\"mock\"\r\n\
                                 Upgrade: h2c\r\n\
                                 Trailers: x-checksum\r\n\
                                 X-Upstream-Custom: keep-me\r\n";
                    write_response(&mut socket, "200 OK", extra, b"filtered").await;
                }
            });
        }
    })
}

/// Backend that sends headers plus a body prefix, then closes mid-stream.
/// No Content-Length: the body is EOF-terminated, so the client sees the
/// prefix and a clean end of stream.
pub async fn start_partial_backend(addr: SocketAddr, prefix: &'static str) -> JoinHandle<()> {
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                if read_http_request(&mut socket).await.is_some() {
                    let head = "HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n";
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(prefix.as_bytes()).await;
                    let _ = socket.flush().await;
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    drop(socket);
                }
            });
        }
    })
}

/// Raw TCP backend that echoes bytes until the client half-closes.
pub async fn start_tcp_echo_backend(addr: SocketAddr) -> JoinHandle<()> {
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if socket.write_all(&buf[..n]).await.is_err() {
                                break;
                            }
                        }
                    }
                }
                let _ = socket.shutdown().await;
            });
        }
    })
}

/// Raw TCP backend that writes a fixed burst, half-closes its write side,
/// and never reads the client's data to completion.
pub async fn start_tcp_burst_backend(addr: SocketAddr, burst: Vec<u8>) -> JoinHandle<()> {
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let burst = burst.clone();
            tokio::spawn(async move {
                let _ = socket.write_all(&burst).await;
                let _ = socket.shutdown().await;
                tokio::time::sleep(Duration::from_secs(5)).await;
            });
        }
    })
}

/// Poll `url` through the given client until it stops answering 503 or the
/// deadline passes. Returns the final status observed.
pub async fn wait_until_ungated(client: &reqwest::Client, url: &str, deadline: Duration) -> u16 {
    let start = tokio::time::Instant::now();
    let mut last = 0u16;
    while start.elapsed() < deadline {
        if let Ok(response) = client.get(url).send().await {
            last = response.status().as_u16();
            if last != 503 {
                return last;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    last
}

/// Test HTTP client without pooling, so closed mock connections are never
/// reused across requests.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
