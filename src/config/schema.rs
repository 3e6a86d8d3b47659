//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so a minimal (or absent) config file works.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the readiness-gated proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (external port, connection limit).
    pub listener: ListenerConfig,

    /// Backend endpoint the proxy forwards to.
    pub backend: BackendConfig,

    /// Forwarding strategy, selected once at startup.
    pub mode: ForwardMode,

    /// Upstream timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Readiness monitor settings.
    pub readiness: ReadinessConfig,

    /// Shutdown drain settings.
    pub shutdown: ShutdownConfig,
}

impl ProxyConfig {
    /// The backend endpoint, with the port defaulting to the listener port
    /// (the backend binds the same logical port on loopback).
    pub fn backend_endpoint(&self) -> BackendEndpoint {
        BackendEndpoint {
            host: self.backend.host.clone(),
            port: self.backend.port.unwrap_or(self.listener.port),
        }
    }
}

/// Immutable `(host, port)` pair identifying the loopback target.
/// Set once at startup; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEndpoint {
    pub host: String,
    pub port: u16,
}

impl BackendEndpoint {
    /// `host:port` form used for TCP connects and as an HTTP authority.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Root URL of the backend, used by the pre-warm fetch.
    pub fn root_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

impl std::fmt::Display for BackendEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// External port to listen on, bound on all interfaces.
    pub port: u16,

    /// Maximum concurrent connections in raw-TCP mode (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            max_connections: 100,
        }
    }
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend host. The backend is expected to bind loopback only.
    pub host: String,

    /// Backend port. `None` means "same as the listener port".
    pub port: Option<u16>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: None,
        }
    }
}

/// Forwarding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ForwardMode {
    /// Protocol-aware streaming proxy with readiness gating and synthetic
    /// 503/502/504 responses.
    #[default]
    Http,
    /// Pure byte relay, no HTTP semantics.
    Tcp,
}

/// Upstream timeout configuration.
///
/// Connect and read phases have separate deadlines; total request duration
/// is deliberately unbounded to support long-lived streaming responses.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for opening the upstream connection.
    pub connect_secs: u64,

    /// Deadline for each read from the upstream (headers, then body chunks).
    pub read_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            read_secs: 60,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }
}

/// Readiness monitor settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Total budget for the initial "wait until the backend accepts a TCP
    /// connection" phase.
    pub wait_timeout_secs: u64,

    /// Per-attempt connect timeout while probing.
    pub connect_attempt_timeout_secs: u64,

    /// Delay between probe attempts during the initial wait.
    pub retry_delay_ms: u64,

    /// Interval of the continuous monitor loop.
    pub probe_interval_ms: u64,

    /// Value of the `Retry-After` header on gated 503 responses.
    pub retry_after_secs: u64,

    /// Pre-warm fetch settings.
    pub prewarm: PrewarmConfig,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            wait_timeout_secs: 45,
            connect_attempt_timeout_secs: 1,
            retry_delay_ms: 500,
            probe_interval_ms: 1000,
            retry_after_secs: 5,
            prewarm: PrewarmConfig::default(),
        }
    }
}

impl ReadinessConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn connect_attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_attempt_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }
}

/// Pre-warm fetch settings.
///
/// The pre-warm GET forces the backend to finish any lazy remote-asset
/// fetch before external traffic arrives.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PrewarmConfig {
    /// Per-attempt timeout for one pre-warm GET.
    pub per_try_secs: u64,

    /// Total budget across all pre-warm attempts.
    pub total_budget_secs: u64,

    /// When true, a failed pre-warm holds the proxy at `Degraded` (gated)
    /// instead of serving best-effort traffic.
    pub required: bool,
}

impl Default for PrewarmConfig {
    fn default() -> Self {
        Self {
            per_try_secs: 3,
            total_budget_secs: 30,
            required: false,
        }
    }
}

impl PrewarmConfig {
    pub fn per_try(&self) -> Duration {
        Duration::from_secs(self.per_try_secs)
    }

    pub fn total_budget(&self) -> Duration {
        Duration::from_secs(self.total_budget_secs)
    }
}

/// Shutdown drain settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long in-flight sessions may run after the shutdown signal before
    /// the serve loop is force-closed.
    pub drain_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { drain_secs: 10 }
    }
}

impl ShutdownConfig {
    pub fn drain(&self) -> Duration {
        Duration::from_secs(self.drain_secs)
    }
}
