//! uigate: readiness-gated reverse proxy for a slow-starting loopback
//! backend.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                   UIGATE                     │
//!                        │                                              │
//!   Client request       │  ┌──────────┐       ┌─────────────────────┐  │
//!   ────────────────────▶│  │ listener │──────▶│ forwarder           │  │
//!                        │  └──────────┘       │  http: gate + relay │  │
//!                        │                     │  tcp:  byte pumps   │  │
//!                        │                     └──────────┬──────────┘  │
//!                        │                               ▼              │
//!                        │                   ┌─────────────────────┐    │
//!   Client response      │                   │  backend endpoint   │◀───┼── loopback UI
//!   ◀────────────────────┼───────────────────│  (127.0.0.1:P)      │    │   server
//!                        │                   └─────────────────────┘    │
//!                        │                                              │
//!                        │  ┌────────────────────────────────────────┐  │
//!                        │  │ readiness monitor ──▶ shared state     │  │
//!                        │  │ (wait / pre-warm / probe loop)         │  │
//!                        │  └────────────────────────────────────────┘  │
//!                        │  ┌────────────────────────────────────────┐  │
//!                        │  │ config · resilience · lifecycle        │  │
//!                        │  └────────────────────────────────────────┘  │
//!                        └──────────────────────────────────────────────┘
//! ```
//!
//! The backend (an analytic-database UI started by an external process) is
//! slow to become reachable; uigate's job is to forward bytes correctly
//! while that backend may not exist yet, may disappear, and must never
//! make the caller wait indefinitely.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod readiness;
pub mod tcp;

// Cross-cutting concerns
pub mod lifecycle;
pub mod resilience;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use readiness::{ReadinessState, SharedReadiness};
