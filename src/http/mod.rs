//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router)
//!     → /health: fixed 200 "ok"
//!     → anything else: readiness gate → upstream relay
//!     → headers.rs (drop Host outbound, strip hop-by-hop inbound)
//!     → streamed back to the client
//! ```

pub mod headers;
pub mod server;

pub use server::HttpServer;
