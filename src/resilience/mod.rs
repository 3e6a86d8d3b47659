//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Readiness monitor:
//!     → retry.rs (bounded retry loops for reachability wait and pre-warm)
//!
//! Forwarders:
//!     → tokio::time::timeout around connect and read phases
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - No per-request retries; retry loops exist only in the readiness monitor
//! - One retry utility shared by all callers, parameterized by per-attempt
//!   timeout, inter-attempt delay, and total budget

pub mod retry;

pub use retry::{retry_until, RetryExhausted, RetryPolicy};
