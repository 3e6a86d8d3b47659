//! Readiness subsystem.
//!
//! # Data Flow
//! ```text
//! Monitor (monitor.rs):
//!     wait for TCP reachability → pre-warm GET → publish state
//!     then: probe every interval while state ≠ Ready
//!
//! State cell (state.rs):
//!     NotReady / Ready / Degraded in one atomic cell
//!     readers: every forwarder, before any upstream work
//!     writers: the monitor, and forwarders on upstream connect failure
//! ```
//!
//! # Design Decisions
//! - A bounded-wait contract beats always forwarding: the proxy answers
//!   gated requests instantly instead of hanging the edge connection
//! - The monitor is the only component that promotes the state; forwarders
//!   only demote it

pub mod monitor;
pub mod state;

pub use monitor::ReadinessMonitor;
pub use state::{ReadinessState, SharedReadiness};
