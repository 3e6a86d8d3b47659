//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → bind listener → spawn monitor → serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → stop accepting → bounded drain → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Bind failure is fatal; everything after bind degrades gracefully
//! - Shutdown drain has a deadline: no unbounded "wait for last client"

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::StartupError;
