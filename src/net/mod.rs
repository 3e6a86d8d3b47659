//! Network foundation subsystem.
//!
//! # Data Flow
//! ```text
//! listener.rs: bind 0.0.0.0:P → accept (semaphore-bounded) → session task
//! connection.rs: session guard held per task → drained at shutdown
//! ```

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionTracker, SessionId};
pub use listener::{Listener, ListenerError};
