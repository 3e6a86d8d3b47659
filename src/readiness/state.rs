//! Shared readiness state.
//!
//! # States
//! - NotReady: backend endpoint not yet confirmed reachable; requests gated
//! - Ready: backend accepts connections; requests forwarded
//! - Degraded: backend reachable but pre-warm never completed while
//!   `prewarm.required` is set; requests stay gated
//!
//! # Read/write contract
//! Every inbound connection reads the state before forwarding begins.
//! Writers are the readiness monitor and any forwarder that observes an
//! upstream connect failure. Reads and writes go through one atomic cell,
//! so no reader can observe a torn value.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Tri-state backend readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadinessState {
    NotReady = 0,
    Ready = 1,
    Degraded = 2,
}

impl ReadinessState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ReadinessState::Ready,
            2 => ReadinessState::Degraded,
            _ => ReadinessState::NotReady,
        }
    }
}

impl std::fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReadinessState::NotReady => "not-ready",
            ReadinessState::Ready => "ready",
            ReadinessState::Degraded => "degraded",
        };
        f.write_str(name)
    }
}

/// Cloneable handle to the shared readiness cell.
///
/// Handed explicitly to every component that needs it; there is no ambient
/// global.
#[derive(Debug, Clone)]
pub struct SharedReadiness {
    cell: Arc<AtomicU8>,
}

impl SharedReadiness {
    /// Create a new cell, starting at `NotReady`.
    pub fn new() -> Self {
        Self {
            cell: Arc::new(AtomicU8::new(ReadinessState::NotReady as u8)),
        }
    }

    /// Current state.
    pub fn get(&self) -> ReadinessState {
        ReadinessState::from_u8(self.cell.load(Ordering::SeqCst))
    }

    /// True when requests may be forwarded.
    pub fn is_ready(&self) -> bool {
        self.get() == ReadinessState::Ready
    }

    /// Store a new state, logging the transition once if it changed.
    pub fn set(&self, next: ReadinessState) {
        let prev = ReadinessState::from_u8(self.cell.swap(next as u8, Ordering::SeqCst));
        if prev != next {
            tracing::info!(from = %prev, to = %next, "Readiness state changed");
        }
    }
}

impl Default for SharedReadiness {
    fn default() -> Self {
        Self::new()
    }
}
