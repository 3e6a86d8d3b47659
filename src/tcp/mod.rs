//! Raw TCP forwarding subsystem.
//!
//! Alternative deployment mode: a pure byte relay on the same port/target
//! pair, with the same readiness gate and shutdown discipline as the HTTP
//! mode but no protocol awareness.

pub mod relay;

pub use relay::TcpRelay;
