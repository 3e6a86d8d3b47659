//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, budgets consistent)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::ProxyConfig;

/// A single semantic violation found in a config.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.port must be non-zero")]
    ZeroListenerPort,

    #[error("listener.max_connections must be at least 1")]
    ZeroMaxConnections,

    #[error("backend.host must not be empty")]
    EmptyBackendHost,

    #[error("timeouts.{0}_secs must be non-zero")]
    ZeroTimeout(&'static str),

    #[error("readiness.{0} must be non-zero")]
    ZeroReadinessInterval(&'static str),

    #[error("readiness.prewarm.total_budget_secs must cover at least one attempt")]
    PrewarmBudgetTooSmall,

    #[error("timeouts.connect_secs must not exceed timeouts.read_secs")]
    ConnectExceedsRead,
}

/// Check a deserialized config for semantic problems, collecting every
/// violation rather than stopping at the first.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroListenerPort);
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }
    if config.backend.host.trim().is_empty() {
        errors.push(ValidationError::EmptyBackendHost);
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect"));
    }
    if config.timeouts.read_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("read"));
    }
    // The read deadline wraps the whole upstream exchange; a connect
    // allowance beyond it would let connect-phase hangs masquerade as
    // post-connect slowness.
    if config.timeouts.connect_secs > config.timeouts.read_secs {
        errors.push(ValidationError::ConnectExceedsRead);
    }
    if config.readiness.connect_attempt_timeout_secs == 0 {
        errors.push(ValidationError::ZeroReadinessInterval(
            "connect_attempt_timeout_secs",
        ));
    }
    if config.readiness.probe_interval_ms == 0 {
        errors.push(ValidationError::ZeroReadinessInterval("probe_interval_ms"));
    }
    if config.readiness.prewarm.per_try_secs == 0 {
        errors.push(ValidationError::ZeroReadinessInterval("prewarm.per_try_secs"));
    }
    if config.readiness.prewarm.total_budget_secs < config.readiness.prewarm.per_try_secs {
        errors.push(ValidationError::PrewarmBudgetTooSmall);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
