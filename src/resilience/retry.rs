//! Retry-until-deadline utility.
//!
//! One reusable loop backs both readiness phases (the TCP reachability wait
//! and the pre-warm fetch) instead of each duplicating its own
//! sleep/timeout bookkeeping.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};

/// Parameters of a bounded retry loop.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Timeout applied to each individual attempt.
    pub per_attempt: Duration,

    /// Delay between attempts.
    pub delay: Duration,

    /// Total wall-clock budget across all attempts.
    pub budget: Duration,
}

/// The budget elapsed without a successful attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("retry budget of {budget:?} exhausted after {attempts} attempts")]
pub struct RetryExhausted {
    pub attempts: u32,
    pub budget: Duration,
}

/// Run `op` until it succeeds or the budget elapses.
///
/// Each attempt is capped at `per_attempt`; failed attempts are separated
/// by `delay`. Attempt errors are reported to `on_error` (typically a
/// tracing call) and otherwise discarded; the caller only learns whether
/// the loop as a whole succeeded.
pub async fn retry_until<F, Fut, T, E>(
    policy: RetryPolicy,
    mut op: F,
    mut on_error: impl FnMut(&str),
) -> Result<T, RetryExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let deadline = Instant::now() + policy.budget;
    let mut attempts = 0u32;

    while Instant::now() < deadline {
        attempts += 1;
        match timeout(policy.per_attempt, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => on_error(&e.to_string()),
            Err(_) => on_error("attempt timed out"),
        }

        // Do not sleep past the deadline just to fail later.
        let now = Instant::now();
        if now + policy.delay >= deadline {
            break;
        }
        sleep(policy.delay).await;
    }

    Err(RetryExhausted {
        attempts,
        budget: policy.budget,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            per_attempt: Duration::from_millis(50),
            delay: Duration::from_millis(10),
            budget: Duration::from_millis(300),
        }
    }

    #[tokio::test]
    async fn first_success_wins() {
        let result: Result<u32, RetryExhausted> =
            retry_until(quick_policy(), || async { Ok::<_, std::io::Error>(7) }, |_| {}).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry_until(
            quick_policy(),
            move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(std::io::Error::other("not yet"))
                    } else {
                        Ok(42)
                    }
                }
            },
            |_| {},
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn budget_exhaustion_reports_attempts() {
        let result: Result<(), _> = retry_until(
            quick_policy(),
            || async { Err::<(), _>(std::io::Error::other("down")) },
            |_| {},
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.attempts >= 1);
        assert_eq!(err.budget, Duration::from_millis(300));
    }

    #[tokio::test]
    async fn per_attempt_timeout_cancels_slow_op() {
        let policy = RetryPolicy {
            per_attempt: Duration::from_millis(20),
            delay: Duration::from_millis(5),
            budget: Duration::from_millis(100),
        };

        let result: Result<(), _> = retry_until(
            policy,
            || async {
                sleep(Duration::from_secs(5)).await;
                Ok::<(), std::io::Error>(())
            },
            |_| {},
        )
        .await;

        assert!(result.is_err());
    }
}
