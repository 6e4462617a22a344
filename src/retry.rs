//! Rate-limit retry wrapper for remote calls.
//!
//! The only place backoff logic lives. Every other component issues its
//! remote calls through [`Retrier::execute`] and stays unaware of retry.
//!
//! Behavior: a rate-limit-class failure sleeps and retries, doubling the
//! delay after every consecutive failure, with no jitter. Any other error —
//! and any success — passes through unchanged on the first attempt. By
//! default there is no retry cap: if the control plane throttles forever,
//! the caller blocks forever. Set [`RetryPolicy::max_attempts`] to bound it.

use crate::error::CfnError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Backoff configuration. The default reproduces the classic behavior:
/// 1 second initial delay, doubling, unbounded.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry; doubles after each consecutive
    /// rate-limit failure.
    pub base_delay: Duration,
    /// Give up and surface the rate-limit error after this many failed
    /// attempts. `None` retries indefinitely.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

/// Executes remote-call thunks, absorbing rate limiting.
#[derive(Debug, Clone, Default)]
pub struct Retrier {
    policy: RetryPolicy,
}

impl Retrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Invoke `op` until it returns something other than a rate-limit error.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> Result<T, CfnError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CfnError>>,
    {
        let mut delay = self.policy.base_delay;
        let mut failures: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_rate_limited() => {
                    failures += 1;
                    if let Some(max) = self.policy.max_attempts {
                        if failures >= max {
                            return Err(err);
                        }
                    }
                    debug!(delay_ms = delay.as_millis() as u64, "rate limited, backing off");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn rate_limited() -> CfnError {
        CfnError::Api {
            code: "RequestLimitExceeded".into(),
            message: "Rate exceeded".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_passes_through() {
        let retrier = Retrier::default();
        let result = retrier.execute(|| async { Ok::<_, CfnError>(7) }).await;
        assert_eq!(result.expect("success"), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_not_retried() {
        let retrier = Retrier::default();
        let calls = Cell::new(0u32);
        let result: Result<(), _> = retrier
            .execute(|| {
                calls.set(calls.get() + 1);
                async {
                    Err(CfnError::Api {
                        code: "ValidationError".into(),
                        message: "bad template".into(),
                    })
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_then_success() {
        let retrier = Retrier::default();
        let calls = Cell::new(0u32);
        let started = tokio::time::Instant::now();
        let result = retrier
            .execute(|| {
                let attempt = calls.get();
                calls.set(attempt + 1);
                async move {
                    if attempt == 0 {
                        Err(rate_limited())
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;
        assert_eq!(result.expect("should recover"), 1);
        assert_eq!(calls.get(), 2);
        // Must have slept through the full first backoff interval.
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles() {
        let retrier = Retrier::default();
        let calls = Cell::new(0u32);
        let started = tokio::time::Instant::now();
        let result = retrier
            .execute(|| {
                let attempt = calls.get();
                calls.set(attempt + 1);
                async move {
                    if attempt < 3 {
                        Err(rate_limited())
                    } else {
                        Ok(())
                    }
                }
            })
            .await;
        assert!(result.is_ok());
        // 1s + 2s + 4s of accumulated backoff.
        assert!(started.elapsed() >= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_policy_surfaces_rate_limit() {
        let retrier = Retrier::new(RetryPolicy {
            base_delay: Duration::from_millis(10),
            max_attempts: Some(3),
        });
        let calls = Cell::new(0u32);
        let result: Result<(), _> = retrier
            .execute(|| {
                calls.set(calls.get() + 1);
                async { Err(rate_limited()) }
            })
            .await;
        let err = result.expect_err("budget exhausted");
        assert!(err.is_rate_limited());
        assert_eq!(calls.get(), 3);
    }
}
