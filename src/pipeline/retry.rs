//! Declarative per-pipeline retry policy and the stage attempt loop.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::errors::StockflowError;

/// Retry policy attached to a pipeline definition at construction time.
///
/// On a transient stage failure the engine retries the same stage up to
/// `max_retries` times, waiting `delay` between attempts. Both scheduled and
/// sensor-triggered runs share the pipeline's single policy instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum retries after the initial attempt.
    pub max_retries: u32,
    /// Delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// Creates a retry policy.
    #[must_use]
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }

    /// Total attempts a stage may make: one initial plus `max_retries`.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Runs one stage under the policy, returning the final result and the
/// number of attempts made.
///
/// Only transient errors are retried; configuration, empty-input, and
/// malformed-record failures are terminal on the first attempt.
pub async fn execute_with_retry<T, F, Fut>(
    stage: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> (Result<T, StockflowError>, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StockflowError>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return (Ok(value), attempt),
            Err(e) if e.is_transient() && attempt < policy.max_attempts() => {
                tracing::warn!(
                    stage = %stage,
                    attempt,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %e,
                    "stage failed, retrying"
                );
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => return (Err(e), attempt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_max_attempts() {
        assert_eq!(RetryPolicy::none().max_attempts(), 1);
        assert_eq!(RetryPolicy::new(2, Duration::from_secs(1)).max_attempts(), 3);
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let (result, attempts) =
            execute_with_retry("extract", &policy, || async { Ok(42) }).await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn test_exhausts_retries_on_persistent_transient_failure() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let (result, attempts) = execute_with_retry("extract", &policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(StockflowError::transient("get", "unreachable")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_succeeds_on_second_attempt() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let (result, attempts) = execute_with_retry("extract", &policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(StockflowError::transient("get", "unreachable"))
                } else {
                    Ok("rows")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "rows");
        assert_eq!(attempts, 2);
    }

    #[tokio::test]
    async fn test_non_transient_error_is_not_retried() {
        let policy = RetryPolicy::new(5, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let (result, attempts) = execute_with_retry("aggregate", &policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(StockflowError::EmptyInput) }
        })
        .await;

        assert!(matches!(result, Err(StockflowError::EmptyInput)));
        assert_eq!(attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
