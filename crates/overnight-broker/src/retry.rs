//! Bounded retry for transient collaborator failures.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use overnight_core::error::{BrokerError, DataError};

/// Errors that can distinguish a retryable failure from a permanent one.
pub trait TransientError {
    fn is_transient(&self) -> bool;
}

impl TransientError for BrokerError {
    fn is_transient(&self) -> bool {
        BrokerError::is_transient(self)
    }
}

impl TransientError for DataError {
    fn is_transient(&self) -> bool {
        DataError::is_transient(self)
    }
}

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or exhausts the policy.
///
/// Transient failures are logged and retried after the policy delay;
/// permanent failures and the final transient failure are returned to the
/// caller unchanged.
pub async fn with_retry<T, E, F, Fut>(policy: RetryPolicy, what: &str, mut op: F) -> Result<T, E>
where
    E: TransientError + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                warn!(what, attempt, error = %err, "transient failure, retrying");
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, BrokerError> = with_retry(policy(3), "clock", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(BrokerError::Connection("refused".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, BrokerError> = with_retry(policy(5), "account", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(BrokerError::Authentication("bad key".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, BrokerError> = with_retry(policy(3), "bars", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(BrokerError::Connection("timeout".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
