//! Bounded retry with exponential backoff
//!
//! Every remote call in the pipeline composes with `with_retry` instead of
//! carrying its own backoff loop. The operation runs up to
//! `settings.max_attempts` times; the delay between attempts starts at
//! `settings.initial_delay` and doubles after each failure. The last failure
//! is propagated once the ceiling is reached.

use std::future::Future;
use std::time::Duration;

use crate::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY_MS};
use crate::error::{TallyError, TallyResult};
use crate::logger::{self, LogTag};

/// Retry parameters shared by all remote operations in a run
#[derive(Debug, Clone, Copy)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

/// Run `operation` with bounded retry and exponential backoff.
///
/// Each failed attempt is reported (attempt number, ceiling, reason) before
/// the wait. Permanent errors are surfaced immediately; only recoverable
/// failures are retried. On exhaustion the last error is returned, never
/// swallowed.
pub async fn with_retry<T, F, Fut>(
    label: &str,
    settings: &RetrySettings,
    mut operation: F,
) -> TallyResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TallyResult<T>>,
{
    let mut delay = settings.initial_delay;
    let mut last_error: Option<TallyError> = None;

    for attempt in 1..=settings.max_attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                logger::warning(
                    LogTag::Rpc,
                    &format!(
                        "{} failed (attempt {}/{}): {}",
                        label, attempt, settings.max_attempts, e
                    ),
                );

                if !e.is_recoverable() {
                    return Err(e);
                }
                last_error = Some(e);

                if attempt < settings.max_attempts {
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| TallyError::Config(format!("{}: retry ceiling of zero attempts", label))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_settings(max_attempts: u32) -> RetrySettings {
        RetrySettings {
            max_attempts,
            initial_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_two_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry("flaky op", &fast_settings(3), || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt < 3 {
                    Err(TallyError::Rpc("temporarily unavailable".to_string()))
                } else {
                    Ok(42u64)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_propagates_last_error_on_exhaustion() {
        let calls = AtomicU32::new(0);
        let result: TallyResult<u64> = with_retry("doomed op", &fast_settings(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TallyError::Rpc("node is down".to_string())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(TallyError::Rpc(msg)) => assert_eq!(msg, "node is down"),
            other => panic!("expected Rpc error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: TallyResult<u64> = with_retry("bad input", &fast_settings(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TallyError::Parse("malformed response".to_string())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(TallyError::Parse(_))));
    }
}
