//! Retry-with-exponential-backoff wrapper for external provider calls.

use std::time::Duration;

use crate::error::LlmError;

/// Backoff schedule for transient provider failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt after `attempt` (1-based) failed:
    /// `initial_delay * 2^(attempt - 1)`.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.initial_delay * (1 << (attempt - 1))
    }
}

/// Invoke `operation`, retrying transient failures with exponential backoff.
///
/// Non-transient errors re-raise immediately. A transient error on the final
/// attempt becomes [`LlmError::RetriesExhausted`]. The wrapper has no side
/// effects beyond timing and re-invocation.
///
/// # Errors
///
/// Returns the operation's own error when it is not transient, or
/// `RetriesExhausted` when every attempt failed transiently.
pub async fn retry<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    for attempt in 1..=policy.max_attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "transient provider error: {e}, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) if e.is_transient() => {
                return Err(LlmError::RetriesExhausted {
                    attempts: policy.max_attempts,
                });
            }
            Err(e) => return Err(e),
        }
    }

    Err(LlmError::RetriesExhausted {
        attempts: policy.max_attempts,
    })
}
