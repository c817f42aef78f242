//! Bounded retry loop with exponential backoff
//!
//! Every outbound call goes through [`ResilientClient::invoke`], which runs
//! the call, classifies failures, and sleeps between attempts.

use crate::config::RetryConfig;
use crate::remote::{ErrorClass, InvokeError, RemoteError};
use std::future::Future;
use std::time::Duration;

/// Backoff schedule and attempt bound for remote operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,

    /// Delay before the first retry; doubled for each later retry
    pub initial_delay: Duration,

    /// Upper bound on any computed delay; server hints are honored as sent
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    /// Computes the delay after the failed attempt with zero-based index `attempt`
    ///
    /// A server-provided hint is used as given. Without one the schedule is
    /// `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        if let Some(hint) = hint {
            return hint;
        }
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }
}

/// Per-call retry bookkeeping; lives for one `invoke`
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    /// Attempts made so far
    pub attempt: u32,

    /// Class of the most recent failure
    pub last_class: Option<ErrorClass>,

    /// Delay computed after the most recent failure
    pub delay: Duration,
}

/// Wraps remote calls with retry, backoff and rate-limit awareness
#[derive(Debug, Clone, Default)]
pub struct ResilientClient {
    policy: RetryPolicy,
}

impl ResilientClient {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Runs `call` until it succeeds, fails non-retryably, or attempts run out
    ///
    /// # Arguments
    ///
    /// * `operation` - Human-readable name used in logs and errors
    /// * `call` - Produces one attempt of the remote operation
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The response of the first successful attempt, unchanged
    /// * `Err(InvokeError::NonRetryable)` - A final failure, not retried
    /// * `Err(InvokeError::RetriesExhausted)` - Every attempt failed retryably
    pub async fn invoke<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, InvokeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut state = RetryState::default();

        loop {
            state.attempt += 1;

            let error = match call().await {
                Ok(value) => {
                    tracing::debug!(operation, attempt = state.attempt, "remote call succeeded");
                    return Ok(value);
                }
                Err(error) => error,
            };

            let class = error.class();
            state.last_class = Some(class);

            if !class.is_retryable() {
                tracing::error!(
                    operation,
                    attempt = state.attempt,
                    class = %class,
                    error = %error,
                    "remote call failed, not retrying"
                );
                return Err(InvokeError::NonRetryable {
                    operation: operation.to_string(),
                    source: error,
                });
            }

            if state.attempt >= self.policy.max_attempts {
                tracing::error!(
                    operation,
                    attempts = state.attempt,
                    class = %class,
                    error = %error,
                    "remote call failed, retries exhausted"
                );
                return Err(InvokeError::RetriesExhausted {
                    operation: operation.to_string(),
                    attempts: state.attempt,
                    source: error,
                });
            }

            state.delay = self
                .policy
                .delay_for(state.attempt - 1, error.retry_after());

            tracing::warn!(
                operation,
                attempt = state.attempt,
                class = %class,
                delay_ms = state.delay.as_millis() as u64,
                error = %error,
                "remote call failed, retry scheduled"
            );

            tokio::time::sleep(state.delay).await;
        }
    }
}
