//! Bounded retry with exponential backoff under a wall-clock ceiling.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::error::ApiError;

/// Retry ceilings and backoff shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Ceiling for resetting one batch of parameters.
    pub reset_timeout: Duration,
    /// Ceiling for deleting a group that still has pending changes.
    pub delete_timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            reset_timeout: Duration::from_secs(30),
            delete_timeout: Duration::from_secs(3 * 60),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-indexed).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_backoff)
    }
}

#[derive(Debug, Error)]
pub enum RetryError {
    /// A non-retryable error; returned on first sight.
    #[error(transparent)]
    Fatal(ApiError),

    /// The ceiling elapsed while a call was still in flight.
    #[error("timed out after {ceiling:?} waiting for the call to return")]
    TimedOut { ceiling: Duration },

    /// Every attempt within the ceiling failed with a retryable error.
    #[error("still failing after {ceiling:?}: {last}")]
    Exhausted { ceiling: Duration, last: ApiError },
}

impl RetryError {
    /// Whether the failure looks like a stalled call rather than a refusal:
    /// the in-flight deadline, or a transport/server fault surfaced by the SDK.
    /// Running out of retryable errors does not count.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::TimedOut { .. } => true,
            Self::Fatal(err) => err.is_timeout(),
            Self::Exhausted { .. } => false,
        }
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Fatal(err) | Self::Exhausted { last: err, .. } => Some(err),
            Self::TimedOut { .. } => None,
        }
    }
}

/// Run `operation` until it succeeds, fails with an error `is_retryable`
/// rejects, or `ceiling` elapses.
///
/// An attempt still running at the ceiling is abandoned and reported as
/// [`RetryError::TimedOut`].
pub async fn with_deadline<T, F, Fut, P>(
    policy: &RetryPolicy,
    ceiling: Duration,
    is_retryable: P,
    mut operation: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    P: Fn(&ApiError) -> bool,
{
    let deadline = Instant::now() + ceiling;
    let mut attempt = 0;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let err = match tokio::time::timeout(remaining, operation()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => err,
            Err(_) => return Err(RetryError::TimedOut { ceiling }),
        };

        if !is_retryable(&err) {
            return Err(RetryError::Fatal(err));
        }

        let delay = policy.backoff(attempt);
        if Instant::now() + delay >= deadline {
            return Err(RetryError::Exhausted { ceiling, last: err });
        }

        attempt += 1;
        tracing::debug!(
            operation = err.operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "retryable error, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
