//! Bounded retry for transient API conditions
//!
//! Cloud SQL rejects reads with 409 while another operation runs against the
//! instance. Those, and the common transient statuses, are retried with
//! exponential backoff until the read timeout elapses.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default first retry delay in milliseconds
const DEFAULT_INITIAL_DELAY_MS: u64 = 500;

/// Default ceiling for a single backoff sleep in seconds
const DEFAULT_MAX_DELAY_SECS: u64 = 10;

/// Retry policy for one read
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Overall budget; once spent the last transient error becomes terminal
    pub timeout: Duration,
    /// Delay before the first retry (doubled on each subsequent retry)
    pub initial_delay: Duration,
    /// Upper bound on a single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Policy with the default backoff and the given overall timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
        }
    }

    /// Set the initial backoff delay
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum backoff delay
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Deadline for a read starting now
    pub fn deadline(&self) -> Instant {
        Instant::now() + self.timeout
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Run `operation` until it succeeds, fails permanently, or the policy times out
pub async fn retry_transient<T, F, Fut>(policy: RetryPolicy, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_until(policy, policy.deadline(), operation).await
}

/// Like [`retry_transient`], against a deadline shared with other calls
///
/// Each attempt is itself bounded by `deadline`, so a request the server
/// holds open cannot outlive the read timeout.
pub async fn retry_until<T, F, Fut>(
    policy: RetryPolicy,
    deadline: Instant,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    let mut last_error: Option<String> = None;

    loop {
        let err = match tokio::time::timeout_at(deadline, operation()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) if err.is_retryable() => err,
            Ok(Err(err)) => return Err(err),
            Err(_elapsed) => {
                warn!("Request still pending at the read deadline after {} retries", attempt);
                return Err(Error::Timeout {
                    timeout_secs: policy.timeout.as_secs(),
                    last_error: last_error
                        .unwrap_or_else(|| "request did not complete in time".to_string()),
                });
            },
        };

        attempt += 1;
        let delay = policy.delay_for(attempt);
        let now = Instant::now();

        if now + delay > deadline {
            warn!("Giving up after {} attempts: {}", attempt, err);
            return Err(Error::Timeout {
                timeout_secs: policy.timeout.as_secs(),
                last_error: err.to_string(),
            });
        }

        warn!("Transient error (attempt {}): {}", attempt, err);
        debug!("Retrying in {:?}", delay);
        last_error = Some(err.to_string());
        tokio::time::sleep(delay).await;
    }
}
