//! Bounded timeout + retry wrapper for calls to the candidate producer and
//! the relevance scorer.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::llm_client::LlmError;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    pub timeout: Duration,
    /// Delay before the second attempt; doubles for each one after.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(60),
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    fn delay_before(&self, attempt: u32) -> Duration {
        // attempt is 1-based for retries: 1 -> backoff, 2 -> 2x, 3 -> 4x
        self.backoff * (1u32 << (attempt - 1).min(16))
    }
}

/// Runs `call` until it succeeds or `policy.max_attempts` is spent.
///
/// Every attempt is bounded by `policy.timeout`; a timeout counts as a
/// failed attempt like any other error. The last error is returned.
pub async fn call_with_retry<T, F, Fut>(
    label: &str,
    policy: &RetryPolicy,
    mut call: F,
) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_error: Option<UpstreamError> = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = policy.delay_before(attempt);
            warn!(
                "{label} attempt {attempt} failed, retrying after {}ms...",
                delay.as_millis()
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        match tokio::time::timeout(policy.timeout, call()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => {
                warn!("{label} call failed: {e}");
                last_error = Some(e);
            }
            Err(_) => {
                warn!("{label} call timed out after {}ms", policy.timeout.as_millis());
                last_error = Some(UpstreamError::Timeout(policy.timeout));
            }
        }
    }

    Err(last_error.unwrap_or(UpstreamError::Timeout(policy.timeout)))
}
