//! Transient Error Retry
//!
//! Retries an async operation with exponential backoff, but only when the
//! failure message matches one of a fixed set of transient network errors.
//! Any other error is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::{Error, Result};

/// Error message fragments treated as transient (matched case-insensitively)
pub const RETRYABLE_ERRORS: [&str; 7] = [
    "Failed to fetch",
    "NetworkError",
    "Network error",
    "Load failed",
    "network",
    "ECONNRESET",
    "ETIMEDOUT",
];

/// Backoff parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 5000,
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`, capped
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u64
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let delay = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

/// Whether an error message describes a transient network failure
pub fn is_retryable_message(message: &str) -> bool {
    let message = message.to_lowercase();
    RETRYABLE_ERRORS
        .iter()
        .any(|fragment| message.contains(&fragment.to_lowercase()))
}

/// Run `operation` until it succeeds, fails with a non-transient error, or
/// `policy.max_retries` attempts have been made.
pub async fn retry_transient<F, Fut, T>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_retries.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(operation = operation_name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                let message = err.to_string();
                if !is_retryable_message(&message) || attempt >= max_attempts {
                    return Err(err);
                }

                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %message,
                    "Transient failure, will retry after backoff"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// GET a URL as text, retrying transient network failures
pub async fn fetch_text_with_retry(
    client: &reqwest::Client,
    url: &str,
    policy: RetryPolicy,
) -> Result<String> {
    retry_transient("fetch", policy, move || async move {
        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!("GET {} returned {}", url, status)));
        }
        Ok(response.text().await?)
    })
    .await
}
