//! Bounded retry with exponential backoff for transient AWS failures
//!
//! CloudWatch and Organizations calls are rate limited; throttled requests
//! are retried a small fixed number of times with exponential backoff and
//! jitter. Anything not classified as transient surfaces immediately.

use crate::aws::error::classify_anyhow_error;
use anyhow::Result;
use backon::{BackoffBuilder, ExponentialBuilder};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry configuration for throttled provider calls
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Initial delay between attempts
    pub initial_delay: Duration,
    /// Maximum delay between attempts (cap for exponential growth)
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Run `operation`, retrying on transient errors up to the attempt limit.
///
/// Retryability is decided by classifying the error chain; only throttling
/// and similar transient conditions qualify. The last error is returned once
/// attempts are exhausted.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let backoff = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .with_jitter()
        .build();

    let mut delays = backoff.into_iter();
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation = %operation_name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                let transient = classify_anyhow_error(&error).is_retryable();
                if !transient || attempt >= config.max_attempts {
                    return Err(error);
                }

                let delay = delays.next().unwrap_or(config.max_delay);
                warn!(
                    operation = %operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
