//! # Retry
//!
//! Bounded exponential backoff for registry calls. Only errors the caller
//! marks as retryable (5xx responses) get another attempt.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Retry behaviour for registry requests
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (default: 3)
    pub max_retries: u32,
    /// Delay before the first retry (default: 300ms)
    pub initial_delay: Duration,
    /// Upper bound for any single delay (default: 5s)
    pub max_delay: Duration,
    /// Growth factor between delays (default: 2.0)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(300),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Delay before retry number `retry` (0-based): `initial * multiplier^retry`,
    /// capped at `max_delay`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_millis() as f64;
        let millis = (base * self.backoff_multiplier.powi(exponent)).round();

        if !millis.is_finite() || millis >= self.max_delay.as_millis() as f64 {
            self.max_delay
        } else {
            Duration::from_millis(millis.max(0.0) as u64)
        }
    }
}

/// Run `operation`, retrying while `should_retry` approves the error and the
/// policy allows. Returns the first success or the last error.
pub async fn retry_with_backoff<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut retry = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if retry > 0 {
                    info!(attempt = retry + 1, "Registry call succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if retry < policy.max_retries && should_retry(&error) => {
                let delay = policy.delay_for_retry(retry);
                warn!(
                    attempt = retry + 1,
                    max_retries = policy.max_retries,
                    error = %error,
                    "Registry call failed, retrying"
                );
                debug!(delay_ms = delay.as_millis() as u64, "Sleeping before retry");
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
