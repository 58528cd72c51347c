//! Sequential retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::services::config::RetryConfig;
use crate::utils::timer::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base_ms,
            max_backoff_ms: u64::MAX,
        }
    }

    /// Delay after failed attempt `attempt` (1-based): base, 2×base, 4×base…
    /// capped at `max_backoff_ms`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1_u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        let delay_ms = self
            .backoff_base_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(delay_ms)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base_ms: config.backoff_base_ms,
            max_backoff_ms: config.max_backoff_ms,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

/// Run `attempt` until `should_retry` says stop or attempts run out.
///
/// Attempts never overlap. Whatever the last attempt produced is returned
/// as-is.
pub async fn retry_with_backoff<T, F, Fut, R>(
    policy: &RetryPolicy,
    mut attempt: F,
    should_retry: R,
) -> T
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = T>,
    R: Fn(&T) -> bool,
{
    let mut number = 1;
    loop {
        let outcome = attempt(number).await;
        if number >= policy.max_attempts || !should_retry(&outcome) {
            return outcome;
        }

        let delay = policy.delay_after(number);
        warn!(
            "Attempt {}/{} failed, retrying in {} ms",
            number,
            policy.max_attempts,
            delay.as_millis()
        );
        sleep(delay).await;
        number += 1;
    }
}
