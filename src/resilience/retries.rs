//! Bounded retry with backoff.
//!
//! # Responsibilities
//! - Run an async attempt up to `max_attempts` times
//! - Sleep with jittered exponential backoff between attempts
//! - Surface the last error once the budget is spent

use std::future::Future;

use crate::config::schema::PollingConfig;
use crate::resilience::backoff::calculate_backoff;

/// Retry budget for a polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for RetryPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            min_interval_ms: config.min_interval_ms,
            max_interval_ms: config.max_interval_ms,
        }
    }
}

/// All attempts failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Run `attempt` until it succeeds or the policy's budget is spent.
///
/// The closure receives the 1-based attempt number.
pub async fn retry<T, E, F, Fut>(policy: RetryPolicy, mut attempt: F) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut current = 1;

    loop {
        match attempt(current).await {
            Ok(value) => return Ok(value),
            Err(err) if current >= max_attempts => {
                return Err(RetryExhausted {
                    attempts: current,
                    last_error: err,
                });
            }
            Err(_) => {
                let delay = calculate_backoff(current, policy.min_interval_ms, policy.max_interval_ms);
                tokio::time::sleep(delay).await;
                current += 1;
            }
        }
    }
}
