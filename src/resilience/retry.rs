use crate::client::providers::UpstreamError;
use crate::client::rate_limiter::TokenBucket;
use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Backoff parameters for one outbound call.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 means exactly one attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Cap applied to the exponential delay.
    pub max_delay: Duration,
    /// Multiply each delay by `1 + uniform(-0.1, 0.1)` to spread retries.
    pub jitter_enabled: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter_enabled: true,
        }
    }
}

/// Drive one provider call to completion with classified retry.
///
/// Every attempt, including each retry, re-acquires a rate-limiter token
/// before invoking `attempt_fn`. Transient failures (timeouts, network
/// errors, 429, 5xx) back off exponentially and retry up to
/// `config.max_retries` times; fatal failures propagate immediately with no
/// further upstream contact.
pub async fn run_with_retry<T, F, Fut>(
    limiter: &TokenBucket,
    config: &RetryConfig,
    operation_name: &str,
    mut attempt_fn: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, UpstreamError>>,
{
    let mut attempt: u32 = 0;

    loop {
        limiter.acquire().await;
        debug!(operation = operation_name, attempt, "executing upstream call");

        match attempt_fn().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        "upstream call succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) if !err.is_transient() => {
                debug!(
                    operation = operation_name,
                    error = %err,
                    "fatal upstream failure, not retrying"
                );
                return Err(Error::Upstream {
                    source: err,
                    attempts: attempt + 1,
                });
            }
            Err(err) => {
                if attempt >= config.max_retries {
                    warn!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        error = %err,
                        "upstream call exhausted retries"
                    );
                    return Err(Error::Upstream {
                        source: err,
                        attempts: attempt + 1,
                    });
                }

                let delay = backoff_delay(attempt, config);
                debug!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient upstream failure, backing off"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Exponential backoff with cap and optional jitter.
///
/// Uses the pre-increment attempt count: the first retry waits
/// `base_delay * 2^0`. Jitter can never push the delay below zero.
fn backoff_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let exponential = config.base_delay.as_secs_f64() * 2f64.powi(attempt as i32);
    let mut delay = exponential.min(config.max_delay.as_secs_f64());

    if config.jitter_enabled {
        use rand::Rng;
        let factor: f64 = rand::thread_rng().gen_range(-0.1..=0.1);
        delay *= 1.0 + factor;
    }

    Duration::from_secs_f64(delay.max(0.0))
}
