//! Retry with exponential backoff and jitter for transient acquisition failures.
//!
//! Only errors that report themselves as transient through [`Retryable`] are
//! retried; everything else fails on the first attempt.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: usize,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
    /// Whether to add jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Errors that can tell whether another attempt might succeed.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// Trait for retry policies
pub trait RetryPolicy: Send + Sync {
    /// Delay before the attempt following `attempt` (zero-based).
    ///
    /// Returns `None` once the attempt budget is spent.
    fn next_delay(&self, attempt: usize) -> Option<Duration>;

    fn max_attempts(&self) -> usize;
}

/// Exponential backoff retry policy.
///
/// With jitter enabled each delay is half the computed delay plus a random
/// share of the other half.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    config: RetryConfig,
}

impl ExponentialBackoff {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    fn apply_jitter(&self, delay: Duration) -> Duration {
        if !self.config.jitter {
            return delay;
        }
        let jitter = rand::random::<f64>();
        let base = delay.as_secs_f64() / 2.0;
        Duration::from_secs_f64(base + (base * jitter))
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if attempt + 1 >= self.config.max_attempts {
            return None;
        }

        let base_delay = self.config.initial_delay.as_secs_f64()
            * self.config.multiplier.powi(attempt as i32);

        let delay = Duration::from_secs_f64(base_delay.min(self.config.max_delay.as_secs_f64()));

        Some(self.apply_jitter(delay))
    }

    fn max_attempts(&self) -> usize {
        self.config.max_attempts
    }
}

/// Error wrapper that includes retry attempt information
#[derive(Debug)]
pub struct RetryError<E> {
    pub error: E,
    pub attempts: usize,
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed after {} attempt{}: {}",
            self.attempts,
            if self.attempts == 1 { "" } else { "s" },
            self.error
        )
    }
}

impl<E: std::error::Error> std::error::Error for RetryError<E> {}

/// Run `f` until it succeeds, fails permanently, or the policy gives up.
pub async fn retry<F, Fut, T, E, P>(policy: &P, mut f: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + fmt::Display,
    P: RetryPolicy,
{
    let mut attempt = 0;

    loop {
        debug!(attempt = attempt + 1, max = policy.max_attempts(), "Attempting operation");

        match f().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(retries = attempt, "Operation succeeded after retrying");
                }
                return Ok(result);
            }
            Err(e) => {
                if !e.is_transient() {
                    debug!(error = %e, "Error is not retryable, giving up");
                    return Err(RetryError {
                        error: e,
                        attempts: attempt + 1,
                    });
                }

                match policy.next_delay(attempt) {
                    Some(delay) => {
                        warn!(error = %e, delay_ms = delay.as_millis() as u64, "Transient failure, retrying");
                        metrics::counter!("acquisition_retries_total").increment(1);
                        sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        warn!(error = %e, attempts = attempt + 1, "Max retry attempts reached");
                        return Err(RetryError {
                            error: e,
                            attempts: attempt + 1,
                        });
                    }
                }
            }
        }
    }
}
