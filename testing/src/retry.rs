//! Bounded polling with exponential backoff.
//!
//! Bridges the gap between "container process started" and "service accepts
//! connections". An attempt that outlives the overall deadline is abandoned.

use config::RetryConfig;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_retry::strategy::{ExponentialBackoff, jitter};

/// The retry budget ran out before an attempt succeeded.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub elapsed: Duration,
    /// `None` when the deadline expired during the first attempt.
    pub last_error: Option<E>
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last_error {
            Some(e) => write!(
                f,
                "gave up after {} attempts in {:?}: {}",
                self.attempts, self.elapsed, e
            ),
            None => write!(
                f,
                "gave up after {} attempts in {:?}: deadline reached",
                self.attempts, self.elapsed
            )
        }
    }
}

/// Delays between attempts: exponential from `initial_delay_ms`, capped at
/// `max_delay_ms`, jittered.
pub fn backoff(config: &RetryConfig) -> impl Iterator<Item = Duration> {
    let cap = config.max_delay();
    ExponentialBackoff::from_millis(2)
        .factor(config.initial_delay_ms.div_ceil(2).max(1))
        .max_delay(cap)
        .map(move |delay| jitter(delay.min(cap)))
}

/// Runs `operation` until it succeeds, `max_attempts` is reached or
/// `max_wait` has elapsed. A backoff delay longer than the time left is cut
/// short and followed by one last attempt.
pub async fn retry_until_ready<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display
{
    let started = Instant::now();
    let deadline = started + config.max_wait();
    let mut delays = backoff(config);
    let mut attempts = 0;
    let mut last_error = None;

    loop {
        attempts += 1;
        let remaining = deadline.saturating_duration_since(Instant::now());

        match tokio::time::timeout(remaining, operation()).await {
            Ok(Ok(value)) => {
                tracing::debug!(attempts, elapsed = ?started.elapsed(), "Operation succeeded");
                return Ok(value);
            }
            Ok(Err(e)) => {
                tracing::debug!(attempt = attempts, error = %e, "Attempt failed");
                last_error = Some(e);
            }
            Err(_) => {
                tracing::debug!(attempt = attempts, "Attempt cut off by deadline");
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if attempts >= config.max_attempts || remaining.is_zero() {
            return Err(RetryExhausted {
                attempts,
                elapsed: started.elapsed(),
                last_error
            });
        }

        // The final sleep is shortened so one more attempt fits the deadline.
        let delay = delays.next().unwrap_or_else(|| config.max_delay());
        tokio::time::sleep(delay.min(remaining)).await;
    }
}
