use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::error::EvalError;

/// Bounded retry with randomized exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff: max_backoff.max(initial_backoff),
        }
    }

    /// Delay before the attempt following `attempt` (1-based).
    ///
    /// Drawn uniformly from `[initial, min(max, initial * 2^attempt)]`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let floor = self.initial_backoff.as_millis() as u64;
        let ceiling = floor
            .saturating_mul(1u64 << attempt.min(32))
            .min(self.max_backoff.as_millis() as u64);

        if ceiling <= floor {
            return Duration::from_millis(floor);
        }
        Duration::from_millis(rand::thread_rng().gen_range(floor..=ceiling))
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// attempts are exhausted. The last error is returned.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, EvalError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, EvalError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let backoff = self.backoff(attempt);
                    warn!(
                        parameter = %label,
                        error = %e,
                        attempt,
                        max_attempts = self.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying evaluation"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(60))
    }
}
