use rand::Rng;
use std::time::Duration;

/// Largest exponent applied to the base delay.
const MAX_EXPONENT: u32 = 6;

/// Exponential backoff with ±30% jitter for the `attempt`-th retry (0-based).
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    let factor = 2_u32.saturating_pow(attempt.min(MAX_EXPONENT));
    let nominal = base.saturating_mul(factor);

    let jitter = rand::thread_rng().gen_range(0.7..1.3);
    nominal.mul_f64(jitter)
}

/// How many times a retriable fetch failure is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        backoff_delay(attempt, self.base_delay)
    }
}
