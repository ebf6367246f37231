//! Exponential backoff with jitter, per the retry policy:
//! `delay_n = min(cap, base * 2^n) * uniform(0.5, 1.5)`.

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            cap: Duration::from_secs(60),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `n` (0-based: the delay taken after the first
    /// failure, before the second attempt).
    pub fn delay_for_attempt(&self, n: u32) -> Duration {
        let exp = 2u64.saturating_pow(n);
        let scaled = self.base.saturating_mul(exp as u32);
        let capped = scaled.min(self.cap);
        let jitter = rand::thread_rng().gen_range(0.5..1.5);
        capped.mul_f64(jitter)
    }

    pub fn exhausted(&self, attempts_made: u32) -> bool {
        attempts_made >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_and_is_capped() {
        let policy = RetryPolicy {
            base: Duration::from_millis(100),
            cap: Duration::from_secs(1),
            max_attempts: 10,
        };
        for n in 0..10 {
            let d = policy.delay_for_attempt(n);
            assert!(d <= Duration::from_secs(1) + Duration::from_millis(1));
        }
    }

    #[test]
    fn exhausted_respects_max_attempts() {
        let policy = RetryPolicy::default();
        assert!(!policy.exhausted(0));
        assert!(policy.exhausted(5));
        assert!(policy.exhausted(6));
    }
}
