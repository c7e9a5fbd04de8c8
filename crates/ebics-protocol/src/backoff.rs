//! Decorrelated-jitter backoff, shared by the transaction engine's
//! transport-failure retries and by the scheduler's submitter/fetcher loops.

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    pub base: Duration,
    pub max: Duration,
    pub factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        BackoffConfig {
            base: Duration::from_millis(100),
            max: Duration::from_secs(60),
            factor: 2.0,
        }
    }
}

/// `sleep_{n+1} = min(max, uniform(base, sleep_n * factor))`.
#[derive(Debug, Clone)]
pub struct DecorrelatedJitter {
    config: BackoffConfig,
    previous: Duration,
}

impl DecorrelatedJitter {
    pub fn new(config: BackoffConfig) -> Self {
        DecorrelatedJitter {
            previous: config.base,
            config,
        }
    }

    /// Computes the next sleep duration and records it as `sleep_n` for the
    /// following call.
    pub fn next_delay(&mut self) -> Duration {
        let upper = (self.previous.as_secs_f64() * self.config.factor)
            .max(self.config.base.as_secs_f64());
        let sampled = rand::thread_rng().gen_range(self.config.base.as_secs_f64()..=upper);
        let bounded = sampled.min(self.config.max.as_secs_f64());
        self.previous = Duration::from_secs_f64(bounded);
        self.previous
    }

    /// Resets the sequence to `base`, called after a successful attempt.
    pub fn reset(&mut self) {
        self.previous = self.config.base;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_never_exceeds_max() {
        let config = BackoffConfig {
            base: Duration::from_millis(10),
            max: Duration::from_millis(50),
            factor: 10.0,
        };
        let mut jitter = DecorrelatedJitter::new(config);
        for _ in 0..20 {
            assert!(jitter.next_delay() <= config.max);
        }
    }

    #[test]
    fn reset_returns_to_base_range() {
        let config = BackoffConfig::default();
        let mut jitter = DecorrelatedJitter::new(config);
        jitter.next_delay();
        jitter.next_delay();
        jitter.reset();
        assert_eq!(jitter.previous, config.base);
    }
}
