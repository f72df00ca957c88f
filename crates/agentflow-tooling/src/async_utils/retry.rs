//! Configurable retry policy with exponential backoff.
//!
//! Mirrors `spec.md`'s tool retry contract: `delay = min(initial * multiplier
//! ^ (attempt - 1), max_delay)`, attempt counted from 1.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exponential backoff policy for retrying a fallible async operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first (non-retry) one.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Ceiling on the computed delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_multiplier: f64,
    /// Whether to jitter the computed delay by ±25%.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy with `max_attempts` attempts and otherwise-default backoff.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// True if `attempt` (1-indexed) is allowed to run at all.
    pub fn should_attempt(&self, attempt: u32) -> bool {
        attempt >= 1 && attempt <= self.max_attempts
    }

    /// Delay to wait *before* making attempt number `attempt` (1-indexed).
    /// Attempt 1 has no delay.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 1) as i32 - 1;
        let raw = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent.max(0));
        let mut delay_ms = raw.min(self.max_delay_ms as f64);
        if self.jitter {
            let jitter_factor = rand::thread_rng().gen_range(0.75..=1.25);
            delay_ms *= jitter_factor;
            delay_ms = delay_ms.min(self.max_delay_ms as f64);
        }
        Duration::from_millis(delay_ms.max(0.0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allows_three_attempts() {
        let policy = RetryPolicy::default();
        assert!(policy.should_attempt(1));
        assert!(policy.should_attempt(3));
        assert!(!policy.should_attempt(4));
    }

    #[test]
    fn delay_grows_exponentially_without_jitter() {
        let policy = RetryPolicy {
            jitter: false,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for(1), Duration::ZERO);
        assert_eq!(policy.delay_for(2), Duration::from_millis(500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(1000));
    }

    #[test]
    fn delay_is_capped_at_max() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay_ms: 1000,
            max_delay_ms: 2000,
            backoff_multiplier: 2.0,
            jitter: false,
        };
        assert_eq!(policy.delay_for(6), Duration::from_millis(2000));
    }
}
