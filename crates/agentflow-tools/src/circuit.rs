use std::collections::HashMap;
use std::sync::Mutex;

/// Per-Run, per-tool consecutive-failure counters (`spec.md` §5: "Circuit-
/// breaker counters are per-Run and not shared" — one [`CircuitBreaker`] is
/// owned by a single run's [`crate::ToolContext`], never a process-global
/// registry).
#[derive(Debug, Default)]
pub struct CircuitBreaker {
    failures: Mutex<HashMap<String, u32>>,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `tool_slug` has already tripped at `threshold`.
    pub fn is_open(&self, tool_slug: &str, threshold: u32) -> bool {
        let failures = self.failures.lock().expect("circuit breaker mutex poisoned");
        failures.get(tool_slug).copied().unwrap_or(0) >= threshold
    }

    /// Record a failed attempt, returning the new consecutive-failure count.
    pub fn record_failure(&self, tool_slug: &str) -> u32 {
        let mut failures = self.failures.lock().expect("circuit breaker mutex poisoned");
        let count = failures.entry(tool_slug.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Reset the counter after a successful call.
    pub fn record_success(&self, tool_slug: &str) {
        let mut failures = self.failures.lock().expect("circuit breaker mutex poisoned");
        failures.remove(tool_slug);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_after_threshold_consecutive_failures() {
        let breaker = CircuitBreaker::new();
        assert!(!breaker.is_open("search", 2));
        breaker.record_failure("search");
        assert!(!breaker.is_open("search", 2));
        breaker.record_failure("search");
        assert!(breaker.is_open("search", 2));
    }

    #[test]
    fn success_resets_counter() {
        let breaker = CircuitBreaker::new();
        breaker.record_failure("search");
        breaker.record_success("search");
        assert!(!breaker.is_open("search", 1));
    }
}
