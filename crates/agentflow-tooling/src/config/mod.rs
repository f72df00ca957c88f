//! Environment-driven configuration loading.
//!
//! Keeps the "read env var, parse, fall back to default" dance out of every
//! crate that needs a tunable (queue capacity, retry defaults, circuit
//! breaker threshold, …).

use crate::{Result, ToolingError};
use std::env;
use std::str::FromStr;

/// Read an environment variable and parse it, falling back to `default`
/// when unset. Returns an error when the variable is set but unparsable.
pub fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
{
    match env::var(name) {
        Ok(raw) => raw.parse::<T>().map_err(|_| ToolingError::InvalidEnvValue {
            name: name.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Read a boolean environment variable (`"1"`, `"true"`, `"yes"` are truthy,
/// case-insensitively; anything else is falsy), falling back to `default`.
pub fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn env_or_falls_back_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("AGENTFLOW_TEST_UNSET");
        let value: u64 = env_or("AGENTFLOW_TEST_UNSET", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn env_or_parses_set_value() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("AGENTFLOW_TEST_SET", "42");
        let value: u64 = env_or("AGENTFLOW_TEST_SET", 7).unwrap();
        assert_eq!(value, 42);
        env::remove_var("AGENTFLOW_TEST_SET");
    }

    #[test]
    fn env_or_rejects_bad_value() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("AGENTFLOW_TEST_BAD", "not-a-number");
        let result: Result<u64> = env_or("AGENTFLOW_TEST_BAD", 7);
        assert!(result.is_err());
        env::remove_var("AGENTFLOW_TEST_BAD");
    }

    #[test]
    fn env_flag_truthy_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("AGENTFLOW_TEST_FLAG", "true");
        assert!(env_flag("AGENTFLOW_TEST_FLAG", false));
        env::set_var("AGENTFLOW_TEST_FLAG", "no");
        assert!(!env_flag("AGENTFLOW_TEST_FLAG", true));
        env::remove_var("AGENTFLOW_TEST_FLAG");
    }
}
