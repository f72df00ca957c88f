//! Environment-driven tunables for a [`crate::api::Runtime`] instance,
//! in the manner of `tooling::config`'s "read env var, parse, fall back"
//! helpers (`spec.md` §2.1).

use agentflow_stream::DEFAULT_QUEUE_CAPACITY;
use agentflow_tooling::config::env_or;

/// Tunables a host application may override via environment variables
/// before constructing a [`crate::api::Runtime`].
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Per-run bounded event queue capacity (`AGENTFLOW_QUEUE_CAPACITY`).
    pub event_queue_capacity: usize,
    /// Default `spawn`/`spawn_group` depth limit (`AGENTFLOW_MAX_DEPTH`).
    pub max_delegation_depth: u32,
    /// Default fan-out limit per spawn call (`AGENTFLOW_MAX_FANOUT`).
    pub max_children_per_call: u32,
    /// Default `join` timeout in seconds (`AGENTFLOW_JOIN_TIMEOUT_S`).
    pub join_timeout_s: u64,
}

impl RuntimeConfig {
    /// Load from the environment, falling back to `spec.md`'s stated
    /// defaults for anything unset.
    pub fn from_env() -> agentflow_tooling::Result<Self> {
        Ok(Self {
            event_queue_capacity: env_or("AGENTFLOW_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?,
            max_delegation_depth: env_or("AGENTFLOW_MAX_DEPTH", 8)?,
            max_children_per_call: env_or("AGENTFLOW_MAX_FANOUT", 16)?,
            join_timeout_s: env_or("AGENTFLOW_JOIN_TIMEOUT_S", 300)?,
        })
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_delegation_depth: 8,
            max_children_per_call: 16,
            join_timeout_s: 300,
        }
    }
}

impl From<&RuntimeConfig> for agentflow_orchestration::SpawnPolicy {
    fn from(config: &RuntimeConfig) -> Self {
        agentflow_orchestration::SpawnPolicy {
            max_depth: config.max_delegation_depth,
            max_children_per_call: config.max_children_per_call,
            allowed_target_slugs: None,
            default_failure_policy: "best_effort".to_string(),
            join_timeout_s: config.join_timeout_s,
        }
    }
}
