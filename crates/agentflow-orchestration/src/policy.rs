use crate::error::{OrchestrationError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The limits and defaults a tenant/agent combination delegates under.
/// Grounded in `original_source/backend/app/services/orchestration_policy_service.py`'s
/// `OrchestrationPolicy`, simplified to the fields `spawn_run`/`spawn_group`
/// actually enforce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnPolicy {
    /// Maximum `depth` a descendant run may reach (root is depth 0).
    pub max_depth: u32,
    /// Maximum direct children a single `spawn_run`/`spawn_group` call may
    /// create at once.
    pub max_children_per_call: u32,
    /// Target agent slugs the caller is allowed to delegate to. `None`
    /// means unrestricted.
    pub allowed_target_slugs: Option<HashSet<String>>,
    pub default_failure_policy: String,
    pub join_timeout_s: u64,
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_children_per_call: 16,
            allowed_target_slugs: None,
            default_failure_policy: "best_effort".to_string(),
            join_timeout_s: 300,
        }
    }
}

impl SpawnPolicy {
    /// `spec.md` §4.7's fan-out and depth guard, enforced before any child
    /// run is created.
    pub fn assert_spawn_limits(&self, parent_depth: u32, requested_children: u32) -> Result<()> {
        if parent_depth + 1 > self.max_depth {
            return Err(OrchestrationError::PolicyDenied(format!(
                "spawning would exceed max_depth {}",
                self.max_depth
            )));
        }
        if requested_children > self.max_children_per_call {
            return Err(OrchestrationError::PolicyDenied(format!(
                "requested {requested_children} children exceeds max_children_per_call {}",
                self.max_children_per_call
            )));
        }
        Ok(())
    }

    pub fn assert_target_allowed(&self, target_slug: &str) -> Result<()> {
        match &self.allowed_target_slugs {
            Some(allowed) if !allowed.contains(target_slug) => Err(OrchestrationError::PolicyDenied(format!(
                "target agent '{target_slug}' is not in the delegation allow-list"
            ))),
            _ => Ok(()),
        }
    }

    /// `spec.md` §4.7: a delegated run's scopes must be a subset of the
    /// caller's effective scopes — delegation can only narrow, never widen.
    pub fn assert_scope_subset(&self, requested: &[String], caller_effective: &[String]) -> Result<()> {
        let allowed: HashSet<&str> = caller_effective.iter().map(String::as_str).collect();
        let overreaching: Vec<&str> = requested
            .iter()
            .map(String::as_str)
            .filter(|s| !allowed.contains(s))
            .collect();
        if !overreaching.is_empty() {
            return Err(OrchestrationError::PolicyDenied(format!(
                "scope_not_subset: requested scopes {overreaching:?} exceed caller's effective scopes"
            )));
        }
        Ok(())
    }
}
