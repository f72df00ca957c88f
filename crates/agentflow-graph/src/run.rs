//! [`Run`], [`RunStatus`], [`GraphState`] and [`NodeDelta`] — the mutable
//! working set the [`crate::engine::Engine`] drives forward one superstep
//! at a time.
//!
//! Grounded in `langgraph-core::state`'s reducer-based merge model
//! (`AppendReducer` for message lists, `MergeReducer`/shallow-merge for
//! mappings, `OverwriteReducer` elsewhere), specialized to the fixed field
//! set `spec.md` §3 names for `State` rather than a user-declared schema.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Terminal-or-transitional status of a [`Run`]. Per `spec.md` §3,
/// terminal states (`Completed`, `Failed`, `Cancelled`) are absorbing —
/// once reached a Run never transitions again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

/// One execution of an [`crate::types::AgentDefinition`].
///
/// Invariant (`spec.md` §3, enforced by construction here rather than
/// checked after the fact): `depth == 0 <=> parent_run_id.is_none()`, and
/// `root_run_id == id` iff `parent_run_id.is_none()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: uuid::Uuid,
    pub tenant_id: uuid::Uuid,
    pub agent_id: uuid::Uuid,
    pub agent_version: u32,
    pub status: RunStatus,
    pub input_params: Value,
    pub checkpoint: Option<agentflow_checkpoint::Checkpoint>,
    pub output_result: Option<Value>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub error_message: Option<String>,
    pub root_run_id: uuid::Uuid,
    pub parent_run_id: Option<uuid::Uuid>,
    pub parent_node_id: Option<String>,
    pub depth: u32,
    pub spawn_key: Option<String>,
    pub orchestration_group_id: Option<uuid::Uuid>,
    pub delegation_grant_id: Option<uuid::Uuid>,
    pub engine_run_ref: Option<String>,
}

impl Run {
    /// Construct a fresh root Run: `depth = 0`, `root_run_id = id`, no
    /// parent lineage. The only way to produce a root Run, so the
    /// depth/root invariant can never be violated for it.
    pub fn new_root(tenant_id: uuid::Uuid, agent_id: uuid::Uuid, agent_version: u32, input_params: Value) -> Self {
        let id = uuid::Uuid::new_v4();
        Self {
            id,
            tenant_id,
            agent_id,
            agent_version,
            status: RunStatus::Queued,
            input_params,
            checkpoint: None,
            output_result: None,
            started_at: None,
            completed_at: None,
            error_message: None,
            root_run_id: id,
            parent_run_id: None,
            parent_node_id: None,
            depth: 0,
            spawn_key: None,
            orchestration_group_id: None,
            delegation_grant_id: None,
            engine_run_ref: None,
        }
    }

    /// Construct a child Run of `parent`, embedding lineage the way
    /// `spec.md` §4.7's `spawn_run` describes: `depth = parent.depth + 1`,
    /// `root_run_id` inherited, `parent_run_id`/`parent_node_id` set. The
    /// only way to produce a child Run, so invariant 4 in `spec.md` §8
    /// holds by construction.
    #[allow(clippy::too_many_arguments)]
    pub fn child_of(
        parent: &Run,
        parent_node_id: impl Into<String>,
        agent_id: uuid::Uuid,
        agent_version: u32,
        input_params: Value,
        spawn_key: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            tenant_id: parent.tenant_id,
            agent_id,
            agent_version,
            status: RunStatus::Queued,
            input_params,
            checkpoint: None,
            output_result: None,
            started_at: None,
            completed_at: None,
            error_message: None,
            root_run_id: parent.root_run_id,
            parent_run_id: Some(parent.id),
            parent_node_id: Some(parent_node_id.into()),
            depth: parent.depth + 1,
            spawn_key: Some(spawn_key.into()),
            orchestration_group_id: None,
            delegation_grant_id: None,
            engine_run_ref: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_run_id.is_none()
    }
}

/// Per-run working memory, mutated only by merging executor-returned
/// [`NodeDelta`]s (`spec.md` §4.2: "Executors must not mutate state in
/// place").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphState {
    pub messages: Vec<Value>,
    pub context: Map<String, Value>,
    pub node_outputs: HashMap<String, Value>,
    pub state: Map<String, Value>,
    pub last_agent_output: Option<Value>,
}

impl GraphState {
    pub fn new(input_params: Value) -> Self {
        let state = match input_params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("input".to_string(), other);
                map
            }
        };
        Self {
            messages: Vec::new(),
            context: Map::new(),
            node_outputs: HashMap::new(),
            state,
            last_agent_output: None,
        }
    }

    /// Resolve `upstream.<node_id>.<key>` / `state.<key>` lookups used by
    /// template interpolation and input-mapping resolution.
    pub fn resolve_path(&self, path: &str) -> Option<Value> {
        let mut parts = path.split('.');
        let root = parts.next()?;
        match root {
            "state" => {
                let mut current = Value::Object(self.state.clone());
                for part in parts {
                    current = current.get(part)?.clone();
                }
                Some(current)
            }
            "upstream" => {
                let node_id = parts.next()?;
                let mut current = self.node_outputs.get(node_id)?.clone();
                for part in parts {
                    current = current.get(part)?.clone();
                }
                Some(current)
            }
            "context" => {
                let mut current = Value::Object(self.context.clone());
                for part in parts {
                    current = current.get(part)?.clone();
                }
                Some(current)
            }
            _ => None,
        }
    }

    /// Merge a [`NodeDelta`] produced by `node_id`'s executor into this
    /// state, per `spec.md` §4.2's merge rule: `messages` append,
    /// `_node_outputs[node_id]` set to the delta's full output value,
    /// `state`/`context` shallow-merge, everything else overwrites.
    pub fn merge(&mut self, node_id: &str, delta: &NodeDelta) {
        if let Some(messages) = &delta.messages {
            self.messages.extend(messages.iter().cloned());
        }
        if let Some(state_patch) = &delta.state {
            for (k, v) in state_patch {
                self.state.insert(k.clone(), v.clone());
            }
        }
        if let Some(context_patch) = &delta.context {
            for (k, v) in context_patch {
                self.context.insert(k.clone(), v.clone());
            }
        }
        if let Some(last_agent_output) = &delta.last_agent_output {
            self.last_agent_output = Some(last_agent_output.clone());
        }
        self.node_outputs
            .insert(node_id.to_string(), delta.as_output_value());
    }
}

/// The partial-state-patch-plus-control-signal every [`crate::node::NodeExecutor`]
/// returns, per `spec.md` §4.2.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeDelta {
    #[serde(default)]
    pub messages: Option<Vec<Value>>,
    #[serde(default)]
    pub state: Option<Map<String, Value>>,
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
    #[serde(default)]
    pub last_agent_output: Option<Value>,
    /// Explicit next-node override (used by `spawn_run`/orchestration
    /// nodes that don't route via `branch_taken`).
    #[serde(default)]
    pub next: Option<String>,
    /// The branch name a routing node selected (`if_else`, `classify`,
    /// `router`, `while`); the Engine follows the edge whose
    /// `source_handle` matches this.
    #[serde(default)]
    pub branch_taken: Option<String>,
    /// Set by the `end` node: the run's final, rendered output.
    #[serde(default)]
    pub final_output: Option<Value>,
    /// Tool outputs surfaced by `tool`/`agent` nodes for observability.
    #[serde(default)]
    pub tool_outputs: Option<Vec<Value>>,
    /// A non-fatal, executor-reported error to surface without aborting
    /// the run (distinct from a raised [`crate::error::GraphError`]).
    #[serde(default)]
    pub error: Option<String>,
}

impl NodeDelta {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch_taken = Some(branch.into());
        self
    }

    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn with_state(mut self, patch: Map<String, Value>) -> Self {
        self.state = Some(patch);
        self
    }

    pub fn with_context(mut self, patch: Map<String, Value>) -> Self {
        self.context = Some(patch);
        self
    }

    /// The value recorded into `_node_outputs[node_id]`: everything this
    /// delta carries, as a JSON object, so downstream `upstream.<id>.<key>`
    /// lookups can address any of its fields.
    fn as_output_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
