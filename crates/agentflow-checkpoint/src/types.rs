use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a single checkpoint slot: one per `(run_id, thread_id)` pair.
///
/// `thread_id` is usually the run id itself, but is kept distinct so a
/// single run can in principle multiplex several conversational threads
/// (subgraphs) the way `langgraph-checkpoint::CheckpointConfig` allows a
/// `checkpoint_ns` within a thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckpointKey {
    /// The run this checkpoint belongs to.
    pub run_id: Uuid,
    /// The thread within the run. Defaults to `run_id.to_string()`.
    pub thread_id: String,
}

impl CheckpointKey {
    /// A checkpoint key whose thread is the run itself.
    pub fn for_run(run_id: Uuid) -> Self {
        Self {
            run_id,
            thread_id: run_id.to_string(),
        }
    }
}

/// An opaque, serialized snapshot of in-run state, sufficient to resume
/// execution from the node it was captured at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// The node id execution should resume from (the node that raised the
    /// interrupt, or `None` for a checkpoint taken after a normal node
    /// boundary that is not itself paused).
    pub next_node: Option<String>,
    /// The serialized `agentflow_graph::run::GraphState` at the time this
    /// checkpoint was written.
    pub state: serde_json::Value,
    /// Monotonically increasing step counter, used for ordering and
    /// diagnostics only.
    pub step: u64,
    /// Wall-clock time the checkpoint was written, RFC3339.
    pub written_at: chrono::DateTime<chrono::Utc>,
}

impl Checkpoint {
    /// Build a checkpoint for `state` at `step`, resuming (if paused) at
    /// `next_node`.
    pub fn new(state: serde_json::Value, step: u64, next_node: Option<String>) -> Self {
        Self {
            next_node,
            state,
            step,
            written_at: chrono::Utc::now(),
        }
    }
}
