use agentflow_graph::RunStatus;
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

/// What the orchestration kernel needs from the host (`agentflow-runtime`)
/// to actually start, observe, and cancel runs. The kernel itself only
/// owns bookkeeping (lineage, groups, policy); `agentflow-runtime` wires
/// a concrete `RunHost` backed by its `Engine`/`CheckpointSaver`/store,
/// the way `original_source`'s `OrchestrationKernelService` calls out to
/// `AgentExecutorService.start_run` rather than driving the graph itself.
#[async_trait]
pub trait RunHost: Send + Sync {
    /// Start a new child run of `target_agent_slug`, recording the given
    /// lineage. Returns the new run's id.
    #[allow(clippy::too_many_arguments)]
    async fn launch_child(
        &self,
        tenant_id: Uuid,
        root_run_id: Uuid,
        parent_run_id: Uuid,
        parent_node_id: Option<String>,
        depth: u32,
        spawn_key: String,
        orchestration_group_id: Option<Uuid>,
        target_agent_slug: &str,
        input_params: Value,
    ) -> Result<Uuid, String>;

    /// Current status of `run_id`, if the host still knows about it.
    async fn run_status(&self, run_id: Uuid) -> Option<RunStatus>;

    /// Cooperatively cancel `run_id` with `reason`. A no-op (not an error)
    /// if the run is already terminal.
    async fn cancel_run(&self, run_id: Uuid, reason: &str) -> Result<(), String>;

    /// The effective (already-narrowed) delegation scopes `run_id` is
    /// operating under, used to enforce `spec.md` §4.7's scope-subset
    /// invariant on further delegation.
    async fn effective_scopes(&self, run_id: Uuid) -> Vec<String>;

    /// The direct children of `run_id`, as recorded by the host's run
    /// store (used by `replan` and by `cancel_subtree` to walk beyond
    /// what the kernel's own lineage cache has seen).
    async fn child_run_ids(&self, run_id: Uuid) -> Vec<Uuid>;
}
