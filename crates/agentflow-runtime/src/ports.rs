//! The traits a host application implements to plug real collaborators
//! into a [`crate::api::Runtime`] (`spec.md` §6). `agentflow-runtime`
//! ships no concrete backend for any of these — matching
//! `langgraph-core::llm::traits`'s stated philosophy that the core only
//! ships the trait, never a provider.

use agentflow_graph::{AgentDefinition, Run};
use async_trait::async_trait;
use uuid::Uuid;

/// Chat-completions provider contract, re-exported under the name
/// `spec.md` §6 uses (`ModelProvider`) for the trait `agentflow_llm::ChatModel`
/// already defines.
pub use agentflow_llm::ChatModel as ModelProvider;

/// External tool dispatch, re-exported from `agentflow-tools` under the
/// same name `spec.md` §6 uses.
pub use agentflow_tools::ToolImplementations;

/// External RAG subsystem, re-exported from `agentflow-graph` (which
/// defines it to avoid a cyclic dependency on a retrieval crate).
pub use agentflow_graph::RagPipelines;

/// Durable storage for [`AgentDefinition`]s, keyed by tenant + slug (the
/// current published version) or by id + version (a pinned version).
/// Mirrors `orchestrator::db::repositories::workflow_repo`'s lookup shape,
/// generalized from workflow rows to full agent definitions.
#[async_trait]
pub trait AgentStore: Send + Sync {
    async fn get_by_slug(&self, tenant_id: Uuid, slug: &str) -> Option<AgentDefinition>;
    async fn get_by_id(&self, agent_id: Uuid, version: u32) -> Option<AgentDefinition>;
}

/// Durable storage for [`Run`]s, including the parent/child index
/// [`crate::host::RuntimeHost`] needs to answer
/// [`agentflow_orchestration::RunHost::child_run_ids`].
#[async_trait]
pub trait RunStore: Send + Sync {
    async fn put(&self, run: Run);
    async fn get(&self, run_id: Uuid) -> Option<Run>;
    async fn children_of(&self, run_id: Uuid) -> Vec<Uuid>;
}

/// Resolves the delegation scopes an agent is entitled to operate under.
/// A deliberate simplification of `original_source`'s delegation-grant/
/// token-minting machinery (see `DESIGN.md`): this runtime tracks the
/// scope an agent *may* use, not a narrowed-per-run token chain.
#[async_trait]
pub trait DelegationService: Send + Sync {
    async fn scopes_for_agent(&self, agent_slug: &str) -> Vec<String>;
}

/// Injectable wall-clock, so timeout-driven behavior (`join`'s
/// `elapsed_s`) is deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> chrono::DateTime<chrono::Utc>;
}

/// The real system clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }
}
