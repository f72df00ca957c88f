//! Traits node executors call against for everything the core doesn't
//! implement itself (`spec.md` §1/§6): model resolution, tool dispatch,
//! RAG retrieval, and orchestration delegation. Concrete implementations
//! are wired in by the host application at `agentflow-runtime`.

use agentflow_llm::ChatModel;
use agentflow_tools::{CircuitBreaker, ToolDefinition, ToolImplementations};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Resolves a configured `model_id` to a bound chat model.
pub trait ModelRegistry: Send + Sync {
    fn resolve(&self, model_id: &str) -> Option<Arc<dyn ChatModel>>;
}

/// Resolves a configured tool slug to its contract and exposes the
/// dispatcher that actually executes calls.
pub trait ToolRegistry: Send + Sync {
    fn resolve(&self, slug: &str) -> Option<ToolDefinition>;
    fn implementations(&self) -> Arc<dyn ToolImplementations>;
}

/// One retrieved hit from a RAG pipeline.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RagHit {
    pub text: String,
    pub metadata: Value,
    pub score: f64,
}

/// External RAG subsystem (`spec.md` §6's `RAGPipelines` port).
#[async_trait]
pub trait RagPipelines: Send + Sync {
    async fn execute(&self, pipeline_id: &str, input: Value) -> Result<Vec<RagHit>, String>;
}

/// The minimal surface `spawn_run`/`spawn_group`/`join`/`replan`/
/// `cancel_subtree` node executors delegate to (`spec.md` §4.7). Defined
/// here (not in `agentflow-orchestration`) so the dependency runs
/// graph → orchestration rather than the reverse; `agentflow-orchestration::Kernel`
/// implements this trait and is wired in at `agentflow-runtime`.
#[async_trait]
pub trait OrchestrationPort: Send + Sync {
    async fn spawn_run(&self, caller_run_id: &str, request: Value) -> Result<Value, String>;
    async fn spawn_group(&self, caller_run_id: &str, request: Value) -> Result<Value, String>;
    async fn join(&self, group_id: &str, request: Value) -> Result<Value, String>;
    async fn replan(&self, run_id: &str) -> Result<Value, String>;
    async fn cancel_subtree(&self, run_id: &str, include_root: bool, reason: &str) -> Result<Value, String>;
}

/// The bundle of collaborators an [`crate::node::ExecutionContext`] carries,
/// plus the run's own circuit breaker (owned per run, per `spec.md` §5).
#[derive(Clone)]
pub struct Ports {
    pub models: Arc<dyn ModelRegistry>,
    pub tools: Arc<dyn ToolRegistry>,
    pub rag: Arc<dyn RagPipelines>,
    pub orchestration: Arc<dyn OrchestrationPort>,
    pub circuit_breaker: Arc<CircuitBreaker>,
}
