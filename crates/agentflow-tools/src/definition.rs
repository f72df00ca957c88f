use agentflow_tooling::async_utils::RetryPolicy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Publication status of a [`ToolDefinition`], mirroring [`crate::ToolDefinition`]'s
/// sibling entity `AgentDefinition::status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Draft,
    Published,
    Deprecated,
}

/// What happens when a tool call exhausts retries and still fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Propagate an error to the Engine, terminating the run.
    FailFast,
    /// Return an error payload and let the agent loop decide.
    Continue,
}

/// Which [`crate::ToolImplementations`] variant dispatches a tool's calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplementationKind {
    Builtin,
    Http,
    RagRetrieval,
    Artifact,
    Custom,
}

/// How a tool is actually dispatched: its [`ImplementationKind`] plus
/// kind-specific configuration (endpoint URL, builtin function name, …),
/// opaque to this crate and interpreted by the registered
/// [`crate::ToolImplementations`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Implementation {
    pub kind: ImplementationKind,
    #[serde(default)]
    pub config: Value,
}

/// Retry/timeout/circuit-breaker/failure-handling configuration for one
/// tool, per `spec.md` §3's `ToolDefinition.execution_config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub timeout_s: u64,
    pub retry: RetryPolicy,
    pub failure_policy: FailurePolicy,
    pub circuit_breaker_threshold: u32,
}

/// A contract-first tool an `agent`/`tool` node may invoke.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub id: uuid::Uuid,
    pub slug: String,
    pub status: ToolStatus,
    pub version: u32,
    pub input_schema: Value,
    pub output_schema: Value,
    pub implementation: Implementation,
    pub execution_config: ExecutionConfig,
}
