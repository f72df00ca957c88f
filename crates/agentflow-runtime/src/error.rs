use thiserror::Error;

/// Convenience alias for `Result<T, AgentflowError>`.
pub type Result<T> = std::result::Result<T, AgentflowError>;

/// The top-level error taxonomy the Runtime API surfaces, wrapping each
/// domain crate's own error type the way `langgraph-core::error::GraphError`
/// wraps `CheckpointError`/`serde_json::Error` via `#[from]`.
#[derive(Debug, Error)]
pub enum AgentflowError {
    #[error("agent '{0}' not found")]
    AgentNotFound(String),

    #[error("run '{0}' not found")]
    RunNotFound(String),

    #[error(transparent)]
    Graph(#[from] agentflow_graph::GraphError),

    #[error(transparent)]
    Checkpoint(#[from] agentflow_checkpoint::CheckpointError),

    #[error(transparent)]
    Orchestration(#[from] agentflow_orchestration::OrchestrationError),

    #[error("run is not paused, cannot resume")]
    NotPaused,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
