use thiserror::Error;

/// Convenience alias for `Result<T, OrchestrationError>`.
pub type Result<T> = std::result::Result<T, OrchestrationError>;

/// Errors raised by the orchestration kernel itself, distinct from the
/// string-typed errors [`agentflow_graph::ports::OrchestrationPort`]
/// returns to node executors (the kernel converts these to strings at
/// that boundary so `agentflow-graph` need not depend on this crate's
/// error type).
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("run '{0}' not found")]
    RunNotFound(String),

    #[error("orchestration group '{0}' not found")]
    GroupNotFound(String),

    #[error("policy violation: {0}")]
    PolicyDenied(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("run host failure: {0}")]
    HostFailure(String),
}

/// The boundary conversion [`crate::kernel::Kernel`] relies on via `?` when
/// implementing [`agentflow_graph::OrchestrationPort`], whose methods
/// return `Result<_, String>`.
impl From<OrchestrationError> for String {
    fn from(err: OrchestrationError) -> Self {
        err.to_string()
    }
}
