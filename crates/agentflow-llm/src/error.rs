use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors a [`crate::ChatModel`] implementation may return. The core never
/// implements a provider itself (`spec.md` §1's "LLM/embedding providers"
/// are out of scope); this enum is the contract a provider adapter
/// reports against, grounded in `langgraph-core::error::GraphError`'s
/// validation/timeout/custom split.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The provider rejected the request (bad model id, malformed
    /// messages, unsupported config).
    #[error("invalid chat request: {0}")]
    InvalidRequest(String),

    /// The provider call failed (network, auth, rate limit, 5xx).
    #[error("provider call failed: {0}")]
    ProviderFailure(String),

    /// The provider did not respond within the configured budget.
    #[error("provider call timed out")]
    Timeout,

    /// The model's final text was expected to parse as the configured
    /// `output_format` (e.g. `json`) and did not.
    #[error("failed to parse model output as {expected}: {reason}")]
    OutputParse { expected: String, reason: String },
}
