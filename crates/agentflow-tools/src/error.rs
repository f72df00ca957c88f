use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors from [`crate::invoke::invoke`], grounded in
/// `langgraph-core::tool::ToolError` generalized with the
/// circuit-breaker/schema-validation cases `spec.md` §4.6 names.
#[derive(Error, Debug, Clone)]
pub enum ToolError {
    /// `input` failed `tool_def.input_schema` validation.
    #[error("tool input invalid: {0}")]
    SchemaInvalid(String),

    /// The final outcome failed `tool_def.output_schema` validation.
    #[error("tool output invalid: {0}")]
    OutputInvalid(String),

    /// No attempt completed within `timeout_s`.
    #[error("tool call timed out after {0}s")]
    Timeout(u64),

    /// The underlying implementation reported a failure.
    #[error("tool invocation failed: {0}")]
    ProviderFailure(String),

    /// The tool is disabled for the remainder of the run: its circuit
    /// breaker tripped after `threshold` consecutive failures.
    #[error("tool '{tool}' disabled after {threshold} consecutive failures")]
    CircuitOpen { tool: String, threshold: u32 },

    /// No [`crate::ToolImplementations`] entry matches the tool's
    /// `implementation.kind`.
    #[error("no implementation registered for tool kind '{0}'")]
    UnknownImplementation(String),
}

impl ToolError {
    /// The short machine-readable code attached to `on_tool_end`'s error
    /// payload (`spec.md` §4.6 step 1: `{error, code: "schema_invalid"}`).
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::SchemaInvalid(_) => "schema_invalid",
            ToolError::OutputInvalid(_) => "output_invalid",
            ToolError::Timeout(_) => "timeout",
            ToolError::ProviderFailure(_) => "provider_failure",
            ToolError::CircuitOpen { .. } => "circuit_open",
            ToolError::UnknownImplementation(_) => "unknown_implementation",
        }
    }
}
