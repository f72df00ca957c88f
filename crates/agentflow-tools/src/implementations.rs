use crate::definition::ImplementationKind;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// External collaborator that actually performs a tool call, dispatched by
/// [`ImplementationKind`] (`spec.md` §6's `ToolImplementations` port).
/// Injected by the host application; `agentflow-tools` only owns the
/// contract (schema validation, retry, circuit breaking) around the call.
#[async_trait]
pub trait ToolImplementations: Send + Sync {
    /// Perform one call. `config` is the tool's `implementation.config`
    /// (e.g. an HTTP endpoint, a builtin function name); `input` has
    /// already passed `input_schema` validation.
    async fn invoke(&self, kind: ImplementationKind, config: &Value, input: &Value) -> Result<Value>;
}
