use crate::error::{GraphError, Result};
use crate::node::{ExecutionContext, NodeExecutor};
use crate::run::{GraphState, NodeDelta};
use crate::types::Node;
use agentflow_tools::ToolContext;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// `tool`: resolves `config.tool_slug` against [`crate::ports::ToolRegistry`]
/// and dispatches it through the Tool Invocation Layer, per `spec.md` §4.6.
/// A reported [`agentflow_tools::ToolError`] with `FailurePolicy::Continue`
/// surfaces as `delta.error` rather than aborting the run; everything else
/// propagates as a [`GraphError`].
pub struct ToolExecutor;

#[async_trait]
impl NodeExecutor for ToolExecutor {
    async fn execute(&self, state: &GraphState, node: &Node, ctx: &ExecutionContext) -> Result<NodeDelta> {
        let slug = node
            .config
            .get("tool_slug")
            .and_then(Value::as_str)
            .ok_or_else(|| GraphError::state(Some(node.id.clone()), "tool node missing config.tool_slug"))?;

        let tool_def = ctx
            .ports
            .tools
            .resolve(slug)
            .ok_or_else(|| GraphError::state(Some(node.id.clone()), format!("unknown tool '{slug}'")))?;

        let input = if ctx.resolved_inputs.is_empty() {
            node.config.get("input").cloned().unwrap_or(Value::Null)
        } else if ctx.resolved_inputs.len() == 1 {
            ctx.resolved_inputs.values().next().cloned().unwrap_or(Value::Null)
        } else {
            Value::Object(
                ctx.resolved_inputs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            )
        };
        let _ = state;

        let tool_ctx = ToolContext {
            run_id: ctx.run_id.clone(),
            emitter: Some(ctx.emitter.clone()),
            circuit_breaker: &ctx.ports.circuit_breaker,
        };
        let implementations = ctx.ports.tools.implementations();
        let outcome = agentflow_tools::invoke(&tool_def, input, implementations.as_ref(), &tool_ctx)
            .await
            .map_err(|e| GraphError::node_execution(node.id.clone(), e))?;

        let output_key = node
            .config
            .get("output_key")
            .and_then(Value::as_str)
            .unwrap_or(node.id.as_str());

        let mut context_patch = Map::new();
        if let Some(output) = &outcome.output {
            context_patch.insert(output_key.to_string(), output.clone());
        }

        Ok(NodeDelta {
            context: Some(context_patch),
            tool_outputs: outcome.output.clone().map(|v| vec![v]),
            error: outcome.error.clone(),
            ..NodeDelta::empty()
        })
    }
}
