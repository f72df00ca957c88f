use crate::error::{GraphError, Result};
use crate::node::{ExecutionContext, NodeExecutor};
use crate::run::{GraphState, NodeDelta};
use crate::types::Node;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Resolves `ctx.resolved_inputs`/`node.config.request` into the JSON
/// payload forwarded to [`crate::ports::OrchestrationPort`]: resolved
/// input mappings take precedence when present (per `spec.md` §4.2's
/// `input_mappings` contract), falling back to a literal `config.request`.
fn request_payload(node: &Node, ctx: &ExecutionContext) -> Value {
    if !ctx.resolved_inputs.is_empty() {
        Value::Object(
            ctx.resolved_inputs
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    } else {
        node.config.get("request").cloned().unwrap_or(Value::Null)
    }
}

fn port_result_to_delta(node: &Node, result: std::result::Result<Value, String>) -> Result<NodeDelta> {
    let value = result.map_err(|e| GraphError::Orchestration(e))?;
    let mut context_patch = Map::new();
    context_patch.insert("orchestration_result".to_string(), value.clone());
    Ok(NodeDelta::empty()
        .with_context(context_patch)
        .with_state(Map::from_iter([(format!("{}_result", node.id), value)])))
}

/// Like [`port_result_to_delta`], but for the two delegation entry points
/// (`spawn_run`/`spawn_group`) that the kernel's [`crate::ports::SpawnPolicy`]
/// (in `agentflow-orchestration`) can reject. A rejection is surfaced as an
/// `orchestration.policy_deny` event (`spec.md` §8 scenario 5) before being
/// propagated as a node failure.
fn spawn_result_to_delta(ctx: &ExecutionContext, node: &Node, result: std::result::Result<Value, String>) -> Result<NodeDelta> {
    if let Err(reason) = &result {
        ctx.emitter.emit_orchestration_policy_deny(serde_json::json!({
            "node_id": node.id,
            "reason": reason,
        }));
    }
    port_result_to_delta(node, result)
}

/// `spawn_run`: delegates to [`crate::ports::OrchestrationPort::spawn_run`],
/// per `spec.md` §4.7.
pub struct SpawnRunExecutor;

#[async_trait]
impl NodeExecutor for SpawnRunExecutor {
    async fn execute(&self, _state: &GraphState, node: &Node, ctx: &ExecutionContext) -> Result<NodeDelta> {
        let request = request_payload(node, ctx);
        let result = ctx.ports.orchestration.spawn_run(&ctx.run_id, request).await;
        spawn_result_to_delta(ctx, node, result)
    }
}

/// `spawn_group`: delegates to [`crate::ports::OrchestrationPort::spawn_group`].
pub struct SpawnGroupExecutor;

#[async_trait]
impl NodeExecutor for SpawnGroupExecutor {
    async fn execute(&self, _state: &GraphState, node: &Node, ctx: &ExecutionContext) -> Result<NodeDelta> {
        let request = request_payload(node, ctx);
        let result = ctx.ports.orchestration.spawn_group(&ctx.run_id, request).await;
        spawn_result_to_delta(ctx, node, result)
    }
}

/// `join`: delegates to [`crate::ports::OrchestrationPort::join`] for the
/// group named by `config.group_id` (or `ctx.resolved_inputs.group_id`).
pub struct JoinExecutor;

#[async_trait]
impl NodeExecutor for JoinExecutor {
    async fn execute(&self, _state: &GraphState, node: &Node, ctx: &ExecutionContext) -> Result<NodeDelta> {
        let group_id = ctx
            .resolved_inputs
            .get("group_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| node.config.get("group_id").and_then(Value::as_str).map(str::to_string))
            .ok_or_else(|| GraphError::state(Some(node.id.clone()), "join node missing group_id"))?;

        let request = request_payload(node, ctx);
        let result = ctx.ports.orchestration.join(&group_id, request).await;
        port_result_to_delta(node, result)
    }
}

/// `replan`: delegates to [`crate::ports::OrchestrationPort::replan`] for
/// the current run.
pub struct ReplanExecutor;

#[async_trait]
impl NodeExecutor for ReplanExecutor {
    async fn execute(&self, _state: &GraphState, node: &Node, ctx: &ExecutionContext) -> Result<NodeDelta> {
        let result = ctx.ports.orchestration.replan(&ctx.run_id).await;
        port_result_to_delta(node, result)
    }
}

/// `cancel_subtree`: delegates to
/// [`crate::ports::OrchestrationPort::cancel_subtree`]; `config.target_run_id`
/// defaults to the current run, `config.include_root` defaults to `false`
/// (cancel descendants only), `config.reason` defaults to a generic message.
pub struct CancelSubtreeExecutor;

#[async_trait]
impl NodeExecutor for CancelSubtreeExecutor {
    async fn execute(&self, _state: &GraphState, node: &Node, ctx: &ExecutionContext) -> Result<NodeDelta> {
        let target_run_id = node
            .config
            .get("target_run_id")
            .and_then(Value::as_str)
            .unwrap_or(ctx.run_id.as_str());
        let include_root = node
            .config
            .get("include_root")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let reason = node
            .config
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("cancel_subtree node invoked");

        let result = ctx
            .ports
            .orchestration
            .cancel_subtree(target_run_id, include_root, reason)
            .await;
        port_result_to_delta(node, result)
    }
}
