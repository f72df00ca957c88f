use crate::error::{GraphError, Result};
use crate::node::{ExecutionContext, NodeExecutor};
use crate::run::{GraphState, NodeDelta};
use crate::template;
use crate::types::Node;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// `start`: no-op boundary marker. The Engine brackets every node with
/// `node_start`/`node_end`; this executor contributes no delta.
pub struct StartExecutor;

#[async_trait]
impl NodeExecutor for StartExecutor {
    async fn execute(&self, _state: &GraphState, _node: &Node, _ctx: &ExecutionContext) -> Result<NodeDelta> {
        Ok(NodeDelta::empty())
    }
}

/// `end`: renders `config.output_message` against `{state, upstream}` and
/// sets `final_output`, per `spec.md` §4.2.
pub struct EndExecutor;

#[async_trait]
impl NodeExecutor for EndExecutor {
    async fn execute(&self, state: &GraphState, node: &Node, _ctx: &ExecutionContext) -> Result<NodeDelta> {
        let template_str = node
            .config
            .get("output_message")
            .and_then(Value::as_str)
            .unwrap_or("");
        let rendered = template::render(template_str, state);
        Ok(NodeDelta {
            final_output: Some(Value::String(rendered)),
            ..NodeDelta::empty()
        })
    }
}

/// `set_state`: applies `config.assignments` (each value a literal or a
/// `{{...}}` template) to `state`; never touches `messages`.
pub struct SetStateExecutor;

#[async_trait]
impl NodeExecutor for SetStateExecutor {
    async fn execute(&self, state: &GraphState, node: &Node, _ctx: &ExecutionContext) -> Result<NodeDelta> {
        let assignments = node
            .config
            .get("assignments")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let mut patch = Map::new();
        for (key, template_value) in assignments {
            let resolved = match template_value {
                Value::String(s) => template::resolve_mapping(&s, state),
                other => other,
            };
            patch.insert(key, resolved);
        }
        Ok(NodeDelta::empty().with_state(patch))
    }
}

/// `transform`: computes a value from `ctx.resolved_inputs` and writes it
/// to both `context[node_id]` and the top-level `transform_output` state
/// key.
pub struct TransformExecutor;

#[async_trait]
impl NodeExecutor for TransformExecutor {
    async fn execute(&self, _state: &GraphState, node: &Node, ctx: &ExecutionContext) -> Result<NodeDelta> {
        let value = if ctx.resolved_inputs.len() == 1 {
            ctx.resolved_inputs.values().next().cloned().unwrap_or(Value::Null)
        } else {
            Value::Object(
                ctx.resolved_inputs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            )
        };

        let mut context_patch = Map::new();
        context_patch.insert(node.id.clone(), value.clone());
        let mut state_patch = Map::new();
        state_patch.insert("transform_output".to_string(), value);

        Ok(NodeDelta::empty()
            .with_context(context_patch)
            .with_state(state_patch))
    }
}

/// One entry of `if_else`/`while`'s `config.conditions`: the branch taken
/// when `state.resolve_path(path) == equals`.
fn first_matching_branch(state: &GraphState, conditions: &[Value], else_branch: &str) -> String {
    for condition in conditions {
        let Some(branch) = condition.get("branch").and_then(Value::as_str) else {
            continue;
        };
        let Some(path) = condition.get("path").and_then(Value::as_str) else {
            continue;
        };
        let expected = condition.get("equals").cloned().unwrap_or(Value::Null);
        if state.resolve_path(path).as_ref() == Some(&expected) {
            return branch.to_string();
        }
    }
    else_branch.to_string()
}

/// `if_else`: evaluates `config.conditions` in order; the first match's
/// `branch` becomes `branch_taken`; `config.else_branch` (default
/// `"else"`) is the fallback.
pub struct IfElseExecutor;

#[async_trait]
impl NodeExecutor for IfElseExecutor {
    async fn execute(&self, state: &GraphState, node: &Node, _ctx: &ExecutionContext) -> Result<NodeDelta> {
        let conditions = node
            .config
            .get("conditions")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let else_branch = node
            .config
            .get("else_branch")
            .and_then(Value::as_str)
            .unwrap_or("else");
        let branch = first_matching_branch(state, &conditions, else_branch);
        Ok(NodeDelta::empty().with_branch(branch))
    }
}

/// `router`: reads `config.key` from the latest orchestration payload
/// (`context.orchestration_result` by convention) and picks a route from
/// `config.routes` by exact match, else `"default"`.
pub struct RouterExecutor;

#[async_trait]
impl NodeExecutor for RouterExecutor {
    async fn execute(&self, state: &GraphState, node: &Node, _ctx: &ExecutionContext) -> Result<NodeDelta> {
        let key_path = node
            .config
            .get("key")
            .and_then(Value::as_str)
            .unwrap_or("context.orchestration_result.route");
        let routes = node
            .config
            .get("routes")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let observed = state.resolve_path(key_path);
        let branch = observed
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|key| routes.get(key))
            .and_then(Value::as_str)
            .unwrap_or("default")
            .to_string();

        Ok(NodeDelta::empty().with_branch(branch))
    }
}

/// `while`: evaluates `config.predicate` (the same `{path, equals}` shape
/// as `if_else`'s conditions) and emits `"loop"` when it matches, `"exit"`
/// otherwise.
pub struct WhileExecutor;

#[async_trait]
impl NodeExecutor for WhileExecutor {
    async fn execute(&self, state: &GraphState, node: &Node, _ctx: &ExecutionContext) -> Result<NodeDelta> {
        let Some(predicate) = node.config.get("predicate") else {
            return Err(GraphError::state(
                Some(node.id.clone()),
                "while node missing config.predicate",
            ));
        };
        let branch = first_matching_branch(state, std::slice::from_ref(predicate), "exit");
        // `first_matching_branch` treats a non-matching predicate as the
        // else branch; a match yields the predicate's own `branch` field
        // (conventionally `"loop"`).
        Ok(NodeDelta::empty().with_branch(branch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeType};
    use serde_json::json;
    use std::collections::HashMap;

    fn node(node_type: NodeType, config: Value) -> Node {
        Node {
            id: "n1".to_string(),
            node_type,
            position: None,
            config,
            input_mappings: HashMap::new(),
        }
    }

    fn test_ctx() -> ExecutionContext {
        crate::test_support::fake_ctx("r1", None)
    }

    #[tokio::test]
    async fn end_renders_output_message() {
        let state = GraphState::new(json!({"x": "v"}));
        let n = node(NodeType::End, json!({"output_message": "got {{state.x}}"}));
        let delta = EndExecutor.execute(&state, &n, &test_ctx()).await.unwrap();
        assert_eq!(delta.final_output, Some(json!("got v")));
    }

    #[tokio::test]
    async fn set_state_applies_literal_and_template_assignments() {
        let state = GraphState::new(json!({"x": "v"}));
        let n = node(
            NodeType::SetState,
            json!({"assignments": {"y": 1, "z": "{{state.x}}"}}),
        );
        let delta = SetStateExecutor.execute(&state, &n, &test_ctx()).await.unwrap();
        let patch = delta.state.unwrap();
        assert_eq!(patch.get("y"), Some(&json!(1)));
        assert_eq!(patch.get("z"), Some(&json!("v")));
    }

    #[tokio::test]
    async fn if_else_picks_first_matching_branch() {
        let state = GraphState::new(json!({"x": "a"}));
        let n = node(
            NodeType::IfElse,
            json!({"conditions": [{"branch": "is_a", "path": "state.x", "equals": "a"}]}),
        );
        let delta = IfElseExecutor.execute(&state, &n, &test_ctx()).await.unwrap();
        assert_eq!(delta.branch_taken.as_deref(), Some("is_a"));
    }

    #[tokio::test]
    async fn if_else_falls_back_to_else() {
        let state = GraphState::new(json!({"x": "a"}));
        let n = node(
            NodeType::IfElse,
            json!({"conditions": [{"branch": "is_b", "path": "state.x", "equals": "b"}]}),
        );
        let delta = IfElseExecutor.execute(&state, &n, &test_ctx()).await.unwrap();
        assert_eq!(delta.branch_taken.as_deref(), Some("else"));
    }

    #[tokio::test]
    async fn while_loop_exits_when_predicate_fails() {
        let state = GraphState::new(json!({"count": 5}));
        let n = node(
            NodeType::While,
            json!({"predicate": {"branch": "loop", "path": "state.count", "equals": 0}}),
        );
        let delta = WhileExecutor.execute(&state, &n, &test_ctx()).await.unwrap();
        assert_eq!(delta.branch_taken.as_deref(), Some("exit"));
    }
}
