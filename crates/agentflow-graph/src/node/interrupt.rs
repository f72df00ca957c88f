use crate::error::{GraphError, Result};
use crate::node::{ExecutionContext, NodeExecutor};
use crate::run::{GraphState, NodeDelta};
use crate::types::Node;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// `user_approval` / `human_input`: on first visit, raises
/// [`GraphError::Interrupted`] so the Engine pauses the run; on resume
/// (`ctx.resume_payload` is set), merges the payload into `state` and lets
/// the Engine continue past this node.
pub struct InterruptExecutor;

#[async_trait]
impl NodeExecutor for InterruptExecutor {
    async fn execute(&self, _state: &GraphState, node: &Node, ctx: &ExecutionContext) -> Result<NodeDelta> {
        let Some(payload) = &ctx.resume_payload else {
            let reason = node
                .config
                .get("prompt")
                .and_then(Value::as_str)
                .unwrap_or("awaiting input")
                .to_string();
            return Err(GraphError::interrupted(node.id.clone(), reason));
        };

        let patch = match payload {
            Value::Object(map) => map.clone(),
            other => {
                let mut map = Map::new();
                map.insert("input".to_string(), other.clone());
                map
            }
        };
        Ok(NodeDelta::empty().with_state(patch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn node() -> Node {
        Node {
            id: "approve".to_string(),
            node_type: crate::types::NodeType::UserApproval,
            position: None,
            config: json!({"prompt": "approve?"}),
            input_mappings: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn first_visit_raises_interrupt() {
        let state = GraphState::new(json!({}));
        let ctx = crate::test_support::fake_ctx("r1", None);
        let result = InterruptExecutor.execute(&state, &node(), &ctx).await;
        assert!(matches!(result, Err(GraphError::Interrupted { .. })));
    }

    #[tokio::test]
    async fn resume_merges_payload_into_state() {
        let state = GraphState::new(json!({}));
        let ctx = crate::test_support::fake_ctx("r1", Some(json!({"approval": "approve"})));
        let delta = InterruptExecutor.execute(&state, &node(), &ctx).await.unwrap();
        let patch = delta.state.unwrap();
        assert_eq!(patch.get("approval"), Some(&json!("approve")));
    }
}
