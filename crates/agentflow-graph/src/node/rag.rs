use crate::error::{GraphError, Result};
use crate::node::{ExecutionContext, NodeExecutor};
use crate::run::{GraphState, NodeDelta};
use crate::template;
use crate::types::Node;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// `rag` / `vector_search`: calls `config.pipeline_id` through
/// [`crate::ports::RagPipelines`] with the rendered `config.query` and
/// writes the normalized hits to `context[node_id]`, per SPEC_FULL.md's
/// supplemented RAG pipeline contract.
pub struct RagExecutor;

#[async_trait]
impl NodeExecutor for RagExecutor {
    async fn execute(&self, state: &GraphState, node: &Node, ctx: &ExecutionContext) -> Result<NodeDelta> {
        let pipeline_id = node
            .config
            .get("pipeline_id")
            .and_then(Value::as_str)
            .ok_or_else(|| GraphError::state(Some(node.id.clone()), "rag node missing config.pipeline_id"))?;

        let query_template = node.config.get("query").and_then(Value::as_str).unwrap_or("");
        let query = if ctx.resolved_inputs.len() == 1 {
            ctx.resolved_inputs.values().next().cloned().unwrap_or(Value::Null)
        } else {
            template::resolve_mapping(query_template, state)
        };

        let hits = ctx
            .ports
            .rag
            .execute(pipeline_id, query)
            .await
            .map_err(|reason| {
                GraphError::node_execution(
                    node.id.clone(),
                    std::io::Error::new(std::io::ErrorKind::Other, reason),
                )
            })?;

        let summary = hits
            .iter()
            .map(|hit| hit.text.clone())
            .collect::<Vec<_>>()
            .join("\n");

        let mut context_patch = Map::new();
        context_patch.insert(
            node.id.clone(),
            json!({
                "hits": hits,
                "summary": summary,
            }),
        );

        Ok(NodeDelta::empty().with_context(context_patch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RagHit;
    use crate::types::NodeType;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    struct OneHit;
    #[async_trait]
    impl crate::ports::RagPipelines for OneHit {
        async fn execute(&self, _pipeline_id: &str, _input: Value) -> std::result::Result<Vec<RagHit>, String> {
            Ok(vec![RagHit {
                text: "relevant passage".to_string(),
                metadata: json!({"source": "doc1"}),
                score: 0.9,
            }])
        }
    }

    fn node(config: Value) -> Node {
        Node {
            id: "r1".to_string(),
            node_type: NodeType::Rag,
            position: None,
            config,
            input_mappings: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn writes_hits_and_summary_to_context() {
        use std::sync::Arc;

        let state = GraphState::new(json!({}));
        let mut ctx = crate::test_support::fake_ctx("r1", None);
        let mut ports = (*ctx.ports).clone();
        ports.rag = Arc::new(OneHit);
        ctx.ports = Arc::new(ports);

        let n = node(json!({"pipeline_id": "docs", "query": "hello"}));
        let delta = RagExecutor.execute(&state, &n, &ctx).await.unwrap();
        let patch = delta.context.unwrap();
        let entry = patch.get("r1").unwrap();
        assert_eq!(entry.get("summary"), Some(&json!("relevant passage")));
    }
}
