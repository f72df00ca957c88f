//! Node executors: one `execute` implementation per [`crate::types::NodeType`],
//! dispatched from a [`Registry`] the way `langgraph-core::pregel` dispatches
//! by node id, generalized to a trait object per node *type* rather than
//! per node instance (`spec.md` §4.2 describes contracts per type, not per
//! authored node).

mod agent;
mod control;
mod interrupt;
mod orchestration;
mod rag;
mod tool;

use crate::error::Result;
use crate::ports::Ports;
use crate::run::{GraphState, NodeDelta};
use crate::types::{Node, NodeType};
use agentflow_stream::Emitter;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a [`NodeExecutor`] needs beyond the current [`GraphState`]:
/// the run's id, its ambient emitter, already-resolved `input_mappings`,
/// the resume payload (set only when re-entering an interrupt node after
/// `resume`), and the injected [`Ports`].
pub struct ExecutionContext {
    pub run_id: String,
    pub emitter: Emitter,
    pub resolved_inputs: HashMap<String, Value>,
    pub resume_payload: Option<Value>,
    pub ports: Arc<Ports>,
}

/// The contract every node type implements: `spec.md` §4.2's
/// `execute(state, config, ctx) -> delta`.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    async fn execute(&self, state: &GraphState, node: &Node, ctx: &ExecutionContext) -> Result<NodeDelta>;
}

/// Dispatches a [`Node`] to its [`NodeExecutor`] by [`NodeType`]. One
/// instance is shared across all runs of all agents; executors are
/// stateless, so no per-run construction is needed.
pub struct Registry {
    executors: HashMap<NodeType, Box<dyn NodeExecutor>>,
}

impl Registry {
    /// Build the registry with the full built-in node-type set from
    /// `spec.md` §4.2.
    pub fn new() -> Self {
        let mut executors: HashMap<NodeType, Box<dyn NodeExecutor>> = HashMap::new();
        executors.insert(NodeType::Start, Box::new(control::StartExecutor));
        executors.insert(NodeType::End, Box::new(control::EndExecutor));
        executors.insert(NodeType::SetState, Box::new(control::SetStateExecutor));
        executors.insert(NodeType::Transform, Box::new(control::TransformExecutor));
        executors.insert(NodeType::IfElse, Box::new(control::IfElseExecutor));
        executors.insert(NodeType::Router, Box::new(control::RouterExecutor));
        executors.insert(NodeType::While, Box::new(control::WhileExecutor));
        executors.insert(NodeType::UserApproval, Box::new(interrupt::InterruptExecutor));
        executors.insert(NodeType::HumanInput, Box::new(interrupt::InterruptExecutor));
        executors.insert(NodeType::Agent, Box::new(agent::AgentExecutor));
        executors.insert(NodeType::Llm, Box::new(agent::AgentExecutor));
        executors.insert(NodeType::Classify, Box::new(agent::ClassifyExecutor));
        executors.insert(NodeType::Tool, Box::new(tool::ToolExecutor));
        executors.insert(NodeType::Rag, Box::new(rag::RagExecutor));
        executors.insert(NodeType::VectorSearch, Box::new(rag::RagExecutor));
        executors.insert(NodeType::SpawnRun, Box::new(orchestration::SpawnRunExecutor));
        executors.insert(NodeType::SpawnGroup, Box::new(orchestration::SpawnGroupExecutor));
        executors.insert(NodeType::Join, Box::new(orchestration::JoinExecutor));
        executors.insert(NodeType::Replan, Box::new(orchestration::ReplanExecutor));
        executors.insert(
            NodeType::CancelSubtree,
            Box::new(orchestration::CancelSubtreeExecutor),
        );
        Self { executors }
    }

    pub fn get(&self, node_type: NodeType) -> Option<&dyn NodeExecutor> {
        self.executors.get(&node_type).map(|b| b.as_ref())
    }

    /// Register or replace the executor for a node type, for embedders
    /// that need a custom implementation of a built-in type.
    pub fn register(&mut self, node_type: NodeType, executor: Box<dyn NodeExecutor>) {
        self.executors.insert(node_type, executor);
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
