//! Graph data types: [`AgentDefinition`], [`Graph`], [`Node`], [`Edge`].
//!
//! Structural representation of `spec.md` §3's entities, generalized from
//! `langgraph-core::builder::StateGraph`'s mutable node/edge maps into
//! plain serializable data (the mutable builder lives upstream of this
//! crate; agents are authored as data, not constructed imperatively).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle status of an [`AgentDefinition`]. Immutable once `Published`;
/// edits create a new version rather than mutating in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Draft,
    Published,
    Deprecated,
}

/// A versioned, tenant-owned agent definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub id: uuid::Uuid,
    pub tenant_id: uuid::Uuid,
    pub slug: String,
    pub name: String,
    pub version: u32,
    pub graph: Graph,
    #[serde(default)]
    pub memory_config: serde_json::Value,
    #[serde(default)]
    pub execution_constraints: ExecutionConstraints,
    pub status: AgentStatus,
}

/// Run-level limits enforced by the [`crate::engine::Engine`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionConstraints {
    /// Overall wall-clock budget for the run; `None` means unbounded.
    pub timeout_seconds: Option<u64>,
}

/// The full node/edge structure authored for an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    pub spec_version: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// The enumerated set of executable node types, per `spec.md` §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Start,
    End,
    SetState,
    Transform,
    IfElse,
    Classify,
    Router,
    While,
    UserApproval,
    HumanInput,
    Agent,
    Llm,
    Tool,
    Rag,
    VectorSearch,
    SpawnRun,
    SpawnGroup,
    Join,
    Replan,
    CancelSubtree,
}

impl NodeType {
    /// Node types that suspend the run until an external `resume` call,
    /// per `spec.md` §4.1's interrupt set definition.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, NodeType::UserApproval | NodeType::HumanInput)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeType::Start => "start",
            NodeType::End => "end",
            NodeType::SetState => "set_state",
            NodeType::Transform => "transform",
            NodeType::IfElse => "if_else",
            NodeType::Classify => "classify",
            NodeType::Router => "router",
            NodeType::While => "while",
            NodeType::UserApproval => "user_approval",
            NodeType::HumanInput => "human_input",
            NodeType::Agent => "agent",
            NodeType::Llm => "llm",
            NodeType::Tool => "tool",
            NodeType::Rag => "rag",
            NodeType::VectorSearch => "vector_search",
            NodeType::SpawnRun => "spawn_run",
            NodeType::SpawnGroup => "spawn_group",
            NodeType::Join => "join",
            NodeType::Replan => "replan",
            NodeType::CancelSubtree => "cancel_subtree",
        };
        f.write_str(s)
    }
}

/// One node in an authored [`Graph`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub position: Option<(f64, f64)>,
    #[serde(default)]
    pub config: serde_json::Value,
    /// `name -> template` resolved over `{state, upstream.<node_id>.<key>}`
    /// before `execute` is called, per `spec.md` §4.2.
    #[serde(default)]
    pub input_mappings: HashMap<String, String>,
}

/// A directed connection between two nodes. `source_handle` selects which
/// outgoing branch of a routing node (`if_else`, `classify`, `router`,
/// `while`) this edge follows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}
