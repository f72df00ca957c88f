//! Error types for graph compilation and execution.
//!
//! Mirrors `langgraph-core::error::GraphError`'s shape: one `thiserror` enum
//! covering compilation, execution, interrupt, and state errors, with a
//! crate-local [`Result`] alias.

use thiserror::Error;

/// Convenience alias for `Result<T, GraphError>`.
pub type Result<T> = std::result::Result<T, GraphError>;

/// A single structural problem found by [`crate::compiler::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A node references a `type` not in the known node-type set.
    UnknownNodeType { node_id: String, node_type: String },
    /// Two nodes in the same graph share an id.
    DuplicateNodeId { node_id: String },
    /// An edge's `source` or `target` does not name a node in the graph.
    DanglingEdge { edge_id: String },
    /// No `start` node is present.
    MissingStart,
    /// More than one `start` node is present.
    MultipleStart { node_ids: Vec<String> },
    /// A node has no path to it from `start` (warning).
    UnreachableNode { node_id: String },
    /// No `end` node is reachable from `start` (warning).
    MissingEnd,
    /// A `tool` node references a tool slug not declared in `config.tools`.
    UnknownTool { node_id: String, tool_slug: String },
    /// An `agent`/`llm` node references an unresolvable `model_id`.
    UnknownModel { node_id: String, model_id: String },
    /// A node's `config` failed schema validation for its node type.
    SchemaInvalid { node_id: String, reason: String },
}

impl ValidationIssue {
    /// Structural errors are fatal (block compilation); semantic warnings
    /// do not, per `spec.md` §4.1's validation policy.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ValidationIssue::UnreachableNode { .. } | ValidationIssue::MissingEnd
        )
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::UnknownNodeType { node_id, node_type } => {
                write!(f, "node '{node_id}' has unknown type '{node_type}'")
            }
            ValidationIssue::DuplicateNodeId { node_id } => {
                write!(f, "duplicate node id '{node_id}'")
            }
            ValidationIssue::DanglingEdge { edge_id } => {
                write!(f, "edge '{edge_id}' references a node that does not exist")
            }
            ValidationIssue::MissingStart => write!(f, "graph has no start node"),
            ValidationIssue::MultipleStart { node_ids } => {
                write!(f, "graph has multiple start nodes: {node_ids:?}")
            }
            ValidationIssue::UnreachableNode { node_id } => {
                write!(f, "node '{node_id}' is unreachable from start")
            }
            ValidationIssue::MissingEnd => write!(f, "graph has no reachable end node"),
            ValidationIssue::UnknownTool { node_id, tool_slug } => {
                write!(f, "node '{node_id}' references unknown tool '{tool_slug}'")
            }
            ValidationIssue::UnknownModel { node_id, model_id } => {
                write!(f, "node '{node_id}' references unknown model '{model_id}'")
            }
            ValidationIssue::SchemaInvalid { node_id, reason } => {
                write!(f, "node '{node_id}' config invalid: {reason}")
            }
        }
    }
}

/// Errors raised while compiling, validating, or executing a graph.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Compilation failed because of one or more fatal [`ValidationIssue`]s.
    #[error("graph validation failed: {0:?}")]
    Validation(Vec<ValidationIssue>),

    /// A node executor returned an error during execution.
    #[error("node '{node}' execution failed: {source}")]
    NodeExecution {
        node: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The run hit an interrupt-class node and must pause.
    #[error("run interrupted at node '{node}': {reason}")]
    Interrupted { node: String, reason: String },

    /// A state merge or template-resolution error.
    #[error("state error{}: {message}", node.as_ref().map(|n| format!(" at node '{n}'")).unwrap_or_default())]
    State {
        node: Option<String>,
        message: String,
    },

    /// Checkpoint read/write failed.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] agentflow_checkpoint::CheckpointError),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A tool or LLM call failed in a way the engine could not route.
    #[error("tool error: {0}")]
    Tool(#[from] agentflow_tools::ToolError),

    /// An orchestration-delegating node (`spawn_run`, `join`, …) failed.
    #[error("orchestration error: {0}")]
    Orchestration(String),

    /// The run-level `execution_constraints.timeout_seconds` was exceeded.
    #[error("run timed out after {0}s")]
    Timeout(u64),

    /// The run was cancelled cooperatively; not a failure.
    #[error("run cancelled: {0}")]
    Cancelled(String),

    /// An unexpected condition not covered by a more specific variant.
    #[error("{0}")]
    Custom(String),
}

impl GraphError {
    pub fn node_execution(
        node: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        GraphError::NodeExecution {
            node: node.into(),
            source: Box::new(error),
        }
    }

    pub fn interrupted(node: impl Into<String>, reason: impl Into<String>) -> Self {
        GraphError::Interrupted {
            node: node.into(),
            reason: reason.into(),
        }
    }

    pub fn state(node: Option<String>, message: impl Into<String>) -> Self {
        GraphError::State {
            node,
            message: message.into(),
        }
    }
}
