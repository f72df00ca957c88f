//! Graph Execution Engine.
//!
//! Compiles an authored [`types::Graph`] into an [`compiler::ExecutableWorkflow`]
//! and drives it one node at a time via [`engine::Engine`], merging each
//! node's [`run::NodeDelta`] into [`run::GraphState`] and checkpointing
//! through [`agentflow_checkpoint::CheckpointSaver`] after every step.
//!
//! Grounded in `langgraph-core`'s `StateGraph`/`Pregel` split (author as
//! data, compile once, execute many times), generalized per `spec.md`
//! §4.1-§4.3 from Pregel's parallel-superstep model to one active node per
//! run, and from a user-declared state schema to the fixed `State` shape
//! `spec.md` §3 names.

mod compiler;
mod engine;
mod error;
mod node;
mod ports;
mod run;
mod template;
mod types;

#[cfg(test)]
mod test_support;

pub use compiler::{compile, validate, ExecutableWorkflow};
pub use engine::{CancellationToken, Engine, RunOutcome};
pub use error::{GraphError, Result, ValidationIssue};
pub use node::{ExecutionContext, NodeExecutor, Registry};
pub use ports::{ModelRegistry, OrchestrationPort, Ports, RagHit, RagPipelines, ToolRegistry};
pub use run::{GraphState, NodeDelta, Run, RunStatus};
pub use template::{render, resolve_mapping};
pub use types::{AgentDefinition, AgentStatus, Edge, ExecutionConstraints, Graph, Node, NodeType};
