//! Contract-first tool invocation: schema validation, retry with
//! exponential backoff, per-attempt timeout, and per-run circuit breaking.
//!
//! Grounded in `langgraph-core::tool::{Tool, ToolRegistry}` for the
//! contract shape and `tooling::async_utils::retry::RetryPolicy` +
//! `orchestrator::executor::retry` for the backoff/circuit-breaker
//! mechanics.

mod circuit;
mod definition;
mod error;
mod implementations;
mod invoke;

pub use circuit::CircuitBreaker;
pub use definition::{
    ExecutionConfig, FailurePolicy, Implementation, ImplementationKind, ToolDefinition, ToolStatus,
};
pub use error::{Result, ToolError};
pub use implementations::ToolImplementations;
pub use invoke::{invoke, ToolContext, ToolOutcome};
