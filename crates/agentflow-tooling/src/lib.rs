//! Ambient tooling shared across the agentflow workspace.
//!
//! This crate provides the "boring" cross-cutting concerns so that the
//! domain crates (`agentflow-graph`, `agentflow-tools`, `agentflow-orchestration`, …)
//! don't each reinvent them:
//!
//! - `error` - error chain formatting / context helpers
//! - `logging` - `tracing`-based timing helpers
//! - `config` - environment-driven configuration loading
//! - `async_utils` - retry policy and timeout helpers for async operations

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;

use thiserror::Error;

/// Errors that can occur in the tooling crate itself.
#[derive(Debug, Error)]
pub enum ToolingError {
    /// General error with message.
    #[error("tooling error: {0}")]
    General(String),

    /// Environment variable was present but failed to parse.
    #[error("invalid value for env var {name}: {value}")]
    InvalidEnvValue {
        /// Name of the offending environment variable.
        name: String,
        /// Raw value that failed to parse.
        value: String,
    },
}

/// Result type for tooling operations.
pub type Result<T> = std::result::Result<T, ToolingError>;
