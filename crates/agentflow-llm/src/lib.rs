//! Provider-agnostic `ChatModel` contract for the `agent`/`llm` node type.
//!
//! Grounded in `langgraph-core::llm::{traits,config,tools}`: the core
//! defines message/request/response/tool-call wire types and a `ChatModel`
//! trait; no concrete provider is shipped, per `spec.md` §1 ("LLM/embedding
//! providers" are out of scope — external collaborators only).

mod config;
mod error;
mod message;
mod response;
mod tools;
mod traits;

pub use config::{ChatConfig, ChatRequest, ReasoningMode};
pub use error::{LlmError, Result};
pub use message::{Message, MessageRole};
pub use response::{ChatResponse, ChatStreamChunk, ChatStreamResponse, TokenUsage};
pub use tools::{ToolCall, ToolDefinition};
pub use traits::ChatModel;
