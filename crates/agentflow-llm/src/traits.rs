use crate::config::ChatRequest;
use crate::error::Result;
use crate::response::{ChatResponse, ChatStreamResponse};
use crate::tools::ToolDefinition;
use async_trait::async_trait;

/// Provider-agnostic interface for a chat-completions model.
///
/// The core ships this trait only — no concrete OpenAI/Anthropic/Ollama
/// client — matching `langgraph-core::llm::traits::ChatModel`'s stated
/// philosophy that the graph engine is an orchestration framework, not an
/// LLM client library. Callers inject an `Arc<dyn ChatModel>` implementing
/// this for whichever provider they use.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a complete response (no intermediate token events).
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Stream a response; the agent executor emits a [`crate::response::ChatStreamChunk::Token`]
    /// as a `token` event through the ambient emitter for each chunk.
    async fn stream(&self, request: ChatRequest) -> Result<ChatStreamResponse>;

    /// Health check, primarily useful for self-hosted providers. Default
    /// assumes availability.
    async fn is_available(&self) -> Result<bool> {
        Ok(true)
    }

    /// Tools this model has been configured with out-of-band (distinct
    /// from the per-request `ChatRequest::tools`), if any.
    fn bound_tools(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }
}
