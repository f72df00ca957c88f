use crate::message::Message;
use futures::stream::BoxStream;

/// A completed, non-streamed model response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub message: Message,
    pub reasoning: Option<String>,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// One element of a streamed response, per `spec.md` §9's redesign note
/// ("represent as a sum type `{TokenChunk | ToolCallChunk | FinalChunk}`;
/// the agent executor is a state machine over this sequence").
#[derive(Debug, Clone)]
pub enum ChatStreamChunk {
    /// A piece of assistant text, in generation order.
    Token(String),
    /// A fragment of a tool call the model is requesting. Providers that
    /// stream tool-call arguments incrementally emit several of these for
    /// the same `id`; the agent executor accumulates them.
    ToolCall {
        id: String,
        name: String,
        arguments_fragment: String,
    },
    /// The stream is complete; carries usage if the provider reports it.
    Final(Option<TokenUsage>),
}

/// The return type of [`crate::ChatModel::stream`]: a boxed stream of
/// chunks. Boxed (rather than an associated type) so `ChatModel` stays
/// object-safe and usable as `Arc<dyn ChatModel>`, matching
/// `langgraph-core::llm::traits::ChatModel`'s trait-object-first design.
pub type ChatStreamResponse = BoxStream<'static, crate::error::Result<ChatStreamChunk>>;
