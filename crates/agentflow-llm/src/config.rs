use crate::message::Message;
use crate::tools::ToolDefinition;
use serde::{Deserialize, Serialize};

/// How a thinking-capable model's reasoning content should be surfaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningMode {
    /// Don't request reasoning content at all.
    #[default]
    Off,
    /// Request reasoning as a separate field from the final answer.
    Separated,
}

/// Generation parameters attached to a [`ChatRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    #[serde(default)]
    pub reasoning_mode: ReasoningMode,
    pub stop: Option<Vec<String>>,
}

/// Input to [`crate::ChatModel::chat`] / [`crate::ChatModel::stream`]: the
/// accumulated message history plus generation config and bound tools.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model_id: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub config: ChatConfig,
}

impl ChatRequest {
    pub fn new(model_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model_id: model_id.into(),
            messages,
            tools: Vec::new(),
            config: ChatConfig::default(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_reasoning(mut self, mode: ReasoningMode) -> Self {
        self.config.reasoning_mode = mode;
        self
    }
}
