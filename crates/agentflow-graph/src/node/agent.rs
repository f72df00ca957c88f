use crate::error::{GraphError, Result};
use crate::node::{ExecutionContext, NodeExecutor};
use crate::run::{GraphState, NodeDelta};
use crate::types::Node;
use agentflow_llm::{ChatRequest, ChatStreamChunk, Message, ToolCall, ToolDefinition as LlmToolDefinition};
use agentflow_tools::{ToolContext, ToolOutcome};
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ToolExecutionMode {
    Sequential,
    ParallelSafe,
}

impl Default for ToolExecutionMode {
    fn default() -> Self {
        ToolExecutionMode::Sequential
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ToolBinding {
    slug: String,
    #[serde(default)]
    concurrency_group: Option<String>,
    #[serde(default)]
    is_pure: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct AgentConfig {
    model_id: String,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    tools: Vec<ToolBinding>,
    #[serde(default = "default_max_tool_iterations")]
    max_tool_iterations: u32,
    #[serde(default)]
    tool_execution_mode: ToolExecutionMode,
    #[serde(default = "default_max_parallel_tools")]
    max_parallel_tools: usize,
    #[serde(default)]
    output_format: Option<String>,
    #[serde(default)]
    write_output_to_context: bool,
}

fn default_max_tool_iterations() -> u32 {
    5
}

fn default_max_parallel_tools() -> usize {
    4
}

/// `agent` / `llm`: the streaming agent loop from `spec.md` §4.5 — call
/// the model, stream tokens through the emitter, dispatch any requested
/// tool calls through the Tool Invocation Layer, append results, and
/// repeat up to `max_tool_iterations`.
pub struct AgentExecutor;

#[async_trait]
impl NodeExecutor for AgentExecutor {
    async fn execute(&self, state: &GraphState, node: &Node, ctx: &ExecutionContext) -> Result<NodeDelta> {
        let config: AgentConfig = serde_json::from_value(node.config.clone())
            .map_err(|e| GraphError::state(Some(node.id.clone()), format!("invalid agent config: {e}")))?;

        let model = ctx
            .ports
            .models
            .resolve(&config.model_id)
            .ok_or_else(|| GraphError::state(Some(node.id.clone()), format!("unknown model '{}'", config.model_id)))?;

        let bound_tools: Vec<LlmToolDefinition> = config
            .tools
            .iter()
            .filter_map(|binding| ctx.ports.tools.resolve(&binding.slug))
            .map(|def| LlmToolDefinition::new(def.slug.clone(), "").with_parameters(def.input_schema))
            .collect();

        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect();
        if let Some(instructions) = &config.instructions {
            if !messages.iter().any(|m| m.role == agentflow_llm::MessageRole::System) {
                messages.insert(0, Message::system(instructions.clone()));
            }
        }

        let mut appended_messages = Vec::new();
        let mut tool_outputs = Vec::new();
        let mut final_text = String::new();
        let mut iteration = 0u32;

        loop {
            iteration += 1;
            let request = ChatRequest::new(config.model_id.clone(), messages.clone()).with_tools(bound_tools.clone());
            let mut stream = model
                .stream(request)
                .await
                .map_err(|e| GraphError::node_execution(node.id.clone(), e))?;

            let mut assembled_text = String::new();
            let mut pending_calls: HashMap<String, (String, String)> = HashMap::new();
            let mut call_order = Vec::new();

            while let Some(chunk) = stream.next().await {
                match chunk.map_err(|e| GraphError::node_execution(node.id.clone(), e))? {
                    ChatStreamChunk::Token(text) => {
                        ctx.emitter.emit_token(&text, &node.id, None);
                        assembled_text.push_str(&text);
                    }
                    ChatStreamChunk::ToolCall {
                        id,
                        name,
                        arguments_fragment,
                    } => {
                        let entry = pending_calls.entry(id.clone()).or_insert_with(|| {
                            call_order.push(id.clone());
                            (name.clone(), String::new())
                        });
                        entry.1.push_str(&arguments_fragment);
                    }
                    ChatStreamChunk::Final(_usage) => break,
                }
            }

            if pending_calls.is_empty() {
                final_text = assembled_text;
                break;
            }

            let calls: Vec<ToolCall> = call_order
                .iter()
                .map(|id| {
                    let (name, args) = pending_calls.get(id).cloned().unwrap_or_default();
                    ToolCall {
                        id: id.clone(),
                        name,
                        arguments: serde_json::from_str(&args).unwrap_or(Value::Null),
                    }
                })
                .collect();

            let assistant_message = Message::assistant_with_tool_calls(calls.clone());
            appended_messages.push(serde_json::to_value(&assistant_message).unwrap_or(Value::Null));
            messages.push(assistant_message);

            let results = dispatch_tool_calls(&calls, &config, node, ctx).await?;
            for (call, outcome) in calls.iter().zip(results.into_iter()) {
                let payload = outcome
                    .output
                    .clone()
                    .unwrap_or_else(|| Value::String(outcome.error.clone().unwrap_or_default()));
                tool_outputs.push(payload.clone());
                let tool_message = Message::tool(call.id.clone(), payload.to_string());
                appended_messages.push(serde_json::to_value(&tool_message).unwrap_or(Value::Null));
                messages.push(tool_message);
            }

            if iteration >= config.max_tool_iterations {
                break;
            }
        }

        let mut state_patch = Map::new();
        let mut context_patch = Map::new();
        let mut last_agent_output = Value::String(final_text.clone());

        if config.output_format.as_deref() == Some("json") {
            match serde_json::from_str::<Value>(&final_text) {
                Ok(parsed) => last_agent_output = parsed,
                Err(e) => {
                    return Err(GraphError::node_execution(
                        node.id.clone(),
                        std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()),
                    ))
                }
            }
        }

        if config.write_output_to_context {
            context_patch.insert("last_agent_output".to_string(), last_agent_output.clone());
        }
        state_patch.insert(format!("{}_output", node.id), last_agent_output.clone());

        Ok(NodeDelta {
            messages: Some(appended_messages),
            state: Some(state_patch),
            context: Some(context_patch),
            last_agent_output: Some(last_agent_output),
            tool_outputs: Some(tool_outputs),
            ..NodeDelta::empty()
        })
    }
}

async fn dispatch_tool_calls(
    calls: &[ToolCall],
    config: &AgentConfig,
    node: &Node,
    ctx: &ExecutionContext,
) -> Result<Vec<ToolOutcome>> {
    let implementations = ctx.ports.tools.implementations();

    let call_outcome = |call: ToolCall| {
        let ctx = ctx;
        let implementations = implementations.clone();
        async move {
            let Some(tool_def) = ctx.ports.tools.resolve(&call.name) else {
                return ToolOutcome {
                    output: None,
                    error: Some(format!("unknown tool '{}'", call.name)),
                    attempt_count: 0,
                };
            };
            let tool_ctx = ToolContext {
                run_id: ctx.run_id.clone(),
                emitter: Some(ctx.emitter.clone()),
                circuit_breaker: &ctx.ports.circuit_breaker,
            };
            agentflow_tools::invoke(&tool_def, call.arguments.clone(), implementations.as_ref(), &tool_ctx)
                .await
                .unwrap_or_else(|e| ToolOutcome {
                    output: None,
                    error: Some(e.to_string()),
                    attempt_count: 0,
                })
        }
    };

    match config.tool_execution_mode {
        ToolExecutionMode::Sequential => {
            let mut out = Vec::with_capacity(calls.len());
            for call in calls.iter().cloned() {
                out.push(call_outcome(call).await);
            }
            Ok(out)
        }
        ToolExecutionMode::ParallelSafe => {
            let groups = group_by_concurrency(calls, config);
            let mut grouped_futures = Vec::new();
            for group in groups {
                let call_outcome = &call_outcome;
                grouped_futures.push(async move {
                    let mut results = Vec::with_capacity(group.len());
                    for call in group {
                        results.push((call.clone(), call_outcome(call.clone()).await));
                    }
                    results
                });
            }
            let grouped_results: Vec<Vec<(ToolCall, ToolOutcome)>> =
                futures::stream::iter(grouped_futures)
                    .buffer_unordered(config.max_parallel_tools.max(1))
                    .collect()
                    .await;

            let mut by_id: HashMap<String, ToolOutcome> = HashMap::new();
            for group in grouped_results {
                for (call, outcome) in group {
                    by_id.insert(call.id, outcome);
                }
            }
            Ok(calls
                .iter()
                .map(|c| {
                    by_id.remove(&c.id).unwrap_or(ToolOutcome {
                        output: None,
                        error: Some("tool result missing".to_string()),
                        attempt_count: 0,
                    })
                })
                .collect())
        }
    }
}

/// Groups concurrent tool calls per `spec.md` §4.5's tie-break rule: calls
/// whose bound tool is `is_pure` and shares a `concurrency_group` run
/// serially within that group; everything else gets its own
/// single-call group, so different groups (and any non-pure/ungrouped
/// call) run concurrently with each other.
fn group_by_concurrency(calls: &[ToolCall], config: &AgentConfig) -> Vec<Vec<ToolCall>> {
    let bindings: HashMap<&str, &ToolBinding> = config.tools.iter().map(|b| (b.slug.as_str(), b)).collect();
    let mut groups: HashMap<String, Vec<ToolCall>> = HashMap::new();
    let mut ungrouped = Vec::new();

    for call in calls {
        let binding = bindings.get(call.name.as_str());
        match binding.and_then(|b| {
            if b.is_pure {
                b.concurrency_group.clone()
            } else {
                None
            }
        }) {
            Some(group_key) => groups.entry(group_key).or_default().push(call.clone()),
            None => ungrouped.push(vec![call.clone()]),
        }
    }

    let mut out: Vec<Vec<ToolCall>> = groups.into_values().collect();
    out.extend(ungrouped);
    out
}

/// `classify`: invokes the model with `instructions`/`categories` and
/// takes the returned label as `branch_taken`.
pub struct ClassifyExecutor;

#[derive(Debug, Deserialize)]
struct ClassifyConfig {
    model_id: String,
    instructions: String,
    categories: Vec<String>,
}

#[async_trait]
impl NodeExecutor for ClassifyExecutor {
    async fn execute(&self, state: &GraphState, node: &Node, ctx: &ExecutionContext) -> Result<NodeDelta> {
        let config: ClassifyConfig = serde_json::from_value(node.config.clone())
            .map_err(|e| GraphError::state(Some(node.id.clone()), format!("invalid classify config: {e}")))?;

        let model = ctx
            .ports
            .models
            .resolve(&config.model_id)
            .ok_or_else(|| GraphError::state(Some(node.id.clone()), format!("unknown model '{}'", config.model_id)))?;

        let prompt = format!(
            "{}\n\nRespond with exactly one of: {}",
            config.instructions,
            config.categories.join(", ")
        );
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect();
        messages.push(Message::system(prompt));

        let response = model
            .chat(ChatRequest::new(config.model_id.clone(), messages))
            .await
            .map_err(|e| GraphError::node_execution(node.id.clone(), e))?;

        let label = response.message.content.trim();
        let branch = config
            .categories
            .iter()
            .find(|c| c.eq_ignore_ascii_case(label))
            .cloned()
            .unwrap_or_else(|| label.to_string());

        Ok(NodeDelta::empty().with_branch(branch))
    }
}

#[cfg(test)]
mod tests {
    use super::group_by_concurrency;
    use super::{AgentConfig, ToolBinding, ToolExecutionMode};
    use agentflow_llm::ToolCall;
    use serde_json::json;

    fn config_with_bindings(bindings: Vec<ToolBinding>) -> AgentConfig {
        AgentConfig {
            model_id: "m".to_string(),
            instructions: None,
            tools: bindings,
            max_tool_iterations: 5,
            tool_execution_mode: ToolExecutionMode::ParallelSafe,
            max_parallel_tools: 4,
            output_format: None,
            write_output_to_context: false,
        }
    }

    #[test]
    fn pure_calls_in_same_group_grouped_together() {
        let config = config_with_bindings(vec![
            ToolBinding {
                slug: "search".to_string(),
                concurrency_group: Some("web".to_string()),
                is_pure: true,
            },
            ToolBinding {
                slug: "fetch".to_string(),
                concurrency_group: Some("web".to_string()),
                is_pure: true,
            },
        ]);
        let calls = vec![
            ToolCall {
                id: "1".to_string(),
                name: "search".to_string(),
                arguments: json!({}),
            },
            ToolCall {
                id: "2".to_string(),
                name: "fetch".to_string(),
                arguments: json!({}),
            },
        ];
        let groups = group_by_concurrency(&calls, &config);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn non_pure_calls_get_their_own_group() {
        let config = config_with_bindings(vec![ToolBinding {
            slug: "write".to_string(),
            concurrency_group: Some("fs".to_string()),
            is_pure: false,
        }]);
        let calls = vec![
            ToolCall {
                id: "1".to_string(),
                name: "write".to_string(),
                arguments: json!({}),
            },
            ToolCall {
                id: "2".to_string(),
                name: "write".to_string(),
                arguments: json!({}),
            },
        ];
        let groups = group_by_concurrency(&calls, &config);
        assert_eq!(groups.len(), 2);
    }
}
