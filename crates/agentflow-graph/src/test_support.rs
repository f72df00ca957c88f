//! Minimal fakes for [`crate::ports::Ports`], shared by node-executor unit
//! tests across this crate. Not part of the public API.

use crate::ports::{ModelRegistry, OrchestrationPort, Ports, RagHit, RagPipelines, ToolRegistry};
use agentflow_llm::ChatModel;
use agentflow_tools::{CircuitBreaker, ToolDefinition, ToolImplementations};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

struct EmptyModelRegistry;
impl ModelRegistry for EmptyModelRegistry {
    fn resolve(&self, _model_id: &str) -> Option<Arc<dyn ChatModel>> {
        None
    }
}

struct EmptyToolRegistry;

struct NoopImplementations;
#[async_trait]
impl ToolImplementations for NoopImplementations {
    async fn invoke(
        &self,
        _kind: agentflow_tools::ImplementationKind,
        _config: &Value,
        _input: &Value,
    ) -> agentflow_tools::Result<Value> {
        Ok(Value::Null)
    }
}

impl ToolRegistry for EmptyToolRegistry {
    fn resolve(&self, _slug: &str) -> Option<ToolDefinition> {
        None
    }
    fn implementations(&self) -> Arc<dyn ToolImplementations> {
        Arc::new(NoopImplementations)
    }
}

struct EmptyRag;
#[async_trait]
impl RagPipelines for EmptyRag {
    async fn execute(&self, _pipeline_id: &str, _input: Value) -> Result<Vec<RagHit>, String> {
        Ok(Vec::new())
    }
}

struct NoopOrchestration;
#[async_trait]
impl OrchestrationPort for NoopOrchestration {
    async fn spawn_run(&self, _caller_run_id: &str, _request: Value) -> Result<Value, String> {
        Ok(Value::Null)
    }
    async fn spawn_group(&self, _caller_run_id: &str, _request: Value) -> Result<Value, String> {
        Ok(Value::Null)
    }
    async fn join(&self, _group_id: &str, _request: Value) -> Result<Value, String> {
        Ok(Value::Null)
    }
    async fn replan(&self, _run_id: &str) -> Result<Value, String> {
        Ok(Value::Null)
    }
    async fn cancel_subtree(&self, _run_id: &str, _include_root: bool, _reason: &str) -> Result<Value, String> {
        Ok(Value::Null)
    }
}

pub fn fake_ports() -> Arc<Ports> {
    Arc::new(Ports {
        models: Arc::new(EmptyModelRegistry),
        tools: Arc::new(EmptyToolRegistry),
        rag: Arc::new(EmptyRag),
        orchestration: Arc::new(NoopOrchestration),
        circuit_breaker: Arc::new(CircuitBreaker::new()),
    })
}

pub fn fake_emitter(run_id: &str) -> agentflow_stream::Emitter {
    let queue = agentflow_stream::EventQueue::with_capacity(8);
    agentflow_stream::Emitter::new(queue.sender(), run_id, "production")
}

pub fn fake_ctx(run_id: &str, resume_payload: Option<Value>) -> crate::node::ExecutionContext {
    crate::node::ExecutionContext {
        run_id: run_id.to_string(),
        emitter: fake_emitter(run_id),
        resolved_inputs: std::collections::HashMap::new(),
        resume_payload,
        ports: fake_ports(),
    }
}
