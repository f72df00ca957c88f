//! In-memory fakes shared by the demo binaries under `src/bin/`. A host
//! application supplies real implementations of these traits (a database-
//! backed `AgentStore`/`RunStore`, a real `ModelProvider`, …); these fakes
//! exist only so the demos can drive a real [`agentflow_runtime::Runtime`]
//! without any external dependency.

use agentflow_graph::{AgentDefinition, AgentStatus, Edge, ExecutionConstraints, Graph, ModelRegistry, Node, NodeType, RagPipelines, RagHit, Run};
use agentflow_runtime::{AgentStore, Clock, DelegationService, RunStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct InMemoryAgentStore(Mutex<HashMap<(Uuid, String), AgentDefinition>>);

impl InMemoryAgentStore {
    pub fn new() -> Self {
        Self(Mutex::new(HashMap::new()))
    }

    pub fn insert(&self, agent: AgentDefinition) {
        self.0.lock().unwrap().insert((agent.tenant_id, agent.slug.clone()), agent);
    }
}

#[async_trait]
impl AgentStore for InMemoryAgentStore {
    async fn get_by_slug(&self, tenant_id: Uuid, slug: &str) -> Option<AgentDefinition> {
        self.0.lock().unwrap().get(&(tenant_id, slug.to_string())).cloned()
    }
    async fn get_by_id(&self, agent_id: Uuid, _version: u32) -> Option<AgentDefinition> {
        self.0.lock().unwrap().values().find(|a| a.id == agent_id).cloned()
    }
}

pub struct InMemoryRunStore {
    runs: tokio::sync::Mutex<HashMap<Uuid, Run>>,
    children: Mutex<HashMap<Uuid, Vec<Uuid>>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self {
            runs: tokio::sync::Mutex::new(HashMap::new()),
            children: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, run_id: Uuid) -> Option<Run> {
        self.runs.lock().await.get(&run_id).cloned()
    }
}

#[async_trait]
impl RunStore for InMemoryRunStore {
    async fn put(&self, run: Run) {
        if let Some(parent) = run.parent_run_id {
            self.children.lock().unwrap().entry(parent).or_default().push(run.id);
        }
        self.runs.lock().await.insert(run.id, run);
    }
    async fn get(&self, run_id: Uuid) -> Option<Run> {
        self.runs.lock().await.get(&run_id).cloned()
    }
    async fn children_of(&self, run_id: Uuid) -> Vec<Uuid> {
        self.children.lock().unwrap().get(&run_id).cloned().unwrap_or_default()
    }
}

pub struct NoModels;
impl ModelRegistry for NoModels {
    fn resolve(&self, _model_id: &str) -> Option<Arc<dyn agentflow_llm::ChatModel>> {
        None
    }
}

pub struct NoTools;
impl agentflow_graph::ToolRegistry for NoTools {
    fn resolve(&self, _slug: &str) -> Option<agentflow_tools::ToolDefinition> {
        None
    }
    fn implementations(&self) -> Arc<dyn agentflow_tools::ToolImplementations> {
        struct Noop;
        #[async_trait]
        impl agentflow_tools::ToolImplementations for Noop {
            async fn invoke(
                &self,
                _kind: agentflow_tools::ImplementationKind,
                _config: &Value,
                _input: &Value,
            ) -> agentflow_tools::Result<Value> {
                unreachable!("no tool node in these demos")
            }
        }
        Arc::new(Noop)
    }
}

pub struct NoRag;
#[async_trait]
impl RagPipelines for NoRag {
    async fn execute(&self, _pipeline_id: &str, _input: Value) -> Result<Vec<RagHit>, String> {
        Ok(Vec::new())
    }
}

pub struct FixedScopes(pub Vec<String>);
#[async_trait]
impl DelegationService for FixedScopes {
    async fn scopes_for_agent(&self, _agent_slug: &str) -> Vec<String> {
        self.0.clone()
    }
}

pub fn node(id: &str, node_type: NodeType, config: Value) -> Node {
    Node {
        id: id.to_string(),
        node_type,
        position: None,
        config,
        input_mappings: HashMap::new(),
    }
}

pub fn edge(id: &str, source: &str, target: &str) -> Edge {
    Edge {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        source_handle: None,
        target_handle: None,
    }
}

pub fn agent_with_graph(tenant_id: Uuid, slug: &str, graph: Graph) -> AgentDefinition {
    AgentDefinition {
        id: Uuid::new_v4(),
        tenant_id,
        slug: slug.to_string(),
        name: slug.to_string(),
        version: 1,
        graph,
        memory_config: Value::Object(Default::default()),
        execution_constraints: ExecutionConstraints::default(),
        status: AgentStatus::Published,
    }
}

pub fn build_runtime(
    agent_store: Arc<InMemoryAgentStore>,
    run_store: Arc<InMemoryRunStore>,
    scopes: Vec<String>,
) -> agentflow_runtime::Runtime {
    agentflow_runtime::Runtime::new(
        Arc::new(agentflow_checkpoint::InMemoryCheckpointSaver::new()),
        agent_store,
        run_store,
        Arc::new(NoModels),
        Arc::new(NoTools),
        Arc::new(NoRag),
        Arc::new(FixedScopes(scopes)),
        Arc::new(agentflow_runtime::SystemClock) as Arc<dyn Clock>,
        agentflow_runtime::RuntimeConfig::default(),
    )
}
