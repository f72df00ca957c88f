//! End-to-end scenarios over in-memory fakes: build a real [`Runtime`],
//! drive it exactly as a host application would, assert on the resulting
//! events/run state rather than on any internal type.

use agentflow_runtime::{AgentStore, Clock, DelegationService, ModelProvider, Runtime, RuntimeConfig, RunStore, SystemClock};
use agentflow_graph::{AgentDefinition, AgentStatus, Edge, ExecutionConstraints, Graph, Node, NodeType, Run, RunStatus};
use agentflow_checkpoint::InMemoryCheckpointSaver;
use agentflow_stream::ExecutionEvent;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_stream::StreamExt;
use uuid::Uuid;

struct InMemoryAgentStore(Mutex<HashMap<(Uuid, String), AgentDefinition>>);

impl InMemoryAgentStore {
    fn new() -> Self {
        Self(Mutex::new(HashMap::new()))
    }

    fn insert(&self, agent: AgentDefinition) {
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

struct InMemoryRunStore {
    runs: tokio::sync::Mutex<HashMap<Uuid, Run>>,
    children: Mutex<HashMap<Uuid, Vec<Uuid>>>,
}

impl InMemoryRunStore {
    fn new() -> Self {
        Self {
            runs: tokio::sync::Mutex::new(HashMap::new()),
            children: Mutex::new(HashMap::new()),
        }
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

struct NoModels;
impl agentflow_graph::ModelRegistry for NoModels {
    fn resolve(&self, _model_id: &str) -> Option<Arc<dyn ModelProvider>> {
        None
    }
}

struct NoTools;
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
                unreachable!("no tool node in these scenarios")
            }
        }
        Arc::new(Noop)
    }
}

struct NoRag;
#[async_trait]
impl agentflow_graph::RagPipelines for NoRag {
    async fn execute(&self, _pipeline_id: &str, _input: Value) -> Result<Vec<agentflow_graph::RagHit>, String> {
        Ok(Vec::new())
    }
}

struct FixedScopes(Vec<String>);
#[async_trait]
impl DelegationService for FixedScopes {
    async fn scopes_for_agent(&self, _agent_slug: &str) -> Vec<String> {
        self.0.clone()
    }
}

fn node(id: &str, node_type: NodeType, config: Value) -> Node {
    Node {
        id: id.to_string(),
        node_type,
        position: None,
        config,
        input_mappings: HashMap::new(),
    }
}

fn edge(id: &str, source: &str, target: &str) -> Edge {
    Edge {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        source_handle: None,
        target_handle: None,
    }
}

fn agent_with_graph(tenant_id: Uuid, slug: &str, graph: Graph) -> AgentDefinition {
    AgentDefinition {
        id: Uuid::new_v4(),
        tenant_id,
        slug: slug.to_string(),
        name: slug.to_string(),
        version: 1,
        graph,
        memory_config: json!({}),
        execution_constraints: ExecutionConstraints::default(),
        status: AgentStatus::Published,
    }
}

#[allow(clippy::too_many_arguments)]
fn build_runtime(agent_store: Arc<InMemoryAgentStore>, run_store: Arc<InMemoryRunStore>, scopes: Vec<String>) -> Runtime {
    Runtime::new(
        Arc::new(InMemoryCheckpointSaver::new()),
        agent_store,
        run_store,
        Arc::new(NoModels),
        Arc::new(NoTools),
        Arc::new(NoRag),
        Arc::new(FixedScopes(scopes)),
        Arc::new(SystemClock) as Arc<dyn Clock>,
        RuntimeConfig::default(),
    )
}

async fn drain(stream: impl tokio_stream::Stream<Item = ExecutionEvent> + Unpin, max: usize) -> Vec<ExecutionEvent> {
    let mut events = Vec::new();
    let mut stream = stream;
    while events.len() < max {
        match tokio::time::timeout(std::time::Duration::from_secs(2), stream.next()).await {
            Ok(Some(event)) => events.push(event),
            _ => break,
        }
    }
    events
}

/// `spec.md` §8 scenario 1: linear `start -> set_state -> end` reaches
/// `completed` with the templated final output.
#[tokio::test]
async fn linear_agent_completes_with_templated_output() {
    let tenant_id = Uuid::new_v4();
    let agent_store = Arc::new(InMemoryAgentStore::new());
    let run_store = Arc::new(InMemoryRunStore::new());

    let graph = Graph {
        spec_version: "1".to_string(),
        nodes: vec![
            node("start", NodeType::Start, json!({})),
            node("set", NodeType::SetState, json!({"assignments": {"x": "v"}})),
            node("end", NodeType::End, json!({"output_message": "got {{state.x}}"})),
        ],
        edges: vec![edge("e1", "start", "set"), edge("e2", "set", "end")],
    };
    agent_store.insert(agent_with_graph(tenant_id, "linear", graph));

    let runtime = build_runtime(agent_store, run_store.clone(), vec!["read:docs".to_string()]);
    let (started, stream) = runtime
        .run_and_stream(tenant_id, "linear", json!({}), "production")
        .await
        .unwrap();

    let events = drain(Box::pin(stream), 10).await;
    assert!(events.iter().any(|e| matches!(e.event, agentflow_stream::EventKind::RunStatus)));

    let mut run = run_store.get(started.run_id).await;
    for _ in 0..20 {
        if run.as_ref().map(|r| r.status.is_terminal()).unwrap_or(false) {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        run = run_store.get(started.run_id).await;
    }
    let run = run.expect("run persisted");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.output_result, Some(json!("got v")));
}

/// `spec.md` §8 scenario 3: a `human_input` node pauses the run; resuming
/// it with an approval payload carries it through to completion.
#[tokio::test]
async fn human_interrupt_pauses_then_resumes_to_completion() {
    let tenant_id = Uuid::new_v4();
    let agent_store = Arc::new(InMemoryAgentStore::new());
    let run_store = Arc::new(InMemoryRunStore::new());

    let graph = Graph {
        spec_version: "1".to_string(),
        nodes: vec![
            node("start", NodeType::Start, json!({})),
            node("approve", NodeType::HumanInput, json!({"prompt": "approve?"})),
            node("end", NodeType::End, json!({"output_message": "done"})),
        ],
        edges: vec![edge("e1", "start", "approve"), edge("e2", "approve", "end")],
    };
    agent_store.insert(agent_with_graph(tenant_id, "interruptible", graph));

    let runtime = build_runtime(agent_store, run_store.clone(), vec![]);
    let (started, stream) = runtime
        .run_and_stream(tenant_id, "interruptible", json!({}), "debug")
        .await
        .unwrap();

    let events = drain(Box::pin(stream), 20).await;
    assert!(events.iter().any(|e| {
        e.event == agentflow_stream::EventKind::NodeStart
            && (e.name.as_deref() == Some("approve") || e.span_id.as_deref() == Some("approve"))
    }));

    let mut run = run_store.get(started.run_id).await;
    for _ in 0..20 {
        if run.as_ref().map(|r| r.status == RunStatus::Paused).unwrap_or(false) {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        run = run_store.get(started.run_id).await;
    }
    assert_eq!(run.expect("run persisted").status, RunStatus::Paused);

    let (_, resumed_stream) = runtime
        .resume_run(started.run_id, json!({"approval": "approve"}), "production")
        .await
        .unwrap();
    drain(Box::pin(resumed_stream), 10).await;

    let mut run = run_store.get(started.run_id).await;
    for _ in 0..20 {
        if run.as_ref().map(|r| r.status.is_terminal()).unwrap_or(false) {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        run = run_store.get(started.run_id).await;
    }
    assert_eq!(run.expect("run persisted").status, RunStatus::Completed);
}

/// `spec.md` §8 scenario 5: a `spawn_run` request asking for scopes
/// outside the caller's effective scopes is denied and no child Run is
/// created.
#[tokio::test]
async fn spawn_with_excess_scopes_is_denied() {
    let tenant_id = Uuid::new_v4();
    let agent_store = Arc::new(InMemoryAgentStore::new());
    let run_store = Arc::new(InMemoryRunStore::new());

    let graph = Graph {
        spec_version: "1".to_string(),
        nodes: vec![
            node("start", NodeType::Start, json!({})),
            node(
                "spawn",
                NodeType::SpawnRun,
                json!({"request": {"target_agent_slug": "worker", "scopes": ["read", "admin"]}}),
            ),
            node("end", NodeType::End, json!({})),
        ],
        edges: vec![edge("e1", "start", "spawn"), edge("e2", "spawn", "end")],
    };
    agent_store.insert(agent_with_graph(tenant_id, "delegator", graph));
    let worker_graph = Graph {
        spec_version: "1".to_string(),
        nodes: vec![node("start", NodeType::Start, json!({})), node("end", NodeType::End, json!({}))],
        edges: vec![edge("e1", "start", "end")],
    };
    agent_store.insert(agent_with_graph(tenant_id, "worker", worker_graph));

    let runtime = build_runtime(agent_store, run_store.clone(), vec!["read".to_string()]);
    let (started, stream) = runtime
        .run_and_stream(tenant_id, "delegator", json!({}), "debug")
        .await
        .unwrap();

    let events = drain(Box::pin(stream), 20).await;
    let deny = events
        .iter()
        .find(|e| e.event == agentflow_stream::EventKind::OrchestrationPolicyDeny)
        .expect("a policy_deny event is emitted");
    assert!(deny.data["reason"].as_str().unwrap().contains("scope_not_subset"));

    let mut run = run_store.get(started.run_id).await;
    for _ in 0..20 {
        if run.as_ref().map(|r| r.status.is_terminal()).unwrap_or(false) {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        run = run_store.get(started.run_id).await;
    }
    assert_eq!(run.expect("run persisted").status, RunStatus::Failed);
}

/// `spec.md` §8 scenario 6: a `production` consumer only sees client-safe
/// events; a `debug` consumer additionally sees synthesized `reasoning`
/// events around tool calls. Exercised directly against
/// [`agentflow_stream::StreamFilter`] since it doesn't need a live run.
#[test]
fn production_filter_hides_internal_events_debug_synthesizes_reasoning() {
    use agentflow_stream::{EventKind, StreamFilter, StreamMode, Visibility};

    let events = vec![
        ExecutionEvent::new(EventKind::NodeStart, "r1", json!({})),
        ExecutionEvent::new(EventKind::Token, "r1", json!({"content": "hi"})),
        ExecutionEvent::new(EventKind::OnToolStart, "r1", json!({})).with_name("search"),
        ExecutionEvent::new(EventKind::OnToolEnd, "r1", json!({})).with_name("search"),
        ExecutionEvent::new(EventKind::Token, "r1", json!({"content": " done"})),
        ExecutionEvent::new(EventKind::RunStatus, "r1", json!({"status": "completed"})),
    ];
    assert!(events.iter().all(|e| e.event != EventKind::NodeStart || e.visibility == Visibility::Internal));

    let debug = StreamFilter::new(StreamMode::Debug);
    let debug_out: Vec<_> = events.iter().flat_map(|e| debug.apply(e)).collect();
    assert_eq!(debug_out.len(), 8);

    let production = StreamFilter::new(StreamMode::Production);
    let production_out: Vec<_> = events.iter().flat_map(|e| production.apply(e)).collect();
    assert_eq!(production_out.len(), 3);
    assert!(production_out.iter().all(|e| e.visibility == Visibility::ClientSafe));
}
