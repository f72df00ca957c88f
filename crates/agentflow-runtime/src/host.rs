//! [`RuntimeHost`] — the [`agentflow_orchestration::RunHost`] implementation
//! backing the orchestration kernel wired into a [`crate::api::Runtime`].
//! Grounded the same way `original_source`'s `OrchestrationKernelService`
//! calls out to `AgentExecutorService.start_run`: the kernel never drives a
//! graph run itself, it asks this host to.

use crate::ports::{AgentStore, DelegationService, RunStore};
use agentflow_checkpoint::CheckpointSaver;
use agentflow_graph::{CancellationToken, Engine, Ports, Run, RunStatus};
use agentflow_orchestration::RunHost;
use agentflow_stream::{Emitter, EventQueue};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use uuid::Uuid;

/// Everything needed to compile and drive one run, shared across every
/// run a [`RuntimeHost`] launches. Cloning a [`Ports`] per run gives each
/// run its own circuit breaker (`spec.md` §5: "Circuit-breaker counters
/// are per-Run and not shared"), while sharing the model/tool/rag
/// registries and the orchestration port itself.
pub struct PortsTemplate {
    models: Arc<dyn agentflow_graph::ModelRegistry>,
    tools: Arc<dyn agentflow_graph::ToolRegistry>,
    rag: Arc<dyn agentflow_graph::RagPipelines>,
    orchestration: OnceLock<Arc<dyn agentflow_graph::OrchestrationPort>>,
}

impl PortsTemplate {
    fn build(&self) -> Arc<Ports> {
        Arc::new(Ports {
            models: self.models.clone(),
            tools: self.tools.clone(),
            rag: self.rag.clone(),
            orchestration: self
                .orchestration
                .get()
                .cloned()
                .expect("orchestration port bound before any run is launched"),
            circuit_breaker: Arc::new(agentflow_tools::CircuitBreaker::new()),
        })
    }
}

pub struct RuntimeHost {
    engine: Arc<Engine>,
    checkpoint_saver: Arc<dyn CheckpointSaver>,
    agent_store: Arc<dyn AgentStore>,
    run_store: Arc<dyn RunStore>,
    delegation: Arc<dyn DelegationService>,
    ports: PortsTemplate,
    cancellation_tokens: RwLock<HashMap<Uuid, CancellationToken>>,
}

impl RuntimeHost {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: Arc<Engine>,
        checkpoint_saver: Arc<dyn CheckpointSaver>,
        agent_store: Arc<dyn AgentStore>,
        run_store: Arc<dyn RunStore>,
        models: Arc<dyn agentflow_graph::ModelRegistry>,
        tools: Arc<dyn agentflow_graph::ToolRegistry>,
        rag: Arc<dyn agentflow_graph::RagPipelines>,
        delegation: Arc<dyn DelegationService>,
    ) -> Self {
        Self {
            engine,
            checkpoint_saver,
            agent_store,
            run_store,
            delegation,
            ports: PortsTemplate {
                models,
                tools,
                rag,
                orchestration: OnceLock::new(),
            },
            cancellation_tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Bind the kernel itself as the orchestration port. Called once by
    /// [`crate::api::Runtime::new`] right after constructing the kernel —
    /// the two types are mutually referential (the kernel holds this host
    /// as its [`RunHost`], this host needs the kernel to build [`Ports`])
    /// so neither can be fully constructed before the other.
    pub fn bind_orchestration(&self, port: Arc<dyn agentflow_graph::OrchestrationPort>) {
        let _ = self.ports.orchestration.set(port);
    }

    pub fn build_ports(&self) -> Arc<Ports> {
        self.ports.build()
    }

    /// Drive `run` to completion (or its next pause) in a detached task,
    /// tracking its [`CancellationToken`] so [`RunHost::cancel_run`] can
    /// reach it later.
    pub fn spawn_run_to_completion(&self, mut run: Run, emitter: Emitter) {
        let token = CancellationToken::new();
        self.cancellation_tokens.write().unwrap().insert(run.id, token.clone());

        let engine = self.engine.clone();
        let agent_store = self.agent_store.clone();
        let run_store = self.run_store.clone();
        let ports = self.build_ports();

        tokio::spawn(async move {
            let Some(agent) = agent_store.get_by_id(run.agent_id, run.agent_version).await else {
                run.status = RunStatus::Failed;
                run.error_message = Some(format!("agent '{}' v{} not found", run.agent_id, run.agent_version));
                run_store.put(run).await;
                return;
            };
            let known_tools = Default::default();
            let known_models = Default::default();
            let workflow = match agentflow_graph::compile(&agent.graph, &known_tools, &known_models) {
                Ok(wf) => wf,
                Err(e) => {
                    run.status = RunStatus::Failed;
                    run.error_message = Some(e.to_string());
                    run_store.put(run).await;
                    return;
                }
            };

            let _ = engine.run(&workflow, &mut run, ports, emitter, token).await;
            run_store.put(run).await;
        });
    }

    pub fn spawn_resume(&self, mut run: Run, resume_payload: Value, emitter: Emitter) {
        let token = CancellationToken::new();
        self.cancellation_tokens.write().unwrap().insert(run.id, token.clone());

        let engine = self.engine.clone();
        let agent_store = self.agent_store.clone();
        let run_store = self.run_store.clone();
        let ports = self.build_ports();

        tokio::spawn(async move {
            let Some(agent) = agent_store.get_by_id(run.agent_id, run.agent_version).await else {
                run.status = RunStatus::Failed;
                run_store.put(run).await;
                return;
            };
            let known_tools = Default::default();
            let known_models = Default::default();
            let workflow = match agentflow_graph::compile(&agent.graph, &known_tools, &known_models) {
                Ok(wf) => wf,
                Err(e) => {
                    run.status = RunStatus::Failed;
                    run.error_message = Some(e.to_string());
                    run_store.put(run).await;
                    return;
                }
            };

            let _ = engine.resume(&workflow, &mut run, resume_payload, ports, emitter, token).await;
            run_store.put(run).await;
        });
    }
}

#[async_trait]
impl RunHost for RuntimeHost {
    async fn launch_child(
        &self,
        tenant_id: Uuid,
        root_run_id: Uuid,
        parent_run_id: Uuid,
        parent_node_id: Option<String>,
        depth: u32,
        spawn_key: String,
        orchestration_group_id: Option<Uuid>,
        target_agent_slug: &str,
        input_params: Value,
    ) -> Result<Uuid, String> {
        let agent = self
            .agent_store
            .get_by_slug(tenant_id, target_agent_slug)
            .await
            .ok_or_else(|| format!("agent '{target_agent_slug}' not found for tenant {tenant_id}"))?;

        let parent = self
            .run_store
            .get(parent_run_id)
            .await
            .ok_or_else(|| format!("parent run '{parent_run_id}' not found"))?;

        let mut child = Run::child_of(&parent, parent_node_id.unwrap_or_default(), agent.id, agent.version, input_params, spawn_key);
        child.root_run_id = root_run_id;
        child.depth = depth;
        child.orchestration_group_id = orchestration_group_id;

        // Orchestrator-launched children are fire-and-forget: nothing
        // subscribes to this queue's receiver, so it's dropped here and
        // emitted events simply go nowhere. A caller that wants to observe
        // a child run does so by polling `run_status`/`child_run_ids`, the
        // same surface `spec.md` §4.7's `join` node uses.
        let queue = EventQueue::new();
        let emitter = Emitter::new(queue.sender(), child.id.to_string(), "production");
        let child_id = child.id;
        self.run_store.put(child.clone()).await;
        self.spawn_run_to_completion(child, emitter);
        Ok(child_id)
    }

    async fn run_status(&self, run_id: Uuid) -> Option<RunStatus> {
        self.run_store.get(run_id).await.map(|r| r.status)
    }

    async fn cancel_run(&self, run_id: Uuid, reason: &str) -> Result<(), String> {
        if let Some(token) = self.cancellation_tokens.read().unwrap().get(&run_id) {
            token.cancel();
        }
        if let Some(mut run) = self.run_store.get(run_id).await {
            if !run.status.is_terminal() {
                run.status = RunStatus::Cancelled;
                run.error_message = Some(reason.to_string());
                run.completed_at = Some(chrono::Utc::now());
                self.run_store.put(run).await;
            }
        }
        Ok(())
    }

    async fn effective_scopes(&self, run_id: Uuid) -> Vec<String> {
        let Some(run) = self.run_store.get(run_id).await else {
            return Vec::new();
        };
        let Some(agent) = self.agent_store.get_by_id(run.agent_id, run.agent_version).await else {
            return Vec::new();
        };
        self.delegation.scopes_for_agent(&agent.slug).await
    }

    async fn child_run_ids(&self, run_id: Uuid) -> Vec<Uuid> {
        self.run_store.children_of(run_id).await
    }
}
