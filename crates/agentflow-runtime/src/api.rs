//! [`Runtime`] — the single facade a host application drives
//! (`spec.md` §6). Bundles the graph engine, the orchestration kernel,
//! and the event stream behind five calls: start a run, start a run and
//! watch it stream, resume a paused run, cancel a subtree, join a group.
//!
//! Grounded in `orchestrator::AppState` wiring its services together at
//! startup, minus the HTTP layer: nothing here listens on a socket.

use crate::error::{AgentflowError, Result};
use crate::host::RuntimeHost;
use crate::ports::{AgentStore, Clock, DelegationService, RunStore};
use agentflow_checkpoint::CheckpointSaver;
use agentflow_graph::{
    CancellationToken, Engine, ModelRegistry, OrchestrationPort, RagPipelines, Run, RunStatus, ToolRegistry,
};
use agentflow_orchestration::Kernel;
use agentflow_stream::{Emitter, EventQueue, ExecutionEvent, StreamFilter, StreamMode};
use futures::Stream;
use serde_json::Value;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

use crate::config::RuntimeConfig;

/// A started run's identity and the stream mode it started under, handed
/// back to a caller of [`Runtime::start_run`]/[`Runtime::run_and_stream`].
#[derive(Debug, Clone)]
pub struct StartedRun {
    pub run_id: Uuid,
}

pub struct Runtime {
    agent_store: Arc<dyn AgentStore>,
    run_store: Arc<dyn RunStore>,
    host: Arc<RuntimeHost>,
    kernel: Arc<Kernel>,
    clock: Arc<dyn Clock>,
    config: RuntimeConfig,
}

impl Runtime {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        checkpoint_saver: Arc<dyn CheckpointSaver>,
        agent_store: Arc<dyn AgentStore>,
        run_store: Arc<dyn RunStore>,
        models: Arc<dyn ModelRegistry>,
        tools: Arc<dyn ToolRegistry>,
        rag: Arc<dyn RagPipelines>,
        delegation: Arc<dyn DelegationService>,
        clock: Arc<dyn Clock>,
        config: RuntimeConfig,
    ) -> Self {
        let engine = Arc::new(Engine::new(checkpoint_saver.clone()));
        let host = Arc::new(RuntimeHost::new(
            engine.clone(),
            checkpoint_saver,
            agent_store.clone(),
            run_store.clone(),
            models,
            tools,
            rag,
            delegation,
        ));
        let policy = (&config).into();
        let kernel = Arc::new(Kernel::new(host.clone(), policy));
        host.bind_orchestration(kernel.clone() as Arc<dyn OrchestrationPort>);

        Self {
            agent_store,
            run_store,
            host,
            kernel,
            clock,
            config,
        }
    }

    /// Start a new root run for `agent_slug` and let it run to completion
    /// (or its first pause) in the background, without handing back an
    /// event stream. Useful when a caller only cares about the final
    /// status and will poll [`Runtime::run_status`].
    pub async fn start_run(
        &self,
        tenant_id: Uuid,
        agent_slug: &str,
        input_params: Value,
        mode: &str,
    ) -> Result<StartedRun> {
        let run_id = self.launch_root(tenant_id, agent_slug, input_params, mode, None).await?;
        Ok(StartedRun { run_id })
    }

    /// Start a new root run and return a stream of the events it emits,
    /// already narrowed by `mode` (`spec.md` §4.4: `"debug"` sees
    /// everything plus synthesized `reasoning` events, anything else sees
    /// only client-safe events).
    pub async fn run_and_stream(
        &self,
        tenant_id: Uuid,
        agent_slug: &str,
        input_params: Value,
        mode: &str,
    ) -> Result<(StartedRun, impl Stream<Item = ExecutionEvent>)> {
        let queue = EventQueue::with_capacity(self.config.event_queue_capacity);
        let (sender, receiver) = queue.into_parts();
        let run_id = self
            .launch_root(tenant_id, agent_slug, input_params, mode, Some(sender))
            .await?;

        let filter = StreamFilter::new(StreamMode::from_str_or_production(mode));
        let stream = ReceiverStream::new(receiver).flat_map(move |event| futures::stream::iter(filter.apply(&event)));

        Ok((StartedRun { run_id }, stream))
    }

    async fn launch_root(
        &self,
        tenant_id: Uuid,
        agent_slug: &str,
        input_params: Value,
        mode: &str,
        sender: Option<agentflow_stream::EventSender>,
    ) -> Result<Uuid> {
        let agent = self
            .agent_store
            .get_by_slug(tenant_id, agent_slug)
            .await
            .ok_or_else(|| AgentflowError::AgentNotFound(agent_slug.to_string()))?;

        let mut run = Run::new_root(tenant_id, agent.id, agent.version, input_params);
        run.started_at = Some(self.clock.now());
        let run_id = run.id;
        self.run_store.put(run.clone()).await;

        let sender = match sender {
            Some(sender) => sender,
            None => {
                let queue = EventQueue::with_capacity(self.config.event_queue_capacity);
                queue.sender()
            }
        };
        let emitter = Emitter::new(sender, run_id.to_string(), mode.to_string());
        self.host.spawn_run_to_completion(run, emitter);
        Ok(run_id)
    }

    /// Resume a paused run, feeding it `resume_payload` at the interrupt
    /// node it stopped at.
    pub async fn resume_run(
        &self,
        run_id: Uuid,
        resume_payload: Value,
        mode: &str,
    ) -> Result<(StartedRun, impl Stream<Item = ExecutionEvent>)> {
        let run = self
            .run_store
            .get(run_id)
            .await
            .ok_or_else(|| AgentflowError::RunNotFound(run_id.to_string()))?;
        if run.status != RunStatus::Paused {
            return Err(AgentflowError::NotPaused);
        }

        let queue = EventQueue::with_capacity(self.config.event_queue_capacity);
        let (sender, receiver) = queue.into_parts();
        let emitter = Emitter::new(sender, run_id.to_string(), mode.to_string());
        self.host.spawn_resume(run, resume_payload, emitter);

        let filter = StreamFilter::new(StreamMode::from_str_or_production(mode));
        let stream = ReceiverStream::new(receiver).flat_map(move |event| futures::stream::iter(filter.apply(&event)));
        Ok((StartedRun { run_id }, stream))
    }

    pub async fn run_status(&self, run_id: Uuid) -> Option<RunStatus> {
        self.run_store.get(run_id).await.map(|r| r.status)
    }

    /// Cancel `run_id` and, unless `include_root` is false, its entire
    /// delegation subtree (`spec.md` §4.7's `cancel_subtree`).
    pub async fn cancel_subtree(&self, run_id: Uuid, include_root: bool, reason: &str) -> Result<Value> {
        self.kernel
            .cancel_subtree(&run_id.to_string(), include_root, reason)
            .await
            .map_err(AgentflowError::InvalidRequest)
    }

    /// Evaluate (and possibly finalize) an orchestration group's join
    /// decision (`spec.md` §4.7's `join`).
    pub async fn join(&self, group_id: Uuid, request: Value) -> Result<Value> {
        self.kernel
            .join(&group_id.to_string(), request)
            .await
            .map_err(AgentflowError::InvalidRequest)
    }
}

/// Anchors the cancellation-token type in this module's public surface so
/// a host embedding [`Runtime`] can construct one for tests without
/// reaching into `agentflow-graph` directly.
pub type Cancellation = CancellationToken;
