//! The superstep-driving loop: pulls one node at a time off the compiled
//! workflow, resolves its input mappings, calls its executor, merges the
//! returned delta, checkpoints, and picks the next node — pausing at
//! interrupts and stopping at `end`.
//!
//! Grounded in `langgraph-core::pregel::executor`'s step loop, generalized
//! from Pregel's "all active nodes advance together" superstep model to a
//! single active node per run (per `spec.md` §4.3: "one node active at a
//! time per run; concurrency is across runs, not within one"), combined
//! with `original_source/backend/app/agent/execution/run_and_stream.py`'s
//! checkpoint-after-every-node and interrupt/resume handling.

use crate::compiler::ExecutableWorkflow;
use crate::error::{GraphError, Result};
use crate::node::{ExecutionContext, Registry};
use crate::ports::Ports;
use crate::run::{GraphState, Run, RunStatus};
use crate::template;
use agentflow_checkpoint::{Checkpoint, CheckpointKey, CheckpointSaver};
use agentflow_stream::Emitter;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How a [`Engine::run`]/[`Engine::resume`] call concluded.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Reached an `end` node (or a node with no outgoing edge); the run is
    /// terminal and its checkpoint has been deleted.
    Completed(Option<Value>),
    /// Hit an interrupt node; `node` is where a later `resume` must
    /// restart, `reason` is the prompt surfaced to the human/approver.
    Paused { node: String, reason: String },
}

/// Cooperative cancellation signal for one run, checked once per
/// superstep (`spec.md` §4.7: "cancellation is cooperative — checked at
/// node/superstep boundaries, not preemptive").
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Resolves a node's `input_mappings` (`name -> template`) against the
/// current state, the way `spec.md` §4.2 describes: each template is run
/// through [`template::resolve_mapping`] so a bare `{{upstream.x.y}}`
/// passes a structured value through untouched.
fn resolve_input_mappings(node: &crate::types::Node, state: &GraphState) -> std::collections::HashMap<String, Value> {
    node.input_mappings
        .iter()
        .map(|(name, tmpl)| (name.clone(), template::resolve_mapping(tmpl, state)))
        .collect()
}

/// Drives [`ExecutableWorkflow`]s forward. Stateless and shareable across
/// every run; all per-run state lives in the [`Run`]/[`GraphState`]/
/// [`Ports`] passed to each call.
pub struct Engine {
    registry: Registry,
    checkpoint_saver: Arc<dyn CheckpointSaver>,
}

impl Engine {
    pub fn new(checkpoint_saver: Arc<dyn CheckpointSaver>) -> Self {
        Self {
            registry: Registry::new(),
            checkpoint_saver,
        }
    }

    /// Override or extend the node-type registry (e.g. to plug in a
    /// custom executor), consuming and returning `self` for chaining at
    /// construction time.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Start a fresh run at `workflow.entry_node`.
    pub async fn run(
        &self,
        workflow: &ExecutableWorkflow,
        run: &mut Run,
        ports: Arc<Ports>,
        emitter: Emitter,
        cancellation: CancellationToken,
    ) -> Result<RunOutcome> {
        let mut state = GraphState::new(run.input_params.clone());
        run.status = RunStatus::Running;
        emitter.emit_run_status("running");
        self.drive(workflow, run, &mut state, workflow.entry_node.clone(), None, ports, emitter, cancellation, 0)
            .await
    }

    /// Resume a paused run from its last checkpoint, feeding `resume_payload`
    /// to the interrupt node it stopped at.
    pub async fn resume(
        &self,
        workflow: &ExecutableWorkflow,
        run: &mut Run,
        resume_payload: Value,
        ports: Arc<Ports>,
        emitter: Emitter,
        cancellation: CancellationToken,
    ) -> Result<RunOutcome> {
        let key = CheckpointKey::for_run(run.id);
        let checkpoint = self
            .checkpoint_saver
            .get(&key)
            .await?
            .ok_or_else(|| GraphError::state(None, "no checkpoint to resume from"))?;
        let mut state: GraphState = serde_json::from_value(checkpoint.state)?;
        let resume_node = checkpoint
            .next_node
            .ok_or_else(|| GraphError::state(None, "checkpoint has no resume node"))?;

        run.status = RunStatus::Running;
        emitter.emit_run_status("running");
        self.drive(
            workflow,
            run,
            &mut state,
            resume_node,
            Some(resume_payload),
            ports,
            emitter,
            cancellation,
            checkpoint.step,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn drive(
        &self,
        workflow: &ExecutableWorkflow,
        run: &mut Run,
        state: &mut GraphState,
        mut current_id: String,
        mut resume_payload: Option<Value>,
        ports: Arc<Ports>,
        emitter: Emitter,
        cancellation: CancellationToken,
        mut step: u64,
    ) -> Result<RunOutcome> {
        loop {
            if cancellation.is_cancelled() {
                run.status = RunStatus::Cancelled;
                emitter.emit_run_status("cancelled");
                return Err(GraphError::Cancelled(run.id.to_string()));
            }

            let node = workflow
                .node(&current_id)
                .ok_or_else(|| GraphError::state(Some(current_id.clone()), "node not found in compiled workflow"))?;

            let node_type_str = node.node_type.to_string();
            emitter.emit_node_start(&node.id, &node.id, &node_type_str, None);

            let executor = self
                .registry
                .get(node.node_type)
                .ok_or_else(|| GraphError::state(Some(node.id.clone()), "no executor registered for node type"))?;

            let resolved_inputs = resolve_input_mappings(node, state);
            let ctx = ExecutionContext {
                run_id: run.id.to_string(),
                emitter: emitter.clone(),
                resolved_inputs,
                resume_payload: resume_payload.take(),
                ports: ports.clone(),
            };

            match executor.execute(state, node, &ctx).await {
                Ok(delta) => {
                    emitter.emit_node_end(&node.id, &node.id, &node_type_str, delta.last_agent_output.clone());
                    step += 1;
                    state.merge(&node.id, &delta);

                    if node.node_type == crate::types::NodeType::End {
                        run.status = RunStatus::Completed;
                        run.output_result = delta.final_output.clone();
                        run.completed_at = Some(chrono::Utc::now());
                        self.checkpoint_saver.delete(&CheckpointKey::for_run(run.id)).await?;
                        emitter.emit_run_status("completed");
                        return Ok(RunOutcome::Completed(run.output_result.clone()));
                    }

                    let branch = delta.branch_taken.as_deref();
                    let successors = workflow.successors(&node.id, branch);
                    let next = delta.next.clone().or_else(|| successors.first().cloned());

                    let Some(next_id) = next else {
                        run.status = RunStatus::Completed;
                        run.output_result = state.last_agent_output.clone();
                        run.completed_at = Some(chrono::Utc::now());
                        self.checkpoint_saver.delete(&CheckpointKey::for_run(run.id)).await?;
                        emitter.emit_run_status("completed");
                        return Ok(RunOutcome::Completed(run.output_result.clone()));
                    };

                    let checkpoint = Checkpoint::new(serde_json::to_value(&*state)?, step, Some(next_id.clone()));
                    self.checkpoint_saver.put(CheckpointKey::for_run(run.id), checkpoint).await?;
                    current_id = next_id;
                }
                Err(GraphError::Interrupted { node: paused_at, reason }) => {
                    run.status = RunStatus::Paused;
                    let checkpoint = Checkpoint::new(serde_json::to_value(&*state)?, step, Some(paused_at.clone()));
                    self.checkpoint_saver.put(CheckpointKey::for_run(run.id), checkpoint).await?;
                    emitter.emit_run_status("paused");
                    return Ok(RunOutcome::Paused {
                        node: paused_at,
                        reason,
                    });
                }
                Err(err) => {
                    run.status = RunStatus::Failed;
                    run.error_message = Some(err.to_string());
                    run.completed_at = Some(chrono::Utc::now());
                    emitter.emit_error(&err.to_string(), Some(&node.id));
                    emitter.emit_run_status("failed");
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fake_ports;
    use crate::types::{Edge, Graph, Node, NodeType};
    use agentflow_checkpoint::InMemoryCheckpointSaver;
    use serde_json::json;
    use std::collections::HashMap;

    fn node(id: &str, node_type: NodeType, config: Value) -> Node {
        Node {
            id: id.to_string(),
            node_type,
            position: None,
            config,
            input_mappings: HashMap::new(),
        }
    }

    fn linear_workflow() -> ExecutableWorkflow {
        let graph = Graph {
            spec_version: "v1".to_string(),
            nodes: vec![
                node("s", NodeType::Start, json!({})),
                node("set", NodeType::SetState, json!({"assignments": {"greeted": true}})),
                node("e", NodeType::End, json!({"output_message": "done"})),
            ],
            edges: vec![
                Edge {
                    id: "e1".to_string(),
                    source: "s".to_string(),
                    target: "set".to_string(),
                    source_handle: None,
                    target_handle: None,
                },
                Edge {
                    id: "e2".to_string(),
                    source: "set".to_string(),
                    target: "e".to_string(),
                    source_handle: None,
                    target_handle: None,
                },
            ],
        };
        crate::compiler::compile(&graph, &Default::default(), &Default::default()).unwrap()
    }

    fn interrupt_workflow() -> ExecutableWorkflow {
        let graph = Graph {
            spec_version: "v1".to_string(),
            nodes: vec![
                node("s", NodeType::Start, json!({})),
                node("approve", NodeType::UserApproval, json!({"prompt": "ok?"})),
                node("e", NodeType::End, json!({"output_message": "done"})),
            ],
            edges: vec![
                Edge {
                    id: "e1".to_string(),
                    source: "s".to_string(),
                    target: "approve".to_string(),
                    source_handle: None,
                    target_handle: None,
                },
                Edge {
                    id: "e2".to_string(),
                    source: "approve".to_string(),
                    target: "e".to_string(),
                    source_handle: None,
                    target_handle: None,
                },
            ],
        };
        crate::compiler::compile(&graph, &Default::default(), &Default::default()).unwrap()
    }

    fn test_emitter() -> Emitter {
        let queue = agentflow_stream::EventQueue::with_capacity(32);
        Emitter::new(queue.sender(), "r1", "production")
    }

    #[tokio::test]
    async fn runs_a_linear_workflow_to_completion() {
        let engine = Engine::new(Arc::new(InMemoryCheckpointSaver::new()));
        let workflow = linear_workflow();
        let mut run = Run::new_root(uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), 1, json!({}));
        let outcome = engine
            .run(&workflow, &mut run, fake_ports(), test_emitter(), CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(outcome, RunOutcome::Completed(Some(_))));
        assert_eq!(run.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn pauses_at_interrupt_then_resumes() {
        let saver = Arc::new(InMemoryCheckpointSaver::new());
        let engine = Engine::new(saver.clone());
        let workflow = interrupt_workflow();
        let mut run = Run::new_root(uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), 1, json!({}));

        let outcome = engine
            .run(&workflow, &mut run, fake_ports(), test_emitter(), CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(outcome, RunOutcome::Paused { .. }));
        assert_eq!(run.status, RunStatus::Paused);
        assert_eq!(saver.len(), 1);

        let outcome = engine
            .resume(
                &workflow,
                &mut run,
                json!({"approved": true}),
                fake_ports(),
                test_emitter(),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, RunOutcome::Completed(_)));
        assert_eq!(run.status, RunStatus::Completed);
        assert!(saver.is_empty());
    }

    #[tokio::test]
    async fn cancellation_is_observed_before_the_next_node() {
        let engine = Engine::new(Arc::new(InMemoryCheckpointSaver::new()));
        let workflow = linear_workflow();
        let mut run = Run::new_root(uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), 1, json!({}));
        let token = CancellationToken::new();
        token.cancel();

        let result = engine.run(&workflow, &mut run, fake_ports(), test_emitter(), token).await;
        assert!(matches!(result, Err(GraphError::Cancelled(_))));
        assert_eq!(run.status, RunStatus::Cancelled);
    }
}
