use crate::queue::{try_send, EventSender};
use crate::{EventKind, ExecutionEvent, Visibility};
use serde_json::{json, Value};
use std::future::Future;

/// Fire-and-forget event emission, handed to (or made ambient for) node
/// executors.
///
/// Contract (`spec.md` §4.4): every `emit_*` method is non-blocking, never
/// throws, never awaits I/O, and never affects control flow. Grounded in
/// `original_source/backend/app/agent/execution/emitter.py`'s
/// `EventEmitter`, generalized from its `queue.put_nowait` to
/// [`crate::queue::try_send`].
#[derive(Clone)]
pub struct Emitter {
    sender: EventSender,
    run_id: String,
    mode: String,
}

impl Emitter {
    /// Build an emitter bound to `run_id`, pushing onto `sender`. `mode`
    /// (`"debug"` or `"production"`) is attached to every event's metadata,
    /// matching the Python emitter's behavior.
    pub fn new(sender: EventSender, run_id: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            sender,
            run_id: run_id.into(),
            mode: mode.into(),
        }
    }

    fn emit(&self, kind: EventKind, data: Value, span_id: Option<String>, name: Option<String>) {
        let mut event = ExecutionEvent::new(kind, self.run_id.clone(), data)
            .with_metadata(json!({"mode": self.mode}));
        if let Some(span_id) = span_id {
            event = event.with_span_id(span_id);
        }
        if let Some(name) = name {
            event = event.with_name(name);
        }
        try_send(&self.sender, event);
    }

    /// Emit a streamed token chunk from an `agent`/`llm` node.
    pub fn emit_token(&self, content: &str, node_id: &str, span_id: Option<&str>) {
        self.emit(
            EventKind::Token,
            json!({"content": content}),
            span_id.map(str::to_string),
            Some(node_id.to_string()),
        );
    }

    /// Emit a node-start boundary marker.
    pub fn emit_node_start(&self, node_id: &str, name: &str, node_type: &str, input: Option<Value>) {
        let mut data = json!({"type": node_type});
        if let Some(input) = input {
            data["input"] = input;
        }
        self.emit(
            EventKind::NodeStart,
            data,
            Some(node_id.to_string()),
            Some(name.to_string()),
        );
    }

    /// Emit a node-end boundary marker.
    pub fn emit_node_end(&self, node_id: &str, name: &str, node_type: &str, output: Option<Value>) {
        let mut data = json!({"type": node_type});
        if let Some(output) = output {
            data["output"] = output;
        }
        self.emit(
            EventKind::NodeEnd,
            data,
            Some(node_id.to_string()),
            Some(name.to_string()),
        );
    }

    /// Emit a tool-invocation-started event.
    pub fn emit_tool_start(&self, tool_name: &str, input: Option<Value>, node_id: Option<&str>) {
        let data = match input {
            Some(input) => json!({"input": input}),
            None => json!({}),
        };
        self.emit(
            EventKind::OnToolStart,
            data,
            node_id.map(str::to_string),
            Some(tool_name.to_string()),
        );
    }

    /// Emit a tool-invocation-finished event.
    pub fn emit_tool_end(&self, tool_name: &str, output: Option<Value>, node_id: Option<&str>) {
        let data = match output {
            Some(output) => json!({"output": output}),
            None => json!({}),
        };
        self.emit(
            EventKind::OnToolEnd,
            data,
            node_id.map(str::to_string),
            Some(tool_name.to_string()),
        );
    }

    /// Emit a run-level error.
    pub fn emit_error(&self, error: &str, node_id: Option<&str>) {
        self.emit(
            EventKind::Error,
            json!({"error": error}),
            node_id.map(str::to_string),
            None,
        );
    }

    /// Emit the run's terminal/transitional status.
    pub fn emit_run_status(&self, status: &str) {
        self.emit(EventKind::RunStatus, json!({"status": status}), None, None);
    }

    /// Emit an `orchestration.spawn_decision` event.
    pub fn emit_orchestration_spawn_decision(&self, data: Value) {
        self.emit(EventKind::OrchestrationSpawnDecision, data, None, None);
    }

    /// Emit an `orchestration.child_lifecycle` event.
    pub fn emit_orchestration_child_lifecycle(&self, data: Value) {
        self.emit(EventKind::OrchestrationChildLifecycle, data, None, None);
    }

    /// Emit an `orchestration.join_decision` event.
    pub fn emit_orchestration_join_decision(&self, data: Value) {
        self.emit(EventKind::OrchestrationJoinDecision, data, None, None);
    }

    /// Emit an `orchestration.cancellation_propagation` event.
    pub fn emit_orchestration_cancellation_propagation(&self, data: Value) {
        self.emit(
            EventKind::OrchestrationCancellationPropagation,
            data,
            None,
            None,
        );
    }

    /// Emit an `orchestration.policy_deny` event.
    pub fn emit_orchestration_policy_deny(&self, data: Value) {
        self.emit(EventKind::OrchestrationPolicyDeny, data, None, None);
    }

    /// The run id this emitter is bound to.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Whether this event's kind, by visibility, would be dropped by a
    /// production-mode consumer. Executors rarely need this directly; it's
    /// exposed for node types (`classify`, `rag`) that want to skip
    /// producing internal-only diagnostics cheaply.
    pub fn is_debug(&self) -> bool {
        self.mode == "debug"
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("run_id", &self.run_id)
            .field("mode", &self.mode)
            .field("visibility_default", &Visibility::Internal)
            .finish()
    }
}

tokio::task_local! {
    static ACTIVE_EMITTER: Emitter;
}

/// Run `future` with `emitter` bound as the ambient emitter for the
/// duration of the task, mirroring the Python `contextvars.ContextVar`
/// scoping in `emitter.py`. Node executors that don't have the emitter
/// threaded through their arguments can retrieve it via
/// [`ambient_emitter`].
pub async fn run_with_emitter<F>(emitter: Emitter, future: F) -> F::Output
where
    F: Future,
{
    ACTIVE_EMITTER.scope(emitter, future).await
}

/// Fetch the ambient emitter bound by the nearest enclosing
/// [`run_with_emitter`] call. Panics if called outside of one — executors
/// should prefer receiving the emitter explicitly via
/// `ExecutionContext::emitter` and only reach for this when plumbing it
/// through would be awkward (e.g. deep inside a third-party callback).
pub fn ambient_emitter() -> Emitter {
    ACTIVE_EMITTER.with(|e| e.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::EventQueue;

    #[tokio::test]
    async fn ambient_emitter_round_trips() {
        let queue = EventQueue::with_capacity(8);
        let sender = queue.sender();
        let (_s, mut receiver) = queue.into_parts();
        let emitter = Emitter::new(sender, "run-1", "debug");

        run_with_emitter(emitter, async {
            let e = ambient_emitter();
            e.emit_token("hi", "n1", None);
        })
        .await;

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event, EventKind::Token);
        assert_eq!(event.run_id, "run-1");
    }

    #[tokio::test]
    async fn node_boundary_events_carry_type() {
        let queue = EventQueue::with_capacity(8);
        let emitter = Emitter::new(queue.sender(), "run-1", "debug");
        let (_s, mut receiver) = queue.into_parts();

        emitter.emit_node_start("n1", "Set State", "set_state", None);
        emitter.emit_node_end("n1", "Set State", "set_state", Some(json!({"x": 1})));

        let start = receiver.recv().await.unwrap();
        assert_eq!(start.event, EventKind::NodeStart);
        assert_eq!(start.visibility, Visibility::Internal);

        let end = receiver.recv().await.unwrap();
        assert_eq!(end.event, EventKind::NodeEnd);
        assert_eq!(end.data["output"], json!({"x": 1}));
    }
}
