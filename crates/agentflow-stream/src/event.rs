use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an event is safe to forward to an end-user client, or only
/// meant for internal/debug consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Internal/diagnostic event (`node_start`, `on_tool_*`, orchestration
    /// lifecycle, …). Only delivered in [`crate::StreamMode::Debug`].
    Internal,
    /// Safe to deliver to any consumer (`token`, `run_status`, `error`).
    ClientSafe,
}

/// The kind of an [`ExecutionEvent`]. `spec.md` §6 enumerates the known
/// kinds; [`EventKind::Other`] is the catch-all for anything else, which
/// is always tagged [`Visibility::Internal`] with a logged warning
/// (`spec.md` §9 design note on "dynamic event dicts with inferred
/// visibility").
///
/// Serializes to (and parses from) the bare wire string named in `spec.md`
/// §6, e.g. `"node_start"` or `"orchestration.join_decision"` — not a
/// `{"node_start": null}`-shaped tagged union — since on the wire `event`
/// sits alongside `data`, `run_id`, etc. as a plain string field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A node began executing.
    NodeStart,
    /// A node finished executing.
    NodeEnd,
    /// A streamed chunk of LLM output.
    Token,
    /// A tool invocation began.
    OnToolStart,
    /// A tool invocation finished (success or failure).
    OnToolEnd,
    /// The run's terminal/transitional status changed.
    RunStatus,
    /// A run-level error occurred.
    Error,
    /// Synthesized UI-facing reasoning event (debug mode only).
    Reasoning,
    /// A `spawn_run`/`spawn_group` decision was made.
    OrchestrationSpawnDecision,
    /// A child run's status changed, as observed by its orchestrator.
    OrchestrationChildLifecycle,
    /// A `join` produced a decision (complete, timed out, …).
    OrchestrationJoinDecision,
    /// Cancellation was propagated to one or more child runs.
    OrchestrationCancellationPropagation,
    /// An orchestration operation was denied by policy.
    OrchestrationPolicyDeny,
    /// Any event kind not otherwise recognized.
    Other(String),
}

impl From<&str> for EventKind {
    fn from(raw: &str) -> Self {
        match raw {
            "node_start" => EventKind::NodeStart,
            "node_end" => EventKind::NodeEnd,
            "token" => EventKind::Token,
            "on_tool_start" => EventKind::OnToolStart,
            "on_tool_end" => EventKind::OnToolEnd,
            "run_status" => EventKind::RunStatus,
            "error" => EventKind::Error,
            "reasoning" => EventKind::Reasoning,
            "orchestration.spawn_decision" => EventKind::OrchestrationSpawnDecision,
            "orchestration.child_lifecycle" => EventKind::OrchestrationChildLifecycle,
            "orchestration.join_decision" => EventKind::OrchestrationJoinDecision,
            "orchestration.cancellation_propagation" => {
                EventKind::OrchestrationCancellationPropagation
            }
            "orchestration.policy_deny" => EventKind::OrchestrationPolicyDeny,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(EventKind::from(raw.as_str()))
    }
}

impl EventKind {
    /// The default visibility for this kind, absent an explicit override.
    pub fn default_visibility(&self) -> Visibility {
        match self {
            EventKind::Token | EventKind::RunStatus | EventKind::Error => Visibility::ClientSafe,
            _ => Visibility::Internal,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::NodeStart => "node_start",
            EventKind::NodeEnd => "node_end",
            EventKind::Token => "token",
            EventKind::OnToolStart => "on_tool_start",
            EventKind::OnToolEnd => "on_tool_end",
            EventKind::RunStatus => "run_status",
            EventKind::Error => "error",
            EventKind::Reasoning => "reasoning",
            EventKind::OrchestrationSpawnDecision => "orchestration.spawn_decision",
            EventKind::OrchestrationChildLifecycle => "orchestration.child_lifecycle",
            EventKind::OrchestrationJoinDecision => "orchestration.join_decision",
            EventKind::OrchestrationCancellationPropagation => {
                "orchestration.cancellation_propagation"
            }
            EventKind::OrchestrationPolicyDeny => "orchestration.policy_deny",
            EventKind::Other(raw) => raw.as_str(),
        };
        f.write_str(s)
    }
}

/// The wire shape from `spec.md` §6: `{event, data, run_id, span_id?,
/// name?, visibility, metadata}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    /// The event kind.
    pub event: EventKind,
    /// Event-specific payload.
    pub data: serde_json::Value,
    /// The run this event belongs to.
    pub run_id: String,
    /// Span identifier (usually the node id or tool call id), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    /// Human-readable name (node name, tool name), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Consumer-visibility tag.
    pub visibility: Visibility,
    /// Free-form metadata (e.g. `{"mode": "debug"}`).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl ExecutionEvent {
    /// Build an event with `data`'s visibility inferred from `kind`.
    pub fn new(kind: EventKind, run_id: impl Into<String>, data: serde_json::Value) -> Self {
        let visibility = kind.default_visibility();
        Self {
            event: kind,
            data,
            run_id: run_id.into(),
            span_id: None,
            name: None,
            visibility,
            metadata: serde_json::Value::Null,
        }
    }

    /// Attach a span id.
    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    /// Attach a human-readable name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override the inferred visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}
