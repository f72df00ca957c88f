use crate::{EventKind, ExecutionEvent, Visibility};
use serde_json::json;

/// The two consumer modes named in `spec.md` §4.4: a `debug` consumer
/// sees every event (plus synthesized `reasoning` events); a `production`
/// consumer sees only [`Visibility::ClientSafe`] events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Debug,
    Production,
}

impl StreamMode {
    /// Parse from the `mode` string attached to a run (`"debug"` /
    /// `"production"`), defaulting unknown values to `Production` — the
    /// safer side to fail towards, since it only ever narrows what a
    /// consumer sees.
    pub fn from_str_or_production(raw: &str) -> Self {
        match raw {
            "debug" => StreamMode::Debug,
            _ => StreamMode::Production,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamMode::Debug => "debug",
            StreamMode::Production => "production",
        }
    }
}

/// Narrows the raw event stream to what a given [`StreamMode`] consumer
/// should actually receive, and synthesizes `reasoning` events in debug
/// mode.
///
/// Grounded in `orchestrator/src/execution/streaming.rs`'s mode-gated
/// forwarding, generalized with the `reasoning` synthesis called out in
/// `spec.md` §4.4 ("In `debug` mode, additionally synthesize a
/// `reasoning` event whenever an `on_tool_start`/`on_tool_end` event is
/// emitted").
#[derive(Debug, Clone, Copy)]
pub struct StreamFilter {
    mode: StreamMode,
}

impl StreamFilter {
    pub fn new(mode: StreamMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// Apply the filter to one incoming event, producing zero or more
    /// outgoing events (the original, a synthesized `reasoning` event,
    /// both, or neither).
    pub fn apply(&self, event: &ExecutionEvent) -> Vec<ExecutionEvent> {
        let mut out = Vec::new();

        let passes = match self.mode {
            StreamMode::Debug => true,
            StreamMode::Production => event.visibility == Visibility::ClientSafe,
        };
        if passes {
            out.push(event.clone());
        }

        if self.mode == StreamMode::Debug {
            if let Some(reasoning) = synthesize_reasoning(event) {
                out.push(reasoning);
            }
        }

        out
    }
}

fn synthesize_reasoning(event: &ExecutionEvent) -> Option<ExecutionEvent> {
    let phase = match event.event {
        EventKind::OnToolStart => "active",
        EventKind::OnToolEnd => "complete",
        _ => return None,
    };
    let tool_name = event.name.clone().unwrap_or_default();
    let mut reasoning = ExecutionEvent::new(
        EventKind::Reasoning,
        event.run_id.clone(),
        json!({"phase": phase, "tool": tool_name}),
    );
    if let Some(span_id) = &event.span_id {
        reasoning = reasoning.with_span_id(span_id.clone());
    }
    Some(reasoning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool_start(run_id: &str) -> ExecutionEvent {
        ExecutionEvent::new(EventKind::OnToolStart, run_id, json!({}))
            .with_name("search")
            .with_span_id("span-1")
    }

    #[test]
    fn production_drops_internal_events() {
        let filter = StreamFilter::new(StreamMode::Production);
        let out = filter.apply(&tool_start("r1"));
        assert!(out.is_empty());
    }

    #[test]
    fn production_keeps_client_safe_events() {
        let filter = StreamFilter::new(StreamMode::Production);
        let token = ExecutionEvent::new(EventKind::Token, "r1", json!({"content": "hi"}));
        let out = filter.apply(&token);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn debug_passes_internal_event_and_synthesizes_reasoning() {
        let filter = StreamFilter::new(StreamMode::Debug);
        let out = filter.apply(&tool_start("r1"));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].event, EventKind::OnToolStart);
        assert_eq!(out[1].event, EventKind::Reasoning);
        assert_eq!(out[1].data["phase"], json!("active"));
        assert_eq!(out[1].data["tool"], json!("search"));
        assert_eq!(out[1].span_id.as_deref(), Some("span-1"));
    }

    #[test]
    fn debug_does_not_synthesize_for_unrelated_events() {
        let filter = StreamFilter::new(StreamMode::Debug);
        let node_start = ExecutionEvent::new(EventKind::NodeStart, "r1", json!({}));
        let out = filter.apply(&node_start);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn mode_parses_with_production_default() {
        assert_eq!(StreamMode::from_str_or_production("debug"), StreamMode::Debug);
        assert_eq!(
            StreamMode::from_str_or_production("weird"),
            StreamMode::Production
        );
    }
}
