//! Server-Sent-Events wire framing for an [`ExecutionEvent`] stream.
//!
//! This crate stays library-only: there is no HTTP listener here, only the
//! formatting function a host's own web framework calls per outgoing
//! event. Framing follows the standard SSE grammar
//! (`event: <kind>\ndata: <json>\n\n`).

use agentflow_stream::ExecutionEvent;

/// Format one event as a single SSE message, terminated by the blank line
/// that marks the end of an SSE event in the standard grammar. The
/// `event:` field carries the event kind so a browser `EventSource` can
/// register per-kind listeners without parsing `data`.
pub fn format_event(event: &ExecutionEvent) -> String {
    let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    format!("event: {}\ndata: {}\n\n", event.event, data)
}

/// The `: comment\n\n` keep-alive frame a long-idle SSE connection sends
/// to stop intermediaries from timing it out. Carries no data, so an
/// `EventSource` consumer never surfaces it as a `message` event.
pub fn keepalive_comment() -> &'static str {
    ": keep-alive\n\n"
}

/// The terminal frame a caller writes once the underlying stream ends,
/// letting a consumer distinguish "the run finished" from "the connection
/// dropped".
pub fn format_done() -> &'static str {
    "event: done\ndata: {}\n\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_stream::EventKind;
    use serde_json::json;

    #[test]
    fn formats_event_and_data_fields() {
        let event = ExecutionEvent::new(EventKind::Token, "run-1", json!({"content": "hi"}));
        let framed = format_event(&event);
        assert!(framed.starts_with("event: on_token\n") || framed.starts_with("event: token\n"));
        assert!(framed.contains("\"run_id\":\"run-1\""));
        assert!(framed.ends_with("\n\n"));
    }

    #[test]
    fn keepalive_is_a_comment_frame() {
        assert!(keepalive_comment().starts_with(':'));
    }

    #[test]
    fn done_frame_is_well_formed() {
        assert!(format_done().starts_with("event: done"));
        assert!(format_done().ends_with("\n\n"));
    }
}
