use crate::{EventKind, ExecutionEvent, Visibility};
use serde_json::Value;
use tracing::warn;

/// Wrap an arbitrary JSON payload (as produced by a third-party callback,
/// a replayed checkpoint, or anything else that didn't go through
/// [`crate::Emitter`] directly) into an [`ExecutionEvent`].
///
/// Grounded in `spec.md` §9's design note on normalizing "dynamic event
/// dicts with inferred visibility": `payload` is expected to carry an
/// `"event"` string field (and, optionally, `run_id`/`data`/`span_id`/
/// `name`/`visibility`/`metadata`); anything shaped otherwise is still
/// wrapped rather than rejected, with the whole payload kept as `data` and
/// an [`EventKind::Other`] kind. A kind not recognized by
/// [`EventKind::from`] falls through to [`EventKind::Other`] and is
/// logged, but never causes this function to fail — normalization must
/// never introduce a new failure mode into the stream pipeline.
pub fn normalize(run_id: &str, payload: Value) -> ExecutionEvent {
    let Some(obj) = payload.as_object() else {
        warn!(run_id, "normalizing non-object event payload");
        return ExecutionEvent::new(
            EventKind::Other("unknown".to_string()),
            run_id,
            payload,
        );
    };

    let kind_raw = obj.get("event").and_then(Value::as_str);
    let kind = match kind_raw {
        Some(raw) => EventKind::from(raw),
        None => {
            warn!(run_id, "event payload missing \"event\" field");
            EventKind::Other("unknown".to_string())
        }
    };
    if matches!(&kind, EventKind::Other(raw) if Some(raw.as_str()) == kind_raw) {
        warn!(run_id, kind = kind_raw, "unrecognized event kind, defaulting to internal visibility");
    }

    let data = obj.get("data").cloned().unwrap_or(Value::Null);
    let run_id = obj
        .get("run_id")
        .and_then(Value::as_str)
        .unwrap_or(run_id)
        .to_string();

    let mut event = ExecutionEvent::new(kind, run_id, data);

    if let Some(span_id) = obj.get("span_id").and_then(Value::as_str) {
        event = event.with_span_id(span_id);
    }
    if let Some(name) = obj.get("name").and_then(Value::as_str) {
        event = event.with_name(name);
    }
    if let Some(visibility) = obj.get("visibility").and_then(Value::as_str) {
        let visibility = match visibility {
            "client_safe" => Visibility::ClientSafe,
            _ => Visibility::Internal,
        };
        event = event.with_visibility(visibility);
    }
    if let Some(metadata) = obj.get("metadata") {
        event = event.with_metadata(metadata.clone());
    }

    event
}
