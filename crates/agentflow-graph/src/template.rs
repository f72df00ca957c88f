//! `{{state.x}}` / `{{upstream.node.key}}` variable interpolation, used by
//! the `end` node's `output_message` and by input-mapping resolution.

use crate::run::GraphState;
use regex::Regex;
use serde_json::Value;

fn placeholder_pattern() -> Regex {
    Regex::new(r"\{\{\s*([a-zA-Z0-9_.]+)\s*\}\}").expect("static interpolation regex is valid")
}

/// Render `template` against `state`, substituting every `{{path}}`
/// placeholder with the stringified value `path` resolves to (or the
/// empty string if unresolved, so a typo'd placeholder degrades instead of
/// panicking the run).
pub fn render(template: &str, state: &GraphState) -> String {
    let pattern = placeholder_pattern();
    let mut out = String::with_capacity(template.len());
    let mut last_end = 0;
    for captures in pattern.captures_iter(template) {
        let whole = captures.get(0).unwrap();
        let path = captures.get(1).unwrap().as_str();
        out.push_str(&template[last_end..whole.start()]);
        out.push_str(&stringify(state.resolve_path(path)));
        last_end = whole.end();
    }
    out.push_str(&template[last_end..]);
    out
}

fn stringify(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

/// Resolve a single `input_mappings` template entry against `state`. Unlike
/// [`render`], a mapping whose template is a *bare* placeholder
/// (`"{{upstream.n1.hits}}"`) yields the resolved value directly (object,
/// array, number, …) rather than its stringified form, so structured
/// upstream outputs pass through untouched.
pub fn resolve_mapping(template: &str, state: &GraphState) -> Value {
    let trimmed = template.trim();
    if let Some(path) = trimmed
        .strip_prefix("{{")
        .and_then(|s| s.strip_suffix("}}"))
    {
        let path = path.trim();
        if let Some(value) = state.resolve_path(path) {
            return value;
        }
        return Value::Null;
    }
    Value::String(render(template, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_state_placeholder() {
        let state = GraphState::new(json!({"x": "v"}));
        assert_eq!(render("got {{state.x}}", &state), "got v");
    }

    #[test]
    fn unresolved_placeholder_becomes_empty() {
        let state = GraphState::new(json!({}));
        assert_eq!(render("got {{state.missing}}", &state), "got ");
    }

    #[test]
    fn bare_mapping_passes_through_structured_value() {
        let mut state = GraphState::new(json!({}));
        state
            .node_outputs
            .insert("n1".to_string(), json!({"hits": [1, 2, 3]}));
        let resolved = resolve_mapping("{{upstream.n1.hits}}", &state);
        assert_eq!(resolved, json!([1, 2, 3]));
    }

    #[test]
    fn mapping_with_surrounding_text_stringifies() {
        let state = GraphState::new(json!({"x": "v"}));
        let resolved = resolve_mapping("value: {{state.x}}", &state);
        assert_eq!(resolved, json!("value: v"));
    }
}
