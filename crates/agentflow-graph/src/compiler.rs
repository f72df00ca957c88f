//! Validates an authored [`Graph`] and compiles it into an
//! [`ExecutableWorkflow`]: id-indexed nodes, an adjacency map keyed by
//! `(source, source_handle)`, and the precomputed interrupt-node set.
//! Grounded in `langgraph-core::builder::StateGraph::compile`'s
//! validate-then-freeze shape, generalized from its single implicit
//! "edges out of a node" map to one keyed by branch handle so `if_else`/
//! `router`/`classify`/`while` can fan out deterministically.

use crate::error::{GraphError, Result, ValidationIssue};
use crate::types::{Edge, Graph, Node, NodeType};
use std::collections::{HashMap, HashSet};

/// A [`Graph`] that has passed validation, frozen into the shape the
/// [`crate::engine::Engine`] drives.
#[derive(Debug, Clone)]
pub struct ExecutableWorkflow {
    pub spec_version: String,
    pub entry_node: String,
    nodes: HashMap<String, Node>,
    /// `(source_id, source_handle)` -> target node ids. `source_handle` is
    /// `None` for non-branching edges, `Some(branch)` for edges out of a
    /// routing node's named handle.
    edges: HashMap<(String, Option<String>), Vec<String>>,
    interrupt_nodes: HashSet<String>,
}

impl ExecutableWorkflow {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn is_interrupt(&self, id: &str) -> bool {
        self.interrupt_nodes.contains(id)
    }

    /// The node(s) reached by following `source`'s `branch` handle (or the
    /// unbranched edge, when `branch` is `None`).
    pub fn successors(&self, source: &str, branch: Option<&str>) -> &[String] {
        static EMPTY: Vec<String> = Vec::new();
        self.edges
            .get(&(source.to_string(), branch.map(str::to_string)))
            .map(Vec::as_slice)
            .unwrap_or(&EMPTY)
    }
}

/// Structural + semantic validation per `spec.md` §4.1. `known_tools`/
/// `known_models` are used for the [`ValidationIssue::UnknownTool`]/
/// [`ValidationIssue::UnknownModel`] checks; pass empty sets to skip them
/// (e.g. when compiling before a tool/model registry is wired up).
pub fn validate(graph: &Graph, known_tools: &HashSet<String>, known_models: &HashSet<String>) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut seen_ids = HashSet::new();
    let mut start_ids = Vec::new();

    for node in &graph.nodes {
        if !seen_ids.insert(node.id.clone()) {
            issues.push(ValidationIssue::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
        if node.node_type == NodeType::Start {
            start_ids.push(node.id.clone());
        }
        if node.node_type == NodeType::Tool {
            if let Some(slug) = node.config.get("tool_slug").and_then(|v| v.as_str()) {
                if !known_tools.is_empty() && !known_tools.contains(slug) {
                    issues.push(ValidationIssue::UnknownTool {
                        node_id: node.id.clone(),
                        tool_slug: slug.to_string(),
                    });
                }
            }
        }
        if matches!(node.node_type, NodeType::Agent | NodeType::Llm | NodeType::Classify) {
            if let Some(model_id) = node.config.get("model_id").and_then(|v| v.as_str()) {
                if !known_models.is_empty() && !known_models.contains(model_id) {
                    issues.push(ValidationIssue::UnknownModel {
                        node_id: node.id.clone(),
                        model_id: model_id.to_string(),
                    });
                }
            }
        }
    }

    match start_ids.len() {
        0 => issues.push(ValidationIssue::MissingStart),
        1 => {}
        _ => issues.push(ValidationIssue::MultipleStart { node_ids: start_ids.clone() }),
    }

    let node_ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    for edge in &graph.edges {
        if !node_ids.contains(edge.source.as_str()) || !node_ids.contains(edge.target.as_str()) {
            issues.push(ValidationIssue::DanglingEdge { edge_id: edge.id.clone() });
        }
    }

    if let Some(start_id) = start_ids.first() {
        let reachable = reachable_from(start_id, &graph.edges);
        for node in &graph.nodes {
            if !reachable.contains(node.id.as_str()) {
                issues.push(ValidationIssue::UnreachableNode { node_id: node.id.clone() });
            }
        }
        let has_reachable_end = graph
            .nodes
            .iter()
            .any(|n| n.node_type == NodeType::End && reachable.contains(n.id.as_str()));
        if !has_reachable_end {
            issues.push(ValidationIssue::MissingEnd);
        }
    }

    issues
}

fn reachable_from<'a>(start: &'a str, edges: &'a [Edge]) -> HashSet<&'a str> {
    let mut visited = HashSet::new();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        for edge in edges {
            if edge.source == id {
                stack.push(edge.target.as_str());
            }
        }
    }
    visited
}

/// Validates `graph` (fatal issues abort compilation) and freezes it into
/// an [`ExecutableWorkflow`].
pub fn compile(
    graph: &Graph,
    known_tools: &HashSet<String>,
    known_models: &HashSet<String>,
) -> Result<ExecutableWorkflow> {
    let issues = validate(graph, known_tools, known_models);
    let fatal: Vec<ValidationIssue> = issues.into_iter().filter(|i| i.is_fatal()).collect();
    if !fatal.is_empty() {
        return Err(GraphError::Validation(fatal));
    }

    let entry_node = graph
        .nodes
        .iter()
        .find(|n| n.node_type == NodeType::Start)
        .map(|n| n.id.clone())
        .expect("validate() guarantees exactly one start node when no fatal issues remain");

    let interrupt_nodes = graph
        .nodes
        .iter()
        .filter(|n| n.node_type.is_interrupt())
        .map(|n| n.id.clone())
        .collect();

    let mut edges: HashMap<(String, Option<String>), Vec<String>> = HashMap::new();
    for edge in &graph.edges {
        edges
            .entry((edge.source.clone(), edge.source_handle.clone()))
            .or_default()
            .push(edge.target.clone());
    }

    let nodes = graph.nodes.iter().map(|n| (n.id.clone(), n.clone())).collect();

    Ok(ExecutableWorkflow {
        spec_version: graph.spec_version.clone(),
        entry_node,
        nodes,
        edges,
        interrupt_nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeType;
    use serde_json::json;
    use std::collections::HashMap as Map;

    fn node(id: &str, node_type: NodeType) -> Node {
        Node {
            id: id.to_string(),
            node_type,
            position: None,
            config: json!({}),
            input_mappings: Map::new(),
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

    fn linear_graph() -> Graph {
        Graph {
            spec_version: "v1".to_string(),
            nodes: vec![node("s", NodeType::Start), node("e", NodeType::End)],
            edges: vec![edge("s_e", "s", "e")],
        }
    }

    #[test]
    fn compiles_a_valid_linear_graph() {
        let graph = linear_graph();
        let workflow = compile(&graph, &HashSet::new(), &HashSet::new()).unwrap();
        assert_eq!(workflow.entry_node, "s");
        assert_eq!(workflow.successors("s", None), ["e".to_string()]);
    }

    #[test]
    fn missing_start_is_fatal() {
        let graph = Graph {
            spec_version: "v1".to_string(),
            nodes: vec![node("e", NodeType::End)],
            edges: vec![],
        };
        let result = compile(&graph, &HashSet::new(), &HashSet::new());
        assert!(matches!(result, Err(GraphError::Validation(_))));
    }

    #[test]
    fn unreachable_node_is_a_non_fatal_warning() {
        let mut graph = linear_graph();
        graph.nodes.push(node("orphan", NodeType::SetState));
        let issues = validate(&graph, &HashSet::new(), &HashSet::new());
        assert!(issues.iter().any(|i| matches!(i, ValidationIssue::UnreachableNode { node_id } if node_id == "orphan")));
        assert!(compile(&graph, &HashSet::new(), &HashSet::new()).is_ok());
    }

    #[test]
    fn dangling_edge_is_fatal() {
        let mut graph = linear_graph();
        graph.edges.push(edge("bad", "s", "nowhere"));
        let result = compile(&graph, &HashSet::new(), &HashSet::new());
        assert!(matches!(result, Err(GraphError::Validation(_))));
    }
}
