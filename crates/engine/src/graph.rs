//! Graph validation — run this before persisting or executing a workflow.
//!
//! Rules enforced:
//! 1. Node IDs must be unique within the graph.
//! 2. Every edge must reference valid node IDs (both endpoints).
//! 3. A node's outgoing edges partition by handle: at most one edge per
//!    handle (including the untagged "any outcome" handle).
//! 4. Time windows must not span midnight (`start <= end`).
//! 5. A retry policy must allow at least one attempt.
//! 6. At least one node must have no inbound edge (the entry node).

use std::collections::HashSet;

use crate::error::EngineError;
use crate::models::WorkflowGraph;

pub fn validate_graph(graph: &WorkflowGraph) -> Result<(), EngineError> {
    // -----------------------------------------------------------------------
    // 1. Ensure node IDs are unique
    // -----------------------------------------------------------------------
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for node in &graph.nodes {
        if !seen_ids.insert(node.id.as_str()) {
            return Err(EngineError::DuplicateNodeId(node.id.clone()));
        }
    }

    let node_set: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();

    // -----------------------------------------------------------------------
    // 2. Validate edge endpoints
    // -----------------------------------------------------------------------
    for edge in &graph.edges {
        if !node_set.contains(edge.source_node_id.as_str()) {
            return Err(EngineError::UnknownNodeReference {
                node_id: edge.source_node_id.clone(),
                side: "source",
            });
        }
        if !node_set.contains(edge.target_node_id.as_str()) {
            return Err(EngineError::UnknownNodeReference {
                node_id: edge.target_node_id.clone(),
                side: "target",
            });
        }
    }

    // -----------------------------------------------------------------------
    // 3. One outgoing edge per (node, handle)
    // -----------------------------------------------------------------------
    let mut handles: HashSet<(&str, Option<&str>)> = HashSet::new();
    for edge in &graph.edges {
        let key = (
            edge.source_node_id.as_str(),
            edge.source_handle.as_deref(),
        );
        if !handles.insert(key) {
            return Err(EngineError::AmbiguousHandle {
                node_id: edge.source_node_id.clone(),
                handle: edge.source_handle.clone(),
            });
        }
    }

    // -----------------------------------------------------------------------
    // 4./5. Per-node configuration sanity
    // -----------------------------------------------------------------------
    for node in &graph.nodes {
        for window in &node.time_windows {
            if window.start > window.end {
                return Err(EngineError::InvalidTimeWindow {
                    node_id: node.id.clone(),
                });
            }
        }
        if let Some(policy) = &node.retry {
            if policy.max_attempts == 0 {
                return Err(EngineError::InvalidRetryPolicy {
                    node_id: node.id.clone(),
                });
            }
        }
    }

    // -----------------------------------------------------------------------
    // 6. Entry node
    // -----------------------------------------------------------------------
    if !graph.nodes.is_empty() && graph.entry_node().is_none() {
        return Err(EngineError::NoEntryNode);
    }

    Ok(())
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Edge, Node};
    use actions::config::{NodeAction, RetryPolicy};
    use serde_json::json;

    fn make_node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            action: NodeAction::Wait,
            delay_minutes: 0,
            time_windows: vec![],
            retry: None,
        }
    }

    fn make_edge(source: &str, target: &str, handle: Option<&str>) -> Edge {
        Edge {
            id: format!("{source}-{target}"),
            source_node_id: source.into(),
            target_node_id: target.into(),
            source_handle: handle.map(str::to_owned),
        }
    }

    fn make_graph(nodes: Vec<Node>, edges: Vec<Edge>) -> WorkflowGraph {
        WorkflowGraph { nodes, edges }
    }

    #[test]
    fn branching_graph_is_valid() {
        let graph = make_graph(
            vec![make_node("a"), make_node("won"), make_node("lost")],
            vec![
                make_edge("a", "won", Some("positive")),
                make_edge("a", "lost", Some("negative")),
            ],
        );
        validate_graph(&graph).expect("should be valid");
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let graph = make_graph(vec![make_node("a"), make_node("a")], vec![]);
        assert!(matches!(
            validate_graph(&graph),
            Err(EngineError::DuplicateNodeId(id)) if id == "a"
        ));
    }

    #[test]
    fn edge_referencing_missing_node_is_rejected() {
        let graph = make_graph(
            vec![make_node("a")],
            vec![make_edge("a", "ghost", None)],
        );
        assert!(matches!(
            validate_graph(&graph),
            Err(EngineError::UnknownNodeReference { node_id, .. }) if node_id == "ghost"
        ));
    }

    #[test]
    fn two_edges_on_the_same_handle_are_rejected() {
        let graph = make_graph(
            vec![make_node("a"), make_node("b"), make_node("c")],
            vec![
                make_edge("a", "b", Some("positive")),
                make_edge("a", "c", Some("positive")),
            ],
        );
        assert!(matches!(
            validate_graph(&graph),
            Err(EngineError::AmbiguousHandle { node_id, .. }) if node_id == "a"
        ));
    }

    #[test]
    fn two_untagged_edges_are_rejected() {
        let graph = make_graph(
            vec![make_node("a"), make_node("b"), make_node("c")],
            vec![make_edge("a", "b", None), make_edge("a", "c", None)],
        );
        assert!(matches!(
            validate_graph(&graph),
            Err(EngineError::AmbiguousHandle { handle: None, .. })
        ));
    }

    #[test]
    fn midnight_spanning_window_is_rejected() {
        let mut node = make_node("late");
        node.time_windows = vec![serde_json::from_value(json!({
            "start": "22:00", "end": "02:00", "days": ["fri"]
        }))
        .unwrap()];
        let graph = make_graph(vec![node], vec![]);
        assert!(matches!(
            validate_graph(&graph),
            Err(EngineError::InvalidTimeWindow { node_id }) if node_id == "late"
        ));
    }

    #[test]
    fn zero_attempt_retry_policy_is_rejected() {
        let mut node = make_node("call");
        node.retry = Some(RetryPolicy {
            max_attempts: 0,
            backoff: Default::default(),
            interventions: vec![],
            one_attempt_per_window: false,
        });
        let graph = make_graph(vec![node], vec![]);
        assert!(matches!(
            validate_graph(&graph),
            Err(EngineError::InvalidRetryPolicy { .. })
        ));
    }

    #[test]
    fn fully_cyclic_graph_has_no_entry() {
        let graph = make_graph(
            vec![make_node("a"), make_node("b")],
            vec![make_edge("a", "b", None), make_edge("b", "a", None)],
        );
        assert!(matches!(
            validate_graph(&graph),
            Err(EngineError::NoEntryNode)
        ));
    }

    #[test]
    fn empty_graph_is_valid() {
        validate_graph(&make_graph(vec![], vec![])).expect("empty graph is fine");
    }
}
