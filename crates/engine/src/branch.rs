//! Branch Resolver: pick the outgoing edge an outcome follows.

use actions::config::NodeAction;
use actions::types::NodeOutcome;

use crate::models::{Edge, Node};

/// Handles a successful outcome may follow.
const SUCCESS_HANDLES: [&str; 2] = ["positive", "next"];
/// Handle a failed outcome follows.
const FAILURE_HANDLES: [&str; 1] = ["negative"];

/// Resolve the edge to follow out of `node` for `outcome`.
///
/// Switch nodes match the resolved group route literally; every other node
/// branches on success/failure.  An edge with no handle matches any outcome
/// and is the fallback when no tagged edge matches.  `None` means the run is
/// complete — the absence of an edge is the documented way to end a branch,
/// not an error.
pub fn resolve<'a>(node: &Node, outcome: &NodeOutcome, edges: &'a [Edge]) -> Option<&'a Edge> {
    let outgoing: Vec<&Edge> = edges
        .iter()
        .filter(|e| e.source_node_id == node.id)
        .collect();

    if let NodeAction::RouteByGroup(_) = node.action {
        if let Some(route) = &outcome.route_to {
            if let Some(edge) = outgoing
                .iter()
                .find(|e| e.source_handle.as_deref() == Some(route.as_str()))
            {
                return Some(*edge);
            }
        }
        return untagged(&outgoing);
    }

    let wanted: &[&str] = if outcome.success {
        &SUCCESS_HANDLES
    } else {
        &FAILURE_HANDLES
    };

    outgoing
        .iter()
        .find(|e| {
            matches!(&e.source_handle, Some(handle) if wanted.contains(&handle.as_str()))
        })
        .copied()
        .or_else(|| untagged(&outgoing))
}

fn untagged<'a>(outgoing: &[&'a Edge]) -> Option<&'a Edge> {
    outgoing.iter().find(|e| e.source_handle.is_none()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actions::config::{CallConfig, RouteConfig};

    fn node(id: &str, action: NodeAction) -> Node {
        Node {
            id: id.into(),
            action,
            delay_minutes: 0,
            time_windows: vec![],
            retry: None,
        }
    }

    fn edge(source: &str, target: &str, handle: Option<&str>) -> Edge {
        Edge {
            id: format!("{source}-{target}"),
            source_node_id: source.into(),
            target_node_id: target.into(),
            source_handle: handle.map(str::to_owned),
        }
    }

    #[test]
    fn success_follows_positive_or_next() {
        let n = node("call", NodeAction::Call(CallConfig::default()));
        let edges = vec![
            edge("call", "lost", Some("negative")),
            edge("call", "won", Some("positive")),
        ];
        let resolved = resolve(&n, &NodeOutcome::succeeded(), &edges).unwrap();
        assert_eq!(resolved.target_node_id, "won");

        let edges = vec![edge("call", "followup", Some("next"))];
        let resolved = resolve(&n, &NodeOutcome::succeeded(), &edges).unwrap();
        assert_eq!(resolved.target_node_id, "followup");
    }

    #[test]
    fn failure_follows_negative() {
        let n = node("call", NodeAction::Call(CallConfig::default()));
        let edges = vec![
            edge("call", "won", Some("positive")),
            edge("call", "lost", Some("negative")),
        ];
        let resolved = resolve(&n, &NodeOutcome::failed("no answer"), &edges).unwrap();
        assert_eq!(resolved.target_node_id, "lost");
    }

    #[test]
    fn untagged_edge_matches_any_outcome() {
        let n = node("call", NodeAction::Call(CallConfig::default()));
        let edges = vec![edge("call", "anyway", None)];
        assert_eq!(
            resolve(&n, &NodeOutcome::succeeded(), &edges).unwrap().target_node_id,
            "anyway"
        );
        assert_eq!(
            resolve(&n, &NodeOutcome::failed("boom"), &edges).unwrap().target_node_id,
            "anyway"
        );
    }

    #[test]
    fn no_matching_edge_completes_the_branch() {
        let n = node("call", NodeAction::Call(CallConfig::default()));
        let edges = vec![edge("call", "won", Some("positive"))];
        assert!(resolve(&n, &NodeOutcome::failed("no answer"), &edges).is_none());
        assert!(resolve(&n, &NodeOutcome::succeeded(), &[]).is_none());
    }

    #[test]
    fn switch_node_matches_the_route_handle() {
        let n = node("switch", NodeAction::RouteByGroup(RouteConfig::default()));
        let edges = vec![
            edge("switch", "cold_branch", Some("cold")),
            edge("switch", "hot_branch", Some("hot")),
        ];
        let resolved =
            resolve(&n, &NodeOutcome::routed(Some("hot".into())), &edges).unwrap();
        assert_eq!(resolved.target_node_id, "hot_branch");
    }

    #[test]
    fn switch_without_route_falls_back_to_untagged() {
        let n = node("switch", NodeAction::RouteByGroup(RouteConfig::default()));
        let edges = vec![
            edge("switch", "hot_branch", Some("hot")),
            edge("switch", "generic", None),
        ];
        let resolved = resolve(&n, &NodeOutcome::routed(None), &edges).unwrap();
        assert_eq!(resolved.target_node_id, "generic");

        // A route with no matching edge behaves the same way.
        let resolved =
            resolve(&n, &NodeOutcome::routed(Some("ghost".into())), &edges).unwrap();
        assert_eq!(resolved.target_node_id, "generic");
    }

    #[test]
    fn edges_of_other_nodes_are_ignored() {
        let n = node("a", NodeAction::Wait);
        let edges = vec![edge("b", "c", None)];
        assert!(resolve(&n, &NodeOutcome::succeeded(), &edges).is_none());
    }
}
