//! The workflow graph as the engine sees it.
//!
//! The graph editor produces `{nodes: [...], edges: [...]}` JSON; it is
//! decoded here exactly once per step.  Unknown fields are forward
//! compatible (ignored), unknown action kinds decode to
//! [`NodeAction::Unknown`], and every action-specific config payload is
//! turned into its typed form at this boundary.

use actions::config::{NodeAction, RetryPolicy};
use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// TimeWindow
// ---------------------------------------------------------------------------

/// Weekday tag as the editor writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekdayTag {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl WeekdayTag {
    pub fn matches(self, day: Weekday) -> bool {
        matches!(
            (self, day),
            (Self::Mon, Weekday::Mon)
                | (Self::Tue, Weekday::Tue)
                | (Self::Wed, Weekday::Wed)
                | (Self::Thu, Weekday::Thu)
                | (Self::Fri, Weekday::Fri)
                | (Self::Sat, Weekday::Sat)
                | (Self::Sun, Weekday::Sun)
        )
    }
}

/// A recurring weekly interval during which direct-contact actions may run.
/// Interpreted in the single operational timezone; windows never span
/// midnight (`start <= end`, both bounds inclusive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub days: Vec<WeekdayTag>,
}

impl TimeWindow {
    pub fn covers_day(&self, day: Weekday) -> bool {
        self.days.iter().any(|tag| tag.matches(day))
    }

    pub fn contains(&self, day: Weekday, time: NaiveTime) -> bool {
        self.covers_day(day) && time >= self.start && time <= self.end
    }
}

/// `"HH:MM"` clock times, the editor's wire format.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M").map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Node / Edge / WorkflowGraph
// ---------------------------------------------------------------------------

/// A single step in the workflow graph, with its action payload decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub action: NodeAction,
    /// Applied when *entering* this node: the run waits this long before the
    /// action executes.
    pub delay_minutes: i64,
    pub time_windows: Vec<TimeWindow>,
    pub retry: Option<RetryPolicy>,
}

/// A labeled transition out of a node.  The handle determines which outcome
/// the edge matches; an untagged edge matches any outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(default)]
    pub id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    #[serde(default)]
    pub source_handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

// Raw wire shapes; only used during decode.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGraph {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    id: String,
    action: String,
    #[serde(default)]
    config: serde_json::Value,
    #[serde(default)]
    delay_minutes: i64,
    #[serde(default)]
    time_windows: Vec<TimeWindow>,
    #[serde(default)]
    retry: Option<RetryPolicy>,
}

impl WorkflowGraph {
    /// Decode the editor-produced JSON definition.
    pub fn from_definition(definition: serde_json::Value) -> Result<Self, EngineError> {
        let raw: RawGraph =
            serde_json::from_value(definition).map_err(EngineError::InvalidDefinition)?;

        let nodes = raw
            .nodes
            .into_iter()
            .map(|node| {
                let action = NodeAction::from_parts(&node.action, node.config).map_err(
                    |source| EngineError::InvalidNodeConfig {
                        node_id: node.id.clone(),
                        source,
                    },
                )?;
                Ok(Node {
                    id: node.id,
                    action,
                    delay_minutes: node.delay_minutes,
                    time_windows: node.time_windows,
                    retry: node.retry,
                })
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        Ok(Self {
            nodes,
            edges: raw.edges,
        })
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Outgoing edges of a node, in definition order.
    pub fn edges_from<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges
            .iter()
            .filter(move |e| e.source_node_id == node_id)
    }

    /// The entry node: the first node with no inbound edge.
    pub fn entry_node(&self) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|n| !self.edges.iter().any(|e| e.target_node_id == n.id))
    }
}
