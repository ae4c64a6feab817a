//! Read models and the uniform outcome record.
//!
//! These types cross crate boundaries: the engine persists [`NodeOutcome`]
//! records into the run context and the store serves [`Contact`] and
//! [`AgentCandidate`] read models, so they live in this leaf crate.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Contact
// ---------------------------------------------------------------------------

/// A lead the workflow is nurturing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Preferred language, as an ISO 639-1 code where known.
    #[serde(default)]
    pub language: Option<String>,
    /// Legacy single-group field still written by older imports.
    #[serde(default)]
    pub primary_group_id: Option<String>,
    /// Multi-membership group rows.
    #[serde(default)]
    pub group_ids: Vec<String>,
}

impl Contact {
    /// Every group this contact currently belongs to: the legacy primary
    /// field plus the multi-membership rows.
    pub fn group_set(&self) -> HashSet<&str> {
        let mut groups: HashSet<&str> =
            self.group_ids.iter().map(String::as_str).collect();
        if let Some(primary) = &self.primary_group_id {
            groups.insert(primary.as_str());
        }
        groups
    }
}

// ---------------------------------------------------------------------------
// AgentCandidate
// ---------------------------------------------------------------------------

/// Read model used by agent assignment: one row per agent in the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCandidate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub experience_years: u32,
    pub active_lead_count: u32,
    pub max_lead_capacity: u32,
}

impl AgentCandidate {
    pub fn has_capacity(&self) -> bool {
        self.active_lead_count < self.max_lead_capacity
    }
}

// ---------------------------------------------------------------------------
// NodeOutcome
// ---------------------------------------------------------------------------

/// Why a run must stop making progress after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspendKind {
    /// An external webhook will deliver the result later.
    Callback,
    /// A reply window is open; elapse of the timer is a valid outcome.
    Timeout,
}

/// Uniform result of dispatching a node's action.
///
/// This is also the record persisted into the run context, so resume logic
/// reads exactly the shape the dispatcher produced.  The inbound-reply and
/// call-result collaborators overwrite fields of this record through the
/// store (see the store crate's webhook operations).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspend: Option<SuspendKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set by the inbound-message collaborator when a reply arrives while
    /// the run is suspended on a reply timeout.
    #[serde(default)]
    pub reply_received: bool,
}

impl NodeOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            suspend: None,
            timeout_minutes: None,
            route_to: None,
            error: None,
            reply_received: false,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::succeeded()
        }
    }

    /// A call was accepted by the provider; the result arrives by webhook.
    pub fn suspend_callback() -> Self {
        Self {
            suspend: Some(SuspendKind::Callback),
            ..Self::succeeded()
        }
    }

    /// A message was sent and a reply window of `timeout_minutes` is open.
    pub fn await_reply(timeout_minutes: i64) -> Self {
        Self {
            suspend: Some(SuspendKind::Timeout),
            timeout_minutes: Some(timeout_minutes),
            ..Self::succeeded()
        }
    }

    /// A switch node resolved (or failed to resolve) a group route.
    pub fn routed(route_to: Option<String>) -> Self {
        Self {
            route_to,
            ..Self::succeeded()
        }
    }
}
