//! Row structs for the persisted workflow-run state.
//!
//! These are *persistence* models — no scheduling or branching behaviour
//! lives here.  The fields are the durable contract other subsystems
//! (webhooks, the graph editor, reporting) read and write.

use std::collections::HashMap;

use actions::types::NodeOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunStatus
// ---------------------------------------------------------------------------

/// Possible statuses for a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Waiting,
    WaitingForCallback,
    Completed,
    Failed,
}

impl RunStatus {
    /// Terminal runs are never selected by the scheduler again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Waiting => write!(f, "waiting"),
            Self::WaitingForCallback => write!(f, "waiting_for_callback"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "waiting" => Ok(Self::Waiting),
            "waiting_for_callback" => Ok(Self::WaitingForCallback),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// RunContext
// ---------------------------------------------------------------------------

/// Per-run execution context.
///
/// `nodes` keeps one outcome record per attempted node id; a present record
/// is what makes the executor treat a node as "resuming".  A record is only
/// ever removed when a retry is scheduled for that same node.  The values
/// are the closed [`NodeOutcome`] type, never free-form JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunContext {
    pub nodes: HashMap<String, NodeOutcome>,
    /// Retries already scheduled for the node currently being retried.
    pub retry_count: u32,
    /// Message of the error that moved the run to `Failed`, if any.
    pub last_error: Option<String>,
}

// ---------------------------------------------------------------------------
// WorkflowRun
// ---------------------------------------------------------------------------

/// The mutable execution cursor: one per (workflow, contact) activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub contact_id: String,
    pub current_node_id: String,
    pub status: RunStatus,
    pub next_run_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub context: RunContext,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowRun {
    /// The Pending cursor the trigger layer persists when a workflow fires
    /// for a contact.
    pub fn activate(
        workflow_id: Uuid,
        contact_id: impl Into<String>,
        entry_node_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            contact_id: contact_id.into(),
            current_node_id: entry_node_id.into(),
            status: RunStatus::Pending,
            next_run_at: None,
            context: RunContext::default(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Eligible for the scheduler: resumable status and `next_run_at` unset
    /// or in the past.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, RunStatus::Pending | RunStatus::Waiting)
            && self.next_run_at.map_or(true, |at| at <= now)
    }
}

// ---------------------------------------------------------------------------
// StoredWorkflow
// ---------------------------------------------------------------------------

/// A stored workflow definition, kept verbatim as the editor produced it.
/// The engine decodes `definition` once per step; unknown fields survive
/// round trips untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredWorkflow {
    pub id: Uuid,
    pub name: String,
    pub definition: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl StoredWorkflow {
    pub fn new(name: impl Into<String>, definition: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            definition,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            RunStatus::Pending,
            RunStatus::Running,
            RunStatus::Waiting,
            RunStatus::WaitingForCallback,
            RunStatus::Completed,
            RunStatus::Failed,
        ] {
            let parsed: RunStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("paused".parse::<RunStatus>().is_err());
    }

    #[test]
    fn due_requires_resumable_status_and_elapsed_timer() {
        let now = Utc::now();
        let mut run = WorkflowRun::activate(Uuid::new_v4(), "c1", "entry");
        assert!(run.is_due(now));

        run.next_run_at = Some(now + Duration::minutes(5));
        assert!(!run.is_due(now));

        run.next_run_at = Some(now - Duration::minutes(5));
        assert!(run.is_due(now));

        run.status = RunStatus::WaitingForCallback;
        assert!(!run.is_due(now));

        run.status = RunStatus::Completed;
        assert!(!run.is_due(now));
    }
}
