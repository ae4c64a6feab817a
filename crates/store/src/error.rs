//! Typed error type for the store crate.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("workflow run {0} not found")]
    RunNotFound(Uuid),

    #[error("workflow {0} not found")]
    WorkflowNotFound(Uuid),

    #[error("contact '{0}' not found")]
    ContactNotFound(String),

    #[error("node '{node_id}' has no recorded outcome on run {run_id}")]
    NoRecordedOutcome { run_id: Uuid, node_id: String },
}
