//! `store` crate — persistence seam for workflow runs.
//!
//! The engine only talks to the [`RunStore`] trait; what sits behind it
//! (Postgres, a vendor database API, the in-memory store used by tests and
//! the simulator) is a deployment concern.  No business logic lives here.

pub mod error;
pub mod memory;
pub mod models;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::{RunContext, RunStatus, StoredWorkflow, WorkflowRun};

use actions::types::Contact;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Persistence contract the engine runs against.
///
/// The run row is the only shared mutable resource the engine touches;
/// every method is a single bounded operation so overlapping scheduler
/// invocations interleave safely around [`RunStore::claim_run`].
#[async_trait]
pub trait RunStore: Send + Sync {
    // ------ runs ------

    async fn insert_run(&self, run: WorkflowRun) -> Result<(), StoreError>;

    async fn get_run(&self, id: Uuid) -> Result<WorkflowRun, StoreError>;

    /// Runs eligible for processing at `now`, in creation order.
    async fn due_runs(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<WorkflowRun>, StoreError>;

    /// Atomically move a run from Pending/Waiting to Running.  Exactly one
    /// of any number of concurrent callers gets `true`; everyone else must
    /// leave the run alone this tick.
    async fn claim_run(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn update_run(&self, run: &WorkflowRun) -> Result<(), StoreError>;

    // ------ workflow definitions ------

    async fn put_workflow(&self, workflow: StoredWorkflow) -> Result<(), StoreError>;

    /// The editor-produced JSON definition, verbatim.
    async fn workflow_definition(&self, id: Uuid) -> Result<serde_json::Value, StoreError>;

    // ------ contacts ------

    async fn upsert_contact(&self, contact: Contact) -> Result<(), StoreError>;

    async fn get_contact(&self, id: &str) -> Result<Contact, StoreError>;

    // ------ webhook write contract ------

    /// Inbound-reply collaborator: mark the node's recorded outcome as
    /// replied and flip the run from Waiting to Pending for early resume.
    async fn record_reply(&self, run_id: Uuid, node_id: &str) -> Result<(), StoreError>;

    /// Inbound call-result collaborator: overwrite the node's recorded
    /// outcome with the call result and flip the run from
    /// WaitingForCallback to Pending.
    async fn record_call_result(
        &self,
        run_id: Uuid,
        node_id: &str,
        success: bool,
    ) -> Result<(), StoreError>;
}
