//! In-memory `RunStore` backing tests and the CLI simulator.

use std::collections::HashMap;
use std::sync::Mutex;

use actions::types::{Contact, NodeOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{RunStatus, StoredWorkflow, WorkflowRun};
use crate::RunStore;

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    /// Vec keeps creation order, which is the batch processing order.
    runs: Vec<WorkflowRun>,
    workflows: HashMap<Uuid, StoredWorkflow>,
    contacts: HashMap<String, Contact>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_run<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut WorkflowRun) -> T,
    ) -> Result<T, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let run = inner
            .runs
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::RunNotFound(id))?;
        Ok(f(run))
    }
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn insert_run(&self, run: WorkflowRun) -> Result<(), StoreError> {
        self.inner.lock().unwrap().runs.push(run);
        Ok(())
    }

    async fn get_run(&self, id: Uuid) -> Result<WorkflowRun, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .runs
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::RunNotFound(id))
    }

    async fn due_runs(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<WorkflowRun>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .runs
            .iter()
            .filter(|r| r.is_due(now))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn claim_run(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with_run(id, |run| {
            if matches!(run.status, RunStatus::Pending | RunStatus::Waiting) {
                run.status = RunStatus::Running;
                debug!(run_id = %id, "run claimed");
                true
            } else {
                false
            }
        })
    }

    async fn update_run(&self, run: &WorkflowRun) -> Result<(), StoreError> {
        self.with_run(run.id, |stored| *stored = run.clone())
    }

    async fn put_workflow(&self, workflow: StoredWorkflow) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .workflows
            .insert(workflow.id, workflow);
        Ok(())
    }

    async fn workflow_definition(&self, id: Uuid) -> Result<serde_json::Value, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .workflows
            .get(&id)
            .map(|w| w.definition.clone())
            .ok_or(StoreError::WorkflowNotFound(id))
    }

    async fn upsert_contact(&self, contact: Contact) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .contacts
            .insert(contact.id.clone(), contact);
        Ok(())
    }

    async fn get_contact(&self, id: &str) -> Result<Contact, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .contacts
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ContactNotFound(id.to_owned()))
    }

    async fn record_reply(&self, run_id: Uuid, node_id: &str) -> Result<(), StoreError> {
        self.with_run(run_id, |run| {
            let outcome = run
                .context
                .nodes
                .get_mut(node_id)
                .ok_or_else(|| StoreError::NoRecordedOutcome {
                    run_id,
                    node_id: node_id.to_owned(),
                })?;
            outcome.reply_received = true;
            if run.status == RunStatus::Waiting {
                run.status = RunStatus::Pending;
                run.next_run_at = None;
            }
            Ok(())
        })?
    }

    async fn record_call_result(
        &self,
        run_id: Uuid,
        node_id: &str,
        success: bool,
    ) -> Result<(), StoreError> {
        self.with_run(run_id, |run| {
            let mut outcome = NodeOutcome::succeeded();
            outcome.success = success;
            if !success {
                outcome.error = Some("call did not connect".to_owned());
            }
            run.context.nodes.insert(node_id.to_owned(), outcome);
            if run.status == RunStatus::WaitingForCallback {
                run.status = RunStatus::Pending;
                run.next_run_at = None;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actions::types::SuspendKind;
    use chrono::Duration;

    async fn seeded_run(store: &MemoryStore) -> WorkflowRun {
        let run = WorkflowRun::activate(Uuid::new_v4(), "c1", "entry");
        store.insert_run(run.clone()).await.unwrap();
        run
    }

    #[tokio::test]
    async fn claim_succeeds_exactly_once() {
        let store = MemoryStore::new();
        let run = WorkflowRun::activate(Uuid::new_v4(), "c1", "entry");
        store.insert_run(run.clone()).await.unwrap();

        assert!(store.claim_run(run.id).await.unwrap());
        assert!(!store.claim_run(run.id).await.unwrap());
        assert_eq!(
            store.get_run(run.id).await.unwrap().status,
            RunStatus::Running
        );
    }

    #[tokio::test]
    async fn due_runs_respects_timer_and_order() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let due = WorkflowRun::activate(Uuid::new_v4(), "c1", "entry");
        let mut later = WorkflowRun::activate(Uuid::new_v4(), "c2", "entry");
        later.next_run_at = Some(now + Duration::hours(1));
        store.insert_run(due.clone()).await.unwrap();
        store.insert_run(later).await.unwrap();

        let fetched = store.due_runs(now, 10).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].id, due.id);
    }

    #[tokio::test]
    async fn record_reply_flips_waiting_to_pending() {
        let store = MemoryStore::new();
        let mut run = seeded_run(&store).await;
        run.status = RunStatus::Waiting;
        run.next_run_at = Some(Utc::now() + Duration::minutes(60));
        run.context
            .nodes
            .insert("entry".into(), NodeOutcome::await_reply(60));
        store.update_run(&run).await.unwrap();

        store.record_reply(run.id, "entry").await.unwrap();

        let updated = store.get_run(run.id).await.unwrap();
        assert_eq!(updated.status, RunStatus::Pending);
        assert!(updated.next_run_at.is_none());
        let outcome = &updated.context.nodes["entry"];
        assert!(outcome.reply_received);
        assert_eq!(outcome.suspend, Some(SuspendKind::Timeout));
    }

    #[tokio::test]
    async fn record_reply_without_outcome_is_an_error() {
        let store = MemoryStore::new();
        let run = seeded_run(&store).await;
        assert!(matches!(
            store.record_reply(run.id, "ghost").await,
            Err(StoreError::NoRecordedOutcome { .. })
        ));
    }

    #[tokio::test]
    async fn record_call_result_overwrites_outcome_and_resumes() {
        let store = MemoryStore::new();
        let mut run = seeded_run(&store).await;
        run.status = RunStatus::WaitingForCallback;
        run.context
            .nodes
            .insert("entry".into(), NodeOutcome::suspend_callback());
        store.update_run(&run).await.unwrap();

        store.record_call_result(run.id, "entry", false).await.unwrap();

        let updated = store.get_run(run.id).await.unwrap();
        assert_eq!(updated.status, RunStatus::Pending);
        let outcome = &updated.context.nodes["entry"];
        assert!(!outcome.success);
        assert!(outcome.suspend.is_none());
    }
}
