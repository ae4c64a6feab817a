//! Scheduler Loop — the entry point an external periodic trigger invokes.
//!
//! One tick fetches the due runs, claims each with an atomic conditional
//! status update, and steps them independently.  One run's crash never
//! aborts the batch: the error is recorded on that run and the loop moves
//! on.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};
use uuid::Uuid;

use store::{RunStatus, RunStore};

use crate::error::EngineError;
use crate::executor::RunExecutor;

/// How many due runs one tick processes at most.
const DEFAULT_BATCH_LIMIT: usize = 50;

/// Summary of one scheduler tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Due runs fetched from the store.
    pub fetched: usize,
    /// Runs stepped to a new persisted state.
    pub processed: usize,
    /// Runs another scheduler invocation claimed first.
    pub skipped: usize,
    /// Runs marked Failed because their step errored.
    pub failed: usize,
}

pub struct Scheduler {
    store: Arc<dyn RunStore>,
    executor: RunExecutor,
    batch_limit: usize,
}

impl Scheduler {
    pub fn new(store: Arc<dyn RunStore>, executor: RunExecutor) -> Self {
        Self {
            store,
            executor,
            batch_limit: DEFAULT_BATCH_LIMIT,
        }
    }

    pub fn with_batch_limit(mut self, batch_limit: usize) -> Self {
        self.batch_limit = batch_limit;
        self
    }

    /// Process every due run once, in fetch order.
    #[instrument(skip(self))]
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickSummary, EngineError> {
        let due = self.store.due_runs(now, self.batch_limit).await?;
        let mut summary = TickSummary {
            fetched: due.len(),
            ..TickSummary::default()
        };

        for run in due {
            let run_id = run.id;

            // Exactly one of any overlapping scheduler invocations wins the
            // claim; the others leave the run alone.
            if !self.store.claim_run(run_id).await? {
                summary.skipped += 1;
                continue;
            }

            match self.executor.step(run, now).await {
                Ok(outcome) => {
                    info!(run_id = %run_id, ?outcome, "run stepped");
                    summary.processed += 1;
                }
                Err(e) => {
                    error!(run_id = %run_id, error = %e, "run step failed");
                    summary.failed += 1;
                    self.fail_run(run_id, &e.to_string()).await;
                }
            }
        }

        Ok(summary)
    }

    /// Mark a run Failed with the error recorded in its context.  Best
    /// effort: a failure here is logged, the batch continues regardless.
    async fn fail_run(&self, run_id: Uuid, message: &str) {
        match self.store.get_run(run_id).await {
            Ok(mut run) => {
                run.status = RunStatus::Failed;
                run.next_run_at = None;
                run.context.last_error = Some(message.to_owned());
                if let Err(e) = self.store.update_run(&run).await {
                    error!(run_id = %run_id, error = %e, "could not record run failure");
                }
            }
            Err(e) => {
                error!(run_id = %run_id, error = %e, "could not load run to record failure");
            }
        }
    }
}
