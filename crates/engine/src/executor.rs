//! Run Executor — one step of the workflow state machine.
//!
//! `RunExecutor::step` is invoked by the scheduler for a claimed run:
//! 1. Loads and decodes the graph, resolves the current node.
//! 2. Decides resume-vs-fresh from the run context.
//! 3. On resume, applies call-retry policy or the awaiting-reply check; on
//!    fresh execution, applies time-window gating and dispatches the action.
//! 4. Suspends, reschedules, or resolves the next edge and advances.
//!
//! Every suspension point is persisted — the executor writes the cursor and
//! returns; the next scheduler tick is what resumes the run.

use std::sync::Arc;

use actions::config::NodeAction;
use actions::types::{NodeOutcome, SuspendKind};
use actions::ActionDispatcher;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{info, instrument, warn};

use store::{RunStatus, RunStore, WorkflowRun};

use crate::branch;
use crate::error::EngineError;
use crate::models::{Node, WorkflowGraph};
use crate::retry::{self, RetryDecision};
use crate::window;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// The single operational timezone all window and backoff math uses.
    pub timezone: Tz,
    /// A fresh direct-contact action is only rescheduled when the next
    /// allowed window is further away than this.
    pub reschedule_threshold: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Madrid,
            reschedule_threshold: Duration::seconds(60),
        }
    }
}

// ---------------------------------------------------------------------------
// StepOutcome
// ---------------------------------------------------------------------------

/// What a single step did with the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The cursor moved to the next node.
    Advanced { to: String },
    /// Outside its contact window; pushed to the next allowed instant.
    Rescheduled { until: DateTime<Utc> },
    /// A failed call got another attempt scheduled.
    RetryScheduled { until: DateTime<Utc> },
    /// Suspended on a webhook callback or a reply timeout.
    Suspended { kind: SuspendKind },
    /// No edge matched the outcome; the run is complete.
    Completed,
}

// ---------------------------------------------------------------------------
// RunExecutor
// ---------------------------------------------------------------------------

/// Stateless orchestrator that performs a single step of a claimed run.
pub struct RunExecutor {
    store: Arc<dyn RunStore>,
    dispatcher: Arc<ActionDispatcher>,
    config: ExecutorConfig,
}

impl RunExecutor {
    pub fn new(
        store: Arc<dyn RunStore>,
        dispatcher: Arc<ActionDispatcher>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            config,
        }
    }

    /// Perform one step for a run the caller has already claimed.
    ///
    /// # Errors
    /// Configuration errors (missing workflow or node, undecodable graph,
    /// dead window sets) and store failures.  The caller marks the run
    /// `Failed` for these; collaborator failures never surface here.
    #[instrument(skip(self, run), fields(run_id = %run.id, node_id = %run.current_node_id))]
    pub async fn step(
        &self,
        mut run: WorkflowRun,
        now: DateTime<Utc>,
    ) -> Result<StepOutcome, EngineError> {
        run.status = RunStatus::Running;

        let definition = self.store.workflow_definition(run.workflow_id).await?;
        let graph = WorkflowGraph::from_definition(definition)?;
        let node = graph
            .node(&run.current_node_id)
            .ok_or_else(|| EngineError::MissingNode {
                workflow_id: run.workflow_id,
                node_id: run.current_node_id.clone(),
            })?;

        let outcome = match run.context.nodes.get(&node.id).cloned() {
            Some(prior) => match self.resume(&mut run, node, prior, now).await? {
                Resumption::Outcome(outcome) => outcome,
                Resumption::RetryScheduled { until } => {
                    return Ok(StepOutcome::RetryScheduled { until });
                }
            },
            None => match self.fresh(&mut run, node, now).await? {
                Execution::Outcome(outcome) => outcome,
                Execution::Rescheduled { until } => {
                    return Ok(StepOutcome::Rescheduled { until });
                }
                Execution::Suspended { kind } => {
                    return Ok(StepOutcome::Suspended { kind });
                }
            },
        };

        self.advance(run, &graph, node, outcome, now).await
    }

    // -----------------------------------------------------------------------
    // Resume: the node has a recorded outcome from an earlier tick.
    // -----------------------------------------------------------------------

    async fn resume(
        &self,
        run: &mut WorkflowRun,
        node: &Node,
        prior: NodeOutcome,
        now: DateTime<Utc>,
    ) -> Result<Resumption, EngineError> {
        match (&node.action, prior.suspend) {
            // A call's result was written by the call-result webhook.
            (NodeAction::Call(_), _) => {
                if prior.success {
                    return Ok(Resumption::Outcome(prior));
                }
                self.plan_call_retry(run, node, prior, now).await
            }

            // A message that was awaiting a reply: the reply webhook sets the
            // flag; reaching here without it means the wait timer elapsed.
            (NodeAction::SendMessage(_), Some(SuspendKind::Timeout)) => {
                if prior.reply_received {
                    Ok(Resumption::Outcome(NodeOutcome::succeeded()))
                } else {
                    Ok(Resumption::Outcome(NodeOutcome::failed(
                        "reply window elapsed",
                    )))
                }
            }

            // A node a cyclic graph revisited: reuse the recorded outcome
            // rather than re-running the side effect.
            _ => Ok(Resumption::Outcome(prior)),
        }
    }

    async fn plan_call_retry(
        &self,
        run: &mut WorkflowRun,
        node: &Node,
        prior: NodeOutcome,
        now: DateTime<Utc>,
    ) -> Result<Resumption, EngineError> {
        let Some(policy) = &node.retry else {
            return Ok(Resumption::Outcome(failure_from(prior)));
        };

        let decision = retry::plan_retry(
            policy,
            run.context.retry_count,
            &node.time_windows,
            now,
            self.config.timezone,
        )?;

        match decision {
            RetryDecision::Retry { at, intervention } => {
                if let Some(intervention) = intervention {
                    let contact = self.store.get_contact(&run.contact_id).await?;
                    if let Err(e) = self
                        .dispatcher
                        .run_intervention(&intervention.action, &contact)
                        .await
                    {
                        // The retry itself must not be blocked by a failed
                        // side action.
                        warn!(error = %e, after_attempt = intervention.after_attempt,
                            "intervention failed, retry continues");
                    }
                }

                // Clear the record so the node runs fresh on the next tick.
                run.context.nodes.remove(&node.id);
                run.context.retry_count += 1;
                run.status = RunStatus::Pending;
                run.next_run_at = Some(at);
                self.store.update_run(run).await?;
                info!(until = %at, attempt = run.context.retry_count + 1, "call retry scheduled");
                Ok(Resumption::RetryScheduled { until: at })
            }
            RetryDecision::Exhausted => Ok(Resumption::Outcome(failure_from(prior))),
        }
    }

    // -----------------------------------------------------------------------
    // Fresh execution: first attempt at this node (or first after a retry).
    // -----------------------------------------------------------------------

    async fn fresh(
        &self,
        run: &mut WorkflowRun,
        node: &Node,
        now: DateTime<Utc>,
    ) -> Result<Execution, EngineError> {
        let tz = self.config.timezone;

        // Direct-contact actions respect the node's contact windows unless
        // the config forces immediate sending.
        if !node.time_windows.is_empty()
            && node.action.is_direct_contact()
            && !node.action.forces_immediate()
            && !window::is_allowed(now, &node.time_windows, tz)
        {
            let next = window::next_allowed(now, &node.time_windows, tz)?;
            if next - now > self.config.reschedule_threshold {
                run.status = RunStatus::Pending;
                run.next_run_at = Some(next);
                self.store.update_run(run).await?;
                info!(until = %next, "outside contact window, rescheduled");
                return Ok(Execution::Rescheduled { until: next });
            }
        }

        let contact = self.store.get_contact(&run.contact_id).await?;
        let outcome = self.dispatcher.dispatch(&node.action, &contact).await;

        match outcome.suspend {
            Some(SuspendKind::Callback) => {
                run.status = RunStatus::WaitingForCallback;
                run.next_run_at = None;
                run.context.nodes.insert(node.id.clone(), outcome);
                self.store.update_run(run).await?;
                info!("suspended until call-result webhook");
                Ok(Execution::Suspended {
                    kind: SuspendKind::Callback,
                })
            }
            Some(SuspendKind::Timeout) => {
                let minutes = outcome.timeout_minutes.unwrap_or(0);
                run.status = RunStatus::Waiting;
                run.next_run_at = Some(now + Duration::minutes(minutes));
                run.context.nodes.insert(node.id.clone(), outcome);
                self.store.update_run(run).await?;
                info!(minutes, "suspended for reply window");
                Ok(Execution::Suspended {
                    kind: SuspendKind::Timeout,
                })
            }
            None => Ok(Execution::Outcome(outcome)),
        }
    }

    // -----------------------------------------------------------------------
    // Advance: record the outcome and follow the resolved edge.
    // -----------------------------------------------------------------------

    async fn advance(
        &self,
        mut run: WorkflowRun,
        graph: &WorkflowGraph,
        node: &Node,
        outcome: NodeOutcome,
        now: DateTime<Utc>,
    ) -> Result<StepOutcome, EngineError> {
        match branch::resolve(node, &outcome, &graph.edges) {
            Some(edge) => {
                let target =
                    graph
                        .node(&edge.target_node_id)
                        .ok_or_else(|| EngineError::MissingNode {
                            workflow_id: run.workflow_id,
                            node_id: edge.target_node_id.clone(),
                        })?;

                run.context.nodes.insert(node.id.clone(), outcome);
                run.context.retry_count = 0;
                run.current_node_id = target.id.clone();
                if target.delay_minutes > 0 {
                    run.status = RunStatus::Waiting;
                    run.next_run_at = Some(now + Duration::minutes(target.delay_minutes));
                } else {
                    run.status = RunStatus::Pending;
                    run.next_run_at = None;
                }
                self.store.update_run(&run).await?;
                info!(from = %node.id, to = %target.id, "advanced");
                Ok(StepOutcome::Advanced {
                    to: target.id.clone(),
                })
            }
            None => {
                run.context.nodes.insert(node.id.clone(), outcome);
                run.status = RunStatus::Completed;
                run.next_run_at = None;
                run.completed_at = Some(now);
                self.store.update_run(&run).await?;
                info!("run completed, no edge matched");
                Ok(StepOutcome::Completed)
            }
        }
    }
}

enum Resumption {
    Outcome(NodeOutcome),
    RetryScheduled { until: DateTime<Utc> },
}

enum Execution {
    Outcome(NodeOutcome),
    Rescheduled { until: DateTime<Utc> },
    Suspended { kind: SuspendKind },
}

/// The permanent-failure outcome branch resolution sees after retries are
/// exhausted (or were never configured).
fn failure_from(prior: NodeOutcome) -> NodeOutcome {
    NodeOutcome::failed(
        prior
            .error
            .unwrap_or_else(|| "call failed".to_owned()),
    )
}
