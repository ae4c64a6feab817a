//! The action dispatcher: a total mapping from action kind to handler.
//!
//! Every handler result — including collaborator failures — is normalized
//! into the uniform [`NodeOutcome`] shape.  A collaborator error becomes a
//! `success: false` outcome with the message recorded; it is never an
//! exception the executor has to special-case.

use std::sync::Arc;

use tracing::warn;

use crate::assignment::select_agent;
use crate::config::{InterventionAction, NodeAction};
use crate::error::CollaboratorError;
use crate::routing::route_by_group;
use crate::traits::{
    AgentDirectory, AgentMatcher, CrmService, EmailService, MessagingService, TaskService,
    VoiceCallService,
};
use crate::types::{Contact, NodeOutcome};

pub struct ActionDispatcher {
    voice: Arc<dyn VoiceCallService>,
    messaging: Arc<dyn MessagingService>,
    email: Arc<dyn EmailService>,
    tasks: Arc<dyn TaskService>,
    crm: Arc<dyn CrmService>,
    agents: Arc<dyn AgentDirectory>,
    matcher: Option<Arc<dyn AgentMatcher>>,
}

impl ActionDispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        voice: Arc<dyn VoiceCallService>,
        messaging: Arc<dyn MessagingService>,
        email: Arc<dyn EmailService>,
        tasks: Arc<dyn TaskService>,
        crm: Arc<dyn CrmService>,
        agents: Arc<dyn AgentDirectory>,
        matcher: Option<Arc<dyn AgentMatcher>>,
    ) -> Self {
        Self {
            voice,
            messaging,
            email,
            tasks,
            crm,
            agents,
            matcher,
        }
    }

    /// Execute a node's action against the collaborators and normalize the
    /// result.
    pub async fn dispatch(&self, action: &NodeAction, contact: &Contact) -> NodeOutcome {
        match action {
            NodeAction::Call(cfg) => match self.voice.place_call(contact, cfg).await {
                // Accepted: the call result arrives later via webhook.
                Ok(()) => NodeOutcome::suspend_callback(),
                Err(e) => NodeOutcome::failed(e.to_string()),
            },

            NodeAction::SendMessage(cfg) => {
                match self.messaging.send_message(contact, cfg).await {
                    Ok(()) => match cfg.reply_timeout_minutes {
                        Some(timeout) if timeout > 0 => NodeOutcome::await_reply(timeout),
                        _ => NodeOutcome::succeeded(),
                    },
                    Err(e) => NodeOutcome::failed(e.to_string()),
                }
            }

            NodeAction::SendEmail(cfg) => {
                sync_outcome(self.email.send_email(contact, cfg).await)
            }

            NodeAction::Wait => NodeOutcome::succeeded(),

            NodeAction::CreateTask(cfg) => {
                sync_outcome(self.tasks.create_task(contact, cfg).await)
            }

            NodeAction::RouteByGroup(cfg) => {
                NodeOutcome::routed(route_by_group(contact, &cfg.outputs))
            }

            NodeAction::AssignAgent(cfg) => {
                let candidates = match self.agents.candidates().await {
                    Ok(candidates) => candidates,
                    Err(e) => return NodeOutcome::failed(e.to_string()),
                };
                let selected = select_agent(
                    cfg.strategy,
                    cfg.agent_id.as_deref(),
                    &candidates,
                    contact,
                    self.matcher.as_deref(),
                )
                .await;
                match selected {
                    Ok(agent) => {
                        sync_outcome(self.agents.assign(&agent.id, contact).await)
                    }
                    Err(e) => NodeOutcome::failed(e.to_string()),
                }
            }

            NodeAction::MarkLost(cfg) => {
                sync_outcome(self.crm.mark_lost(contact, cfg).await)
            }

            NodeAction::StartNurture(cfg) => {
                sync_outcome(self.crm.start_nurture(contact, cfg).await)
            }

            NodeAction::Unknown(kind) => {
                // Forward compatibility: an action this build does not know
                // passes through instead of deadlocking the run.
                warn!(action = %kind, "unknown action kind, passing through");
                NodeOutcome::succeeded()
            }
        }
    }

    /// Run a one-shot retry intervention.  Callers log failures and carry
    /// on; an intervention must never block the retry it accompanies.
    pub async fn run_intervention(
        &self,
        intervention: &InterventionAction,
        contact: &Contact,
    ) -> Result<(), CollaboratorError> {
        match intervention {
            InterventionAction::SendEmail(cfg) => self.email.send_email(contact, cfg).await,
            InterventionAction::SendMessage(cfg) => {
                self.messaging.send_message(contact, cfg).await
            }
            InterventionAction::UpdateContact(cfg) => {
                self.crm.update_contact(contact, cfg).await
            }
        }
    }
}

fn sync_outcome(result: Result<(), CollaboratorError>) -> NodeOutcome {
    match result {
        Ok(()) => NodeOutcome::succeeded(),
        Err(e) => NodeOutcome::failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AssignConfig, AssignStrategy, CallConfig, MessageConfig, RouteConfig,
    };
    use crate::mock::{MockBehaviour, MockHub};
    use crate::types::{AgentCandidate, SuspendKind};

    fn contact() -> Contact {
        Contact {
            id: "c1".into(),
            name: "Rita".into(),
            phone: Some("+34600000000".into()),
            email: None,
            language: None,
            primary_group_id: None,
            group_ids: vec!["buyers".into()],
        }
    }

    fn agent(id: &str, load: u32) -> AgentCandidate {
        AgentCandidate {
            id: id.into(),
            name: id.into(),
            languages: vec![],
            experience_years: 1,
            active_lead_count: load,
            max_lead_capacity: 10,
        }
    }

    #[tokio::test]
    async fn accepted_call_suspends_for_callback() {
        let hub = Arc::new(MockHub::succeeding());
        let outcome = hub
            .dispatcher()
            .dispatch(&NodeAction::Call(CallConfig::default()), &contact())
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.suspend, Some(SuspendKind::Callback));
        assert_eq!(hub.call_log(), vec!["call:c1"]);
    }

    #[tokio::test]
    async fn rejected_call_is_a_failure_outcome_not_an_error() {
        let mut hub = MockHub::succeeding();
        hub.voice = MockBehaviour::Fail("provider down".into());
        let hub = Arc::new(hub);
        let outcome = hub
            .dispatcher()
            .dispatch(&NodeAction::Call(CallConfig::default()), &contact())
            .await;
        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("provider down"));
    }

    #[tokio::test]
    async fn message_with_reply_timeout_suspends() {
        let hub = Arc::new(MockHub::succeeding());
        let cfg = MessageConfig {
            reply_timeout_minutes: Some(60),
            ..Default::default()
        };
        let outcome = hub
            .dispatcher()
            .dispatch(&NodeAction::SendMessage(cfg), &contact())
            .await;
        assert_eq!(outcome.suspend, Some(SuspendKind::Timeout));
        assert_eq!(outcome.timeout_minutes, Some(60));
    }

    #[tokio::test]
    async fn message_without_timeout_reports_send_result() {
        let hub = Arc::new(MockHub::succeeding());
        let outcome = hub
            .dispatcher()
            .dispatch(
                &NodeAction::SendMessage(MessageConfig::default()),
                &contact(),
            )
            .await;
        assert!(outcome.success);
        assert!(outcome.suspend.is_none());
    }

    #[tokio::test]
    async fn switch_node_always_succeeds_with_a_route() {
        let hub = Arc::new(MockHub::succeeding());
        let cfg = RouteConfig {
            outputs: vec!["buyers".into(), "default".into()],
        };
        let outcome = hub
            .dispatcher()
            .dispatch(&NodeAction::RouteByGroup(cfg), &contact())
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.route_to.as_deref(), Some("buyers"));
    }

    #[tokio::test]
    async fn assignment_records_the_directory_write() {
        let mut hub = MockHub::succeeding();
        hub.agents = vec![agent("a", 5), agent("b", 2)];
        let hub = Arc::new(hub);
        let cfg = AssignConfig {
            strategy: AssignStrategy::LeastLoaded,
            agent_id: None,
        };
        let outcome = hub
            .dispatcher()
            .dispatch(&NodeAction::AssignAgent(cfg), &contact())
            .await;
        assert!(outcome.success);
        assert_eq!(hub.call_log(), vec!["assign:b:c1"]);
    }

    #[tokio::test]
    async fn assignment_without_capacity_fails_with_no_capacity() {
        let mut hub = MockHub::succeeding();
        hub.agents = vec![AgentCandidate {
            active_lead_count: 10,
            max_lead_capacity: 10,
            ..agent("full", 10)
        }];
        let hub = Arc::new(hub);
        let outcome = hub
            .dispatcher()
            .dispatch(
                &NodeAction::AssignAgent(AssignConfig::default()),
                &contact(),
            )
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("no_capacity"));
    }

    #[tokio::test]
    async fn unknown_action_is_a_no_op_success() {
        let hub = Arc::new(MockHub::succeeding());
        let outcome = hub
            .dispatcher()
            .dispatch(&NodeAction::Unknown("teleport".into()), &contact())
            .await;
        assert!(outcome.success);
        assert!(hub.call_log().is_empty());
    }
}
