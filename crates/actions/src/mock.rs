//! `MockHub` — one test double standing in for every collaborator.
//!
//! Useful in unit and integration tests where real providers are either
//! unavailable or irrelevant.  Each invocation is recorded so tests can
//! assert on the call log.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::{
    CallConfig, EmailConfig, MarkLostConfig, MessageConfig, NurtureConfig, TaskConfig,
    UpdateContactConfig,
};
use crate::dispatcher::ActionDispatcher;
use crate::error::CollaboratorError;
use crate::traits::{
    AgentDirectory, AgentMatcher, CrmService, EmailService, MessagingService, TaskService,
    VoiceCallService,
};
use crate::types::{AgentCandidate, Contact};

/// Scripted behaviour for one collaborator.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    Succeed,
    Fail(String),
}

impl MockBehaviour {
    fn apply(&self) -> Result<(), CollaboratorError> {
        match self {
            Self::Succeed => Ok(()),
            Self::Fail(msg) => Err(CollaboratorError::Rejected(msg.clone())),
        }
    }
}

pub struct MockHub {
    pub voice: MockBehaviour,
    pub messaging: MockBehaviour,
    pub email: MockBehaviour,
    pub tasks: MockBehaviour,
    pub crm: MockBehaviour,
    /// What the agent directory returns.
    pub agents: Vec<AgentCandidate>,
    /// Scores the heuristic matcher returns; `None` makes the matcher fail.
    pub matcher_scores: Option<Vec<f64>>,
    /// Every collaborator invocation, in call order.
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockHub {
    /// A hub where every collaborator succeeds.
    pub fn succeeding() -> Self {
        Self {
            voice: MockBehaviour::Succeed,
            messaging: MockBehaviour::Succeed,
            email: MockBehaviour::Succeed,
            tasks: MockBehaviour::Succeed,
            crm: MockBehaviour::Succeed,
            agents: Vec::new(),
            matcher_scores: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A dispatcher wired entirely to this hub.
    pub fn dispatcher(self: &Arc<Self>) -> ActionDispatcher {
        ActionDispatcher::new(
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            Some(self.clone()),
        )
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, entry: impl Into<String>) {
        self.calls.lock().unwrap().push(entry.into());
    }
}

#[async_trait]
impl VoiceCallService for MockHub {
    async fn place_call(
        &self,
        contact: &Contact,
        _config: &CallConfig,
    ) -> Result<(), CollaboratorError> {
        self.record(format!("call:{}", contact.id));
        self.voice.apply()
    }
}

#[async_trait]
impl MessagingService for MockHub {
    async fn send_message(
        &self,
        contact: &Contact,
        _config: &MessageConfig,
    ) -> Result<(), CollaboratorError> {
        self.record(format!("message:{}", contact.id));
        self.messaging.apply()
    }
}

#[async_trait]
impl EmailService for MockHub {
    async fn send_email(
        &self,
        contact: &Contact,
        _config: &EmailConfig,
    ) -> Result<(), CollaboratorError> {
        self.record(format!("email:{}", contact.id));
        self.email.apply()
    }
}

#[async_trait]
impl TaskService for MockHub {
    async fn create_task(
        &self,
        contact: &Contact,
        _config: &TaskConfig,
    ) -> Result<(), CollaboratorError> {
        self.record(format!("task:{}", contact.id));
        self.tasks.apply()
    }
}

#[async_trait]
impl CrmService for MockHub {
    async fn mark_lost(
        &self,
        contact: &Contact,
        _config: &MarkLostConfig,
    ) -> Result<(), CollaboratorError> {
        self.record(format!("mark_lost:{}", contact.id));
        self.crm.apply()
    }

    async fn update_contact(
        &self,
        contact: &Contact,
        _config: &UpdateContactConfig,
    ) -> Result<(), CollaboratorError> {
        self.record(format!("update_contact:{}", contact.id));
        self.crm.apply()
    }

    async fn start_nurture(
        &self,
        contact: &Contact,
        _config: &NurtureConfig,
    ) -> Result<(), CollaboratorError> {
        self.record(format!("start_nurture:{}", contact.id));
        self.crm.apply()
    }
}

#[async_trait]
impl AgentDirectory for MockHub {
    async fn candidates(&self) -> Result<Vec<AgentCandidate>, CollaboratorError> {
        Ok(self.agents.clone())
    }

    async fn assign(
        &self,
        agent_id: &str,
        contact: &Contact,
    ) -> Result<(), CollaboratorError> {
        self.record(format!("assign:{}:{}", agent_id, contact.id));
        Ok(())
    }
}

#[async_trait]
impl AgentMatcher for MockHub {
    async fn score(
        &self,
        _contact: &Contact,
        _candidates: &[AgentCandidate],
    ) -> Result<Vec<f64>, CollaboratorError> {
        match &self.matcher_scores {
            Some(scores) => Ok(scores.clone()),
            None => Err(CollaboratorError::Unavailable("matcher offline".into())),
        }
    }
}
