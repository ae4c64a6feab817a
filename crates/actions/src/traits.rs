//! Collaborator traits — the narrow interfaces behind which every concrete
//! vendor integration lives.
//!
//! The engine only ever sees these contracts; transport (HTTP, queue, SDK)
//! is a deployment concern.  All collaborators are invoked with the contact
//! and the node's typed config, and signal failure with
//! [`CollaboratorError`].

use async_trait::async_trait;

use crate::config::{
    CallConfig, EmailConfig, MarkLostConfig, MessageConfig, NurtureConfig, TaskConfig,
    UpdateContactConfig,
};
use crate::error::CollaboratorError;
use crate::types::{AgentCandidate, Contact};

/// Voice-call provider.
#[async_trait]
pub trait VoiceCallService: Send + Sync {
    /// Ask the provider to place a call.  `Ok(())` means the call was
    /// accepted; its outcome arrives asynchronously through a webhook.
    async fn place_call(
        &self,
        contact: &Contact,
        config: &CallConfig,
    ) -> Result<(), CollaboratorError>;
}

/// WhatsApp/SMS provider.
#[async_trait]
pub trait MessagingService: Send + Sync {
    async fn send_message(
        &self,
        contact: &Contact,
        config: &MessageConfig,
    ) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_email(
        &self,
        contact: &Contact,
        config: &EmailConfig,
    ) -> Result<(), CollaboratorError>;
}

/// Task/reminder creation for human agents.
#[async_trait]
pub trait TaskService: Send + Sync {
    async fn create_task(
        &self,
        contact: &Contact,
        config: &TaskConfig,
    ) -> Result<(), CollaboratorError>;
}

/// CRM record writes.
#[async_trait]
pub trait CrmService: Send + Sync {
    async fn mark_lost(
        &self,
        contact: &Contact,
        config: &MarkLostConfig,
    ) -> Result<(), CollaboratorError>;

    async fn update_contact(
        &self,
        contact: &Contact,
        config: &UpdateContactConfig,
    ) -> Result<(), CollaboratorError>;

    /// Enrol the contact in a long-term nurture sequence.
    async fn start_nurture(
        &self,
        contact: &Contact,
        config: &NurtureConfig,
    ) -> Result<(), CollaboratorError>;
}

/// Agent directory: who can take leads, and the assignment write.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    /// Agents able to take leads, in directory enumeration order.  The
    /// order is the stable tie-break for least-loaded selection.
    async fn candidates(&self) -> Result<Vec<AgentCandidate>, CollaboratorError>;

    async fn assign(&self, agent_id: &str, contact: &Contact)
        -> Result<(), CollaboratorError>;
}

/// External matching collaborator for the heuristic assignment strategy.
#[async_trait]
pub trait AgentMatcher: Send + Sync {
    /// Score each candidate against the contact, higher is better.  Must
    /// return one score per candidate, in candidate order.
    async fn score(
        &self,
        contact: &Contact,
        candidates: &[AgentCandidate],
    ) -> Result<Vec<f64>, CollaboratorError>;
}
