//! `actions` crate — the action vocabulary and its side-effecting handlers.
//!
//! Everything a workflow node can *do* lives here: the typed per-action
//! config payloads, the collaborator traits the engine invokes through
//! narrow interfaces (telephony, messaging, email, tasks, CRM, agent
//! directory), the dispatcher that normalizes every handler result into the
//! uniform [`NodeOutcome`] shape, group-based switch routing, and agent
//! assignment.

pub mod assignment;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod mock;
pub mod routing;
pub mod traits;
pub mod types;

pub use config::NodeAction;
pub use dispatcher::ActionDispatcher;
pub use error::{AssignmentError, CollaboratorError};
pub use types::{AgentCandidate, Contact, NodeOutcome, SuspendKind};
