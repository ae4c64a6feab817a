//! Action-level error types.

use thiserror::Error;

/// Failure reported by an external collaborator (telephony, messaging,
/// email, CRM, agent directory).
///
/// The dispatcher never propagates these: they are normalized into
/// `success: false` outcomes and handled through failure-edge branching.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The collaborator received the request and refused it.
    #[error("collaborator rejected the request: {0}")]
    Rejected(String),

    /// The collaborator could not be reached.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Agent assignment could not produce an agent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    /// Every candidate is at capacity.  Reported, never a crash.
    #[error("no_capacity")]
    NoCapacity,
}
