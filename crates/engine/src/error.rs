//! Engine-level error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the engine (graph validation + run execution).
///
/// Execution-side errors are configuration errors in the taxonomy of this
/// system: the scheduler marks the affected run `Failed` and moves on, it
/// never retries them.  Transient collaborator failures are *not* errors —
/// they surface as `success: false` outcomes and branch normally.
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Validation errors ------

    /// Two or more nodes share the same ID.
    #[error("duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    /// An edge references a node ID that doesn't exist in the graph.
    #[error("edge references unknown node '{node_id}' ({side} side)")]
    UnknownNodeReference {
        node_id: String,
        side: &'static str,
    },

    /// A node has two outgoing edges with the same handle, so branch
    /// resolution would be ambiguous.
    #[error("node '{node_id}' has more than one outgoing edge for handle {handle:?}")]
    AmbiguousHandle {
        node_id: String,
        handle: Option<String>,
    },

    /// A time window ends before it starts (windows never span midnight).
    #[error("node '{node_id}' declares a time window ending before it starts")]
    InvalidTimeWindow { node_id: String },

    /// A retry policy that can never attempt anything.
    #[error("node '{node_id}' declares a retry policy with maxAttempts = 0")]
    InvalidRetryPolicy { node_id: String },

    /// Every node has an inbound edge, so no run could ever start.
    #[error("workflow graph has no entry node")]
    NoEntryNode,

    /// The definition JSON does not have the `{nodes, edges}` shape.
    #[error("invalid workflow definition: {0}")]
    InvalidDefinition(#[source] serde_json::Error),

    /// A node's config payload does not decode for its action kind.
    #[error("invalid config for node '{node_id}': {source}")]
    InvalidNodeConfig {
        node_id: String,
        #[source]
        source: serde_json::Error,
    },

    // ------ Execution errors ------

    /// The run's cursor points at a node the graph no longer has.  Fatal,
    /// not retried.
    #[error("node '{node_id}' not found in workflow {workflow_id}")]
    MissingNode {
        workflow_id: Uuid,
        node_id: String,
    },

    /// A non-empty window set produced no allowed instant within the scan
    /// horizon.  Fatal configuration error.
    #[error("no upcoming time window within {0} days")]
    NoUpcomingWindow(i64),

    /// Persistence error from the store.
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}
