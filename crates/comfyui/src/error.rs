//! Error types for graph construction, model selection, and execution.
//!
//! Construction and selection errors are raised to the caller; runtime
//! execution failures are embedded in
//! [`crate::result::GenerationResult`] instead of raised, so that the
//! dashboard always has a displayable outcome.

use serde::Serialize;

use crate::graph::NodeId;

/// Errors from building or validating a workflow graph.
///
/// These indicate a malformed request or a bug in graph assembly and
/// are raised immediately.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Width/height violate the diffusion backend constraint.
    #[error("Invalid dimensions {width}x{height}: width and height must be positive multiples of 64")]
    InvalidDimensions { width: u32, height: u32 },

    /// The request failed a non-dimension validation check.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No preprocessor mapping exists for the ControlNet type.
    #[error("Unsupported ControlNet type '{0}'")]
    UnsupportedControlNetType(String),

    /// An operation referenced a node id not present in the graph.
    #[error("Node {0} does not exist in the graph")]
    UnknownNode(NodeId),

    /// A node input links to a node id not present in the graph.
    #[error("Node {from} input '{input}' links to missing node {to}")]
    DanglingLink {
        from: NodeId,
        input: String,
        to: NodeId,
    },

    /// The graph contains a dependency cycle.
    #[error("Workflow graph contains a cycle through node {0}")]
    CycleDetected(NodeId),

    /// The graph has no terminal save node.
    #[error("Workflow graph has no terminal save node")]
    NoSaveNode,

    /// The graph has more than one terminal save node.
    #[error("Workflow graph has {0} terminal save nodes, expected exactly 1")]
    MultipleSaveNodes(usize),
}

/// The model catalog is empty; no checkpoint can be selected.
///
/// Raised instead of guessing a filename: a guessed checkpoint fails
/// on the backend with a far less useful error.
#[derive(Debug, thiserror::Error)]
#[error("No checkpoint models available on the backend")]
pub struct NoModelAvailable;

/// Runtime failure modes of a generation attempt.
///
/// Carried inside [`crate::result::GenerationResult::error`] rather
/// than raised: generation is long-running and user-facing, and every
/// attempt must resolve to something the dashboard can display.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationFailure {
    /// The `/prompt` submission was rejected or never reached the
    /// backend. Not retried: submission failures are almost always
    /// payload errors rather than transient conditions.
    #[error("Workflow submission rejected{}: {detail}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    SubmissionRejected {
        /// HTTP status, when the backend responded at all.
        status: Option<u16>,
        detail: String,
    },

    /// The polling budget elapsed before the job produced output.
    #[error("Generation timed out after {elapsed_secs}s")]
    TimedOut { elapsed_secs: u64 },

    /// The backend reported the job itself as failed.
    #[error("Remote execution failed: {message}")]
    RemoteJobFailed { message: String },

    /// The caller cancelled the in-flight generation.
    #[error("Generation cancelled before completion")]
    Cancelled,
}
