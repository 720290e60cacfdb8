use thiserror::Error;

use crate::ForeignHandle;

/// Errors reported across the foreign runtime boundary
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuntimeError {
    /// The foreign runtime could not be reached at all
    #[error("Foreign runtime unavailable: {reason}")]
    Unavailable { reason: String },

    /// A named call against a foreign object failed on the foreign side
    #[error("Invocation of {operation} on {handle} failed: {reason}")]
    InvocationFailed {
        handle: ForeignHandle,
        operation: &'static str,
        reason: String,
    },

    /// The handle no longer refers to a live foreign object
    #[error("Foreign handle {handle} is stale")]
    StaleHandle { handle: ForeignHandle },

    /// The capability probe found operations the runtime does not expose
    #[error("Foreign runtime is missing {} operation(s): {}", .missing.len(), .missing.join(", "))]
    MissingOperations { missing: Vec<String> },

    /// The authority thread is gone and can no longer accept work
    #[error("Authority thread is no longer accepting work")]
    SchedulerClosed,
}
