use thiserror::Error;

use crate::{Domain, EntityId, EntityKind, ForeignHandle};

/// Errors that can occur while managing or reconciling proxy collections
///
/// Per-entity problems found during a reconciliation pass are logged and
/// absorbed; only whole-pass failures and misuse of a manager surface here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManagerError {
    /// `load` was called on a manager that already holds loaded entries
    #[error("Manager for {domain} is already loaded; clear it before loading again")]
    AlreadyLoaded { domain: Domain },

    /// The foreign runtime could not be reached; prior state is untouched
    #[error("Reconciliation of {domain} unavailable: {reason}")]
    ReconciliationUnavailable { domain: Domain, reason: String },

    /// A handle is claimed by two different proxies
    #[error("Identity mismatch on {handle}: bound to entity {bound}, claimed by entity {claimed}")]
    IdentityMismatch {
        handle: ForeignHandle,
        bound: EntityId,
        claimed: EntityId,
    },

    /// No manager is registered for the requested kind
    #[error("No manager is registered for {kind:?}")]
    UnroutableKind { kind: EntityKind },

    /// The entity is not held by this manager
    #[error("Entity {entity_id} is not managed for {domain}")]
    EntityNotFound { domain: Domain, entity_id: EntityId },
}
