use std::sync::Arc;

use crate::{
    Domain, EntityKind, ForeignHandle, ObjectDefinition, OperationId, PropertyValue, RuntimeError,
};

/// Capability interface onto the foreign runtime.
///
/// Every method touches foreign state, so callers must only use it from the
/// authority thread (see [`AuthorityScheduler`]). Implementations are free to
/// locate symbols however they like; the core only ever sees handles,
/// definitions and operation ids.
pub trait ForeignRuntime {
    /// Returns the live objects of `domain`. Duplicates are ignored by callers.
    fn snapshot_handles(&self, domain: &Domain) -> Result<Vec<ForeignHandle>, RuntimeError>;

    /// Returns the current definition of `handle`, or `None` if the handle is stale.
    fn read_definition(&self, handle: &ForeignHandle) -> Option<ObjectDefinition>;

    /// Performs one named call against a foreign object.
    fn invoke(
        &self,
        handle: &ForeignHandle,
        operation: &OperationId,
        args: &[PropertyValue],
    ) -> Result<Option<PropertyValue>, RuntimeError>;

    /// Pushes a change of `handle` out to the foreign runtime's network peers.
    fn broadcast(
        &self,
        handle: &ForeignHandle,
        operation: &OperationId,
        args: &[PropertyValue],
    ) -> Result<(), RuntimeError>;

    /// Creates a new foreign object from `definition` and returns its handle.
    fn spawn(&self, definition: &ObjectDefinition) -> Result<ForeignHandle, RuntimeError>;

    /// Whether `operation` is exposed for objects of `kind`.
    fn has_operation(&self, kind: EntityKind, operation: &OperationId) -> bool;
}

impl<T: ForeignRuntime + ?Sized> ForeignRuntime for Arc<T> {
    fn snapshot_handles(&self, domain: &Domain) -> Result<Vec<ForeignHandle>, RuntimeError> {
        (**self).snapshot_handles(domain)
    }

    fn read_definition(&self, handle: &ForeignHandle) -> Option<ObjectDefinition> {
        (**self).read_definition(handle)
    }

    fn invoke(
        &self,
        handle: &ForeignHandle,
        operation: &OperationId,
        args: &[PropertyValue],
    ) -> Result<Option<PropertyValue>, RuntimeError> {
        (**self).invoke(handle, operation, args)
    }

    fn broadcast(
        &self,
        handle: &ForeignHandle,
        operation: &OperationId,
        args: &[PropertyValue],
    ) -> Result<(), RuntimeError> {
        (**self).broadcast(handle, operation, args)
    }

    fn spawn(&self, definition: &ObjectDefinition) -> Result<ForeignHandle, RuntimeError> {
        (**self).spawn(definition)
    }

    fn has_operation(&self, kind: EntityKind, operation: &OperationId) -> bool {
        (**self).has_operation(kind, operation)
    }
}

/// Work that must run on the one thread allowed to touch the foreign runtime.
pub type AuthorityAction = Box<dyn FnOnce(&dyn ForeignRuntime) + Send + 'static>;

/// The sole legal way to run code against the foreign runtime.
///
/// Implementations hand `action` to the designated authority thread, which
/// runs actions one at a time in the order they were scheduled.
pub trait AuthorityScheduler: Send + Sync {
    fn schedule_on_authority_thread(&self, action: AuthorityAction) -> Result<(), RuntimeError>;
}
