use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError,
    },
};

use log::debug;

use crate::{
    world::entity::pending_writes::PendingWrites, EntityId, EntityKind, ForeignHandle, Mutation,
    MutationSender, ObjectDefinition, OperationId, PropertyValue, Vec3,
};

/// Describes how a property write reaches the foreign object: one invocation,
/// optionally followed by a broadcast to the foreign runtime's peers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForeignWrite {
    pub operation: OperationId,
    pub broadcast: Option<OperationId>,
}

impl ForeignWrite {
    pub const fn new(operation: OperationId) -> Self {
        Self {
            operation,
            broadcast: None,
        }
    }

    pub const fn with_broadcast(operation: OperationId, broadcast: OperationId) -> Self {
        Self {
            operation,
            broadcast: Some(broadcast),
        }
    }
}

struct ProxyState {
    definition: ObjectDefinition,
    handle: Option<ForeignHandle>,
}

/// The locally owned mirror of one foreign object.
///
/// Proxies are shared (`Arc`) between the manager that owns them and any
/// number of readers. The definition is only ever changed through typed
/// setters, which queue the matching foreign write, or by the reconciler
/// refreshing it from a fresh foreign read.
///
/// Writes accepted while the proxy is unbound stay pending and are queued
/// against the foreign object as soon as the proxy is first bound.
pub struct Proxy {
    id: EntityId,
    kind: EntityKind,
    local: bool,
    state: RwLock<ProxyState>,
    pending: Arc<PendingWrites>,
    disposed: AtomicBool,
    sender: MutationSender,
}

impl Proxy {
    pub const POSITION: &'static str = "Position";

    const POSITION_WRITE: ForeignWrite =
        ForeignWrite::with_broadcast(OperationId::SET_POSITION, OperationId::BROADCAST_POSITION);

    /// Builds a proxy from a definition. The id and kind are taken from the
    /// definition once and never change afterwards.
    pub fn new(
        definition: ObjectDefinition,
        handle: Option<ForeignHandle>,
        sender: MutationSender,
    ) -> Self {
        Self::build(definition, handle, false, sender)
    }

    /// A proxy created locally, with no foreign object behind it yet.
    pub(crate) fn staged(definition: ObjectDefinition, sender: MutationSender) -> Self {
        Self::build(definition, None, true, sender)
    }

    fn build(
        definition: ObjectDefinition,
        handle: Option<ForeignHandle>,
        local: bool,
        sender: MutationSender,
    ) -> Self {
        Self {
            id: EntityId::new(definition.entity_id),
            kind: EntityKind::from_type_id(&definition.type_id),
            local,
            state: RwLock::new(ProxyState { definition, handle }),
            pending: Arc::new(PendingWrites::new()),
            disposed: AtomicBool::new(false),
            sender,
        }
    }

    fn state(&self) -> RwLockReadGuard<'_, ProxyState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, ProxyState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Whether this proxy was created locally through `new_entry` rather than
    /// read from a definition file or the foreign runtime.
    pub fn is_local(&self) -> bool {
        self.local
    }

    /// True while any local write has not been dispatched yet, or the proxy
    /// was marked changed and no mutation of it has been dispatched since.
    pub fn is_dirty(&self) -> bool {
        self.pending.is_changed() || !self.pending.is_empty()
    }

    pub fn is_property_dirty(&self, key: &str) -> bool {
        self.pending.contains(key)
    }

    /// Flags the proxy dirty without writing anything. The flag is cleared
    /// by the next mutation of this proxy that gets dispatched.
    pub fn mark_changed(&self) {
        self.pending.mark_changed();
    }

    /// The foreign object this proxy mirrors. `None` for staged proxies and
    /// for any proxy that has been disposed.
    pub fn foreign_handle(&self) -> Option<ForeignHandle> {
        if self.is_disposed() {
            return None;
        }
        self.state().handle
    }

    pub fn is_bound(&self) -> bool {
        self.foreign_handle().is_some()
    }

    /// Point-in-time copy of the definition.
    pub fn definition(&self) -> ObjectDefinition {
        self.state().definition.clone()
    }

    pub fn property(&self, key: &str) -> Option<PropertyValue> {
        self.state().definition.property(key).cloned()
    }

    pub fn subtype_name(&self) -> String {
        self.state().definition.subtype_name.clone()
    }

    pub fn position(&self) -> Vec3 {
        self.property(Self::POSITION)
            .and_then(|value| value.as_vector())
            .unwrap_or_default()
    }

    pub fn set_position(&self, position: Vec3) -> bool {
        self.write_property(Self::POSITION, position.into(), Self::POSITION_WRITE)
    }

    /// Refreshes the definition and handle from a fresh foreign read.
    ///
    /// Properties with a pending local write keep their local value; every
    /// other property takes the foreign value. The id never changes. Returns
    /// false if the proxy is disposed.
    pub fn apply_foreign_snapshot(&self, definition: ObjectDefinition, handle: ForeignHandle) -> bool {
        if self.is_disposed() {
            return false;
        }

        let mut state = self.state_mut();
        self.refresh(&mut state, definition);
        self.attach(&mut state, handle);
        true
    }

    /// Binds an unbound proxy to the foreign object it turned out to mirror
    /// and refreshes it from that object. Returns false if the proxy is
    /// disposed or already bound.
    pub(crate) fn adopt(&self, definition: ObjectDefinition, handle: ForeignHandle) -> bool {
        if self.is_disposed() {
            return false;
        }

        let mut state = self.state_mut();
        if state.handle.is_some() {
            return false;
        }
        self.refresh(&mut state, definition);
        self.attach(&mut state, handle);
        true
    }

    pub(crate) fn bind(&self, handle: ForeignHandle) {
        let mut state = self.state_mut();
        self.attach(&mut state, handle);
    }

    /// Marks the proxy disposed. Returns true only for the call that
    /// actually disposed it.
    pub(crate) fn dispose(&self) -> bool {
        !self.disposed.swap(true, Ordering::AcqRel)
    }

    /// Latest write generation, to be passed back to `writes_dispatched_through`.
    pub(crate) fn write_watermark(&self) -> u64 {
        self.pending.watermark()
    }

    /// Clears every write made up to `watermark`, once something carrying
    /// them (a spawn from a captured definition) has been dispatched.
    pub(crate) fn writes_dispatched_through(&self, watermark: u64) {
        self.pending.dispatched_through(watermark);
    }

    fn refresh(&self, state: &mut ProxyState, definition: ObjectDefinition) {
        let mut incoming = definition;
        for (key, value) in state.definition.properties.iter() {
            if self.pending.contains(key) {
                incoming.properties.insert(key.clone(), value.clone());
            }
        }
        state.definition = incoming;
    }

    /// Sets the handle. Going from unbound to bound queues every write still
    /// pending, oldest first, against the new handle.
    fn attach(&self, state: &mut ProxyState, handle: ForeignHandle) {
        let was_unbound = state.handle.is_none();
        state.handle = Some(handle);
        if !was_unbound {
            return;
        }

        for (key, generation, write) in self.pending.outstanding() {
            let Some(value) = state.definition.property(key).cloned() else {
                continue;
            };
            debug!("Queueing {} of entity {} now that it is bound to {}", key, self.id, handle);
            self.sender
                .enqueue(self.property_mutation(handle, key, value, write, generation));
        }
    }

    /// Compare-then-assign write of one property.
    ///
    /// Writing the current value is a no-op. Otherwise the property becomes
    /// dirty and, if the proxy is bound, a mutation carrying exactly this
    /// value is queued. The mutation is queued while the state lock is held so
    /// that concurrent writes to the same proxy reach the queue in the order
    /// they were applied locally.
    pub(crate) fn write_property(
        &self,
        key: &'static str,
        value: PropertyValue,
        write: ForeignWrite,
    ) -> bool {
        if self.is_disposed() {
            debug!("Ignoring write of {} on disposed entity {}", key, self.id);
            return false;
        }

        let mut state = self.state_mut();
        if state.definition.property(key) == Some(&value) {
            return false;
        }
        state.definition.set_property(key, value.clone());
        let generation = self.pending.mark(key, write);

        if let Some(handle) = state.handle {
            self.sender
                .enqueue(self.property_mutation(handle, key, value, write, generation));
        }
        true
    }

    fn property_mutation(
        &self,
        handle: ForeignHandle,
        key: &'static str,
        value: PropertyValue,
        write: ForeignWrite,
        generation: u64,
    ) -> Mutation {
        let pending = Arc::clone(&self.pending);
        let label = format!("{} on {:?} {}", write.operation, self.kind, self.id);
        Mutation::new(label, move |runtime| {
            let args = std::slice::from_ref(&value);
            let result = runtime
                .invoke(&handle, &write.operation, args)
                .and_then(|_| match write.broadcast {
                    Some(broadcast) => runtime.broadcast(&handle, &broadcast, args),
                    None => Ok(()),
                });
            // dispatched, whether or not the foreign side accepted it
            pending.dispatched(key, generation);
            result
        })
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("handle", &self.state().handle)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
