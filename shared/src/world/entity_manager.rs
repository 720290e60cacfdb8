use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, PoisonError, RwLock,
};

use log::{debug, warn};

use crate::{
    world::{
        entity_index::EntityIndex,
        error::ManagerError,
        reconciler::{ForeignRead, ReconcileOutcome, Reconciler},
    },
    Domain, EntityId, EntityKind, ForeignHandle, ForeignRuntime, KindFilter, Mutation,
    MutationSender, ObjectDefinition, OperationId, Proxy, ProxyKind,
};

pub(crate) struct ManagerInner {
    domain: Domain,
    filter: KindFilter,
    sender: MutationSender,
    index: RwLock<Arc<EntityIndex>>,
    loaded: AtomicBool,
    reconciling: AtomicBool,
}

/// Owns a homogeneous or polymorphic set of proxies mirroring one foreign
/// collection.
///
/// The main index and identity map are published together as one immutable
/// snapshot. Readers (`list`, `get`, `resolve`, ...) grab the current snapshot
/// and never observe a half-applied change; writers build the next snapshot
/// and swap it in. `EntityManager` is a cheap handle: clones share state.
#[derive(Clone)]
pub struct EntityManager {
    inner: Arc<ManagerInner>,
}

impl std::fmt::Debug for EntityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityManager")
            .field("domain", &self.inner.domain)
            .field("filter", &self.inner.filter)
            .finish_non_exhaustive()
    }
}

impl EntityManager {
    pub fn new(domain: Domain, filter: KindFilter, sender: MutationSender) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                domain,
                filter,
                sender,
                index: RwLock::new(Arc::new(EntityIndex::default())),
                loaded: AtomicBool::new(false),
                reconciling: AtomicBool::new(false),
            }),
        }
    }

    pub fn domain(&self) -> Domain {
        self.inner.domain
    }

    pub fn filter(&self) -> &KindFilter {
        &self.inner.filter
    }

    pub fn accepts(&self, kind: EntityKind) -> bool {
        self.inner.filter.accepts(kind)
    }

    pub(crate) fn sender(&self) -> &MutationSender {
        &self.inner.sender
    }

    pub(crate) fn reconciling_flag(&self) -> &AtomicBool {
        &self.inner.reconciling
    }

    pub(crate) fn snapshot(&self) -> Arc<EntityIndex> {
        let guard = self.inner.index.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Applies `mutate` to the current index and publishes the result as the
    /// new snapshot. Writers are serialized by the index lock.
    pub(crate) fn commit<R>(&self, mutate: impl FnOnce(&mut EntityIndex) -> R) -> R {
        let mut guard = self.inner.index.write().unwrap_or_else(PoisonError::into_inner);
        mutate(Arc::make_mut(&mut guard))
    }

    // Loading

    /// Bulk-initializes the manager from already constructed proxies, e.g.
    /// when cold-starting from a persisted definition file.
    ///
    /// Fails if the manager was already loaded and not cleared since. Proxies
    /// of kinds this manager does not accept, and duplicate ids, are skipped.
    pub fn load<I: IntoIterator<Item = Arc<Proxy>>>(&self, proxies: I) -> Result<usize, ManagerError> {
        if self.inner.loaded.swap(true, Ordering::AcqRel) {
            return Err(ManagerError::AlreadyLoaded {
                domain: self.inner.domain,
            });
        }

        let filter = &self.inner.filter;
        let domain = self.inner.domain;
        let loaded = self.commit(|index| {
            let mut entries = std::mem::take(&mut index.entries);
            let mut loaded = 0;
            for proxy in proxies {
                if !filter.accepts(proxy.kind()) {
                    warn!("{:?} {} cannot be loaded into {}", proxy.kind(), proxy.id(), domain);
                    continue;
                }
                if entries.contains_key(&proxy.id()) {
                    warn!("Duplicate entity id {} while loading {}; skipping", proxy.id(), domain);
                    continue;
                }
                entries.insert(proxy.id(), proxy);
                loaded += 1;
            }
            *index = EntityIndex::rebuild(entries);
            loaded
        });

        debug!("Loaded {} entities into {}", loaded, domain);
        Ok(loaded)
    }

    /// Builds unbound proxies from `definitions` and loads them.
    pub fn load_definitions<I: IntoIterator<Item = ObjectDefinition>>(
        &self,
        definitions: I,
    ) -> Result<usize, ManagerError> {
        let sender = self.inner.sender.clone();
        self.load(
            definitions
                .into_iter()
                .map(|definition| Arc::new(Proxy::new(definition, None, sender.clone()))),
        )
    }

    /// Disposes every entry and re-arms `load`.
    pub fn clear(&self) {
        self.commit(|index| {
            for proxy in index.entries.values() {
                proxy.dispose();
            }
            index.entries.clear();
            index.identity.unbind_all();
        });
        self.inner.loaded.store(false, Ordering::Release);
    }

    // Entries

    /// Stages a fresh proxy of `kind`, not yet backed by a foreign object.
    ///
    /// Returns `None` if this manager does not accept `kind`. The caller
    /// decides when to ask the foreign runtime to create it, see
    /// [`EntityManager::request_creation`].
    pub fn new_entry(&self, kind: EntityKind) -> Option<Arc<Proxy>> {
        if !self.accepts(kind) {
            debug!("{} does not accept new {:?} entries", self.inner.domain, kind);
            return None;
        }

        let sender = self.inner.sender.clone();
        let proxy = self.commit(|index| {
            let mut id = EntityId::new(fastrand::u64(1..));
            while index.entries.contains_key(&id) {
                id = EntityId::new(fastrand::u64(1..));
            }
            let definition = ObjectDefinition::new(id.value(), kind.type_id());
            let proxy = Arc::new(Proxy::staged(definition, sender));
            index.entries.insert(id, Arc::clone(&proxy));
            proxy
        });

        debug!("Staged new {:?} {} in {}", kind, proxy.id(), self.inner.domain);
        Some(proxy)
    }

    /// Disposes `proxy` and removes it from both indices. If it mirrors a
    /// foreign object, the foreign runtime is asked to remove that object too.
    ///
    /// Returns false if `proxy` is not held by this manager; deleting twice is
    /// harmless.
    pub fn delete_entry(&self, proxy: &Proxy) -> bool {
        let removed = self.commit(|index| {
            if !index.holds(proxy) {
                return None;
            }
            let handle = proxy.foreign_handle();
            if let Some(handle) = &handle {
                index.identity.unbind(handle);
            }
            index.entries.shift_remove(&proxy.id());
            proxy.dispose();
            Some(handle)
        });

        let Some(handle) = removed else {
            return false;
        };
        if let Some(handle) = handle {
            self.inner
                .sender
                .enqueue(removal_mutation(proxy.kind(), proxy.id(), handle));
        }
        true
    }

    /// Explicitly binds `proxy` to `handle`, replacing any previous binding.
    pub fn rebind(&self, proxy: &Arc<Proxy>, handle: ForeignHandle) -> Result<(), ManagerError> {
        let domain = self.inner.domain;
        self.commit(|index| {
            if !index.holds(proxy) || proxy.is_disposed() {
                return Err(ManagerError::EntityNotFound {
                    domain,
                    entity_id: proxy.id(),
                });
            }
            index.identity.bind(handle, Arc::clone(proxy))?;
            if let Some(previous) = proxy.foreign_handle() {
                if previous != handle {
                    index.identity.unbind(&previous);
                }
            }
            proxy.bind(handle);
            Ok(())
        })
    }

    /// Queues the foreign creation of a staged proxy.
    ///
    /// The definition is captured now, and the spawn counts as dispatching
    /// every write made so far. Once the foreign runtime reports the new
    /// handle the proxy is re-bound to it, writes made after this call are
    /// queued against the handle, and the spawn is broadcast. Returns false
    /// for proxies that are not held here, disposed, or already bound.
    pub fn request_creation(&self, proxy: &Arc<Proxy>) -> bool {
        if !self.snapshot().holds(proxy) || proxy.is_disposed() || proxy.is_bound() {
            debug!("Entity {} cannot be created in {}", proxy.id(), self.inner.domain);
            return false;
        }

        let definition = proxy.definition();
        let watermark = proxy.write_watermark();
        let manager = Arc::downgrade(&self.inner);
        let target = Arc::clone(proxy);
        let label = format!("spawn {:?} {}", proxy.kind(), proxy.id());

        self.inner.sender.enqueue(Mutation::new(label, move |runtime| {
            let spawned = runtime.spawn(&definition);
            target.writes_dispatched_through(watermark);
            let handle = spawned?;
            if let Some(inner) = manager.upgrade() {
                let manager = EntityManager { inner };
                if let Err(error) = manager.rebind(&target, handle) {
                    warn!("Spawned {} but could not bind it: {}", handle, error);
                }
            }
            runtime.broadcast(&handle, &OperationId::BROADCAST_SPAWN, &[])
        }));
        true
    }

    // Reconciliation

    /// Synchronizes this manager with the foreign collection it mirrors.
    ///
    /// Must run on the authority thread. If a pass is already in flight the
    /// call returns `AlreadyRunning` immediately instead of waiting.
    pub fn reconcile(&self, runtime: &dyn ForeignRuntime) -> Result<ReconcileOutcome, ManagerError> {
        Reconciler::new(self).run(runtime)
    }

    /// Reconciles against reads already taken from the foreign runtime.
    pub(crate) fn reconcile_with(&self, reads: Vec<ForeignRead>) -> ReconcileOutcome {
        Reconciler::new(self).run_with(reads)
    }

    pub fn is_reconciling(&self) -> bool {
        self.inner.reconciling.load(Ordering::Acquire)
    }

    // Queries

    /// Point-in-time list of live proxies of kind `T`, in insertion order.
    pub fn list<T: ProxyKind>(&self) -> Vec<T> {
        self.snapshot()
            .entries
            .values()
            .filter(|proxy| !proxy.is_disposed() && proxy.kind() == T::KIND)
            .map(|proxy| T::from_proxy(Arc::clone(proxy)))
            .collect()
    }

    /// Point-in-time list of every live proxy, in insertion order.
    pub fn entries(&self) -> Vec<Arc<Proxy>> {
        self.snapshot()
            .entries
            .values()
            .filter(|proxy| !proxy.is_disposed())
            .cloned()
            .collect()
    }

    pub fn get(&self, id: EntityId) -> Option<Arc<Proxy>> {
        self.snapshot().entries.get(&id).cloned()
    }

    pub fn resolve(&self, handle: &ForeignHandle) -> Option<Arc<Proxy>> {
        self.snapshot().identity.resolve(handle).cloned()
    }

    /// Snapshot of the identity map.
    pub fn bindings(&self) -> Vec<(ForeignHandle, Arc<Proxy>)> {
        self.snapshot()
            .identity
            .iter()
            .map(|(handle, proxy)| (*handle, Arc::clone(proxy)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().entries.is_empty()
    }
}

fn removal_mutation(kind: EntityKind, id: EntityId, handle: ForeignHandle) -> Mutation {
    let label = format!("{} on {:?} {}", OperationId::REMOVE, kind, id);
    Mutation::new(label, move |runtime| {
        runtime
            .invoke(&handle, &OperationId::REMOVE, &[])
            .map(|_| ())
    })
}
