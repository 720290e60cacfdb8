use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::{
    world::{entity_index::EntityIndex, error::ManagerError},
    Domain, EntityId, EntityKind, EntityManager, ForeignHandle, ForeignRuntime, ObjectDefinition,
    Proxy,
};

/// Counts of what one reconciliation pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// New proxies for foreign objects seen for the first time
    pub created: usize,
    /// Existing proxies refreshed from a fresh foreign read
    pub refreshed: usize,
    /// Proxies disposed because their foreign object disappeared
    pub retired: usize,
    /// Handles that could not be mirrored this pass
    pub skipped: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Completed(ReconcileReport),
    /// Another pass on the same manager was in flight; nothing was done
    AlreadyRunning,
}

impl ReconcileOutcome {
    pub fn report(&self) -> Option<&ReconcileReport> {
        match self {
            ReconcileOutcome::Completed(report) => Some(report),
            ReconcileOutcome::AlreadyRunning => None,
        }
    }
}

/// Holds a manager's reconciling flag for the duration of one pass.
struct PassGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// One handle from a foreign snapshot and what reading it returned.
pub(crate) struct ForeignRead {
    pub handle: ForeignHandle,
    pub definition: Option<ObjectDefinition>,
}

/// Snapshots `domain` and reads every handle in it once. Handles listed more
/// than once are read once.
pub(crate) fn read_foreign(
    runtime: &dyn ForeignRuntime,
    domain: Domain,
) -> Result<Vec<ForeignRead>, ManagerError> {
    let handles = runtime
        .snapshot_handles(&domain)
        .map_err(|error| ManagerError::ReconciliationUnavailable {
            domain,
            reason: error.to_string(),
        })?;

    let mut seen = HashSet::with_capacity(handles.len());
    Ok(handles
        .into_iter()
        .filter(|handle| seen.insert(*handle))
        .map(|handle| ForeignRead {
            handle,
            definition: runtime.read_definition(&handle),
        })
        .collect())
}

enum Visit {
    Refreshed,
    Created,
    Skipped,
    Ignored,
}

/// One reconciliation pass of a manager against the foreign runtime.
///
/// Foreign state is read without holding the index lock. The results are
/// then merged into whatever the index holds at commit time, so entries
/// staged while the pass was reading survive it.
pub(crate) struct Reconciler<'a> {
    manager: &'a EntityManager,
}

impl<'a> Reconciler<'a> {
    pub fn new(manager: &'a EntityManager) -> Self {
        Self { manager }
    }

    /// Snapshots the manager's domain and reconciles against it.
    pub fn run(&self, runtime: &dyn ForeignRuntime) -> Result<ReconcileOutcome, ManagerError> {
        let Some(_guard) = self.acquire() else {
            return Ok(ReconcileOutcome::AlreadyRunning);
        };
        let reads = read_foreign(runtime, self.manager.domain())?;
        Ok(ReconcileOutcome::Completed(self.apply(reads)))
    }

    /// Reconciles against reads taken by the caller. `reads` must hold every
    /// handle this manager may mirror: bound handles missing from it retire.
    pub fn run_with(&self, reads: Vec<ForeignRead>) -> ReconcileOutcome {
        match self.acquire() {
            Some(_guard) => ReconcileOutcome::Completed(self.apply(reads)),
            None => ReconcileOutcome::AlreadyRunning,
        }
    }

    fn acquire(&self) -> Option<PassGuard<'a>> {
        let guard = PassGuard::acquire(self.manager.reconciling_flag());
        if guard.is_none() {
            debug!("Reconciliation of {} already in flight", self.manager.domain());
        }
        guard
    }

    fn apply(&self, reads: Vec<ForeignRead>) -> ReconcileReport {
        let domain = self.manager.domain();
        let previous = self.manager.snapshot();

        let mut report = ReconcileReport::default();
        let mut seen = HashSet::with_capacity(reads.len());
        let mut created = IndexMap::new();

        for read in reads {
            if !seen.insert(read.handle) {
                continue;
            }
            match self.visit(&previous, read, &mut created) {
                Visit::Refreshed => report.refreshed += 1,
                Visit::Skipped => report.skipped += 1,
                Visit::Created | Visit::Ignored => {}
            }
        }

        let (added, retired) = self
            .manager
            .commit(|index| merge(index, &previous, &seen, created));
        report.created = added;
        report.retired = retired;

        debug!(
            "Reconciled {}: {} created, {} refreshed, {} retired, {} skipped",
            domain, report.created, report.refreshed, report.retired, report.skipped
        );
        report
    }

    fn visit(
        &self,
        previous: &EntityIndex,
        read: ForeignRead,
        created: &mut IndexMap<EntityId, Arc<Proxy>>,
    ) -> Visit {
        let domain = self.manager.domain();
        let ForeignRead { handle, definition } = read;
        let Some(definition) = definition else {
            warn!("Could not read {} in {}; skipping it this pass", handle, domain);
            return Visit::Skipped;
        };

        if let Some(proxy) = previous.identity.resolve(&handle) {
            if proxy.is_disposed() {
                trace!("Entity {} was disposed; not refreshing it", proxy.id());
                return Visit::Skipped;
            }
            if proxy.foreign_handle() != Some(handle) {
                warn!(
                    "Entity {} is indexed under {} but bound elsewhere; skipping it this pass",
                    proxy.id(),
                    handle
                );
                return Visit::Skipped;
            }
            proxy.apply_foreign_snapshot(definition, handle);
            return Visit::Refreshed;
        }

        let kind = EntityKind::from_type_id(&definition.type_id);
        if !self.manager.accepts(kind) {
            trace!("{} is a {:?}; not mirrored in {}", handle, kind, domain);
            return Visit::Ignored;
        }

        let id = EntityId::new(definition.entity_id);
        if let Some(existing) = previous.entries.get(&id) {
            // entries loaded from a file are claimed by the live object with their id
            if !existing.is_local()
                && existing.kind() == kind
                && existing.adopt(definition, handle)
            {
                debug!("Bound loaded entity {} to {} in {}", id, handle, domain);
                return Visit::Refreshed;
            }
            warn!(
                "{} reports entity id {} which is already in use in {}; skipping it",
                handle, id, domain
            );
            return Visit::Skipped;
        }
        if created.contains_key(&id) {
            warn!(
                "{} reports entity id {} which is already in use in {}; skipping it",
                handle, id, domain
            );
            return Visit::Skipped;
        }

        let proxy = Proxy::new(definition, Some(handle), self.manager.sender().clone());
        created.insert(id, Arc::new(proxy));
        Visit::Created
    }
}

/// Folds one pass into the current index. Returns how many proxies were
/// added and how many were retired.
fn merge(
    index: &mut EntityIndex,
    previous: &EntityIndex,
    seen: &HashSet<ForeignHandle>,
    created: IndexMap<EntityId, Arc<Proxy>>,
) -> (usize, usize) {
    let mut retired = 0;
    for (handle, proxy) in previous.identity.iter() {
        // only proxies still bound to the vanished handle
        if !seen.contains(handle) && proxy.foreign_handle() == Some(*handle) && proxy.dispose() {
            retired += 1;
        }
    }

    let mut entries = std::mem::take(&mut index.entries);
    let mut added = 0;
    for (id, proxy) in created {
        let claimed = proxy
            .foreign_handle()
            .is_some_and(|handle| index.identity.contains(&handle));
        if claimed || entries.contains_key(&id) {
            debug!("Entity {} was bound while reconciling; dropping the duplicate", id);
            proxy.dispose();
            continue;
        }
        entries.insert(id, proxy);
        added += 1;
    }

    *index = EntityIndex::rebuild(entries);
    (added, retired)
}
