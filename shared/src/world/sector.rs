use std::{
    path::Path,
    sync::{Arc, PoisonError, RwLock},
};

use indexmap::IndexMap;
use log::{debug, warn};

use crate::{
    world::{
        error::ManagerError,
        reconciler::{read_foreign, ForeignRead, ReconcileOutcome},
    },
    Character, CubeGrid, DefinitionError, DefinitionStore, Domain, EntityKind, EntityManager,
    FloatingObject, ForeignRuntime, KindFilter, Meteor, MutationSender, ObjectDefinition, Proxy,
    SectorDefinition, SectorEvent, VoxelMap,
};

/// Kinds with a dedicated manager, in flattening order. Everything else lands
/// in the catch-all manager, which is flattened last.
const ROUTED_KINDS: [EntityKind; 4] = [
    EntityKind::CubeGrid,
    EntityKind::VoxelMap,
    EntityKind::FloatingObject,
    EntityKind::Meteor,
];

/// One mirrored sector: a manager per routed kind, a catch-all manager for
/// every other object, and the sector's scripted events.
pub struct Sector {
    position: [i32; 3],
    app_version: i32,
    events: RwLock<Vec<SectorEvent>>,
    managers: IndexMap<EntityKind, EntityManager>,
    unknown: EntityManager,
}

impl Sector {
    /// Creates an empty sector whose managers are ready to be loaded or
    /// reconciled.
    pub fn new(position: [i32; 3], sender: MutationSender) -> Self {
        let domain = Domain::SECTOR_OBJECTS;
        let managers = ROUTED_KINDS
            .iter()
            .map(|kind| {
                let manager = EntityManager::new(domain, KindFilter::only(*kind), sender.clone());
                (*kind, manager)
            })
            .collect();
        let unknown = EntityManager::new(domain, KindFilter::Except(ROUTED_KINDS.to_vec()), sender);

        Self {
            position,
            app_version: 0,
            events: RwLock::new(Vec::new()),
            managers,
            unknown,
        }
    }

    /// Builds a sector from a persisted definition. Objects are handed to the
    /// manager for their kind, keeping their relative order.
    pub fn from_definition(definition: SectorDefinition, sender: MutationSender) -> Self {
        let SectorDefinition {
            position,
            app_version,
            events,
            objects,
        } = definition;

        let mut sector = Self::new(position, sender);
        sector.app_version = app_version;
        *sector.events.get_mut().unwrap_or_else(PoisonError::into_inner) = events;

        let mut buckets: IndexMap<EntityKind, Vec<ObjectDefinition>> = IndexMap::new();
        for object in objects {
            let kind = EntityKind::from_type_id(&object.type_id);
            buckets.entry(kind).or_default().push(object);
        }
        for (kind, objects) in buckets {
            let manager = sector.manager_for(kind);
            if let Err(error) = manager.load_definitions(objects) {
                warn!("Could not load {:?} objects into {}: {}", kind, sector.name(), error);
            }
        }

        debug!("Built {} with {} objects", sector.name(), sector.len());
        sector
    }

    /// Loads a sector through `store`.
    pub fn load<S: DefinitionStore + ?Sized>(
        store: &S,
        path: &Path,
        sender: MutationSender,
    ) -> Result<Self, DefinitionError> {
        let definition = store.load_definition(path)?;
        Ok(Self::from_definition(definition, sender))
    }

    /// Re-flattens the sector and writes it through `store`.
    pub fn save<S: DefinitionStore + ?Sized>(&self, store: &S, path: &Path) -> Result<(), DefinitionError> {
        store.save_definition(&self.to_definition(), path)
    }

    /// Flattens every manager's live proxies, routed kinds first in their
    /// fixed order and the catch-all manager last.
    pub fn to_definition(&self) -> SectorDefinition {
        SectorDefinition {
            position: self.position,
            app_version: self.app_version,
            events: self.events(),
            objects: self.objects().iter().map(|proxy| proxy.definition()).collect(),
        }
    }

    pub fn name(&self) -> String {
        let [x, y, z] = self.position;
        format!("SANDBOX_{}_{}_{}_", x, y, z)
    }

    pub fn position(&self) -> [i32; 3] {
        self.position
    }

    pub fn app_version(&self) -> i32 {
        self.app_version
    }

    pub fn events(&self) -> Vec<SectorEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn add_event(&self, event: SectorEvent) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    // Routing

    /// The manager dedicated to `kind`.
    pub fn route(&self, kind: EntityKind) -> Result<&EntityManager, ManagerError> {
        self.managers
            .get(&kind)
            .ok_or(ManagerError::UnroutableKind { kind })
    }

    /// The manager holding objects of `kind`: its dedicated manager, or the
    /// catch-all one.
    fn manager_for(&self, kind: EntityKind) -> &EntityManager {
        self.managers.get(&kind).unwrap_or(&self.unknown)
    }

    /// Stages a new proxy in the manager for `kind`. Returns `None` for kinds
    /// without a dedicated manager.
    pub fn new_entry(&self, kind: EntityKind) -> Option<Arc<Proxy>> {
        match self.route(kind) {
            Ok(manager) => manager.new_entry(kind),
            Err(error) => {
                debug!("{}: {}", self.name(), error);
                None
            }
        }
    }

    /// Deletes `proxy` from the manager dedicated to its kind. Returns false
    /// for kinds without a dedicated manager.
    pub fn delete_entry(&self, proxy: &Proxy) -> bool {
        match self.route(proxy.kind()) {
            Ok(manager) => manager.delete_entry(proxy),
            Err(error) => {
                debug!("{}: {}", self.name(), error);
                false
            }
        }
    }

    /// Reconciles every manager, in flattening order, against one snapshot of
    /// the foreign sector objects. Each handle is read once and handed to the
    /// manager for its kind; an unreadable handle goes to the manager already
    /// mirroring it.
    ///
    /// Entries loaded from a definition are bound to the live object reporting
    /// the same entity id. If the snapshot cannot be taken no manager changes.
    pub fn reconcile(&self, runtime: &dyn ForeignRuntime) -> Result<Vec<ReconcileOutcome>, ManagerError> {
        let managers: Vec<&EntityManager> = self.managers().collect();
        let mut buckets: Vec<Vec<ForeignRead>> = managers.iter().map(|_| Vec::new()).collect();
        let catch_all = managers.len() - 1;

        for read in read_foreign(runtime, Domain::SECTOR_OBJECTS)? {
            let slot = match &read.definition {
                Some(definition) => {
                    let kind = EntityKind::from_type_id(&definition.type_id);
                    managers.iter().position(|manager| manager.accepts(kind))
                }
                None => managers
                    .iter()
                    .position(|manager| manager.resolve(&read.handle).is_some()),
            };
            buckets[slot.unwrap_or(catch_all)].push(read);
        }

        Ok(managers
            .into_iter()
            .zip(buckets)
            .map(|(manager, reads)| manager.reconcile_with(reads))
            .collect())
    }

    // Queries

    /// Every manager in flattening order.
    pub fn managers(&self) -> impl Iterator<Item = &EntityManager> {
        self.managers.values().chain(std::iter::once(&self.unknown))
    }

    pub fn objects(&self) -> Vec<Arc<Proxy>> {
        self.managers().flat_map(|manager| manager.entries()).collect()
    }

    pub fn len(&self) -> usize {
        self.managers().map(|manager| manager.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cube_grids(&self) -> Vec<CubeGrid> {
        self.manager_for(EntityKind::CubeGrid).list()
    }

    pub fn voxel_maps(&self) -> Vec<VoxelMap> {
        self.manager_for(EntityKind::VoxelMap).list()
    }

    pub fn floating_objects(&self) -> Vec<FloatingObject> {
        self.manager_for(EntityKind::FloatingObject).list()
    }

    pub fn meteors(&self) -> Vec<Meteor> {
        self.manager_for(EntityKind::Meteor).list()
    }

    pub fn characters(&self) -> Vec<Character> {
        self.unknown.list()
    }

    /// Objects held by the catch-all manager, whatever their kind.
    pub fn unknown_objects(&self) -> Vec<Arc<Proxy>> {
        self.unknown.entries()
    }
}
