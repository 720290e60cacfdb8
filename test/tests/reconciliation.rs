/// Integration tests for reconciliation passes against the fake runtime
/// Covers creation, refresh, retirement, absorbed per-entity failures and
/// whole-pass failures

use std::sync::{Arc, Mutex};

use mirra_shared::{
    Domain, EntityKind, EntityManager, ForeignHandle, ForeignRuntime, KindFilter, ManagerError,
    Meteor, ObjectDefinition, OperationId, PropertyValue, Proxy, ProxyKind, ReconcileOutcome,
    ReconcileReport, RuntimeError, SectorDefinition, UnknownObject, Vec3,
};
use mirra_test::{cube_grid, init_logger, meteor, object, FakeRuntime, TestHarness};

fn ids<T: ProxyKind>(list: &[T]) -> Vec<u64> {
    list.iter().map(|item| item.proxy().id().value()).collect()
}

#[test]
fn vanished_object_is_retired_and_new_one_created() {
    init_logger();
    let harness = TestHarness::new();
    let meteors = harness.manager(KindFilter::only(EntityKind::Meteor));
    let a = harness.runtime.insert(meteor(1));
    let b = harness.runtime.insert(meteor(2));

    meteors.reconcile(&harness.runtime).unwrap();
    let proxy_a = meteors.resolve(&a).unwrap();
    let proxy_b = meteors.resolve(&b).unwrap();

    harness.runtime.remove(a);
    let c = harness.runtime.insert(meteor(3));
    let outcome = meteors.reconcile(&harness.runtime).unwrap();

    assert_eq!(
        outcome,
        ReconcileOutcome::Completed(ReconcileReport {
            created: 1,
            refreshed: 1,
            retired: 1,
            skipped: 0,
        })
    );
    assert!(proxy_a.is_disposed());
    assert!(meteors.resolve(&a).is_none());
    assert!(Arc::ptr_eq(&meteors.resolve(&b).unwrap(), &proxy_b));
    assert_eq!(proxy_b.id().value(), 2);
    assert_eq!(meteors.resolve(&c).unwrap().id().value(), 3);
    assert_eq!(ids(&meteors.list::<Meteor>()), vec![2, 3]);
}

#[test]
fn refresh_takes_foreign_values() {
    let harness = TestHarness::new();
    let grids = harness.manager(KindFilter::only(EntityKind::CubeGrid));
    let handle = harness.runtime.insert(cube_grid(7));
    grids.reconcile(&harness.runtime).unwrap();

    harness
        .runtime
        .set_property(handle, "DisplayName", "Renamed in game");
    grids.reconcile(&harness.runtime).unwrap();

    let grid = grids.list::<mirra_shared::CubeGrid>().remove(0);
    assert_eq!(grid.display_name(), "Renamed in game");
    assert!(!grid.is_dirty());
}

#[test]
fn stale_handle_is_skipped_and_kept() {
    let harness = TestHarness::new();
    let meteors = harness.manager(KindFilter::only(EntityKind::Meteor));
    let handle = harness.runtime.insert(meteor(1));
    meteors.reconcile(&harness.runtime).unwrap();
    let proxy = meteors.resolve(&handle).unwrap();

    harness.runtime.mark_stale(handle);
    let fresh = harness.runtime.insert(meteor(2));
    harness.runtime.mark_stale(fresh);
    let outcome = meteors.reconcile(&harness.runtime).unwrap();

    assert_eq!(outcome.report().unwrap().skipped, 2);
    assert_eq!(outcome.report().unwrap().retired, 0);
    assert!(!proxy.is_disposed());
    assert!(meteors.resolve(&fresh).is_none());
    assert_eq!(meteors.len(), 1);
}

#[test]
fn unavailable_runtime_leaves_state_untouched() {
    let harness = TestHarness::new();
    let objects = harness.manager(KindFilter::Any);
    harness.runtime.insert(meteor(1));
    harness.runtime.insert(cube_grid(2));
    objects.reconcile(&harness.runtime).unwrap();
    let before = objects.bindings().len();

    harness.runtime.set_unavailable(true);
    let result = objects.reconcile(&harness.runtime);

    assert_eq!(
        result,
        Err(ManagerError::ReconciliationUnavailable {
            domain: Domain::SECTOR_OBJECTS,
            reason: "Foreign runtime unavailable: fake runtime is offline".to_string(),
        })
    );
    assert_eq!(objects.bindings().len(), before);
    assert!(objects.entries().iter().all(|proxy| !proxy.is_disposed()));
    assert!(!objects.is_reconciling());

    harness.runtime.set_unavailable(false);
    assert!(objects.reconcile(&harness.runtime).is_ok());
}

#[test]
fn unrecognised_type_falls_back_to_unknown() {
    let harness = TestHarness::new();
    let objects = harness.manager(KindFilter::Any);
    let handle = harness.runtime.insert(object(9, "Planet"));

    objects.reconcile(&harness.runtime).unwrap();

    let proxy = objects.resolve(&handle).unwrap();
    assert_eq!(proxy.kind(), EntityKind::Unknown);
    assert_eq!(ids(&objects.list::<UnknownObject>()), vec![9]);
    assert!(objects.list::<Meteor>().is_empty());
}

#[test]
fn sector_routes_live_objects_to_their_managers() {
    let harness = TestHarness::new();
    let sector = harness.sector(SectorDefinition::default());
    harness.runtime.insert(meteor(1));
    harness.runtime.insert(cube_grid(2));
    harness.runtime.insert(object(3, "Planet"));
    harness.runtime.insert(object(4, "Character"));

    let outcomes = sector.reconcile(&harness.runtime).unwrap();

    assert_eq!(outcomes.len(), 5);
    assert_eq!(ids(&sector.meteors()), vec![1]);
    assert_eq!(ids(&sector.cube_grids()), vec![2]);
    assert_eq!(ids(&sector.characters()), vec![4]);
    assert_eq!(sector.unknown_objects().len(), 2);
}

#[test]
fn disposed_proxy_is_never_resurrected() {
    let harness = TestHarness::new();
    let meteors = harness.manager(KindFilter::only(EntityKind::Meteor));
    let handle = harness.runtime.insert(meteor(1));
    meteors.reconcile(&harness.runtime).unwrap();
    let proxy = meteors.resolve(&handle).unwrap();

    assert!(meteors.delete_entry(&proxy));
    harness.settle();
    meteors.reconcile(&harness.runtime).unwrap();

    assert!(proxy.is_disposed());
    assert!(!harness.runtime.contains(handle));
    assert!(meteors.is_empty());
}

#[test]
fn pending_local_write_survives_refresh() {
    let harness = TestHarness::new();
    let meteors = harness.manager(KindFilter::only(EntityKind::Meteor));
    let handle = harness.runtime.insert(meteor(1));
    meteors.reconcile(&harness.runtime).unwrap();
    let rock = meteors.list::<Meteor>().remove(0);

    rock.set_position(Vec3::new(10.0, 0.0, 0.0));
    harness
        .runtime
        .set_property(handle, Proxy::POSITION, Vec3::new(-1.0, 0.0, 0.0));
    harness.runtime.set_property(handle, Meteor::INTEGRITY, 0.25f32);
    meteors.reconcile(&harness.runtime).unwrap();

    assert_eq!(rock.position(), Vec3::new(10.0, 0.0, 0.0));
    assert_eq!(rock.integrity(), 0.25);
    assert!(rock.is_property_dirty(Proxy::POSITION));

    harness.settle();
    meteors.reconcile(&harness.runtime).unwrap();

    assert!(!rock.is_dirty());
    assert_eq!(
        harness.runtime.property(handle, Proxy::POSITION),
        Some(PropertyValue::Vector(Vec3::new(10.0, 0.0, 0.0)))
    );
    assert_eq!(rock.position(), Vec3::new(10.0, 0.0, 0.0));
}

/// Re-enters reconciliation of the same manager from inside a pass.
struct ReentrantRuntime {
    inner: FakeRuntime,
    manager: Mutex<Option<EntityManager>>,
    nested: Mutex<Vec<Result<ReconcileOutcome, ManagerError>>>,
}

impl ForeignRuntime for ReentrantRuntime {
    fn snapshot_handles(&self, domain: &Domain) -> Result<Vec<ForeignHandle>, RuntimeError> {
        let manager = self.manager.lock().unwrap().take();
        if let Some(manager) = manager {
            let nested = manager.reconcile(self);
            self.nested.lock().unwrap().push(nested);
        }
        self.inner.snapshot_handles(domain)
    }

    fn read_definition(&self, handle: &ForeignHandle) -> Option<ObjectDefinition> {
        self.inner.read_definition(handle)
    }

    fn invoke(
        &self,
        handle: &ForeignHandle,
        operation: &OperationId,
        args: &[PropertyValue],
    ) -> Result<Option<PropertyValue>, RuntimeError> {
        self.inner.invoke(handle, operation, args)
    }

    fn broadcast(
        &self,
        handle: &ForeignHandle,
        operation: &OperationId,
        args: &[PropertyValue],
    ) -> Result<(), RuntimeError> {
        self.inner.broadcast(handle, operation, args)
    }

    fn spawn(&self, definition: &ObjectDefinition) -> Result<ForeignHandle, RuntimeError> {
        self.inner.spawn(definition)
    }

    fn has_operation(&self, kind: EntityKind, operation: &OperationId) -> bool {
        self.inner.has_operation(kind, operation)
    }
}

#[test]
fn reentrant_reconcile_is_a_no_op() {
    let harness = TestHarness::new();
    let meteors = harness.manager(KindFilter::only(EntityKind::Meteor));
    harness.runtime.insert(meteor(1));
    let runtime = ReentrantRuntime {
        inner: harness.runtime.clone(),
        manager: Mutex::new(Some(meteors.clone())),
        nested: Mutex::new(Vec::new()),
    };

    let outcome = meteors.reconcile(&runtime).unwrap();

    assert_eq!(outcome.report().unwrap().created, 1);
    assert_eq!(
        *runtime.nested.lock().unwrap(),
        vec![Ok(ReconcileOutcome::AlreadyRunning)]
    );
    assert_eq!(harness.runtime.snapshot_count(), 1);
    assert!(!meteors.is_reconciling());
}
