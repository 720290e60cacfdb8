/// Integration tests for the mirror server running a real authority worker
///
/// Shutting the server down joins the worker after it has run everything
/// already scheduled, which makes the outcome of earlier ticks observable.

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use mirra_server::{
    MirraServerError, MirrorServer, Plugin, PluginContext, PluginInfo, ServerConfig, ServerEvent,
};
use mirra_shared::{
    Domain, EntityKind, Meteor, OperationId, PropertyValue, RuntimeError, Vec3,
};
use mirra_test::{init_logger, meteor, FakeRuntime};

fn server(runtime: &FakeRuntime) -> MirrorServer {
    MirrorServer::new(ServerConfig::default(), runtime.clone()).unwrap()
}

#[test]
fn tick_reconciles_on_the_authority_thread() {
    init_logger();
    let runtime = FakeRuntime::new();
    runtime.insert(meteor(1));
    runtime.insert(meteor(2));
    let mut server = server(&runtime);

    server.tick(Instant::now());
    server.shutdown(Instant::now()).unwrap();

    let events = server.receive();
    assert_eq!(events.len(), 1);
    match &events[0] {
        ServerEvent::Reconciled { domain, report } => {
            assert_eq!(*domain, Domain::SECTOR_OBJECTS);
            assert_eq!(report.created, 2);
        }
        other => panic!("Expected Reconciled, got {:?}", other),
    }
    assert_eq!(server.objects().list::<Meteor>().len(), 2);
}

#[test]
fn reconciliation_follows_the_interval() {
    let runtime = FakeRuntime::new();
    let config = ServerConfig {
        reconcile_interval: Duration::from_secs(1),
        ..ServerConfig::default()
    };
    let mut server = MirrorServer::new(config, runtime.clone()).unwrap();
    let start = Instant::now();

    server.tick(start);
    server.tick(start + Duration::from_millis(400));
    server.tick(start + Duration::from_millis(999));
    server.tick(start + Duration::from_secs(1));
    server.tick(start + Duration::from_millis(1500));
    server.shutdown(Instant::now()).unwrap();

    assert_eq!(runtime.snapshot_count(), 2);
    assert_eq!(server.receive().len(), 2);
}

#[test]
fn unreachable_runtime_is_reported() {
    let runtime = FakeRuntime::new();
    let mut server = server(&runtime);
    runtime.set_unavailable(true);

    server.schedule_reconcile().unwrap();
    server.shutdown(Instant::now()).unwrap();

    let events = server.receive();
    assert!(matches!(
        events.as_slice(),
        [ServerEvent::ReconcileFailed(_)]
    ));
}

#[test]
fn proxy_writes_are_applied_by_the_worker() {
    let runtime = FakeRuntime::new();
    let handle = runtime.insert(meteor(1));
    let mut server = server(&runtime);
    server.tick(Instant::now());

    // wait for the first pass to publish the proxy
    let deadline = Instant::now() + Duration::from_secs(5);
    let rock = loop {
        if let Some(rock) = server.objects().list::<Meteor>().pop() {
            break rock;
        }
        assert!(Instant::now() < deadline, "reconciliation never completed");
        std::thread::sleep(Duration::from_millis(5));
    };

    rock.set_position(Vec3::new(7.0, 7.0, 7.0));
    rock.set_integrity(0.5);
    server.shutdown(Instant::now()).unwrap();

    assert_eq!(
        runtime.property(handle, Meteor::INTEGRITY),
        Some(PropertyValue::Float(0.5))
    );
    assert_eq!(
        runtime.broadcasts(),
        vec![(handle, OperationId::BROADCAST_POSITION)]
    );
    assert!(!rock.is_dirty());
}

#[test]
fn missing_operations_refuse_startup() {
    let runtime = FakeRuntime::new();
    runtime.withhold_operation(OperationId::SET_AMOUNT);

    let result = MirrorServer::new(ServerConfig::default(), runtime.clone());

    match result {
        Err(MirraServerError::CapabilityProbe(RuntimeError::MissingOperations { missing })) => {
            assert_eq!(missing, vec!["FloatingObject.SetAmount".to_string()]);
        }
        Err(other) => panic!("Expected CapabilityProbe, got {}", other),
        Ok(_) => panic!("Server started with a missing operation"),
    }
}

#[test]
fn probe_can_be_disabled() {
    let runtime = FakeRuntime::new();
    runtime.withhold_operation(OperationId::SET_AMOUNT);
    let config = ServerConfig {
        verify_operations: false,
        ..ServerConfig::default()
    };

    let mut server = MirrorServer::new(config, runtime).unwrap();

    assert!(server.shutdown(Instant::now()).is_ok());
}

#[test]
fn scheduling_after_shutdown_fails() {
    let runtime = FakeRuntime::new();
    let mut server = server(&runtime);
    server.shutdown(Instant::now()).unwrap();

    let result = server.schedule_reconcile();

    assert!(matches!(
        result,
        Err(MirraServerError::Scheduling(RuntimeError::SchedulerClosed))
    ));
    assert!(server.shutdown(Instant::now()).is_ok());
}

struct Recorder {
    id: &'static str,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Plugin for Recorder {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            id: self.id,
            name: "Recorder",
            version: "1.0.0",
        }
    }

    fn init(&mut self, _: &PluginContext) {
        self.calls.lock().unwrap().push(format!("{} init", self.id));
    }

    fn update(&mut self, context: &PluginContext) {
        let grids = context.objects().list::<mirra_shared::CubeGrid>().len();
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} update {}", self.id, grids));
    }

    fn shutdown(&mut self, _: &PluginContext) {
        self.calls.lock().unwrap().push(format!("{} shutdown", self.id));
    }
}

#[test]
fn plugins_run_in_registration_order() {
    let runtime = FakeRuntime::new();
    let mut server = server(&runtime);
    let calls = Arc::new(Mutex::new(Vec::new()));

    server
        .register_plugin(Recorder {
            id: "first",
            calls: calls.clone(),
        })
        .unwrap();
    server
        .register_plugin(Recorder {
            id: "second",
            calls: calls.clone(),
        })
        .unwrap();
    let duplicate = server.register_plugin(Recorder {
        id: "first",
        calls: calls.clone(),
    });
    assert!(matches!(
        duplicate,
        Err(MirraServerError::DuplicatePlugin { id: "first" })
    ));

    let now = Instant::now();
    server.start(now);
    server.tick(now);
    server.shutdown(now).unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "first init",
            "second init",
            "first update 0",
            "second update 0",
            "second shutdown",
            "first shutdown",
        ]
    );
    assert_eq!(server.plugins().len(), 2);
}

#[test]
fn plugin_registered_after_start_is_initialized() {
    let runtime = FakeRuntime::new();
    let mut server = server(&runtime);
    let calls = Arc::new(Mutex::new(Vec::new()));
    server.start(Instant::now());

    server
        .register_plugin(Recorder {
            id: "late",
            calls: calls.clone(),
        })
        .unwrap();

    assert_eq!(*calls.lock().unwrap(), vec!["late init"]);
    assert_eq!(
        server.plugins().infos()[0].name,
        "Recorder"
    );
    assert!(server.objects().accepts(EntityKind::Character));
}
