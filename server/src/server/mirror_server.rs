use std::{
    path::Path,
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    time::Instant,
};

use log::{debug, info, warn};

use mirra_shared::{
    verify_operations, AuthorityScheduler, DefinitionError, DefinitionStore, Domain,
    EntityManager, ForeignRuntime, KindFilter, MutationDispatcher, MutationSender,
    ReconcileOutcome, Sector,
};

use crate::{
    authority::{AuthorityHandle, AuthorityWorker},
    MirraServerError, Plugin, PluginContext, PluginHost, ServerConfig, ServerEvent,
};

/// Mirrors the foreign runtime's sector objects and keeps them in sync.
///
/// The server owns the authority worker (and through it the foreign runtime),
/// the mutation dispatcher draining onto that worker, and one polymorphic
/// manager holding every live sector object. Call `tick` regularly from the
/// thread driving the server; read what happened with `receive`.
pub struct MirrorServer {
    config: ServerConfig,
    worker: AuthorityWorker,
    authority: AuthorityHandle,
    dispatcher: MutationDispatcher,
    objects: EntityManager,
    plugins: PluginHost,
    events_sender: Sender<ServerEvent>,
    events_receiver: Receiver<ServerEvent>,
    last_reconcile: Option<Instant>,
}

impl MirrorServer {
    /// Create a new Server, moving `runtime` onto a freshly spawned authority
    /// thread. Fails if the capability probe is enabled and does not pass.
    pub fn new<R: ForeignRuntime + Send + 'static>(
        config: ServerConfig,
        runtime: R,
    ) -> Result<Self, MirraServerError> {
        let mut worker = AuthorityWorker::spawn(runtime)?;
        let authority = worker.handle();

        if config.verify_operations {
            if let Err(error) = probe(&authority) {
                worker.shutdown()?;
                return Err(error);
            }
        }

        let scheduler: Arc<dyn AuthorityScheduler> = Arc::new(authority.clone());
        let dispatcher = MutationDispatcher::new(config.dispatcher.clone(), scheduler);
        let objects = EntityManager::new(
            Domain::SECTOR_OBJECTS,
            KindFilter::Any,
            dispatcher.sender(),
        );
        let (events_sender, events_receiver) = mpsc::channel();

        info!("Mirror server ready");
        Ok(Self {
            config,
            worker,
            authority,
            dispatcher,
            objects,
            plugins: PluginHost::new(),
            events_sender,
            events_receiver,
            last_reconcile: None,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The live, polymorphic manager of every sector object.
    pub fn objects(&self) -> &EntityManager {
        &self.objects
    }

    pub fn sender(&self) -> MutationSender {
        self.dispatcher.sender()
    }

    pub fn pending_mutations(&self) -> usize {
        self.dispatcher.pending_len()
    }

    /// Loads a persisted sector whose writes go through this server's
    /// dispatcher.
    pub fn load_sector<S: DefinitionStore + ?Sized>(
        &self,
        store: &S,
        path: &Path,
    ) -> Result<Sector, DefinitionError> {
        Sector::load(store, path, self.dispatcher.sender())
    }

    // Plugins

    pub fn register_plugin<P: Plugin + 'static>(&mut self, plugin: P) -> Result<(), MirraServerError> {
        let sender = self.dispatcher.sender();
        let context = PluginContext::new(&self.objects, &sender, Instant::now());
        self.plugins.register(Box::new(plugin), &context)
    }

    pub fn plugins(&self) -> &PluginHost {
        &self.plugins
    }

    /// Initializes every registered plugin.
    pub fn start(&mut self, now: Instant) {
        let sender = self.dispatcher.sender();
        let context = PluginContext::new(&self.objects, &sender, now);
        self.plugins.start(&context);
    }

    // Ticking

    /// Must be called regularly. Schedules a reconciliation pass once every
    /// `reconcile_interval`, then updates plugins.
    pub fn tick(&mut self, now: Instant) {
        let due = self.last_reconcile.map_or(true, |last| {
            now.saturating_duration_since(last) >= self.config.reconcile_interval
        });
        if due {
            match self.schedule_reconcile() {
                Ok(()) => self.last_reconcile = Some(now),
                Err(error) => warn!("{}", error),
            }
        }

        let sender = self.dispatcher.sender();
        let context = PluginContext::new(&self.objects, &sender, now);
        self.plugins.update(&context);
    }

    /// Queues a reconciliation pass of the live objects on the authority
    /// thread. Its outcome is reported through `receive`.
    pub fn schedule_reconcile(&self) -> Result<(), MirraServerError> {
        let objects = self.objects.clone();
        let events = self.events_sender.clone();
        self.authority
            .schedule_on_authority_thread(Box::new(move |runtime: &dyn ForeignRuntime| {
                let domain = objects.domain();
                let event = match objects.reconcile(runtime) {
                    Ok(ReconcileOutcome::Completed(report)) => {
                        ServerEvent::Reconciled { domain, report }
                    }
                    Ok(ReconcileOutcome::AlreadyRunning) => ServerEvent::ReconcileSkipped { domain },
                    Err(error) => {
                        warn!("{}", error);
                        ServerEvent::ReconcileFailed(error)
                    }
                };
                // receiver gone means the server is shutting down
                let _ = events.send(event);
            }))
            .map_err(MirraServerError::Scheduling)
    }

    /// Returns every event produced since the last call.
    pub fn receive(&mut self) -> Vec<ServerEvent> {
        self.events_receiver.try_iter().collect()
    }

    /// Shuts plugins down, lets queued work finish and stops the authority
    /// worker.
    pub fn shutdown(&mut self, now: Instant) -> Result<(), MirraServerError> {
        let sender = self.dispatcher.sender();
        let context = PluginContext::new(&self.objects, &sender, now);
        self.plugins.shutdown(&context);

        debug!("Stopping authority worker with {} mutations queued", self.dispatcher.pending_len());
        self.worker.shutdown()?;
        info!("Mirror server stopped");
        Ok(())
    }
}

/// Runs the capability probe on the authority thread and waits for it.
fn probe(authority: &AuthorityHandle) -> Result<(), MirraServerError> {
    let (sender, receiver) = mpsc::channel();
    authority
        .schedule_on_authority_thread(Box::new(move |runtime: &dyn ForeignRuntime| {
            let _ = sender.send(verify_operations(runtime));
        }))
        .map_err(MirraServerError::Scheduling)?;

    match receiver.recv() {
        Ok(result) => result.map_err(MirraServerError::CapabilityProbe),
        Err(_) => Err(MirraServerError::WorkerPanicked),
    }
}
