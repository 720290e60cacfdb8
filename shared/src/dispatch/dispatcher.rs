use std::{
    collections::VecDeque,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use log::{error, trace, warn};

use crate::{AuthorityAction, AuthorityScheduler, DispatcherConfig, ForeignRuntime, Mutation};

/// Outcome of one drain of the mutation queue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub applied: usize,
    pub failed: usize,
}

struct DispatchQueue {
    pending: Mutex<VecDeque<Mutation>>,
    drain_scheduled: AtomicBool,
    scheduler: Option<Arc<dyn AuthorityScheduler>>,
    config: DispatcherConfig,
}

impl DispatchQueue {
    fn pending(&self) -> MutexGuard<'_, VecDeque<Mutation>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(self: &Arc<Self>, mutation: Mutation) {
        trace!("Queueing mutation `{}`", mutation.label());
        let backlog = {
            let mut pending = self.pending();
            pending.push_back(mutation);
            pending.len()
        };

        let threshold = self.config.backlog_warning_threshold;
        if threshold > 0 && backlog % threshold == 0 {
            warn!("Mutation backlog reached {} pending mutations", backlog);
        }

        self.request_drain();
    }

    fn request_drain(self: &Arc<Self>) {
        let Some(scheduler) = &self.scheduler else {
            return;
        };
        if self.drain_scheduled.swap(true, Ordering::AcqRel) {
            return;
        }

        let queue = Arc::clone(self);
        let action: AuthorityAction = Box::new(move |runtime: &dyn ForeignRuntime| {
            queue.drain(runtime);
        });
        if let Err(error) = scheduler.schedule_on_authority_thread(action) {
            self.drain_scheduled.store(false, Ordering::Release);
            warn!("Could not schedule mutation drain: {}. Mutations stay queued", error);
        }
    }

    fn drain(&self, runtime: &dyn ForeignRuntime) -> DrainReport {
        // cleared first so anything queued while draining schedules a new drain
        self.drain_scheduled.store(false, Ordering::Release);

        let mut report = DrainReport::default();
        loop {
            let Some(mutation) = self.pending().pop_front() else {
                break;
            };
            let (label, apply) = mutation.into_parts();

            let outcome = if self.config.catch_panics {
                panic::catch_unwind(AssertUnwindSafe(|| apply(runtime)))
            } else {
                Ok(apply(runtime))
            };

            match outcome {
                Ok(Ok(())) => {
                    report.applied += 1;
                }
                Ok(Err(error)) => {
                    warn!("Mutation `{}` failed: {}", label, error);
                    report.failed += 1;
                }
                Err(_) => {
                    error!("Mutation `{}` panicked on the authority thread", label);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

/// Single FIFO queue serializing every outgoing write into the foreign runtime.
///
/// Any thread may enqueue through a [`MutationSender`]. Draining happens on
/// the authority thread only: with a scheduler, the dispatcher schedules a
/// drain whenever work arrives; without one (`manual`), the owner calls
/// [`MutationDispatcher::drain`] from the authority thread itself.
///
/// A failed mutation is logged and dropped; the queue moves on. There is no
/// retry and no cancellation.
pub struct MutationDispatcher {
    queue: Arc<DispatchQueue>,
}

impl MutationDispatcher {
    pub fn new(config: DispatcherConfig, scheduler: Arc<dyn AuthorityScheduler>) -> Self {
        Self::build(config, Some(scheduler))
    }

    pub fn manual(config: DispatcherConfig) -> Self {
        Self::build(config, None)
    }

    fn build(config: DispatcherConfig, scheduler: Option<Arc<dyn AuthorityScheduler>>) -> Self {
        Self {
            queue: Arc::new(DispatchQueue {
                pending: Mutex::new(VecDeque::new()),
                drain_scheduled: AtomicBool::new(false),
                scheduler,
                config,
            }),
        }
    }

    pub fn sender(&self) -> MutationSender {
        MutationSender {
            queue: Arc::clone(&self.queue),
        }
    }

    /// Runs every queued mutation in FIFO order. Must be called on the
    /// authority thread.
    pub fn drain(&self, runtime: &dyn ForeignRuntime) -> DrainReport {
        self.queue.drain(runtime)
    }

    pub fn pending_len(&self) -> usize {
        self.queue.pending().len()
    }
}

/// Producer side of a [`MutationDispatcher`]. Cheap to clone, usable from any
/// thread, never blocks on the foreign runtime.
#[derive(Clone)]
pub struct MutationSender {
    queue: Arc<DispatchQueue>,
}

impl MutationSender {
    pub fn enqueue(&self, mutation: Mutation) {
        self.queue.push(mutation);
    }

    pub fn pending_len(&self) -> usize {
        self.queue.pending().len()
    }
}
