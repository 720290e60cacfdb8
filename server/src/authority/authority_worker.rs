use std::{
    panic::{self, AssertUnwindSafe},
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
};

use log::{error, info, warn};

use mirra_shared::{AuthorityAction, AuthorityScheduler, ForeignRuntime, RuntimeError};

use crate::MirraServerError;

enum AuthorityMessage {
    Run(AuthorityAction),
    Shutdown,
}

/// Producer side of the authority worker's queue. Cheap to clone and usable
/// from any thread.
#[derive(Clone)]
pub struct AuthorityHandle {
    sender: Sender<AuthorityMessage>,
}

impl AuthorityScheduler for AuthorityHandle {
    fn schedule_on_authority_thread(&self, action: AuthorityAction) -> Result<(), RuntimeError> {
        self.sender
            .send(AuthorityMessage::Run(action))
            .map_err(|_| RuntimeError::SchedulerClosed)
    }
}

/// The one thread allowed to touch the foreign runtime.
///
/// The worker owns the runtime and runs scheduled actions one at a time, in
/// the order they were scheduled. A panicking action is logged and the
/// worker carries on with the next one.
pub struct AuthorityWorker {
    handle: AuthorityHandle,
    thread: Option<JoinHandle<()>>,
}

impl AuthorityWorker {
    pub const THREAD_NAME: &'static str = "mirra-authority";

    pub fn spawn<R: ForeignRuntime + Send + 'static>(runtime: R) -> Result<Self, MirraServerError> {
        let (sender, receiver) = mpsc::channel();
        let thread = thread::Builder::new()
            .name(Self::THREAD_NAME.to_string())
            .spawn(move || run(runtime, receiver))
            .map_err(|source| MirraServerError::WorkerSpawn { source })?;

        Ok(Self {
            handle: AuthorityHandle { sender },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> AuthorityHandle {
        self.handle.clone()
    }

    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    /// Lets every action scheduled so far run, then stops the worker and
    /// joins it. Scheduling afterwards fails with `SchedulerClosed`.
    pub fn shutdown(&mut self) -> Result<(), MirraServerError> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        if self.handle.sender.send(AuthorityMessage::Shutdown).is_err() {
            warn!("Authority worker exited before shutdown was requested");
        }
        thread.join().map_err(|_| MirraServerError::WorkerPanicked)
    }
}

impl Drop for AuthorityWorker {
    fn drop(&mut self) {
        if let Err(error) = self.shutdown() {
            error!("{}", error);
        }
    }
}

fn run<R: ForeignRuntime>(runtime: R, receiver: Receiver<AuthorityMessage>) {
    info!("Authority worker started");
    for message in receiver.iter() {
        match message {
            AuthorityMessage::Run(action) => {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| action(&runtime)));
                if outcome.is_err() {
                    error!("Action panicked on the authority thread");
                }
            }
            AuthorityMessage::Shutdown => break,
        }
    }
    info!("Authority worker stopped");
}
