use std::io;

use thiserror::Error;

use mirra_shared::RuntimeError;

/// Errors that can occur while starting or driving a `MirrorServer`
#[derive(Debug, Error)]
pub enum MirraServerError {
    /// The authority worker thread could not be spawned
    #[error("Failed to spawn the authority worker: {source}")]
    WorkerSpawn {
        #[source]
        source: io::Error,
    },

    /// The authority worker thread panicked and could not be joined
    #[error("Authority worker panicked")]
    WorkerPanicked,

    /// The foreign runtime does not expose every operation the proxies use
    #[error("Capability probe failed: {0}")]
    CapabilityProbe(#[source] RuntimeError),

    /// A plugin with the same id is already registered
    #[error("Plugin `{id}` is already registered")]
    DuplicatePlugin { id: &'static str },

    /// Work could not be handed to the authority thread
    #[error("Failed to schedule work on the authority thread: {0}")]
    Scheduling(#[source] RuntimeError),
}
