use std::time::Instant;

use mirra_shared::{EntityManager, MutationSender};

/// Identifies a plugin to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PluginInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub version: &'static str,
}

/// Everything a plugin is allowed to reach, handed to it on every callback.
pub struct PluginContext<'a> {
    objects: &'a EntityManager,
    sender: &'a MutationSender,
    now: Instant,
}

impl<'a> PluginContext<'a> {
    pub fn new(objects: &'a EntityManager, sender: &'a MutationSender, now: Instant) -> Self {
        Self {
            objects,
            sender,
            now,
        }
    }

    /// The live objects mirrored by the server.
    pub fn objects(&self) -> &EntityManager {
        self.objects
    }

    /// Queue for writes that are not tied to a proxy setter.
    pub fn sender(&self) -> &MutationSender {
        self.sender
    }

    pub fn now(&self) -> Instant {
        self.now
    }
}

/// Extension hosted by a `MirrorServer`.
///
/// Callbacks run on the thread driving the server, never on the authority
/// thread. Plugins change foreign state through proxy setters or the
/// context's sender like any other caller.
pub trait Plugin {
    fn info(&self) -> PluginInfo;

    fn init(&mut self, _context: &PluginContext) {}

    fn update(&mut self, _context: &PluginContext) {}

    fn shutdown(&mut self, _context: &PluginContext) {}
}
