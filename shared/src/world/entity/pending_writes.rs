use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::world::entity::proxy::ForeignWrite;

struct PendingState {
    generations: HashMap<&'static str, (u64, ForeignWrite)>,
    changed: Option<u64>,
    next_generation: u64,
}

impl PendingState {
    fn advance(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// A dispatch stamped `generation` consumes any change mark made before it.
    fn consume_changed(&mut self, generation: u64) {
        if self.changed.is_some_and(|marked| marked <= generation) {
            self.changed = None;
        }
    }
}

/// Dirty tracking for one proxy.
///
/// Every accepted write stamps its property with a fresh generation. The
/// dispatched mutation clears the stamp only if it still carries the same
/// generation, so a newer write queued behind it keeps the property dirty.
/// An explicit change mark draws from the same counter and is consumed by the
/// first mutation of this proxy dispatched after it.
pub(crate) struct PendingWrites {
    state: Mutex<PendingState>,
}

impl PendingWrites {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PendingState {
                generations: HashMap::new(),
                changed: None,
                next_generation: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, PendingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mark(&self, key: &'static str, write: ForeignWrite) -> u64 {
        let mut state = self.state();
        let generation = state.advance();
        state.generations.insert(key, (generation, write));
        generation
    }

    pub fn mark_changed(&self) {
        let mut state = self.state();
        let generation = state.advance();
        state.changed = Some(generation);
    }

    /// Latest generation handed out so far.
    pub fn watermark(&self) -> u64 {
        self.state().next_generation
    }

    /// Records that the write of `key` stamped `generation` was dispatched.
    pub fn dispatched(&self, key: &str, generation: u64) -> bool {
        let mut state = self.state();
        state.consume_changed(generation);
        if state
            .generations
            .get(key)
            .is_some_and(|(current, _)| *current == generation)
        {
            state.generations.remove(key);
            return true;
        }
        false
    }

    /// Records that everything stamped up to `watermark` was dispatched at
    /// once, as when a staged proxy is spawned from a captured definition.
    pub fn dispatched_through(&self, watermark: u64) {
        let mut state = self.state();
        state.consume_changed(watermark);
        state
            .generations
            .retain(|_, (generation, _)| *generation > watermark);
    }

    /// Writes not dispatched yet, oldest first.
    pub fn outstanding(&self) -> Vec<(&'static str, u64, ForeignWrite)> {
        let mut outstanding: Vec<_> = self
            .state()
            .generations
            .iter()
            .map(|(key, (generation, write))| (*key, *generation, *write))
            .collect();
        outstanding.sort_by_key(|(_, generation, _)| *generation);
        outstanding
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state().generations.contains_key(key)
    }

    pub fn is_changed(&self) -> bool {
        self.state().changed.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.state().generations.is_empty()
    }
}
