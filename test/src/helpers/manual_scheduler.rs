use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use mirra_shared::{AuthorityAction, AuthorityScheduler, ForeignRuntime, RuntimeError};

/// An authority "thread" the test drives by hand: scheduled actions only run
/// when `run_pending` is called.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Arc<Mutex<VecDeque<AuthorityAction>>>,
    closed: Arc<Mutex<bool>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs scheduled actions, including any scheduled while running, until
    /// none are left. Returns how many ran.
    pub fn run_pending(&self, runtime: &dyn ForeignRuntime) -> usize {
        let mut ran = 0;
        loop {
            let Some(action) = self.queue.lock().unwrap().pop_front() else {
                return ran;
            };
            action(runtime);
            ran += 1;
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Makes every later `schedule_on_authority_thread` fail.
    pub fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }
}

impl AuthorityScheduler for ManualScheduler {
    fn schedule_on_authority_thread(&self, action: AuthorityAction) -> Result<(), RuntimeError> {
        if *self.closed.lock().unwrap() {
            return Err(RuntimeError::SchedulerClosed);
        }
        self.queue.lock().unwrap().push_back(action);
        Ok(())
    }
}
