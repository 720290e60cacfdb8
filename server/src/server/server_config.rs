use std::{default::Default, time::Duration};

use mirra_shared::DispatcherConfig;

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// How often `tick` schedules a reconciliation pass of the live objects
    pub reconcile_interval: Duration,
    /// Determines whether to run the capability probe at startup and refuse
    /// to start when the foreign runtime is missing operations
    pub verify_operations: bool,
    /// Used to configure the mutation dispatcher
    pub dispatcher: DispatcherConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(1),
            verify_operations: true,
            dispatcher: DispatcherConfig::default(),
        }
    }
}
