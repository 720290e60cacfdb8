use std::fmt;

use log::{debug, warn};

use crate::{EntityKind, ForeignRuntime, RuntimeError};

/// Identifier of one named call exposed by the foreign runtime.
///
/// Identifiers are resolved by the runtime binding once, at startup, and
/// checked by [`verify_operations`]; the core never locates symbols itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct OperationId(&'static str);

impl OperationId {
    pub const SET_POSITION: OperationId = OperationId("SetPosition");
    pub const BROADCAST_POSITION: OperationId = OperationId("BroadcastPosition");
    pub const SET_IS_STATIC: OperationId = OperationId("SetIsStatic");
    pub const SET_DISPLAY_NAME: OperationId = OperationId("SetDisplayName");
    pub const SET_LINEAR_VELOCITY: OperationId = OperationId("SetLinearVelocity");
    pub const BROADCAST_LINEAR_VELOCITY: OperationId = OperationId("BroadcastLinearVelocity");
    pub const SET_AMOUNT: OperationId = OperationId("SetAmount");
    pub const BROADCAST_AMOUNT: OperationId = OperationId("BroadcastAmount");
    pub const SET_INTEGRITY: OperationId = OperationId("SetIntegrity");
    pub const SET_BATTERY_LEVEL: OperationId = OperationId("SetBatteryLevel");
    pub const BROADCAST_BATTERY_LEVEL: OperationId = OperationId("BroadcastBatteryLevel");
    pub const BROADCAST_SPAWN: OperationId = OperationId("BroadcastSpawn");
    pub const REMOVE: OperationId = OperationId("Remove");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Checks that the runtime exposes every operation any proxy kind may issue.
///
/// Meant to run once on the authority thread before any proxy is created.
/// Every missing `(kind, operation)` pair is reported, not just the first.
pub fn verify_operations(runtime: &dyn ForeignRuntime) -> Result<(), RuntimeError> {
    let mut missing = Vec::new();
    for kind in EntityKind::ALL {
        for operation in kind.operations() {
            if !runtime.has_operation(kind, operation) {
                warn!("Foreign runtime does not expose {} for {:?}", operation, kind);
                missing.push(format!("{:?}.{}", kind, operation));
            }
        }
    }

    if missing.is_empty() {
        debug!("Capability probe passed");
        Ok(())
    } else {
        Err(RuntimeError::MissingOperations { missing })
    }
}
