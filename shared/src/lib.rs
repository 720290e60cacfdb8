//! # Mirra Shared
//! Keeps typed, locally owned proxies in sync with objects living in a
//! foreign runtime, and serializes every write back into it.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

mod definition;
mod dispatch;
mod runtime;
mod types;
mod world;


pub use definition::{
    definition_store::DefinitionStore,
    error::DefinitionError,
    object_definition::{ObjectDefinition, PropertyValue, Vec3},
    sector_definition::{SectorDefinition, SectorEvent},
};
pub use dispatch::{
    dispatcher::{DrainReport, MutationDispatcher, MutationSender},
    dispatcher_config::DispatcherConfig,
    mutation::Mutation,
};
pub use runtime::{
    error::RuntimeError,
    foreign_runtime::{AuthorityAction, AuthorityScheduler, ForeignRuntime},
    operation::{verify_operations, OperationId},
};
pub use types::{Domain, EntityId, ForeignHandle};
pub use world::{
    entity::{
        entity_kind::{EntityKind, KindFilter},
        kinds::{
            Character, CubeGrid, FloatingObject, Meteor, ProxyKind, UnknownObject, VoxelMap,
        },
        proxy::{ForeignWrite, Proxy},
    },
    entity_manager::EntityManager,
    error::ManagerError,
    identity_map::IdentityMap,
    reconciler::{ReconcileOutcome, ReconcileReport},
    sector::Sector,
};

cfg_if! {
    if #[cfg(feature = "json_store")] {
        pub use definition::json_store::JsonDefinitionStore;
    }
}
