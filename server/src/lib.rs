//! # Mirra Server
//! Hosts the authority worker that owns the foreign runtime, drives periodic
//! reconciliation of the mirrored objects and runs plugins.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod shared {
    pub use mirra_shared::{
        CubeGrid, DefinitionStore, Domain, EntityId, EntityKind, EntityManager, FloatingObject,
        ForeignHandle, ForeignRuntime, Meteor, ObjectDefinition, PropertyValue, Proxy, ProxyKind,
        Sector, Vec3,
    };

    cfg_if! {
        if #[cfg(feature = "json_store")] {
            pub use mirra_shared::JsonDefinitionStore;
        }
    }
}

mod authority;
mod error;
mod events;
mod plugin;
mod server;

pub use authority::{AuthorityHandle, AuthorityWorker};
pub use error::MirraServerError;
pub use events::ServerEvent;
pub use plugin::{Plugin, PluginContext, PluginHost, PluginInfo};
pub use server::{MirrorServer, ServerConfig};
