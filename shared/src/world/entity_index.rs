use std::sync::Arc;

use indexmap::IndexMap;
use log::warn;

use crate::{world::identity_map::IdentityMap, EntityId, Proxy};

/// The unit a manager publishes atomically: its main index plus the identity
/// map derived from it.
#[derive(Clone, Default)]
pub(crate) struct EntityIndex {
    pub entries: IndexMap<EntityId, Arc<Proxy>>,
    pub identity: IdentityMap,
}

impl EntityIndex {
    /// Builds an index over `entries`, dropping disposed proxies and rebuilding
    /// the identity map from scratch. A proxy whose handle is already claimed
    /// by an earlier entry is disposed and dropped.
    pub fn rebuild(entries: IndexMap<EntityId, Arc<Proxy>>) -> Self {
        let mut identity = IdentityMap::new();
        let mut kept = IndexMap::with_capacity(entries.len());

        for (id, proxy) in entries {
            if proxy.is_disposed() {
                continue;
            }
            if let Some(handle) = proxy.foreign_handle() {
                if let Err(error) = identity.bind(handle, Arc::clone(&proxy)) {
                    warn!("{}; dropping entity {}", error, id);
                    proxy.dispose();
                    continue;
                }
            }
            kept.insert(id, proxy);
        }

        Self {
            entries: kept,
            identity,
        }
    }

    pub fn holds(&self, proxy: &Proxy) -> bool {
        self.entries
            .get(&proxy.id())
            .is_some_and(|entry| std::ptr::eq(Arc::as_ptr(entry), proxy))
    }
}
