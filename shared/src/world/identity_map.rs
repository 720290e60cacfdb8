use std::{collections::HashMap, sync::Arc};

use crate::{world::error::ManagerError, ForeignHandle, Proxy};

/// Reverse index from a foreign handle to the proxy mirroring it.
///
/// Together with a manager's main index this forms a bijection over
/// non-disposed, bound proxies. It is rebuilt wholesale once per
/// reconciliation pass and published with the main index in a single swap.
#[derive(Clone, Default)]
pub struct IdentityMap {
    by_handle: HashMap<ForeignHandle, Arc<Proxy>>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, handle: &ForeignHandle) -> Option<&Arc<Proxy>> {
        self.by_handle.get(handle)
    }

    /// Associates `handle` with `proxy`. Re-binding the same proxy is a no-op;
    /// binding a handle already held by another proxy fails.
    pub fn bind(&mut self, handle: ForeignHandle, proxy: Arc<Proxy>) -> Result<(), ManagerError> {
        if let Some(bound) = self.by_handle.get(&handle) {
            if Arc::ptr_eq(bound, &proxy) {
                return Ok(());
            }
            return Err(ManagerError::IdentityMismatch {
                handle,
                bound: bound.id(),
                claimed: proxy.id(),
            });
        }
        self.by_handle.insert(handle, proxy);
        Ok(())
    }

    pub fn unbind(&mut self, handle: &ForeignHandle) -> Option<Arc<Proxy>> {
        self.by_handle.remove(handle)
    }

    pub fn unbind_all(&mut self) {
        self.by_handle.clear();
    }

    pub fn contains(&self, handle: &ForeignHandle) -> bool {
        self.by_handle.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ForeignHandle, &Arc<Proxy>)> {
        self.by_handle.iter()
    }
}
