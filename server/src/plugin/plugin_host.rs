use indexmap::IndexMap;
use log::info;

use crate::{MirraServerError, Plugin, PluginContext, PluginInfo};

/// Holds registered plugins and drives them in registration order.
#[derive(Default)]
pub struct PluginHost {
    plugins: IndexMap<&'static str, Box<dyn Plugin>>,
    started: bool,
}

impl PluginHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `plugin`. If the host has already started, the plugin is
    /// initialized right away.
    pub fn register(
        &mut self,
        mut plugin: Box<dyn Plugin>,
        context: &PluginContext,
    ) -> Result<(), MirraServerError> {
        let PluginInfo { id, name, version } = plugin.info();
        if self.plugins.contains_key(id) {
            return Err(MirraServerError::DuplicatePlugin { id });
        }

        info!("Registered plugin {} {} ({})", name, version, id);
        if self.started {
            plugin.init(context);
        }
        self.plugins.insert(id, plugin);
        Ok(())
    }

    pub fn start(&mut self, context: &PluginContext) {
        if self.started {
            return;
        }
        self.started = true;
        for plugin in self.plugins.values_mut() {
            plugin.init(context);
        }
    }

    pub fn update(&mut self, context: &PluginContext) {
        if !self.started {
            return;
        }
        for plugin in self.plugins.values_mut() {
            plugin.update(context);
        }
    }

    pub fn shutdown(&mut self, context: &PluginContext) {
        if !self.started {
            return;
        }
        self.started = false;
        for plugin in self.plugins.values_mut().rev() {
            plugin.shutdown(context);
        }
    }

    pub fn infos(&self) -> Vec<PluginInfo> {
        self.plugins.values().map(|plugin| plugin.info()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
