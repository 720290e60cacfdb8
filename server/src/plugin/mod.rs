mod plugin;
pub use plugin::{Plugin, PluginContext, PluginInfo};

mod plugin_host;
pub use plugin_host::PluginHost;
