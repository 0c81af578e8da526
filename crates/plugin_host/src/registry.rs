//! Plugin registry - name to implementation, fixed before scanning starts

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use httpscan_common::{HttpProbe, Plugin};

use crate::builtin;

#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in plugin. Plugins that issue their
    /// own requests go through `probe`.
    pub fn with_builtins(probe: Arc<dyn HttpProbe>) -> Self {
        let mut registry = Self::new();
        for plugin in builtin::builtin_plugins(probe) {
            registry.register(plugin);
        }
        debug!("Registered plugins: {}", registry.names().join(", "));
        registry
    }

    /// Register a plugin under its own name, replacing any previous one.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        let name = plugin.name().to_string();
        if self.plugins.insert(name.clone(), plugin).is_some() {
            warn!("Plugin {} registered twice, keeping the latest", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
