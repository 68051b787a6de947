use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::SystemTime;

use crate::plugin_system::manifest::PluginDescriptor;

/// A plugin whose boot stages have run
#[derive(Debug, Clone)]
pub struct LoadedPlugin {
    pub descriptor: Arc<PluginDescriptor>,
    pub loaded_at: SystemTime,
}

impl LoadedPlugin {
    pub fn new(descriptor: Arc<PluginDescriptor>) -> Self {
        Self {
            descriptor,
            loaded_at: SystemTime::now(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.descriptor.identifier
    }
}

/// Registry of discovered descriptors and loaded plugins
#[derive(Debug, Default)]
pub struct PluginRegistry {
    /// Descriptors found by the last discovery pass
    available: HashMap<String, Arc<PluginDescriptor>>,
    /// Plugins loaded so far
    loaded: HashMap<String, Arc<LoadedPlugin>>,
    /// Identifiers in registration order
    load_sequence: Vec<String>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the available set. Loaded plugins are kept, even when their
    /// descriptor is gone from the new set.
    pub fn replace_available(&mut self, descriptors: Vec<Arc<PluginDescriptor>>) {
        self.available = descriptors
            .into_iter()
            .map(|descriptor| (descriptor.identifier.clone(), descriptor))
            .collect();
    }

    /// Add a single descriptor; returns `false` if the identifier is taken
    pub fn insert_available(&mut self, descriptor: Arc<PluginDescriptor>) -> bool {
        if self.available.contains_key(&descriptor.identifier) {
            return false;
        }
        self.available.insert(descriptor.identifier.clone(), descriptor);
        true
    }

    pub fn is_available(&self, identifier: &str) -> bool {
        self.available.contains_key(identifier)
    }

    /// Descriptor of an available plugin
    pub fn find_info(&self, identifier: &str) -> Option<Arc<PluginDescriptor>> {
        self.available.get(identifier).cloned()
    }

    pub fn is_loaded(&self, identifier: &str) -> bool {
        self.loaded.contains_key(identifier)
    }

    /// A loaded plugin
    pub fn find(&self, identifier: &str) -> Option<Arc<LoadedPlugin>> {
        self.loaded.get(identifier).cloned()
    }

    /// Record a loaded plugin; an existing registration is returned unchanged
    pub fn register_loaded(&mut self, plugin: LoadedPlugin) -> Arc<LoadedPlugin> {
        if let Some(existing) = self.loaded.get(plugin.identifier()) {
            return existing.clone();
        }
        let identifier = plugin.identifier().to_string();
        let plugin = Arc::new(plugin);
        self.loaded.insert(identifier.clone(), plugin.clone());
        self.load_sequence.push(identifier);
        plugin
    }

    /// Drop a registration, used when a plugin fails to boot
    pub fn unregister(&mut self, identifier: &str) -> Option<Arc<LoadedPlugin>> {
        let removed = self.loaded.remove(identifier)?;
        self.load_sequence.retain(|id| id != identifier);
        Some(removed)
    }

    /// Loaded plugins in the order they were registered
    pub fn loaded_plugins(&self) -> Vec<Arc<LoadedPlugin>> {
        self.load_sequence
            .iter()
            .filter_map(|id| self.loaded.get(id).cloned())
            .collect()
    }

    /// Available descriptors sorted by identifier
    pub fn descriptors(&self) -> Vec<Arc<PluginDescriptor>> {
        let mut descriptors: Vec<_> = self.available.values().cloned().collect();
        descriptors.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        descriptors
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// Identifiers of available plugins declaring a dependency on `identifier`, sorted
    pub fn dependents_of(&self, identifier: &str) -> Vec<String> {
        let mut dependents: Vec<String> = self
            .available
            .values()
            .filter(|descriptor| descriptor.all_dependencies().any(|dep| dep.target == identifier))
            .map(|descriptor| descriptor.identifier.clone())
            .collect();
        dependents.sort();
        dependents
    }

    /// Look for a cycle through hard dependencies reachable from `descriptor`.
    ///
    /// Only available descriptors take part; edges to missing plugins are
    /// ignored. The returned path starts and ends with the same identifier.
    pub fn find_hard_cycle(&self, descriptor: &PluginDescriptor) -> Option<Vec<String>> {
        let mut path = vec![descriptor.identifier.clone()];
        let mut finished = HashSet::new();
        for dep in &descriptor.dependencies {
            if let Some(cycle) = self.visit_hard(&dep.target, &mut path, &mut finished) {
                return Some(cycle);
            }
        }
        None
    }

    fn visit_hard(&self, id: &str, path: &mut Vec<String>, finished: &mut HashSet<String>) -> Option<Vec<String>> {
        if let Some(pos) = path.iter().position(|p| p == id) {
            let mut cycle = path[pos..].to_vec();
            cycle.push(id.to_string());
            return Some(cycle);
        }
        if finished.contains(id) {
            return None;
        }
        let descriptor = self.available.get(id)?;

        path.push(id.to_string());
        for dep in &descriptor.dependencies {
            if let Some(cycle) = self.visit_hard(&dep.target, path, finished) {
                return Some(cycle);
            }
        }
        path.pop();
        finished.insert(id.to_string());
        None
    }
}
