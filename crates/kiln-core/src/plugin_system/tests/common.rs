#![cfg(test)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::config::RuntimeConfig;
use crate::host::{CodeHost, DeliveryList, HostError, LocalCodeHost, LocalFilesystem};
use crate::plugin_system::manager::DefaultPluginManager;
use crate::stage_manager::Realm;

/// Code host reading real metadata files but only recording inclusions
#[derive(Debug, Default)]
pub struct RecordingHost {
    metadata: LocalCodeHost,
    included: Mutex<Vec<PathBuf>>,
    failing: Mutex<Vec<PathBuf>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `include` fail for `path`
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.failing.lock().unwrap().push(path.into());
    }

    pub fn included(&self) -> Vec<PathBuf> {
        self.included.lock().unwrap().clone()
    }

    /// Included paths relative to `root`, as strings
    pub fn included_relative(&self, root: &Path) -> Vec<String> {
        self.included()
            .iter()
            .map(|p| p.strip_prefix(root).unwrap_or(p).to_string_lossy().replace('\\', "/"))
            .collect()
    }
}

impl CodeHost for RecordingHost {
    fn read_metadata(&self, path: &Path) -> Result<Value, HostError> {
        self.metadata.read_metadata(path)
    }

    fn include(&self, path: &Path) -> Result<(), HostError> {
        if self.failing.lock().unwrap().iter().any(|p| p == path) {
            return Err(HostError::NotFound { path: path.to_path_buf() });
        }
        self.included.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

/// Write `<root>/<folder>.json` and create `<root>/<folder>/`
pub fn write_plugin(root: &Path, folder: &str, metadata: Value) -> PathBuf {
    let dir = root.join(folder);
    fs::create_dir_all(&dir).unwrap();
    fs::write(root.join(format!("{}.json", folder)), serde_json::to_string_pretty(&metadata).unwrap()).unwrap();
    dir
}

/// Minimal valid metadata for `grp/<plugin>`
pub fn metadata(plugin: &str, version: &str) -> Value {
    serde_json::json!({
        "GroupID": "grp",
        "PluginID": plugin,
        "Version": version,
        "Name": plugin,
        "LoadOrder": ["shared"],
        "Shared": "sh_init.lua",
    })
}

/// Manager over `root` with a recording host
pub struct Fixture {
    pub manager: DefaultPluginManager,
    pub host: Arc<RecordingHost>,
    pub delivery: Arc<DeliveryList>,
}

pub fn fixture(root: &Path, realm: Realm) -> Fixture {
    let config = RuntimeConfig::default().with_plugin_root(root).with_realm(realm);
    let host = Arc::new(RecordingHost::new());
    let delivery = Arc::new(DeliveryList::new());
    let manager = DefaultPluginManager::new(&config, Arc::new(LocalFilesystem), host.clone(), delivery.clone());
    Fixture { manager, host, delivery }
}
