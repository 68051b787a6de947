use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ConfigFormat;
use crate::host::{CodeHost, Filesystem, HostError};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manifest::{DescriptorDefaults, PluginDescriptor};

/// Outcome of one discovery pass
#[derive(Debug, Default)]
pub struct Discovery {
    /// Valid descriptors, in directory order, identifiers unique
    pub descriptors: Vec<Arc<PluginDescriptor>>,
    /// Plugins left out, keyed by folder name
    pub skipped: Vec<(String, PluginSystemError)>,
}

/// Finds plugins below a root directory.
///
/// Every sub-directory `<root>/<name>` is a plugin whose metadata lives next
/// to it in `<root>/<name>.json` (or `.toml`, `.yaml`, `.yml`).
#[derive(Debug, Clone)]
pub struct PluginLoader {
    filesystem: Arc<dyn Filesystem>,
    host: Arc<dyn CodeHost>,
}

impl PluginLoader {
    pub fn new(filesystem: Arc<dyn Filesystem>, host: Arc<dyn CodeHost>) -> Self {
        Self { filesystem, host }
    }

    /// Discover and validate every plugin below `root`.
    ///
    /// A plugin directory without a metadata file aborts the whole pass.
    /// Invalid metadata and duplicate identifiers only skip the plugin
    /// concerned.
    pub fn locate_all(&self, root: &Path, defaults: &DescriptorDefaults) -> Result<Discovery, PluginSystemError> {
        log::info!(target: "kiln::loader", "Scanning for plugins in {}", root.display());

        let listing = self.filesystem.list_entries(root).map_err(|e| PluginSystemError::Discovery {
            path: root.to_path_buf(),
            message: "cannot list plugin root".to_string(),
            source: Some(HostError::io(e, "list_entries", root)),
        })?;

        let mut folders = listing.directories.clone();
        folders.sort();

        // Resolve every metadata path first so a missing file leaves nothing half-read.
        let mut located = Vec::with_capacity(folders.len());
        for folder in &folders {
            let metadata = metadata_file(root, folder, &listing.files).ok_or_else(|| PluginSystemError::Discovery {
                path: root.join(folder),
                message: format!(
                    "plugin directory '{}' has no metadata file ({})",
                    folder,
                    supported_extensions().join(", ")
                ),
                source: None,
            })?;
            located.push((folder, metadata));
        }

        let mut discovery = Discovery::default();
        for (folder, metadata) in located {
            match self.read_descriptor(root, folder, &metadata, defaults) {
                Ok(descriptor) => {
                    if let Some(existing) = discovery
                        .descriptors
                        .iter()
                        .find(|d| d.identifier == descriptor.identifier)
                    {
                        let error = PluginSystemError::Validation {
                            plugin: folder.clone(),
                            message: format!(
                                "identifier '{}' is already declared by folder '{}'",
                                descriptor.identifier, existing.folder
                            ),
                        };
                        log::error!(target: "kiln::loader", "{}", error);
                        discovery.skipped.push((folder.clone(), error));
                        continue;
                    }
                    log::debug!(
                        target: "kiln::loader",
                        "Found plugin {} v{} in '{}'",
                        descriptor.identifier, descriptor.version, folder
                    );
                    discovery.descriptors.push(Arc::new(descriptor));
                }
                Err(error) => {
                    log::error!(target: "kiln::loader", "Skipping plugin '{}': {}", folder, error);
                    discovery.skipped.push((folder.clone(), error));
                }
            }
        }

        log::info!(
            target: "kiln::loader",
            "Discovered {} plugin(s), skipped {}",
            discovery.descriptors.len(),
            discovery.skipped.len()
        );
        Ok(discovery)
    }

    fn read_descriptor(
        &self,
        root: &Path,
        folder: &str,
        metadata: &Path,
        defaults: &DescriptorDefaults,
    ) -> Result<PluginDescriptor, PluginSystemError> {
        let raw = self.host.read_metadata(metadata).map_err(|e| PluginSystemError::Validation {
            plugin: folder.to_string(),
            message: e.to_string(),
        })?;
        PluginDescriptor::from_raw(folder, &root.join(folder), &raw, defaults)
    }
}

fn supported_extensions() -> Vec<&'static str> {
    ConfigFormat::all()
        .iter()
        .flat_map(|format| format.extensions().iter().copied())
        .collect()
}

/// First `<folder>.<ext>` present among `files`, in format priority order
fn metadata_file(root: &Path, folder: &str, files: &[String]) -> Option<PathBuf> {
    let mut candidates = supported_extensions()
        .into_iter()
        .map(|ext| format!("{}.{}", folder, ext))
        .filter(|name| files.contains(name));
    let chosen = candidates.next()?;
    for ignored in candidates {
        log::warn!(target: "kiln::loader", "Ignoring '{}', using '{}'", ignored, chosen);
    }
    Some(root.join(chosen))
}
