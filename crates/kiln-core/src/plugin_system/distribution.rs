use std::path::PathBuf;

use crate::host::{FileDistributor, Filesystem, HostError};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manifest::PluginDescriptor;
use crate::utils::fs::file_name_has_prefix;

/// File name prefixes of code shared by both realms
pub const SHARED_PREFIXES: &[&str] = &["sh_", "shared"];

/// File name prefixes of client-only code
pub const CLIENT_PREFIXES: &[&str] = &["cl_", "client"];

/// Mark the plugin's shared and/or client files for delivery to remote peers.
///
/// Selection follows the `download_shared`/`download_client` flags: every file
/// below the plugin root whose name carries a matching prefix, plus the
/// declared entrypoint of that realm. Marking continues past individual
/// failures; the first one is returned once every file has been tried.
pub fn distribute(
    descriptor: &PluginDescriptor,
    filesystem: &dyn Filesystem,
    distributor: &dyn FileDistributor,
) -> Result<Vec<PathBuf>, PluginSystemError> {
    let mut prefixes: Vec<&str> = Vec::new();
    let mut entrypoints: Vec<&str> = Vec::new();
    if descriptor.flags.download_shared {
        prefixes.extend_from_slice(SHARED_PREFIXES);
        entrypoints.push(&descriptor.shared);
    }
    if descriptor.flags.download_client {
        prefixes.extend_from_slice(CLIENT_PREFIXES);
        entrypoints.push(&descriptor.client);
    }
    if prefixes.is_empty() {
        return Ok(Vec::new());
    }

    let mut files = filesystem
        .find_recursive(&descriptor.root, &|path| file_name_has_prefix(path, &prefixes))
        .map_err(|e| PluginSystemError::Distribution {
            plugin: descriptor.identifier.clone(),
            message: "cannot search plugin directory".to_string(),
            source: Some(HostError::io(e, "find_recursive", &descriptor.root)),
        })?;
    for entrypoint in entrypoints.into_iter().filter(|e| !e.is_empty()) {
        let path = descriptor.root.join(entrypoint);
        if !files.contains(&path) {
            files.push(path);
        }
    }

    let mut first_error = None;
    let mut marked = Vec::with_capacity(files.len());
    for file in files {
        match distributor.mark_for_client_delivery(&file) {
            Ok(()) => {
                log::trace!(target: "kiln::distribution", "Marked {} for delivery", file.display());
                marked.push(file);
            }
            Err(e) => {
                log::warn!(target: "kiln::distribution", "Cannot mark {} for delivery: {}", file.display(), e);
                first_error.get_or_insert(PluginSystemError::Distribution {
                    plugin: descriptor.identifier.clone(),
                    message: format!("cannot mark '{}' for delivery", file.display()),
                    source: Some(e),
                });
            }
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => {
            log::debug!(
                target: "kiln::distribution",
                "Marked {} file(s) of {} for delivery",
                marked.len(), descriptor.identifier
            );
            Ok(marked)
        }
    }
}
