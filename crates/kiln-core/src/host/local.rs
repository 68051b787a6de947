use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;

use crate::config::ConfigFormat;
use crate::host::{CodeHost, DirListing, FileDistributor, Filesystem, HostError};
use crate::utils::fs::find_files;

/// Filesystem collaborator backed by `std::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn list_entries(&self, dir: &Path) -> std::io::Result<DirListing> {
        let mut listing = DirListing::default();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Follows symlinks, unlike `DirEntry::file_type`
            let metadata = match fs::metadata(entry.path()) {
                Ok(metadata) => metadata,
                Err(e) => {
                    log::warn!(target: "kiln::host", "Ignoring {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            if metadata.is_dir() {
                listing.directories.push(name);
            } else if metadata.is_file() {
                listing.files.push(name);
            }
        }
        // read_dir order is platform dependent
        listing.files.sort();
        listing.directories.sort();
        Ok(listing)
    }

    fn find_recursive(&self, dir: &Path, predicate: &dyn Fn(&Path) -> bool) -> std::io::Result<Vec<PathBuf>> {
        let mut found = find_files(dir, predicate)?;
        found.sort();
        Ok(found)
    }
}

/// Code host reading metadata as JSON/TOML/YAML.
///
/// Entrypoint inclusion reads the file and records it; executing plugin code
/// is left to embedders that wrap or replace this host.
#[derive(Debug, Default)]
pub struct LocalCodeHost {
    included: Mutex<Vec<PathBuf>>,
}

impl LocalCodeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files included so far, in inclusion order
    pub fn included(&self) -> Vec<PathBuf> {
        self.included.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl CodeHost for LocalCodeHost {
    fn read_metadata(&self, path: &Path) -> Result<Value, HostError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| HostError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let content = fs::read_to_string(path).map_err(|e| HostError::io(e, "read_metadata", path))?;
        format.parse_value(&content).map_err(|message| HostError::Parse {
            path: path.to_path_buf(),
            format: format.extension().to_string(),
            message,
        })
    }

    fn include(&self, path: &Path) -> Result<(), HostError> {
        if !path.is_file() {
            return Err(HostError::NotFound { path: path.to_path_buf() });
        }
        fs::read(path).map_err(|e| HostError::io(e, "include", path))?;
        log::trace!(target: "kiln::host", "Included {}", path.display());
        if let Ok(mut included) = self.included.lock() {
            included.push(path.to_path_buf());
        }
        Ok(())
    }
}

/// Distributor that records every marked file
#[derive(Debug, Default)]
pub struct DeliveryList {
    marked: Mutex<Vec<PathBuf>>,
}

impl DeliveryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files marked for delivery so far
    pub fn marked(&self) -> Vec<PathBuf> {
        self.marked.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl FileDistributor for DeliveryList {
    fn mark_for_client_delivery(&self, path: &Path) -> Result<(), HostError> {
        if let Ok(mut marked) = self.marked.lock() {
            if !marked.iter().any(|p| p == path) {
                marked.push(path.to_path_buf());
            }
        }
        Ok(())
    }
}
