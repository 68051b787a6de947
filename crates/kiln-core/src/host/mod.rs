//! # Kiln Core Host Interfaces
//!
//! The runtime never touches the filesystem or executes plugin code on its
//! own. Everything it needs from the hosting process goes through the traits
//! in this module:
//!
//! - [`Filesystem`]: directory listing and recursive search, used by discovery
//!   and by file distribution.
//! - [`CodeHost`]: reads plugin metadata files and includes entrypoint files.
//! - [`FileDistributor`]: marks files for delivery to remote peers.
//!
//! [`local`] provides implementations backed by the local filesystem.
pub mod local;

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

pub use local::{DeliveryList, LocalCodeHost, LocalFilesystem};

/// Errors reported by host collaborators
#[derive(Debug, Error)]
pub enum HostError {
    #[error("I/O error during '{operation}' on '{}': {source}", path.display())]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{}' as {format}: {message}", path.display())]
    Parse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported metadata format for '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },
}

impl HostError {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: &Path) -> Self {
        HostError::Io {
            operation: operation.into(),
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Entries of one directory, names only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirListing {
    pub files: Vec<String>,
    pub directories: Vec<String>,
}

/// Directory enumeration provided by the host
pub trait Filesystem: Send + Sync + Debug {
    /// List the direct children of `dir`, split into files and directories
    fn list_entries(&self, dir: &Path) -> std::io::Result<DirListing>;

    /// Recursively collect every file under `dir` accepted by `predicate`
    fn find_recursive(&self, dir: &Path, predicate: &dyn Fn(&Path) -> bool) -> std::io::Result<Vec<PathBuf>>;
}

/// Code inclusion provided by the host
pub trait CodeHost: Send + Sync + Debug {
    /// Read a plugin metadata file into its raw, unvalidated value
    fn read_metadata(&self, path: &Path) -> Result<Value, HostError>;

    /// Load and execute an entrypoint or category file
    fn include(&self, path: &Path) -> Result<(), HostError>;
}

/// Remote delivery marker provided by the host
pub trait FileDistributor: Send + Sync + Debug {
    /// Flag a file for transfer to remote peers
    fn mark_for_client_delivery(&self, path: &Path) -> Result<(), HostError>;
}
