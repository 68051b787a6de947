//! # Kiln Core Plugin System Errors
//!
//! Defines error types specific to the Kiln Plugin System.
//!
//! [`PluginSystemError`] covers the whole plugin lifecycle: metadata
//! validation, discovery, dependency resolution, boot configuration,
//! file distribution and stage execution. Only [`PluginSystemError::Discovery`]
//! aborts a whole discovery pass; the others are scoped to one plugin.
use std::path::PathBuf;

use crate::host::HostError;
use crate::plugin_system::dependency::DependencyError;
use crate::stage_manager::error::StageSystemError;

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Invalid metadata for plugin '{plugin}': {message}")]
    Validation {
        plugin: String,
        message: String,
    },

    #[error("Plugin discovery failed at '{}': {message}", path.display())]
    Discovery {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<HostError>,
    },

    #[error("Dependency resolution failed: {0}")]
    Dependency(#[from] DependencyError),

    #[error("Invalid boot configuration for plugin '{plugin}': {source}")]
    Configuration {
        plugin: String,
        #[source]
        source: StageSystemError,
    },

    #[error("File distribution failed for plugin '{plugin}': {message}")]
    Distribution {
        plugin: String,
        message: String,
        #[source]
        source: Option<HostError>,
    },

    #[error("Boot stage failed for plugin '{plugin}': {source}")]
    Stage {
        plugin: String,
        #[source]
        source: StageSystemError,
    },

    #[error("Plugin '{0}' is not available")]
    NotAvailable(String),
}

