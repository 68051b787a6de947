//! # Kiln Core Runtime Configuration
//!
//! [`RuntimeConfig`] gathers what the runtime needs before discovery: the
//! plugin root, the realm flags gating `server`/`client` boot stages, and the
//! [`DescriptorDefaults`] template applied to metadata fields a plugin leaves
//! out. It is read from JSON, TOML or YAML depending on the file extension.
pub mod error;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::kernel::constants;
use crate::plugin_system::manifest::DescriptorDefaults;
use crate::stage_manager::context::Realm;
use crate::utils::file_extension;

pub use error::ConfigError;

/// Supported configuration and metadata file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Every format compiled into this build, in lookup priority order
    pub fn all() -> &'static [ConfigFormat] {
        &[
            ConfigFormat::Json,
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml,
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml,
        ]
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Extensions accepted for this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ConfigFormat::Json => &["json"],
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => &["yaml", "yml"],
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => &["toml"],
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = file_extension(path)?;
        ConfigFormat::all()
            .iter()
            .copied()
            .find(|format| format.extensions().contains(&ext.as_str()))
    }

    /// Deserialize `content` in this format
    pub fn deserialize<T: DeserializeOwned>(&self, content: &str) -> Result<T, String> {
        match self {
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    /// Parse `content` into an untyped value
    pub fn parse_value(&self, content: &str) -> Result<serde_json::Value, String> {
        self.deserialize(content)
    }
}

/// Settings read once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Directory holding one sub-directory per plugin plus its metadata file
    pub plugin_root: PathBuf,
    /// Which side(s) this process acts as
    pub realm: Realm,
    /// Template for metadata fields a plugin does not declare
    pub defaults: DescriptorDefaults,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            plugin_root: PathBuf::from(constants::DEFAULT_PLUGINS_DIR),
            realm: Realm::default(),
            defaults: DescriptorDefaults::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load a configuration file; the format follows the extension
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RuntimeConfig = format.deserialize(&content).map_err(|message| ConfigError::Deserialization {
            path: path.to_path_buf(),
            format: format.extension().to_string(),
            message,
        })?;
        log::debug!(target: "kiln::config", "Loaded runtime configuration from {}", path.display());
        Ok(config)
    }

    /// Set the plugin root
    pub fn with_plugin_root(mut self, plugin_root: impl Into<PathBuf>) -> Self {
        self.plugin_root = plugin_root.into();
        self
    }

    /// Set the realm flags
    pub fn with_realm(mut self, realm: Realm) -> Self {
        self.realm = realm;
        self
    }
}
