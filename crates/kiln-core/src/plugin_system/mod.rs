//! # Kiln Core Plugin System
//!
//! Discovery, validation, dependency resolution and loading of plugins.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`version`]**: the plugin [`Version`] and the [`VersionMatcher`]
//!   operators used by dependency declarations.
//! - **[`dependency`]**: [`DependencyConstraint`] and its declaration syntax.
//! - **[`manifest`]**: validated plugin metadata ([`PluginDescriptor`]).
//! - **[`loader`]**: discovery of plugin directories and their metadata files.
//! - **[`registry`]**: available descriptors and loaded plugins ([`PluginRegistry`]).
//! - **[`distribution`]**: marking shared and client files for remote delivery.
//! - **[`manager`]**: the [`PluginManager`] façade, resolving dependencies and
//!   booting each plugin through the stage pipeline.
//! - **[`error`]**: [`PluginSystemError`](error::PluginSystemError).
pub mod dependency;
pub mod distribution;
pub mod error;
pub mod loader;
pub mod manager;
pub mod manifest;
pub mod registry;
pub mod version;

pub use dependency::{DependencyConstraint, DependencyError};
pub use error::PluginSystemError;
pub use loader::{Discovery, PluginLoader};
pub use manager::{DefaultPluginManager, LoadReport, PluginManager};
pub use manifest::{BootFlags, DescriptorDefaults, ManifestBuilder, PluginDescriptor};
pub use registry::{LoadedPlugin, PluginRegistry};
pub use version::{Version, VersionMatcher};

// Test module declaration
#[cfg(test)]
mod tests;
