pub mod config;
pub mod host;
pub mod kernel;
pub mod plugin_system;
pub mod stage_manager;
pub mod utils;

// Re-export key public types/traits for easier use by the binary and embedders
pub use config::{ConfigFormat, RuntimeConfig};
pub use host::{CodeHost, FileDistributor, Filesystem};
pub use kernel::Application;
pub use kernel::error::Error as KernelError;
pub use plugin_system::{
    DefaultPluginManager, DependencyConstraint, LoadReport, PluginDescriptor, PluginManager, Version,
    VersionMatcher,
};
pub use stage_manager::{BootContext, BootPipeline, BootStage, CategoryLoader, Realm};
