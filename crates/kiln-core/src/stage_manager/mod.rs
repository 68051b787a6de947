//! # Kiln Core Boot Stages
//!
//! A plugin boots by running the stage tags of its `load_order`, strictly in
//! declared order. Each tag maps to one [`BootStage`]; the
//! [`BootPipeline`](pipeline::BootPipeline) dispatches every stage to its
//! handler and stops at the first unknown tag or failing handler.
//!
//! `shared`, `server` and `client` include the plugin's entrypoint files
//! through the host. The game-object categories (`classes`, `libraries`,
//! `weapons`, `entities`, `effects`) are delegated to pluggable
//! [`CategoryLoader`]s.
pub mod context;
pub mod core_stages;
pub mod error;
pub mod pipeline;

use std::fmt;
use std::str::FromStr;

use crate::plugin_system::manifest::PluginDescriptor;
use crate::stage_manager::error::StageSystemError;

/// One named phase of a plugin's activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BootStage {
    Classes,
    Libraries,
    Shared,
    Server,
    Client,
    Weapons,
    Entities,
    Effects,
}

impl BootStage {
    /// All stages, in the order of the default load order
    pub const ALL: [BootStage; 8] = [
        BootStage::Classes,
        BootStage::Libraries,
        BootStage::Shared,
        BootStage::Server,
        BootStage::Client,
        BootStage::Weapons,
        BootStage::Entities,
        BootStage::Effects,
    ];

    /// The tag used in `load_order`
    pub fn id(&self) -> &'static str {
        match self {
            BootStage::Classes => "classes",
            BootStage::Libraries => "libraries",
            BootStage::Shared => "shared",
            BootStage::Server => "server",
            BootStage::Client => "client",
            BootStage::Weapons => "weapons",
            BootStage::Entities => "entities",
            BootStage::Effects => "effects",
        }
    }

    /// Whether the stage is handled by a [`CategoryLoader`]
    pub fn is_category(&self) -> bool {
        !matches!(self, BootStage::Shared | BootStage::Server | BootStage::Client)
    }
}

impl FromStr for BootStage {
    type Err = StageSystemError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        BootStage::ALL
            .iter()
            .copied()
            .find(|stage| stage.id().eq_ignore_ascii_case(tag.trim()))
            .ok_or_else(|| StageSystemError::UnknownStage { tag: tag.to_string() })
    }
}

impl fmt::Display for BootStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Result of a stage execution
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageResult {
    /// Stage executed successfully
    Success,
    /// Stage was skipped
    Skipped(String),
}

impl fmt::Display for StageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageResult::Success => write!(f, "Success"),
            StageResult::Skipped(reason) => write!(f, "Skipped: {}", reason),
        }
    }
}

/// Loads one game-object category of a plugin
pub trait CategoryLoader: Send + Sync + fmt::Debug {
    /// Load `stage`'s code for `descriptor`
    fn load(
        &self,
        stage: BootStage,
        descriptor: &PluginDescriptor,
        context: &mut context::BootContext,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;
}

// Re-export important types
pub use context::{BootContext, ObjectStore, Realm};
pub use core_stages::DirectoryCategoryLoader;
pub use pipeline::BootPipeline;

// Test module declaration
#[cfg(test)]
mod tests;
