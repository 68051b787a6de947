//! # Kiln Core Kernel Errors
//!
//! [`Error`] is the top-level error of the runtime. Each subsystem keeps its
//! own typed error and converts into it through `#[from]`, so callers driving
//! the whole application deal with a single type.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::ConfigError;
use crate::plugin_system::error::PluginSystemError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Specific, typed plugin system error
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error occurring during a specific kernel lifecycle phase.
    #[error("Kernel lifecycle error during {phase:?}: {message}")]
    KernelLifecycleError {
        phase: KernelLifecyclePhase,
        component_name: Option<String>,
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },
}

/// Represents a specific phase in the kernel's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum KernelLifecyclePhase {
    #[error("Initialize")]
    Initialize,
    #[error("Start")]
    Start,
    #[error("RunPreCheck")]
    RunPreCheck,
    #[error("Shutdown")]
    Shutdown,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl Error {
    /// Wrap a component failure with the lifecycle phase it happened in
    pub fn lifecycle(phase: KernelLifecyclePhase, component_name: &str, source: Error) -> Self {
        Error::KernelLifecycleError {
            message: format!("component '{}' failed", component_name),
            phase,
            component_name: Some(component_name.to_string()),
            source: Some(Box::new(source)),
        }
    }
}
