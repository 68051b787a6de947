//! # Kiln Core Kernel
//!
//! The `kernel` module ties the runtime together.
//!
//! - **Application Bootstrapping**: [`Application`](bootstrap::Application)
//!   builds the plugin manager from a [`RuntimeConfig`](crate::config::RuntimeConfig)
//!   and drives its lifecycle.
//! - **Component Lifecycle**: the [`KernelComponent`](component::KernelComponent)
//!   trait (`initialize`, `start`, `stop`).
//! - **Core Constants**: the `constants` submodule.
//! - **Error Handling**: the top-level [`Error`](error::Error) and a `Result`
//!   alias in the `error` submodule.
pub mod bootstrap;
pub mod component;
pub mod constants;
pub mod error;

pub use bootstrap::Application;
pub use component::KernelComponent;
pub use error::{Error, Result};

// Test module declaration
#[cfg(test)]
mod tests;
