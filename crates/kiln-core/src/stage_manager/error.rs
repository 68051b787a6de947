//! # Kiln Core Stage Manager Errors
//!
//! Defines error types specific to the boot stage system: unknown stage
//! tags in a plugin's load order, failing stage handlers, and misuse of the
//! boot context's object store.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageSystemError {
    #[error("Unknown boot stage '{tag}'")]
    UnknownStage { tag: String },

    #[error("Stage execution failed for stage '{stage_id}': {source}")]
    StageExecutionFailed {
        stage_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Error accessing data from BootContext: Key '{key}' - {reason}")]
    ContextError { key: String, reason: String },
}
