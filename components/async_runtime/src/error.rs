//! Error types for the runtime

use core_types::JsError;
use thiserror::Error;

/// Runtime-level errors.
///
/// Promise rejections are never surfaced this way; they travel as values.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A host task or microtask failed
    #[error("task failed: {0}")]
    Task(#[from] JsError),

    /// Configuration could not be parsed
    #[error("invalid runtime configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;
