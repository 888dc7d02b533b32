//! Error types for the core module.

use crate::config::ConfigError;
use crate::core::approval::ApprovalError;
use crate::core::prompts::PromptError;
use crate::core::storage::StorageError;

/// Core error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Prompts could not be loaded.
    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Plan lifecycle error.
    #[error(transparent)]
    Approval(#[from] ApprovalError),

    /// Persisted state could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
