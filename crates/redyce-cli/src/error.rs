//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] redyce_store::StoreError),

    /// Extraction error
    #[error(transparent)]
    Extractor(#[from] redyce_extractor::ExtractorError),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] redyce_llm::LlmError),

    /// Scheduler error
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] redyce_scheduler::SchedulerError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}
