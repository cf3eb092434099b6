//! Error types for scheduler operations

use thiserror::Error;

/// Errors that can occur in the scheduler
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Job ledger could not be read
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}
