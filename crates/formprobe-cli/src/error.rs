//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// The suite ran and at least one scenario did not pass
    #[error("{failed} of {total} scenario(s) failed")]
    TestFailures {
        /// Failed or cancelled scenarios
        failed: usize,
        /// Scenarios run across all engines
        total: usize,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// formprobe library error
    #[error("formprobe error: {0}")]
    Probe(#[from] formprobe::ProbeError),

    /// Serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a test failure error
    #[must_use]
    pub const fn test_failures(failed: usize, total: usize) -> Self {
        Self::TestFailures { failed, total }
    }
}
