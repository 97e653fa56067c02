//! Error types for the HAL crate.

use iqm_compile::CompileError;
use thiserror::Error;

/// Errors that can occur while talking to an IQM server.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Client was set up with invalid or conflicting parameters.
    #[error("{0}")]
    ClientConfiguration(String),

    /// Getting, refreshing or closing an authentication session failed.
    #[error("{0}")]
    ClientAuthentication(String),

    /// Circuit batch was rejected before submission.
    #[error("{0}")]
    CircuitValidation(String),

    /// Job failed on the server, or the server answered with garbage.
    #[error("{0}")]
    CircuitExecution(String),

    /// Job did not reach the expected state in time.
    #[error("{0}")]
    ApiTimeout(String),

    /// Server refused to abort a job.
    #[error("{0}")]
    JobAbortion(String),

    /// Unexpected HTTP status from the server.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Validation or transpilation error.
    #[error("Compilation error: {0}")]
    Compile(#[from] CompileError),

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HalError {
    /// Check if this is an authentication failure.
    pub fn is_authentication(&self) -> bool {
        matches!(self, HalError::ClientAuthentication(_))
    }

    /// Check if this is an execution failure. Timeouts count as execution failures.
    pub fn is_execution(&self) -> bool {
        matches!(self, HalError::CircuitExecution(_) | HalError::ApiTimeout(_))
    }
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
