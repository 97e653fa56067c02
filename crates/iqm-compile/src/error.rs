//! Error types for the compilation crate.

use thiserror::Error;

/// Errors that can occur during validation and transpilation.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] iqm_ir::IrError),

    /// Circuit and architecture disagree on MOVE support.
    #[error("{0}")]
    Configuration(String),

    /// Instruction, locus or argument violates the architecture.
    #[error("{0}")]
    Validation(String),

    /// Circuit cannot be rewritten for the architecture.
    #[error("{0}")]
    Transpilation(String),
}

impl CompileError {
    /// Check if this is a validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, CompileError::Validation(_))
    }

    /// Check if this is a transpilation failure.
    pub fn is_transpilation(&self) -> bool {
        matches!(self, CompileError::Transpilation(_))
    }
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
