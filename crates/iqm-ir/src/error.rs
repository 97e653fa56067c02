//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur while building instructions, circuits and architectures.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Instruction name is not in the native instruction table.
    #[error("Unknown instruction \"{name}\". Supported instructions are \"{supported}\"")]
    UnknownInstruction {
        /// The rejected name.
        name: String,
        /// Comma separated list of supported names.
        supported: String,
    },

    /// Implementation was given as an empty string.
    #[error("Implementation of the instruction should be None, or a non-empty string")]
    EmptyImplementation,

    /// Locus length does not match the instruction arity.
    #[error("The \"{name}\" instruction acts on {arity} qubit(s), but {given} were given: {qubits:?}")]
    ArityMismatch {
        /// Instruction name.
        name: String,
        /// Required number of qubits.
        arity: usize,
        /// Number of qubits given.
        given: usize,
        /// The given locus.
        qubits: Vec<String>,
    },

    /// Argument names do not match the instruction signature.
    #[error("The instruction \"{name}\" requires {expected} argument(s), but {given} were given")]
    ArgumentNames {
        /// Instruction name.
        name: String,
        /// Required argument names, or `no`.
        expected: String,
        /// Given argument names.
        given: String,
    },

    /// Argument value has the wrong type.
    #[error("The argument \"{argument}\" should be of type {expected}, but {given} was given")]
    ArgumentType {
        /// Argument name.
        argument: String,
        /// Expected type.
        expected: &'static str,
        /// JSON type of the given value.
        given: &'static str,
    },

    /// Circuit name is empty.
    #[error("A circuit should have a non-empty string for a name.")]
    EmptyCircuitName,

    /// Circuit has no instructions.
    #[error("Each circuit should have at least one instruction.")]
    EmptyCircuit,

    /// Architecture description is inconsistent.
    #[error("Invalid quantum architecture: {0}")]
    InvalidArchitecture(String),
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
