//! Error types for the compilation crate.

use thiserror::Error;

/// Errors that can occur while transforming a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] syndra_ir::IrError),

    /// Strict noise injection found an operation no rule covers.
    #[error("No noise rule for '{gate}'")]
    NoNoiseRule { gate: String },

    /// The pass configuration cannot be applied to this circuit.
    #[error("Invalid pass configuration: {0}")]
    InvalidConfiguration(String),

    /// A qubit was used by two operations between the same pair of ticks.
    #[error("Qubit {qubit} is used more than once in one moment (by '{gate}')")]
    QubitReusedInMoment { qubit: u32, gate: String },

    /// A layer ended up touching the same qubit twice.
    #[error("Layer is not disjoint: {0}")]
    NonDisjointLayer(String),

    /// The layer IR has no representation for an instruction.
    #[error("Instruction '{0}' has no layer representation")]
    UnsupportedInstruction(String),

    /// Pass execution failed.
    #[error("Pass '{name}' failed: {reason}")]
    PassFailed { name: String, reason: String },
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
