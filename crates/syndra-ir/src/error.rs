//! Error types for the IR crate.

use thiserror::Error;

use crate::coord::Coord;
use crate::tracker::MeasurementKey;

/// Errors that can occur while building or reading circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Coordinate has no assigned qubit index.
    #[error("Qubit at {coord} is not part of this builder{}", format_gate_context(.gate_name))]
    UnknownQubit {
        /// The coordinate that was not found.
        coord: Coord,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Measurement key was bound twice.
    #[error("Measurement key collision: {0}")]
    KeyCollision(MeasurementKey),

    /// Measurement key was never bound.
    #[error("No such measurement: {0}")]
    UnboundKey(MeasurementKey),

    /// Measurement key refers to an obstacle.
    #[error("Obstacle at {0}")]
    ObstacleReference(MeasurementKey),

    /// Basis letter outside of X, Y, Z.
    #[error("Unsupported basis '{0}'")]
    UnsupportedBasis(String),

    /// Gate name not present in the gate table.
    #[error("Unknown gate '{0}'")]
    UnknownGate(String),

    /// Targets do not fit the gate.
    #[error("Invalid targets for '{gate_name}': {reason}")]
    InvalidTargets {
        /// Name of the gate.
        gate_name: String,
        /// What is wrong with the targets.
        reason: String,
    },

    /// Call arguments are inconsistent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Tile basis does not match the requested data basis.
    #[error("Basis mismatch at {coord}: expected {expected}, got {actual}")]
    BasisMismatch {
        /// Measurement qubit of the offending tile.
        coord: Coord,
        /// The basis that was requested.
        expected: String,
        /// The basis found on the tile.
        actual: String,
    },

    /// Circuit text could not be parsed.
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
