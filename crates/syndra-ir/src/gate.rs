//! The fixed instruction vocabulary.
//!
//! Instructions carry their gate by name. This module knows which names
//! exist, which aliases normalize to which canonical name, and what kind of
//! operation each one is.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::pauli::Basis;

/// What kind of operation a gate is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateCategory {
    /// Coordinate declarations, coordinate shifts, detectors and observables.
    Annotation,
    /// Step boundary.
    Tick,
    /// Single-qubit Clifford gate.
    Clifford1q,
    /// Two-qubit Clifford gate (including swaps and controlled Paulis).
    Clifford2q,
    /// Single-qubit reset.
    Reset,
    /// Single-qubit measurement.
    Measure,
    /// Single-qubit measurement followed by a reset.
    MeasureReset,
    /// Multi-qubit Pauli product measurement.
    ProductMeasure,
    /// Single-qubit error channel.
    Noise1q,
    /// Two-qubit error channel.
    Noise2q,
    /// Error channel over a Pauli product.
    NoiseProduct,
}

impl GateCategory {
    /// Whether instructions of this kind are meta-data only.
    pub fn is_annotation(self) -> bool {
        matches!(self, GateCategory::Annotation | GateCategory::Tick)
    }

    /// Whether instructions of this kind append to the measurement record.
    pub fn produces_measurements(self) -> bool {
        matches!(
            self,
            GateCategory::Measure | GateCategory::MeasureReset | GateCategory::ProductMeasure
        )
    }

    /// Whether this kind collapses its qubits (resets or measurements).
    pub fn is_collapsing(self) -> bool {
        self.produces_measurements() || self == GateCategory::Reset
    }

    /// Whether this kind is an error channel.
    pub fn is_noise(self) -> bool {
        matches!(
            self,
            GateCategory::Noise1q | GateCategory::Noise2q | GateCategory::NoiseProduct
        )
    }

    /// Whether targets are consumed two at a time.
    pub fn is_pairwise(self) -> bool {
        matches!(self, GateCategory::Clifford2q | GateCategory::Noise2q)
    }
}

const GATES: &[(&str, GateCategory)] = &[
    ("QUBIT_COORDS", GateCategory::Annotation),
    ("SHIFT_COORDS", GateCategory::Annotation),
    ("DETECTOR", GateCategory::Annotation),
    ("OBSERVABLE_INCLUDE", GateCategory::Annotation),
    ("TICK", GateCategory::Tick),
    ("I", GateCategory::Clifford1q),
    ("X", GateCategory::Clifford1q),
    ("Y", GateCategory::Clifford1q),
    ("Z", GateCategory::Clifford1q),
    ("H", GateCategory::Clifford1q),
    ("H_XY", GateCategory::Clifford1q),
    ("H_YZ", GateCategory::Clifford1q),
    ("H_NXY", GateCategory::Clifford1q),
    ("H_NXZ", GateCategory::Clifford1q),
    ("H_NYZ", GateCategory::Clifford1q),
    ("S", GateCategory::Clifford1q),
    ("S_DAG", GateCategory::Clifford1q),
    ("SQRT_X", GateCategory::Clifford1q),
    ("SQRT_X_DAG", GateCategory::Clifford1q),
    ("SQRT_Y", GateCategory::Clifford1q),
    ("SQRT_Y_DAG", GateCategory::Clifford1q),
    ("C_XYZ", GateCategory::Clifford1q),
    ("C_ZYX", GateCategory::Clifford1q),
    ("C_NXYZ", GateCategory::Clifford1q),
    ("C_XNYZ", GateCategory::Clifford1q),
    ("C_XYNZ", GateCategory::Clifford1q),
    ("C_NZYX", GateCategory::Clifford1q),
    ("C_ZNYX", GateCategory::Clifford1q),
    ("C_ZYNX", GateCategory::Clifford1q),
    ("CX", GateCategory::Clifford2q),
    ("CY", GateCategory::Clifford2q),
    ("CZ", GateCategory::Clifford2q),
    ("XCX", GateCategory::Clifford2q),
    ("XCY", GateCategory::Clifford2q),
    ("XCZ", GateCategory::Clifford2q),
    ("YCX", GateCategory::Clifford2q),
    ("YCY", GateCategory::Clifford2q),
    ("YCZ", GateCategory::Clifford2q),
    ("SWAP", GateCategory::Clifford2q),
    ("ISWAP", GateCategory::Clifford2q),
    ("ISWAP_DAG", GateCategory::Clifford2q),
    ("CXSWAP", GateCategory::Clifford2q),
    ("SWAPCX", GateCategory::Clifford2q),
    ("CZSWAP", GateCategory::Clifford2q),
    ("SQRT_XX", GateCategory::Clifford2q),
    ("SQRT_XX_DAG", GateCategory::Clifford2q),
    ("SQRT_YY", GateCategory::Clifford2q),
    ("SQRT_YY_DAG", GateCategory::Clifford2q),
    ("SQRT_ZZ", GateCategory::Clifford2q),
    ("SQRT_ZZ_DAG", GateCategory::Clifford2q),
    ("R", GateCategory::Reset),
    ("RX", GateCategory::Reset),
    ("RY", GateCategory::Reset),
    ("M", GateCategory::Measure),
    ("MX", GateCategory::Measure),
    ("MY", GateCategory::Measure),
    ("MR", GateCategory::MeasureReset),
    ("MRX", GateCategory::MeasureReset),
    ("MRY", GateCategory::MeasureReset),
    ("MPP", GateCategory::ProductMeasure),
    ("X_ERROR", GateCategory::Noise1q),
    ("Y_ERROR", GateCategory::Noise1q),
    ("Z_ERROR", GateCategory::Noise1q),
    ("DEPOLARIZE1", GateCategory::Noise1q),
    ("PAULI_CHANNEL_1", GateCategory::Noise1q),
    ("DEPOLARIZE2", GateCategory::Noise2q),
    ("PAULI_CHANNEL_2", GateCategory::Noise2q),
    ("CORRELATED_ERROR", GateCategory::NoiseProduct),
    ("ELSE_CORRELATED_ERROR", GateCategory::NoiseProduct),
];

const ALIASES: &[(&str, &str)] = &[
    ("CNOT", "CX"),
    ("ZCX", "CX"),
    ("ZCY", "CY"),
    ("ZCZ", "CZ"),
    ("H_XZ", "H"),
    ("SQRT_Z", "S"),
    ("SQRT_Z_DAG", "S_DAG"),
    ("MZ", "M"),
    ("RZ", "R"),
    ("MRZ", "MR"),
    ("E", "CORRELATED_ERROR"),
    ("SWAPCZ", "CZSWAP"),
];

/// Gates whose two operands may be exchanged without changing the gate.
const ORIENTATION_SYMMETRIC: &[&str] = &[
    "CZ",
    "XCX",
    "YCY",
    "SWAP",
    "ISWAP",
    "ISWAP_DAG",
    "CZSWAP",
    "SQRT_XX",
    "SQRT_YY",
    "SQRT_ZZ",
    "SQRT_XX_DAG",
    "SQRT_YY_DAG",
    "SQRT_ZZ_DAG",
];

/// Gates the builder rewrites to another primitive with swapped operands.
const REVERSED_OPERAND_ALIASES: &[(&str, &str)] =
    &[("XCZ", "CX"), ("YCZ", "CY"), ("SWAPCX", "CXSWAP")];

/// A resolved gate: canonical name plus category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gate {
    /// Canonical name.
    pub name: &'static str,
    /// Kind of operation.
    pub category: GateCategory,
}

impl Gate {
    /// Look up a gate by (case-insensitive) name, resolving aliases.
    pub fn lookup(name: &str) -> IrResult<Self> {
        let upper = name.to_ascii_uppercase();
        let canonical = ALIASES
            .iter()
            .find(|(alias, _)| *alias == upper)
            .map_or(upper.as_str(), |(_, target)| *target);
        GATES
            .iter()
            .find(|(n, _)| *n == canonical)
            .map(|&(name, category)| Gate { name, category })
            .ok_or_else(|| IrError::UnknownGate(name.to_string()))
    }

    /// Category of a gate name, if it is known.
    pub fn category_of(name: &str) -> Option<GateCategory> {
        Self::lookup(name).ok().map(|g| g.category)
    }

    /// Whether the gate's two operands may be exchanged.
    pub fn is_orientation_symmetric(&self) -> bool {
        ORIENTATION_SYMMETRIC.contains(&self.name)
    }

    /// The primitive this gate is an operand-reversed alias of, if any.
    pub fn reversed_operand_alias(&self) -> Option<Gate> {
        REVERSED_OPERAND_ALIASES
            .iter()
            .find(|(alias, _)| *alias == self.name)
            .and_then(|(_, target)| Gate::lookup(target).ok())
    }

    /// Basis a single-qubit measurement (or measure-reset) acts in.
    pub fn measured_basis(&self) -> Option<Basis> {
        match self.name {
            "M" | "MR" => Some(Basis::Z),
            "MX" | "MRX" => Some(Basis::X),
            "MY" | "MRY" => Some(Basis::Y),
            _ => None,
        }
    }

    /// Basis a single-qubit reset (or measure-reset) prepares.
    pub fn reset_basis(&self) -> Option<Basis> {
        match self.name {
            "R" | "MR" => Some(Basis::Z),
            "RX" | "MRX" => Some(Basis::X),
            "RY" | "MRY" => Some(Basis::Y),
            _ => None,
        }
    }

    /// Whether this instruction's repeated appends may be merged into one.
    pub fn is_fusable(&self) -> bool {
        !matches!(self.category, GateCategory::Annotation | GateCategory::Tick)
            && !matches!(self.name, "CORRELATED_ERROR" | "ELSE_CORRELATED_ERROR")
    }
}

/// Canonical measurement gate for a basis.
pub fn measure_gate(basis: Basis) -> &'static str {
    match basis {
        Basis::X => "MX",
        Basis::Y => "MY",
        Basis::Z => "M",
    }
}

/// Canonical reset gate for a basis.
pub fn reset_gate(basis: Basis) -> &'static str {
    match basis {
        Basis::X => "RX",
        Basis::Y => "RY",
        Basis::Z => "R",
    }
}

/// Canonical classically controlled Pauli gate (`CX`, `CY`, `CZ`).
pub fn controlled_pauli_gate(basis: Basis) -> &'static str {
    match basis {
        Basis::X => "CX",
        Basis::Y => "CY",
        Basis::Z => "CZ",
    }
}
