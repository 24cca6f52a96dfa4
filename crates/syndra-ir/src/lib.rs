//! Syndra Circuit Representation
//!
//! This crate provides the front end of the Syndra compilation stack: the
//! instruction trace, symbolic measurement bookkeeping, and the builder that
//! turns coordinate-level parity-check descriptions into circuits.
//!
//! # Overview
//!
//! Qubits are addressed by planar [`Coord`]inates. A [`Builder`] assigns each
//! coordinate a dense index in canonical order, then appends instructions to
//! a [`Circuit`]. Measurements are bound to caller-chosen
//! [`MeasurementKey`]s in a [`MeasurementTracker`]; detectors and observables
//! name keys and the tracker converts them to record offsets.
//!
//! # Core Components
//!
//! - **Coordinates**: [`Coord`] with its canonical ordering
//! - **Pauli algebra**: [`Basis`] and [`PauliMap`]
//! - **Instructions**: [`Instruction`], [`Target`], [`Operation`] and the
//!   [`Gate`] table
//! - **Circuit**: [`Circuit`], with text rendering and parsing
//! - **Tracking**: [`MeasurementTracker`]
//! - **Building**: [`Builder`], [`Tile`], [`Patch`]
//! - **Noise configuration**: [`NoiseModel`], [`NoiseRule`]
//!
//! # Example: Two Rounds of One Check
//!
//! ```rust
//! use syndra_ir::{Builder, Coord, DetectorOptions, PauliMap};
//!
//! let qubits = [Coord::new(0.0, 0.0), Coord::new(1.0, 0.0)];
//! let mut builder = Builder::for_qubits(qubits);
//! let check = PauliMap::new().with_xs(qubits);
//!
//! builder.measure_pauli_product(&check, "round0").unwrap();
//! builder.tick();
//! builder.measure_pauli_product(&check, "round1").unwrap();
//! builder.detector(["round0", "round1"], DetectorOptions::default()).unwrap();
//!
//! assert_eq!(
//!     builder.circuit().to_string(),
//!     "QUBIT_COORDS(0, 0) 0\n\
//!      QUBIT_COORDS(1, 0) 1\n\
//!      MPP X0*X1\n\
//!      TICK\n\
//!      MPP X0*X1\n\
//!      DETECTOR rec[-2] rec[-1]\n"
//! );
//! ```

pub mod builder;
pub mod circuit;
pub mod coord;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod noise;
pub mod patch;
pub mod pauli;
pub mod qubit;
pub mod target;
pub mod tracker;

pub use builder::{Builder, CheckStyle, DetectorOptions};
pub use circuit::Circuit;
pub use coord::{Coord, min_max, sorted_coords};
pub use error::{IrError, IrResult};
pub use gate::{Gate, GateCategory};
pub use instruction::{Instruction, Operation, RepeatBlock};
pub use noise::{NoiseModel, NoiseRule, RuleMatch};
pub use patch::{Patch, Tile};
pub use pauli::{Basis, PauliMap};
pub use qubit::QubitId;
pub use target::Target;
pub use tracker::{MeasurementKey, MeasurementTracker, TrackerHandle};
