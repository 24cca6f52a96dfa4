//! Syndra Compilation Framework
//!
//! This crate provides the back end of the Syndra stack: everything that
//! rewrites an already-built instruction trace. It implements a pass-based
//! architecture, so noise injection, basis translation and layer fusion can
//! be combined freely.
//!
//! # Overview
//!
//! A circuit flows through a series of passes that:
//! 1. **Noise**: Decorate every moment with error channels from a
//!    [`NoiseModel`](syndra_ir::NoiseModel)
//! 2. **Translation**: Rewrite interactions into Z-basis form (CZ plus
//!    single-qubit rotations)
//! 3. **Optimization**: Fuse adjacent layers and drop cancelling rotations
//! 4. **Verification**: Check moment disjointness and measurement records
//!
//! # Architecture
//!
//! ```text
//! Input Circuit
//!       |
//!       v
//! +-------------+
//! | PassManager | <-- PropertySet (noise model, immune qubits, system qubits)
//! +-------------+
//!       |
//!       |-- NoiseInjectionPass
//!       |-- ZBasisTranslation
//!       |-- LocalOptimization
//!       `-- MomentVerification
//!       |
//!       v
//! Output Circuit
//! ```
//!
//! # Example: Noisy Compilation
//!
//! ```rust
//! use syndra_compile::PassManagerBuilder;
//! use syndra_ir::{Circuit, NoiseModel};
//!
//! let mut circuit: Circuit = "R 0 1\nTICK\nCX 0 1\nTICK\nM 0 1\n".parse().unwrap();
//!
//! let (pm, mut props) = PassManagerBuilder::new()
//!     .with_noise(NoiseModel::uniform_depolarizing(0.001))
//!     .build();
//! pm.run(&mut circuit, &mut props).unwrap();
//!
//! assert!(circuit.gates_used().contains("DEPOLARIZE2"));
//! ```
//!
//! # Optimization Levels
//!
//! | Level | Passes Included |
//! |-------|-----------------|
//! | 0 | Noise and translation only, when requested |
//! | 1+ | + Local layer fusion, moment verification |
//!
//! # Layer IR
//!
//! The [`layers`] module holds an intermediate form in which each step of a
//! circuit is one typed [`Layer`]. It is what [`LocalOptimization`] and
//! [`ZBasisTranslation`] work on, and it can be used directly through
//! [`LayerCircuit`].
//!
//! # Memory Experiments
//!
//! [`make_phenomenological_circuit`] and [`make_code_capacity_circuit`]
//! generate complete memory experiments for a [`Patch`](syndra_ir::Patch).
//!
//! # Custom Passes
//!
//! Implement the [`Pass`] trait to create custom compilation passes:
//!
//! ```rust
//! use syndra_compile::{CompileResult, Pass, PassKind, PropertySet};
//! use syndra_ir::Circuit;
//!
//! struct MyCustomPass;
//!
//! impl Pass for MyCustomPass {
//!     fn name(&self) -> &str { "my_custom_pass" }
//!     fn kind(&self) -> PassKind { PassKind::Transformation }
//!
//!     fn run(&self, circuit: &mut Circuit, props: &mut PropertySet) -> CompileResult<()> {
//!         // Your pass logic here
//!         Ok(())
//!     }
//! }
//! ```

pub mod error;
pub mod layers;
pub mod manager;
pub mod memory;
pub mod pass;
pub mod property;

// Built-in passes
pub mod passes;

pub use error::{CompileError, CompileResult};
pub use layers::{Layer, LayerCircuit, transpile_to_z_basis_interaction_circuit};
pub use manager::{PassManager, PassManagerBuilder};
pub use memory::{
    MemoryExperiment, PairedObservables, make_code_capacity_circuit,
    make_phenomenological_circuit, pair_observables,
};
pub use pass::{Pass, PassKind};
pub use passes::{
    LocalOptimization, MomentVerification, NoiseInjectionPass, VerificationResult,
    ZBasisTranslation, noisy_circuit,
};
pub use property::PropertySet;
