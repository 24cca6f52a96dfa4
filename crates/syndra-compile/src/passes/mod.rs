//! Built-in compilation passes.
//!
//! Passes are organized into two categories:
//! - [`agnostic`]: Passes that apply to any circuit (noise, fusion, checks)
//! - [`target`]: Passes that reshape a circuit for a kind of device

pub mod agnostic;
pub mod target;

pub use agnostic::{
    LocalOptimization, MomentVerification, NoiseInjectionPass, VerificationResult, noisy_circuit,
};
pub use target::ZBasisTranslation;
