//! Target-agnostic compilation passes.
//!
//! These passes operate on the instruction trace without assuming anything
//! about the device that will run it.

pub mod noise_injection;
pub mod optimization;
pub mod verification;

pub use noise_injection::{NoiseInjectionPass, noisy_circuit};
pub use optimization::LocalOptimization;
pub use verification::{MomentVerification, VerificationResult};
