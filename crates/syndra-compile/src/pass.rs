//! Pass trait and types for compilation passes.

use syndra_ir::Circuit;

use crate::error::CompileResult;
use crate::property::PropertySet;

/// The kind of compilation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Reads the circuit, writes results into the `PropertySet`.
    Analysis,
    /// Rewrites the circuit.
    Transformation,
}

/// A compilation pass over an instruction trace.
///
/// Transformation passes replace the circuit with a rewritten one and may
/// read configuration from the `PropertySet`. Analysis passes leave the
/// circuit alone and record what they found in the `PropertySet`.
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Get the kind of this pass.
    fn kind(&self) -> PassKind;

    /// Run the pass.
    fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> CompileResult<()>;

    /// Check if this pass should run based on current state.
    fn should_run(&self, _circuit: &Circuit, _properties: &PropertySet) -> bool {
        true
    }
}
