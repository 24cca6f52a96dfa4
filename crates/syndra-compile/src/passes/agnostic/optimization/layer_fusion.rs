//! Layer fusion pass.

use tracing::{debug, warn};

use syndra_ir::Circuit;

use crate::error::{CompileError, CompileResult};
use crate::layers::LayerCircuit;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Local layer optimization.
///
/// Splits the circuit into layers and fuses neighbours: adjacent rotations
/// are composed (and dropped when they cancel), rotations right before a
/// reset are removed, same-kind layers on disjoint qubits share a step, and
/// an interaction followed by a swap of the same pairs becomes one
/// interact-swap. Empty steps disappear.
///
/// Circuits containing instructions with no layer form are left unchanged.
pub struct LocalOptimization;

impl Pass for LocalOptimization {
    fn name(&self) -> &'static str {
        "LocalOptimization"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        let layers = match LayerCircuit::from_circuit(circuit) {
            Ok(layers) => layers,
            Err(CompileError::UnsupportedInstruction(instruction)) => {
                warn!("Skipping local optimization: no layer form for '{instruction}'");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let optimized = layers.with_locally_optimized_layers();
        debug!(
            "Local optimization: {} -> {} layers",
            layers.len(),
            optimized.len()
        );
        *circuit = optimized.to_circuit()?;
        Ok(())
    }
}
