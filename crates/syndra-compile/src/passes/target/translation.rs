//! Z-basis translation pass.

use tracing::debug;

use syndra_ir::Circuit;

use crate::error::CompileResult;
use crate::layers::transpile_to_z_basis_interaction_circuit;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Rewrites resets, measurements and two-qubit interactions into their Z
/// basis forms (`R`, `M`, `MPP Z*Z`, `CZ`) surrounded by single-qubit
/// rotations.
///
/// Targets that only natively support Z-basis entangling and readout use
/// this. In the default pipeline it runs after noise injection, so channels
/// stay attached to the operations they were modelled on.
pub struct ZBasisTranslation;

impl Pass for ZBasisTranslation {
    fn name(&self) -> &'static str {
        "ZBasisTranslation"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        let translated = transpile_to_z_basis_interaction_circuit(circuit)?;
        debug!(
            "Z-basis translation: {} -> {} top-level operations",
            circuit.len(),
            translated.len()
        );
        *circuit = translated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translates_cx() {
        let mut circuit: Circuit = "CX 0 1\n".parse().unwrap();
        ZBasisTranslation
            .run(&mut circuit, &mut PropertySet::new())
            .unwrap();
        assert_eq!(circuit.to_string(), "H 1\nTICK\nCZ 0 1\nTICK\nH 1\n");
    }

    #[test]
    fn test_z_basis_circuit_is_unchanged() {
        let text = "R 0 1\nTICK\nCZ 0 1\nTICK\nM 0 1\n";
        let mut circuit: Circuit = text.parse().unwrap();
        ZBasisTranslation
            .run(&mut circuit, &mut PropertySet::new())
            .unwrap();
        assert_eq!(circuit.to_string(), text);
    }
}
