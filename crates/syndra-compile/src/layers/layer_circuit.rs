//! A circuit viewed as a sequence of layers.

use std::collections::{BTreeMap, BTreeSet};

use syndra_ir::target::product_groups;
use syndra_ir::{Basis, Circuit, GateCategory, Instruction, Operation, Target};
use tracing::debug;

use super::layer::{Interaction, Layer, LoopLayer, MeasureTarget, Product};
use super::rotation::Rotation;
use crate::error::{CompileError, CompileResult};

/// An ordered list of [`Layer`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerCircuit {
    layers: Vec<Layer>,
}

impl LayerCircuit {
    /// An empty layer circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing layer list.
    pub fn from_layers(layers: impl IntoIterator<Item = Layer>) -> Self {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    /// The layers, in order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether there are no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Whether every layer is vacuous.
    pub fn is_vacuous(&self) -> bool {
        self.layers.iter().all(Layer::is_vacuous)
    }

    /// Every qubit touched by any layer.
    pub fn touched(&self) -> BTreeSet<u32> {
        self.layers.iter().flat_map(Layer::touched).collect()
    }

    /// Split a circuit into layers.
    ///
    /// Each TICK becomes an [`Layer::Empty`] separator. Between ticks,
    /// instructions are grouped into the trailing layer while it has the
    /// same kind and does not touch the same qubits.
    pub fn from_circuit(circuit: &Circuit) -> CompileResult<Self> {
        let mut out = Self::new();
        for op in circuit {
            match op {
                Operation::Instruction(instruction) => out.add_instruction(instruction)?,
                Operation::Repeat(block) => out.layers.push(Layer::Loop(LoopLayer {
                    body: Self::from_circuit(&block.body)?,
                    repetitions: block.count,
                })),
            }
        }
        Ok(out)
    }

    fn add(&mut self, layer: Layer) {
        let rejected = match self.layers.last_mut() {
            Some(last) => last.try_absorb(layer),
            None => Some(layer),
        };
        if let Some(layer) = rejected {
            self.layers.push(layer);
        }
    }

    fn add_instruction(&mut self, instruction: &Instruction) -> CompileResult<()> {
        let gate = instruction.gate()?;
        let unsupported = || CompileError::UnsupportedInstruction(instruction.to_string());

        if instruction.is_classically_controlled() {
            self.add(Layer::Feedback(vec![instruction.clone()]));
            return Ok(());
        }

        match gate.category {
            GateCategory::Tick => self.layers.push(Layer::Empty),
            GateCategory::Annotation => match gate.name {
                "QUBIT_COORDS" => {
                    for q in instruction.qubits() {
                        let coords = BTreeMap::from([(q.0, instruction.args.clone())]);
                        self.add(Layer::QubitCoords(coords));
                    }
                }
                "SHIFT_COORDS" => self.layers.push(Layer::ShiftCoords(instruction.args.clone())),
                _ => self.add(Layer::DetObs(vec![instruction.clone()])),
            },
            GateCategory::Clifford1q => {
                let rotation = Rotation::from_gate(gate.name).ok_or_else(unsupported)?;
                for q in instruction.qubits() {
                    self.add(Layer::Rotation(BTreeMap::from([(q.0, rotation)])));
                }
            }
            GateCategory::Clifford2q => {
                for pair in instruction.targets.chunks(2) {
                    let [a, b] = pair else {
                        return Err(unsupported());
                    };
                    let (Some(a), Some(b)) = (a.qubit_id(), b.qubit_id()) else {
                        return Err(unsupported());
                    };
                    let (a, b) = (a.0, b.0);
                    let layer = match gate.name {
                        "SWAP" => Layer::Swap(vec![(a.min(b), a.max(b))]),
                        "ISWAP" => Layer::ISwap(vec![(a.min(b), a.max(b))]),
                        "CZSWAP" => {
                            Layer::InteractSwap(vec![Interaction::new(a, Basis::Z, b, Basis::Z)])
                        }
                        "CXSWAP" => {
                            Layer::InteractSwap(vec![Interaction::new(a, Basis::Z, b, Basis::X)])
                        }
                        "SWAPCX" => {
                            Layer::InteractSwap(vec![Interaction::new(b, Basis::Z, a, Basis::X)])
                        }
                        name => Layer::Interact(vec![
                            Interaction::from_gate(name, a, b).ok_or_else(unsupported)?,
                        ]),
                    };
                    self.add(layer);
                }
            }
            GateCategory::Reset => {
                let basis = gate.reset_basis().ok_or_else(unsupported)?;
                for q in instruction.qubits() {
                    self.add(Layer::Reset(vec![(q.0, basis)]));
                }
            }
            GateCategory::Measure => self.add_measurements(instruction, gate.measured_basis())?,
            GateCategory::MeasureReset => {
                self.add_measurements(instruction, gate.measured_basis())?;
                let basis = gate.reset_basis().ok_or_else(unsupported)?;
                for q in instruction.qubits() {
                    self.add(Layer::Reset(vec![(q.0, basis)]));
                }
            }
            GateCategory::ProductMeasure => {
                for group in product_groups(&instruction.targets) {
                    let factors = group
                        .iter()
                        .filter_map(|t| match t {
                            Target::Pauli { basis, qubit } => Some((qubit.0, *basis)),
                            _ => None,
                        })
                        .collect();
                    self.add(Layer::Mpp(vec![Product {
                        factors,
                        args: instruction.args.clone(),
                    }]));
                }
            }
            GateCategory::Noise1q | GateCategory::Noise2q | GateCategory::NoiseProduct => {
                self.add(Layer::Noise(vec![instruction.clone()]));
            }
        }
        Ok(())
    }

    fn add_measurements(
        &mut self,
        instruction: &Instruction,
        basis: Option<Basis>,
    ) -> CompileResult<()> {
        let basis = basis.ok_or_else(|| CompileError::UnsupportedInstruction(instruction.to_string()))?;
        for q in instruction.qubits() {
            self.add(Layer::Measure(vec![MeasureTarget {
                qubit: q.0,
                basis,
                args: instruction.args.clone(),
            }]));
        }
        Ok(())
    }

    /// Materialize the layers, inserting TICKs where layers need them.
    pub fn to_circuit(&self) -> CompileResult<Circuit> {
        let mut out = Circuit::new();
        let mut tick_coming = false;
        for layer in self.layers.iter().filter(|l| !l.is_vacuous()) {
            if tick_coming && layer.requires_tick_before() {
                out.tick();
                tick_coming = false;
            }
            layer.append_into(&mut out)?;
            tick_coming |= layer.implies_eventual_tick_after();
        }
        Ok(out)
    }

    /// Fuse adjacent layers where possible.
    ///
    /// Single pass with a stack: each incoming layer (loop bodies optimized
    /// first) is fused with the top of the stack, and vacuous layers left on
    /// top are dropped so the next layer can reach further back.
    #[must_use]
    pub fn with_locally_optimized_layers(&self) -> LayerCircuit {
        let mut stack: Vec<Layer> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let layer = match layer {
                Layer::Loop(l) => Layer::Loop(LoopLayer {
                    body: l.body.with_locally_optimized_layers(),
                    repetitions: l.repetitions,
                }),
                other => other.clone(),
            };
            match stack.pop() {
                Some(prev) => stack.extend(prev.fused_with(layer)),
                None => stack.push(layer),
            }
            while stack.last().is_some_and(Layer::is_vacuous) {
                stack.pop();
            }
        }
        LayerCircuit { layers: stack }
    }

    /// Rewrite every layer into Z-basis form.
    #[must_use]
    pub fn to_z_basis(&self) -> LayerCircuit {
        LayerCircuit {
            layers: self.layers.iter().flat_map(Layer::to_z_basis).collect(),
        }
    }

    /// Fail if any layer, including those inside loops, touches a qubit twice.
    pub fn check_disjoint(&self) -> CompileResult<()> {
        for layer in &self.layers {
            if let Layer::Loop(l) = layer {
                l.body.check_disjoint()?;
            } else if !layer.is_disjoint() {
                return Err(CompileError::NonDisjointLayer(format!(
                    "{} layer on qubits {:?}",
                    layer.kind_name(),
                    layer.touched()
                )));
            }
        }
        Ok(())
    }
}

/// Rewrite a circuit so every reset, measurement and two-qubit interaction
/// acts in the Z basis, with basis changes done by single-qubit rotations.
///
/// Adjacent rotations are merged and cancelled afterwards.
pub fn transpile_to_z_basis_interaction_circuit(circuit: &Circuit) -> CompileResult<Circuit> {
    let layers = LayerCircuit::from_circuit(circuit)?;
    let rewritten = layers.to_z_basis().with_locally_optimized_layers();
    rewritten.check_disjoint()?;
    debug!(
        input_layers = layers.len(),
        output_layers = rewritten.len(),
        "Translated to Z-basis interactions"
    );
    rewritten.to_circuit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Circuit {
        text.parse().unwrap()
    }

    #[test]
    fn test_round_trip_preserves_text() {
        let text = "\
QUBIT_COORDS(0, 0) 0
QUBIT_COORDS(1, 0) 1
R 0 1
TICK
H 0
TICK
CX 0 1
TICK
M 0 1
DETECTOR rec[-1] rec[-2]
";
        let layers = LayerCircuit::from_circuit(&parse(text)).unwrap();
        assert_eq!(layers.to_circuit().unwrap().to_string(), text);
    }

    #[test]
    fn test_round_trip_with_loop() {
        let text = "\
R 0
TICK
REPEAT 3 {
    H 0
    TICK
    M 0
    TICK
}
M 0
";
        let layers = LayerCircuit::from_circuit(&parse(text)).unwrap();
        assert!(matches!(layers.layers()[2], Layer::Loop(_)));
        assert_eq!(layers.to_circuit().unwrap().to_string(), text);
    }

    #[test]
    fn test_same_moment_groups_by_kind() {
        let layers = LayerCircuit::from_circuit(&parse("H 0\nH 1\nS 2\nH 0\n")).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers.layers()[0].touched().len(), 3);
    }

    #[test]
    fn test_z_basis_transpile() {
        let text = "RX 0\nR 1\nTICK\nCX 0 1\nTICK\nMX 0\nM 1\n";
        let out = transpile_to_z_basis_interaction_circuit(&parse(text)).unwrap();
        assert_eq!(
            out.to_string(),
            "R 0 1\nTICK\nH 0 1\nTICK\nCZ 0 1\nTICK\nH 0 1\nTICK\nM 0 1\nTICK\nH 0\n"
        );
    }

    #[test]
    fn test_z_basis_cancels_between_products() {
        let text = "MPP X0*X1\nTICK\nMPP X0*X1\nDETECTOR rec[-2] rec[-1]\n";
        let out = transpile_to_z_basis_interaction_circuit(&parse(text)).unwrap();
        assert_eq!(
            out.to_string(),
            "H 0 1\nTICK\nMPP Z0*Z1\nTICK\nMPP Z0*Z1\nTICK\nH 0 1\nDETECTOR rec[-2] rec[-1]\n"
        );
        assert_eq!(out.num_measurements(), 2);
    }

    #[test]
    fn test_measure_reset_splits() {
        let layers = LayerCircuit::from_circuit(&parse("MRX 0\n")).unwrap();
        assert!(matches!(layers.layers()[0], Layer::Measure(_)));
        assert!(matches!(layers.layers()[1], Layer::Reset(_)));
        let out = layers.to_z_basis().with_locally_optimized_layers().to_circuit().unwrap();
        assert_eq!(out.to_string(), "H 0\nTICK\nM 0\nTICK\nR 0\nTICK\nH 0\n");
    }

    #[test]
    fn test_feedback_and_noise_pass_through() {
        let text = "M 0\nCX rec[-1] 1\nDEPOLARIZE1(0.01) 1\nTICK\nH 1\n";
        let layers = LayerCircuit::from_circuit(&parse(text)).unwrap();
        assert!(layers.layers().iter().any(|l| matches!(l, Layer::Feedback(_))));
        assert_eq!(layers.to_circuit().unwrap().to_string(), text);
    }

    #[test]
    fn test_unsupported_gate() {
        let err = LayerCircuit::from_circuit(&parse("SQRT_XX 0 1\n")).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedInstruction(_)));
    }

    #[test]
    fn test_optimization_merges_across_ticks() {
        let layers = LayerCircuit::from_circuit(&parse("R 0\nTICK\nR 1\nTICK\nH 0\nTICK\nH 0\n")).unwrap();
        let optimized = layers.with_locally_optimized_layers();
        assert_eq!(optimized.to_circuit().unwrap().to_string(), "R 0 1\n");
    }

    #[test]
    fn test_loop_body_is_optimized() {
        let text = "REPEAT 2 {\n    H 0\n    TICK\n    H 0\n    TICK\n    M 0\n}\n";
        let optimized = LayerCircuit::from_circuit(&parse(text))
            .unwrap()
            .with_locally_optimized_layers();
        assert_eq!(
            optimized.to_circuit().unwrap().to_string(),
            "REPEAT 2 {\n    M 0\n    TICK\n}\n"
        );
    }
}
