//! The closed set of layer kinds.
//!
//! Each layer is one group of operations that can run in the same step
//! (no qubit is touched twice), except for the pass-through kinds which
//! carry instructions verbatim.

use std::collections::{BTreeMap, BTreeSet};

use syndra_ir::gate::{measure_gate, reset_gate};
use syndra_ir::target::join_products;
use syndra_ir::{Basis, Circuit, Instruction, Target};

use super::layer_circuit::LayerCircuit;
use super::rotation::Rotation;
use crate::error::CompileResult;

/// A two-qubit Pauli-controlled Pauli interaction.
///
/// `basis_a` acts on `a` and `basis_b` on `b`. The interaction is symmetric
/// in the (qubit, basis) pairs, so it is stored in a canonical orientation
/// with the smaller pair first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interaction {
    /// First qubit.
    pub a: u32,
    /// Second qubit.
    pub b: u32,
    /// Basis on the first qubit.
    pub basis_a: Basis,
    /// Basis on the second qubit.
    pub basis_b: Basis,
}

impl Interaction {
    /// An interaction with `basis_a` on `a` and `basis_b` on `b`.
    pub fn new(a: u32, basis_a: Basis, b: u32, basis_b: Basis) -> Self {
        if (basis_a, a) <= (basis_b, b) {
            Self {
                a,
                b,
                basis_a,
                basis_b,
            }
        } else {
            Self {
                a: b,
                b: a,
                basis_a: basis_b,
                basis_b: basis_a,
            }
        }
    }

    /// The interaction performed by a controlled-Pauli gate.
    pub fn from_gate(name: &str, a: u32, b: u32) -> Option<Self> {
        use Basis::{X, Y, Z};
        let (pa, pb) = match name {
            "CX" => (Z, X),
            "CY" => (Z, Y),
            "CZ" => (Z, Z),
            "XCX" => (X, X),
            "XCY" => (X, Y),
            "XCZ" => (X, Z),
            "YCX" => (Y, X),
            "YCY" => (Y, Y),
            "YCZ" => (Y, Z),
            _ => return None,
        };
        Some(Self::new(a, pa, b, pb))
    }

    /// The two qubits, sorted.
    pub fn pair(&self) -> (u32, u32) {
        (self.a.min(self.b), self.a.max(self.b))
    }

    /// Whether both sides act in the Z basis.
    pub fn is_z_basis(&self) -> bool {
        self.basis_a == Basis::Z && self.basis_b == Basis::Z
    }

    /// The same bases applied to the opposite qubits.
    #[must_use]
    pub fn with_qubits_exchanged(&self) -> Self {
        Self::new(self.b, self.basis_a, self.a, self.basis_b)
    }

    /// Canonical gate name and operand order.
    fn gate_targets(&self) -> (&'static str, u32, u32) {
        use Basis::{X, Y, Z};
        let (lo, hi) = self.pair();
        match (self.basis_a, self.basis_b) {
            (X, X) => ("XCX", lo, hi),
            (Y, Y) => ("YCY", lo, hi),
            (Z, Z) => ("CZ", lo, hi),
            (X, Y) => ("XCY", self.a, self.b),
            (X, Z) => ("CX", self.b, self.a),
            (Y, Z) => ("CY", self.b, self.a),
            // Canonical orientation never puts the larger basis first.
            (Y, X) => ("YCX", self.a, self.b),
            (Z, X) => ("CX", self.a, self.b),
            (Z, Y) => ("CY", self.a, self.b),
        }
    }
}

/// One single-qubit measurement inside a [`Layer::Measure`].
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureTarget {
    /// Measured qubit.
    pub qubit: u32,
    /// Measurement basis.
    pub basis: Basis,
    /// Instruction arguments (a result-flip probability, if noisy).
    pub args: Vec<f64>,
}

/// One Pauli product inside a [`Layer::Mpp`].
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Factors in emission order.
    pub factors: Vec<(u32, Basis)>,
    /// Instruction arguments (a result-flip probability, if noisy).
    pub args: Vec<f64>,
}

/// A repeated sub-sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopLayer {
    /// The repeated layers.
    pub body: LayerCircuit,
    /// Number of repetitions.
    pub repetitions: u64,
}

/// A group of operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    /// Nothing. Marks a step boundary while building.
    Empty,
    /// Single-qubit Cliffords, by qubit.
    Rotation(BTreeMap<u32, Rotation>),
    /// Controlled-Pauli interactions.
    Interact(Vec<Interaction>),
    /// Swaps, as sorted pairs.
    Swap(Vec<(u32, u32)>),
    /// iSwaps, as sorted pairs.
    ISwap(Vec<(u32, u32)>),
    /// Interactions each followed by a swap of the same pair.
    InteractSwap(Vec<Interaction>),
    /// Resets in emission order.
    Reset(Vec<(u32, Basis)>),
    /// Single-qubit measurements in emission order.
    Measure(Vec<MeasureTarget>),
    /// Pauli product measurements in emission order.
    Mpp(Vec<Product>),
    /// Qubit coordinate declarations.
    QubitCoords(BTreeMap<u32, Vec<f64>>),
    /// A coordinate shift.
    ShiftCoords(Vec<f64>),
    /// Detector and observable annotations, verbatim.
    DetObs(Vec<Instruction>),
    /// Classically controlled gates, verbatim.
    Feedback(Vec<Instruction>),
    /// Error channels, verbatim.
    Noise(Vec<Instruction>),
    /// A repeat block.
    Loop(LoopLayer),
}

fn instruction_qubits(instructions: &[Instruction]) -> impl Iterator<Item = u32> + '_ {
    instructions.iter().flat_map(|i| i.qubits().map(|q| q.0))
}

fn sorted_pair(a: u32, b: u32) -> (u32, u32) {
    (a.min(b), a.max(b))
}

fn to_z_rotations(entries: impl IntoIterator<Item = (u32, Basis)>) -> BTreeMap<u32, Rotation> {
    entries
        .into_iter()
        .filter(|(_, b)| *b != Basis::Z)
        .map(|(q, b)| (q, Rotation::basis_to_z(b)))
        .collect()
}

fn same_pairs(interactions: &[Interaction], swaps: &[(u32, u32)]) -> bool {
    let a: BTreeSet<(u32, u32)> = interactions.iter().map(Interaction::pair).collect();
    let b: BTreeSet<(u32, u32)> = swaps.iter().map(|&(x, y)| sorted_pair(x, y)).collect();
    a.len() == interactions.len() && b.len() == swaps.len() && a == b
}

fn append_pairs(
    out: &mut Circuit,
    name: &str,
    pairs: impl IntoIterator<Item = (u32, u32)>,
) -> CompileResult<()> {
    let mut pairs: Vec<(u32, u32)> = pairs.into_iter().collect();
    if pairs.is_empty() {
        return Ok(());
    }
    pairs.sort_unstable();
    out.append_qubits(name, pairs.into_iter().flat_map(|(a, b)| [a, b]), [])?;
    Ok(())
}

fn append_interactions(out: &mut Circuit, interactions: &[Interaction]) -> CompileResult<()> {
    let mut groups: BTreeMap<&'static str, Vec<(u32, u32)>> = BTreeMap::new();
    for interaction in interactions {
        let (name, c, t) = interaction.gate_targets();
        groups.entry(name).or_default().push((c, t));
    }
    for (name, pairs) in groups {
        append_pairs(out, name, pairs)?;
    }
    Ok(())
}

impl Layer {
    /// Short name of the layer kind, for logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Layer::Empty => "empty",
            Layer::Rotation(_) => "rotation",
            Layer::Interact(_) => "interact",
            Layer::Swap(_) => "swap",
            Layer::ISwap(_) => "iswap",
            Layer::InteractSwap(_) => "interact_swap",
            Layer::Reset(_) => "reset",
            Layer::Measure(_) => "measure",
            Layer::Mpp(_) => "mpp",
            Layer::QubitCoords(_) => "qubit_coords",
            Layer::ShiftCoords(_) => "shift_coords",
            Layer::DetObs(_) => "det_obs",
            Layer::Feedback(_) => "feedback",
            Layer::Noise(_) => "noise",
            Layer::Loop(_) => "loop",
        }
    }

    /// Qubits read or written by the layer.
    pub fn touched(&self) -> BTreeSet<u32> {
        match self {
            Layer::Empty
            | Layer::QubitCoords(_)
            | Layer::ShiftCoords(_)
            | Layer::DetObs(_) => BTreeSet::new(),
            Layer::Rotation(rotations) => rotations.keys().copied().collect(),
            Layer::Interact(interactions) | Layer::InteractSwap(interactions) => {
                interactions.iter().flat_map(|i| [i.a, i.b]).collect()
            }
            Layer::Swap(pairs) | Layer::ISwap(pairs) => {
                pairs.iter().flat_map(|&(a, b)| [a, b]).collect()
            }
            Layer::Reset(resets) => resets.iter().map(|(q, _)| *q).collect(),
            Layer::Measure(targets) => targets.iter().map(|t| t.qubit).collect(),
            Layer::Mpp(products) => products
                .iter()
                .flat_map(|p| p.factors.iter().map(|(q, _)| *q))
                .collect(),
            Layer::Feedback(instructions) | Layer::Noise(instructions) => {
                instruction_qubits(instructions).collect()
            }
            Layer::Loop(l) => l.body.touched(),
        }
    }

    /// Number of qubit slots the layer uses, counting repeats.
    fn touch_count(&self) -> usize {
        match self {
            Layer::Rotation(rotations) => rotations.len(),
            Layer::Interact(interactions) | Layer::InteractSwap(interactions) => {
                2 * interactions.len()
            }
            Layer::Swap(pairs) | Layer::ISwap(pairs) => 2 * pairs.len(),
            Layer::Reset(resets) => resets.len(),
            Layer::Measure(targets) => targets.len(),
            Layer::Mpp(products) => products.iter().map(|p| p.factors.len()).sum(),
            _ => self.touched().len(),
        }
    }

    /// Whether no qubit is touched twice.
    pub fn is_disjoint(&self) -> bool {
        match self {
            Layer::Feedback(_) | Layer::Noise(_) | Layer::Loop(_) => true,
            _ => self.touch_count() == self.touched().len(),
        }
    }

    /// Whether the layer does nothing.
    pub fn is_vacuous(&self) -> bool {
        match self {
            Layer::Empty => true,
            Layer::Rotation(rotations) => rotations.values().all(Rotation::is_identity),
            Layer::Interact(v) | Layer::InteractSwap(v) => v.is_empty(),
            Layer::Swap(v) | Layer::ISwap(v) => v.is_empty(),
            Layer::Reset(v) => v.is_empty(),
            Layer::Measure(v) => v.is_empty(),
            Layer::Mpp(v) => v.is_empty(),
            Layer::QubitCoords(v) => v.is_empty(),
            Layer::ShiftCoords(v) => v.is_empty(),
            Layer::DetObs(v) | Layer::Feedback(v) | Layer::Noise(v) => v.is_empty(),
            Layer::Loop(l) => l.repetitions == 0 || l.body.is_vacuous(),
        }
    }

    /// Whether a step boundary must separate this layer from earlier work.
    pub fn requires_tick_before(&self) -> bool {
        !matches!(
            self,
            Layer::Empty
                | Layer::QubitCoords(_)
                | Layer::ShiftCoords(_)
                | Layer::DetObs(_)
                | Layer::Feedback(_)
                | Layer::Noise(_)
        )
    }

    /// Whether later work must be separated from this layer by a step boundary.
    pub fn implies_eventual_tick_after(&self) -> bool {
        !matches!(
            self,
            Layer::Empty
                | Layer::QubitCoords(_)
                | Layer::ShiftCoords(_)
                | Layer::DetObs(_)
                | Layer::Noise(_)
                | Layer::Loop(_)
        )
    }

    /// Move `other` into this layer if both are the same kind and can share
    /// a step. Returns `other` back when it cannot be absorbed.
    pub fn try_absorb(&mut self, other: Layer) -> Option<Layer> {
        if !self.touched().is_disjoint(&other.touched()) {
            return Some(other);
        }
        match (self, other) {
            (Layer::Rotation(a), Layer::Rotation(b)) => a.extend(b),
            (Layer::Interact(a), Layer::Interact(b))
            | (Layer::InteractSwap(a), Layer::InteractSwap(b)) => a.extend(b),
            (Layer::Swap(a), Layer::Swap(b)) | (Layer::ISwap(a), Layer::ISwap(b)) => a.extend(b),
            (Layer::Reset(a), Layer::Reset(b)) => a.extend(b),
            (Layer::Measure(a), Layer::Measure(b)) => a.extend(b),
            (Layer::Mpp(a), Layer::Mpp(b)) => a.extend(b),
            (Layer::QubitCoords(a), Layer::QubitCoords(b))
                if b.keys().all(|q| !a.contains_key(q)) =>
            {
                a.extend(b);
            }
            (Layer::DetObs(a), Layer::DetObs(b))
            | (Layer::Feedback(a), Layer::Feedback(b))
            | (Layer::Noise(a), Layer::Noise(b)) => a.extend(b),
            (_, other) => return Some(other),
        }
        None
    }

    /// Fuse this layer with the one after it.
    ///
    /// Returns one layer when they fused and both otherwise. Vacuous results
    /// are dropped.
    pub fn fused_with(self, next: Layer) -> Vec<Layer> {
        let out = match (self, next) {
            (prev, Layer::Empty) => vec![prev],
            (Layer::Empty, next) => vec![next],
            (Layer::Rotation(mut a), Layer::Rotation(b)) => {
                for (q, r) in b {
                    let combined = a.get(&q).map_or(r, |first| first.then(&r));
                    a.insert(q, combined);
                }
                a.retain(|_, r| !r.is_identity());
                vec![Layer::Rotation(a)]
            }
            (Layer::Rotation(mut a), Layer::Reset(resets)) => {
                for (q, _) in &resets {
                    a.remove(q);
                }
                vec![Layer::Rotation(a), Layer::Reset(resets)]
            }
            (Layer::Interact(interactions), Layer::Swap(swaps))
                if same_pairs(&interactions, &swaps) =>
            {
                vec![Layer::InteractSwap(interactions)]
            }
            (Layer::Swap(swaps), Layer::Interact(interactions))
                if same_pairs(&interactions, &swaps) =>
            {
                let moved = interactions
                    .iter()
                    .map(Interaction::with_qubits_exchanged)
                    .collect();
                vec![Layer::InteractSwap(moved)]
            }
            (Layer::ShiftCoords(mut a), Layer::ShiftCoords(b)) => {
                if a.len() < b.len() {
                    a.resize(b.len(), 0.0);
                }
                for (x, y) in a.iter_mut().zip(b) {
                    *x += y;
                }
                vec![Layer::ShiftCoords(a)]
            }
            (prev @ Layer::Loop(_), next) => vec![prev, next],
            (mut prev, next) => match prev.try_absorb(next) {
                None => vec![prev],
                Some(next) => vec![prev, next],
            },
        };
        out.into_iter().filter(|l| !l.is_vacuous()).collect()
    }

    /// Rewrite into layers whose resets, measurements and interactions all
    /// act in the Z basis, bracketed by basis-changing rotations.
    pub fn to_z_basis(&self) -> Vec<Layer> {
        match self {
            Layer::Interact(interactions) if !interactions.iter().all(Interaction::is_z_basis) => {
                let rot = Layer::Rotation(to_z_rotations(
                    interactions
                        .iter()
                        .flat_map(|i| [(i.a, i.basis_a), (i.b, i.basis_b)]),
                ));
                let z = interactions
                    .iter()
                    .map(|i| Interaction::new(i.a, Basis::Z, i.b, Basis::Z))
                    .collect();
                vec![rot.clone(), Layer::Interact(z), rot]
            }
            Layer::InteractSwap(interactions)
                if !interactions.iter().all(Interaction::is_z_basis) =>
            {
                let before = to_z_rotations(
                    interactions
                        .iter()
                        .flat_map(|i| [(i.a, i.basis_a), (i.b, i.basis_b)]),
                );
                // The swap carries each qubit's undo rotation to its partner.
                let after = to_z_rotations(
                    interactions
                        .iter()
                        .flat_map(|i| [(i.b, i.basis_a), (i.a, i.basis_b)]),
                );
                let z = interactions
                    .iter()
                    .map(|i| Interaction::new(i.a, Basis::Z, i.b, Basis::Z))
                    .collect();
                vec![
                    Layer::Rotation(before),
                    Layer::InteractSwap(z),
                    Layer::Rotation(after),
                ]
            }
            Layer::Reset(resets) if resets.iter().any(|(_, b)| *b != Basis::Z) => {
                let z = resets.iter().map(|(q, _)| (*q, Basis::Z)).collect();
                vec![
                    Layer::Reset(z),
                    Layer::Rotation(to_z_rotations(resets.iter().copied())),
                ]
            }
            Layer::Measure(targets) if targets.iter().any(|t| t.basis != Basis::Z) => {
                let rot = Layer::Rotation(to_z_rotations(targets.iter().map(|t| (t.qubit, t.basis))));
                let z = targets
                    .iter()
                    .map(|t| MeasureTarget {
                        basis: Basis::Z,
                        ..t.clone()
                    })
                    .collect();
                vec![rot.clone(), Layer::Measure(z), rot]
            }
            Layer::Mpp(products)
                if products
                    .iter()
                    .any(|p| p.factors.iter().any(|(_, b)| *b != Basis::Z)) =>
            {
                let rot = Layer::Rotation(to_z_rotations(
                    products.iter().flat_map(|p| p.factors.iter().copied()),
                ));
                let z = products
                    .iter()
                    .map(|p| Product {
                        factors: p.factors.iter().map(|(q, _)| (*q, Basis::Z)).collect(),
                        args: p.args.clone(),
                    })
                    .collect();
                vec![rot.clone(), Layer::Mpp(z), rot]
            }
            Layer::Loop(l) => vec![Layer::Loop(LoopLayer {
                body: l.body.to_z_basis(),
                repetitions: l.repetitions,
            })],
            other => vec![other.clone()],
        }
    }

    /// Materialize the layer as instructions.
    pub fn append_into(&self, out: &mut Circuit) -> CompileResult<()> {
        match self {
            Layer::Empty => {}
            Layer::Rotation(rotations) => {
                let mut groups: BTreeMap<&'static str, Vec<u32>> = BTreeMap::new();
                for (q, r) in rotations.iter().filter(|(_, r)| !r.is_identity()) {
                    groups.entry(r.gate_name()).or_default().push(*q);
                }
                for (name, qubits) in groups {
                    out.append_qubits(name, qubits, [])?;
                }
            }
            Layer::Interact(interactions) => append_interactions(out, interactions)?,
            Layer::Swap(pairs) => append_pairs(out, "SWAP", pairs.iter().copied())?,
            Layer::ISwap(pairs) => append_pairs(out, "ISWAP", pairs.iter().copied())?,
            Layer::InteractSwap(interactions) => {
                let mut fused: BTreeMap<&'static str, Vec<(u32, u32)>> = BTreeMap::new();
                let mut split = Vec::new();
                for interaction in interactions {
                    match interaction.gate_targets() {
                        ("CZ", c, t) => fused.entry("CZSWAP").or_default().push((c, t)),
                        ("CX", c, t) => fused.entry("CXSWAP").or_default().push((c, t)),
                        _ => split.push(*interaction),
                    }
                }
                for (name, pairs) in fused {
                    append_pairs(out, name, pairs)?;
                }
                if !split.is_empty() {
                    // No single gate; the swaps need their own step.
                    append_interactions(out, &split)?;
                    out.tick();
                    append_pairs(out, "SWAP", split.iter().map(Interaction::pair))?;
                }
            }
            Layer::Reset(resets) => {
                for (q, b) in resets {
                    out.append_qubits(reset_gate(*b), [*q], [])?;
                }
            }
            Layer::Measure(targets) => {
                for t in targets {
                    out.append_qubits(measure_gate(t.basis), [t.qubit], t.args.iter().copied())?;
                }
            }
            Layer::Mpp(products) => {
                for p in products {
                    let factors = p.factors.iter().map(|(q, b)| Target::pauli(*b, *q));
                    out.append("MPP", join_products([factors]), p.args.iter().copied())?;
                }
            }
            Layer::QubitCoords(coords) => {
                for (q, args) in coords {
                    out.append("QUBIT_COORDS", [Target::qubit(*q)], args.iter().copied())?;
                }
            }
            Layer::ShiftCoords(shift) => {
                out.append("SHIFT_COORDS", [], shift.iter().copied())?;
            }
            Layer::DetObs(instructions) | Layer::Feedback(instructions) | Layer::Noise(instructions) => {
                for i in instructions {
                    out.push(i.clone());
                }
            }
            Layer::Loop(l) => {
                let mut body = l.body.to_circuit()?;
                body.tick();
                out.push_repeat(l.repetitions, body);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Basis::{X, Y, Z};

    fn rotations(entries: &[(u32, &str)]) -> Layer {
        Layer::Rotation(
            entries
                .iter()
                .map(|(q, n)| (*q, Rotation::from_gate(n).unwrap()))
                .collect(),
        )
    }

    fn render(layer: &Layer) -> String {
        let mut c = Circuit::new();
        layer.append_into(&mut c).unwrap();
        c.to_string()
    }

    #[test]
    fn test_interaction_orientation() {
        let cx = Interaction::from_gate("CX", 3, 1).unwrap();
        let xcz = Interaction::from_gate("XCZ", 1, 3).unwrap();
        assert_eq!(cx, xcz);
        assert_eq!(cx.gate_targets(), ("CX", 3, 1));
        let cz = Interaction::from_gate("CZ", 5, 2).unwrap();
        assert_eq!(cz.gate_targets(), ("CZ", 2, 5));
        let ycx = Interaction::from_gate("YCX", 0, 1).unwrap();
        assert_eq!(ycx.gate_targets(), ("XCY", 1, 0));
    }

    #[test]
    fn test_render_rotation_layer() {
        let layer = rotations(&[(2, "H"), (0, "H"), (1, "S")]);
        assert_eq!(render(&layer), "H 0 2\nS 1\n");
    }

    #[test]
    fn test_disjoint_same_kind_absorbs() {
        let mut a = Layer::Reset(vec![(0, Z)]);
        assert!(a.try_absorb(Layer::Reset(vec![(1, X)])).is_none());
        assert_eq!(render(&a), "R 0\nRX 1\n");
        assert!(a.try_absorb(Layer::Reset(vec![(1, Z)])).is_some());
        assert!(a.try_absorb(Layer::Measure(vec![])).is_some());
    }

    #[test]
    fn test_rotations_compose() {
        let fused = rotations(&[(0, "H"), (1, "S")]).fused_with(rotations(&[(0, "H"), (1, "S")]));
        assert_eq!(fused, vec![rotations(&[(1, "Z")])]);
        let cancelled = rotations(&[(0, "H")]).fused_with(rotations(&[(0, "H")]));
        assert!(cancelled.is_empty());
    }

    #[test]
    fn test_rotation_before_reset_is_dropped() {
        let fused = rotations(&[(0, "H"), (1, "H")]).fused_with(Layer::Reset(vec![(0, Z)]));
        assert_eq!(fused, vec![rotations(&[(1, "H")]), Layer::Reset(vec![(0, Z)])]);
    }

    #[test]
    fn test_interact_then_swap_fuses() {
        let cz = Layer::Interact(vec![Interaction::from_gate("CZ", 0, 1).unwrap()]);
        let fused = cz.fused_with(Layer::Swap(vec![(0, 1)]));
        assert_eq!(fused.len(), 1);
        assert_eq!(render(&fused[0]), "CZSWAP 0 1\n");

        let cx = Layer::Interact(vec![Interaction::from_gate("CX", 0, 1).unwrap()]);
        let fused = Layer::Swap(vec![(0, 1)]).fused_with(cx);
        assert_eq!(render(&fused[0]), "CXSWAP 1 0\n");

        let other = Layer::Interact(vec![Interaction::from_gate("CX", 0, 1).unwrap()]);
        assert_eq!(other.fused_with(Layer::Swap(vec![(0, 2)])).len(), 2);
    }

    #[test]
    fn test_overlapping_measurements_do_not_merge() {
        let m = |q| {
            Layer::Measure(vec![MeasureTarget {
                qubit: q,
                basis: Z,
                args: vec![],
            }])
        };
        assert_eq!(m(0).fused_with(m(0)).len(), 2);
        assert_eq!(m(0).fused_with(m(1)).len(), 1);
    }

    #[test]
    fn test_shift_coords_accumulate() {
        let fused = Layer::ShiftCoords(vec![0.0, 0.0, 1.0]).fused_with(Layer::ShiftCoords(vec![1.0, 0.0, 1.0, 5.0]));
        assert_eq!(fused, vec![Layer::ShiftCoords(vec![1.0, 0.0, 2.0, 5.0])]);
    }

    #[test]
    fn test_z_basis_measure() {
        let layer = Layer::Measure(vec![
            MeasureTarget {
                qubit: 0,
                basis: X,
                args: vec![0.01],
            },
            MeasureTarget {
                qubit: 1,
                basis: Z,
                args: vec![0.01],
            },
        ]);
        let out = layer.to_z_basis();
        assert_eq!(out.len(), 3);
        assert_eq!(render(&out[0]), "H 0\n");
        assert_eq!(render(&out[1]), "M(0.01) 0 1\n");
        assert_eq!(out[0], out[2]);
        assert_eq!(out[1].to_z_basis(), vec![out[1].clone()]);
    }

    #[test]
    fn test_z_basis_reset_and_mpp() {
        let out = Layer::Reset(vec![(0, Y), (1, Z)]).to_z_basis();
        assert_eq!(out.iter().map(render).collect::<String>(), "R 0 1\nH_YZ 0\n");

        let mpp = Layer::Mpp(vec![Product {
            factors: vec![(0, X), (1, Y), (2, Z)],
            args: vec![],
        }]);
        let out = mpp.to_z_basis();
        assert_eq!(render(&out[0]), "H 0\nH_YZ 1\n");
        assert_eq!(render(&out[1]), "MPP Z0*Z1*Z2\n");
    }

    #[test]
    fn test_z_basis_interact_swap_moves_undo_rotation() {
        let layer = Layer::InteractSwap(vec![Interaction::from_gate("CX", 0, 1).unwrap()]);
        let out = layer.to_z_basis();
        assert_eq!(render(&out[0]), "H 1\n");
        assert_eq!(render(&out[1]), "CZSWAP 0 1\n");
        assert_eq!(render(&out[2]), "H 0\n");
    }

    #[test]
    fn test_generic_interact_swap_splits() {
        let layer = Layer::InteractSwap(vec![Interaction::from_gate("XCX", 0, 1).unwrap()]);
        assert_eq!(render(&layer), "XCX 0 1\nTICK\nSWAP 0 1\n");
    }

    #[test]
    fn test_disjointness() {
        assert!(Layer::Reset(vec![(0, Z), (1, Z)]).is_disjoint());
        assert!(!Layer::Reset(vec![(0, Z), (0, X)]).is_disjoint());
        assert!(!Layer::Swap(vec![(0, 1), (1, 2)]).is_disjoint());
    }
}
