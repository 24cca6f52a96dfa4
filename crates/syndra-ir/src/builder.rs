//! The circuit builder.
//!
//! A [`Builder`] turns coordinate-level construction calls into a
//! [`Circuit`]. It owns the coordinate-to-index map (fixed when the builder
//! is created) and delegates every measurement to a shared
//! [`MeasurementTracker`], so detectors and observables can refer to results
//! by key instead of by record offset.
//!
//! # Example
//!
//! ```rust
//! use syndra_ir::{Builder, Coord, DetectorOptions, PauliMap};
//!
//! let (a, b) = (Coord::new(0.0, 0.0), Coord::new(1.0, 0.0));
//! let mut builder = Builder::for_qubits([b, a]);
//! let xx = PauliMap::new().with_xs([a, b]);
//! builder.measure_pauli_product(&xx, "first").unwrap();
//! builder.tick();
//! builder.measure_pauli_product(&xx, "second").unwrap();
//! builder.detector(["first", "second"], DetectorOptions::default()).unwrap();
//!
//! assert!(builder.circuit().to_string().ends_with("DETECTOR rec[-2] rec[-1]\n"));
//! ```

use serde::{Deserialize, Serialize};
use std::cell::Ref;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::circuit::Circuit;
use crate::coord::{Coord, sorted_coords};
use crate::error::{IrError, IrResult};
use crate::gate::{Gate, GateCategory, controlled_pauli_gate, measure_gate, reset_gate};
use crate::instruction::Instruction;
use crate::patch::Patch;
use crate::pauli::{Basis, PauliMap};
use crate::target::{Target, join_products};
use crate::tracker::{MeasurementKey, MeasurementTracker, TrackerHandle};

/// How a patch's parity checks are realized physically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStyle {
    /// One joint product measurement per check.
    #[default]
    ProductMeasurement,
    /// Prepare the measurement qubit in X, apply ancilla-controlled Paulis to
    /// the data in interaction order, then measure the ancilla in X.
    AncillaControlled,
}

/// Coordinate payload and lookup options for [`Builder::detector`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectorOptions {
    /// Position of the detector. Without it no coordinates are emitted.
    pub pos: Option<Coord>,
    /// Time coordinate.
    pub t: f64,
    /// Additional coordinates after the time coordinate.
    pub extra_coords: Vec<f64>,
    /// Append a trailing `1` coordinate marking the detector for post-selection.
    pub post_selected: bool,
    /// Drop keys that were never bound instead of failing.
    pub ignore_missing: bool,
}

impl DetectorOptions {
    /// Options placing the detector at `pos`.
    pub fn at(pos: Coord) -> Self {
        Self {
            pos: Some(pos),
            ..Self::default()
        }
    }

    /// Set the time coordinate.
    #[must_use]
    pub fn with_time(mut self, t: f64) -> Self {
        self.t = t;
        self
    }

    /// Set extra coordinates.
    #[must_use]
    pub fn with_extra_coords(mut self, extra: impl IntoIterator<Item = f64>) -> Self {
        self.extra_coords = extra.into_iter().collect();
        self
    }

    /// Mark for post-selection.
    #[must_use]
    pub fn post_selected(mut self) -> Self {
        self.post_selected = true;
        self
    }

    /// Skip unbound keys.
    #[must_use]
    pub fn ignoring_missing(mut self) -> Self {
        self.ignore_missing = true;
        self
    }

    fn coordinates(&self) -> IrResult<Vec<f64>> {
        match self.pos {
            Some(pos) => {
                let mut coords = vec![pos.re, pos.im, self.t];
                coords.extend(&self.extra_coords);
                if self.post_selected {
                    coords.push(1.0);
                }
                Ok(coords)
            }
            None if !self.extra_coords.is_empty() => Err(IrError::InvalidArgument(
                "detector has extra coordinates but no position".into(),
            )),
            None if self.post_selected => Err(IrError::InvalidArgument(
                "detector is post-selected but has no position".into(),
            )),
            None => Ok(vec![]),
        }
    }
}

/// Builds circuits over a fixed set of qubit coordinates.
#[derive(Debug)]
pub struct Builder {
    q2i: Rc<FxHashMap<Coord, u32>>,
    circuit: Circuit,
    tracker: TrackerHandle,
}

impl Builder {
    /// Create a builder for the given qubits.
    ///
    /// Indices are assigned in canonical coordinate order, and one coordinate
    /// declaration per qubit is emitted in that order.
    pub fn for_qubits(qubits: impl IntoIterator<Item = Coord>) -> Self {
        Self::for_qubits_with(qubits, |c| c)
    }

    /// Like [`for_qubits`](Self::for_qubits), with `to_circuit_coords`
    /// applied to the declared coordinates only.
    pub fn for_qubits_with(
        qubits: impl IntoIterator<Item = Coord>,
        to_circuit_coords: impl Fn(Coord) -> Coord,
    ) -> Self {
        let sorted = sorted_coords(qubits);
        let mut q2i = FxHashMap::default();
        let mut circuit = Circuit::new();
        for (i, q) in (0u32..).zip(&sorted) {
            q2i.insert(*q, i);
            let c = to_circuit_coords(*q);
            circuit.push(Instruction {
                name: "QUBIT_COORDS".to_string(),
                targets: vec![Target::qubit(i)],
                args: vec![c.re, c.im],
            });
        }
        debug!("Created builder over {} qubits", sorted.len());
        Self {
            q2i: Rc::new(q2i),
            circuit,
            tracker: MeasurementTracker::new().into_handle(),
        }
    }

    /// A builder sharing this one's tracker but appending into a new, empty
    /// circuit. Used for loop bodies.
    pub fn fork(&self) -> Self {
        Self {
            q2i: Rc::clone(&self.q2i),
            circuit: Circuit::new(),
            tracker: Rc::clone(&self.tracker),
        }
    }

    /// A fully independent copy (circuit and tracker).
    pub fn copy(&self) -> Self {
        Self {
            q2i: Rc::new((*self.q2i).clone()),
            circuit: self.circuit.clone(),
            tracker: self.tracker.borrow().clone().into_handle(),
        }
    }

    /// The circuit built so far.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Mutable access to the circuit, for splicing in externally built parts.
    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    /// Consume the builder, returning its circuit.
    pub fn into_circuit(self) -> Circuit {
        self.circuit
    }

    /// The measurement tracker.
    pub fn tracker(&self) -> Ref<'_, MeasurementTracker> {
        self.tracker.borrow()
    }

    /// The shared tracker handle.
    pub fn tracker_handle(&self) -> &TrackerHandle {
        &self.tracker
    }

    /// Number of qubits known to this builder.
    pub fn num_qubits(&self) -> usize {
        self.q2i.len()
    }

    /// Index of a qubit coordinate.
    pub fn index_of(&self, q: Coord) -> IrResult<u32> {
        self.lookup(q, None)
    }

    fn lookup(&self, q: Coord, gate_name: Option<&str>) -> IrResult<u32> {
        self.q2i
            .get(&q)
            .copied()
            .ok_or_else(|| IrError::UnknownQubit {
                coord: q,
                gate_name: gate_name.map(str::to_string),
            })
    }

    fn indices(&self, qubits: &[Coord], gate_name: &str) -> IrResult<Vec<u32>> {
        qubits
            .iter()
            .map(|q| self.lookup(*q, Some(gate_name)))
            .collect()
    }

    /// Apply a single-qubit gate, reset or single-qubit error channel.
    ///
    /// Qubits are emitted in canonical order. Empty input emits nothing.
    pub fn gate(
        &mut self,
        name: &str,
        qubits: impl IntoIterator<Item = Coord>,
        args: &[f64],
    ) -> IrResult<()> {
        let gate = Gate::lookup(name)?;
        if !matches!(
            gate.category,
            GateCategory::Clifford1q | GateCategory::Reset | GateCategory::Noise1q
        ) {
            return Err(IrError::InvalidArgument(format!(
                "'{}' is not a single-qubit operation usable with gate()",
                gate.name
            )));
        }
        let mut qubits: Vec<Coord> = qubits.into_iter().collect();
        qubits.sort();
        if qubits.is_empty() {
            return Ok(());
        }
        let indices = self.indices(&qubits, gate.name)?;
        self.circuit
            .append_qubits(gate.name, indices, args.iter().copied())?;
        Ok(())
    }

    /// Apply a two-qubit gate to each pair.
    ///
    /// Pairs are emitted in canonical order. Orientation-symmetric gates get
    /// each pair sorted; operand-reversed aliases (`XCZ`, `YCZ`, `SWAPCX`) are
    /// rewritten to their primitive with the operands swapped.
    pub fn gate2(
        &mut self,
        name: &str,
        pairs: impl IntoIterator<Item = (Coord, Coord)>,
    ) -> IrResult<()> {
        let mut gate = Gate::lookup(name)?;
        if !matches!(gate.category, GateCategory::Clifford2q | GateCategory::Noise2q) {
            return Err(IrError::InvalidArgument(format!(
                "'{}' is not a two-qubit operation usable with gate2()",
                gate.name
            )));
        }
        let mut pairs: Vec<(Coord, Coord)> = pairs.into_iter().collect();
        pairs.sort();
        if let Some(primitive) = gate.reversed_operand_alias() {
            gate = primitive;
            for pair in &mut pairs {
                *pair = (pair.1, pair.0);
            }
        }
        if gate.is_orientation_symmetric() {
            for pair in &mut pairs {
                if pair.1 < pair.0 {
                    *pair = (pair.1, pair.0);
                }
            }
        }
        if pairs.is_empty() {
            return Ok(());
        }
        let flat: Vec<Coord> = pairs.iter().flat_map(|&(a, b)| [a, b]).collect();
        let indices = self.indices(&flat, gate.name)?;
        self.circuit.append_qubits(gate.name, indices, [])?;
        Ok(())
    }

    /// `CZ` on each pair.
    pub fn cz(&mut self, pairs: impl IntoIterator<Item = (Coord, Coord)>) -> IrResult<()> {
        self.gate2("CZ", pairs)
    }

    /// `SWAP` on each pair.
    pub fn swap(&mut self, pairs: impl IntoIterator<Item = (Coord, Coord)>) -> IrResult<()> {
        self.gate2("SWAP", pairs)
    }

    /// Shift detector coordinates by a spatial offset and a time offset.
    pub fn shift_coords(&mut self, dp: Coord, dt: f64) {
        self.circuit.push(Instruction {
            name: "SHIFT_COORDS".to_string(),
            targets: vec![],
            args: vec![dp.re, dp.im, dt],
        });
    }

    /// Append a step boundary.
    pub fn tick(&mut self) {
        self.circuit.tick();
    }

    /// Measure qubits in `basis`, binding `key_fn(q)@layer` for each qubit.
    ///
    /// The k-th emitted target corresponds to the k-th bound key.
    pub fn measure(
        &mut self,
        qubits: impl IntoIterator<Item = Coord>,
        basis: Basis,
        key_fn: impl Fn(Coord) -> MeasurementKey,
        layer: &str,
    ) -> IrResult<()> {
        let mut qubits: Vec<Coord> = qubits.into_iter().collect();
        qubits.sort();
        if qubits.is_empty() {
            return Ok(());
        }
        let name = measure_gate(basis);
        let indices = self.indices(&qubits, name)?;
        let keys: Vec<MeasurementKey> = qubits
            .iter()
            .map(|q| MeasurementKey::at_layer(key_fn(*q), layer))
            .collect();
        {
            let tracker = self.tracker.borrow();
            let mut seen = FxHashSet::default();
            if let Some(taken) = keys
                .iter()
                .find(|k| tracker.contains(k) || !seen.insert(*k))
            {
                return Err(IrError::KeyCollision(taken.clone()));
            }
        }
        self.circuit.append_qubits(name, indices, [])?;
        let mut tracker = self.tracker.borrow_mut();
        for key in keys {
            tracker.record_measurement(key)?;
        }
        Ok(())
    }

    /// Measure a Pauli product as one joint measurement bound to `key`.
    ///
    /// An identity product emits nothing and binds `key` to an empty group.
    pub fn measure_pauli_product(
        &mut self,
        product: &PauliMap,
        key: impl Into<MeasurementKey>,
    ) -> IrResult<()> {
        self.measure_pauli_product_with_noise(product, key, None)
    }

    /// Like [`measure_pauli_product`](Self::measure_pauli_product), with an
    /// optional result-flip probability on the measurement.
    pub fn measure_pauli_product_with_noise(
        &mut self,
        product: &PauliMap,
        key: impl Into<MeasurementKey>,
        flip_probability: Option<f64>,
    ) -> IrResult<()> {
        let key = key.into();
        if product.is_empty() {
            return self
                .tracker
                .borrow_mut()
                .make_measurement_group(Vec::<MeasurementKey>::new(), key);
        }
        if self.tracker.borrow().contains(&key) {
            return Err(IrError::KeyCollision(key));
        }
        let factors = product
            .iter()
            .map(|(q, basis)| Ok(Target::pauli(basis, self.lookup(q, Some("MPP"))?)))
            .collect::<IrResult<Vec<_>>>()?;
        let targets = join_products([factors]);
        trace!("MPP over {} qubits bound to {key}", product.len());
        self.circuit.append("MPP", targets, flip_probability)?;
        self.tracker.borrow_mut().record_measurement(key)
    }

    /// Append a detector over the XOR of `keys`.
    pub fn detector<K>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
        options: DetectorOptions,
    ) -> IrResult<()>
    where
        K: Into<MeasurementKey>,
    {
        let coords = options.coordinates()?;
        let tracker = self.tracker.borrow();
        let keys: Vec<MeasurementKey> = keys
            .into_iter()
            .map(Into::into)
            .filter(|k| !options.ignore_missing || tracker.contains(k))
            .collect();
        let targets = tracker.current_measurement_record_targets_for(keys)?;
        drop(tracker);
        self.circuit.append("DETECTOR", targets, coords)?;
        Ok(())
    }

    /// Include the XOR of `keys` in logical observable `index`.
    ///
    /// Emits nothing when the keys cancel out.
    pub fn obs_include<K>(&mut self, keys: impl IntoIterator<Item = K>, index: u32) -> IrResult<()>
    where
        K: Into<MeasurementKey>,
    {
        let targets = self
            .tracker
            .borrow()
            .current_measurement_record_targets_for(keys)?;
        if targets.is_empty() {
            return Ok(());
        }
        self.circuit
            .append("OBSERVABLE_INCLUDE", targets, [f64::from(index)])?;
        Ok(())
    }

    /// For every result resolved from `control_keys`, apply a classically
    /// controlled Pauli `basis` to each target qubit.
    pub fn classical_paulis<K>(
        &mut self,
        control_keys: impl IntoIterator<Item = K>,
        targets: impl IntoIterator<Item = Coord>,
        basis: Basis,
    ) -> IrResult<()>
    where
        K: Into<MeasurementKey>,
    {
        let name = controlled_pauli_gate(basis);
        let mut qubits: Vec<Coord> = targets.into_iter().collect();
        qubits.sort();
        let indices = self.indices(&qubits, name)?;
        let records = self
            .tracker
            .borrow()
            .current_measurement_record_targets_for(control_keys)?;
        for rec in records {
            for &i in &indices {
                self.circuit.append(name, [rec, Target::qubit(i)], [])?;
            }
        }
        Ok(())
    }

    /// Measure every tile of a patch, binding `measurement_qubit@save_layer`.
    ///
    /// With `cmp_layer`, also emits one detector per tile comparing the two
    /// layers, positioned at the tile's measurement qubit.
    pub fn measure_patch(
        &mut self,
        patch: &Patch,
        save_layer: &str,
        cmp_layer: Option<&str>,
        style: CheckStyle,
    ) -> IrResult<()> {
        debug!(
            "Measuring {} tiles at layer '{save_layer}' ({style:?})",
            patch.tiles().len()
        );
        match style {
            CheckStyle::ProductMeasurement => {
                for tile in patch.tiles() {
                    let key = MeasurementKey::at_layer(tile.measurement_qubit(), save_layer);
                    self.measure_pauli_product(&tile.to_data_pauli_map(), key)?;
                }
            }
            CheckStyle::AncillaControlled => self.measure_patch_with_ancillas(patch, save_layer)?,
        }
        if let Some(cmp) = cmp_layer {
            for tile in patch.tiles() {
                let m = tile.measurement_qubit();
                self.detector(
                    [
                        MeasurementKey::at_layer(m, save_layer),
                        MeasurementKey::at_layer(m, cmp),
                    ],
                    DetectorOptions::at(m),
                )?;
            }
        }
        Ok(())
    }

    fn measure_patch_with_ancillas(&mut self, patch: &Patch, save_layer: &str) -> IrResult<()> {
        let ancillas: Vec<Coord> = patch.tiles().iter().map(|t| t.measurement_qubit()).collect();
        self.gate(reset_gate(Basis::X), ancillas.iter().copied(), &[])?;
        self.tick();
        let depth = patch
            .tiles()
            .iter()
            .map(|t| t.ordered_data_qubits().len())
            .max()
            .unwrap_or(0);
        for slot in 0..depth {
            for basis in Basis::ALL {
                let pairs = patch.tiles().iter().filter_map(|tile| {
                    let data = tile.ordered_data_qubits().get(slot).copied().flatten()?;
                    (tile.bases()[slot] == basis).then_some((tile.measurement_qubit(), data))
                });
                self.gate2(controlled_pauli_gate(basis), pairs)?;
            }
            self.tick();
        }
        self.measure(ancillas, Basis::X, MeasurementKey::from, save_layer)
    }

    /// Measure data qubits transversally in `basis` and compare each matching
    /// tile against its measurement at `cmp_layer`.
    ///
    /// Tiles whose uniform basis differs from `basis` get no detector. A tile
    /// with mixed bases fails with [`IrError::BasisMismatch`].
    pub fn measure_data_and_compare(
        &mut self,
        patch: &Patch,
        basis: Basis,
        data_layer: &str,
        cmp_layer: &str,
    ) -> IrResult<()> {
        for tile in patch.tiles() {
            if tile.basis().is_none() && !tile.data_set().is_empty() {
                let actual: String = tile.bases().iter().map(|b| b.letter()).collect();
                return Err(IrError::BasisMismatch {
                    coord: tile.measurement_qubit(),
                    expected: basis.to_string(),
                    actual,
                });
            }
        }
        self.measure(patch.data_set(), basis, MeasurementKey::from, data_layer)?;
        for tile in patch.tiles() {
            if tile.basis() != Some(basis) {
                continue;
            }
            let m = tile.measurement_qubit();
            let mut keys: Vec<MeasurementKey> = tile
                .data_set()
                .into_iter()
                .map(|q| MeasurementKey::at_layer(q, data_layer))
                .collect();
            keys.push(MeasurementKey::at_layer(m, cmp_layer));
            self.detector(keys, DetectorOptions::at(m))?;
        }
        Ok(())
    }

    /// Demolition measurements followed by resets and feedback that make the
    /// qubits look, to later detectors, as if they had not been reset.
    pub fn demolition_measure_with_feedback_passthrough(
        &mut self,
        xs: &[Coord],
        ys: &[Coord],
        zs: &[Coord],
        key_fn: impl Fn(Coord) -> MeasurementKey,
        layer: &str,
    ) -> IrResult<()> {
        self.measure(xs.iter().copied(), Basis::X, &key_fn, layer)?;
        self.measure(ys.iter().copied(), Basis::Y, &key_fn, layer)?;
        self.measure(zs.iter().copied(), Basis::Z, &key_fn, layer)?;
        self.tick();
        self.gate(reset_gate(Basis::X), xs.iter().copied(), &[])?;
        self.gate(reset_gate(Basis::Y), ys.iter().copied(), &[])?;
        self.gate(reset_gate(Basis::Z), zs.iter().copied(), &[])?;
        for (qubits, feedback) in [(xs, Basis::Z), (ys, Basis::X), (zs, Basis::X)] {
            for &q in qubits {
                self.classical_paulis(
                    [MeasurementKey::at_layer(key_fn(q), layer)],
                    [q],
                    feedback,
                )?;
            }
        }
        Ok(())
    }

    /// Splice a forked loop body back in, repeated `count` times.
    ///
    /// The body's measurements must be the most recent ones in the shared
    /// tracker. Keys bound inside the body afterwards refer to the final
    /// repetition.
    pub fn append_repeated(&mut self, body: &Circuit, count: u64) -> IrResult<()> {
        let per_body = body.num_measurements();
        self.tracker.borrow_mut().repeat_recent(per_body, count)?;
        self.circuit.push_repeat(count, body.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Coord {
        Coord::new(re, im)
    }

    #[test]
    fn test_for_qubits_canonical_order() {
        let b = Builder::for_qubits([c(1.0, 0.0), c(0.5, 0.0), c(0.0, 1.0), c(1.0, 0.0)]);
        assert_eq!(
            b.circuit().to_string(),
            "QUBIT_COORDS(0, 1) 0\nQUBIT_COORDS(1, 0) 1\nQUBIT_COORDS(0.5, 0) 2\n"
        );
        assert_eq!(b.num_qubits(), 3);
    }

    #[test]
    fn test_for_qubits_with_transform() {
        let b = Builder::for_qubits_with([c(1.0, 0.0)], |q| q * 2.0);
        assert_eq!(b.circuit().to_string(), "QUBIT_COORDS(2, 0) 0\n");
        assert_eq!(b.index_of(c(1.0, 0.0)).unwrap(), 0);
    }

    #[test]
    fn test_gate_sorts_and_skips_empty() {
        let mut b = Builder::for_qubits([c(0.0, 0.0), c(1.0, 0.0)]);
        b.gate("H", [c(1.0, 0.0), c(0.0, 0.0)], &[]).unwrap();
        b.gate("H", [], &[]).unwrap();
        let last = b.circuit().last().and_then(|op| op.as_instruction()).unwrap();
        assert_eq!(last.to_string(), "H 0 1");
        assert!(b.gate("CX", [c(0.0, 0.0)], &[]).is_err());
        assert!(b.gate("M", [c(0.0, 0.0)], &[]).is_err());
    }

    #[test]
    fn test_unknown_qubit() {
        let mut b = Builder::for_qubits([c(0.0, 0.0)]);
        let err = b.gate("H", [c(5.0, 5.0)], &[]).unwrap_err();
        assert!(matches!(err, IrError::UnknownQubit { .. }));
        assert!(err.to_string().contains("gate: H"));
    }

    #[test]
    fn test_gate2_symmetric_and_reversed() {
        let (a, z) = (c(0.0, 0.0), c(1.0, 0.0));
        let mut b = Builder::for_qubits([a, z]);
        b.gate2("CZ", [(z, a)]).unwrap();
        b.tick();
        b.gate2("XCZ", [(a, z)]).unwrap();
        b.tick();
        b.gate2("CX", [(z, a)]).unwrap();
        let text = b.circuit().to_string();
        assert!(text.contains("CZ 0 1\n"));
        assert!(text.contains("TICK\nCX 1 0\nTICK\nCX 1 0\n"));
    }

    #[test]
    fn test_measure_binds_in_emission_order() {
        let (a, z) = (c(0.0, 0.0), c(1.0, 0.0));
        let mut b = Builder::for_qubits([a, z]);
        b.measure([z, a], Basis::X, MeasurementKey::from, "r0").unwrap();
        let t = b.tracker();
        assert_eq!(
            t.measurement_indices([MeasurementKey::at_layer(a, "r0")]).unwrap(),
            vec![0]
        );
        assert_eq!(
            t.measurement_indices([MeasurementKey::at_layer(z, "r0")]).unwrap(),
            vec![1]
        );
    }

    #[test]
    fn test_measure_collision_emits_nothing() {
        let a = c(0.0, 0.0);
        let mut b = Builder::for_qubits([a]);
        b.measure([a], Basis::Z, MeasurementKey::from, "r").unwrap();
        let before = b.circuit().clone();
        assert!(matches!(
            b.measure([a], Basis::Z, MeasurementKey::from, "r"),
            Err(IrError::KeyCollision(_))
        ));
        assert_eq!(b.circuit(), &before);
    }

    #[test]
    fn test_pauli_product_cancellation() {
        let (a, z) = (c(0.0, 0.0), c(1.0, 0.0));
        let mut b = Builder::for_qubits([a, z]);
        let p = PauliMap::new().with_xs([a, z]).with_pairs([(a, Basis::X)]);
        b.measure_pauli_product(&p, "k").unwrap();
        let p = PauliMap::new().with_xs([a]).with_zs([a]);
        b.measure_pauli_product(&p, "y").unwrap();
        let text = b.circuit().to_string();
        assert!(text.ends_with("MPP X1 Y0\n"));
        b.measure_pauli_product(&PauliMap::new(), "empty").unwrap();
        assert_eq!(b.tracker().num_measurements(), 2);
        assert!(b.tracker().measurement_indices(["empty"]).unwrap().is_empty());
    }

    #[test]
    fn test_detector_coordinates() {
        let a = c(2.0, 3.0);
        let mut b = Builder::for_qubits([a]);
        b.measure([a], Basis::Z, MeasurementKey::from, "r").unwrap();
        let key = MeasurementKey::at_layer(a, "r");
        b.detector(
            [key.clone()],
            DetectorOptions::at(a)
                .with_time(1.0)
                .with_extra_coords([7.0])
                .post_selected(),
        )
        .unwrap();
        assert!(b.circuit().to_string().ends_with("DETECTOR(2, 3, 1, 7, 1) rec[-1]\n"));
        assert!(
            b.detector([key], DetectorOptions::default().post_selected())
                .is_err()
        );
    }

    #[test]
    fn test_detector_ignore_missing() {
        let a = c(0.0, 0.0);
        let mut b = Builder::for_qubits([a]);
        b.measure([a], Basis::Z, MeasurementKey::from, "r").unwrap();
        let keys = [MeasurementKey::at_layer(a, "r"), "missing".into()];
        assert!(matches!(
            b.detector(keys.clone(), DetectorOptions::default()),
            Err(IrError::UnboundKey(_))
        ));
        b.detector(keys, DetectorOptions::default().ignoring_missing())
            .unwrap();
        assert!(b.circuit().to_string().ends_with("DETECTOR rec[-1]\n"));
    }

    #[test]
    fn test_obs_include_skips_empty() {
        let a = c(0.0, 0.0);
        let mut b = Builder::for_qubits([a]);
        b.measure([a], Basis::Z, MeasurementKey::from, "r").unwrap();
        let key = MeasurementKey::at_layer(a, "r");
        let len = b.circuit().len();
        b.obs_include([key.clone(), key.clone()], 0).unwrap();
        assert_eq!(b.circuit().len(), len);
        b.obs_include([key], 2).unwrap();
        assert!(b.circuit().to_string().ends_with("OBSERVABLE_INCLUDE(2) rec[-1]\n"));
    }

    #[test]
    fn test_classical_paulis() {
        let (a, z) = (c(0.0, 0.0), c(1.0, 0.0));
        let mut b = Builder::for_qubits([a, z]);
        b.measure([a], Basis::Z, MeasurementKey::from, "r").unwrap();
        b.classical_paulis([MeasurementKey::at_layer(a, "r")], [z, a], Basis::X)
            .unwrap();
        assert!(b.circuit().to_string().ends_with("CX rec[-1] 0 rec[-1] 1\n"));
    }

    #[test]
    fn test_fork_shares_tracker() {
        let a = c(0.0, 0.0);
        let mut parent = Builder::for_qubits([a]);
        parent
            .measure_pauli_product(&PauliMap::new().with_zs([a]), "before")
            .unwrap();
        let mut child = parent.fork();
        child
            .measure_pauli_product(&PauliMap::new().with_zs([a]), "inside")
            .unwrap();
        child
            .detector(["before", "inside"], DetectorOptions::default())
            .unwrap();
        assert_eq!(child.circuit().to_string(), "MPP Z0\nDETECTOR rec[-2] rec[-1]\n");
        assert!(parent.tracker().contains(&"inside".into()));

        let copy = parent.copy();
        child
            .measure_pauli_product(&PauliMap::new().with_zs([a]), "later")
            .unwrap();
        assert!(!copy.tracker().contains(&"later".into()));
    }

    #[test]
    fn test_measure_patch_product_style() {
        let (d0, d1, m) = (c(0.0, 0.0), c(1.0, 0.0), c(0.5, 0.5));
        let patch = Patch::new([crate::patch::Tile::with_data("X", m, [d0, d1]).unwrap()]);
        let mut b = Builder::for_qubits(patch.used_set());
        b.measure_patch(&patch, "a", None, CheckStyle::ProductMeasurement)
            .unwrap();
        b.tick();
        b.measure_patch(&patch, "b", Some("a"), CheckStyle::ProductMeasurement)
            .unwrap();
        assert!(
            b.circuit()
                .to_string()
                .ends_with("MPP X0*X1\nTICK\nMPP X0*X1\nDETECTOR(0.5, 0.5, 0) rec[-2] rec[-1]\n")
        );
    }

    #[test]
    fn test_measure_patch_ancilla_style() {
        let (d0, d1, m) = (c(0.0, 0.0), c(1.0, 0.0), c(0.5, 0.5));
        let patch = Patch::new([crate::patch::Tile::new("XZ", m, [Some(d0), Some(d1)]).unwrap()]);
        let mut b = Builder::for_qubits(patch.used_set());
        b.measure_patch(&patch, "a", None, CheckStyle::AncillaControlled)
            .unwrap();
        let text = b.circuit().to_string();
        assert!(text.ends_with("RX 2\nTICK\nCX 2 0\nTICK\nCZ 1 2\nTICK\nMX 2\n"));
        assert_eq!(b.tracker().num_measurements(), 1);
    }

    #[test]
    fn test_measure_data_and_compare() {
        let (d0, d1, m) = (c(0.0, 0.0), c(1.0, 0.0), c(0.5, 0.5));
        let tile = crate::patch::Tile::with_data("Z", m, [d0, d1]).unwrap();
        let patch = Patch::new([tile]);
        let mut b = Builder::for_qubits(patch.used_set());
        b.measure_patch(&patch, "init", None, CheckStyle::ProductMeasurement)
            .unwrap();
        b.measure_data_and_compare(&patch, Basis::Z, "data", "init")
            .unwrap();
        assert!(
            b.circuit()
                .to_string()
                .ends_with("M 0 1\nDETECTOR(0.5, 0.5, 0) rec[-3] rec[-2] rec[-1]\n")
        );

        let mixed = Patch::new([crate::patch::Tile::with_data("XZ", m, [d0, d1]).unwrap()]);
        assert!(matches!(
            b.measure_data_and_compare(&mixed, Basis::Z, "data2", "init"),
            Err(IrError::BasisMismatch { .. })
        ));
    }

    #[test]
    fn test_demolition_passthrough() {
        let a = c(0.0, 0.0);
        let mut b = Builder::for_qubits([a]);
        b.demolition_measure_with_feedback_passthrough(&[a], &[], &[], MeasurementKey::from, "d")
            .unwrap();
        assert!(b.circuit().to_string().ends_with("MX 0\nTICK\nRX 0\nCZ rec[-1] 0\n"));
    }

    #[test]
    fn test_append_repeated() {
        let a = c(0.0, 0.0);
        let mut b = Builder::for_qubits([a]);
        b.measure_pauli_product(&PauliMap::new().with_zs([a]), "init")
            .unwrap();
        let mut body = b.fork();
        body.measure_pauli_product(&PauliMap::new().with_zs([a]), "loop")
            .unwrap();
        body.tick();
        b.append_repeated(body.circuit(), 4).unwrap();
        assert_eq!(b.tracker().num_measurements(), 5);
        b.measure_pauli_product(&PauliMap::new().with_zs([a]), "end")
            .unwrap();
        b.detector(["loop", "end"], DetectorOptions::default())
            .unwrap();
        assert!(b.circuit().to_string().ends_with("}\nMPP Z0\nDETECTOR rec[-2] rec[-1]\n"));
        assert_eq!(b.circuit().num_measurements(), 6);
    }
}
