//! Memory-experiment generators.
//!
//! A memory experiment prepares a patch's logical observables, measures the
//! patch's stabilizers for a number of noisy rounds, and finally reads the
//! observables back out. Detectors compare each round with the previous one.
//!
//! When both X and Z observables are requested, they would not commute with
//! each other, so each pair is entangled with an EPR ancilla: observable
//! `X_k` becomes `X_k·X(a_k)` and `Z_k` becomes `Z_k·Z(a_k)`. The ancillas
//! are immune to noise.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use syndra_ir::{
    Basis, Builder, CheckStyle, Circuit, Coord, MeasurementKey, NoiseModel, NoiseRule, Patch,
    PauliMap,
};

use crate::error::{CompileError, CompileResult};
use crate::passes::noisy_circuit;

/// Inputs shared by the memory-experiment generators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryExperiment {
    /// The stabilizers measured every round.
    pub patch: Patch,
    /// Noise applied once per moment (`after`) and to measurement results
    /// (`flip_result`).
    #[serde(default)]
    pub noise: NoiseRule,
    /// X-type logical observables.
    #[serde(default)]
    pub observables_x: Vec<PauliMap>,
    /// Z-type logical observables, paired index by index with the X ones.
    #[serde(default)]
    pub observables_z: Vec<PauliMap>,
    /// Positions for the EPR ancillas. Chosen automatically when absent.
    #[serde(default)]
    pub ancillas: Option<Vec<Coord>>,
    /// Number of noisy stabilizer rounds.
    #[serde(default = "default_rounds")]
    pub rounds: u64,
    /// How each stabilizer is measured.
    #[serde(default)]
    pub style: CheckStyle,
}

fn default_rounds() -> u64 {
    1
}

/// Observables after EPR pairing, with the ancillas they use.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedObservables {
    /// Observables to measure at the start and end of the experiment.
    pub observables: Vec<PauliMap>,
    /// One ancilla per X/Z pair; empty when no pairing was needed.
    pub ancillas: Vec<Coord>,
}

/// Pair X and Z observables through EPR ancillas.
///
/// When only one kind of observable is given it is returned unchanged.
/// Otherwise the lists must have equal length, observables of the same kind
/// must commute, and `observables_x[i]` must anticommute with
/// `observables_z[j]` exactly when `i == j`.
///
/// Without `suggested_ancillas`, the k-th ancilla is placed at
/// `min_re + k + (min_im - 1)i` relative to every qubit involved.
pub fn pair_observables(
    patch: &Patch,
    observables_x: &[PauliMap],
    observables_z: &[PauliMap],
    suggested_ancillas: Option<&[Coord]>,
) -> CompileResult<PairedObservables> {
    if observables_x.is_empty() || observables_z.is_empty() {
        let observables = if observables_x.is_empty() {
            observables_z.to_vec()
        } else {
            observables_x.to_vec()
        };
        check_pairwise_commuting(&observables, "observables")?;
        return Ok(PairedObservables {
            observables,
            ancillas: vec![],
        });
    }

    if observables_x.len() != observables_z.len() {
        return Err(CompileError::InvalidConfiguration(format!(
            "{} X observables cannot be paired with {} Z observables",
            observables_x.len(),
            observables_z.len()
        )));
    }
    check_pairwise_commuting(observables_x, "X observables")?;
    check_pairwise_commuting(observables_z, "Z observables")?;
    for (i, ox) in observables_x.iter().enumerate() {
        for (j, oz) in observables_z.iter().enumerate() {
            let commutes = ox.commutes(oz);
            if i == j && commutes {
                return Err(CompileError::InvalidConfiguration(format!(
                    "X observable {i} ({ox}) commutes with its Z partner ({oz})"
                )));
            }
            if i != j && !commutes {
                return Err(CompileError::InvalidConfiguration(format!(
                    "X observable {i} ({ox}) anticommutes with Z observable {j} ({oz})"
                )));
            }
        }
    }

    let ancillas = match suggested_ancillas {
        Some(given) if given.len() == observables_x.len() => given.to_vec(),
        Some(given) => {
            return Err(CompileError::InvalidConfiguration(format!(
                "{} ancillas given for {} observable pairs",
                given.len(),
                observables_x.len()
            )));
        }
        None => default_ancillas(patch, observables_x.len()),
    };

    let occupied = patch.used_set();
    if let Some(clash) = ancillas.iter().find(|a| occupied.contains(a)) {
        return Err(CompileError::InvalidConfiguration(format!(
            "EPR ancilla {clash} overlaps a patch qubit"
        )));
    }

    let mut observables = Vec::with_capacity(2 * ancillas.len());
    for (obs, &a) in observables_x.iter().zip(&ancillas) {
        observables.push(obs.clone().with_basis(Basis::X, [a]));
    }
    for (obs, &a) in observables_z.iter().zip(&ancillas) {
        observables.push(obs.clone().with_basis(Basis::Z, [a]));
    }
    debug!(
        "Paired {} observables through {} EPR ancillas",
        observables.len(),
        ancillas.len()
    );
    Ok(PairedObservables {
        observables,
        ancillas,
    })
}

fn check_pairwise_commuting(observables: &[PauliMap], what: &str) -> CompileResult<()> {
    for (i, a) in observables.iter().enumerate() {
        for (j, b) in observables.iter().enumerate().skip(i + 1) {
            if !a.commutes(b) {
                return Err(CompileError::InvalidConfiguration(format!(
                    "{what} {i} ({a}) and {j} ({b}) anticommute"
                )));
            }
        }
    }
    Ok(())
}

/// Places one ancilla per pair on the row below the patch's data qubits,
/// starting from the lowest real part and stepping right.
fn default_ancillas(patch: &Patch, pairs: usize) -> Vec<Coord> {
    let data = patch.data_set();
    let min_re = data.iter().map(|q| q.re).fold(f64::INFINITY, f64::min);
    let min_im = data.iter().map(|q| q.im).fold(f64::INFINITY, f64::min);
    let base = if data.is_empty() {
        Coord::new(0.0, -1.0)
    } else {
        Coord::new(min_re, min_im - 1.0)
    };
    (0..pairs).map(|k| base + Coord::real(k as f64)).collect()
}

/// Shared setup: builder, paired observables and qubit roles.
struct Experiment<'a> {
    config: &'a MemoryExperiment,
    builder: Builder,
    observables: Vec<PauliMap>,
    immune: BTreeSet<u32>,
    data: BTreeSet<u32>,
}

impl<'a> Experiment<'a> {
    fn start(config: &'a MemoryExperiment) -> CompileResult<Self> {
        config.noise.validate()?;
        let paired = pair_observables(
            &config.patch,
            &config.observables_x,
            &config.observables_z,
            config.ancillas.as_deref(),
        )?;

        let mut qubits = config.patch.data_set();
        if config.style == CheckStyle::AncillaControlled {
            qubits.extend(config.patch.measure_set());
        }
        for obs in &paired.observables {
            qubits.extend(obs.qubits());
        }
        let builder = Builder::for_qubits(qubits);

        let immune = paired
            .ancillas
            .iter()
            .map(|&a| builder.index_of(a))
            .collect::<Result<BTreeSet<u32>, _>>()?;
        let data = config
            .patch
            .data_set()
            .into_iter()
            .map(|q| builder.index_of(q))
            .collect::<Result<BTreeSet<u32>, _>>()?;

        let mut experiment = Self {
            config,
            builder,
            observables: paired.observables,
            immune,
            data,
        };
        experiment.measure_observables("OBS_START")?;
        experiment
            .builder
            .measure_patch(&config.patch, "init", None, config.style)?;
        experiment.builder.tick();
        Ok(experiment)
    }

    fn measure_observables(&mut self, prefix: &str) -> CompileResult<()> {
        for (k, obs) in (0u32..).zip(&self.observables) {
            let key = MeasurementKey::from(format!("{prefix}{k}"));
            self.builder.measure_pauli_product(obs, key.clone())?;
            self.builder.obs_include([key], k)?;
        }
        Ok(())
    }

    fn finish(mut self, cmp_layer: &str) -> CompileResult<Circuit> {
        self.builder
            .measure_patch(&self.config.patch, "end", Some(cmp_layer), self.config.style)?;
        self.measure_observables("OBS_END")?;
        let circuit = self.builder.into_circuit();
        info!(
            "Generated memory experiment: {} measurements, {} ticks",
            circuit.num_measurements(),
            circuit.num_ticks()
        );
        Ok(circuit)
    }
}

/// Build a phenomenological-noise memory experiment.
///
/// Every round measures the patch with result flips of
/// `noise.flip_result` and applies `noise.after` to each data qubit once per
/// moment. The first and last stabilizer measurements are noiseless.
pub fn make_phenomenological_circuit(config: &MemoryExperiment) -> CompileResult<Circuit> {
    if config.rounds == 0 {
        return Err(CompileError::InvalidConfiguration(
            "a memory experiment needs at least one round".into(),
        ));
    }
    let mut experiment = Experiment::start(config)?;

    let mut round = experiment.builder.fork();
    round.measure_patch(&config.patch, "loop", Some("init"), config.style)?;
    round.shift_coords(Coord::new(0.0, 0.0), 1.0);
    round.tick();

    let model = NoiseModel {
        tick_noise: Some(NoiseRule {
            after: config.noise.after.clone(),
            flip_result: 0.0,
        }),
        any_measurement_rule: Some(NoiseRule::default().with_flip_result(config.noise.flip_result)),
        any_clifford_1q_rule: Some(NoiseRule::default()),
        any_clifford_2q_rule: Some(NoiseRule::default()),
        allow_multiple_uses_of_a_qubit_in_one_tick: true,
        ..NoiseModel::default()
    };
    let mut body = noisy_circuit(
        round.circuit(),
        &model,
        &experiment.immune,
        Some(&experiment.data),
    )?;
    if !body.ends_with_tick() {
        body.tick();
    }
    debug!(
        "Round body has {} operations, repeated {} times",
        body.len(),
        config.rounds
    );
    experiment.builder.append_repeated(&body, config.rounds)?;

    experiment.finish("loop")
}

/// Build a code-capacity memory experiment.
///
/// Noise is applied exactly once, to the data qubits, between two noiseless
/// stabilizer measurements. Only single-qubit channels are allowed and the
/// rule may not flip measurement results.
pub fn make_code_capacity_circuit(config: &MemoryExperiment) -> CompileResult<Circuit> {
    if config.noise.flip_result != 0.0 {
        return Err(CompileError::InvalidConfiguration(
            "code capacity noise cannot flip measurement results".into(),
        ));
    }
    let mut experiment = Experiment::start(config)?;

    let data: Vec<Coord> = config.patch.data_set().into_iter().collect();
    for (channel, &p) in &config.noise.after {
        if p > 0.0 {
            experiment.builder.gate(channel, data.iter().copied(), &[p])?;
        }
    }
    experiment.builder.tick();

    experiment.finish("init")
}

#[cfg(test)]
mod tests {
    use super::*;
    use syndra_ir::{Operation, Tile};

    fn c(re: f64, im: f64) -> Coord {
        Coord::new(re, im)
    }

    /// Three-qubit repetition code with two ZZ checks.
    fn repetition_patch() -> Patch {
        Patch::new([
            Tile::with_data("Z", c(0.5, 0.0), [c(0.0, 0.0), c(1.0, 0.0)]).unwrap(),
            Tile::with_data("Z", c(1.5, 0.0), [c(1.0, 0.0), c(2.0, 0.0)]).unwrap(),
        ])
    }

    fn z_memory(rounds: u64) -> MemoryExperiment {
        MemoryExperiment {
            patch: repetition_patch(),
            noise: NoiseRule::after([("DEPOLARIZE1", 0.01)]).with_flip_result(0.02),
            observables_z: vec![PauliMap::new().with_basis(Basis::Z, [c(0.0, 0.0)])],
            rounds,
            ..MemoryExperiment::default()
        }
    }

    fn count(circuit: &Circuit, name: &str) -> usize {
        circuit
            .flattened()
            .iter()
            .filter(|op| matches!(op, Operation::Instruction(i) if i.name == name))
            .count()
    }

    #[test]
    fn test_pairing_single_kind_passes_through() {
        let z = vec![PauliMap::new().with_basis(Basis::Z, [c(0.0, 0.0)])];
        let paired = pair_observables(&repetition_patch(), &[], &z, None).unwrap();
        assert_eq!(paired.observables, z);
        assert!(paired.ancillas.is_empty());
    }

    #[test]
    fn test_pairing_adds_epr_ancilla() {
        let x = vec![PauliMap::new().with_basis(Basis::X, [c(0.0, 0.0), c(1.0, 0.0)])];
        let z = vec![PauliMap::new().with_basis(Basis::Z, [c(1.0, 0.0)])];
        let paired = pair_observables(&repetition_patch(), &x, &z, None).unwrap();
        assert_eq!(paired.ancillas, vec![c(0.0, -1.0)]);
        assert_eq!(paired.observables[0].to_string(), "X(0, -1)*X(0, 0)*X(1, 0)");
        assert!(paired.observables[0].commutes(&paired.observables[1]));
    }

    #[test]
    fn test_default_ancilla_sits_below_data_qubits() {
        // Checks measured from below must not push the ancilla row down.
        let patch = Patch::new([
            Tile::with_data("Z", c(0.5, -1.0), [c(0.0, 0.0), c(1.0, 0.0)]).unwrap(),
            Tile::with_data("Z", c(1.5, -1.0), [c(1.0, 0.0), c(2.0, 0.0)]).unwrap(),
        ]);
        let x = vec![PauliMap::new().with_basis(Basis::X, [c(0.0, 0.0), c(1.0, 0.0)])];
        let z = vec![PauliMap::new().with_basis(Basis::Z, [c(1.0, 0.0)])];
        let paired = pair_observables(&patch, &x, &z, None).unwrap();
        assert_eq!(paired.ancillas, vec![c(0.0, -1.0)]);
    }

    #[test]
    fn test_pairing_rejects_commuting_partners() {
        let x = vec![PauliMap::new().with_basis(Basis::X, [c(0.0, 0.0), c(1.0, 0.0)])];
        let z = vec![PauliMap::new().with_basis(Basis::Z, [c(0.0, 0.0), c(1.0, 0.0)])];
        let err = pair_observables(&repetition_patch(), &x, &z, None).unwrap_err();
        assert!(matches!(err, CompileError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_pairing_rejects_length_mismatch() {
        let x = vec![PauliMap::new().with_basis(Basis::X, [c(0.0, 0.0)])];
        let z = vec![
            PauliMap::new().with_basis(Basis::Z, [c(0.0, 0.0)]),
            PauliMap::new().with_basis(Basis::Z, [c(2.0, 0.0)]),
        ];
        assert!(pair_observables(&repetition_patch(), &x, &z, None).is_err());
    }

    #[test]
    fn test_phenomenological_structure() {
        let circuit = make_phenomenological_circuit(&z_memory(4)).unwrap();
        // start observable, init, 4 rounds, end, end observable
        assert_eq!(circuit.num_measurements(), 1 + 2 + 4 * 2 + 2 + 1);
        assert_eq!(count(&circuit, "DETECTOR"), 4 * 2 + 2);
        assert_eq!(count(&circuit, "OBSERVABLE_INCLUDE"), 2);
        assert!(
            circuit
                .iter()
                .any(|op| matches!(op, Operation::Repeat(r) if r.count == 4))
        );
        let body = circuit.to_string();
        assert!(body.contains("MPP(0.02) Z0*Z1 Z1*Z2"));
        assert!(body.contains("DEPOLARIZE1(0.01) 0 1 2"));
    }

    #[test]
    fn test_single_round_is_inlined() {
        let circuit = make_phenomenological_circuit(&z_memory(1)).unwrap();
        assert!(circuit.iter().all(|op| matches!(op, Operation::Instruction(_))));
        assert_eq!(circuit.num_measurements(), 1 + 2 + 2 + 2 + 1);
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let err = make_phenomenological_circuit(&z_memory(0)).unwrap_err();
        assert!(matches!(err, CompileError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_epr_ancilla_is_noise_free() {
        let mut config = z_memory(2);
        config.observables_x = vec![PauliMap::new().with_basis(
            Basis::X,
            [c(0.0, 0.0), c(1.0, 0.0), c(2.0, 0.0)],
        )];
        let circuit = make_phenomenological_circuit(&config).unwrap();
        // the ancilla sorts first: (0, -1) -> 0
        assert!(circuit.to_string().starts_with("QUBIT_COORDS(0, -1) 0\n"));
        for op in circuit.flattened().iter() {
            if let Operation::Instruction(i) = op {
                if i.category().is_noise() {
                    assert!(i.qubits().all(|q| q.0 != 0), "noise on ancilla: {i}");
                }
            }
        }
        assert_eq!(count(&circuit, "OBSERVABLE_INCLUDE"), 4);
    }

    #[test]
    fn test_code_capacity() {
        let mut config = z_memory(1);
        config.noise = NoiseRule::after([("X_ERROR", 0.1)]);
        let circuit = make_code_capacity_circuit(&config).unwrap();
        let text = circuit.to_string();
        assert!(text.contains("X_ERROR(0.1) 0 1 2\nTICK\n"));
        assert_eq!(count(&circuit, "DETECTOR"), 2);
        assert_eq!(circuit.num_measurements(), 1 + 2 + 2 + 1);
    }

    #[test]
    fn test_code_capacity_rejects_flips() {
        let err = make_code_capacity_circuit(&z_memory(1)).unwrap_err();
        assert!(matches!(err, CompileError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_ancilla_controlled_rounds() {
        let mut config = z_memory(3);
        config.style = CheckStyle::AncillaControlled;
        let circuit = make_phenomenological_circuit(&config).unwrap();
        assert_eq!(circuit.num_measurements(), 1 + 2 + 3 * 2 + 2 + 1);
        assert!(circuit.gates_used().contains("MX"));
    }
}
