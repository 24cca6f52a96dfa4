//! Noise injection pass: decorates a noiseless circuit with error channels.
//!
//! The circuit is processed one moment (span between TICKs) at a time. Every
//! piece of every operation is looked up in the [`NoiseModel`]; measurement
//! results get their flip probability and the rule's channels are collected
//! and appended at the end of the moment, followed by idle noise and the
//! per-tick noise.

use std::collections::{BTreeMap, BTreeSet};

use syndra_ir::target::join_products;
use syndra_ir::{Circuit, Gate, GateCategory, Instruction, NoiseModel, NoiseRule, Operation, RuleMatch};
use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Injects noise channels according to the property set's noise model.
///
/// Does nothing when no noise model is set.
pub struct NoiseInjectionPass;

impl Default for NoiseInjectionPass {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseInjectionPass {
    /// Create a new noise injection pass.
    pub fn new() -> Self {
        Self
    }
}

impl Pass for NoiseInjectionPass {
    fn name(&self) -> &'static str {
        "NoiseInjection"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn should_run(&self, _circuit: &Circuit, properties: &PropertySet) -> bool {
        properties.noise_model.is_some()
    }

    fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> CompileResult<()> {
        let Some(model) = properties.noise_model.as_ref() else {
            return Ok(());
        };
        *circuit = noisy_circuit(
            circuit,
            model,
            &properties.immune_qubits,
            properties.system_qubits.as_ref(),
        )?;
        Ok(())
    }
}

/// Return a copy of `circuit` with noise from `model` added.
///
/// Qubits in `immune` never receive noise, and operations touching them are
/// left untouched. Idle and tick noise apply to `system` (every qubit the
/// circuit uses when `None`). Repeat bodies are processed recursively and
/// always end with a TICK.
pub fn noisy_circuit(
    circuit: &Circuit,
    model: &NoiseModel,
    immune: &BTreeSet<u32>,
    system: Option<&BTreeSet<u32>>,
) -> CompileResult<Circuit> {
    model.validate()?;
    let system = system.cloned().unwrap_or_else(|| circuit.qubits());
    let injector = Injector {
        model,
        immune,
        system: &system,
    };
    let out = injector.circuit(circuit)?;
    debug!(
        input_ops = circuit.len(),
        output_ops = out.len(),
        system_qubits = system.len(),
        immune_qubits = immune.len(),
        "Injected noise"
    );
    Ok(out)
}

struct Injector<'a> {
    model: &'a NoiseModel,
    immune: &'a BTreeSet<u32>,
    system: &'a BTreeSet<u32>,
}

/// What one moment did, gathered while its operations are copied out.
#[derive(Default)]
struct MomentState {
    /// Qubits acted on by any operation (idle noise skips these).
    used: BTreeSet<u32>,
    /// Qubits acted on by non-feedback operations (the reuse check).
    exclusive: BTreeSet<u32>,
    /// Qubits reset or measured.
    collapsed: BTreeSet<u32>,
    /// Channels to append, keyed by name and probability bits.
    after: BTreeMap<(String, u64), Vec<u32>>,
    /// Whether anything other than annotations appeared.
    has_operations: bool,
}

impl Injector<'_> {
    fn circuit(&self, circuit: &Circuit) -> CompileResult<Circuit> {
        let mut out = Circuit::new();
        let mut moment: Vec<&Instruction> = Vec::new();
        for op in circuit {
            match op {
                Operation::Instruction(i) if i.is_tick() => {
                    self.moment(&moment, &mut out)?;
                    moment.clear();
                    out.tick();
                }
                Operation::Instruction(i) => moment.push(i),
                Operation::Repeat(block) => {
                    self.moment(&moment, &mut out)?;
                    moment.clear();
                    let mut body = self.circuit(&block.body)?;
                    if !body.ends_with_tick() {
                        body.tick();
                    }
                    out.push_repeat(block.count, body);
                }
            }
        }
        self.moment(&moment, &mut out)?;
        Ok(out)
    }

    fn moment(&self, moment: &[&Instruction], out: &mut Circuit) -> CompileResult<()> {
        let mut state = MomentState::default();
        for instruction in moment {
            let category = instruction.category();
            if category.is_annotation() {
                out.push((*instruction).clone());
                continue;
            }
            state.has_operations = true;
            for group in instruction.target_groups() {
                let targets = match category {
                    GateCategory::ProductMeasure | GateCategory::NoiseProduct => {
                        join_products([group])
                    }
                    _ => group,
                };
                let piece = instruction.with_targets(targets);
                let noisy = self.piece(piece, category, &mut state)?;
                out.push(noisy);
            }
        }

        for ((channel, bits), qubits) in std::mem::take(&mut state.after) {
            out.append_qubits(&channel, qubits, [f64::from_bits(bits)])?;
        }
        if !state.has_operations {
            return Ok(());
        }

        let idle = self.model.idle_depolarization;
        if idle > 0.0 {
            let qubits = self.noisy_system_qubits(|q| !state.used.contains(q));
            if !qubits.is_empty() {
                out.append_qubits("DEPOLARIZE1", qubits, [idle])?;
            }
        }

        let waiting = self.model.additional_depolarization_waiting_for_m_or_r;
        if waiting > 0.0 && !state.collapsed.is_empty() {
            let qubits = self.noisy_system_qubits(|q| !state.collapsed.contains(q));
            if !qubits.is_empty() {
                out.append_qubits("DEPOLARIZE1", qubits, [waiting])?;
            }
        }

        if let Some(rule) = &self.model.tick_noise {
            let qubits = self.noisy_system_qubits(|_| true);
            append_channels(rule, &qubits, "tick noise", out)?;
        }
        Ok(())
    }

    fn noisy_system_qubits(&self, keep: impl Fn(&u32) -> bool) -> Vec<u32> {
        self.system
            .iter()
            .filter(|&&q| !self.immune.contains(&q) && keep(&q))
            .copied()
            .collect()
    }

    /// Record one piece in `state` and return it with its flip probability.
    fn piece(
        &self,
        piece: Instruction,
        category: GateCategory,
        state: &mut MomentState,
    ) -> CompileResult<Instruction> {
        let qubits: Vec<u32> = piece.qubits().map(|q| q.0).collect();
        if !category.is_noise() {
            state.used.extend(&qubits);
            if !piece.is_classically_controlled() {
                for &q in &qubits {
                    let fresh = state.exclusive.insert(q);
                    if !fresh && !self.model.allow_multiple_uses_of_a_qubit_in_one_tick {
                        return Err(CompileError::QubitReusedInMoment {
                            qubit: q,
                            gate: piece.name.clone(),
                        });
                    }
                }
            }
            if category.is_collapsing() {
                state.collapsed.extend(&qubits);
            }
        }

        if qubits.iter().any(|q| self.immune.contains(q)) {
            return Ok(piece);
        }

        let rule = match self.model.rule_for(&piece) {
            RuleMatch::Rule(rule) => rule,
            RuleMatch::Missing if self.model.strict => {
                return Err(CompileError::NoNoiseRule { gate: piece.to_string() });
            }
            RuleMatch::Missing | RuleMatch::Exempt => return Ok(piece),
        };

        for (channel, &p) in &rule.after {
            if p > 0.0 {
                check_arity(channel, qubits.len(), &piece.name)?;
                state
                    .after
                    .entry((channel.clone(), p.to_bits()))
                    .or_default()
                    .extend(&qubits);
            }
        }

        if rule.flip_result > 0.0 {
            if !category.produces_measurements() {
                return Err(CompileError::InvalidConfiguration(format!(
                    "rule for '{}' has a result flip probability but it measures nothing",
                    piece.name
                )));
            }
            return Ok(piece.with_args(vec![rule.flip_result]));
        }
        Ok(piece)
    }
}

fn check_arity(channel: &str, num_qubits: usize, context: &str) -> CompileResult<()> {
    let pairwise = Gate::category_of(channel).is_some_and(GateCategory::is_pairwise);
    if pairwise && num_qubits % 2 != 0 {
        return Err(CompileError::InvalidConfiguration(format!(
            "two-qubit channel '{channel}' cannot follow '{context}' on {num_qubits} qubit(s)"
        )));
    }
    Ok(())
}

fn append_channels(
    rule: &NoiseRule,
    qubits: &[u32],
    context: &str,
    out: &mut Circuit,
) -> CompileResult<()> {
    if qubits.is_empty() {
        return Ok(());
    }
    for (channel, &p) in &rule.after {
        if p > 0.0 {
            check_arity(channel, qubits.len(), context)?;
            out.append_qubits(channel, qubits.iter().copied(), [p])?;
        }
    }
    Ok(())
}
