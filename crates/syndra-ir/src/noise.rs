//! Noise configuration.
//!
//! A [`NoiseModel`] is a table of [`NoiseRule`]s keyed by operation. It is a
//! plain value: the noise injection pass in `syndra-compile` reads it and
//! decorates a circuit, nothing here mutates a trace.
//!
//! # Rule resolution
//!
//! For each piece of an instruction (one target, one pair, or one product):
//!
//! 1. Classically controlled operations, annotations and existing error
//!    channels are exempt.
//! 2. An exact gate-name rule from `gate_rules` wins.
//! 3. Then the one-qubit / two-qubit Clifford wildcards.
//! 4. Then the any-measurement wildcard.
//! 5. Then `measure_rules`, keyed by measured bases (`"Z"`, `"XX"`, ...).
//! 6. Otherwise no rule matched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, GateCategory};
use crate::instruction::Instruction;
use crate::target::Target;

/// Noise attached to one kind of operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoiseRule {
    /// Error channels applied to the operation's targets after it, by
    /// channel name.
    #[serde(default)]
    pub after: BTreeMap<String, f64>,
    /// Probability of reporting the wrong measurement result.
    #[serde(default)]
    pub flip_result: f64,
}

impl NoiseRule {
    /// Rule applying the given channels afterwards.
    pub fn after<'a>(channels: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            after: channels
                .into_iter()
                .map(|(name, p)| (name.to_string(), p))
                .collect(),
            flip_result: 0.0,
        }
    }

    /// Same rule with a result-flip probability.
    #[must_use]
    pub fn with_flip_result(mut self, p: f64) -> Self {
        self.flip_result = p;
        self
    }

    /// Whether the rule adds nothing.
    pub fn is_noiseless(&self) -> bool {
        self.flip_result == 0.0 && self.after.values().all(|p| *p == 0.0)
    }

    /// Check probabilities and channel names.
    pub fn validate(&self) -> IrResult<()> {
        check_probability("flip_result", self.flip_result)?;
        for (name, p) in &self.after {
            let gate = Gate::lookup(name)?;
            if !gate.category.is_noise() {
                return Err(IrError::InvalidArgument(format!(
                    "'{name}' is not an error channel"
                )));
            }
            check_probability(name, *p)?;
        }
        Ok(())
    }
}

fn check_probability(what: &str, p: f64) -> IrResult<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(IrError::InvalidArgument(format!(
            "{what} probability {p} is outside [0, 1]"
        )))
    }
}

/// Outcome of looking up the rule for an operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleMatch<'a> {
    /// The operation never receives noise.
    Exempt,
    /// A rule applies.
    Rule(&'a NoiseRule),
    /// Nothing in the table covers the operation.
    Missing,
}

/// A complete noise configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseModel {
    /// Depolarization applied to qubits not touched during a moment.
    pub idle_depolarization: f64,
    /// Extra depolarization for qubits idling while others reset or measure.
    pub additional_depolarization_waiting_for_m_or_r: f64,
    /// Rule applied to every non-immune system qubit once per moment.
    pub tick_noise: Option<NoiseRule>,
    /// Rules keyed by exact gate name.
    pub gate_rules: BTreeMap<String, NoiseRule>,
    /// Rules keyed by measured bases (`"Z"`, `"XX"`, `"XYZ"`, ...).
    pub measure_rules: BTreeMap<String, NoiseRule>,
    /// Fallback for any measurement.
    pub any_measurement_rule: Option<NoiseRule>,
    /// Fallback for any single-qubit Clifford.
    pub any_clifford_1q_rule: Option<NoiseRule>,
    /// Fallback for any two-qubit Clifford.
    pub any_clifford_2q_rule: Option<NoiseRule>,
    /// Permit one qubit to appear in several operations of the same moment.
    pub allow_multiple_uses_of_a_qubit_in_one_tick: bool,
    /// Treat operations without a matching rule as an error.
    pub strict: bool,
}

impl NoiseModel {
    /// Every operation depolarized at strength `p`, measurements flipped with `p`.
    pub fn uniform_depolarizing(p: f64) -> Self {
        let m1 = NoiseRule::after([("DEPOLARIZE1", p)]).with_flip_result(p);
        let m2 = NoiseRule::after([("DEPOLARIZE2", p)]).with_flip_result(p);
        Self {
            idle_depolarization: p,
            any_clifford_1q_rule: Some(NoiseRule::after([("DEPOLARIZE1", p)])),
            any_clifford_2q_rule: Some(NoiseRule::after([("DEPOLARIZE2", p)])),
            measure_rules: [
                ("X", m1.clone()),
                ("Y", m1.clone()),
                ("Z", m1),
                ("XX", m2.clone()),
                ("YY", m2.clone()),
                ("ZZ", m2),
            ]
            .into_iter()
            .map(|(k, r)| (k.to_string(), r))
            .collect(),
            gate_rules: [
                ("RX", NoiseRule::after([("Z_ERROR", p)])),
                ("RY", NoiseRule::after([("X_ERROR", p)])),
                ("R", NoiseRule::after([("X_ERROR", p)])),
            ]
            .into_iter()
            .map(|(k, r)| (k.to_string(), r))
            .collect(),
            ..Self::default()
        }
    }

    /// Superconducting-inspired model: cheap single-qubit gates, expensive
    /// measurement and reset, idling during measurement.
    pub fn si1000(p: f64) -> Self {
        Self {
            idle_depolarization: p / 10.0,
            additional_depolarization_waiting_for_m_or_r: 2.0 * p,
            any_clifford_1q_rule: Some(NoiseRule::after([("DEPOLARIZE1", p / 10.0)])),
            any_clifford_2q_rule: Some(NoiseRule::after([("DEPOLARIZE2", p)])),
            measure_rules: [
                (
                    "Z",
                    NoiseRule::after([("DEPOLARIZE1", p)]).with_flip_result(p * 5.0),
                ),
                (
                    "ZZ",
                    NoiseRule::after([("DEPOLARIZE2", p)]).with_flip_result(p * 5.0),
                ),
            ]
            .into_iter()
            .map(|(k, r)| (k.to_string(), r))
            .collect(),
            gate_rules: [("R".to_string(), NoiseRule::after([("X_ERROR", p * 2.0)]))]
                .into_iter()
                .collect(),
            ..Self::default()
        }
    }

    /// Check every probability and name in the table.
    pub fn validate(&self) -> IrResult<()> {
        check_probability("idle_depolarization", self.idle_depolarization)?;
        check_probability(
            "additional_depolarization_waiting_for_m_or_r",
            self.additional_depolarization_waiting_for_m_or_r,
        )?;
        for name in self.gate_rules.keys() {
            Gate::lookup(name)?;
        }
        for bases in self.measure_rules.keys() {
            if bases.is_empty() || !bases.chars().all(|c| matches!(c, 'X' | 'Y' | 'Z')) {
                return Err(IrError::UnsupportedBasis(bases.clone()));
            }
        }
        let rules = self
            .gate_rules
            .values()
            .chain(self.measure_rules.values())
            .chain(self.tick_noise.iter())
            .chain(self.any_measurement_rule.iter())
            .chain(self.any_clifford_1q_rule.iter())
            .chain(self.any_clifford_2q_rule.iter());
        for rule in rules {
            rule.validate()?;
        }
        Ok(())
    }

    fn gate_rule(&self, canonical: &str) -> Option<&NoiseRule> {
        self.gate_rules.get(canonical).or_else(|| {
            self.gate_rules
                .iter()
                .find(|(name, _)| Gate::lookup(name).is_ok_and(|g| g.name == canonical))
                .map(|(_, rule)| rule)
        })
    }

    /// Find the rule for one piece of an instruction.
    pub fn rule_for(&self, piece: &Instruction) -> RuleMatch<'_> {
        let category = piece.category();
        if category.is_annotation() || category.is_noise() || piece.is_classically_controlled() {
            return RuleMatch::Exempt;
        }
        if let Some(rule) = self.gate_rule(&piece.name) {
            return RuleMatch::Rule(rule);
        }
        let wildcard = match category {
            GateCategory::Clifford1q => self.any_clifford_1q_rule.as_ref(),
            GateCategory::Clifford2q => self.any_clifford_2q_rule.as_ref(),
            c if c.produces_measurements() => self.any_measurement_rule.as_ref(),
            _ => None,
        };
        if let Some(rule) = wildcard {
            return RuleMatch::Rule(rule);
        }
        measured_bases(piece)
            .and_then(|bases| self.measure_rules.get(&bases))
            .map_or(RuleMatch::Missing, RuleMatch::Rule)
    }
}

/// Measured bases of a measurement piece, as a string like `"Z"` or `"XX"`.
pub fn measured_bases(piece: &Instruction) -> Option<String> {
    let gate = piece.gate().ok()?;
    match gate.category {
        GateCategory::ProductMeasure => Some(
            piece
                .targets
                .iter()
                .filter_map(|t| match t {
                    Target::Pauli { basis, .. } => Some(basis.letter()),
                    _ => None,
                })
                .collect(),
        ),
        GateCategory::Measure | GateCategory::MeasureReset => {
            gate.measured_basis().map(|b| b.letter().to_string())
        }
        _ => None,
    }
}
