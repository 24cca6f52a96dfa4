//! Circuit instructions and repeat blocks.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::circuit::Circuit;
use crate::coord::format_f64;
use crate::error::{IrError, IrResult};
use crate::gate::{Gate, GateCategory};
use crate::qubit::QubitId;
use crate::target::{Target, product_groups};

/// A named operation with targets and numeric arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Canonical gate name.
    pub name: String,
    /// Targets in emission order.
    pub targets: Vec<Target>,
    /// Numeric arguments (probabilities, coordinates, observable index).
    pub args: Vec<f64>,
}

impl Instruction {
    /// Create an instruction, normalizing the gate name and checking targets.
    pub fn new(
        name: &str,
        targets: impl IntoIterator<Item = Target>,
        args: impl IntoIterator<Item = f64>,
    ) -> IrResult<Self> {
        let gate = Gate::lookup(name)?;
        let instruction = Self {
            name: gate.name.to_string(),
            targets: targets.into_iter().collect(),
            args: args.into_iter().collect(),
        };
        instruction.validate(gate)?;
        Ok(instruction)
    }

    /// Create an instruction over plain qubit targets.
    pub fn on_qubits(
        name: &str,
        qubits: impl IntoIterator<Item = u32>,
        args: impl IntoIterator<Item = f64>,
    ) -> IrResult<Self> {
        Self::new(name, qubits.into_iter().map(Target::qubit), args)
    }

    /// A step boundary.
    pub fn tick() -> Self {
        Self {
            name: "TICK".to_string(),
            targets: vec![],
            args: vec![],
        }
    }

    fn validate(&self, gate: Gate) -> IrResult<()> {
        let invalid = |reason: &str| IrError::InvalidTargets {
            gate_name: self.name.clone(),
            reason: reason.to_string(),
        };
        match gate.category {
            GateCategory::Tick if !self.targets.is_empty() => Err(invalid("takes no targets")),
            GateCategory::Clifford2q | GateCategory::Noise2q if self.targets.len() % 2 != 0 => {
                Err(invalid("needs an even number of targets"))
            }
            GateCategory::ProductMeasure | GateCategory::NoiseProduct => {
                let bad_start = self.targets.first().is_some_and(Target::is_combiner);
                let bad_end = self.targets.last().is_some_and(Target::is_combiner);
                let plain = self
                    .targets
                    .iter()
                    .any(|t| matches!(t, Target::Qubit(_) | Target::Rec(_) | Target::Sweep(_)));
                if bad_start || bad_end || plain {
                    Err(invalid("expects Pauli targets joined by combiners"))
                } else {
                    Ok(())
                }
            }
            GateCategory::Annotation
                if matches!(self.name.as_str(), "DETECTOR" | "OBSERVABLE_INCLUDE")
                    && self.targets.iter().any(|t| !t.is_rec()) =>
            {
                Err(invalid("only measurement record targets are allowed"))
            }
            _ => Ok(()),
        }
    }

    /// The resolved gate.
    pub fn gate(&self) -> IrResult<Gate> {
        Gate::lookup(&self.name)
    }

    /// Category of this instruction's gate.
    ///
    /// Instructions are only ever constructed with known names, so an
    /// unresolvable name is reported as an annotation (never touched by passes).
    pub fn category(&self) -> GateCategory {
        Gate::category_of(&self.name).unwrap_or(GateCategory::Annotation)
    }

    /// Whether this is a step boundary.
    pub fn is_tick(&self) -> bool {
        self.name == "TICK"
    }

    /// Whether any target is a measurement record or sweep bit.
    pub fn is_classically_controlled(&self) -> bool {
        self.category() != GateCategory::Annotation && self.targets.iter().any(Target::is_classical)
    }

    /// Qubits touched, in target order (may repeat).
    pub fn qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        self.targets.iter().filter_map(Target::qubit_id)
    }

    /// Number of measurement results this instruction appends to the record.
    pub fn num_measurements(&self) -> u64 {
        match self.category() {
            GateCategory::Measure | GateCategory::MeasureReset => self.targets.len() as u64,
            GateCategory::ProductMeasure => product_groups(&self.targets).len() as u64,
            _ => 0,
        }
    }

    /// Split targets into the independent pieces this instruction applies to.
    ///
    /// Pairs for two-qubit gates, products for product gates, single targets
    /// otherwise. Annotations and ticks form a single piece.
    pub fn target_groups(&self) -> Vec<Vec<Target>> {
        let category = self.category();
        match category {
            GateCategory::Annotation | GateCategory::Tick => vec![self.targets.clone()],
            GateCategory::ProductMeasure | GateCategory::NoiseProduct => {
                product_groups(&self.targets)
            }
            c if c.is_pairwise() => self.targets.chunks(2).map(<[Target]>::to_vec).collect(),
            _ => self.targets.iter().map(|t| vec![*t]).collect(),
        }
    }

    /// Copy of this instruction restricted to a different target list.
    pub fn with_targets(&self, targets: Vec<Target>) -> Self {
        Self {
            name: self.name.clone(),
            targets,
            args: self.args.clone(),
        }
    }

    /// Copy of this instruction with different arguments.
    pub fn with_args(&self, args: Vec<f64>) -> Self {
        Self {
            name: self.name.clone(),
            targets: self.targets.clone(),
            args,
        }
    }

    fn write_targets(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut glue = false;
        for t in &self.targets {
            if t.is_combiner() {
                write!(f, "*")?;
                glue = true;
                continue;
            }
            if !glue {
                write!(f, " ")?;
            }
            glue = false;
            write!(f, "{t}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(|a| format_f64(*a)).collect();
            write!(f, "({})", args.join(", "))?;
        }
        self.write_targets(f)
    }
}

/// A nested body repeated a fixed number of times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatBlock {
    /// Number of repetitions.
    pub count: u64,
    /// The repeated body.
    pub body: Circuit,
}

/// One top-level entry of a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// A plain instruction.
    Instruction(Instruction),
    /// A repeat block.
    Repeat(RepeatBlock),
}

impl Operation {
    /// The instruction, if this is not a repeat block.
    pub fn as_instruction(&self) -> Option<&Instruction> {
        match self {
            Operation::Instruction(i) => Some(i),
            Operation::Repeat(_) => None,
        }
    }

    /// Measurements appended by this entry, counting repetitions.
    pub fn num_measurements(&self) -> u64 {
        match self {
            Operation::Instruction(i) => i.num_measurements(),
            Operation::Repeat(r) => r.count * r.body.num_measurements(),
        }
    }
}

impl From<Instruction> for Operation {
    fn from(instruction: Instruction) -> Self {
        Operation::Instruction(instruction)
    }
}
