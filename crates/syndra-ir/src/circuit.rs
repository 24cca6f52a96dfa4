//! The instruction trace.
//!
//! A [`Circuit`] is an ordered list of [`Operation`]s. Appending an
//! instruction merges it into the previous one when both have the same gate
//! and arguments, which keeps the trace in the same canonical shape the
//! downstream text format uses (`H 0 1 2` rather than three `H` lines).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, GateCategory};
use crate::instruction::{Instruction, Operation, RepeatBlock};
use crate::target::{Target, product_groups};

/// An ordered instruction trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    operations: Vec<Operation>,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction by name.
    pub fn append(
        &mut self,
        name: &str,
        targets: impl IntoIterator<Item = Target>,
        args: impl IntoIterator<Item = f64>,
    ) -> IrResult<&mut Self> {
        let instruction = Instruction::new(name, targets, args)?;
        self.push(instruction);
        Ok(self)
    }

    /// Append an instruction over plain qubits.
    pub fn append_qubits(
        &mut self,
        name: &str,
        qubits: impl IntoIterator<Item = u32>,
        args: impl IntoIterator<Item = f64>,
    ) -> IrResult<&mut Self> {
        self.append(name, qubits.into_iter().map(Target::qubit), args)
    }

    /// Append a step boundary.
    pub fn tick(&mut self) -> &mut Self {
        self.push(Instruction::tick());
        self
    }

    /// Append an already constructed instruction, fusing with the previous one
    /// when possible.
    pub fn push(&mut self, instruction: Instruction) {
        if let Some(Operation::Instruction(last)) = self.operations.last_mut() {
            let fusable = Gate::lookup(&instruction.name).is_ok_and(|g| g.is_fusable());
            if fusable && last.name == instruction.name && last.args == instruction.args {
                last.targets.extend(instruction.targets);
                return;
            }
        }
        self.operations.push(Operation::Instruction(instruction));
    }

    /// Append an operation. Instructions are fused like [`push`](Self::push).
    pub fn push_operation(&mut self, operation: Operation) {
        match operation {
            Operation::Instruction(i) => self.push(i),
            Operation::Repeat(r) => self.push_repeat(r.count, r.body),
        }
    }

    /// Append `body` repeated `count` times.
    ///
    /// Zero repetitions append nothing, one repetition splices the body inline.
    pub fn push_repeat(&mut self, count: u64, body: Circuit) {
        match count {
            0 => {}
            1 => self.extend(&body),
            _ => self.operations.push(Operation::Repeat(RepeatBlock { count, body })),
        }
    }

    /// Append every operation of another circuit.
    pub fn extend(&mut self, other: &Circuit) {
        for op in &other.operations {
            self.push_operation(op.clone());
        }
    }

    /// This circuit repeated `count` times, as a repeat block.
    pub fn repeated(&self, count: u64) -> Circuit {
        let mut out = Circuit::new();
        out.push_repeat(count, self.clone());
        out
    }

    /// Top-level operations.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Iterate over top-level operations.
    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// Number of top-level operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the circuit has no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// The final top-level operation.
    pub fn last(&self) -> Option<&Operation> {
        self.operations.last()
    }

    /// Whether the final top-level operation is a step boundary.
    pub fn ends_with_tick(&self) -> bool {
        matches!(self.operations.last(), Some(Operation::Instruction(i)) if i.is_tick())
    }

    /// Total measurement results appended, counting repetitions.
    pub fn num_measurements(&self) -> u64 {
        self.operations.iter().map(Operation::num_measurements).sum()
    }

    /// Every qubit index touched anywhere, including inside repeat blocks.
    pub fn qubits(&self) -> BTreeSet<u32> {
        let mut out = BTreeSet::new();
        self.collect_qubits(&mut out);
        out
    }

    fn collect_qubits(&self, out: &mut BTreeSet<u32>) {
        for op in &self.operations {
            match op {
                Operation::Instruction(i) => out.extend(i.qubits().map(|q| q.0)),
                Operation::Repeat(r) => r.body.collect_qubits(out),
            }
        }
    }

    /// One more than the largest qubit index used.
    pub fn num_qubits(&self) -> u32 {
        self.qubits().last().map_or(0, |q| q + 1)
    }

    /// Number of step boundaries, counting repetitions.
    pub fn num_ticks(&self) -> u64 {
        self.operations
            .iter()
            .map(|op| match op {
                Operation::Instruction(i) => u64::from(i.is_tick()),
                Operation::Repeat(r) => r.count * r.body.num_ticks(),
            })
            .sum()
    }

    /// Copy with every repeat block unrolled.
    pub fn flattened(&self) -> Circuit {
        let mut out = Circuit::new();
        for op in &self.operations {
            match op {
                Operation::Instruction(i) => out.push(i.clone()),
                Operation::Repeat(r) => {
                    let body = r.body.flattened();
                    for _ in 0..r.count {
                        out.extend(&body);
                    }
                }
            }
        }
        out
    }

    /// Operation counts, with product measurements and feedback disambiguated.
    ///
    /// `MPP X1*X2` counts as `MXX`, a single-factor Z product as `M`,
    /// `CX rec[-1] 0` as `feedback`, and `CX sweep[2] 0` as `sweep`. Repeat
    /// bodies are weighted by their repetition count.
    pub fn gate_counts(&self) -> BTreeMap<String, u64> {
        let mut out = BTreeMap::new();
        self.accumulate_gate_counts(1, &mut out);
        out
    }

    fn accumulate_gate_counts(&self, weight: u64, out: &mut BTreeMap<String, u64>) {
        for op in &self.operations {
            let instruction = match op {
                Operation::Repeat(r) => {
                    r.body.accumulate_gate_counts(weight * r.count, out);
                    continue;
                }
                Operation::Instruction(i) => i,
            };
            for (name, count) in instruction_counts(instruction) {
                *out.entry(name).or_default() += count * weight;
            }
        }
    }

    /// Distinct operation names used, disambiguated like
    /// [`gate_counts`](Self::gate_counts).
    pub fn gates_used(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_gates_used(&mut out);
        out
    }

    fn collect_gates_used(&self, out: &mut BTreeSet<String>) {
        for op in &self.operations {
            match op {
                Operation::Repeat(r) => r.body.collect_gates_used(out),
                Operation::Instruction(i) => {
                    out.extend(instruction_counts(i).into_iter().map(|(name, _)| name));
                }
            }
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = " ".repeat(indent);
        for op in &self.operations {
            match op {
                Operation::Instruction(i) => writeln!(f, "{pad}{i}")?,
                Operation::Repeat(r) => {
                    writeln!(f, "{pad}REPEAT {} {{", r.count)?;
                    r.body.write_indented(f, indent + 4)?;
                    writeln!(f, "{pad}}}")?;
                }
            }
        }
        Ok(())
    }
}

fn product_name(group: &[Target]) -> String {
    let mut name = String::from("M");
    for t in group {
        if let Target::Pauli { basis, .. } = t {
            name.push(basis.letter());
        }
    }
    if name == "MZ" { "M".to_string() } else { name }
}

fn instruction_counts(instruction: &Instruction) -> Vec<(String, u64)> {
    let category = instruction.category();
    match category {
        GateCategory::ProductMeasure => product_groups(&instruction.targets)
            .iter()
            .map(|g| (product_name(g), 1))
            .collect(),
        GateCategory::Clifford2q => instruction
            .targets
            .chunks(2)
            .map(|pair| {
                let name = if pair.iter().any(Target::is_rec) {
                    "feedback".to_string()
                } else if pair.iter().any(Target::is_sweep) {
                    "sweep".to_string()
                } else {
                    instruction.name.clone()
                };
                (name, 1)
            })
            .collect(),
        GateCategory::Noise2q => vec![(
            instruction.name.clone(),
            instruction.targets.len() as u64 / 2,
        )],
        GateCategory::Annotation | GateCategory::Tick | GateCategory::NoiseProduct => {
            vec![(instruction.name.clone(), 1)]
        }
        _ => vec![(instruction.name.clone(), instruction.targets.len() as u64)],
    }
}

impl<'a> IntoIterator for &'a Circuit {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> IrError {
    IrError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_instruction(line_no: usize, line: &str) -> IrResult<Instruction> {
    let (head, rest) = match line.find(|c: char| c.is_whitespace()) {
        Some(pos) if !line[..pos].contains('(') || line[..pos].contains(')') => {
            (&line[..pos], &line[pos..])
        }
        _ => match line.find(')') {
            Some(close) => (&line[..=close], &line[close + 1..]),
            None => (line, ""),
        },
    };

    let (name, args) = match head.split_once('(') {
        Some((name, tail)) => {
            let inner = tail
                .strip_suffix(')')
                .ok_or_else(|| parse_error(line_no, "unterminated argument list"))?;
            let args = inner
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(|a| {
                    a.parse::<f64>()
                        .map_err(|_| parse_error(line_no, format!("bad argument '{a}'")))
                })
                .collect::<IrResult<Vec<_>>>()?;
            (name.trim(), args)
        }
        None => (head, vec![]),
    };

    let spaced = rest.replace('*', " * ");
    let targets = spaced
        .split_whitespace()
        .map(|t| {
            t.parse::<Target>()
                .map_err(|e| parse_error(line_no, e.to_string()))
        })
        .collect::<IrResult<Vec<_>>>()?;

    Instruction::new(name, targets, args).map_err(|e| parse_error(line_no, e.to_string()))
}

impl FromStr for Circuit {
    type Err = IrError;

    fn from_str(text: &str) -> IrResult<Self> {
        // Stack of (repeat count, circuit under construction).
        let mut stack: Vec<(u64, Circuit)> = vec![(1, Circuit::new())];
        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line == "}" {
                if stack.len() < 2 {
                    return Err(parse_error(line_no, "unmatched '}'"));
                }
                let (count, body) = stack.pop().unwrap_or_default();
                if let Some((_, parent)) = stack.last_mut() {
                    parent.push_repeat(count, body);
                }
                continue;
            }
            if let Some(rest) = line.strip_prefix("REPEAT") {
                let count = rest
                    .trim()
                    .strip_suffix('{')
                    .map(str::trim)
                    .and_then(|c| c.parse::<u64>().ok())
                    .ok_or_else(|| parse_error(line_no, "malformed REPEAT header"))?;
                stack.push((count, Circuit::new()));
                continue;
            }
            let instruction = parse_instruction(line_no, line)?;
            if let Some((_, current)) = stack.last_mut() {
                current.push(instruction);
            }
        }
        if stack.len() != 1 {
            return Err(parse_error(text.lines().count(), "unterminated REPEAT block"));
        }
        Ok(stack.pop().map(|(_, c)| c).unwrap_or_default())
    }
}
