//! Verification passes for ensuring compilation correctness.
//!
//! These passes check structural properties every transformed circuit must
//! keep, so a faulty transformation is caught before the circuit is used.

use rustc_hash::FxHashSet;
use tracing::debug;

use syndra_ir::{Circuit, GateCategory, Operation, Target};

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Result of moment verification.
#[derive(Debug, Clone, Default)]
pub struct VerificationResult {
    /// Whether the verification passed.
    pub passed: bool,
    /// Number of moments verified, counting repetitions.
    pub moments_checked: usize,
    /// Number of measurement results found, counting repetitions.
    pub measurements_found: u64,
}

/// Analysis pass that checks moments and measurement record references.
///
/// Walks the circuit in execution order and verifies that
///
/// - no qubit is used by two operations between the same pair of TICKs
///   (error channels, annotations and classically controlled gates are not
///   counted; the check is skipped when the noise model allows reuse), and
/// - every `rec[-k]` target refers to a measurement that has already
///   happened.
///
/// The result is stored as a [`VerificationResult`] in the property set.
pub struct MomentVerification;

impl Pass for MomentVerification {
    fn name(&self) -> &'static str {
        "moment_verification"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> CompileResult<()> {
        let allow_reuse = properties
            .noise_model
            .as_ref()
            .is_some_and(|m| m.allow_multiple_uses_of_a_qubit_in_one_tick);

        let mut walker = Walker {
            allow_reuse,
            moment: FxHashSet::default(),
            moments: 0,
            measurements: 0,
        };
        walker.walk(circuit, 1)?;
        if !walker.moment.is_empty() {
            walker.moments += 1;
        }

        let result = VerificationResult {
            passed: true,
            moments_checked: walker.moments,
            measurements_found: walker.measurements,
        };

        debug!(
            "Moment verification passed: {} moments checked, {} measurements found",
            result.moments_checked, result.measurements_found
        );

        properties.insert(result);
        Ok(())
    }
}

struct Walker {
    allow_reuse: bool,
    moment: FxHashSet<u32>,
    moments: usize,
    measurements: u64,
}

impl Walker {
    fn fail(reason: String) -> CompileError {
        CompileError::PassFailed {
            name: "moment_verification".to_string(),
            reason,
        }
    }

    fn walk(&mut self, circuit: &Circuit, repetitions: u64) -> CompileResult<()> {
        for _ in 0..repetitions {
            for op in circuit {
                match op {
                    Operation::Repeat(block) => self.walk(&block.body, block.count)?,
                    Operation::Instruction(i) if i.is_tick() => {
                        self.moment.clear();
                        self.moments += 1;
                    }
                    Operation::Instruction(i) => {
                        for t in &i.targets {
                            if let Target::Rec(offset) = t {
                                if u64::from(offset.unsigned_abs()) > self.measurements {
                                    return Err(Self::fail(format!(
                                        "'{i}' looks back {} measurements but only {} happened",
                                        offset.unsigned_abs(),
                                        self.measurements
                                    )));
                                }
                            }
                        }
                        let category = i.category();
                        let exempt = category.is_annotation()
                            || category.is_noise()
                            || i.is_classically_controlled();
                        if !exempt && !self.allow_reuse {
                            for q in i.qubits() {
                                if !self.moment.insert(q.0) {
                                    return Err(CompileError::QubitReusedInMoment {
                                        qubit: q.0,
                                        gate: i.name.clone(),
                                    });
                                }
                            }
                        }
                        if category != GateCategory::Annotation {
                            self.measurements += i.num_measurements();
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
