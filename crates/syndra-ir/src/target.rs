//! Instruction targets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{IrError, IrResult};
use crate::pauli::Basis;
use crate::qubit::QubitId;

/// One entry of an instruction's target list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// A plain qubit.
    Qubit(QubitId),
    /// A qubit paired with a Pauli basis, used by product measurements.
    Pauli {
        /// Basis of this factor.
        basis: Basis,
        /// The qubit.
        qubit: QubitId,
    },
    /// A measurement record, counted backwards from the present (`-1` is the latest).
    Rec(i32),
    /// A sweep bit.
    Sweep(u32),
    /// Joins adjacent Pauli targets into one product.
    Combiner,
}

impl Target {
    /// Plain qubit target.
    pub fn qubit(index: u32) -> Self {
        Target::Qubit(QubitId(index))
    }

    /// Pauli-tagged qubit target.
    pub fn pauli(basis: Basis, index: u32) -> Self {
        Target::Pauli {
            basis,
            qubit: QubitId(index),
        }
    }

    /// The qubit this target refers to, if any.
    pub fn qubit_id(&self) -> Option<QubitId> {
        match self {
            Target::Qubit(q) | Target::Pauli { qubit: q, .. } => Some(*q),
            _ => None,
        }
    }

    /// Whether this is a measurement record target.
    pub fn is_rec(&self) -> bool {
        matches!(self, Target::Rec(_))
    }

    /// Whether this is a sweep bit target.
    pub fn is_sweep(&self) -> bool {
        matches!(self, Target::Sweep(_))
    }

    /// Whether this is a combiner.
    pub fn is_combiner(&self) -> bool {
        matches!(self, Target::Combiner)
    }

    /// Whether this target is classical (record or sweep bit).
    pub fn is_classical(&self) -> bool {
        self.is_rec() || self.is_sweep()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Qubit(q) => write!(f, "{q}"),
            Target::Pauli { basis, qubit } => write!(f, "{basis}{qubit}"),
            Target::Rec(offset) => write!(f, "rec[{offset}]"),
            Target::Sweep(bit) => write!(f, "sweep[{bit}]"),
            Target::Combiner => write!(f, "*"),
        }
    }
}

fn bracketed<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    s.strip_prefix(prefix)?.strip_suffix(']')
}

impl FromStr for Target {
    type Err = IrError;

    fn from_str(s: &str) -> IrResult<Self> {
        let bad = || IrError::InvalidArgument(format!("malformed target '{s}'"));
        if s == "*" {
            return Ok(Target::Combiner);
        }
        if let Some(inner) = bracketed(s, "rec[") {
            let offset: i32 = inner.parse().map_err(|_| bad())?;
            if offset >= 0 {
                return Err(bad());
            }
            return Ok(Target::Rec(offset));
        }
        if let Some(inner) = bracketed(s, "sweep[") {
            return inner.parse().map(Target::Sweep).map_err(|_| bad());
        }
        let mut chars = s.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {
                let basis = Basis::try_from(c)?;
                let index = chars.as_str().parse().map_err(|_| bad())?;
                Ok(Target::pauli(basis, index))
            }
            Some(_) => s.parse().map(Target::qubit).map_err(|_| bad()),
            None => Err(bad()),
        }
    }
}

/// Split a target list into product groups, dropping the combiners.
///
/// `X0 * X1 Z2` becomes `[[X0, X1], [Z2]]`.
pub fn product_groups(targets: &[Target]) -> Vec<Vec<Target>> {
    let mut groups: Vec<Vec<Target>> = Vec::new();
    let mut joining = false;
    for t in targets {
        if t.is_combiner() {
            joining = true;
            continue;
        }
        match groups.last_mut() {
            Some(last) if joining => last.push(*t),
            _ => groups.push(vec![*t]),
        }
        joining = false;
    }
    groups
}

/// Join product groups back into a target list with combiners.
pub fn join_products<I, G>(groups: I) -> Vec<Target>
where
    I: IntoIterator<Item = G>,
    G: IntoIterator<Item = Target>,
{
    let mut out = Vec::new();
    for group in groups {
        let mut first = true;
        for t in group {
            if !first {
                out.push(Target::Combiner);
            }
            first = false;
            out.push(t);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forms() {
        assert_eq!(Target::qubit(5).to_string(), "5");
        assert_eq!(Target::pauli(Basis::X, 5).to_string(), "X5");
        assert_eq!(Target::Rec(-1).to_string(), "rec[-1]");
        assert_eq!(Target::Sweep(2).to_string(), "sweep[2]");
        assert_eq!(Target::Combiner.to_string(), "*");
    }

    #[test]
    fn test_parse_forms() {
        for text in ["5", "X5", "Z12", "rec[-3]", "sweep[0]", "*"] {
            let t: Target = text.parse().unwrap();
            assert_eq!(t.to_string(), text);
        }
        assert!("rec[0]".parse::<Target>().is_err());
        assert!("Q1".parse::<Target>().is_err());
        assert!("abc".parse::<Target>().is_err());
    }

    #[test]
    fn test_product_groups() {
        let targets = vec![
            Target::pauli(Basis::X, 0),
            Target::Combiner,
            Target::pauli(Basis::X, 1),
            Target::pauli(Basis::Z, 2),
        ];
        let groups = product_groups(&targets);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(join_products(groups), targets);
    }
}
