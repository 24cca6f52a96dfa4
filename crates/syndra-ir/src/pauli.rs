//! Pauli bases and phase-free Pauli products over coordinates.
//!
//! [`PauliMap`] is the single canonical input of
//! [`Builder::measure_pauli_product`](crate::builder::Builder::measure_pauli_product).
//! Every alternative input shape (separate X/Y/Z qubit lists, basis-to-qubits
//! groups, qubit-to-basis pairs, another product) is folded into it by
//! multiplication, so repeated requests cancel and X·Z becomes Y no matter
//! which helper they arrived through.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Mul;
use std::str::FromStr;

use crate::coord::Coord;
use crate::error::{IrError, IrResult};

/// A single-qubit Pauli basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Basis {
    /// Pauli X.
    X,
    /// Pauli Y.
    Y,
    /// Pauli Z.
    Z,
}

impl Basis {
    /// All three bases in letter order.
    pub const ALL: [Basis; 3] = [Basis::X, Basis::Y, Basis::Z];

    /// The basis letter.
    pub fn letter(self) -> char {
        match self {
            Basis::X => 'X',
            Basis::Y => 'Y',
            Basis::Z => 'Z',
        }
    }

    /// Phase-free product of two bases. `None` is the identity.
    pub fn multiply(self, other: Basis) -> Option<Basis> {
        use Basis::{X, Y, Z};
        match (self, other) {
            (a, b) if a == b => None,
            (X, Y) | (Y, X) => Some(Z),
            (Y, Z) | (Z, Y) => Some(X),
            _ => Some(Y),
        }
    }

    /// Whether two single-qubit Paulis anticommute.
    pub fn anticommutes(self, other: Basis) -> bool {
        self != other
    }
}

impl TryFrom<char> for Basis {
    type Error = IrError;

    fn try_from(c: char) -> IrResult<Self> {
        match c {
            'X' | 'x' => Ok(Basis::X),
            'Y' | 'y' => Ok(Basis::Y),
            'Z' | 'z' => Ok(Basis::Z),
            other => Err(IrError::UnsupportedBasis(other.to_string())),
        }
    }
}

impl FromStr for Basis {
    type Err = IrError;

    fn from_str(s: &str) -> IrResult<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Basis::try_from(c),
            _ => Err(IrError::UnsupportedBasis(s.to_string())),
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A phase-free Pauli product, as an ordered qubit-to-basis mapping.
///
/// Qubits mapped to the identity are never stored. Serialized as a list of
/// `[coord, basis]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<(Coord, Basis)>", into = "Vec<(Coord, Basis)>")]
pub struct PauliMap {
    qubits: BTreeMap<Coord, Basis>,
}

impl PauliMap {
    /// The identity product.
    pub fn new() -> Self {
        Self::default()
    }

    /// Multiply a single-qubit term into the product.
    pub fn multiply_term(&mut self, qubit: Coord, basis: Basis) {
        match self.qubits.get(&qubit).copied() {
            None => {
                self.qubits.insert(qubit, basis);
            }
            Some(existing) => match existing.multiply(basis) {
                Some(b) => {
                    self.qubits.insert(qubit, b);
                }
                None => {
                    self.qubits.remove(&qubit);
                }
            },
        }
    }

    /// Multiply `basis` onto every listed qubit.
    ///
    /// A qubit listed twice cancels, like any other repeated term.
    #[must_use]
    pub fn with_basis(mut self, basis: Basis, qubits: impl IntoIterator<Item = Coord>) -> Self {
        for q in qubits {
            self.multiply_term(q, basis);
        }
        self
    }

    /// Multiply X terms onto the given qubits.
    #[must_use]
    pub fn with_xs(self, qubits: impl IntoIterator<Item = Coord>) -> Self {
        self.with_basis(Basis::X, qubits)
    }

    /// Multiply Y terms onto the given qubits.
    #[must_use]
    pub fn with_ys(self, qubits: impl IntoIterator<Item = Coord>) -> Self {
        self.with_basis(Basis::Y, qubits)
    }

    /// Multiply Z terms onto the given qubits.
    #[must_use]
    pub fn with_zs(self, qubits: impl IntoIterator<Item = Coord>) -> Self {
        self.with_basis(Basis::Z, qubits)
    }

    /// Multiply qubit/basis pairs into the product.
    #[must_use]
    pub fn with_pairs(mut self, pairs: impl IntoIterator<Item = (Coord, Basis)>) -> Self {
        for (q, b) in pairs {
            self.multiply_term(q, b);
        }
        self
    }

    /// Multiply basis-to-qubits groups into the product.
    #[must_use]
    pub fn with_basis_groups<Q>(self, groups: impl IntoIterator<Item = (Basis, Q)>) -> Self
    where
        Q: IntoIterator<Item = Coord>,
    {
        groups
            .into_iter()
            .fold(self, |acc, (basis, qubits)| acc.with_basis(basis, qubits))
    }

    /// Like [`with_basis_groups`](Self::with_basis_groups), with lettered bases.
    pub fn with_lettered_groups<'a, Q>(
        self,
        groups: impl IntoIterator<Item = (&'a str, Q)>,
    ) -> IrResult<Self>
    where
        Q: IntoIterator<Item = Coord>,
    {
        let mut acc = self;
        for (letter, qubits) in groups {
            acc = acc.with_basis(letter.parse()?, qubits);
        }
        Ok(acc)
    }

    /// Like [`with_pairs`](Self::with_pairs), with lettered bases.
    pub fn with_lettered_pairs<'a>(
        mut self,
        pairs: impl IntoIterator<Item = (Coord, &'a str)>,
    ) -> IrResult<Self> {
        for (q, letter) in pairs {
            self.multiply_term(q, letter.parse()?);
        }
        Ok(self)
    }

    /// Multiply another product into this one.
    #[must_use]
    pub fn with_product(self, other: &PauliMap) -> Self {
        self.with_pairs(other.iter())
    }

    /// The basis on `qubit`, if it is not the identity there.
    pub fn get(&self, qubit: Coord) -> Option<Basis> {
        self.qubits.get(&qubit).copied()
    }

    /// Terms in canonical qubit order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, Basis)> + '_ {
        self.qubits.iter().map(|(&q, &b)| (q, b))
    }

    /// Qubits in canonical order.
    pub fn qubits(&self) -> impl Iterator<Item = Coord> + '_ {
        self.qubits.keys().copied()
    }

    /// Number of non-identity terms.
    pub fn len(&self) -> usize {
        self.qubits.len()
    }

    /// Whether this is the identity.
    pub fn is_empty(&self) -> bool {
        self.qubits.is_empty()
    }

    /// Whether two products commute (even number of anticommuting overlaps).
    pub fn commutes(&self, other: &PauliMap) -> bool {
        let anticommuting = self
            .iter()
            .filter(|&(q, b)| other.get(q).is_some_and(|ob| b.anticommutes(ob)))
            .count();
        anticommuting % 2 == 0
    }
}

impl FromIterator<(Coord, Basis)> for PauliMap {
    fn from_iter<I: IntoIterator<Item = (Coord, Basis)>>(iter: I) -> Self {
        PauliMap::new().with_pairs(iter)
    }
}

impl From<Vec<(Coord, Basis)>> for PauliMap {
    fn from(pairs: Vec<(Coord, Basis)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl From<PauliMap> for Vec<(Coord, Basis)> {
    fn from(map: PauliMap) -> Self {
        map.iter().collect()
    }
}

impl Mul for &PauliMap {
    type Output = PauliMap;

    fn mul(self, rhs: &PauliMap) -> PauliMap {
        self.clone().with_product(rhs)
    }
}

impl fmt::Display for PauliMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "I");
        }
        let mut first = true;
        for (q, b) in self.iter() {
            if !first {
                write!(f, "*")?;
            }
            first = false;
            write!(f, "{b}{q}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(re: f64) -> Coord {
        Coord::real(re)
    }

    #[test]
    fn test_basis_products() {
        assert_eq!(Basis::X.multiply(Basis::X), None);
        assert_eq!(Basis::X.multiply(Basis::Z), Some(Basis::Y));
        assert_eq!(Basis::Z.multiply(Basis::Y), Some(Basis::X));
        assert_eq!(Basis::Y.multiply(Basis::X), Some(Basis::Z));
    }

    #[test]
    fn test_basis_parse() {
        assert_eq!("X".parse::<Basis>().unwrap(), Basis::X);
        assert!(matches!(
            "Q".parse::<Basis>(),
            Err(IrError::UnsupportedBasis(_))
        ));
        assert!("XY".parse::<Basis>().is_err());
    }

    #[test]
    fn test_repeated_term_cancels() {
        let p = PauliMap::new().with_xs([q(0.0)]).with_pairs([(q(0.0), Basis::X)]);
        assert!(p.is_empty());
    }

    #[test]
    fn test_x_and_z_make_y() {
        let p = PauliMap::new().with_xs([q(0.0)]).with_zs([q(0.0), q(1.0)]);
        assert_eq!(p.get(q(0.0)), Some(Basis::Y));
        assert_eq!(p.get(q(1.0)), Some(Basis::Z));
    }

    #[test]
    fn test_lettered_inputs() {
        let p = PauliMap::new()
            .with_lettered_groups([("X", vec![q(0.0), q(1.0)])])
            .unwrap()
            .with_lettered_pairs([(q(1.0), "X")])
            .unwrap();
        assert_eq!(p.len(), 1);
        assert!(PauliMap::new().with_lettered_pairs([(q(0.0), "W")]).is_err());
    }

    #[test]
    fn test_commutes() {
        let xx = PauliMap::new().with_xs([q(0.0), q(1.0)]);
        let zz = PauliMap::new().with_zs([q(0.0), q(1.0)]);
        let z0 = PauliMap::new().with_zs([q(0.0)]);
        assert!(xx.commutes(&zz));
        assert!(!xx.commutes(&z0));
    }

    #[test]
    fn test_display() {
        let p = PauliMap::new().with_xs([q(1.0)]).with_zs([q(0.0)]);
        assert_eq!(p.to_string(), "Z(0, 0)*X(1, 0)");
        assert_eq!(PauliMap::new().to_string(), "I");
    }

    #[test]
    fn test_json_pairs() {
        let p: PauliMap = serde_json::from_str(r#"[[[0, 0], "X"], [[1, 0], "Z"], [[0, 0], "Z"]]"#)
            .unwrap();
        assert_eq!(p.to_string(), "Y(0, 0)*Z(1, 0)");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"[[[0.0,0.0],"Y"],[[1.0,0.0],"Z"]]"#);
    }
}
