//! Exact single-qubit Clifford rotations.
//!
//! A [`Rotation`] is stored as the signed images of X and Z under
//! conjugation. There are 24 of them, each with its own gate name, and
//! composing two is exact.

use std::fmt;

use syndra_ir::{Basis, Gate};

/// A Pauli operator with a sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignedPauli {
    /// The unsigned Pauli.
    pub basis: Basis,
    /// Whether the sign is negative.
    pub negative: bool,
}

impl SignedPauli {
    const fn plus(basis: Basis) -> Self {
        Self {
            basis,
            negative: false,
        }
    }

    const fn minus(basis: Basis) -> Self {
        Self {
            basis,
            negative: true,
        }
    }
}

impl fmt::Display for SignedPauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.negative { '-' } else { '+' };
        write!(f, "{sign}{}", self.basis)
    }
}

/// A single-qubit Clifford operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rotation {
    x: SignedPauli,
    z: SignedPauli,
}

const fn rot(x: SignedPauli, z: SignedPauli) -> Rotation {
    Rotation { x, z }
}

use Basis::{X, Y, Z};

const NAMED: &[(&str, Rotation)] = &[
    ("I", rot(SignedPauli::plus(X), SignedPauli::plus(Z))),
    ("X", rot(SignedPauli::plus(X), SignedPauli::minus(Z))),
    ("Y", rot(SignedPauli::minus(X), SignedPauli::minus(Z))),
    ("Z", rot(SignedPauli::minus(X), SignedPauli::plus(Z))),
    ("H", rot(SignedPauli::plus(Z), SignedPauli::plus(X))),
    ("H_XY", rot(SignedPauli::plus(Y), SignedPauli::minus(Z))),
    ("H_YZ", rot(SignedPauli::minus(X), SignedPauli::plus(Y))),
    ("H_NXY", rot(SignedPauli::minus(Y), SignedPauli::minus(Z))),
    ("H_NXZ", rot(SignedPauli::minus(Z), SignedPauli::minus(X))),
    ("H_NYZ", rot(SignedPauli::minus(X), SignedPauli::minus(Y))),
    ("S", rot(SignedPauli::plus(Y), SignedPauli::plus(Z))),
    ("S_DAG", rot(SignedPauli::minus(Y), SignedPauli::plus(Z))),
    ("SQRT_X", rot(SignedPauli::plus(X), SignedPauli::minus(Y))),
    ("SQRT_X_DAG", rot(SignedPauli::plus(X), SignedPauli::plus(Y))),
    ("SQRT_Y", rot(SignedPauli::minus(Z), SignedPauli::plus(X))),
    ("SQRT_Y_DAG", rot(SignedPauli::plus(Z), SignedPauli::minus(X))),
    ("C_XYZ", rot(SignedPauli::plus(Y), SignedPauli::plus(X))),
    ("C_ZYX", rot(SignedPauli::plus(Z), SignedPauli::plus(Y))),
    ("C_NXYZ", rot(SignedPauli::minus(Y), SignedPauli::minus(X))),
    ("C_XNYZ", rot(SignedPauli::minus(Y), SignedPauli::plus(X))),
    ("C_XYNZ", rot(SignedPauli::plus(Y), SignedPauli::minus(X))),
    ("C_NZYX", rot(SignedPauli::minus(Z), SignedPauli::minus(Y))),
    ("C_ZNYX", rot(SignedPauli::plus(Z), SignedPauli::minus(Y))),
    ("C_ZYNX", rot(SignedPauli::minus(Z), SignedPauli::plus(Y))),
];

fn third(a: Basis, b: Basis) -> Basis {
    match (a, b) {
        (X, Y) | (Y, X) => Z,
        (Y, Z) | (Z, Y) => X,
        _ => Y,
    }
}

fn is_cyclic(a: Basis, b: Basis) -> bool {
    matches!((a, b), (X, Y) | (Y, Z) | (Z, X))
}

impl Rotation {
    /// The identity.
    pub const IDENTITY: Rotation = rot(SignedPauli::plus(X), SignedPauli::plus(Z));

    /// The rotation performed by a named single-qubit Clifford gate.
    pub fn from_gate(name: &str) -> Option<Self> {
        let gate = Gate::lookup(name).ok()?;
        NAMED
            .iter()
            .find(|(n, _)| *n == gate.name)
            .map(|(_, r)| *r)
    }

    /// The rotation that maps `basis` onto Z (and back; each entry is its
    /// own inverse).
    pub fn basis_to_z(basis: Basis) -> Self {
        let name = match basis {
            X => "H",
            Y => "H_YZ",
            Z => "I",
        };
        NAMED
            .iter()
            .find(|(n, _)| *n == name)
            .map_or(Self::IDENTITY, |(_, r)| *r)
    }

    /// Every single-qubit Clifford.
    pub fn all() -> impl Iterator<Item = Rotation> {
        let signs = [false, true];
        Basis::ALL.into_iter().flat_map(move |xb| {
            Basis::ALL
                .into_iter()
                .filter(move |zb| *zb != xb)
                .flat_map(move |zb| {
                    signs.into_iter().flat_map(move |xn| {
                        signs.into_iter().map(move |zn| Rotation {
                            x: SignedPauli {
                                basis: xb,
                                negative: xn,
                            },
                            z: SignedPauli {
                                basis: zb,
                                negative: zn,
                            },
                        })
                    })
                })
        })
    }

    /// Whether this is the identity.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// The signed image of an unsigned Pauli.
    pub fn image(&self, basis: Basis) -> SignedPauli {
        match basis {
            X => self.x,
            Z => self.z,
            Y => {
                // Y = iXZ, and XZ-type products pick up a sign unless cyclic.
                let anti_cyclic = !is_cyclic(self.x.basis, self.z.basis);
                SignedPauli {
                    basis: third(self.x.basis, self.z.basis),
                    negative: !(anti_cyclic ^ self.x.negative ^ self.z.negative),
                }
            }
        }
    }

    fn apply(&self, p: SignedPauli) -> SignedPauli {
        let image = self.image(p.basis);
        SignedPauli {
            basis: image.basis,
            negative: image.negative ^ p.negative,
        }
    }

    /// This rotation followed by `next`.
    #[must_use]
    pub fn then(&self, next: &Rotation) -> Rotation {
        Rotation {
            x: next.apply(self.x),
            z: next.apply(self.z),
        }
    }

    /// The rotation undoing this one.
    #[must_use]
    pub fn inverse(&self) -> Rotation {
        Self::all()
            .find(|r| self.then(r).is_identity())
            .unwrap_or(Self::IDENTITY)
    }

    /// Name of the gate performing this rotation.
    pub fn gate_name(&self) -> &'static str {
        NAMED
            .iter()
            .find(|(_, r)| r == self)
            .map_or("I", |(name, _)| name)
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.gate_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(name: &str) -> Rotation {
        Rotation::from_gate(name).unwrap()
    }

    #[test]
    fn test_group_has_24_elements() {
        let all: std::collections::HashSet<Rotation> = Rotation::all().collect();
        assert_eq!(all.len(), 24);
        for a in &all {
            assert!(a.then(&a.inverse()).is_identity());
            assert!(all.contains(&a.then(&r("H"))));
        }
    }

    #[test]
    fn test_y_images() {
        assert_eq!(r("I").image(Y), SignedPauli::plus(Y));
        assert_eq!(r("H").image(Y), SignedPauli::minus(Y));
        assert_eq!(r("S").image(Y), SignedPauli::minus(X));
        assert_eq!(r("C_XYZ").image(Y), SignedPauli::plus(Z));
        assert_eq!(r("H_YZ").image(Y), SignedPauli::plus(Z));
    }

    #[test]
    fn test_composition() {
        assert!(r("H").then(&r("H")).is_identity());
        assert_eq!(r("S").then(&r("S")), r("Z"));
        assert_eq!(r("SQRT_X").then(&r("SQRT_X")), r("X"));
        assert_eq!(r("C_XYZ").then(&r("C_XYZ")), r("C_ZYX"));
        assert_eq!(r("S").inverse(), r("S_DAG"));
        assert_eq!(r("X").inverse(), r("X"));
        assert!(Rotation::from_gate("CX").is_none());
    }

    #[test]
    fn test_aliases_resolve() {
        assert_eq!(r("SQRT_Z"), r("S"));
        assert_eq!(r("H_XZ"), r("H"));
    }

    #[test]
    fn test_every_rotation_has_a_gate() {
        let names: std::collections::HashSet<&str> =
            Rotation::all().map(|r| r.gate_name()).collect();
        assert_eq!(names.len(), 24);
        for rotation in Rotation::all() {
            assert_eq!(r(rotation.gate_name()), rotation);
        }
        assert_eq!(Rotation::IDENTITY.to_string(), "I");
    }

    #[test]
    fn test_basis_to_z() {
        for basis in Basis::ALL {
            let rotation = Rotation::basis_to_z(basis);
            assert_eq!(rotation.image(basis).basis, Z);
            assert!(rotation.then(&rotation).is_identity());
        }
    }
}
