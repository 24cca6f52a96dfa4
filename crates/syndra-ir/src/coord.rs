//! Planar qubit coordinates and their canonical ordering.
//!
//! Every place that flattens a set of qubits into a target list goes through
//! [`Coord`]'s `Ord` implementation, so it decides the byte-level shape of
//! every emitted circuit.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Mul, Sub};

use crate::error::{IrError, IrResult};

/// A position in the plane, `re + im·i`.
///
/// Ordering is canonical: coordinates with an integer real part come first,
/// then by real part, then by imaginary part.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Coord {
    /// Real (horizontal) component.
    pub re: f64,
    /// Imaginary (vertical) component.
    pub im: f64,
}

impl Coord {
    /// Create a coordinate. Negative zero is folded into positive zero.
    pub fn new(re: f64, im: f64) -> Self {
        Self {
            re: re + 0.0,
            im: im + 0.0,
        }
    }

    /// Coordinate on the real axis.
    pub fn real(re: f64) -> Self {
        Self::new(re, 0.0)
    }

    /// Whether the real part has a fractional component.
    pub fn has_fractional_real(&self) -> bool {
        self.re != self.re.trunc()
    }

    /// Compare two coordinates by the canonical key.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.has_fractional_real()
            .cmp(&other.has_fractional_real())
            .then_with(|| self.re.total_cmp(&other.re))
            .then_with(|| self.im.total_cmp(&other.im))
    }
}

impl PartialEq for Coord {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_cmp(other) == Ordering::Equal
    }
}

impl Eq for Coord {}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical_cmp(other)
    }
}

impl Hash for Coord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.re + 0.0).to_bits().hash(state);
        (self.im + 0.0).to_bits().hash(state);
    }
}

impl From<(f64, f64)> for Coord {
    fn from((re, im): (f64, f64)) -> Self {
        Self::new(re, im)
    }
}

impl From<Coord> for (f64, f64) {
    fn from(c: Coord) -> Self {
        (c.re, c.im)
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, rhs: Coord) -> Coord {
        Coord::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul<f64> for Coord {
    type Output = Coord;

    fn mul(self, rhs: f64) -> Coord {
        Coord::new(self.re * rhs, self.im * rhs)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", format_f64(self.re), format_f64(self.im))
    }
}

/// Render a number the way the circuit text format does (`1` not `1.0`).
pub fn format_f64(value: f64) -> String {
    if value.is_finite() && value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Deduplicate and sort coordinates into canonical order.
pub fn sorted_coords(coords: impl IntoIterator<Item = Coord>) -> Vec<Coord> {
    let mut out: Vec<Coord> = coords.into_iter().collect();
    out.sort();
    out.dedup();
    out
}

/// Bounding box `(min, max)` of a set of coordinates.
///
/// Falls back to `default` for empty input, and fails if there is none.
pub fn min_max(
    coords: impl IntoIterator<Item = Coord>,
    default: Option<Coord>,
) -> IrResult<(Coord, Coord)> {
    let mut iter = coords.into_iter();
    let Some(first) = iter.next() else {
        return default.map(|d| (d, d)).ok_or_else(|| {
            IrError::InvalidArgument("bounding box of an empty coordinate set".into())
        });
    };
    let (mut lo, mut hi) = (first, first);
    for c in iter {
        lo = Coord::new(lo.re.min(c.re), lo.im.min(c.im));
        hi = Coord::new(hi.re.max(c.re), hi.im.max(c.im));
    }
    Ok((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_real_parts_sort_first() {
        let sorted = sorted_coords([
            Coord::new(0.5, 0.0),
            Coord::new(1.0, 1.0),
            Coord::new(0.0, 2.0),
            Coord::new(1.0, 0.0),
        ]);
        assert_eq!(
            sorted,
            vec![
                Coord::new(0.0, 2.0),
                Coord::new(1.0, 0.0),
                Coord::new(1.0, 1.0),
                Coord::new(0.5, 0.0),
            ]
        );
    }

    #[test]
    fn test_negative_zero_is_zero() {
        let a = Coord::new(-0.0, 1.0);
        let b = Coord::new(0.0, 1.0);
        assert_eq!(a, b);
        assert_eq!(sorted_coords([a, b]).len(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(Coord::new(0.5, -1.0).to_string(), "(0.5, -1)");
    }

    #[test]
    fn test_min_max() {
        let (lo, hi) = min_max([Coord::new(2.0, -1.0), Coord::new(0.0, 3.0)], None).unwrap();
        assert_eq!(lo, Coord::new(0.0, -1.0));
        assert_eq!(hi, Coord::new(2.0, 3.0));

        assert!(min_max([], None).is_err());
        let d = Coord::new(1.0, 1.0);
        assert_eq!(min_max([], Some(d)).unwrap(), (d, d));
    }
}
