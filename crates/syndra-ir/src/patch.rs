//! Parity checks (tiles) and collections of them (patches).
//!
//! These are plain inputs: the layout of a code is decided elsewhere and
//! handed to the builder as a [`Patch`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::coord::Coord;
use crate::error::{IrError, IrResult};
use crate::pauli::{Basis, PauliMap};

/// Serialized form of a [`Tile`]; `bases` may be a single letter.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TileSpec {
    bases: String,
    measurement_qubit: Coord,
    ordered_data_qubits: Vec<Option<Coord>>,
}

/// A stabilizer annotated with how it is measured.
///
/// `ordered_data_qubits` lists the data qubits in interaction order. An
/// empty slot means nothing is interacted with at that step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TileSpec", into = "TileSpec")]
pub struct Tile {
    bases: Vec<Basis>,
    measurement_qubit: Coord,
    ordered_data_qubits: Vec<Option<Coord>>,
}

impl Tile {
    /// Create a tile. A single-letter `bases` is expanded to every slot.
    pub fn new(
        bases: &str,
        measurement_qubit: Coord,
        ordered_data_qubits: impl IntoIterator<Item = Option<Coord>>,
    ) -> IrResult<Self> {
        let ordered_data_qubits: Vec<Option<Coord>> = ordered_data_qubits.into_iter().collect();
        let mut parsed = bases
            .chars()
            .map(Basis::try_from)
            .collect::<IrResult<Vec<_>>>()?;
        if parsed.len() == 1 {
            parsed = vec![parsed[0]; ordered_data_qubits.len()];
        }
        if parsed.len() != ordered_data_qubits.len() {
            return Err(IrError::InvalidArgument(format!(
                "tile at {measurement_qubit} has {} bases for {} data slots",
                parsed.len(),
                ordered_data_qubits.len()
            )));
        }
        Ok(Self {
            bases: parsed,
            measurement_qubit,
            ordered_data_qubits,
        })
    }

    /// Create a tile whose slots are all occupied.
    pub fn with_data(
        bases: &str,
        measurement_qubit: Coord,
        data: impl IntoIterator<Item = Coord>,
    ) -> IrResult<Self> {
        Self::new(bases, measurement_qubit, data.into_iter().map(Some))
    }

    /// Per-slot bases.
    pub fn bases(&self) -> &[Basis] {
        &self.bases
    }

    /// The ancilla associated with this check.
    pub fn measurement_qubit(&self) -> Coord {
        self.measurement_qubit
    }

    /// Data qubits in interaction order.
    pub fn ordered_data_qubits(&self) -> &[Option<Coord>] {
        &self.ordered_data_qubits
    }

    /// Occupied slots as `(qubit, basis)` pairs, in interaction order.
    pub fn data_terms(&self) -> impl Iterator<Item = (Coord, Basis)> + '_ {
        self.ordered_data_qubits
            .iter()
            .zip(&self.bases)
            .filter_map(|(q, b)| q.map(|q| (q, *b)))
    }

    /// The single basis used by every occupied slot, if there is one.
    pub fn basis(&self) -> Option<Basis> {
        let bases: BTreeSet<Basis> = self.data_terms().map(|(_, b)| b).collect();
        if bases.len() == 1 { bases.first().copied() } else { None }
    }

    /// The data qubits.
    pub fn data_set(&self) -> BTreeSet<Coord> {
        self.data_terms().map(|(q, _)| q).collect()
    }

    /// Data qubits plus the measurement qubit.
    pub fn used_set(&self) -> BTreeSet<Coord> {
        let mut out = self.data_set();
        out.insert(self.measurement_qubit);
        out
    }

    /// The stabilizer as a Pauli product over the data qubits.
    pub fn to_data_pauli_map(&self) -> PauliMap {
        self.data_terms().collect()
    }

    /// Same tile with X and Z exchanged.
    #[must_use]
    pub fn with_xz_flipped(&self) -> Self {
        let bases = self
            .bases
            .iter()
            .map(|b| match b {
                Basis::X => Basis::Z,
                Basis::Y => Basis::Y,
                Basis::Z => Basis::X,
            })
            .collect();
        Self {
            bases,
            ..self.clone()
        }
    }

    /// Same tile with a data slot emptied.
    #[must_use]
    pub fn with_data_qubit_cleared(&self, qubit: Coord) -> Self {
        let ordered_data_qubits = self
            .ordered_data_qubits
            .iter()
            .map(|q| q.filter(|q| *q != qubit))
            .collect();
        Self {
            ordered_data_qubits,
            ..self.clone()
        }
    }
}

impl TryFrom<TileSpec> for Tile {
    type Error = IrError;

    fn try_from(spec: TileSpec) -> IrResult<Self> {
        Tile::new(&spec.bases, spec.measurement_qubit, spec.ordered_data_qubits)
    }
}

impl From<Tile> for TileSpec {
    fn from(tile: Tile) -> Self {
        TileSpec {
            bases: tile.bases.iter().map(|b| b.letter()).collect(),
            measurement_qubit: tile.measurement_qubit,
            ordered_data_qubits: tile.ordered_data_qubits,
        }
    }
}

/// A set of tiles measured together, kept sorted by measurement qubit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Tile>", into = "Vec<Tile>")]
pub struct Patch {
    tiles: Vec<Tile>,
}

impl Patch {
    /// Create a patch, sorting tiles into canonical measurement-qubit order.
    pub fn new(tiles: impl IntoIterator<Item = Tile>) -> Self {
        let mut tiles: Vec<Tile> = tiles.into_iter().collect();
        tiles.sort_by_key(Tile::measurement_qubit);
        Self { tiles }
    }

    /// Tiles in canonical order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Every data qubit.
    pub fn data_set(&self) -> BTreeSet<Coord> {
        self.tiles.iter().flat_map(Tile::data_set).collect()
    }

    /// Every measurement qubit.
    pub fn measure_set(&self) -> BTreeSet<Coord> {
        self.tiles.iter().map(Tile::measurement_qubit).collect()
    }

    /// Data and measurement qubits.
    pub fn used_set(&self) -> BTreeSet<Coord> {
        let mut out = self.data_set();
        out.extend(self.measure_set());
        out
    }

    /// The tile measured by `qubit`, if any.
    pub fn tile_at(&self, qubit: Coord) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.measurement_qubit == qubit)
    }
}

impl From<Vec<Tile>> for Patch {
    fn from(tiles: Vec<Tile>) -> Self {
        Patch::new(tiles)
    }
}

impl From<Patch> for Vec<Tile> {
    fn from(patch: Patch) -> Self {
        patch.tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Coord {
        Coord::new(re, im)
    }

    #[test]
    fn test_single_letter_bases_expand() {
        let t = Tile::new("X", c(0.5, 0.5), [Some(c(0.0, 0.0)), None, Some(c(1.0, 0.0))]).unwrap();
        assert_eq!(t.bases().len(), 3);
        assert_eq!(t.basis(), Some(Basis::X));
        assert_eq!(t.data_set().len(), 2);
        assert_eq!(t.used_set().len(), 3);
    }

    #[test]
    fn test_mixed_basis_has_no_uniform_basis() {
        let t = Tile::with_data("XZ", c(0.5, 0.5), [c(0.0, 0.0), c(1.0, 0.0)]).unwrap();
        assert_eq!(t.basis(), None);
        assert_eq!(t.with_xz_flipped().bases(), &[Basis::Z, Basis::X]);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(Tile::with_data("XZZ", c(0.0, 0.0), [c(1.0, 0.0)]).is_err());
        assert!(Tile::with_data("Q", c(0.0, 0.0), [c(1.0, 0.0)]).is_err());
    }

    #[test]
    fn test_patch_sorts_tiles() {
        let a = Tile::with_data("Z", c(2.0, 0.0), [c(1.0, 0.0)]).unwrap();
        let b = Tile::with_data("Z", c(0.0, 0.0), [c(1.0, 0.0)]).unwrap();
        let p = Patch::new([a, b]);
        assert_eq!(p.tiles()[0].measurement_qubit(), c(0.0, 0.0));
        assert_eq!(p.data_set().len(), 1);
        assert_eq!(p.used_set().len(), 3);
        assert!(p.tile_at(c(2.0, 0.0)).is_some());
    }

    #[test]
    fn test_serde_round_trip() {
        let t = Tile::new("Z", c(0.5, 0.5), [Some(c(0.0, 0.0)), None]).unwrap();
        let json = serde_json::to_string(&Patch::new([t.clone()])).unwrap();
        let back: Patch = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tiles()[0], t);
    }
}
