//! Layer representation of circuits.
//!
//! A [`LayerCircuit`] groups a circuit's instructions into [`Layer`]s of one
//! kind each. In that form adjacent layers can be fused, and resets,
//! measurements and interactions can be rewritten into the Z basis with
//! explicit single-qubit [`Rotation`]s around them.

mod layer;
mod layer_circuit;
mod rotation;

pub use layer::{Interaction, Layer, LoopLayer, MeasureTarget, Product};
pub use layer_circuit::{LayerCircuit, transpile_to_z_basis_interaction_circuit};
pub use rotation::{Rotation, SignedPauli};
