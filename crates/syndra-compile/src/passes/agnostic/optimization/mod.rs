//! Optimization passes.

mod layer_fusion;

#[cfg(test)]
mod tests;

pub use layer_fusion::LocalOptimization;
