//! `PropertySet` for pass communication.
//!
//! The [`PropertySet`] is the shared context handed to every pass. It carries
//! the standard compilation options (noise model, immune qubits, the qubits
//! that exist for idling purposes) and a type-keyed map for anything passes
//! want to report to each other.
//!
//! # Examples
//!
//! ```
//! use syndra_compile::PropertySet;
//! use syndra_ir::NoiseModel;
//!
//! let props = PropertySet::new()
//!     .with_noise(NoiseModel::si1000(1e-3))
//!     .with_immune_qubits([4, 5]);
//!
//! assert!(props.noise_model.is_some());
//! assert!(props.immune_qubits.contains(&4));
//! ```
//!
//! Custom properties are keyed by type:
//!
//! ```
//! use syndra_compile::PropertySet;
//!
//! #[derive(Debug, PartialEq)]
//! struct MomentCount(usize);
//!
//! let mut props = PropertySet::new();
//! props.insert(MomentCount(12));
//! assert_eq!(props.get::<MomentCount>(), Some(&MomentCount(12)));
//! ```

use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::collections::BTreeSet;

use syndra_ir::NoiseModel;

/// Shared compilation context.
#[derive(Debug, Default)]
pub struct PropertySet {
    /// Noise to inject. Noise injection is skipped when unset.
    pub noise_model: Option<NoiseModel>,

    /// Qubit indices that never receive noise.
    pub immune_qubits: BTreeSet<u32>,

    /// Qubits considered present for idle noise.
    ///
    /// Defaults to every qubit the circuit touches.
    pub system_qubits: Option<BTreeSet<u32>>,

    /// Custom properties storage (type-erased).
    custom: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PropertySet {
    /// Create a new empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the noise model.
    #[must_use]
    pub fn with_noise(mut self, model: NoiseModel) -> Self {
        self.noise_model = Some(model);
        self
    }

    /// Mark qubits as immune to noise.
    #[must_use]
    pub fn with_immune_qubits(mut self, qubits: impl IntoIterator<Item = u32>) -> Self {
        self.immune_qubits.extend(qubits);
        self
    }

    /// Fix the set of qubits that idle noise applies to.
    #[must_use]
    pub fn with_system_qubits(mut self, qubits: impl IntoIterator<Item = u32>) -> Self {
        self.system_qubits = Some(qubits.into_iter().collect());
        self
    }

    /// Insert a custom property.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.custom.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a custom property.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.custom
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Get a mutable custom property.
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.custom
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Remove a custom property.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.custom
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let props = PropertySet::new()
            .with_immune_qubits([3, 1])
            .with_immune_qubits([2])
            .with_system_qubits(0..4);
        assert_eq!(props.immune_qubits.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(props.system_qubits.as_ref().map(BTreeSet::len), Some(4));
        assert!(props.noise_model.is_none());
    }

    #[test]
    fn test_custom_properties() {
        let mut props = PropertySet::new();
        props.insert(String::from("hello"));
        props.insert(42usize);

        assert_eq!(props.get::<String>().map(String::as_str), Some("hello"));
        *props.get_mut::<usize>().unwrap() += 1;
        assert_eq!(props.remove::<usize>(), Some(43));
        assert!(props.get::<usize>().is_none());
        assert!(props.get::<u8>().is_none());
    }
}
