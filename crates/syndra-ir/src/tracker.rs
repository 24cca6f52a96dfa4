//! Symbolic measurement bookkeeping.
//!
//! The [`MeasurementTracker`] maps caller-chosen keys to sets of measurement
//! indices. Keys are bound exactly once. Resolving a list of keys XORs their
//! index sets together, which is what detector and observable annotations
//! need: a measurement referenced an even number of times drops out.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::coord::Coord;
use crate::error::{IrError, IrResult};
use crate::target::Target;

/// A name for a measurement result (or group of results).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementKey {
    /// A free-form name.
    Name(String),
    /// A qubit position.
    Coord(Coord),
    /// Another key qualified by the layer it was measured in.
    AtLayer {
        /// The inner key.
        key: Box<MeasurementKey>,
        /// Layer label.
        layer: String,
    },
}

impl MeasurementKey {
    /// Qualify `key` with a layer label.
    pub fn at_layer(key: impl Into<MeasurementKey>, layer: impl Into<String>) -> Self {
        MeasurementKey::AtLayer {
            key: Box::new(key.into()),
            layer: layer.into(),
        }
    }
}

impl From<&str> for MeasurementKey {
    fn from(name: &str) -> Self {
        MeasurementKey::Name(name.to_string())
    }
}

impl From<String> for MeasurementKey {
    fn from(name: String) -> Self {
        MeasurementKey::Name(name)
    }
}

impl From<Coord> for MeasurementKey {
    fn from(c: Coord) -> Self {
        MeasurementKey::Coord(c)
    }
}

impl fmt::Display for MeasurementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementKey::Name(name) => write!(f, "{name}"),
            MeasurementKey::Coord(c) => write!(f, "{c}"),
            MeasurementKey::AtLayer { key, layer } => write!(f, "{key}@{layer}"),
        }
    }
}

/// Maps measurement keys to measurement indices.
///
/// A key bound to `None` is an obstacle: it is known to exist but may not be
/// referenced.
#[derive(Debug, Clone, Default)]
pub struct MeasurementTracker {
    recorded: FxHashMap<MeasurementKey, Option<Vec<u64>>>,
    next_measurement_index: u64,
}

/// A tracker shared between a builder and its forks.
pub type TrackerHandle = Rc<RefCell<MeasurementTracker>>;

impl MeasurementTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a tracker for sharing.
    pub fn into_handle(self) -> TrackerHandle {
        Rc::new(RefCell::new(self))
    }

    /// Number of measurements recorded so far.
    pub fn num_measurements(&self) -> u64 {
        self.next_measurement_index
    }

    /// Whether `key` has been bound (to anything, including an obstacle).
    pub fn contains(&self, key: &MeasurementKey) -> bool {
        self.recorded.contains_key(key)
    }

    fn bind(&mut self, key: MeasurementKey, value: Option<Vec<u64>>) -> IrResult<()> {
        if self.recorded.contains_key(&key) {
            return Err(IrError::KeyCollision(key));
        }
        self.recorded.insert(key, value);
        Ok(())
    }

    /// Bind `key` to the next measurement index.
    pub fn record_measurement(&mut self, key: impl Into<MeasurementKey>) -> IrResult<()> {
        let index = self.next_measurement_index;
        self.bind(key.into(), Some(vec![index]))?;
        self.next_measurement_index += 1;
        Ok(())
    }

    /// Bind `key` to the XOR of already bound keys.
    pub fn make_measurement_group<K>(
        &mut self,
        sub_keys: impl IntoIterator<Item = K>,
        key: impl Into<MeasurementKey>,
    ) -> IrResult<()>
    where
        K: Into<MeasurementKey>,
    {
        let key = key.into();
        let indices = self.measurement_indices(sub_keys)?;
        self.bind(key, Some(indices))
    }

    /// Bind `key` to an obstacle.
    pub fn record_obstacle(&mut self, key: impl Into<MeasurementKey>) -> IrResult<()> {
        self.bind(key.into(), None)
    }

    /// Resolve keys to the XOR of their index sets, sorted ascending.
    pub fn measurement_indices<K>(&self, keys: impl IntoIterator<Item = K>) -> IrResult<Vec<u64>>
    where
        K: Into<MeasurementKey>,
    {
        let mut result = BTreeSet::new();
        for key in keys {
            let key = key.into();
            let indices = match self.recorded.get(&key) {
                None => return Err(IrError::UnboundKey(key)),
                Some(None) => return Err(IrError::ObstacleReference(key)),
                Some(Some(indices)) => indices,
            };
            for &index in indices {
                if !result.remove(&index) {
                    result.insert(index);
                }
            }
        }
        Ok(result.into_iter().collect())
    }

    /// Account for the last `body_measurements` measurements being repeated
    /// `count` times in total.
    ///
    /// Keys bound to those measurements move to the final repetition, so
    /// references made afterwards keep pointing at the most recent results.
    pub fn repeat_recent(&mut self, body_measurements: u64, count: u64) -> IrResult<()> {
        if body_measurements == 0 {
            return Ok(());
        }
        if count == 0 {
            return Err(IrError::InvalidArgument(
                "cannot repeat measurements zero times".into(),
            ));
        }
        let start = self
            .next_measurement_index
            .checked_sub(body_measurements)
            .ok_or_else(|| {
                IrError::InvalidArgument(format!(
                    "only {} measurements recorded, cannot repeat {body_measurements}",
                    self.next_measurement_index
                ))
            })?;
        let shift = (count - 1) * body_measurements;
        for indices in self.recorded.values_mut().flatten() {
            for index in indices.iter_mut().filter(|i| **i >= start) {
                *index += shift;
            }
        }
        self.next_measurement_index += shift;
        Ok(())
    }

    /// Resolve keys to record targets relative to the current measurement count.
    pub fn current_measurement_record_targets_for<K>(
        &self,
        keys: impl IntoIterator<Item = K>,
    ) -> IrResult<Vec<Target>>
    where
        K: Into<MeasurementKey>,
    {
        let now = self.next_measurement_index;
        self.measurement_indices(keys)?
            .into_iter()
            .map(|index| {
                i32::try_from(now - index)
                    .map(|back| Target::Rec(-back))
                    .map_err(|_| {
                        IrError::InvalidArgument(format!(
                            "measurement {index} is too far back to reference"
                        ))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_resolve() {
        let mut t = MeasurementTracker::new();
        t.record_measurement("a").unwrap();
        t.record_measurement("b").unwrap();
        t.record_measurement("c").unwrap();
        assert_eq!(t.measurement_indices(["c", "a"]).unwrap(), vec![0, 2]);
        assert_eq!(
            t.current_measurement_record_targets_for(["a", "c"]).unwrap(),
            vec![Target::Rec(-3), Target::Rec(-1)]
        );
    }

    #[test]
    fn test_collision() {
        let mut t = MeasurementTracker::new();
        t.record_measurement("a").unwrap();
        assert!(matches!(t.record_measurement("a"), Err(IrError::KeyCollision(_))));
        assert!(matches!(t.record_obstacle("a"), Err(IrError::KeyCollision(_))));
        assert_eq!(t.num_measurements(), 1);
    }

    #[test]
    fn test_groups_xor() {
        let mut t = MeasurementTracker::new();
        t.record_measurement("a").unwrap();
        t.record_measurement("b").unwrap();
        t.make_measurement_group(["a", "b"], "ab").unwrap();
        t.make_measurement_group(["ab", "a"], "just_b").unwrap();
        assert_eq!(t.measurement_indices(["just_b"]).unwrap(), vec![1]);
        assert!(t.measurement_indices(["a", "a"]).unwrap().is_empty());
        t.make_measurement_group(Vec::<MeasurementKey>::new(), "empty").unwrap();
        assert!(t.measurement_indices(["empty"]).unwrap().is_empty());
    }

    #[test]
    fn test_unbound_and_obstacle() {
        let mut t = MeasurementTracker::new();
        t.record_obstacle("wall").unwrap();
        assert!(matches!(t.measurement_indices(["nope"]), Err(IrError::UnboundKey(_))));
        assert!(matches!(
            t.measurement_indices(["wall"]),
            Err(IrError::ObstacleReference(_))
        ));
        assert!(matches!(
            t.make_measurement_group(["wall"], "g"),
            Err(IrError::ObstacleReference(_))
        ));
        assert!(!t.contains(&"g".into()));
    }

    #[test]
    fn test_at_layer_keys_are_distinct() {
        let q = Coord::new(1.0, 2.0);
        let mut t = MeasurementTracker::new();
        t.record_measurement(MeasurementKey::at_layer(q, "init")).unwrap();
        t.record_measurement(MeasurementKey::at_layer(q, "loop")).unwrap();
        let key = MeasurementKey::at_layer(q, "init");
        assert_eq!(key.to_string(), "(1, 2)@init");
        assert_eq!(t.measurement_indices([key]).unwrap(), vec![0]);
    }

    #[test]
    fn test_repeat_recent_moves_body_keys() {
        let mut t = MeasurementTracker::new();
        t.record_measurement("before").unwrap();
        t.record_measurement("body").unwrap();
        t.repeat_recent(1, 5).unwrap();
        assert_eq!(t.num_measurements(), 6);
        assert_eq!(t.measurement_indices(["before"]).unwrap(), vec![0]);
        assert_eq!(
            t.current_measurement_record_targets_for(["body"]).unwrap(),
            vec![Target::Rec(-1)]
        );
        assert!(t.repeat_recent(1, 0).is_err());
        assert!(t.repeat_recent(10, 2).is_err());
    }

    #[test]
    fn test_copy_is_independent() {
        let mut t = MeasurementTracker::new();
        t.record_measurement("a").unwrap();
        let mut copy = t.clone();
        copy.record_measurement("b").unwrap();
        assert!(!t.contains(&"b".into()));
        assert_eq!(t.num_measurements(), 1);
        assert_eq!(copy.num_measurements(), 2);
    }
}
