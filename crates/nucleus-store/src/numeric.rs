//! Dense scalar property containers.
//!
//! [`IntStore`], [`FloatStore`], and [`DoubleStore`] wrap the internal
//! dense backing with definition-kind validation at construction. All
//! three share the container contract described in the crate docs.

use nucleus_core::{ContractError, ErrorCode};

use crate::definition::{PropertyDefinition, PropertyKind, PropertyValue};
use crate::dense::DenseStore;

fn kind_mismatch(expected: PropertyKind, got: PropertyKind) -> ContractError {
    ContractError::with_detail(
        ErrorCode::IncompatibleDefinition,
        format!("expected {expected}, got {got}"),
    )
}

fn presize(existing_ids: impl IntoIterator<Item = usize>) -> usize {
    existing_ids.into_iter().max().map_or(0, |id| id + 1)
}

// ── IntStore ────────────────────────────────────────────────────

/// Dense `i64` property values.
#[derive(Clone, Debug)]
pub struct IntStore {
    inner: DenseStore<i64>,
}

impl IntStore {
    /// An empty store with the given default and pre-sized capacity.
    pub fn new(default: i64, capacity: usize) -> Self {
        Self {
            inner: DenseStore::new(default, capacity),
        }
    }

    /// Build a store from an int-kind definition and an iterator of
    /// pre-existing ids used to pre-size capacity.
    ///
    /// # Errors
    ///
    /// `INCOMPATIBLE_DEFINITION` if the definition is not int-kind.
    pub fn from_definition(
        definition: &PropertyDefinition,
        existing_ids: impl IntoIterator<Item = usize>,
    ) -> Result<Self, ContractError> {
        if definition.kind() != PropertyKind::Int {
            return Err(kind_mismatch(PropertyKind::Int, definition.kind()));
        }
        let default = match definition.default() {
            Some(PropertyValue::Int(v)) => v,
            _ => 0,
        };
        Ok(Self::new(default, presize(existing_ids)))
    }

    /// The stored value for `id`, or the default if never set.
    pub fn get(&self, id: usize) -> i64 {
        self.inner.get(id)
    }

    /// Store `value` at `id`, growing the backing if needed.
    pub fn set(&mut self, id: usize, value: i64) {
        self.inner.set(id, value);
    }

    /// Signal that `id` may later be reused. Content is untouched.
    pub fn remove_id(&mut self, _id: usize) {}

    /// Extend capacity by `additional` slots.
    pub fn increment_capacity(&mut self, additional: usize) {
        self.inner.increment_capacity(additional);
    }

    /// Current backing capacity in slots.
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

// ── FloatStore ──────────────────────────────────────────────────

/// Dense `f32` property values.
#[derive(Clone, Debug)]
pub struct FloatStore {
    inner: DenseStore<f32>,
}

impl FloatStore {
    /// An empty store with the given default and pre-sized capacity.
    pub fn new(default: f32, capacity: usize) -> Self {
        Self {
            inner: DenseStore::new(default, capacity),
        }
    }

    /// Build a store from a float-kind definition and an iterator of
    /// pre-existing ids used to pre-size capacity.
    ///
    /// # Errors
    ///
    /// `INCOMPATIBLE_DEFINITION` if the definition is not float-kind.
    pub fn from_definition(
        definition: &PropertyDefinition,
        existing_ids: impl IntoIterator<Item = usize>,
    ) -> Result<Self, ContractError> {
        if definition.kind() != PropertyKind::Float {
            return Err(kind_mismatch(PropertyKind::Float, definition.kind()));
        }
        let default = match definition.default() {
            Some(PropertyValue::Float(v)) => v,
            _ => 0.0,
        };
        Ok(Self::new(default, presize(existing_ids)))
    }

    /// The stored value for `id`, or the default if never set.
    pub fn get(&self, id: usize) -> f32 {
        self.inner.get(id)
    }

    /// Store `value` at `id`, growing the backing if needed.
    pub fn set(&mut self, id: usize, value: f32) {
        self.inner.set(id, value);
    }

    /// Signal that `id` may later be reused. Content is untouched.
    pub fn remove_id(&mut self, _id: usize) {}

    /// Extend capacity by `additional` slots.
    pub fn increment_capacity(&mut self, additional: usize) {
        self.inner.increment_capacity(additional);
    }

    /// Current backing capacity in slots.
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

// ── DoubleStore ─────────────────────────────────────────────────

/// Dense `f64` property values.
///
/// Also used internally by [`PropertyManager`](crate::PropertyManager)
/// to record assignment times when time tracking is enabled.
#[derive(Clone, Debug)]
pub struct DoubleStore {
    inner: DenseStore<f64>,
}

impl DoubleStore {
    /// An empty store with the given default and pre-sized capacity.
    pub fn new(default: f64, capacity: usize) -> Self {
        Self {
            inner: DenseStore::new(default, capacity),
        }
    }

    /// Build a store from a double-kind definition and an iterator of
    /// pre-existing ids used to pre-size capacity.
    ///
    /// # Errors
    ///
    /// `INCOMPATIBLE_DEFINITION` if the definition is not double-kind.
    pub fn from_definition(
        definition: &PropertyDefinition,
        existing_ids: impl IntoIterator<Item = usize>,
    ) -> Result<Self, ContractError> {
        if definition.kind() != PropertyKind::Double {
            return Err(kind_mismatch(PropertyKind::Double, definition.kind()));
        }
        let default = match definition.default() {
            Some(PropertyValue::Double(v)) => v,
            _ => 0.0,
        };
        Ok(Self::new(default, presize(existing_ids)))
    }

    /// The stored value for `id`, or the default if never set.
    pub fn get(&self, id: usize) -> f64 {
        self.inner.get(id)
    }

    /// Store `value` at `id`, growing the backing if needed.
    pub fn set(&mut self, id: usize, value: f64) {
        self.inner.set(id, value);
    }

    /// Signal that `id` may later be reused. Content is untouched.
    pub fn remove_id(&mut self, _id: usize) {}

    /// Extend capacity by `additional` slots.
    pub fn increment_capacity(&mut self, additional: usize) {
        self.inner.increment_capacity(additional);
    }

    /// Current backing capacity in slots.
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_round_trip_and_default() {
        let mut store = IntStore::new(-1, 0);
        assert_eq!(store.get(12), -1);
        store.set(12, 99);
        assert_eq!(store.get(12), 99);
        store.remove_id(12);
        assert_eq!(store.get(12), 99);
    }

    #[test]
    fn double_from_definition() {
        let def = PropertyDefinition::double_with_default(2.5);
        let store = DoubleStore::from_definition(&def, vec![0, 8]).unwrap();
        assert_eq!(store.get(8), 2.5);
        assert!(store.capacity() >= 9);
    }

    #[test]
    fn float_rejects_wrong_kind() {
        let def = PropertyDefinition::bool_with_default(false);
        let err = FloatStore::from_definition(&def, std::iter::empty()).unwrap_err();
        assert_eq!(err.code, ErrorCode::IncompatibleDefinition);
    }

    #[test]
    fn no_default_definition_backs_with_zero() {
        let def = PropertyDefinition::new(PropertyKind::Int, None, true).unwrap();
        let store = IntStore::from_definition(&def, std::iter::empty()).unwrap();
        assert_eq!(store.get(0), 0);
    }
}
