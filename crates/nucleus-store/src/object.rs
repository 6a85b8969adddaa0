//! Generic object property container.

use nucleus_core::{ContractError, ErrorCode};

use crate::definition::{PropertyDefinition, PropertyKind};

/// Dense property values of any `Clone` type.
///
/// Unlike the scalar containers, values are typed at compile time: the
/// type parameter plays the role the dynamic kind check plays for the
/// primitive kinds. An id that was never set reads back the declared
/// default (if any).
#[derive(Clone, Debug)]
pub struct ObjectStore<T: Clone> {
    values: Vec<Option<T>>,
    default: Option<T>,
}

impl<T: Clone> ObjectStore<T> {
    /// An empty store with the given default and pre-sized capacity.
    pub fn new(default: Option<T>, capacity: usize) -> Self {
        Self {
            values: vec![None; capacity],
            default,
        }
    }

    /// Build a store from an object-kind definition, a typed default,
    /// and an iterator of pre-existing ids used to pre-size capacity.
    ///
    /// # Errors
    ///
    /// `INCOMPATIBLE_DEFINITION` if the definition is not object-kind.
    pub fn from_definition(
        definition: &PropertyDefinition,
        default: Option<T>,
        existing_ids: impl IntoIterator<Item = usize>,
    ) -> Result<Self, ContractError> {
        if definition.kind() != PropertyKind::Object {
            return Err(ContractError::with_detail(
                ErrorCode::IncompatibleDefinition,
                format!("expected object, got {}", definition.kind()),
            ));
        }
        let capacity = existing_ids.into_iter().max().map_or(0, |id| id + 1);
        Ok(Self::new(default, capacity))
    }

    /// The stored value for `id`, or the default if never set.
    pub fn get(&self, id: usize) -> Option<&T> {
        match self.values.get(id) {
            Some(Some(value)) => Some(value),
            _ => self.default.as_ref(),
        }
    }

    /// Store `value` at `id`, growing the backing if needed.
    pub fn set(&mut self, id: usize, value: T) {
        if id >= self.values.len() {
            self.grow_to(id + 1);
        }
        self.values[id] = Some(value);
    }

    /// Signal that `id` may later be reused. Content is untouched.
    pub fn remove_id(&mut self, _id: usize) {}

    /// Extend capacity by `additional` slots.
    pub fn increment_capacity(&mut self, additional: usize) {
        let target = self.values.len() + additional;
        self.values.resize(target, None);
    }

    /// Current backing capacity in slots.
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    fn grow_to(&mut self, needed: usize) {
        let mut target = self.values.len().max(16);
        while target < needed {
            target *= 2;
        }
        self.values.resize(target, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_reads_default() {
        let store: ObjectStore<String> = ObjectStore::new(Some("d".to_string()), 4);
        assert_eq!(store.get(2).map(String::as_str), Some("d"));
        assert_eq!(store.get(100).map(String::as_str), Some("d"));
    }

    #[test]
    fn no_default_reads_none() {
        let store: ObjectStore<String> = ObjectStore::new(None, 0);
        assert!(store.get(0).is_none());
    }

    #[test]
    fn set_survives_remove() {
        let mut store = ObjectStore::new(None, 0);
        store.set(3, "hello".to_string());
        store.remove_id(3);
        assert_eq!(store.get(3).map(String::as_str), Some("hello"));
    }

    #[test]
    fn from_definition_checks_kind() {
        let def = PropertyDefinition::int_with_default(0);
        let err = ObjectStore::<String>::from_definition(&def, None, std::iter::empty())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::IncompatibleDefinition);

        let def = PropertyDefinition::object(true);
        let store =
            ObjectStore::<String>::from_definition(&def, Some("x".into()), vec![5]).unwrap();
        assert_eq!(store.capacity(), 6);
    }
}
