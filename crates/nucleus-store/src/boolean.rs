//! Bit-packed boolean property container.

use nucleus_core::{ContractError, ErrorCode};

use crate::definition::{PropertyDefinition, PropertyKind};

const BITS_PER_BLOCK: usize = 64;

/// Boolean property values packed one bit per id.
///
/// Storage is a `Vec<u64>` of bit blocks plus a shared default bit.
/// Blocks are initialized to the default pattern, so an id inside the
/// current capacity that was never set still reads the default.
///
/// `remove_id` is a lazy no-op with respect to content: a `get` after a
/// remove without an intervening reset still returns the last set value.
#[derive(Clone, Debug)]
pub struct BoolStore {
    blocks: Vec<u64>,
    default: bool,
}

impl BoolStore {
    /// An empty store with the given default and pre-sized bit capacity.
    pub fn new(default: bool, capacity: usize) -> Self {
        let block_count = capacity.div_ceil(BITS_PER_BLOCK);
        Self {
            blocks: vec![Self::fill_pattern(default); block_count],
            default,
        }
    }

    /// Build a store from a definition and an iterator of pre-existing
    /// ids used to pre-size capacity.
    ///
    /// # Errors
    ///
    /// `INCOMPATIBLE_DEFINITION` if the definition is not boolean-kind.
    pub fn from_definition(
        definition: &PropertyDefinition,
        existing_ids: impl IntoIterator<Item = usize>,
    ) -> Result<Self, ContractError> {
        if definition.kind() != PropertyKind::Bool {
            return Err(ContractError::with_detail(
                ErrorCode::IncompatibleDefinition,
                format!("expected bool, got {}", definition.kind()),
            ));
        }
        let default = match definition.default() {
            Some(crate::PropertyValue::Bool(v)) => v,
            _ => false,
        };
        let capacity = existing_ids.into_iter().max().map_or(0, |id| id + 1);
        Ok(Self::new(default, capacity))
    }

    /// The stored bit for `id`, or the default if never set.
    pub fn get(&self, id: usize) -> bool {
        let block = id / BITS_PER_BLOCK;
        match self.blocks.get(block) {
            Some(bits) => bits & (1u64 << (id % BITS_PER_BLOCK)) != 0,
            None => self.default,
        }
    }

    /// Store `value` at `id`, growing the backing if needed.
    pub fn set(&mut self, id: usize, value: bool) {
        let block = id / BITS_PER_BLOCK;
        if block >= self.blocks.len() {
            self.grow_to(block + 1);
        }
        let mask = 1u64 << (id % BITS_PER_BLOCK);
        if value {
            self.blocks[block] |= mask;
        } else {
            self.blocks[block] &= !mask;
        }
    }

    /// Signal that `id` may later be reused.
    ///
    /// Deliberately does not reset the stored bit — reclaimed slots are
    /// not eagerly zeroed, so a subsequent `get` returns the last set
    /// value until the slot is overwritten.
    pub fn remove_id(&mut self, _id: usize) {}

    /// Extend capacity by at least `additional` ids.
    pub fn increment_capacity(&mut self, additional: usize) {
        let blocks = additional.div_ceil(BITS_PER_BLOCK);
        let pattern = Self::fill_pattern(self.default);
        self.blocks.extend(std::iter::repeat_n(pattern, blocks));
    }

    /// Current capacity in ids.
    pub fn capacity(&self) -> usize {
        self.blocks.len() * BITS_PER_BLOCK
    }

    /// The shared default bit.
    pub fn default_value(&self) -> bool {
        self.default
    }

    fn fill_pattern(default: bool) -> u64 {
        if default {
            u64::MAX
        } else {
            0
        }
    }

    fn grow_to(&mut self, needed_blocks: usize) {
        let mut target = self.blocks.len().max(1);
        while target < needed_blocks {
            target *= 2;
        }
        let pattern = Self::fill_pattern(self.default);
        self.blocks.resize(target, pattern);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PropertyValue;

    #[test]
    fn unset_reads_default() {
        let store = BoolStore::new(true, 0);
        assert!(store.get(0));
        assert!(store.get(999));
    }

    #[test]
    fn set_get_remove_round_trip() {
        // Default false, set(5, true), remove(5): the stored bit
        // survives the remove.
        let mut store = BoolStore::new(false, 0);
        store.set(5, true);
        assert!(store.get(5));
        assert!(!store.get(6));
        store.remove_id(5);
        assert!(store.get(5));
    }

    #[test]
    fn block_boundaries() {
        let mut store = BoolStore::new(false, 0);
        for id in [63, 64, 65, 127, 128] {
            store.set(id, true);
        }
        assert!(store.get(63));
        assert!(store.get(64));
        assert!(store.get(65));
        assert!(store.get(127));
        assert!(store.get(128));
        assert!(!store.get(62));
        assert!(!store.get(66));
    }

    #[test]
    fn default_true_within_grown_capacity() {
        let mut store = BoolStore::new(true, 0);
        store.set(10, false);
        assert!(!store.get(10));
        // Ids inside the grown block but never set keep the default.
        assert!(store.get(11));
        assert!(store.get(63));
    }

    #[test]
    fn from_definition_checks_kind() {
        let def = PropertyDefinition::int_with_default(0);
        let err = BoolStore::from_definition(&def, std::iter::empty()).unwrap_err();
        assert_eq!(err.code, ErrorCode::IncompatibleDefinition);

        let def = PropertyDefinition::bool_with_default(true);
        let store = BoolStore::from_definition(&def, vec![3, 70]).unwrap();
        assert!(store.default_value());
        assert!(store.capacity() >= 71);
        assert_eq!(
            store.default_value(),
            matches!(def.default(), Some(PropertyValue::Bool(true)))
        );
    }

    #[test]
    fn increment_capacity_preserves_default_pattern() {
        let mut store = BoolStore::new(true, 64);
        store.increment_capacity(64);
        assert!(store.capacity() >= 128);
        assert!(store.get(100));
    }

    // ── proptest ───────────────────────────────────────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn round_trip_against_reference(
                default in any::<bool>(),
                writes in prop::collection::vec((0usize..512, any::<bool>()), 0..128),
                removes in prop::collection::vec(0usize..512, 0..32),
            ) {
                let mut store = BoolStore::new(default, 0);
                let mut reference = std::collections::HashMap::new();
                for (id, value) in &writes {
                    store.set(*id, *value);
                    reference.insert(*id, *value);
                }
                for id in &removes {
                    store.remove_id(*id);
                }
                for id in 0..512 {
                    let expected = reference.get(&id).copied().unwrap_or(default);
                    prop_assert_eq!(store.get(id), expected, "id {}", id);
                }
            }
        }
    }
}
