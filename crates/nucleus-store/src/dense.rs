//! Internal dense backing store shared by the scalar containers.

/// A growable dense array that materializes the default value lazily.
///
/// Slots beyond the current backing length read as `default` without
/// being allocated. Writes grow the backing geometrically (doubling) so
/// a run of ascending-id writes stays amortized O(1).
#[derive(Clone, Debug)]
pub(crate) struct DenseStore<T> {
    values: Vec<T>,
    default: T,
}

impl<T: Copy> DenseStore<T> {
    /// An empty store with the given default and pre-sized capacity.
    pub(crate) fn new(default: T, capacity: usize) -> Self {
        Self {
            values: vec![default; capacity],
            default,
        }
    }

    /// The stored value for `id`, or the default if never set.
    pub(crate) fn get(&self, id: usize) -> T {
        self.values.get(id).copied().unwrap_or(self.default)
    }

    /// Store `value` at `id`, growing the backing if needed.
    pub(crate) fn set(&mut self, id: usize, value: T) {
        if id >= self.values.len() {
            self.grow_to(id + 1);
        }
        self.values[id] = value;
    }

    /// Extend the backing by `additional` slots filled with the default.
    pub(crate) fn increment_capacity(&mut self, additional: usize) {
        let target = self.values.len() + additional;
        self.values.resize(target, self.default);
    }

    /// Current backing capacity in slots.
    pub(crate) fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Grow the backing so at least `needed` slots exist.
    ///
    /// Doubles from the current length (minimum 16) until `needed` fits,
    /// so interleaved `set` calls with ascending ids stay amortized O(1).
    fn grow_to(&mut self, needed: usize) {
        let mut target = self.values.len().max(16);
        while target < needed {
            target *= 2;
        }
        self.values.resize(target, self.default);
    }
}
