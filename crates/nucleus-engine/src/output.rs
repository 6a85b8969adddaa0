//! Type-indexed output consumer.
//!
//! Handlers release arbitrary typed objects (strings, plugin-data
//! snapshots, report items, checkpoints) during a run; the buffer
//! indexes them by runtime type so tests and checkpoint/report consumers
//! can retrieve them after the run without knowing release order across
//! types.

use std::any::{Any, TypeId};
use std::fmt;

use indexmap::IndexMap;

/// Released output items indexed by their runtime type.
///
/// Within one type, items stay in release order.
#[derive(Default)]
pub struct OutputBuffer {
    items: IndexMap<TypeId, Vec<Box<dyn Any>>>,
}

impl OutputBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one item.
    pub fn release<T: 'static>(&mut self, item: T) {
        self.items
            .entry(TypeId::of::<T>())
            .or_default()
            .push(Box::new(item));
    }

    /// Remove and return all items of type `T`, in release order.
    pub fn take<T: 'static>(&mut self) -> Vec<T> {
        self.items
            .shift_remove(&TypeId::of::<T>())
            .unwrap_or_default()
            .into_iter()
            .map(|b| *b.downcast::<T>().expect("bucket keyed by item type"))
            .collect()
    }

    /// Iterate items of type `T` without removing them.
    pub fn iter<T: 'static>(&self) -> impl Iterator<Item = &T> {
        self.items
            .get(&TypeId::of::<T>())
            .into_iter()
            .flatten()
            .map(|b| b.downcast_ref::<T>().expect("bucket keyed by item type"))
    }

    /// Number of buffered items of type `T`.
    pub fn count<T: 'static>(&self) -> usize {
        self.items.get(&TypeId::of::<T>()).map_or(0, Vec::len)
    }
}

impl fmt::Debug for OutputBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputBuffer")
            .field("types", &self.items.len())
            .field("items", &self.items.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_by_runtime_type() {
        let mut buffer = OutputBuffer::new();
        buffer.release("alpha".to_string());
        buffer.release(1u32);
        buffer.release("beta".to_string());
        buffer.release(2u32);

        assert_eq!(buffer.count::<String>(), 2);
        assert_eq!(buffer.take::<u32>(), vec![1, 2]);
        assert_eq!(buffer.count::<u32>(), 0);
        assert_eq!(
            buffer.iter::<String>().cloned().collect::<Vec<_>>(),
            vec!["alpha".to_string(), "beta".to_string()]
        );
    }

    #[test]
    fn take_of_absent_type_is_empty() {
        let mut buffer = OutputBuffer::new();
        assert!(buffer.take::<i64>().is_empty());
    }

    #[test]
    fn debug_summarizes_contents() {
        let mut buffer = OutputBuffer::new();
        buffer.release(1u32);
        buffer.release(2u32);
        buffer.release("x".to_string());
        assert_eq!(
            format!("{buffer:?}"),
            "OutputBuffer { types: 2, items: 3 }"
        );
    }
}
