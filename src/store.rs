//! Record store

use std::ops::Deref;
use std::sync::Arc;

/// The loaded dataset as an ordered, immutable sequence of records.
///
/// Cloning a store is cheap and shares the underlying records; dimensions index into the
/// shared sequence rather than owning a copy.
#[derive(Debug)]
pub struct RecordStore<T> {
    records: Arc<[T]>,
}

impl<T> RecordStore<T> {
    /// Returns a new RecordStore owning `records`.
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Returns the records in load order.
    pub fn records(&self) -> &[T] {
        &self.records
    }
}

impl<T> Clone for RecordStore<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<T> Deref for RecordStore<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.records
    }
}

impl<T> From<Vec<T>> for RecordStore<T> {
    fn from(records: Vec<T>) -> Self {
        Self::new(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_preserves_order() {
        let store = RecordStore::new(vec![3, 1, 2]);
        assert_eq!(&[3, 1, 2], store.records());
        assert_eq!(3, store.len());
        assert_eq!(Some(&1), store.get(1));
    }

    #[test]
    fn test_clone_shares_records() {
        let store = RecordStore::from(vec!["a", "b"]);
        let clone = store.clone();
        assert!(std::ptr::eq(store.records(), clone.records()));
    }

    #[test]
    fn test_empty_store() {
        let store: RecordStore<u32> = RecordStore::new(Vec::new());
        assert!(store.is_empty());
    }
}
