//! Dimensions

use crate::types::{Filter, Key};

/// Identifies a dimension within its [Crossfilter](crate::crossfilter::Crossfilter).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DimensionId(pub(crate) usize);

impl DimensionId {
    /// Bit of this dimension in a record's filter mask.
    pub(crate) fn bit(self) -> u64 {
        1 << self.0
    }
}

/// A filterable view over the record store, keyed by a projection of each record.
///
/// Since the store is immutable, every record's key is computed once, together with an index
/// ordering the records by key.
pub(crate) struct Dimension {
    /// Unique name
    pub(crate) name: String,
    /// Key of each record, by record index
    pub(crate) keys: Vec<Key>,
    /// Record indices in ascending key order
    pub(crate) order: Vec<usize>,
    /// Active filter
    pub(crate) filter: Filter,
}

impl Dimension {
    /// Returns a new Dimension over `records` with no filter.
    pub(crate) fn new<T, F>(name: &str, records: &[T], key_of: F) -> Self
    where
        F: Fn(&T) -> Key,
    {
        let keys: Vec<Key> = records.iter().map(key_of).collect();
        let mut order: Vec<usize> = (0..keys.len()).collect();
        // Stable, so records with equal keys stay in load order.
        order.sort_by(|a, b| keys[*a].cmp(&keys[*b]));
        Self {
            name: name.to_string(),
            keys,
            order,
            filter: Filter::All,
        }
    }

    /// Whether the active filter accepts the record at `index`.
    pub(crate) fn accepts(&self, index: usize) -> bool {
        self.filter.accepts(&self.keys[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_keys_and_order() {
        let records = [30, 10, 20, 10];
        let dimension = Dimension::new("value", &records, |value: &i64| Key::Int(*value));
        assert_eq!(
            vec![Key::Int(30), Key::Int(10), Key::Int(20), Key::Int(10)],
            dimension.keys
        );
        assert_eq!(vec![1, 3, 2, 0], dimension.order);
        assert!(dimension.filter.is_all());
    }

    #[test]
    fn test_dimension_accepts() {
        let records = [1, 2, 3];
        let mut dimension = Dimension::new("value", &records, |value: &i64| Key::Int(*value));
        assert!(dimension.accepts(0));
        dimension.filter = Filter::Exact(Key::Int(2));
        assert!(!dimension.accepts(0));
        assert!(dimension.accepts(1));
    }

    #[test]
    fn test_dimension_bit() {
        assert_eq!(1, DimensionId(0).bit());
        assert_eq!(1 << 63, DimensionId(63).bit());
    }
}
