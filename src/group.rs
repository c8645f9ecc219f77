//! Groups: incrementally maintained key to accumulator mappings.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use hashbrown::HashMap;
use serde::Serialize;

use crate::dimension::DimensionId;
use crate::error::DashboardError;
use crate::reducer::{Reducer, ReducerError};
use crate::types::Key;

/// A key and its aggregate, as returned by [Crossfilter::all](crate::crossfilter::Crossfilter::all).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KeyValue<A> {
    pub key: Key,
    pub value: A,
}

/// Typed handle to a group registered with a [Crossfilter](crate::crossfilter::Crossfilter).
pub struct GroupHandle<R> {
    pub(crate) index: usize,
    _reducer: PhantomData<fn() -> R>,
}

impl<R> GroupHandle<R> {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            _reducer: PhantomData,
        }
    }
}

impl<R> Clone for GroupHandle<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for GroupHandle<R> {}

impl<R> fmt::Debug for GroupHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupHandle({})", self.index)
    }
}

/// Type-erased view of a group, as held by the crossfilter.
pub(crate) trait GroupState<T> {
    /// Dimension the group is attached to, or `None` for a group over all dimensions.
    fn dimension(&self) -> Option<DimensionId>;

    /// Human readable description for logs and errors.
    fn describe(&self) -> String;

    /// Fold the record at `index` into its key's accumulator.
    fn add(&mut self, index: usize, record: &T) -> Result<(), DashboardError>;

    /// Retract the record at `index` from its key's accumulator.
    fn remove(&mut self, index: usize, record: &T) -> Result<(), DashboardError>;

    /// Reset every accumulator to its initial value.
    fn reset(&mut self);

    /// Recompute the group from scratch over the records for which `visible` holds, returning
    /// the first key whose fresh accumulator differs from the maintained one.
    fn divergence(
        &self,
        records: &[T],
        visible: &dyn Fn(usize) -> bool,
    ) -> Result<Option<Key>, DashboardError>;

    fn as_any(&self) -> &dyn Any;
}

/// A group of records partitioned by key, with one accumulator per key.
///
/// Every distinct key of the dataset has an entry, whether or not any of its records are
/// currently visible, so consumers see a stable set of keys across filter changes.
pub(crate) struct Group<T, R: Reducer<T>> {
    /// Position in the crossfilter's group list
    index: usize,
    dimension: Option<DimensionId>,
    reducer: R,
    /// Entries in ascending key order
    entries: Vec<KeyValue<R::Accumulator>>,
    /// Entry index of each record, by record index
    slots: Vec<usize>,
    _record: PhantomData<fn(&T)>,
}

impl<T, R: Reducer<T>> Group<T, R> {
    /// Returns a new Group with every accumulator at its initial value.
    ///
    /// # Arguments
    ///
    /// * `index`: Position in the crossfilter's group list
    /// * `dimension`: Dimension the group is attached to
    /// * `reducer`: Reduction maintaining the accumulators
    /// * `record_keys`: Group key of each record, by record index
    pub(crate) fn new(
        index: usize,
        dimension: Option<DimensionId>,
        reducer: R,
        record_keys: Vec<Key>,
    ) -> Self {
        let mut distinct = record_keys.clone();
        distinct.sort();
        distinct.dedup();
        let positions: HashMap<&Key, usize> = distinct
            .iter()
            .enumerate()
            .map(|(position, key)| (key, position))
            .collect();
        let slots = record_keys.iter().map(|key| positions[key]).collect();
        let entries = distinct
            .iter()
            .map(|key| KeyValue {
                key: key.clone(),
                value: reducer.initial(),
            })
            .collect();
        Self {
            index,
            dimension,
            reducer,
            entries,
            slots,
            _record: PhantomData,
        }
    }

    /// Returns a new Group aggregating every record under a single, empty composite key.
    ///
    /// The entry exists even when there are no records.
    pub(crate) fn single(index: usize, reducer: R, records: usize) -> Self {
        let entries = vec![KeyValue {
            key: Key::Tuple(Vec::new()),
            value: reducer.initial(),
        }];
        Self {
            index,
            dimension: None,
            reducer,
            entries,
            slots: vec![0; records],
            _record: PhantomData,
        }
    }

    /// Returns the entries in ascending key order.
    pub(crate) fn all(&self) -> &[KeyValue<R::Accumulator>] {
        &self.entries
    }

    /// Returns e.g. `group 3 (count)`.
    fn label(&self) -> String {
        format!("group {} ({})", self.index, self.reducer.name())
    }

    fn reducer_error(&self, slot: usize, source: ReducerError) -> DashboardError {
        DashboardError::Reducer {
            group: self.label(),
            key: self.entries[slot].key.clone(),
            source,
        }
    }
}

impl<T, R> GroupState<T> for Group<T, R>
where
    T: 'static,
    R: Reducer<T> + 'static,
{
    fn dimension(&self) -> Option<DimensionId> {
        self.dimension
    }

    fn describe(&self) -> String {
        self.label()
    }

    fn add(&mut self, index: usize, record: &T) -> Result<(), DashboardError> {
        let slot = self.slots[index];
        let result = self.reducer.add(&mut self.entries[slot].value, record);
        result.map_err(|source| self.reducer_error(slot, source))
    }

    fn remove(&mut self, index: usize, record: &T) -> Result<(), DashboardError> {
        let slot = self.slots[index];
        let result = self.reducer.remove(&mut self.entries[slot].value, record);
        result.map_err(|source| self.reducer_error(slot, source))
    }

    fn reset(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.value = self.reducer.initial();
        }
    }

    fn divergence(
        &self,
        records: &[T],
        visible: &dyn Fn(usize) -> bool,
    ) -> Result<Option<Key>, DashboardError> {
        let mut fresh: Vec<R::Accumulator> =
            self.entries.iter().map(|_| self.reducer.initial()).collect();
        for (index, record) in records.iter().enumerate() {
            if visible(index) {
                let slot = self.slots[index];
                self.reducer
                    .add(&mut fresh[slot], record)
                    .map_err(|source| self.reducer_error(slot, source))?;
            }
        }
        let diverging = self
            .entries
            .iter()
            .zip(fresh.iter())
            .find(|(entry, value)| entry.value != **value)
            .map(|(entry, _)| entry.key.clone());
        Ok(diverging)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
