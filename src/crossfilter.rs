//! The crossfilter engine: dimensions, groups and incremental filter propagation.
//!
//! Each record carries a filter mask with one bit per dimension, set while that dimension's
//! filter rejects the record. A group attached to dimension `D` sees a record iff every bit
//! other than `D`'s is clear, so a chart keeps showing its own unfiltered context while its
//! selection filters every other chart. A group over all dimensions sees a record iff the mask
//! is zero.
//!
//! When a filter changes only the records whose bit flipped are visited, and each affected
//! group folds in or retracts exactly those records.

use hashbrown::HashMap;
use tracing::{event, Level};

use crate::dimension::{Dimension, DimensionId};
use crate::error::DashboardError;
use crate::group::{Group, GroupHandle, GroupState, KeyValue};
use crate::reducer::Reducer;
use crate::store::RecordStore;
use crate::types::{Filter, Key};

/// Maximum number of dimensions, one per bit of the filter mask.
pub const MAX_DIMENSIONS: usize = u64::BITS as usize;

/// Summary of a single filter change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterChange {
    /// Dimension whose filter changed
    pub dimension: DimensionId,
    /// Records newly accepted by the dimension
    pub accepted: usize,
    /// Records newly rejected by the dimension
    pub rejected: usize,
}

/// Whether a record with filter mask `mask` is visible to a group excluding the `exclude` bits.
fn is_visible(mask: u64, exclude: u64) -> bool {
    mask & !exclude == 0
}

/// Filter mask bits a group ignores.
fn exclusion(dimension: Option<DimensionId>) -> u64 {
    dimension.map_or(0, DimensionId::bit)
}

/// Crossfilter over a [RecordStore].
pub struct Crossfilter<T> {
    store: RecordStore<T>,
    dimensions: Vec<Dimension>,
    names: HashMap<String, DimensionId>,
    groups: Vec<Box<dyn GroupState<T>>>,
    /// Filter mask of each record, by record index
    masks: Vec<u64>,
}

impl<T: 'static> Crossfilter<T> {
    /// Returns a new Crossfilter over `store` with no dimensions.
    pub fn new(store: RecordStore<T>) -> Self {
        let masks = vec![0; store.len()];
        Self {
            store,
            dimensions: Vec::new(),
            names: HashMap::new(),
            groups: Vec::new(),
            masks,
        }
    }

    /// Returns the underlying record store.
    pub fn store(&self) -> &RecordStore<T> {
        &self.store
    }

    /// Create a dimension keyed by `key_of`.
    ///
    /// # Arguments
    ///
    /// * `name`: Unique name of the dimension
    /// * `key_of`: Projects a record to its dimension key
    pub fn dimension<F>(&mut self, name: &str, key_of: F) -> Result<DimensionId, DashboardError>
    where
        F: Fn(&T) -> Key,
    {
        if self.names.contains_key(name) {
            return Err(DashboardError::DuplicateDimension {
                name: name.to_string(),
            });
        }
        if self.dimensions.len() == MAX_DIMENSIONS {
            return Err(DashboardError::TooManyDimensions {
                limit: MAX_DIMENSIONS,
            });
        }
        let id = DimensionId(self.dimensions.len());
        self.dimensions
            .push(Dimension::new(name, self.store.records(), key_of));
        self.names.insert(name.to_string(), id);
        event!(Level::DEBUG, dimension = name, "created dimension");
        Ok(id)
    }

    /// Look up a dimension by name.
    pub fn dimension_id(&self, name: &str) -> Result<DimensionId, DashboardError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| DashboardError::UnknownDimension {
                name: name.to_string(),
            })
    }

    /// Returns the name of a dimension.
    pub fn dimension_name(&self, dimension: DimensionId) -> Result<&str, DashboardError> {
        Ok(&self.get_dimension(dimension)?.name)
    }

    /// Returns every dimension's id and name, in creation order.
    pub fn dimensions(&self) -> impl Iterator<Item = (DimensionId, &str)> {
        self.dimensions
            .iter()
            .enumerate()
            .map(|(n, dimension)| (DimensionId(n), dimension.name.as_str()))
    }

    fn get_dimension(&self, dimension: DimensionId) -> Result<&Dimension, DashboardError> {
        self.dimensions
            .get(dimension.0)
            .ok_or_else(|| DashboardError::UnknownDimension {
                name: format!("#{}", dimension.0),
            })
    }

    /// Create a group on `dimension`, keyed by the dimension key.
    pub fn group<R>(
        &mut self,
        dimension: DimensionId,
        reducer: R,
    ) -> Result<GroupHandle<R>, DashboardError>
    where
        R: Reducer<T> + 'static,
    {
        self.group_by(dimension, Key::clone, reducer)
    }

    /// Create a group on `dimension`, keyed by `key_of` applied to the dimension key.
    pub fn group_by<F, R>(
        &mut self,
        dimension: DimensionId,
        key_of: F,
        reducer: R,
    ) -> Result<GroupHandle<R>, DashboardError>
    where
        F: Fn(&Key) -> Key,
        R: Reducer<T> + 'static,
    {
        let keys = self.get_dimension(dimension)?.keys.iter().map(key_of).collect();
        let group = Group::new(self.groups.len(), Some(dimension), reducer, keys);
        self.register_group(group)
    }

    /// Create a group over all dimensions, aggregating the filtered dataset under one key.
    pub fn group_all<R>(&mut self, reducer: R) -> Result<GroupHandle<R>, DashboardError>
    where
        R: Reducer<T> + 'static,
    {
        let group = Group::single(self.groups.len(), reducer, self.store.len());
        self.register_group(group)
    }

    /// Populate a new group from the currently visible records and take ownership of it.
    fn register_group<R>(&mut self, mut group: Group<T, R>) -> Result<GroupHandle<R>, DashboardError>
    where
        R: Reducer<T> + 'static,
    {
        let index = self.groups.len();
        let exclude = exclusion(group.dimension());
        for (n, record) in self.store.iter().enumerate() {
            if is_visible(self.masks[n], exclude) {
                group.add(n, record)?;
            }
        }
        event!(Level::DEBUG, group = %group.describe(), "created group");
        self.groups.push(Box::new(group));
        Ok(GroupHandle::new(index))
    }

    /// Replace the filter of a dimension, updating every group that depends on it.
    ///
    /// Groups on `dimension` itself are unaffected. An error from a reducer leaves the groups
    /// partially updated and must be treated as fatal.
    pub fn filter(
        &mut self,
        dimension: DimensionId,
        filter: Filter,
    ) -> Result<FilterChange, DashboardError> {
        let (change, changed) = self.update_masks(dimension, filter)?;
        let records = self.store.records();
        for group in self.groups.iter_mut() {
            if group.dimension() == Some(dimension) {
                continue;
            }
            let exclude = exclusion(group.dimension());
            for &(n, old_mask, new_mask) in &changed {
                match (is_visible(old_mask, exclude), is_visible(new_mask, exclude)) {
                    (true, false) => group.remove(n, &records[n])?,
                    (false, true) => group.add(n, &records[n])?,
                    _ => (),
                }
            }
        }
        Ok(change)
    }

    /// Replace the filter of a dimension without touching any group.
    ///
    /// The groups are stale until the next [Crossfilter::recompute].
    pub fn filter_masks(
        &mut self,
        dimension: DimensionId,
        filter: Filter,
    ) -> Result<FilterChange, DashboardError> {
        let (change, _) = self.update_masks(dimension, filter)?;
        Ok(change)
    }

    /// Set the filter of a dimension and flip its bit in every record's mask.
    ///
    /// Returns the change and the (record index, old mask, new mask) of every record whose
    /// acceptance changed.
    fn update_masks(
        &mut self,
        dimension: DimensionId,
        filter: Filter,
    ) -> Result<(FilterChange, Vec<(usize, u64, u64)>), DashboardError> {
        let bit = dimension.bit();
        let target = self
            .dimensions
            .get_mut(dimension.0)
            .ok_or_else(|| DashboardError::UnknownDimension {
                name: format!("#{}", dimension.0),
            })?;
        target.filter = filter;

        let mut changed = Vec::new();
        for (n, mask) in self.masks.iter_mut().enumerate() {
            let new_mask = if target.accepts(n) {
                *mask & !bit
            } else {
                *mask | bit
            };
            if new_mask != *mask {
                changed.push((n, *mask, new_mask));
                *mask = new_mask;
            }
        }
        let rejected = changed
            .iter()
            .filter(|(_, _, new_mask)| new_mask & bit != 0)
            .count();
        let change = FilterChange {
            dimension,
            accepted: changed.len() - rejected,
            rejected,
        };
        event!(
            Level::DEBUG,
            dimension = target.name.as_str(),
            filter = %target.filter,
            accepted = change.accepted,
            rejected = change.rejected,
            "filter changed"
        );
        Ok((change, changed))
    }

    /// Clear the filter of every dimension, returning the dimensions that had one.
    pub fn filter_all(&mut self) -> Result<Vec<DimensionId>, DashboardError> {
        let filtered = self.filtered_dimensions();
        for dimension in &filtered {
            self.filter(*dimension, Filter::All)?;
        }
        Ok(filtered)
    }

    /// Clear the filter of every dimension without touching any group.
    ///
    /// The groups are stale until the next [Crossfilter::recompute].
    pub fn filter_all_masks(&mut self) -> Result<Vec<DimensionId>, DashboardError> {
        let filtered = self.filtered_dimensions();
        for dimension in &filtered {
            self.filter_masks(*dimension, Filter::All)?;
        }
        Ok(filtered)
    }

    fn filtered_dimensions(&self) -> Vec<DimensionId> {
        self.dimensions()
            .map(|(id, _)| id)
            .filter(|id| !self.dimensions[id.0].filter.is_all())
            .collect()
    }

    /// Returns the active filter of a dimension.
    pub fn filter_of(&self, dimension: DimensionId) -> Result<&Filter, DashboardError> {
        Ok(&self.get_dimension(dimension)?.filter)
    }

    /// Returns up to `n` records with the largest keys of `dimension`, in descending key order.
    ///
    /// Only records accepted by every active filter, including the dimension's own, are
    /// considered. Records with equal keys are returned in reverse load order.
    pub fn top(&self, dimension: DimensionId, n: usize) -> Result<Vec<&T>, DashboardError> {
        let order = &self.get_dimension(dimension)?.order;
        Ok(self.collect_visible(order.iter().rev(), n))
    }

    /// Returns up to `n` records with the smallest keys of `dimension`, in ascending key order.
    ///
    /// Only records accepted by every active filter, including the dimension's own, are
    /// considered.
    pub fn bottom(&self, dimension: DimensionId, n: usize) -> Result<Vec<&T>, DashboardError> {
        let order = &self.get_dimension(dimension)?.order;
        Ok(self.collect_visible(order.iter(), n))
    }

    fn collect_visible<'a>(&'a self, order: impl Iterator<Item = &'a usize>, n: usize) -> Vec<&'a T> {
        order
            .filter(|index| self.masks[**index] == 0)
            .take(n)
            .map(|index| &self.store[*index])
            .collect()
    }

    /// Number of records accepted by every active filter.
    pub fn visible_count(&self) -> usize {
        self.masks.iter().filter(|mask| **mask == 0).count()
    }

    fn get_group<R>(&self, handle: &GroupHandle<R>) -> Result<&Group<T, R>, DashboardError>
    where
        R: Reducer<T> + 'static,
    {
        self.groups
            .get(handle.index)
            .and_then(|group| group.as_any().downcast_ref::<Group<T, R>>())
            .ok_or(DashboardError::UnknownGroup {
                index: handle.index,
            })
    }

    /// Returns the entries of a group in ascending key order.
    ///
    /// Every key of the dataset is present; keys without visible records hold the reducer's
    /// initial accumulator.
    pub fn all<R>(
        &self,
        handle: &GroupHandle<R>,
    ) -> Result<&[KeyValue<R::Accumulator>], DashboardError>
    where
        R: Reducer<T> + 'static,
    {
        Ok(self.get_group(handle)?.all())
    }

    /// Returns the accumulator of a group created with [Crossfilter::group_all].
    pub fn value<R>(&self, handle: &GroupHandle<R>) -> Result<&R::Accumulator, DashboardError>
    where
        R: Reducer<T> + 'static,
    {
        self.get_group(handle)?
            .all()
            .first()
            .map(|entry| &entry.value)
            .ok_or(DashboardError::UnknownGroup {
                index: handle.index,
            })
    }

    /// Discard every group's state and recompute it from the current filters.
    pub fn recompute(&mut self) -> Result<(), DashboardError> {
        let records = self.store.records();
        for group in self.groups.iter_mut() {
            group.reset();
            let exclude = exclusion(group.dimension());
            for (n, record) in records.iter().enumerate() {
                if is_visible(self.masks[n], exclude) {
                    group.add(n, record)?;
                }
            }
        }
        Ok(())
    }

    /// Check every group's incrementally maintained state against a full recompute.
    pub fn verify(&self) -> Result<(), DashboardError> {
        let records = self.store.records();
        for group in &self.groups {
            let exclude = exclusion(group.dimension());
            let visible = |n: usize| is_visible(self.masks[n], exclude);
            if let Some(key) = group.divergence(records, &visible)? {
                return Err(DashboardError::GroupDivergence {
                    group: group.describe(),
                    key,
                });
            }
        }
        Ok(())
    }
}
