//! Reducer trait for incrementally maintained group aggregates.

use std::fmt::Debug;

use thiserror::Error;

/// Error folding a record into, or retracting a record from, an accumulator.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ReducerError {
    /// A record was retracted from an accumulator that holds no records
    #[error("{reducer} retracted a record from an empty accumulator")]
    Underflow { reducer: &'static str },
}

/// Trait for group reductions.
///
/// This forms the contract between groups and the aggregates they maintain. A group keeps one
/// accumulator per key; records entering a group's visible set are folded in with `add`,
/// records leaving it are retracted with `remove`.
///
/// Implementations must make `add` and `remove` inverse to each other and insensitive to the
/// order in which records arrive, so that the incrementally maintained accumulator always
/// equals one computed from scratch over the visible records.
pub trait Reducer<T> {
    /// Accumulator type
    type Accumulator: Clone + Debug + PartialEq;

    /// Name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Returns the accumulator of a key with no visible records.
    fn initial(&self) -> Self::Accumulator;

    /// Fold a record into an accumulator.
    ///
    /// # Arguments
    ///
    /// * `acc`: Accumulator of the record's key
    /// * `record`: Record entering the visible set
    fn add(&self, acc: &mut Self::Accumulator, record: &T) -> Result<(), ReducerError>;

    /// Retract a record from an accumulator.
    ///
    /// # Arguments
    ///
    /// * `acc`: Accumulator of the record's key
    /// * `record`: Record leaving the visible set
    fn remove(&self, acc: &mut Self::Accumulator, record: &T) -> Result<(), ReducerError>;
}
