//! Group reductions.
//!
//! Each reduction is implemented as a struct that implements the
//! [Reducer](crate::reducer::Reducer) trait.

use serde::Serialize;

use crate::reducer::{Reducer, ReducerError};

/// Boxed record predicate.
pub type RecordPredicate<T> = Box<dyn Fn(&T) -> bool>;

/// Boxed numeric projection of a record.
pub type RecordValue<T, V> = Box<dyn Fn(&T) -> V>;

/// Count the records of each key.
///
/// This is the default reduction of a group.
pub struct Count {}

impl<T> Reducer<T> for Count {
    type Accumulator = u64;

    fn name(&self) -> &'static str {
        "count"
    }

    fn initial(&self) -> u64 {
        0
    }

    fn add(&self, acc: &mut u64, _record: &T) -> Result<(), ReducerError> {
        *acc += 1;
        Ok(())
    }

    fn remove(&self, acc: &mut u64, _record: &T) -> Result<(), ReducerError> {
        *acc = acc.checked_sub(1).ok_or(ReducerError::Underflow {
            reducer: "count",
        })?;
        Ok(())
    }
}

/// Sum an integer projection of the records of each key.
pub struct Sum<T> {
    value: RecordValue<T, i64>,
}

impl<T> Sum<T> {
    /// Returns a Sum over `value`.
    pub fn new<F>(value: F) -> Self
    where
        F: Fn(&T) -> i64 + 'static,
    {
        Self {
            value: Box::new(value),
        }
    }
}

impl<T> Reducer<T> for Sum<T> {
    type Accumulator = i64;

    fn name(&self) -> &'static str {
        "sum"
    }

    fn initial(&self) -> i64 {
        0
    }

    fn add(&self, acc: &mut i64, record: &T) -> Result<(), ReducerError> {
        *acc += (self.value)(record);
        Ok(())
    }

    fn remove(&self, acc: &mut i64, record: &T) -> Result<(), ReducerError> {
        *acc -= (self.value)(record);
        Ok(())
    }
}

/// Accumulator of [CountWhere]: records in scope and how many of them match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Proportion {
    /// Number of records in scope
    pub count: u64,
    /// Number of records in scope matching the predicate
    pub matched: u64,
}

impl Proportion {
    /// Fraction of records in scope that match, or 0 with nothing in scope.
    pub fn ratio(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.matched as f64 / self.count as f64
        }
    }

    /// Percentage of records in scope that match, or 0 with nothing in scope.
    pub fn percentage(&self) -> f64 {
        self.ratio() * 100.0
    }
}

/// Count records in scope, and the subset of them matching a predicate.
///
/// With a scope of `sex == "Female"` and a predicate of `rank == "Prof"` this yields the
/// proportion of women who are professors. With an unrestricted scope it is one bucket of a
/// multi-bucket counter: one `CountWhere` per bucket label over the same dimension.
pub struct CountWhere<T> {
    scope: RecordPredicate<T>,
    predicate: RecordPredicate<T>,
}

impl<T> CountWhere<T> {
    /// Returns a CountWhere counting records satisfying `scope`, and those of them satisfying
    /// `predicate`.
    pub fn new<S, P>(scope: S, predicate: P) -> Self
    where
        S: Fn(&T) -> bool + 'static,
        P: Fn(&T) -> bool + 'static,
    {
        Self {
            scope: Box::new(scope),
            predicate: Box::new(predicate),
        }
    }

    /// Returns a CountWhere counting every record, and those satisfying `predicate`.
    pub fn matching<P>(predicate: P) -> Self
    where
        P: Fn(&T) -> bool + 'static,
    {
        Self::new(|_| true, predicate)
    }
}

impl<T> Reducer<T> for CountWhere<T> {
    type Accumulator = Proportion;

    fn name(&self) -> &'static str {
        "count_where"
    }

    fn initial(&self) -> Proportion {
        Proportion::default()
    }

    fn add(&self, acc: &mut Proportion, record: &T) -> Result<(), ReducerError> {
        if (self.scope)(record) {
            acc.count += 1;
            if (self.predicate)(record) {
                acc.matched += 1;
            }
        }
        Ok(())
    }

    fn remove(&self, acc: &mut Proportion, record: &T) -> Result<(), ReducerError> {
        if (self.scope)(record) {
            let underflow = ReducerError::Underflow {
                reducer: "count_where",
            };
            acc.count = acc.count.checked_sub(1).ok_or(underflow.clone())?;
            if (self.predicate)(record) {
                acc.matched = acc.matched.checked_sub(1).ok_or(underflow)?;
            }
        }
        Ok(())
    }
}

/// Accumulator of [RunningAverage].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Average {
    /// Number of records
    pub count: u64,
    /// Sum of the record values
    pub total: f64,
    /// `total / count`, or 0 with no records
    pub average: f64,
}

/// Maintain the running average of a numeric projection of the records of each key.
///
/// When the last record of a key is retracted the total and average are reset to exactly zero,
/// so no rounding residue survives repeated add/remove cycles.
pub struct RunningAverage<T> {
    value: RecordValue<T, f64>,
}

impl<T> RunningAverage<T> {
    /// Returns a RunningAverage over `value`.
    pub fn new<F>(value: F) -> Self
    where
        F: Fn(&T) -> f64 + 'static,
    {
        Self {
            value: Box::new(value),
        }
    }
}

impl<T> Reducer<T> for RunningAverage<T> {
    type Accumulator = Average;

    fn name(&self) -> &'static str {
        "running_average"
    }

    fn initial(&self) -> Average {
        Average::default()
    }

    fn add(&self, acc: &mut Average, record: &T) -> Result<(), ReducerError> {
        acc.count += 1;
        acc.total += (self.value)(record);
        acc.average = acc.total / acc.count as f64;
        Ok(())
    }

    fn remove(&self, acc: &mut Average, record: &T) -> Result<(), ReducerError> {
        acc.count = acc.count.checked_sub(1).ok_or(ReducerError::Underflow {
            reducer: "running_average",
        })?;
        if acc.count == 0 {
            acc.total = 0.0;
            acc.average = 0.0;
        } else {
            acc.total -= (self.value)(record);
            acc.average = acc.total / acc.count as f64;
        }
        Ok(())
    }
}

/// A reduction assembled from caller-supplied closures.
pub struct Custom<T, A> {
    initial: Box<dyn Fn() -> A>,
    add: Box<dyn Fn(&mut A, &T)>,
    remove: Box<dyn Fn(&mut A, &T)>,
}

impl<T, A> Custom<T, A> {
    /// Returns a Custom reduction.
    ///
    /// # Arguments
    ///
    /// * `initial`: Returns the accumulator of a key with no records
    /// * `add`: Folds a record into an accumulator
    /// * `remove`: Retracts a record from an accumulator; must undo `add`
    pub fn new<I, AF, RF>(initial: I, add: AF, remove: RF) -> Self
    where
        I: Fn() -> A + 'static,
        AF: Fn(&mut A, &T) + 'static,
        RF: Fn(&mut A, &T) + 'static,
    {
        Self {
            initial: Box::new(initial),
            add: Box::new(add),
            remove: Box::new(remove),
        }
    }
}

impl<T, A> Reducer<T> for Custom<T, A>
where
    A: Clone + std::fmt::Debug + PartialEq,
{
    type Accumulator = A;

    fn name(&self) -> &'static str {
        "custom"
    }

    fn initial(&self) -> A {
        (self.initial)()
    }

    fn add(&self, acc: &mut A, record: &T) -> Result<(), ReducerError> {
        (self.add)(acc, record);
        Ok(())
    }

    fn remove(&self, acc: &mut A, record: &T) -> Result<(), ReducerError> {
        (self.remove)(acc, record);
        Ok(())
    }
}
