//! Dimension filters
//!
//! A dimension's filter restricts which records the dimension accepts. Currently we support:
//!
//! * Accepting everything (no filter)
//! * An exact key
//! * A half-open key range
//! * A set of keys
//! * An arbitrary predicate over keys

use std::fmt;
use std::sync::Arc;

use crate::error::DashboardError;
use crate::types::Key;

/// Predicate over dimension keys.
pub type KeyPredicate = Arc<dyn Fn(&Key) -> bool + Send + Sync>;

/// Filter
///
/// The active restriction on a dimension. Filters accept or reject records by their dimension
/// key only.
#[derive(Clone, Default)]
pub enum Filter {
    /// Accept all records
    #[default]
    All,
    /// Accept records whose key equals the value
    Exact(Key),
    /// Accept records whose key lies in `[lo, hi)`
    Range(Key, Key),
    /// Accept records whose key is any of the values
    Set(Vec<Key>),
    /// Accept records whose key satisfies the predicate
    Function(KeyPredicate),
}

impl Filter {
    /// Returns a range filter accepting keys in `[lo, hi)`.
    pub fn range(lo: Key, hi: Key) -> Result<Self, DashboardError> {
        if lo >= hi {
            return Err(DashboardError::InvalidRange { lo, hi });
        }
        Ok(Filter::Range(lo, hi))
    }

    /// Returns a filter accepting keys that satisfy `predicate`.
    pub fn function<F>(predicate: F) -> Self
    where
        F: Fn(&Key) -> bool + Send + Sync + 'static,
    {
        Filter::Function(Arc::new(predicate))
    }

    /// Check whether a key passes this filter
    pub fn accepts(&self, key: &Key) -> bool {
        match self {
            Filter::All => true,
            Filter::Exact(value) => key == value,
            Filter::Range(lo, hi) => key >= lo && key < hi,
            Filter::Set(values) => values.contains(key),
            Filter::Function(predicate) => predicate(key),
        }
    }

    /// Whether this filter accepts everything.
    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }

    /// Returns the filter resulting from a chart selection of `key`.
    ///
    /// Selecting an unselected key adds it to the selection, selecting a selected key removes
    /// it. Range and function filters are replaced by the selected key.
    pub fn toggled(&self, key: &Key) -> Filter {
        match self {
            Filter::All | Filter::Range(_, _) | Filter::Function(_) => Filter::Exact(key.clone()),
            Filter::Exact(value) if value == key => Filter::All,
            Filter::Exact(value) => Filter::Set(vec![value.clone(), key.clone()]),
            Filter::Set(values) => {
                let mut values = values.clone();
                if let Some(position) = values.iter().position(|value| value == key) {
                    values.remove(position);
                } else {
                    values.push(key.clone());
                }
                match values.len() {
                    0 => Filter::All,
                    1 => Filter::Exact(values.remove(0)),
                    _ => Filter::Set(values),
                }
            }
        }
    }
}

// A null value clears the filter.
impl From<Option<Key>> for Filter {
    fn from(value: Option<Key>) -> Self {
        match value {
            Some(key) => Filter::Exact(key),
            None => Filter::All,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::Exact(value) => write!(f, "{}", value),
            Filter::Range(lo, hi) => write!(f, "[{}, {})", lo, hi),
            Filter::Set(values) => {
                let values: Vec<String> = values.iter().map(|value| value.to_string()).collect();
                write!(f, "{{{}}}", values.join(", "))
            }
            Filter::Function(_) => write!(f, "<function>"),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_all() {
        let filter = Filter::All;
        assert!(filter.accepts(&Key::Int(0)));
        assert!(filter.accepts(&Key::from("anything")));
        assert!(filter.is_all());
    }

    #[test]
    fn test_accepts_exact() {
        let filter = Filter::Exact(Key::from("Female"));
        assert!(filter.accepts(&Key::from("Female")));
        assert!(!filter.accepts(&Key::from("Male")));
        assert!(!filter.is_all());
    }

    #[test]
    fn test_accepts_range_half_open() {
        let filter = Filter::range(Key::Int(1), Key::Int(3)).unwrap();
        assert!(!filter.accepts(&Key::Int(0)));
        assert!(filter.accepts(&Key::Int(1)));
        assert!(filter.accepts(&Key::Int(2)));
        assert!(!filter.accepts(&Key::Int(3)));
    }

    #[test]
    #[should_panic(expected = "InvalidRange")]
    fn test_range_lo_eq_hi() {
        Filter::range(Key::Int(3), Key::Int(3)).unwrap();
    }

    #[test]
    fn test_accepts_set() {
        let filter = Filter::Set(vec![Key::from("A"), Key::from("B")]);
        assert!(filter.accepts(&Key::from("A")));
        assert!(filter.accepts(&Key::from("B")));
        assert!(!filter.accepts(&Key::from("C")));
    }

    #[test]
    fn test_accepts_function() {
        let filter = Filter::function(|key| key.as_i64().map_or(false, |v| v % 2 == 0));
        assert!(filter.accepts(&Key::Int(4)));
        assert!(!filter.accepts(&Key::Int(5)));
        assert!(!filter.accepts(&Key::from("4")));
    }

    #[test]
    fn test_from_option() {
        assert!(Filter::from(None).is_all());
        assert!(Filter::from(Some(Key::Int(1))).accepts(&Key::Int(1)));
    }

    #[test]
    fn test_toggled() {
        let female = Key::from("Female");
        let male = Key::from("Male");
        let filter = Filter::All.toggled(&female);
        assert_eq!("Female", filter.to_string());
        let filter = filter.toggled(&male);
        assert_eq!("{Female, Male}", filter.to_string());
        let filter = filter.toggled(&female);
        assert_eq!("Male", filter.to_string());
        let filter = filter.toggled(&male);
        assert!(filter.is_all());
    }

    #[test]
    fn test_toggled_replaces_range() {
        let filter = Filter::range(Key::Int(1), Key::Int(3)).unwrap();
        let filter = filter.toggled(&Key::Int(7));
        assert!(filter.accepts(&Key::Int(7)));
        assert!(!filter.accepts(&Key::Int(1)));
    }
}
