//! Dimension and group keys

use std::fmt;

use serde::{Deserialize, Serialize};

/// A key extracted from a record by a dimension or group.
///
/// Keys may be scalar (an integer or a string) or composite (a tuple of keys, as used by the
/// scatter plots which key on `[years, salary, rank, sex]`).
///
/// Keys are totally ordered. Within a variant the natural order applies (tuples compare
/// element-wise); across variants integers sort before strings, which sort before tuples.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(untagged)]
pub enum Key {
    /// Integer key
    Int(i64),
    /// String key
    Str(String),
    /// Composite key
    Tuple(Vec<Key>),
}

impl Key {
    /// Parse a key from user input.
    ///
    /// Integers become [Key::Int], `[a,b,...]` becomes a [Key::Tuple] of recursively parsed
    /// elements (which may themselves be tuples), and anything else is a [Key::Str]. Surrounding whitespace is ignored.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Ok(value) = text.parse::<i64>() {
            return Key::Int(value);
        }
        if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            if inner.trim().is_empty() {
                return Key::Tuple(Vec::new());
            }
            return Key::Tuple(split_elements(inner).into_iter().map(Key::parse).collect());
        }
        Key::Str(text.to_string())
    }

    /// Returns the integer value of an integer key.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Key::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the string value of a string key.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the element at `position` of a composite key.
    pub fn element(&self, position: usize) -> Option<&Key> {
        match self {
            Key::Tuple(elements) => elements.get(position),
            _ => None,
        }
    }
}

/// Split the inside of a tuple on the commas that are not nested in brackets.
fn split_elements(inner: &str) -> Vec<&str> {
    let mut elements = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;
    for (n, c) in inner.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                elements.push(&inner[start..n]);
                start = n + 1;
            }
            _ => (),
        }
    }
    elements.push(&inner[start..]);
    elements
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(value) => write!(f, "{}", value),
            Key::Str(value) => write!(f, "{}", value),
            Key::Tuple(elements) => {
                write!(f, "[")?;
                for (n, element) in elements.iter().enumerate() {
                    if n > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Key::Int(value.into())
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<Vec<Key>> for Key {
    fn from(elements: Vec<Key>) -> Self {
        Key::Tuple(elements)
    }
}
