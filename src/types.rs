pub mod filter;
pub mod key;

// Re-export types for convenience.
pub use crate::types::filter::Filter;
pub use crate::types::key::Key;
