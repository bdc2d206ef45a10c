//! Utility functions and helpers.
//!
//! Common functionality used across multiple Qryti crates.

pub mod path;

// Re-export commonly used utilities
pub use path::{build_url, collection_of, has_scheme, strip_query};
