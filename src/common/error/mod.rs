//! Unified error types for tablemend.
//!
//! Heuristic ambiguity is never reported through this type. Only structural
//! faults in the input tree, codec failures and bad configuration end up here.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
