//! Types shared by every part of the crate.
pub mod error;

pub use error::{Error, Result};
