//! Shared value types and error definitions used across all commbot crates.

pub mod error;
pub mod types;

pub use error::{Error, Result};
