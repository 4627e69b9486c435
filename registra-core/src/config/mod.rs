//! Alignment configuration
//!
//! Settings are plain data with serde derives; the engine crate loads them
//! from TOML.

pub mod types;

pub use types::{AlignmentSettings, FailurePolicy};
