//! Alignment state machine
//!
//! The phase of an alignment run is explicit, finite, and deterministic.
//! The async process in the engine crate feeds it events; nothing here
//! performs I/O.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::{MeasurementWait, Phase};
