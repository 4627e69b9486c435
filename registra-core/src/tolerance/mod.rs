//! Acceptance checks for fitted transforms

pub mod validator;

pub use validator::{Metric, Tolerances, ValidationReport, Violation, MAX_VIOLATIONS};
