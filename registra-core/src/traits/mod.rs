//! Capability traits
//!
//! These traits define the interface between the alignment engine and the
//! machine, vision, and operator-facing parts of the host application.

pub mod gate;
pub mod locator;
pub mod motion;
pub mod observer;

pub use gate::{GatePrompt, GateResponse, UserGate};
pub use locator::{FiducialLocator, LocateError, LocateRequest};
pub use motion::{MotionController, MotionError};
pub use observer::{RunOutcome, SessionObserver};
