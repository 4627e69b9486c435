//! Per-board alignment session
//!
//! Holds the transient measurement state for one board: the fiducials in
//! visit order, the correspondences collected so far, and the snapshot to
//! restore if the board cannot be aligned.

pub mod alignment;
pub mod error;

pub use alignment::{AlignmentSession, SessionStatus, MAX_FIDUCIALS};
pub use error::AlignmentError;
