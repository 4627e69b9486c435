//! Machine-agnostic core logic for board alignment
//!
//! This crate contains all alignment logic that does not depend on a
//! specific machine, camera, or executor:
//!
//! - Geometry value types (locations, lengths, affine transforms)
//! - Board, placement, and board location model
//! - Affine transform solver for fiducial correspondences
//! - Travel order optimizer for visiting fiducials
//! - Tolerance validation of fitted transforms
//! - Alignment state machine and per-board session bookkeeping
//! - Capability traits for the locator, motion, user gate, and observer

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod geometry;
pub mod model;
pub mod session;
pub mod solver;
pub mod state;
pub mod tolerance;
pub mod traits;
pub mod travel;
