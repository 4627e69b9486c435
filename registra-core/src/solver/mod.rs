//! Transform fitting from fiducial correspondences
//!
//! Two correspondences give an exact similarity (scale, rotation,
//! translation). Three or more give a least-squares affine fit.

pub mod affine;

pub use affine::{rms_residual, solve, SolveError, COINCIDENT_MM};
