//! Geometry value types
//!
//! Immutable locations, lengths, and 2D affine transforms shared by every
//! other module.

pub mod location;
pub mod transform;
pub mod units;

pub use location::{Location, Point2};
pub use transform::{AffineInfo, AffineTransform};
pub use units::{Length, LengthUnit};

/// Degrees to radians
pub(crate) fn to_radians(degrees: f64) -> f64 {
    degrees * (core::f64::consts::PI / 180.0)
}

/// Radians to degrees
pub(crate) fn to_degrees(radians: f64) -> f64 {
    radians * (180.0 / core::f64::consts::PI)
}
