//! Unit-tagged locations
//!
//! A `Location` is a point in X/Y/Z plus a rotation (degrees), tagged with
//! the length unit its coordinates are expressed in. All operations return
//! new values; nothing mutates in place.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::units::{Length, LengthUnit};
use super::{to_degrees, to_radians};

/// Plain 2D point in millimetres
///
/// Used by the solver and the travel optimizer where units have already
/// been normalised.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2) -> f64 {
        libm::hypot(other.x - self.x, other.y - self.y)
    }
}

/// Point with rotation, tagged with a length unit
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location {
    pub units: LengthUnit,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Rotation in degrees, counter-clockwise positive
    pub rotation: f64,
}

impl Location {
    pub const fn new(units: LengthUnit, x: f64, y: f64, z: f64, rotation: f64) -> Self {
        Self {
            units,
            x,
            y,
            z,
            rotation,
        }
    }

    /// Create a location in millimetres
    pub const fn mm(x: f64, y: f64, z: f64, rotation: f64) -> Self {
        Self::new(LengthUnit::Millimeters, x, y, z, rotation)
    }

    /// The origin in the given units
    pub const fn origin(units: LengthUnit) -> Self {
        Self::new(units, 0.0, 0.0, 0.0, 0.0)
    }

    /// Express this location in another unit (rotation is unaffected)
    pub fn convert_to_units(&self, units: LengthUnit) -> Self {
        if units == self.units {
            return *self;
        }
        Self {
            units,
            x: self.units.convert(self.x, units),
            y: self.units.convert(self.y, units),
            z: self.units.convert(self.z, units),
            rotation: self.rotation,
        }
    }

    /// XY projection in millimetres
    pub fn xy_mm(&self) -> Point2 {
        let mm = self.convert_to_units(LengthUnit::Millimeters);
        Point2::new(mm.x, mm.y)
    }

    /// Component-wise sum; `other` is converted to this location's units
    pub fn add(&self, other: &Location) -> Self {
        let other = other.convert_to_units(self.units);
        Self {
            units: self.units,
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
            rotation: self.rotation + other.rotation,
        }
    }

    /// Component-wise difference; `other` is converted to this location's units
    pub fn subtract(&self, other: &Location) -> Self {
        let other = other.convert_to_units(self.units);
        Self {
            units: self.units,
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
            rotation: self.rotation - other.rotation,
        }
    }

    /// Mirror selected components by negating them
    ///
    /// Bottom-side boards are mapped with `invert(true, false, false, false)`.
    pub fn invert(&self, x: bool, y: bool, z: bool, rotation: bool) -> Self {
        Self {
            units: self.units,
            x: if x { -self.x } else { self.x },
            y: if y { -self.y } else { self.y },
            z: if z { -self.z } else { self.z },
            rotation: if rotation { -self.rotation } else { self.rotation },
        }
    }

    /// Rotate the XY position about the origin by `degrees`
    ///
    /// The rotation component is left unchanged.
    pub fn rotate_xy(&self, degrees: f64) -> Self {
        if degrees == 0.0 {
            return *self;
        }
        let rad = to_radians(degrees);
        let (sin, cos) = (libm::sin(rad), libm::cos(rad));
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
            ..*self
        }
    }

    /// Rotate the XY position about `center` by `degrees`
    pub fn rotate_xy_about(&self, center: &Location, degrees: f64) -> Self {
        let center = center.convert_to_units(self.units);
        let shifted = Self {
            x: self.x - center.x,
            y: self.y - center.y,
            ..*self
        }
        .rotate_xy(degrees);
        Self {
            x: shifted.x + center.x,
            y: shifted.y + center.y,
            ..shifted
        }
    }

    /// Replace any of the components that are `Some`
    pub fn derive(
        &self,
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
        rotation: Option<f64>,
    ) -> Self {
        Self {
            units: self.units,
            x: x.unwrap_or(self.x),
            y: y.unwrap_or(self.y),
            z: z.unwrap_or(self.z),
            rotation: rotation.unwrap_or(self.rotation),
        }
    }

    /// XY Euclidean distance to `other`, in this location's units
    pub fn linear_distance_to(&self, other: &Location) -> f64 {
        let other = other.convert_to_units(self.units);
        libm::hypot(other.x - self.x, other.y - self.y)
    }

    /// XY Euclidean distance to `other` as a unit-tagged length
    pub fn linear_length_to(&self, other: &Location) -> Length {
        Length::new(self.linear_distance_to(other), self.units)
    }

    /// Angle of the XY vector from the origin, in degrees
    pub fn heading(&self) -> f64 {
        to_degrees(libm::atan2(self.y, self.x))
    }

    /// True when X, Y, and rotation match `other` exactly (units compared as-is)
    pub fn same_xy_rotation(&self, other: &Location) -> bool {
        self.units == other.units
            && self.x == other.x
            && self.y == other.y
            && self.rotation == other.rotation
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "({:.4}, {:.4}, {:.4}, {:.4}) {}",
            self.x,
            self.y,
            self.z,
            self.rotation,
            self.units.suffix()
        )
    }
}
