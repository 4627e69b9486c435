//! Tolerance validation
//!
//! A fitted transform is accepted when its scale stays near unity, its shear
//! stays near zero, and the board origin it implies has not wandered too far
//! from the nominal origin.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{AffineInfo, AffineTransform, Length};

/// One entry per checked metric
pub const MAX_VIOLATIONS: usize = 4;

/// Accuracy bounds for an accepted alignment
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tolerances {
    /// Allowed `|scale - 1|` on each axis (unitless)
    pub scaling_tolerance: f64,
    /// Allowed `|shear_x|` (unitless)
    pub shearing_tolerance: f64,
    /// Allowed origin movement
    pub board_location_tolerance: Length,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            scaling_tolerance: 0.05,
            shearing_tolerance: 0.05,
            board_location_tolerance: Length::mm(5.0),
        }
    }
}

/// Checked quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Metric {
    ScaleX,
    ScaleY,
    ShearX,
    OriginOffset,
}

/// A metric outside its allowed range
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Violation {
    pub metric: Metric,
    pub measured: f64,
    pub min: f64,
    pub max: f64,
}

impl core::fmt::Display for Violation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self.metric {
            Metric::ScaleX => "x scaling",
            Metric::ScaleY => "y scaling",
            Metric::ShearX => "x shearing",
            Metric::OriginOffset => {
                return write!(
                    f,
                    "the board origin moved {:.4}mm which is greater than the allowed amount of {:.4}mm",
                    self.measured, self.max
                );
            }
        };
        write!(
            f,
            "{} = {:.5} which is outside the expected range of [{:.5}, {:.5}]",
            name, self.measured, self.min, self.max
        )
    }
}

/// Outcome of validating one transform
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ValidationReport {
    pub info: AffineInfo,
    pub origin_offset_mm: f64,
    pub violations: Vec<Violation, MAX_VIOLATIONS>,
}

impl ValidationReport {
    pub fn is_pass(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violation(&self, metric: Metric) -> Option<&Violation> {
        self.violations.iter().find(|v| v.metric == metric)
    }
}

impl core::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_pass() {
            return write!(
                f,
                "results within tolerance (origin moved {:.4}mm)",
                self.origin_offset_mm
            );
        }
        write!(f, "results invalid because ")?;
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

impl Tolerances {
    /// Check `transform` and the origin movement it produced
    ///
    /// Every check runs; the report lists all violations in metric order.
    pub fn validate(&self, transform: &AffineTransform, origin_offset: Length) -> ValidationReport {
        let info = transform.decompose();
        let origin_offset_mm = origin_offset.to_millimeters();
        let s = self.scaling_tolerance;
        let h = self.shearing_tolerance;
        let max_offset = self.board_location_tolerance.to_millimeters();

        let checks = [
            (Metric::ScaleX, info.scale_x, libm::fabs(info.scale_x - 1.0) > s, 1.0 - s, 1.0 + s),
            (Metric::ScaleY, info.scale_y, libm::fabs(info.scale_y - 1.0) > s, 1.0 - s, 1.0 + s),
            (Metric::ShearX, info.shear_x, libm::fabs(info.shear_x) > h, -h, h),
            (
                Metric::OriginOffset,
                origin_offset_mm,
                origin_offset_mm > max_offset,
                0.0,
                max_offset,
            ),
        ];

        let mut violations = Vec::new();
        for (metric, measured, failed, min, max) in checks {
            // Non-finite values never pass
            if failed || !measured.is_finite() {
                // At most one entry per metric
                let _ = violations.push(Violation {
                    metric,
                    measured,
                    min,
                    max,
                });
            }
        }

        ValidationReport {
            info,
            origin_offset_mm,
            violations,
        }
    }
}
