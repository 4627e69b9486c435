//! 2D affine transforms
//!
//! Maps design-local board coordinates (millimetres) to machine coordinates
//! (millimetres):
//!
//! ```text
//! x' = a * x + b * y + tx
//! y' = c * x + d * y + ty
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::location::Point2;
use super::{to_degrees, to_radians};

/// Determinant magnitude below which a transform is treated as singular
pub const SINGULAR_DETERMINANT: f64 = 1e-12;

/// Affine transform with a 2x2 linear part and a translation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AffineTransform {
    /// x contribution to x'
    pub a: f64,
    /// y contribution to x'
    pub b: f64,
    /// x contribution to y'
    pub c: f64,
    /// y contribution to y'
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    pub const fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Uniform scale, then rotation (degrees), then translation
    pub fn similarity(scale: f64, rotation_deg: f64, tx: f64, ty: f64) -> Self {
        let rad = to_radians(rotation_deg);
        let (sin, cos) = (libm::sin(rad), libm::cos(rad));
        Self::new(scale * cos, -scale * sin, scale * sin, scale * cos, tx, ty)
    }

    pub fn apply(&self, p: Point2) -> Point2 {
        Point2::new(
            self.a * p.x + self.b * p.y + self.tx,
            self.c * p.x + self.d * p.y + self.ty,
        )
    }

    /// Apply only the linear part (for direction vectors)
    pub fn apply_vector(&self, v: Point2) -> Point2 {
        Point2::new(self.a * v.x + self.b * v.y, self.c * v.x + self.d * v.y)
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite()
            && self.b.is_finite()
            && self.c.is_finite()
            && self.d.is_finite()
            && self.tx.is_finite()
            && self.ty.is_finite()
    }

    /// `self ∘ other`: apply `other` first, then `self`
    pub fn compose(&self, other: &AffineTransform) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            tx: self.a * other.tx + self.b * other.ty + self.tx,
            ty: self.c * other.tx + self.d * other.ty + self.ty,
        }
    }

    /// Inverse transform, or `None` when the linear part is singular
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if libm::fabs(det) < SINGULAR_DETERMINANT || !det.is_finite() {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Self {
            a,
            b,
            c,
            d,
            tx: -(a * self.tx + b * self.ty),
            ty: -(c * self.tx + d * self.ty),
        })
    }

    /// Rotation of the x basis vector, in radians
    pub fn rotation_rad(&self) -> f64 {
        libm::atan2(self.c, self.a)
    }

    /// Rotation of the x basis vector, in degrees
    pub fn rotation_deg(&self) -> f64 {
        to_degrees(self.rotation_rad())
    }

    /// Decompose as `T · R · S · H`
    ///
    /// `T` translation, `R` rotation, `S = diag(scale_x, scale_y)` and
    /// `H = [[1, shear_x], [0, 1]]`. A pure translation decomposes to unit
    /// scale, zero shear and zero rotation.
    pub fn decompose(&self) -> AffineInfo {
        let scale_x = libm::hypot(self.a, self.c);
        let (scale_y, shear_x) = if scale_x > 0.0 {
            let scale_y = self.determinant() / scale_x;
            let shear_x = (self.a * self.b + self.c * self.d) / (scale_x * scale_x);
            (scale_y, shear_x)
        } else {
            (libm::hypot(self.b, self.d), 0.0)
        };

        AffineInfo {
            scale_x,
            scale_y,
            shear_x,
            rotation_deg: self.rotation_deg(),
            translate_x: self.tx,
            translate_y: self.ty,
        }
    }
}

/// Diagnostic decomposition of an affine transform
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AffineInfo {
    pub scale_x: f64,
    pub scale_y: f64,
    pub shear_x: f64,
    pub rotation_deg: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl core::fmt::Display for AffineInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "scale=({:.5}, {:.5}) shear={:.5} rotation={:.4}deg translation=({:.4}, {:.4})",
            self.scale_x,
            self.scale_y,
            self.shear_x,
            self.rotation_deg,
            self.translate_x,
            self.translate_y
        )
    }
}
