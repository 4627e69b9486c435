//! Length units and unit-tagged lengths

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Length unit for locations and tolerances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LengthUnit {
    #[default]
    Millimeters,
    Centimeters,
    Meters,
    Inches,
    /// Thousandths of an inch
    Mils,
    Microns,
}

impl LengthUnit {
    /// Millimetres per one of this unit
    pub const fn millimeters_per_unit(self) -> f64 {
        match self {
            LengthUnit::Millimeters => 1.0,
            LengthUnit::Centimeters => 10.0,
            LengthUnit::Meters => 1000.0,
            LengthUnit::Inches => 25.4,
            LengthUnit::Mils => 0.0254,
            LengthUnit::Microns => 0.001,
        }
    }

    /// Convert a scalar from this unit to `target`
    pub fn convert(self, value: f64, target: LengthUnit) -> f64 {
        if self == target {
            return value;
        }
        value * self.millimeters_per_unit() / target.millimeters_per_unit()
    }

    /// Short suffix used in diagnostics
    pub const fn suffix(self) -> &'static str {
        match self {
            LengthUnit::Millimeters => "mm",
            LengthUnit::Centimeters => "cm",
            LengthUnit::Meters => "m",
            LengthUnit::Inches => "in",
            LengthUnit::Mils => "mil",
            LengthUnit::Microns => "um",
        }
    }
}

/// A scalar length tagged with its unit
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Length {
    pub value: f64,
    pub units: LengthUnit,
}

impl Length {
    pub const fn new(value: f64, units: LengthUnit) -> Self {
        Self { value, units }
    }

    /// Create a length in millimetres
    pub const fn mm(value: f64) -> Self {
        Self::new(value, LengthUnit::Millimeters)
    }

    pub fn convert_to_units(self, units: LengthUnit) -> Self {
        Self {
            value: self.units.convert(self.value, units),
            units,
        }
    }

    pub fn to_millimeters(self) -> f64 {
        self.units.convert(self.value, LengthUnit::Millimeters)
    }
}

impl core::fmt::Display for Length {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.4}{}", self.value, self.units.suffix())
    }
}
