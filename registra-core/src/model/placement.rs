//! Placements on a board

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::geometry::Location;

/// Maximum placement id length
pub const MAX_ID_LEN: usize = 32;

/// Placement identifier (reference designator)
pub type PlacementId = String<MAX_ID_LEN>;

/// Board face presented to the tooling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    #[default]
    Top,
    /// Coordinates are mirrored in X
    Bottom,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
        }
    }
}

/// What a placement is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlacementType {
    /// Fiducial located automatically by vision
    Fiducial,
    /// Fiducial located by the operator jogging the camera
    FiducialManual,
    /// Ordinary component placement
    #[default]
    Standard,
}

impl PlacementType {
    pub fn is_fiducial(self) -> bool {
        matches!(self, PlacementType::Fiducial | PlacementType::FiducialManual)
    }
}

/// A placement on a board, in design-local coordinates
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    pub id: PlacementId,
    pub location: Location,
    pub kind: PlacementType,
    pub side: Side,
    pub enabled: bool,
}

impl Placement {
    /// Create an enabled placement
    pub fn new(
        id: &str,
        location: Location,
        kind: PlacementType,
        side: Side,
    ) -> Result<Self, ModelError> {
        let id = PlacementId::try_from(id).map_err(|_| ModelError::IdTooLong)?;
        Ok(Self {
            id,
            location,
            kind,
            side,
            enabled: true,
        })
    }

    /// Builder-style enable/disable
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Enabled fiducial on the given side
    pub fn is_alignment_candidate(&self, side: Side) -> bool {
        self.enabled && self.side == side && self.kind.is_fiducial()
    }
}
