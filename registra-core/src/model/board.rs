//! Board definition

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::placement::{Placement, Side, MAX_ID_LEN};
use super::ModelError;
use crate::geometry::Location;

/// Maximum placements per board
pub const MAX_PLACEMENTS: usize = 128;

/// A board design: placements in design-local coordinates plus dimensions
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Board {
    pub name: String<MAX_ID_LEN>,
    /// Width in X, height in Y
    pub dimensions: Location,
    placements: Vec<Placement, MAX_PLACEMENTS>,
}

impl Board {
    pub fn new(name: &str, dimensions: Location) -> Result<Self, ModelError> {
        Ok(Self {
            name: String::try_from(name).map_err(|_| ModelError::IdTooLong)?,
            dimensions,
            placements: Vec::new(),
        })
    }

    /// Append a placement, preserving insertion order
    pub fn add_placement(&mut self, placement: Placement) -> Result<(), ModelError> {
        if self.placement(&placement.id).is_some() {
            return Err(ModelError::DuplicateId);
        }
        self.placements
            .push(placement)
            .map_err(|_| ModelError::TooManyPlacements)
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn placement(&self, id: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.id.as_str() == id)
    }

    pub fn placement_mut(&mut self, id: &str) -> Option<&mut Placement> {
        self.placements.iter_mut().find(|p| p.id.as_str() == id)
    }

    /// Enabled fiducials (automatic or manual) on `side`, in board order
    ///
    /// An alignment session measures at most
    /// [`MAX_FIDUCIALS`](crate::session::MAX_FIDUCIALS) of these.
    pub fn fiducials(&self, side: Side) -> impl Iterator<Item = &Placement> + '_ {
        self.placements
            .iter()
            .filter(move |p| p.is_alignment_candidate(side))
    }

    /// Board width along X, in the dimensions' units
    pub fn width(&self) -> f64 {
        self.dimensions.x
    }
}
