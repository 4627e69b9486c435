//! Board model
//!
//! Boards, their placements, and where each board sits on the machine.

pub mod board;
pub mod board_location;
pub mod placement;

pub use board::{Board, MAX_PLACEMENTS};
pub use board_location::{BoardLocation, BoardSnapshot};
pub use placement::{Placement, PlacementId, PlacementType, Side, MAX_ID_LEN};

/// Errors raised while building the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModelError {
    /// Identifier longer than `MAX_ID_LEN`
    IdTooLong,
    /// Board already holds `MAX_PLACEMENTS` placements
    TooManyPlacements,
    /// A placement with the same id already exists
    DuplicateId,
}

impl core::fmt::Display for ModelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ModelError::IdTooLong => write!(f, "identifier longer than {} bytes", MAX_ID_LEN),
            ModelError::TooManyPlacements => {
                write!(f, "board holds more than {} placements", MAX_PLACEMENTS)
            }
            ModelError::DuplicateId => write!(f, "duplicate placement id"),
        }
    }
}
