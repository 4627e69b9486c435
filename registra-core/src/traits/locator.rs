//! Fiducial locator trait
//!
//! Abstracts over the vision pipeline that finds a fiducial mark near its
//! nominal position and reports where it actually is.

use crate::geometry::Location;
use crate::model::{Placement, Side};

/// Errors reported by a fiducial locator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LocateError {
    /// No fiducial found near the nominal location
    NotFound,
    /// More than one candidate matched
    MultipleMatches,
    /// Camera or pipeline failure
    VisionFault,
    /// The machine worker stopped responding
    WorkerFault,
}

impl core::fmt::Display for LocateError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LocateError::NotFound => write!(f, "fiducial not found"),
            LocateError::MultipleMatches => write!(f, "more than one fiducial matched"),
            LocateError::VisionFault => write!(f, "vision fault"),
            LocateError::WorkerFault => write!(f, "machine worker fault"),
        }
    }
}

/// What to locate
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LocateRequest {
    pub board_index: usize,
    pub placement: Placement,
    pub side: Side,
    /// Board origin the nominal location was derived from
    pub board_origin: Location,
    /// Where the fiducial should be, in machine coordinates
    pub nominal: Location,
}

/// Trait for fiducial locators
#[allow(async_fn_in_trait)]
pub trait FiducialLocator {
    /// Find the fiducial described by `request`
    ///
    /// Returns its measured machine location. Only X and Y are used.
    async fn locate(&mut self, request: &LocateRequest) -> Result<Location, LocateError>;
}

impl<T: FiducialLocator> FiducialLocator for &mut T {
    async fn locate(&mut self, request: &LocateRequest) -> Result<Location, LocateError> {
        (**self).locate(request).await
    }
}
