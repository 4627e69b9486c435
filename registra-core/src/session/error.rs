//! Alignment errors

use crate::model::PlacementId;
use crate::solver::SolveError;
use crate::tolerance::ValidationReport;
use crate::traits::{LocateError, MotionError};

use super::alignment::MAX_FIDUCIALS;

/// Why a board could not be aligned
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlignmentError {
    /// Fewer than two enabled fiducials on the board's side
    InsufficientFiducials { found: usize },
    /// The fiducials do not determine a unique transform
    DegenerateGeometry(SolveError),
    /// Vision could not locate a fiducial
    Locate {
        placement: PlacementId,
        error: LocateError,
    },
    /// The camera could not be moved or read back
    Motion(MotionError),
    /// The fitted transform is outside tolerance
    ToleranceViolation(ValidationReport),
    /// Cancelled by the operator or host
    UserCancelled,
    /// More fiducials than a session can hold
    Capacity,
}

impl AlignmentError {
    /// True for everything except a cancellation
    pub fn is_failure(&self) -> bool {
        !matches!(self, AlignmentError::UserCancelled)
    }
}

impl From<SolveError> for AlignmentError {
    fn from(e: SolveError) -> Self {
        AlignmentError::DegenerateGeometry(e)
    }
}

impl From<MotionError> for AlignmentError {
    fn from(e: MotionError) -> Self {
        AlignmentError::Motion(e)
    }
}

impl core::fmt::Display for AlignmentError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AlignmentError::InsufficientFiducials { found } => write!(
                f,
                "board must have at least two enabled fiducials on this side, found {}",
                found
            ),
            AlignmentError::DegenerateGeometry(e) => {
                write!(f, "cannot compute board transform: {}", e)
            }
            AlignmentError::Locate { placement, error } => {
                write!(f, "could not locate fiducial '{}': {}", placement, error)
            }
            AlignmentError::Motion(e) => write!(f, "camera move failed: {}", e),
            AlignmentError::ToleranceViolation(report) => write!(
                f,
                "{}; check that the correct fiducials were measured and the nominal board origin is close",
                report
            ),
            AlignmentError::UserCancelled => write!(f, "alignment cancelled"),
            AlignmentError::Capacity => {
                write!(f, "more than {} fiducials on one board", MAX_FIDUCIALS)
            }
        }
    }
}
