//! Motion controller trait

use crate::geometry::Location;

/// Errors reported by a motion controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// Target outside the machine's travel
    OutOfBounds,
    /// Axes not homed
    NotHomed,
    /// Move did not complete in time
    Timeout,
    /// Driver or controller fault
    Fault,
    /// The machine worker stopped responding
    WorkerFault,
}

impl core::fmt::Display for MotionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MotionError::OutOfBounds => write!(f, "target out of bounds"),
            MotionError::NotHomed => write!(f, "machine not homed"),
            MotionError::Timeout => write!(f, "motion timed out"),
            MotionError::Fault => write!(f, "motion fault"),
            MotionError::WorkerFault => write!(f, "machine worker fault"),
        }
    }
}

/// Trait for the camera/head motion
///
/// Implementations move at a safe Z and report the camera's location.
#[allow(async_fn_in_trait)]
pub trait MotionController {
    /// Move the camera over `target` and wait for the move to finish
    async fn move_near(&mut self, target: &Location) -> Result<(), MotionError>;

    /// Current camera location
    async fn tool_location(&mut self) -> Result<Location, MotionError>;
}

impl<T: MotionController> MotionController for &mut T {
    async fn move_near(&mut self, target: &Location) -> Result<(), MotionError> {
        (**self).move_near(target).await
    }

    async fn tool_location(&mut self) -> Result<Location, MotionError> {
        (**self).tool_location().await
    }
}
