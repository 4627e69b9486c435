//! Events that advance an alignment run

use super::machine::MeasurementWait;

/// Events that can trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Run lifecycle
    /// Start processing the board at this index
    Begin { board: usize },
    /// Every board has been processed, or the run was aborted
    Finish,
    /// External cancellation
    Cancel,
    /// Return a finished run to idle
    Reset,

    // Session setup
    /// Fiducials collected and ordered
    OrderReady { total: usize },

    // Measurement
    /// The current measurement is waiting on this collaborator
    Waiting(MeasurementWait),
    /// The current fiducial was measured
    Measured,
    /// Locating or moving failed; the run suspends until cancelled
    MeasurementFailed,

    // Solve and validate
    /// A candidate transform was fitted and applied
    TransformSolved,
    /// The candidate passed tolerance checks
    ValidationPassed,
    /// The board could not be aligned and was rolled back
    BoardFailed,
}
