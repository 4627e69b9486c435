//! Progress and outcome reporting

use crate::session::AlignmentError;
use crate::state::Phase;
use crate::tolerance::ValidationReport;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunOutcome {
    /// Every enabled board was processed
    Completed { boards_aligned: usize },
    /// The run was cancelled; the current board was rolled back
    Cancelled { boards_aligned: usize },
    /// A board failed and the run stopped there
    Aborted {
        boards_aligned: usize,
        board_index: usize,
    },
}

impl RunOutcome {
    pub fn boards_aligned(&self) -> usize {
        match *self {
            RunOutcome::Completed { boards_aligned }
            | RunOutcome::Cancelled { boards_aligned }
            | RunOutcome::Aborted { boards_aligned, .. } => boards_aligned,
        }
    }
}

/// Receives progress and results from an alignment run
///
/// Called from the process task; implementations must not block.
pub trait SessionObserver {
    /// The run moved to a new phase
    fn phase_changed(&mut self, _phase: Phase) {}

    /// Locating or moving failed; the run waits for cancellation
    fn measurement_failed(&mut self, _board_index: usize, _error: &AlignmentError) {}

    /// A board's new origin and transform were committed
    fn board_aligned(&mut self, board_index: usize, report: &ValidationReport);

    /// A board was rolled back
    fn board_failed(&mut self, board_index: usize, error: &AlignmentError);

    /// The run ended; called exactly once per run
    fn run_finished(&mut self, outcome: RunOutcome);
}

impl<T: SessionObserver> SessionObserver for &mut T {
    fn phase_changed(&mut self, phase: Phase) {
        (**self).phase_changed(phase)
    }

    fn measurement_failed(&mut self, board_index: usize, error: &AlignmentError) {
        (**self).measurement_failed(board_index, error)
    }

    fn board_aligned(&mut self, board_index: usize, report: &ValidationReport) {
        (**self).board_aligned(board_index, report)
    }

    fn board_failed(&mut self, board_index: usize, error: &AlignmentError) {
        (**self).board_failed(board_index, error)
    }

    fn run_finished(&mut self, outcome: RunOutcome) {
        (**self).run_finished(outcome)
    }
}
