//! Phase definition and transition table

use super::events::Event;

/// What the current measurement is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasurementWait {
    /// Vision is locating an automatic fiducial
    Locating,
    /// The camera is moving to a manual fiducial
    Moving,
    /// The operator is jogging onto a manual fiducial
    Operator,
    /// Locate or motion failed; only cancellation can continue
    Faulted,
}

/// Alignment run phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// No run in progress
    Idle,
    /// Snapshotting the board and ordering its fiducials
    Init { board: usize },
    /// Measuring fiducial `index` of `total`
    AwaitMeasurement {
        board: usize,
        index: usize,
        total: usize,
        wait: MeasurementWait,
    },
    /// Fitting the design-to-machine transform
    ComputeTransform { board: usize },
    /// Checking the fitted transform against tolerances
    Validate { board: usize },
    /// Board finished (committed or rolled back)
    AdvanceBoard { board: usize },
    /// Run finished
    Done,
    /// Run cancelled
    Cancelled,
}

impl Phase {
    /// Board index for board-scoped phases
    pub fn board(&self) -> Option<usize> {
        match *self {
            Phase::Init { board }
            | Phase::AwaitMeasurement { board, .. }
            | Phase::ComputeTransform { board }
            | Phase::Validate { board }
            | Phase::AdvanceBoard { board } => Some(board),
            Phase::Idle | Phase::Done | Phase::Cancelled => None,
        }
    }

    /// Run has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done | Phase::Cancelled)
    }

    /// Run is in progress
    pub fn is_active(&self) -> bool {
        !matches!(self, Phase::Idle) && !self.is_terminal()
    }

    /// Process an event and return the next phase
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use Phase::*;

        match (self, event) {
            // Cancellation wins from any live phase
            (Idle | Init { .. } | AwaitMeasurement { .. }, Cancel) => Cancelled,
            (ComputeTransform { .. } | Validate { .. } | AdvanceBoard { .. }, Cancel) => {
                Cancelled
            }

            // Starting a board
            (Idle, Begin { board }) => Init { board },
            (AdvanceBoard { .. }, Begin { board }) => Init { board },
            (Idle, Finish) => Done,

            // Init transitions
            (Init { board }, OrderReady { total }) if total > 0 => AwaitMeasurement {
                board,
                index: 0,
                total,
                wait: MeasurementWait::Locating,
            },
            (Init { board }, BoardFailed) => AdvanceBoard { board },
            // Tool position unreadable; no visit order exists yet
            (Init { board }, MeasurementFailed) => AwaitMeasurement {
                board,
                index: 0,
                total: 0,
                wait: MeasurementWait::Faulted,
            },

            // Measurement transitions
            (AwaitMeasurement { board, index, total, .. }, Waiting(wait)) => AwaitMeasurement {
                board,
                index,
                total,
                wait,
            },
            (AwaitMeasurement { board, index, total, .. }, Measured) => {
                if index + 1 < total {
                    AwaitMeasurement {
                        board,
                        index: index + 1,
                        total,
                        wait: MeasurementWait::Locating,
                    }
                } else {
                    ComputeTransform { board }
                }
            }
            (AwaitMeasurement { board, index, total, .. }, MeasurementFailed) => {
                AwaitMeasurement {
                    board,
                    index,
                    total,
                    wait: MeasurementWait::Faulted,
                }
            }
            (AwaitMeasurement { board, .. }, BoardFailed) => AdvanceBoard { board },

            // Solve and validate
            (ComputeTransform { board }, TransformSolved) => Validate { board },
            (ComputeTransform { board }, BoardFailed) => AdvanceBoard { board },
            (Validate { board }, ValidationPassed) => AdvanceBoard { board },
            (Validate { board }, BoardFailed) => AdvanceBoard { board },

            // Finishing
            (AdvanceBoard { .. }, Finish) => Done,
            (Done | Cancelled, Reset) => Idle,

            // Default: stay in current phase
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measuring(index: usize, total: usize) -> Phase {
        Phase::AwaitMeasurement {
            board: 0,
            index,
            total,
            wait: MeasurementWait::Locating,
        }
    }

    #[test]
    fn test_happy_path() {
        let phase = Phase::Idle.transition(Event::Begin { board: 0 });
        assert_eq!(phase, Phase::Init { board: 0 });

        let phase = phase.transition(Event::OrderReady { total: 2 });
        assert_eq!(phase, measuring(0, 2));

        let phase = phase.transition(Event::Measured);
        assert_eq!(phase, measuring(1, 2));

        let phase = phase.transition(Event::Measured);
        assert_eq!(phase, Phase::ComputeTransform { board: 0 });

        let phase = phase.transition(Event::TransformSolved);
        assert_eq!(phase, Phase::Validate { board: 0 });

        let phase = phase.transition(Event::ValidationPassed);
        assert_eq!(phase, Phase::AdvanceBoard { board: 0 });

        let phase = phase.transition(Event::Begin { board: 1 });
        assert_eq!(phase, Phase::Init { board: 1 });
    }

    #[test]
    fn test_cancel_from_any_live_phase() {
        let phases = [
            Phase::Idle,
            Phase::Init { board: 0 },
            measuring(1, 3),
            Phase::ComputeTransform { board: 0 },
            Phase::Validate { board: 0 },
            Phase::AdvanceBoard { board: 0 },
        ];

        for phase in phases {
            assert_eq!(phase.transition(Event::Cancel), Phase::Cancelled);
        }
    }

    #[test]
    fn test_terminal_phases_ignore_events() {
        for phase in [Phase::Done, Phase::Cancelled] {
            assert_eq!(phase.transition(Event::Cancel), phase);
            assert_eq!(phase.transition(Event::Begin { board: 2 }), phase);
            assert_eq!(phase.transition(Event::Reset), Phase::Idle);
        }
    }

    #[test]
    fn test_wait_kind_updates() {
        let phase = measuring(0, 2).transition(Event::Waiting(MeasurementWait::Operator));
        assert!(matches!(
            phase,
            Phase::AwaitMeasurement {
                wait: MeasurementWait::Operator,
                ..
            }
        ));

        let faulted = phase.transition(Event::MeasurementFailed);
        assert!(matches!(
            faulted,
            Phase::AwaitMeasurement {
                index: 0,
                wait: MeasurementWait::Faulted,
                ..
            }
        ));
        assert_eq!(faulted.transition(Event::Cancel), Phase::Cancelled);
    }

    #[test]
    fn test_fault_before_order_is_visible() {
        let phase = Phase::Init { board: 2 }.transition(Event::MeasurementFailed);
        assert_eq!(
            phase,
            Phase::AwaitMeasurement {
                board: 2,
                index: 0,
                total: 0,
                wait: MeasurementWait::Faulted,
            }
        );
        assert_eq!(phase.transition(Event::Cancel), Phase::Cancelled);
    }

    #[test]
    fn test_board_failure_advances() {
        for phase in [
            Phase::Init { board: 3 },
            Phase::ComputeTransform { board: 3 },
            Phase::Validate { board: 3 },
        ] {
            assert_eq!(
                phase.transition(Event::BoardFailed),
                Phase::AdvanceBoard { board: 3 }
            );
        }
    }

    #[test]
    fn test_unknown_pairs_stay_put() {
        assert_eq!(Phase::Idle.transition(Event::Measured), Phase::Idle);
        assert_eq!(
            Phase::Init { board: 0 }.transition(Event::OrderReady { total: 0 }),
            Phase::Init { board: 0 }
        );
        assert_eq!(
            Phase::Validate { board: 0 }.transition(Event::TransformSolved),
            Phase::Validate { board: 0 }
        );
    }

    #[test]
    fn test_phase_helpers() {
        assert_eq!(measuring(0, 2).board(), Some(0));
        assert_eq!(Phase::Done.board(), None);
        assert!(Phase::Cancelled.is_terminal());
        assert!(!Phase::Idle.is_active());
        assert!(Phase::Validate { board: 1 }.is_active());
    }

    #[test]
    fn test_empty_run_finishes() {
        assert_eq!(Phase::Idle.transition(Event::Finish), Phase::Done);
    }
}
