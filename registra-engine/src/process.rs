//! Alignment process
//!
//! Owns the phase and the per-board session, and drives every enabled board
//! through measurement, solving, and validation. Boards that cannot be
//! aligned are restored to their pre-session origin and transform.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;

use registra_core::config::{AlignmentSettings, FailurePolicy};
use registra_core::model::{BoardLocation, PlacementType};
use registra_core::session::{AlignmentError, AlignmentSession};
use registra_core::state::{Event, MeasurementWait, Phase};
use registra_core::tolerance::ValidationReport;
use registra_core::traits::{
    FiducialLocator, GatePrompt, GateResponse, LocateRequest, MotionController, RunOutcome,
    SessionObserver, UserGate,
};

use crate::control::SessionControl;

/// Single-owner alignment actor
///
/// Capabilities and settings are injected at construction. `control` is the
/// only state shared with other tasks.
pub struct AlignmentProcess<'c, M, L, Mo, G, O>
where
    M: RawMutex,
{
    locator: L,
    motion: Mo,
    gate: G,
    observer: O,
    control: &'c SessionControl<M>,
    settings: AlignmentSettings,
    phase: Phase,
}

impl<'c, M, L, Mo, G, O> AlignmentProcess<'c, M, L, Mo, G, O>
where
    M: RawMutex,
    L: FiducialLocator,
    Mo: MotionController,
    G: UserGate,
    O: SessionObserver,
{
    pub fn new(
        locator: L,
        motion: Mo,
        gate: G,
        observer: O,
        control: &'c SessionControl<M>,
        settings: AlignmentSettings,
    ) -> Self {
        Self {
            locator,
            motion,
            gate,
            observer,
            control,
            settings,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn settings(&self) -> &AlignmentSettings {
        &self.settings
    }

    /// Align every enabled board in order
    ///
    /// Boards committed before a failure or cancellation stay committed.
    /// The observer's `run_finished` is called exactly once.
    pub async fn run(&mut self, boards: &mut [BoardLocation<'_>]) -> RunOutcome {
        if self.phase.is_terminal() {
            self.advance(Event::Reset);
        }

        let count = boards.len();
        let mut aligned = 0;
        let mut outcome = None;
        info!("Aligning {} boards", count);

        for (index, board) in boards.iter_mut().enumerate() {
            if !board.is_enabled() {
                debug!("Board {}: disabled, skipping", index);
                continue;
            }
            if self.control.is_cancelled() {
                outcome = Some(RunOutcome::Cancelled {
                    boards_aligned: aligned,
                });
                break;
            }

            self.advance(Event::Begin { board: index });
            match self.align_board(index, count, board).await {
                Ok(report) => {
                    aligned += 1;
                    info!(
                        "Board {}: aligned, origin moved {} mm",
                        index,
                        report.origin_offset_mm
                    );
                    self.observer.board_aligned(index, &report);
                }
                Err(AlignmentError::UserCancelled) => {
                    info!("Board {}: cancelled, rolled back", index);
                    outcome = Some(RunOutcome::Cancelled {
                        boards_aligned: aligned,
                    });
                    break;
                }
                Err(e) => {
                    warn!("Board {}: failed, rolled back", index);
                    self.advance(Event::BoardFailed);
                    self.observer.board_failed(index, &e);
                    if self.settings.failure_policy == FailurePolicy::AbortRun {
                        outcome = Some(RunOutcome::Aborted {
                            boards_aligned: aligned,
                            board_index: index,
                        });
                        break;
                    }
                }
            }
        }

        let outcome = outcome.unwrap_or(RunOutcome::Completed {
            boards_aligned: aligned,
        });
        match outcome {
            RunOutcome::Cancelled { .. } => self.advance(Event::Cancel),
            _ => self.advance(Event::Finish),
        }
        info!("Alignment run finished: {}", outcome);
        self.observer.run_finished(outcome);
        outcome
    }

    fn advance(&mut self, event: Event) {
        let next = self.phase.transition(event);
        if next != self.phase {
            trace!("Phase: {} -> {}", self.phase, next);
            self.phase = next;
            self.observer.phase_changed(next);
        }
    }

    /// Cancellation check at a resumption point
    fn checkpoint(&self) -> Result<(), AlignmentError> {
        if self.control.is_cancelled() {
            Err(AlignmentError::UserCancelled)
        } else {
            Ok(())
        }
    }

    /// Surface a measurement failure and wait for cancellation
    async fn suspend(&mut self, index: usize, error: AlignmentError) -> AlignmentError {
        warn!("Board {}: measurement failed, waiting for cancel", index);
        self.observer.measurement_failed(index, &error);
        self.advance(Event::MeasurementFailed);
        self.control.cancelled().await;
        AlignmentError::UserCancelled
    }

    async fn align_board(
        &mut self,
        index: usize,
        count: usize,
        board: &mut BoardLocation<'_>,
    ) -> Result<ValidationReport, AlignmentError> {
        self.checkpoint()?;
        let tool = self.motion.tool_location().await;
        self.checkpoint()?;
        let tool = match tool {
            Ok(tool) => tool,
            Err(e) => return Err(self.suspend(index, e.into()).await),
        };

        let optimizer = self.settings.optimizer();
        let mut session = AlignmentSession::begin(index, board, tool, &optimizer)?;
        debug!(
            "Board {}: {} fiducials, travel {} -> {} mm in {} passes",
            index,
            session.total(),
            session.travel().initial_length_mm,
            session.travel().final_length_mm,
            session.travel().passes
        );
        self.advance(Event::OrderReady {
            total: session.total(),
        });

        match self.measure_and_validate(&mut session, board, count).await {
            Ok(report) => Ok(report),
            Err(e) => {
                session.rollback(board);
                Err(e)
            }
        }
    }

    async fn measure_and_validate(
        &mut self,
        session: &mut AlignmentSession,
        board: &mut BoardLocation<'_>,
        count: usize,
    ) -> Result<ValidationReport, AlignmentError> {
        let index = session.board_index();

        while let Some(placement) = session.current().cloned() {
            self.checkpoint()?;
            let nominal = board.placement_location(&placement.location);

            let measured = match placement.kind {
                PlacementType::Fiducial => {
                    self.advance(Event::Waiting(MeasurementWait::Locating));
                    let request = LocateRequest {
                        board_index: index,
                        placement: placement.clone(),
                        side: session.side(),
                        board_origin: board.location(),
                        nominal,
                    };
                    let located = self.locator.locate(&request).await;
                    self.checkpoint()?;
                    match located {
                        Ok(location) => location,
                        Err(error) => {
                            let e = AlignmentError::Locate {
                                placement: placement.id.clone(),
                                error,
                            };
                            return Err(self.suspend(index, e).await);
                        }
                    }
                }
                PlacementType::FiducialManual | PlacementType::Standard => {
                    self.advance(Event::Waiting(MeasurementWait::Moving));
                    let moved = self.motion.move_near(&nominal).await;
                    self.checkpoint()?;
                    if let Err(e) = moved {
                        return Err(self.suspend(index, e.into()).await);
                    }

                    self.advance(Event::Waiting(MeasurementWait::Operator));
                    let prompt = GatePrompt::manual_fiducial(index, count, &placement.id);
                    match select(self.gate.present(&prompt), self.control.cancelled()).await {
                        Either::First(GateResponse::Proceed) => {}
                        Either::First(GateResponse::Cancel) | Either::Second(()) => {
                            return Err(AlignmentError::UserCancelled);
                        }
                    }

                    self.checkpoint()?;
                    let tool = self.motion.tool_location().await;
                    self.checkpoint()?;
                    match tool {
                        Ok(location) => location,
                        Err(e) => return Err(self.suspend(index, e.into()).await),
                    }
                }
            };

            debug!(
                "Board {}: {} measured at ({}, {})",
                index,
                placement.id.as_str(),
                measured.x,
                measured.y
            );
            session.record(measured)?;
            self.advance(Event::Measured);
        }

        self.checkpoint()?;
        let transform = session.solve()?;
        debug!(
            "Board {}: fit residual {} mm",
            index,
            session.rms_residual(&transform)
        );
        let origin = session.apply(board, &transform);
        debug!("Board {}: new origin ({}, {})", index, origin.x, origin.y);
        self.advance(Event::TransformSolved);

        let offset = session.origin_offset(board);
        let report = self.settings.tolerances.validate(&transform, offset);
        if !report.is_pass() {
            warn!(
                "Board {}: {} tolerance violations",
                index,
                report.violations.len()
            );
            return Err(AlignmentError::ToleranceViolation(report));
        }

        self.advance(Event::ValidationPassed);
        Ok(report)
    }
}
