//! Alignment session bookkeeping

use heapless::Vec;

use super::error::AlignmentError;
use crate::geometry::{AffineTransform, Length, LengthUnit, Location, Point2};
use crate::model::{BoardLocation, BoardSnapshot, Placement, Side};
use crate::solver;
use crate::travel::{TravelOptimizer, TravelSummary};

/// Maximum fiducials measured per board
///
/// Counts enabled fiducials on the board's side only. A board with more
/// fails `begin` with `AlignmentError::Capacity` and is left untouched.
pub const MAX_FIDUCIALS: usize = 16;

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionStatus {
    /// Collecting correspondences
    Measuring,
    /// A candidate transform was fitted
    Solved,
    /// The candidate origin and transform were written to the board
    Applied,
    /// The board was restored to its snapshot
    RolledBack,
}

/// Measurement state for one board
#[derive(Debug, Clone)]
pub struct AlignmentSession {
    board_index: usize,
    side: Side,
    placements: Vec<Placement, MAX_FIDUCIALS>,
    index: usize,
    expected: Vec<Point2, MAX_FIDUCIALS>,
    measured: Vec<Point2, MAX_FIDUCIALS>,
    snapshot: BoardSnapshot,
    status: SessionStatus,
    travel: TravelSummary,
}

impl AlignmentSession {
    /// Start aligning `board`
    ///
    /// Snapshots and clears the board's transform so nominal locations are
    /// used while measuring, then orders the board's fiducials from `tool`
    /// to the board origin. On error the board is restored.
    pub fn begin(
        board_index: usize,
        board: &mut BoardLocation<'_>,
        tool: Location,
        optimizer: &TravelOptimizer,
    ) -> Result<Self, AlignmentError> {
        let snapshot = board.snapshot();
        board.clear_transform();

        let side = board.side();
        let mut placements: Vec<Placement, MAX_FIDUCIALS> = Vec::new();
        for fiducial in board.board().fiducials(side) {
            if placements.push(fiducial.clone()).is_err() {
                board.restore(&snapshot);
                return Err(AlignmentError::Capacity);
            }
        }

        if placements.len() < 2 {
            board.restore(&snapshot);
            return Err(AlignmentError::InsufficientFiducials {
                found: placements.len(),
            });
        }

        let nominal = &*board;
        let travel = match optimizer.solve(
            &mut placements,
            |p| nominal.placement_location(&p.location),
            tool,
            nominal.location(),
        ) {
            Ok(travel) => travel,
            Err(_) => {
                board.restore(&snapshot);
                return Err(AlignmentError::Capacity);
            }
        };

        Ok(Self {
            board_index,
            side,
            placements,
            index: 0,
            expected: Vec::new(),
            measured: Vec::new(),
            snapshot,
            status: SessionStatus::Measuring,
            travel,
        })
    }

    pub fn board_index(&self) -> usize {
        self.board_index
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Fiducials in visit order
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Index of the fiducial being measured
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.placements.len()
    }

    pub fn snapshot(&self) -> &BoardSnapshot {
        &self.snapshot
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn travel(&self) -> &TravelSummary {
        &self.travel
    }

    pub fn expected_points(&self) -> &[Point2] {
        &self.expected
    }

    pub fn measured_points(&self) -> &[Point2] {
        &self.measured
    }

    /// Fiducial being measured, or `None` once every one is recorded
    pub fn current(&self) -> Option<&Placement> {
        self.placements.get(self.index)
    }

    /// Design location of the current fiducial as seen from the board's side
    pub fn expected_location(&self) -> Option<Location> {
        self.current().map(|p| {
            p.location
                .invert(self.side == Side::Bottom, false, false, false)
        })
    }

    /// Nominal machine location of the current fiducial
    pub fn target_location(&self, board: &BoardLocation<'_>) -> Option<Location> {
        self.current().map(|p| board.placement_location(&p.location))
    }

    /// Record the measured machine location of the current fiducial
    ///
    /// Returns true while more fiducials remain.
    pub fn record(&mut self, measured: Location) -> Result<bool, AlignmentError> {
        let Some(expected) = self.expected_location() else {
            return Ok(false);
        };
        self.expected
            .push(expected.xy_mm())
            .map_err(|_| AlignmentError::Capacity)?;
        self.measured
            .push(measured.xy_mm())
            .map_err(|_| AlignmentError::Capacity)?;
        self.index += 1;
        Ok(!self.is_complete())
    }

    pub fn is_complete(&self) -> bool {
        self.index >= self.placements.len()
    }

    /// Fit a transform from the recorded correspondences
    pub fn solve(&mut self) -> Result<AffineTransform, AlignmentError> {
        let transform = solver::solve(&self.expected, &self.measured)?;
        self.status = SessionStatus::Solved;
        Ok(transform)
    }

    /// Fit residual of `transform` over the recorded correspondences, in mm
    pub fn rms_residual(&self, transform: &AffineTransform) -> f64 {
        solver::rms_residual(transform, &self.expected, &self.measured)
    }

    /// Write the origin implied by `transform` and the transform itself
    ///
    /// The new origin is the board's local origin mapped through
    /// `transform`, expressed in the board location's units with the prior Z.
    pub fn apply(&mut self, board: &mut BoardLocation<'_>, transform: &AffineTransform) -> Location {
        let current = board.location();
        let origin = board
            .placement_location_with(transform, &board.local_origin())
            .convert_to_units(current.units)
            .derive(None, None, Some(current.z), None);
        board.set_location_and_transform(origin, Some(*transform));
        self.status = SessionStatus::Applied;
        origin
    }

    /// XY distance between the snapshot origin and the board's current origin
    pub fn origin_offset(&self, board: &BoardLocation<'_>) -> Length {
        let distance = self
            .snapshot
            .location
            .convert_to_units(LengthUnit::Millimeters)
            .linear_distance_to(&board.location());
        Length::mm(distance)
    }

    /// Restore the board's pre-session origin and transform
    pub fn rollback(&mut self, board: &mut BoardLocation<'_>) {
        board.restore(&self.snapshot);
        self.status = SessionStatus::RolledBack;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Board, PlacementType};
    use crate::tolerance::Tolerances;
    use approx::assert_relative_eq;

    fn board(fiducials: &[(&str, f64, f64, Side)]) -> Board {
        let mut board = Board::new("panel", Location::mm(50.0, 40.0, 0.0, 0.0)).unwrap();
        for &(id, x, y, side) in fiducials {
            board
                .add_placement(
                    Placement::new(
                        id,
                        Location::mm(x, y, 0.0, 0.0),
                        PlacementType::FiducialManual,
                        side,
                    )
                    .unwrap(),
                )
                .unwrap();
        }
        board
    }

    fn run(bl: &mut BoardLocation<'_>, measured: &[Location]) -> (AlignmentSession, Length) {
        let mut session =
            AlignmentSession::begin(0, bl, Location::default(), &TravelOptimizer::default())
                .unwrap();
        for m in measured {
            session.record(*m).unwrap();
        }
        let transform = session.solve().unwrap();
        session.apply(bl, &transform);
        let offset = session.origin_offset(bl);
        (session, offset)
    }

    #[test]
    fn test_begin_clears_transform_and_orders() {
        let design = board(&[
            ("FID2", 50.0, 0.0, Side::Top),
            ("FID1", 0.0, 0.0, Side::Top),
        ]);
        let mut bl = BoardLocation::new(&design, Location::mm(0.0, 0.0, 0.0, 0.0), Side::Top);
        bl.set_transform(Some(AffineTransform::translation(1.0, 1.0)));

        let session =
            AlignmentSession::begin(3, &mut bl, Location::default(), &TravelOptimizer::default())
                .unwrap();
        assert!(bl.transform().is_none());
        assert_eq!(session.board_index(), 3);
        assert_eq!(session.total(), 2);
        assert_eq!(session.current().unwrap().id.as_str(), "FID1");
        assert_eq!(session.status(), SessionStatus::Measuring);
        assert_eq!(
            session.snapshot().transform,
            Some(AffineTransform::translation(1.0, 1.0))
        );
    }

    #[test]
    fn test_too_many_fiducials_restores() {
        let ids: std::vec::Vec<std::string::String> =
            (0..=MAX_FIDUCIALS).map(|i| std::format!("FID{}", i)).collect();
        let mut fiducials: std::vec::Vec<(&str, f64, f64, Side)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i as f64, 0.0, Side::Top))
            .collect();
        // Extra fiducials on the far side do not count
        fiducials.push(("BOTTOM", 0.0, 5.0, Side::Bottom));
        let design = board(&fiducials);

        let mut bl = BoardLocation::new(&design, Location::mm(5.0, 5.0, 0.0, 0.0), Side::Top);
        let tx = AffineTransform::translation(2.0, 2.0);
        bl.set_transform(Some(tx));
        let err = AlignmentSession::begin(0, &mut bl, Location::default(), &TravelOptimizer::default())
            .unwrap_err();
        assert_eq!(err, AlignmentError::Capacity);
        assert_eq!(bl.transform(), Some(tx));

        // Exactly the limit is accepted
        let design = board(&fiducials[1..]);
        let mut bl = BoardLocation::new(&design, Location::mm(5.0, 5.0, 0.0, 0.0), Side::Top);
        let session =
            AlignmentSession::begin(0, &mut bl, Location::default(), &TravelOptimizer::default())
                .unwrap();
        assert_eq!(session.total(), MAX_FIDUCIALS);
    }

    #[test]
    fn test_insufficient_fiducials_restores() {
        let design = board(&[
            ("FID1", 0.0, 0.0, Side::Top),
            ("FID2", 50.0, 0.0, Side::Bottom),
        ]);
        let mut bl = BoardLocation::new(&design, Location::mm(5.0, 5.0, 0.0, 0.0), Side::Top);
        let tx = AffineTransform::translation(2.0, 2.0);
        bl.set_transform(Some(tx));

        let err = AlignmentSession::begin(0, &mut bl, Location::default(), &TravelOptimizer::default())
            .unwrap_err();
        assert_eq!(err, AlignmentError::InsufficientFiducials { found: 1 });
        assert_eq!(bl.transform(), Some(tx));
    }

    #[test]
    fn test_offset_fails_tolerance() {
        let design = board(&[("FID1", 0.0, 0.0, Side::Top), ("FID2", 50.0, 0.0, Side::Top)]);
        let mut bl = BoardLocation::new(&design, Location::mm(0.0, 0.0, 0.0, 0.0), Side::Top);
        let (mut session, offset) = run(
            &mut bl,
            &[Location::mm(10.0, 10.0, 0.0, 0.0), Location::mm(60.0, 10.0, 0.0, 0.0)],
        );
        assert_relative_eq!(offset.to_millimeters(), 14.142135623730951, epsilon = 1e-9);

        let report = Tolerances::default().validate(&bl.transform().unwrap(), offset);
        assert!(!report.is_pass());

        session.rollback(&mut bl);
        assert_eq!(bl.location(), Location::mm(0.0, 0.0, 0.0, 0.0));
        assert!(bl.transform().is_none());
        assert_eq!(session.status(), SessionStatus::RolledBack);
    }

    #[test]
    fn test_small_offset_passes() {
        let design = board(&[("FID1", 0.0, 0.0, Side::Top), ("FID2", 50.0, 0.0, Side::Top)]);
        let mut bl = BoardLocation::new(&design, Location::mm(0.0, 0.0, 0.0, 0.0), Side::Top);
        let (session, offset) = run(
            &mut bl,
            &[Location::mm(1.0, 1.0, 0.0, 0.0), Location::mm(51.0, 1.0, 0.0, 0.0)],
        );
        assert_relative_eq!(offset.to_millimeters(), 1.4142135623730951, epsilon = 1e-9);
        assert!(Tolerances::default()
            .validate(&bl.transform().unwrap(), offset)
            .is_pass());
        assert_eq!(session.status(), SessionStatus::Applied);
        assert_relative_eq!(bl.location().x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(bl.location().y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bottom_side_origin_and_mirroring() {
        let design = board(&[
            ("FID1", 5.0, 5.0, Side::Bottom),
            ("FID2", 45.0, 5.0, Side::Bottom),
            ("FID3", 5.0, 35.0, Side::Bottom),
        ]);
        let mut bl = BoardLocation::new(&design, Location::mm(100.0, 100.0, -1.5, 0.0), Side::Bottom);

        // Board sits exactly at its nominal origin
        let mut session =
            AlignmentSession::begin(0, &mut bl, Location::default(), &TravelOptimizer::default())
                .unwrap();
        while let Some(target) = session.target_location(&bl) {
            session.record(target).unwrap();
        }
        assert!(session.is_complete());

        let transform = session.solve().unwrap();
        let origin = session.apply(&mut bl, &transform);
        assert_relative_eq!(origin.x, 100.0, epsilon = 1e-9);
        assert_relative_eq!(origin.y, 100.0, epsilon = 1e-9);
        assert_eq!(origin.z, -1.5);
        assert_relative_eq!(session.origin_offset(&bl).to_millimeters(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(session.rms_residual(&transform), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_origin_keeps_board_units() {
        let design = board(&[("FID1", 0.0, 0.0, Side::Top), ("FID2", 50.8, 0.0, Side::Top)]);
        let start = Location::new(LengthUnit::Inches, 1.0, 1.0, 0.5, 0.0);
        let mut bl = BoardLocation::new(&design, start, Side::Top);
        let (_, offset) = run(
            &mut bl,
            &[Location::mm(25.4, 25.4, 0.0, 0.0), Location::mm(76.2, 25.4, 0.0, 0.0)],
        );
        assert_eq!(bl.location().units, LengthUnit::Inches);
        assert_relative_eq!(bl.location().x, 1.0, epsilon = 1e-9);
        assert_eq!(bl.location().z, 0.5);
        assert_relative_eq!(offset.to_millimeters(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_collinear_is_degenerate() {
        let design = board(&[
            ("FID1", 0.0, 0.0, Side::Top),
            ("FID2", 10.0, 10.0, Side::Top),
            ("FID3", 20.0, 20.0, Side::Top),
        ]);
        let mut bl = BoardLocation::new(&design, Location::default(), Side::Top);
        let mut session =
            AlignmentSession::begin(0, &mut bl, Location::default(), &TravelOptimizer::default())
                .unwrap();
        while let Some(target) = session.target_location(&bl) {
            session.record(target).unwrap();
        }
        assert_eq!(
            session.solve(),
            Err(AlignmentError::DegenerateGeometry(solver::SolveError::Degenerate))
        );
    }
}
