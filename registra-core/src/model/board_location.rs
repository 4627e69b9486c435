//! A board placed on the machine
//!
//! Associates a board design with its nominal origin in machine coordinates,
//! the side facing the tooling, and the optional design-to-machine
//! transform measured from fiducials.

use heapless::Vec;

use super::board::{Board, MAX_PLACEMENTS};
use super::placement::{PlacementId, PlacementType, Side};
use super::ModelError;
use crate::geometry::{AffineTransform, LengthUnit, Location, Point2};

/// Location and transform captured before an alignment pass
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardSnapshot {
    pub location: Location,
    pub transform: Option<AffineTransform>,
}

/// A board positioned on the machine
#[derive(Debug, Clone)]
pub struct BoardLocation<'a> {
    board: &'a Board,
    location: Location,
    side: Side,
    /// Design (mm) to machine (mm); only valid for the current `location`
    transform: Option<AffineTransform>,
    enabled: bool,
    placed: Vec<PlacementId, MAX_PLACEMENTS>,
}

impl<'a> BoardLocation<'a> {
    pub fn new(board: &'a Board, location: Location, side: Side) -> Self {
        Self {
            board,
            location,
            side,
            transform: None,
            enabled: true,
            placed: Vec::new(),
        }
    }

    pub fn board(&self) -> &'a Board {
        self.board
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Move the nominal origin
    ///
    /// Any transform is cleared when X, Y, or rotation change; it was derived
    /// against the previous origin.
    pub fn set_location(&mut self, location: Location) {
        let moved = !self.location.same_xy_rotation(&location);
        self.location = location;
        if moved {
            self.transform = None;
        }
    }

    pub fn transform(&self) -> Option<AffineTransform> {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Option<AffineTransform>) {
        self.transform = transform;
    }

    pub fn clear_transform(&mut self) {
        self.transform = None;
    }

    /// Set origin and transform together, without the clearing side effect
    pub fn set_location_and_transform(
        &mut self,
        location: Location,
        transform: Option<AffineTransform>,
    ) {
        self.location = location;
        self.transform = transform;
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn set_side(&mut self, side: Side) {
        self.side = side;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            location: self.location,
            transform: self.transform,
        }
    }

    pub fn restore(&mut self, snapshot: &BoardSnapshot) {
        self.set_location_and_transform(snapshot.location, snapshot.transform);
    }

    /// Design-local point that the nominal origin refers to
    ///
    /// `(0, 0)` for the top side; `(width, 0)` for the bottom side, which is
    /// the corner that ends up lower-left once the board is flipped.
    pub fn local_origin(&self) -> Location {
        match self.side {
            Side::Top => Location::origin(self.board.dimensions.units),
            Side::Bottom => {
                Location::origin(self.board.dimensions.units).derive(
                    Some(self.board.width()),
                    None,
                    None,
                    None,
                )
            }
        }
    }

    /// Design-local location as seen from the tooling side (mirrored in X for Bottom)
    pub fn side_adjusted(&self, design: &Location) -> Location {
        match self.side {
            Side::Top => *design,
            Side::Bottom => design.invert(true, false, false, false),
        }
    }

    /// Machine location of a design-local point
    ///
    /// Uses the measured transform when present; otherwise the nominal origin
    /// and rotation. The Z of the result is always the board's Z.
    pub fn placement_location(&self, design: &Location) -> Location {
        match self.transform {
            Some(transform) => self.placement_location_with(&transform, design),
            None => self.nominal_placement_location(design),
        }
    }

    /// Machine location of a design-local point through `transform`, in mm
    pub fn placement_location_with(
        &self,
        transform: &AffineTransform,
        design: &Location,
    ) -> Location {
        let local = self
            .side_adjusted(design)
            .convert_to_units(LengthUnit::Millimeters);
        let p = transform.apply(Point2::new(local.x, local.y));
        let board_z = self.location.convert_to_units(LengthUnit::Millimeters).z;
        Location::mm(p.x, p.y, board_z, local.rotation + transform.rotation_deg())
    }

    /// Machine location of a design-local point ignoring any transform
    pub fn nominal_placement_location(&self, design: &Location) -> Location {
        let units = self.location.units;
        let relative = self
            .side_adjusted(design)
            .convert_to_units(units)
            .subtract(&self.side_adjusted(&self.local_origin()))
            .derive(None, None, Some(0.0), None)
            .rotate_xy(self.location.rotation);
        Location::new(
            units,
            self.location.x + relative.x,
            self.location.y + relative.y,
            self.location.z,
            relative.rotation + self.location.rotation,
        )
    }

    /// Mark a placement as placed or not
    pub fn set_placed(&mut self, id: &str, placed: bool) -> Result<(), ModelError> {
        let position = self.placed.iter().position(|p| p.as_str() == id);
        match (position, placed) {
            (Some(_), true) | (None, false) => Ok(()),
            (Some(i), false) => {
                self.placed.swap_remove(i);
                Ok(())
            }
            (None, true) => {
                let id = PlacementId::try_from(id).map_err(|_| ModelError::IdTooLong)?;
                self.placed
                    .push(id)
                    .map_err(|_| ModelError::TooManyPlacements)
            }
        }
    }

    pub fn is_placed(&self, id: &str) -> bool {
        self.placed.iter().any(|p| p.as_str() == id)
    }

    pub fn clear_all_placed(&mut self) {
        self.placed.clear();
    }

    /// Enabled standard placements on this board's side
    pub fn total_active_placements(&self) -> usize {
        self.standard_placements().count()
    }

    /// Enabled standard placements on this board's side not yet placed
    pub fn active_placements(&self) -> usize {
        self.standard_placements()
            .filter(|p| !self.is_placed(&p.id))
            .count()
    }

    fn standard_placements(&self) -> impl Iterator<Item = &super::Placement> + '_ {
        self.board.placements().iter().filter(move |p| {
            p.enabled && p.side == self.side && p.kind == PlacementType::Standard
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Placement;
    use approx::assert_relative_eq;

    fn board() -> Board {
        let mut board = Board::new("demo", Location::mm(100.0, 50.0, 0.0, 0.0)).unwrap();
        for (id, kind) in [
            ("R1", PlacementType::Standard),
            ("R2", PlacementType::Standard),
            ("FID1", PlacementType::Fiducial),
        ] {
            board
                .add_placement(
                    Placement::new(id, Location::mm(10.0, 5.0, 0.0, 0.0), kind, Side::Top).unwrap(),
                )
                .unwrap();
        }
        board
    }

    #[test]
    fn test_moving_origin_clears_transform() {
        let board = board();
        let mut bl = BoardLocation::new(&board, Location::mm(10.0, 10.0, 0.0, 0.0), Side::Top);
        bl.set_transform(Some(AffineTransform::translation(1.0, 1.0)));

        // Z only: transform survives
        bl.set_location(Location::mm(10.0, 10.0, 5.0, 0.0));
        assert!(bl.transform().is_some());

        bl.set_location(Location::mm(10.0, 10.0, 5.0, 1.0));
        assert!(bl.transform().is_none());
    }

    #[test]
    fn test_atomic_set_keeps_transform() {
        let board = board();
        let mut bl = BoardLocation::new(&board, Location::default(), Side::Top);
        let tx = AffineTransform::translation(3.0, 4.0);
        bl.set_location_and_transform(Location::mm(3.0, 4.0, 0.0, 0.0), Some(tx));
        assert_eq!(bl.transform(), Some(tx));
        assert_eq!(bl.location(), Location::mm(3.0, 4.0, 0.0, 0.0));
    }

    #[test]
    fn test_snapshot_restore() {
        let board = board();
        let mut bl = BoardLocation::new(&board, Location::mm(1.0, 2.0, 3.0, 4.0), Side::Top);
        bl.set_transform(Some(AffineTransform::translation(1.0, 2.0)));
        let snap = bl.snapshot();

        bl.set_location(Location::mm(9.0, 9.0, 9.0, 9.0));
        bl.restore(&snap);
        assert_eq!(bl.snapshot(), snap);
    }

    #[test]
    fn test_nominal_top_rotated() {
        let board = board();
        let bl = BoardLocation::new(&board, Location::mm(100.0, 200.0, -2.0, 90.0), Side::Top);
        let p = bl.placement_location(&Location::mm(10.0, 0.0, 7.0, 0.0));
        assert_relative_eq!(p.x, 100.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 210.0, epsilon = 1e-9);
        assert_eq!(p.z, -2.0);
        assert_relative_eq!(p.rotation, 90.0);
    }

    #[test]
    fn test_nominal_bottom_maps_far_corner_to_origin() {
        let board = board();
        let bl = BoardLocation::new(&board, Location::mm(50.0, 50.0, 0.0, 0.0), Side::Bottom);
        let corner = bl.placement_location(&Location::mm(100.0, 0.0, 0.0, 0.0));
        assert_relative_eq!(corner.x, 50.0);
        assert_relative_eq!(corner.y, 50.0);

        // Mirrored: design x=90 lands 10mm right of the origin
        let p = bl.placement_location(&Location::mm(90.0, 5.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 60.0);
        assert_relative_eq!(p.y, 55.0);
    }

    #[test]
    fn test_transform_path_agrees_with_nominal() {
        let board = board();
        let mut bl = BoardLocation::new(&board, Location::mm(50.0, 20.0, 0.0, 0.0), Side::Bottom);
        let design = Location::mm(30.0, 12.0, 0.0, 0.0);
        let nominal = bl.placement_location(&design);

        // The transform equivalent to the nominal mapping for a bottom board
        bl.set_transform(Some(AffineTransform::translation(150.0, 20.0)));
        let measured = bl.placement_location(&design);
        assert_relative_eq!(measured.x, nominal.x, epsilon = 1e-9);
        assert_relative_eq!(measured.y, nominal.y, epsilon = 1e-9);
    }

    #[test]
    fn test_placed_tracking() {
        let board = board();
        let mut bl = BoardLocation::new(&board, Location::default(), Side::Top);
        assert_eq!(bl.total_active_placements(), 2);
        assert_eq!(bl.active_placements(), 2);

        bl.set_placed("R1", true).unwrap();
        bl.set_placed("R1", true).unwrap();
        assert!(bl.is_placed("R1"));
        assert_eq!(bl.active_placements(), 1);

        bl.set_placed("R1", false).unwrap();
        assert_eq!(bl.active_placements(), 2);

        bl.set_placed("R2", true).unwrap();
        bl.clear_all_placed();
        assert!(!bl.is_placed("R2"));
    }

    #[test]
    fn test_side_filter_for_active_counts() {
        let board = board();
        let bl = BoardLocation::new(&board, Location::default(), Side::Bottom);
        assert_eq!(bl.total_active_placements(), 0);
    }
}
