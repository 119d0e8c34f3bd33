/// Placement kinds and the grid legend.
/// Kind properties are queried via methods, not stored as flags,
/// so level semantics are centralized here.

/// Grid cell size in world units.
pub const CELL_SIZE: f32 = 10.0;
/// Offset that puts grid (10, 10) at the world origin.
pub const GRID_ORIGIN: f32 = 100.0;
/// Characters scanned per line.
pub const GRID_COLS: usize = 20;
/// Row number of the first line; rows count down to 0.
pub const TOP_ROW: i32 = 20;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PlacementKind {
    Floor,     // walkable block, top at the ground plane
    Wall,      // tall block, stops the player
    Barrier,   // medium block, stops the player
    Pit,       // drop-through hole, no geometry
    Hazard,    // spike platform: health loss on contact
    Coin,      // spinning pickup, sits above a floor block
    KeyPickup, // unlocks the lift, sits on a floor block
    LiftPad,   // level exit, rises once the key is held
}

impl PlacementKind {
    /// Map a grid character to its kind. Unknown characters are empty cells.
    pub fn from_char(ch: char) -> Option<PlacementKind> {
        match ch {
            'x' => Some(PlacementKind::Floor),
            'e' => Some(PlacementKind::Wall),
            'b' => Some(PlacementKind::Barrier),
            'o' => Some(PlacementKind::Pit),
            'p' => Some(PlacementKind::Hazard),
            'c' => Some(PlacementKind::Coin),
            'k' => Some(PlacementKind::KeyPickup),
            'u' => Some(PlacementKind::LiftPad),
            _ => None,
        }
    }

    /// Altitude of the placement's anchor point.
    pub fn base_z(self) -> f32 {
        match self {
            PlacementKind::Floor | PlacementKind::Wall
            | PlacementKind::Barrier | PlacementKind::Pit => 0.0,
            PlacementKind::Hazard | PlacementKind::KeyPickup => 20.0,
            PlacementKind::Coin => 40.0,
            PlacementKind::LiftPad => 20.1,
        }
    }

    /// Height of the block this kind is drawn as, if it is a block.
    pub fn block_height(self) -> Option<f32> {
        match self {
            PlacementKind::Floor => Some(20.0),
            PlacementKind::Wall => Some(35.0),
            PlacementKind::Barrier => Some(25.0),
            _ => None,
        }
    }

    /// Does the player get pushed back on contact?
    pub fn is_blocking(self) -> bool {
        matches!(self, PlacementKind::Wall | PlacementKind::Barrier)
    }

    /// Pickups that stand on a floor block of their own.
    pub fn has_floor_under(self) -> bool {
        matches!(self, PlacementKind::Coin | PlacementKind::KeyPickup)
    }
}

/// World-space (x, y) of a grid cell.
#[inline]
pub fn cell_to_world(col: usize, row: i32) -> (f32, f32) {
    (
        col as f32 * CELL_SIZE - GRID_ORIGIN,
        row as f32 * CELL_SIZE - GRID_ORIGIN,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_covers_every_kind() {
        let kinds: Vec<_> = "xebopcku".chars().filter_map(PlacementKind::from_char).collect();
        assert_eq!(kinds.len(), 8);
        assert_eq!(PlacementKind::from_char('.'), None);
        assert_eq!(PlacementKind::from_char('X'), None);
    }

    #[test]
    fn only_walls_and_barriers_block() {
        assert!(PlacementKind::Wall.is_blocking());
        assert!(PlacementKind::Barrier.is_blocking());
        assert!(!PlacementKind::Floor.is_blocking());
        assert!(!PlacementKind::Hazard.is_blocking());
    }

    #[test]
    fn grid_origin_is_cell_ten_ten() {
        assert_eq!(cell_to_world(10, 10), (0.0, 0.0));
        assert_eq!(cell_to_world(0, 20), (-100.0, 100.0));
        assert_eq!(cell_to_world(18, 2), (80.0, -80.0));
    }
}
