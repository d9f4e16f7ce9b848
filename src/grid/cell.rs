//! # Cells
//!
//! One addressable grid position and whatever occupies it.

use super::GridPos;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an object placed on a cell by the host.
pub type OccupantId = Uuid;

/// What, if anything, is standing on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Occupancy {
    /// Nothing blocks the cell
    #[default]
    Empty,
    /// A static podium
    Podium,
    /// A creature such as a spawned enemy
    Creature,
}

impl Occupancy {
    /// Whether a path may pass through a cell with this occupancy.
    pub fn is_passable(self) -> bool {
        matches!(self, Occupancy::Empty)
    }
}

/// A single grid cell.
///
/// The position is fixed at construction. Terrain lives in the grid's
/// per-layer stores and search bookkeeping lives in the pathfinder, so a
/// cell only tracks occupancy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pos: GridPos,
    /// Occupancy tag consulted by pathfinding and line of sight
    pub occupancy: Occupancy,
    /// The placed object, when the host registered one
    pub occupant: Option<OccupantId>,
}

impl Cell {
    /// Creates an empty cell at `pos`.
    pub fn new(pos: GridPos) -> Self {
        Self {
            pos,
            occupancy: Occupancy::Empty,
            occupant: None,
        }
    }

    /// The cell's coordinates.
    pub fn pos(&self) -> GridPos {
        self.pos
    }

    /// Whether something non-passable stands here.
    pub fn is_occupied(&self) -> bool {
        !self.occupancy.is_passable()
    }
}
