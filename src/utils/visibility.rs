//! # Line of Sight
//!
//! Ray-marched visibility tests over the grid.
//!
//! The ray is sampled once per unit of distance between the two cells, with
//! layers measured in the same units as lateral cells. Each sample is rounded
//! to the nearest cell and its layer clamped into the grid. Samples that fall
//! outside the lateral extent are skipped rather than treated as walls, and
//! the two end cells are never tested: sight always escapes the viewer's own
//! cell and a wall can itself be seen.

use crate::{Grid, GridPos, Point3};

/// Decides which cells stop a line of sight.
#[derive(Debug, Clone, Copy, Default)]
pub enum ObstructionPolicy {
    /// Occupied cells and non-walkable terrain block sight
    #[default]
    OccupantsAndSolidTerrain,
    /// Occupied cells and any terrain at all block sight
    AnyTerrain,
    /// Caller-supplied predicate; returns true when the cell blocks sight
    Custom(fn(&Grid, GridPos) -> bool),
}

impl ObstructionPolicy {
    /// Whether the cell at `pos` blocks sight under this policy.
    pub fn blocks(&self, grid: &Grid, pos: GridPos) -> bool {
        match self {
            ObstructionPolicy::OccupantsAndSolidTerrain => {
                is_occupied(grid, pos) || grid.terrain_at(pos).is_some_and(|t| !t.walkable)
            }
            ObstructionPolicy::AnyTerrain => is_occupied(grid, pos) || grid.has_terrain(pos),
            ObstructionPolicy::Custom(predicate) => predicate(grid, pos),
        }
    }
}

fn is_occupied(grid: &Grid, pos: GridPos) -> bool {
    grid.cell_at(pos).map(|cell| cell.is_occupied()).unwrap_or(false)
}

/// Line-of-sight checker borrowing one grid.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use strata::{Grid, GridPos, TerrainCatalog, VisibilityChecker};
///
/// let mut grid = Grid::new(21, 21, 1, Arc::new(TerrainCatalog::standard())).unwrap();
/// let eye = GridPos::new(-5, 0, 0);
/// let target = GridPos::new(5, 0, 0);
///
/// let checker = VisibilityChecker::new(&grid);
/// assert!(checker.has_line_of_sight(eye, target));
///
/// grid.paint(GridPos::new(0, 0, 0), "Wall").unwrap();
/// assert!(!VisibilityChecker::new(&grid).has_line_of_sight(eye, target));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct VisibilityChecker<'g> {
    grid: &'g Grid,
    policy: ObstructionPolicy,
}

impl<'g> VisibilityChecker<'g> {
    /// Creates a checker with the default policy.
    pub fn new(grid: &'g Grid) -> Self {
        Self::with_policy(grid, ObstructionPolicy::default())
    }

    /// Creates a checker with an explicit obstruction policy.
    pub fn with_policy(grid: &'g Grid, policy: ObstructionPolicy) -> Self {
        Self { grid, policy }
    }

    /// The policy in use.
    pub fn policy(&self) -> ObstructionPolicy {
        self.policy
    }

    /// Whether nothing between `origin` and `destination` blocks sight.
    pub fn has_line_of_sight(&self, origin: GridPos, destination: GridPos) -> bool {
        let start = Point3::from_pos(origin);
        let direction = Point3::from_pos(destination) - start;
        let steps = direction.length().round() as u32;
        let unit = direction.normalized();
        let top_layer = self.grid.dimensions().top_layer().max(0);

        for k in 1..steps {
            let sample = (start + unit.scale(k as f64)).round_to_pos();
            let pos = GridPos::new(sample.x, sample.y, sample.layer.clamp(0, top_layer));

            if pos == origin || pos == destination {
                continue;
            }
            if !self.grid.dimensions().contains_lateral(pos.x, pos.y) {
                continue;
            }
            if self.policy.blocks(self.grid, pos) {
                return false;
            }
        }

        true
    }

    /// Euclidean range check applied before a sight test.
    pub fn within_view_range(&self, origin: GridPos, destination: GridPos, range: f64) -> bool {
        origin.euclidean_distance(destination) <= range
    }

    /// Range check followed by a sight test.
    pub fn can_see(&self, origin: GridPos, destination: GridPos, range: f64) -> bool {
        self.within_view_range(origin, destination, range) && self.has_line_of_sight(origin, destination)
    }
}
