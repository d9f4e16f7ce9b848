//! # Corridor Carving
//!
//! Turns a void-traversal path into painted floor and stairs.
//!
//! Each path cell becomes floor, except that a cell higher than one of its
//! path neighbours becomes a stair with a floor landing directly beneath it.
//! Cells already inside built structure (the cell and both of its path
//! neighbours have terrain) are left alone. Two layers of headroom are cleared
//! above everything painted. Edits are applied in a fixed order: clear, then
//! floor, then stairs.

use super::Canvas;
use crate::{Grid, GridPos, Path, StrataResult, TerrainCatalog, TerrainId};

/// Stair orientation, named by the lateral axis the corridor climbs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StairAxis {
    X,
    Y,
}

/// Terrain ids used when painting a corridor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorridorTerrain {
    pub floor: TerrainId,
    pub stair_x: TerrainId,
    pub stair_y: TerrainId,
}

impl CorridorTerrain {
    /// Resolves terrain names through the catalog.
    pub fn resolve(catalog: &TerrainCatalog, floor: &str, stair_x: &str, stair_y: &str) -> StrataResult<Self> {
        Ok(Self {
            floor: catalog.id_of(floor)?,
            stair_x: catalog.id_of(stair_x)?,
            stair_y: catalog.id_of(stair_y)?,
        })
    }
}

/// The edits needed to carve one corridor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorridorPlan {
    /// Cells erased for headroom
    pub clear: Vec<GridPos>,
    /// Cells painted as floor, landings included
    pub floor: Vec<GridPos>,
    /// Cells painted as x-axis stairs
    pub stairs_x: Vec<GridPos>,
    /// Cells painted as y-axis stairs
    pub stairs_y: Vec<GridPos>,
}

impl CorridorPlan {
    /// Plans a corridor along `path` against the grid's current terrain.
    ///
    /// With `widen` set, straight segments gain a flanking cell on each side.
    /// Diagonal segments always gain the two corner-cut cells between
    /// consecutive path cells. Flanks and corner cuts are skipped where they
    /// would leave the grid or overwrite non-walkable terrain.
    pub fn from_path(grid: &Grid, path: &Path, widen: bool) -> Self {
        let mut plan = Self::default();
        let cells = &path.cells;

        for (i, &cell) in cells.iter().enumerate() {
            let previous = if i > 0 { cells[i - 1] } else { cell };
            let next = cells.get(i + 1).copied().unwrap_or(cell);

            if grid.has_terrain(cell) && grid.has_terrain(previous) && grid.has_terrain(next) {
                continue;
            }

            let stair = if previous.layer < cell.layer {
                Some(stair_axis(cell - previous))
            } else if next.layer < cell.layer {
                Some(stair_axis(next - cell))
            } else {
                None
            };

            plan.carve_cell(grid, cell, stair);

            let (dx, dy) = (cell.x - previous.x, cell.y - previous.y);
            let extras: Vec<GridPos> = match (dx != 0, dy != 0) {
                (true, true) => vec![
                    GridPos::new(cell.x - dx, cell.y, cell.layer),
                    GridPos::new(cell.x, cell.y - dy, cell.layer),
                ],
                (true, false) if widen => vec![cell.offset(0, -1), cell.offset(0, 1)],
                (false, true) if widen => vec![cell.offset(-1, 0), cell.offset(1, 0)],
                _ => Vec::new(),
            };

            for extra in extras {
                let blocked = grid.terrain_at(extra).is_some_and(|t| !t.walkable);
                if grid.contains(extra) && !blocked {
                    plan.carve_cell(grid, extra, stair);
                }
            }
        }

        plan
    }

    fn carve_cell(&mut self, grid: &Grid, pos: GridPos, stair: Option<StairAxis>) {
        match stair {
            Some(axis) => {
                let stairs = match axis {
                    StairAxis::X => &mut self.stairs_x,
                    StairAxis::Y => &mut self.stairs_y,
                };
                push_unique(stairs, pos);
                push_unique(&mut self.floor, pos.below());
            }
            None => push_unique(&mut self.floor, pos),
        }

        for above in headroom(pos) {
            if grid.contains(above) {
                push_unique(&mut self.clear, above);
            }
        }
    }

    /// Number of cells painted by the plan.
    pub fn painted_len(&self) -> usize {
        self.floor.len() + self.stairs_x.len() + self.stairs_y.len()
    }

    /// Whether the plan makes no edits.
    pub fn is_empty(&self) -> bool {
        self.clear.is_empty() && self.painted_len() == 0
    }

    /// Applies the plan. Cells in `protected` are never cleared.
    pub fn apply(&self, canvas: &mut Canvas<'_>, terrain: CorridorTerrain, protected: &[GridPos]) -> StrataResult<()> {
        for &pos in &self.clear {
            if !protected.contains(&pos) {
                canvas.erase(pos)?;
            }
        }
        for &pos in &self.floor {
            canvas.paint(pos, terrain.floor)?;
        }
        for &pos in &self.stairs_x {
            canvas.paint(pos, terrain.stair_x)?;
        }
        for &pos in &self.stairs_y {
            canvas.paint(pos, terrain.stair_y)?;
        }
        Ok(())
    }
}

/// The two cells kept clear above a walkable cell.
pub fn headroom(pos: GridPos) -> [GridPos; 2] {
    [pos.above(), pos.above().above()]
}

/// Whether `pos` lies in the headroom of `cell`.
pub fn in_headroom(cell: GridPos, pos: GridPos) -> bool {
    headroom(cell).contains(&pos)
}

/// Erases the headroom above `pos`, leaving `protected` cells alone.
pub fn clear_headroom(canvas: &mut Canvas<'_>, pos: GridPos, protected: &[GridPos]) -> StrataResult<()> {
    for above in headroom(pos) {
        if canvas.grid().contains(above) && !protected.contains(&above) {
            canvas.erase(above)?;
        }
    }
    Ok(())
}

/// Pure y steps climb along y; everything else, diagonals included, along x.
fn stair_axis(step: GridPos) -> StairAxis {
    if step.x == 0 && step.y != 0 {
        StairAxis::Y
    } else {
        StairAxis::X
    }
}

fn push_unique(cells: &mut Vec<GridPos>, pos: GridPos) {
    if !cells.contains(&pos) {
        cells.push(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pathfinder, TerrainCatalog};
    use std::sync::Arc;

    fn grid(layers: u32) -> Grid {
        Grid::new(9, 9, layers, Arc::new(TerrainCatalog::standard())).unwrap()
    }

    fn path(cells: &[(i32, i32, i32)]) -> Path {
        Path {
            cells: cells.iter().map(|&(x, y, z)| GridPos::new(x, y, z)).collect(),
            cost: 0,
        }
    }

    fn terrain(grid: &Grid) -> CorridorTerrain {
        CorridorTerrain::resolve(grid.catalog(), "Floor", "StairX", "StairY").unwrap()
    }

    #[test]
    fn test_straight_corridor_is_three_wide() {
        let grid = grid(3);
        let plan = CorridorPlan::from_path(&grid, &path(&[(0, 0, 0), (1, 0, 0), (2, 0, 0)]), true);

        assert_eq!(plan.floor.len(), 7);
        assert!(plan.floor.contains(&GridPos::new(2, -1, 0)));
        assert!(plan.floor.contains(&GridPos::new(2, 1, 0)));
        assert!(plan.stairs_x.is_empty() && plan.stairs_y.is_empty());
        assert_eq!(plan.clear.len(), 14);
        assert!(plan.clear.contains(&GridPos::new(1, 1, 2)));
    }

    #[test]
    fn test_narrow_corridor() {
        let grid = grid(1);
        let plan = CorridorPlan::from_path(&grid, &path(&[(0, 0, 0), (0, 1, 0), (0, 2, 0)]), false);
        assert_eq!(plan.floor.len(), 3);
        assert!(plan.clear.is_empty());
    }

    #[test]
    fn test_diagonal_corner_cuts() {
        let grid = grid(1);
        let plan = CorridorPlan::from_path(&grid, &path(&[(0, 0, 0), (1, 1, 0)]), false);
        let expected = [
            GridPos::new(0, 0, 0),
            GridPos::new(1, 1, 0),
            GridPos::new(0, 1, 0),
            GridPos::new(1, 0, 0),
        ];
        assert_eq!(plan.floor.len(), expected.len());
        for pos in expected {
            assert!(plan.floor.contains(&pos), "missing {}", pos);
        }
    }

    #[test]
    fn test_flanks_keep_walls() {
        let mut grid = grid(1);
        grid.paint(GridPos::new(1, 1, 0), "Wall").unwrap();
        let plan = CorridorPlan::from_path(&grid, &path(&[(0, 0, 0), (1, 0, 0)]), true);
        assert!(!plan.floor.contains(&GridPos::new(1, 1, 0)));
        assert!(plan.floor.contains(&GridPos::new(1, -1, 0)));
    }

    #[test]
    fn test_existing_structure_is_left_alone() {
        let mut grid = grid(1);
        grid.fill_rectangle(GridPos::new(-1, 0, 0), GridPos::new(3, 0, 0), "Floor")
            .unwrap();
        let plan = CorridorPlan::from_path(&grid, &path(&[(0, 0, 0), (1, 0, 0), (2, 0, 0)]), false);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_climb_becomes_stair_with_landing() {
        let grid = grid(3);
        let plan = CorridorPlan::from_path(&grid, &path(&[(0, 0, 0), (1, 0, 1), (2, 0, 1)]), false);

        assert_eq!(plan.stairs_x, vec![GridPos::new(1, 0, 1)]);
        assert!(plan.stairs_y.is_empty());
        assert!(plan.floor.contains(&GridPos::new(1, 0, 0)));
        assert!(plan.floor.contains(&GridPos::new(2, 0, 1)));
        // Layer 3 does not exist, so only one headroom layer is cleared above layer 1.
        assert!(plan.clear.contains(&GridPos::new(1, 0, 2)));
        assert!(!plan.clear.iter().any(|pos| pos.layer > 2));
    }

    #[test]
    fn test_descent_along_y_uses_y_stair() {
        let grid = grid(2);
        let plan = CorridorPlan::from_path(&grid, &path(&[(0, 0, 1), (0, 1, 1), (0, 2, 0)]), false);
        assert_eq!(plan.stairs_y, vec![GridPos::new(0, 1, 1)]);
        assert!(plan.floor.contains(&GridPos::new(0, 1, 0)));
    }

    #[test]
    fn test_applied_corridor_is_walkable_across_layers() {
        let mut grid = grid(3);
        grid.paint(GridPos::new(1, 0, 2), "Wall").unwrap();
        let corridor = path(&[(0, 0, 0), (1, 0, 1), (2, 0, 1)]);
        let plan = CorridorPlan::from_path(&grid, &corridor, true);
        let terrain = terrain(&grid);

        let mut canvas = Canvas::new(&mut grid, true);
        plan.apply(&mut canvas, terrain, &[]).unwrap();
        let events = canvas.into_events();
        assert!(events.contains(&crate::GenerationEvent::Erased {
            pos: GridPos::new(1, 0, 2)
        }));

        let found = Pathfinder::new(&grid)
            .find_path(GridPos::new(0, 0, 0), GridPos::new(2, 0, 1), false)
            .unwrap()
            .expect("carved stairs connect the layers");
        assert_eq!(found.goal(), Some(GridPos::new(2, 0, 1)));
        assert_eq!(grid.terrain_name_at(GridPos::new(1, 1, 1)), Some("StairX"));
    }

    #[test]
    fn test_protected_cells_are_not_cleared() {
        let mut grid = grid(2);
        let anchor = GridPos::new(0, 0, 1);
        grid.paint(anchor, "Floor").unwrap();
        let plan = CorridorPlan::from_path(&grid, &path(&[(-1, 0, 0), (0, 0, 0)]), false);
        assert!(plan.clear.contains(&anchor));
        let terrain = terrain(&grid);

        let mut canvas = Canvas::new(&mut grid, false);
        plan.apply(&mut canvas, terrain, &[anchor]).unwrap();
        assert!(grid.has_terrain(anchor));
    }

    #[test]
    fn test_clear_headroom_over_roofed_floor() {
        let mut grid = grid(4);
        let hub = GridPos::new(0, 0, 0);
        let anchor = GridPos::new(0, 0, 2);
        grid.paint(hub, "Floor").unwrap();
        grid.paint(hub.above(), "Floor").unwrap();
        grid.paint(anchor, "Floor").unwrap();
        grid.paint(anchor.above(), "Wall").unwrap();
        assert!(!grid.is_valid_floor(hub));
        assert!(in_headroom(hub, anchor));
        assert!(!in_headroom(hub, GridPos::new(0, 0, 3)));

        let mut canvas = Canvas::new(&mut grid, true);
        clear_headroom(&mut canvas, hub, &[anchor]).unwrap();
        clear_headroom(&mut canvas, anchor, &[hub]).unwrap();
        assert_eq!(
            canvas.into_events(),
            vec![
                crate::GenerationEvent::Erased { pos: hub.above() },
                crate::GenerationEvent::Erased { pos: anchor.above() },
            ]
        );
        assert!(grid.is_valid_floor(hub));
        assert!(grid.has_terrain(anchor));
        assert!(grid.is_valid_floor(anchor));
    }
}
