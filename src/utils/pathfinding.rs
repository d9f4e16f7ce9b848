//! # Pathfinding
//!
//! A* search over the multi-layer grid.
//!
//! Movement is 8-directional within a layer. Layers connect only through
//! stairs: from a stair an agent may step down onto the layer below, and
//! stepping up is allowed only onto a stair. Corridor carving relaxes this by
//! enabling void traversal, which lets the search cross untiled cells (and
//! change layer through open space) at a penalty.
//!
//! Search bookkeeping (`g` costs, predecessors, the closed set) lives in a
//! per-call arena indexed by cell index, never on the grid's cells, so any
//! number of searches can run against one shared `&Grid`.
//!
//! Open-set ties on `f` are broken by insertion order, earliest first, which
//! makes every search reproducible for a given grid state.

use crate::{axis_deltas, config, octile_distance, Grid, GridPos, StrataResult, TerrainDef};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Lateral offsets of a 3×3 ring; the first entry is the centre.
const RING: [(i32, i32); 9] = [
    (0, 0),
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Cost model for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathCosts {
    /// Cost of one diagonal step
    pub diagonal: u32,
    /// Cost of one straight step
    pub straight: u32,
    /// Cost per layer changed
    pub layer_change: u32,
    /// Extra cost of entering a void cell when void traversal is on
    pub void_penalty: u32,
    /// Refund on the void penalty when both cells are void and the layer changes
    pub void_layer_discount: u32,
    /// Extra cost of entering a cell with terrain directly above it
    pub headroom_penalty: u32,
    /// Node expansions allowed before the search gives up
    pub max_iterations: u32,
}

impl PathCosts {
    /// Costs used when carving corridors: covered cells are discouraged so
    /// corridors keep their headroom.
    pub fn for_carving() -> Self {
        Self {
            headroom_penalty: 100,
            ..Self::default()
        }
    }
}

impl Default for PathCosts {
    fn default() -> Self {
        Self {
            diagonal: 14,
            straight: 10,
            layer_change: 200,
            void_penalty: 250,
            void_layer_discount: 50,
            headroom_penalty: 0,
            max_iterations: config::MAX_SEARCH_ITERATIONS,
        }
    }
}

/// The result of a successful search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    /// Cells from start to goal, both inclusive
    pub cells: Vec<GridPos>,
    /// Accumulated cost at the goal
    pub cost: u32,
}

impl Path {
    /// Number of cells, including start and goal.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the path holds no cells. Never true for a search result.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// First cell.
    pub fn start(&self) -> Option<GridPos> {
        self.cells.first().copied()
    }

    /// Last cell.
    pub fn goal(&self) -> Option<GridPos> {
        self.cells.last().copied()
    }

    /// Cells strictly between start and goal.
    pub fn interior(&self) -> &[GridPos] {
        if self.cells.len() <= 2 {
            return &[];
        }
        &self.cells[1..self.cells.len() - 1]
    }

    /// Consecutive `(from, to)` pairs.
    pub fn steps(&self) -> impl Iterator<Item = (GridPos, GridPos)> + '_ {
        self.cells.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

/// Entry in the open set (min-heap via reversed ordering).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f: u32,
    seq: u64,
    index: usize,
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Smallest f first, then earliest insertion.
        other.f.cmp(&self.f).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Per-search scratch state, one slot per grid cell.
struct SearchArena {
    g: Vec<u32>,
    came_from: Vec<Option<usize>>,
    closed: Vec<bool>,
}

impl SearchArena {
    fn new(volume: usize) -> Self {
        Self {
            g: vec![u32::MAX; volume],
            came_from: vec![None; volume],
            closed: vec![false; volume],
        }
    }
}

/// A* pathfinder borrowing one grid.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use strata::{Grid, GridPos, Pathfinder, TerrainCatalog};
///
/// let mut grid = Grid::new(51, 51, 1, Arc::new(TerrainCatalog::standard())).unwrap();
/// grid.fill_rectangle(GridPos::new(-25, -25, 0), GridPos::new(25, 25, 0), "Floor").unwrap();
///
/// let path = Pathfinder::new(&grid)
///     .find_path(GridPos::new(0, 0, 0), GridPos::new(5, 5, 0), false)
///     .unwrap()
///     .expect("open floor is always connected");
/// assert_eq!(path.len(), 6);
/// assert_eq!(path.cost, 70);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Pathfinder<'g> {
    grid: &'g Grid,
    costs: PathCosts,
}

impl<'g> Pathfinder<'g> {
    /// Creates a pathfinder with default costs.
    pub fn new(grid: &'g Grid) -> Self {
        Self::with_costs(grid, PathCosts::default())
    }

    /// Creates a pathfinder with a custom cost model.
    pub fn with_costs(grid: &'g Grid, costs: PathCosts) -> Self {
        Self { grid, costs }
    }

    /// The grid being searched.
    pub fn grid(&self) -> &'g Grid {
        self.grid
    }

    /// The cost model in use.
    pub fn costs(&self) -> &PathCosts {
        &self.costs
    }

    /// Octile distance plus the per-layer cost. Also the search heuristic.
    pub fn distance_cost(&self, a: GridPos, b: GridPos) -> u32 {
        let (dx, dy, dz) = axis_deltas(a, b);
        octile_distance(dx, dy, self.costs.diagonal, self.costs.straight)
            .saturating_add(self.costs.layer_change.saturating_mul(dz))
    }

    /// Finds the cheapest path from `start` to `goal`.
    ///
    /// Returns `Ok(None)` when no route exists or the expansion cap is hit;
    /// a partial path is never returned. Fails only when `start` or `goal`
    /// is outside the grid.
    pub fn find_path(&self, start: GridPos, goal: GridPos, allow_void: bool) -> StrataResult<Option<Path>> {
        let start_index = self.grid.to_index(start)?;
        let goal_index = self.grid.to_index(goal)?;

        if start_index == goal_index {
            return Ok(Some(Path {
                cells: vec![start],
                cost: 0,
            }));
        }

        let mut arena = SearchArena::new(self.grid.dimensions().volume());
        let mut open = BinaryHeap::new();
        let mut seq = 0u64;
        let mut candidates = Vec::with_capacity(RING.len() * 3);
        let mut iterations = 0u32;

        arena.g[start_index] = 0;
        open.push(OpenEntry {
            f: self.distance_cost(start, goal),
            seq,
            index: start_index,
        });

        while let Some(entry) = open.pop() {
            let current_index = entry.index;
            if arena.closed[current_index] {
                continue;
            }

            if current_index == goal_index {
                return self.reconstruct_path(&arena, start_index, goal_index).map(Some);
            }

            iterations += 1;
            if iterations > self.costs.max_iterations {
                log::debug!(
                    "search {} -> {} gave up after {} expansions",
                    start,
                    goal,
                    self.costs.max_iterations
                );
                return Ok(None);
            }
            arena.closed[current_index] = true;

            let current = self.grid.from_index(current_index)?;
            let current_terrain = self.grid.terrain_at(current);
            if current_terrain.is_none() && !allow_void {
                continue;
            }

            self.collect_candidates(current, current_terrain, Some(goal), allow_void, &mut candidates);
            let current_g = arena.g[current_index];

            for neighbor in candidates.drain(..) {
                let neighbor_index = self.grid.to_index(neighbor)?;
                if arena.closed[neighbor_index] {
                    continue;
                }
                if neighbor != goal && self.grid.cell_at(neighbor)?.is_occupied() {
                    continue;
                }

                let neighbor_terrain = self.grid.terrain_at(neighbor);
                match neighbor_terrain {
                    None if !allow_void => continue,
                    Some(terrain) if !terrain.walkable => {
                        arena.closed[neighbor_index] = true;
                        continue;
                    }
                    _ => {}
                }

                let step = self.step_cost(
                    current,
                    current_terrain.is_none(),
                    neighbor,
                    neighbor_terrain.is_none(),
                );
                let tentative = current_g.saturating_add(step);
                if tentative < arena.g[neighbor_index] {
                    arena.g[neighbor_index] = tentative;
                    arena.came_from[neighbor_index] = Some(current_index);
                    seq += 1;
                    open.push(OpenEntry {
                        f: tentative.saturating_add(self.distance_cost(neighbor, goal)),
                        seq,
                        index: neighbor_index,
                    });
                }
            }
        }

        log::trace!("no path from {} to {}", start, goal);
        Ok(None)
    }

    /// Cells an agent standing at `pos` could step to next.
    ///
    /// Applies the same adjacency, terrain and occupancy rules as a search,
    /// without a goal exemption.
    pub fn adjacent_cells(&self, pos: GridPos, allow_void: bool) -> StrataResult<Vec<GridPos>> {
        self.grid.to_index(pos)?;
        let terrain = self.grid.terrain_at(pos);
        if terrain.is_none() && !allow_void {
            return Ok(Vec::new());
        }

        let mut candidates = Vec::new();
        self.collect_candidates(pos, terrain, None, allow_void, &mut candidates);

        let mut adjacent = Vec::with_capacity(candidates.len());
        for neighbor in candidates {
            if self.grid.cell_at(neighbor)?.is_occupied() {
                continue;
            }
            match self.grid.terrain_at(neighbor) {
                Some(terrain) if !terrain.walkable => continue,
                None if !allow_void => continue,
                _ => adjacent.push(neighbor),
            }
        }
        Ok(adjacent)
    }

    fn collect_candidates(
        &self,
        pos: GridPos,
        terrain: Option<&TerrainDef>,
        goal: Option<GridPos>,
        allow_void: bool,
        out: &mut Vec<GridPos>,
    ) {
        out.clear();
        self.push_ring(pos, pos.layer, false, false, goal, allow_void, out);

        let on_stair = terrain.is_some_and(|t| t.stair);
        if pos.layer > 0 && (on_stair || allow_void) {
            self.push_ring(pos, pos.layer - 1, true, false, goal, allow_void, out);
        }

        if pos.layer < self.grid.dimensions().top_layer() {
            self.push_ring(pos, pos.layer + 1, true, !allow_void, goal, allow_void, out);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push_ring(
        &self,
        center: GridPos,
        layer: i32,
        include_center: bool,
        check_stairs: bool,
        goal: Option<GridPos>,
        allow_void: bool,
        out: &mut Vec<GridPos>,
    ) {
        for &(dx, dy) in &RING {
            if dx == 0 && dy == 0 && !include_center {
                continue;
            }

            let candidate = GridPos::new(center.x + dx, center.y + dy, layer);
            if !self.grid.contains(candidate) {
                continue;
            }

            match self.grid.terrain_at(candidate) {
                Some(terrain) => {
                    if check_stairs && !terrain.stair {
                        continue;
                    }
                    let is_goal = goal == Some(candidate);
                    if !allow_void && !is_goal && !self.grid.is_valid_floor(candidate) {
                        continue;
                    }
                }
                None if !allow_void => continue,
                None => {}
            }

            out.push(candidate);
        }
    }

    fn step_cost(&self, from: GridPos, from_void: bool, to: GridPos, to_void: bool) -> u32 {
        let mut cost = self.distance_cost(from, to);

        if to_void {
            cost = cost.saturating_add(self.costs.void_penalty);
            if from_void && from.layer != to.layer {
                cost = cost.saturating_sub(self.costs.void_layer_discount);
            }
        }

        if self.costs.headroom_penalty > 0 && self.grid.has_terrain(to.above()) {
            cost = cost.saturating_add(self.costs.headroom_penalty);
        }

        cost
    }

    fn reconstruct_path(&self, arena: &SearchArena, start_index: usize, goal_index: usize) -> StrataResult<Path> {
        let mut cells = vec![self.grid.from_index(goal_index)?];
        let mut current = goal_index;

        while current != start_index {
            match arena.came_from[current] {
                Some(previous) => {
                    cells.push(self.grid.from_index(previous)?);
                    current = previous;
                }
                None => break,
            }
        }

        cells.reverse();
        Ok(Path {
            cells,
            cost: arena.g[goal_index],
        })
    }
}
