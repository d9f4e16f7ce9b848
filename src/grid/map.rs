//! # Grid Representation
//!
//! The fixed-size, multi-layer cell array and its per-layer terrain stores.
//!
//! Coordinates are centered: the middle of each layer is `(0, 0)`. Layers are
//! zero-based from the bottom. Terrain queries outside the grid report void,
//! while accessors and mutators fail with [`StrataError::OutOfBounds`].

use super::{Cell, GridDimensions, GridPos, Occupancy, OccupantId, TerrainCatalog, TerrainDef, TerrainId};
use crate::utils::Point3;
use crate::{config, StrataError, StrataResult};
use std::sync::Arc;

/// The dungeon grid.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use strata::{Grid, GridPos, TerrainCatalog};
///
/// let mut grid = Grid::new(11, 11, 2, Arc::new(TerrainCatalog::standard())).unwrap();
/// let pos = GridPos::new(-5, 5, 0);
/// grid.paint(pos, "Floor").unwrap();
/// assert!(grid.has_terrain(pos));
/// assert!(grid.is_valid_floor(pos));
///
/// grid.paint(pos.above(), "Floor").unwrap();
/// assert!(!grid.is_valid_floor(pos));
/// ```
#[derive(Debug, Clone)]
pub struct Grid {
    dims: GridDimensions,
    catalog: Arc<TerrainCatalog>,
    cells: Vec<Cell>,
    /// One terrain store per layer, indexed `y * width + x` in array space
    terrain: Vec<Vec<Option<TerrainId>>>,
}

impl Grid {
    /// Creates an empty grid (no terrain, no occupants).
    pub fn new(width: u32, height: u32, layers: u32, catalog: Arc<TerrainCatalog>) -> StrataResult<Self> {
        if width == 0 || height == 0 || layers == 0 {
            return Err(StrataError::InvalidArgument(format!(
                "grid dimensions must be non-zero, got {}x{}x{}",
                width, height, layers
            )));
        }

        let dims = GridDimensions::new(width, height, layers);
        let mut cells = Vec::with_capacity(dims.volume());
        for index in 0..dims.volume() {
            cells.push(Cell::new(Self::pos_of_index(&dims, index)));
        }
        let layer_size = width as usize * height as usize;

        Ok(Self {
            dims,
            catalog,
            cells,
            terrain: vec![vec![None; layer_size]; layers as usize],
        })
    }

    /// Creates a grid with the default 51×51 footprint.
    pub fn with_default_dimensions(catalog: Arc<TerrainCatalog>) -> StrataResult<Self> {
        Self::new(
            config::DEFAULT_GRID_WIDTH,
            config::DEFAULT_GRID_HEIGHT,
            config::DEFAULT_LAYER_COUNT,
            catalog,
        )
    }

    /// The grid's extents.
    pub fn dimensions(&self) -> GridDimensions {
        self.dims
    }

    /// The terrain catalog this grid resolves names through.
    pub fn catalog(&self) -> &Arc<TerrainCatalog> {
        &self.catalog
    }

    /// Whether the position lies inside the grid.
    pub fn contains(&self, pos: GridPos) -> bool {
        self.dims.contains(pos)
    }

    /// Converts a centered position to its array index.
    pub fn to_index(&self, pos: GridPos) -> StrataResult<usize> {
        if !self.contains(pos) {
            return Err(out_of_bounds(pos));
        }
        let xi = (pos.x - self.dims.min_x()) as usize;
        let yi = (pos.y - self.dims.min_y()) as usize;
        let width = self.dims.width as usize;
        let height = self.dims.height as usize;
        Ok((pos.layer as usize * height + yi) * width + xi)
    }

    /// Converts an array index back to its centered position.
    pub fn from_index(&self, index: usize) -> StrataResult<GridPos> {
        if index >= self.dims.volume() {
            return Err(StrataError::InvalidArgument(format!(
                "cell index {} exceeds grid volume {}",
                index,
                self.dims.volume()
            )));
        }
        Ok(Self::pos_of_index(&self.dims, index))
    }

    fn pos_of_index(dims: &GridDimensions, index: usize) -> GridPos {
        let width = dims.width as usize;
        let height = dims.height as usize;
        let xi = index % width;
        let yi = (index / width) % height;
        let layer = index / (width * height);
        GridPos::new(
            xi as i32 + dims.min_x(),
            yi as i32 + dims.min_y(),
            layer as i32,
        )
    }

    fn terrain_slot(&self, pos: GridPos) -> Option<(usize, usize)> {
        if !self.contains(pos) {
            return None;
        }
        let xi = (pos.x - self.dims.min_x()) as usize;
        let yi = (pos.y - self.dims.min_y()) as usize;
        Some((pos.layer as usize, yi * self.dims.width as usize + xi))
    }

    /// Gets the cell at a position.
    pub fn cell_at(&self, pos: GridPos) -> StrataResult<&Cell> {
        let index = self.to_index(pos)?;
        Ok(&self.cells[index])
    }

    /// Gets the cell at a position mutably.
    pub fn cell_at_mut(&mut self, pos: GridPos) -> StrataResult<&mut Cell> {
        let index = self.to_index(pos)?;
        Ok(&mut self.cells[index])
    }

    /// Iterates every cell in index order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Whether terrain is painted at the position. Out of range reads as void.
    pub fn has_terrain(&self, pos: GridPos) -> bool {
        self.terrain_id_at(pos).is_some()
    }

    /// Id of the terrain painted at the position, if any.
    pub fn terrain_id_at(&self, pos: GridPos) -> Option<TerrainId> {
        let (layer, slot) = self.terrain_slot(pos)?;
        self.terrain[layer][slot]
    }

    /// Definition of the terrain painted at the position, if any.
    pub fn terrain_at(&self, pos: GridPos) -> Option<&TerrainDef> {
        self.terrain_id_at(pos).and_then(|id| self.catalog.get(id))
    }

    /// Name of the terrain painted at the position, if any.
    pub fn terrain_name_at(&self, pos: GridPos) -> Option<&str> {
        self.terrain_at(pos).map(|def| def.name.as_str())
    }

    /// Continuous-space centre of a cell.
    pub fn center(&self, pos: GridPos) -> StrataResult<Point3> {
        if !self.contains(pos) {
            return Err(out_of_bounds(pos));
        }
        Ok(Point3::new(
            pos.x as f64 + 0.5,
            pos.y as f64 + 0.5,
            pos.layer as f64,
        ))
    }

    /// True when the cell has terrain and nothing is painted directly above it.
    ///
    /// A cell with terrain overhead is the underside of another floor, not a
    /// place something can stand.
    pub fn is_valid_floor(&self, pos: GridPos) -> bool {
        self.has_terrain(pos) && !self.has_terrain(pos.above())
    }

    /// Paints terrain by name.
    pub fn paint(&mut self, pos: GridPos, terrain: &str) -> StrataResult<()> {
        let id = self.catalog.id_of(terrain)?;
        self.paint_id(pos, id)
    }

    /// Paints terrain by id.
    pub fn paint_id(&mut self, pos: GridPos, id: TerrainId) -> StrataResult<()> {
        if self.catalog.get(id).is_none() {
            return Err(StrataError::InvalidArgument(format!(
                "terrain id {} is not in the catalog",
                id.0
            )));
        }
        let (layer, slot) = self.terrain_slot(pos).ok_or_else(|| out_of_bounds(pos))?;
        self.terrain[layer][slot] = Some(id);
        Ok(())
    }

    /// Removes terrain, leaving void.
    pub fn clear(&mut self, pos: GridPos) -> StrataResult<()> {
        let (layer, slot) = self.terrain_slot(pos).ok_or_else(|| out_of_bounds(pos))?;
        self.terrain[layer][slot] = None;
        Ok(())
    }

    /// Erases terrain on every layer.
    pub fn clear_all(&mut self) {
        for layer in &mut self.terrain {
            layer.fill(None);
        }
    }

    /// Paints every cell of the rectangle spanned by two corners.
    ///
    /// Both corners are inclusive and may be given in any order. They must
    /// lie on the same layer.
    pub fn fill_rectangle(&mut self, corner1: GridPos, corner2: GridPos, terrain: &str) -> StrataResult<()> {
        if corner1.layer != corner2.layer {
            return Err(StrataError::InvalidArgument(format!(
                "rectangle corners {} and {} are on different layers",
                corner1, corner2
            )));
        }
        for corner in [corner1, corner2] {
            if !self.contains(corner) {
                return Err(out_of_bounds(corner));
            }
        }

        let id = self.catalog.id_of(terrain)?;
        for y in corner1.y.min(corner2.y)..=corner1.y.max(corner2.y) {
            for x in corner1.x.min(corner2.x)..=corner1.x.max(corner2.x) {
                self.paint_id(GridPos::new(x, y, corner1.layer), id)?;
            }
        }
        Ok(())
    }

    /// Marks a cell as occupied, optionally recording the placed object.
    pub fn set_occupant(&mut self, pos: GridPos, occupancy: Occupancy, occupant: Option<OccupantId>) -> StrataResult<()> {
        let cell = self.cell_at_mut(pos)?;
        cell.occupancy = occupancy;
        cell.occupant = occupant;
        Ok(())
    }

    /// Clears whatever occupies a cell.
    pub fn clear_occupant(&mut self, pos: GridPos) -> StrataResult<()> {
        self.set_occupant(pos, Occupancy::Empty, None)
    }

    /// Clears every occupant on every layer.
    pub fn clear_occupants(&mut self) {
        for cell in &mut self.cells {
            cell.occupancy = Occupancy::Empty;
            cell.occupant = None;
        }
    }

    /// Iterates every painted position with its terrain, layer by layer.
    pub fn painted(&self) -> impl Iterator<Item = (GridPos, &TerrainDef)> + '_ {
        let width = self.dims.width as usize;
        self.terrain.iter().enumerate().flat_map(move |(layer, store)| {
            store.iter().enumerate().filter_map(move |(slot, id)| {
                let def = self.catalog.get((*id)?)?;
                let pos = GridPos::new(
                    (slot % width) as i32 + self.dims.min_x(),
                    (slot / width) as i32 + self.dims.min_y(),
                    layer as i32,
                );
                Some((pos, def))
            })
        })
    }

    /// Number of painted cells across all layers.
    pub fn painted_count(&self) -> usize {
        self.terrain
            .iter()
            .map(|layer| layer.iter().filter(|id| id.is_some()).count())
            .sum()
    }
}

fn out_of_bounds(pos: GridPos) -> StrataError {
    StrataError::OutOfBounds {
        x: pos.x,
        y: pos.y,
        layer: pos.layer,
    }
}
