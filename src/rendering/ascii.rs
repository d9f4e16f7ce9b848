//! # ASCII Rendering
//!
//! Text dump of grid layers using each terrain's catalog glyph.

use crate::{Grid, GridPos, StrataError, StrataResult};
use std::fmt::Write;

/// Renders grid layers as text.
///
/// Rows run from the largest `y` at the top to the smallest at the bottom.
/// Void cells use `void_glyph`, occupied cells `occupant_glyph`, and marked
/// cells their marker glyph, which wins over everything else.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use strata::{AsciiRenderer, Grid, GridPos, TerrainCatalog};
///
/// let mut grid = Grid::new(3, 3, 1, Arc::new(TerrainCatalog::standard())).unwrap();
/// grid.fill_rectangle(GridPos::new(-1, 0, 0), GridPos::new(1, 0, 0), "Floor").unwrap();
/// grid.paint(GridPos::new(1, 1, 0), "Wall").unwrap();
///
/// let text = AsciiRenderer::new().render_layer(&grid, 0).unwrap();
/// assert_eq!(text, "  #\n...\n   \n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiRenderer {
    pub void_glyph: char,
    pub occupant_glyph: char,
    markers: Vec<(GridPos, char)>,
}

impl AsciiRenderer {
    /// Creates a renderer with blank void and `E` for occupants.
    pub fn new() -> Self {
        Self {
            void_glyph: ' ',
            occupant_glyph: 'E',
            markers: Vec::new(),
        }
    }

    /// Marks a cell with a glyph of its own.
    pub fn with_marker(mut self, pos: GridPos, glyph: char) -> Self {
        self.markers.push((pos, glyph));
        self
    }

    /// Renders one layer.
    pub fn render_layer(&self, grid: &Grid, layer: i32) -> StrataResult<String> {
        let dims = grid.dimensions();
        if !(0..=dims.top_layer()).contains(&layer) {
            return Err(StrataError::InvalidArgument(format!(
                "layer {} is outside 0..={}",
                layer,
                dims.top_layer()
            )));
        }

        let mut out = String::with_capacity((dims.width as usize + 1) * dims.height as usize);
        for y in (dims.min_y()..=dims.max_y()).rev() {
            for x in dims.min_x()..=dims.max_x() {
                out.push(self.glyph_at(grid, GridPos::new(x, y, layer))?);
            }
            out.push('\n');
        }
        Ok(out)
    }

    /// Renders every layer, top layer first, each under a header line.
    pub fn render_all(&self, grid: &Grid) -> StrataResult<String> {
        let mut out = String::new();
        for layer in (0..=grid.dimensions().top_layer()).rev() {
            // Writing into a String cannot fail.
            let _ = writeln!(out, "== layer {} ==", layer);
            out.push_str(&self.render_layer(grid, layer)?);
        }
        Ok(out)
    }

    fn glyph_at(&self, grid: &Grid, pos: GridPos) -> StrataResult<char> {
        if let Some((_, glyph)) = self.markers.iter().find(|(marked, _)| *marked == pos) {
            return Ok(*glyph);
        }
        if grid.cell_at(pos)?.is_occupied() {
            return Ok(self.occupant_glyph);
        }
        Ok(grid
            .terrain_at(pos)
            .map(|terrain| terrain.glyph)
            .unwrap_or(self.void_glyph))
    }
}

impl Default for AsciiRenderer {
    fn default() -> Self {
        Self::new()
    }
}
