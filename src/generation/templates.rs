//! # Room Templates
//!
//! Prefabricated room layouts and the library they are loaded into.
//!
//! A template maps relative cell coordinates to terrain names and names one
//! cell as its anchor, the point corridors connect to. Templates are stored
//! one per JSON file:
//!
//! ```json
//! {
//!   "name": "small_square",
//!   "room_type": "Small",
//!   "anchor": "(3, 3, 0)",
//!   "tiles": { "(0, 0, 0)": "Wall", "(1, 0, 0)": "Floor" }
//! }
//! ```

use crate::{config, Grid, GridPos, StrataError, StrataResult, TerrainCatalog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Room categories used by the weighted room table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoomType {
    /// Compact square room, also the default start room
    Small,
    /// Long straight hall
    IShape,
    /// Corner room
    LShape,
    /// Large chamber
    Large,
}

impl RoomType {
    /// All room types, in table order.
    pub fn all() -> [RoomType; 4] {
        [RoomType::Small, RoomType::IShape, RoomType::LShape, RoomType::Large]
    }
}

/// A prefabricated room layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomTemplate {
    /// Template name; defaults to the file stem when loaded from disk
    #[serde(default)]
    pub name: String,
    /// Category used by the weighted room table
    pub room_type: RoomType,
    /// Connection point, relative to the template origin
    pub anchor: GridPos,
    /// Relative cell -> terrain name
    pub tiles: BTreeMap<GridPos, String>,
}

impl RoomTemplate {
    /// Creates a template from its parts.
    pub fn new(
        name: impl Into<String>,
        room_type: RoomType,
        anchor: GridPos,
        tiles: BTreeMap<GridPos, String>,
    ) -> Self {
        Self {
            name: name.into(),
            room_type,
            anchor,
            tiles,
        }
    }

    /// Parses and validates a template.
    ///
    /// `fallback_name` is used when the JSON carries no name. Every failure
    /// is reported as [`StrataError::TemplateLoad`].
    pub fn from_json(json: &str, fallback_name: &str, catalog: &TerrainCatalog) -> StrataResult<Self> {
        let mut template: RoomTemplate =
            serde_json::from_str(json).map_err(|e| load_error(fallback_name, e))?;
        if template.name.is_empty() {
            template.name = fallback_name.to_string();
        }
        template.validate(catalog)?;
        Ok(template)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json(&self) -> StrataResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that the template is non-empty, its terrain names resolve and
    /// its anchor lies within its footprint bounds.
    pub fn validate(&self, catalog: &TerrainCatalog) -> StrataResult<()> {
        let (min, max) = self
            .bounds()
            .ok_or_else(|| load_error(&self.name, "template has no tiles"))?;

        if let Some(name) = self.tiles.values().find(|name| !catalog.contains(name)) {
            return Err(load_error(&self.name, format!("unknown terrain {:?}", name)));
        }

        let anchor = self.anchor;
        let inside = (min.x..=max.x).contains(&anchor.x)
            && (min.y..=max.y).contains(&anchor.y)
            && (min.layer..=max.layer).contains(&anchor.layer);
        if !inside {
            return Err(load_error(
                &self.name,
                format!("anchor {} lies outside the footprint {}..{}", anchor, min, max),
            ));
        }

        Ok(())
    }

    /// Smallest and largest relative coordinates used by the footprint.
    pub fn bounds(&self) -> Option<(GridPos, GridPos)> {
        let mut positions = self.tiles.keys();
        let first = *positions.next()?;
        let (min, max) = positions.fold((first, first), |(min, max), pos| {
            (
                GridPos::new(min.x.min(pos.x), min.y.min(pos.y), min.layer.min(pos.layer)),
                GridPos::new(max.x.max(pos.x), max.y.max(pos.y), max.layer.max(pos.layer)),
            )
        });
        Some((min, max))
    }

    /// Number of layers the footprint spans.
    pub fn layer_span(&self) -> i32 {
        self.bounds()
            .map(|(min, max)| max.layer - min.layer + 1)
            .unwrap_or(0)
    }

    /// Absolute cells and terrain names when placed at `offset`.
    pub fn footprint_at(&self, offset: GridPos) -> impl Iterator<Item = (GridPos, &str)> + '_ {
        self.tiles
            .iter()
            .map(move |(pos, name)| (*pos + offset, name.as_str()))
    }

    /// Whether every footprint cell is inside the grid and free of terrain.
    pub fn fits_at(&self, grid: &Grid, offset: GridPos) -> bool {
        self.footprint_at(offset)
            .all(|(pos, _)| grid.contains(pos) && !grid.has_terrain(pos))
    }

    /// Builds a template from a painted region of a grid.
    ///
    /// The region is the box spanned by the two corners, inclusive, across
    /// all layers between them. Coordinates are stored relative to the box's
    /// minimum corner and editor barrier tiles are left out. `anchor` is
    /// given in grid coordinates.
    pub fn capture(
        grid: &Grid,
        corner1: GridPos,
        corner2: GridPos,
        anchor: GridPos,
        name: impl Into<String>,
        room_type: RoomType,
    ) -> StrataResult<Self> {
        let min = GridPos::new(
            corner1.x.min(corner2.x),
            corner1.y.min(corner2.y),
            corner1.layer.min(corner2.layer),
        );
        let max = GridPos::new(
            corner1.x.max(corner2.x),
            corner1.y.max(corner2.y),
            corner1.layer.max(corner2.layer),
        );
        for corner in [min, max] {
            grid.cell_at(corner)?;
        }

        let mut tiles = BTreeMap::new();
        for layer in min.layer..=max.layer {
            for y in min.y..=max.y {
                for x in min.x..=max.x {
                    let pos = GridPos::new(x, y, layer);
                    match grid.terrain_name_at(pos) {
                        Some(name) if name != config::BARRIER_TERRAIN => {
                            tiles.insert(pos - min, name.to_string());
                        }
                        _ => {}
                    }
                }
            }
        }

        let template = Self::new(name, room_type, anchor - min, tiles);
        template.validate(grid.catalog())?;
        Ok(template)
    }

    /// Paints the template onto a grid at `offset`, overwriting what is there.
    pub fn stamp(&self, grid: &mut Grid, offset: GridPos) -> StrataResult<()> {
        for (pos, name) in self.footprint_at(offset) {
            grid.paint(pos, name)?;
        }
        Ok(())
    }
}

fn load_error(template: &str, reason: impl std::fmt::Display) -> StrataError {
    StrataError::TemplateLoad {
        template: template.to_string(),
        reason: reason.to_string(),
    }
}

/// Loaded templates grouped by room type.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    by_type: BTreeMap<RoomType, Vec<RoomTemplate>>,
    skipped: Vec<PathBuf>,
}

impl TemplateLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a library from already-built templates.
    pub fn from_templates(templates: impl IntoIterator<Item = RoomTemplate>) -> Self {
        let mut library = Self::new();
        for template in templates {
            library.add(template);
        }
        library
    }

    /// Loads every `*.json` template in a directory, in file-name order.
    ///
    /// A file that fails to parse or validate is logged and skipped; the rest
    /// of the directory still loads. Only failing to read the directory
    /// itself is an error.
    pub fn load_dir(dir: impl AsRef<Path>, catalog: &TerrainCatalog) -> StrataResult<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut library = Self::new();
        for path in paths {
            match Self::load_file(&path, catalog) {
                Ok(template) => {
                    log::debug!("loaded template {} ({:?})", template.name, template.room_type);
                    library.add(template);
                }
                Err(e) => {
                    log::warn!("skipping template {}: {}", path.display(), e);
                    library.skipped.push(path);
                }
            }
        }

        log::info!(
            "loaded {} room templates from {} ({} skipped)",
            library.len(),
            dir.display(),
            library.skipped.len()
        );
        Ok(library)
    }

    fn load_file(path: &Path, catalog: &TerrainCatalog) -> StrataResult<RoomTemplate> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let json = std::fs::read_to_string(path).map_err(|e| load_error(&stem, e))?;
        RoomTemplate::from_json(&json, &stem, catalog)
    }

    /// Writes a template to `<dir>/<name>.json` and returns the path.
    pub fn save(template: &RoomTemplate, dir: impl AsRef<Path>) -> StrataResult<PathBuf> {
        let valid_name = !template.name.is_empty()
            && !template.name.contains(['/', '\\'])
            && template.name != "."
            && template.name != "..";
        if !valid_name {
            return Err(StrataError::InvalidArgument(format!(
                "template name {:?} cannot be used as a file name",
                template.name
            )));
        }

        let path = dir.as_ref().join(format!("{}.json", template.name));
        if path.exists() {
            log::info!("overwriting template at {}", path.display());
        }
        std::fs::write(&path, template.to_json()?)?;
        Ok(path)
    }

    /// Adds a template under its room type.
    pub fn add(&mut self, template: RoomTemplate) {
        self.by_type.entry(template.room_type).or_default().push(template);
    }

    /// Templates of one room type, in load order.
    pub fn by_type(&self, room_type: RoomType) -> &[RoomTemplate] {
        self.by_type
            .get(&room_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Finds a template by name.
    pub fn get(&self, name: &str) -> Option<&RoomTemplate> {
        self.iter().find(|template| template.name == name)
    }

    /// Iterates all templates grouped by room type.
    pub fn iter(&self) -> impl Iterator<Item = &RoomTemplate> {
        self.by_type.values().flatten()
    }

    /// Files skipped by [`TemplateLibrary::load_dir`].
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    /// Total number of templates.
    pub fn len(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    /// Whether the library holds no templates.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
