//! # Terrain Catalog
//!
//! Terrain definitions and the name-keyed catalog that resolves them.
//!
//! Terrain is never stored on a cell. The grid keeps a compact [`TerrainId`]
//! per painted location and resolves it through the catalog, so one catalog is
//! shared read-only by the grid, the pathfinder and the generator.

use crate::{StrataError, StrataResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Dense index of a terrain definition inside its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TerrainId(pub u16);

/// Properties of one kind of terrain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainDef {
    /// Unique name, used as the persisted identifier
    pub name: String,
    /// Whether agents may stand on this terrain
    #[serde(default = "default_walkable")]
    pub walkable: bool,
    /// Whether this terrain connects to the layer above/below (a stair)
    #[serde(default)]
    pub stair: bool,
    /// Marks a level goal tile
    #[serde(default)]
    pub goal: bool,
    /// Character used by the text renderer
    #[serde(default = "default_glyph")]
    pub glyph: char,
}

fn default_walkable() -> bool {
    true
}

fn default_glyph() -> char {
    '?'
}

impl TerrainDef {
    /// Creates a plain walkable terrain.
    pub fn floor(name: impl Into<String>, glyph: char) -> Self {
        Self {
            name: name.into(),
            walkable: true,
            stair: false,
            goal: false,
            glyph,
        }
    }

    /// Creates a terrain that blocks movement.
    pub fn solid(name: impl Into<String>, glyph: char) -> Self {
        Self {
            walkable: false,
            ..Self::floor(name, glyph)
        }
    }

    /// Creates a walkable terrain that allows layer traversal.
    pub fn stair(name: impl Into<String>, glyph: char) -> Self {
        Self {
            stair: true,
            ..Self::floor(name, glyph)
        }
    }
}

/// Read-only mapping from terrain name to definition.
///
/// # Examples
///
/// ```
/// use strata::TerrainCatalog;
///
/// let catalog = TerrainCatalog::standard();
/// let stair = catalog.by_name("StairX").unwrap();
/// assert!(stair.stair);
/// assert!(catalog.by_name("Lava").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct TerrainCatalog {
    defs: Vec<TerrainDef>,
    by_name: HashMap<String, TerrainId>,
}

impl TerrainCatalog {
    /// Builds a catalog, rejecting duplicate names.
    pub fn new(defs: Vec<TerrainDef>) -> StrataResult<Self> {
        if defs.len() > u16::MAX as usize {
            return Err(StrataError::InvalidConfig(format!(
                "terrain catalog holds {} entries, at most {} are supported",
                defs.len(),
                u16::MAX
            )));
        }

        let mut by_name = HashMap::with_capacity(defs.len());
        for (index, def) in defs.iter().enumerate() {
            if by_name
                .insert(def.name.clone(), TerrainId(index as u16))
                .is_some()
            {
                return Err(StrataError::DuplicateTerrain(def.name.clone()));
            }
        }

        Ok(Self { defs, by_name })
    }

    /// The terrain set used by the bundled room templates.
    pub fn standard() -> Self {
        let defs = vec![
            TerrainDef::floor("Floor", '.'),
            TerrainDef::solid("Wall", '#'),
            TerrainDef::stair("StairX", '='),
            TerrainDef::stair("StairY", 'H'),
            TerrainDef::floor(crate::config::PLACEHOLDER_TERRAIN, ','),
            TerrainDef::solid(crate::config::BARRIER_TERRAIN, 'X'),
            TerrainDef {
                goal: true,
                ..TerrainDef::floor("Goal", '*')
            },
        ];
        // Names above are distinct, so the index can be built directly.
        let by_name = defs
            .iter()
            .enumerate()
            .map(|(index, def)| (def.name.clone(), TerrainId(index as u16)))
            .collect();
        Self { defs, by_name }
    }

    /// Parses a catalog from a JSON array of terrain definitions.
    pub fn from_json(json: &str) -> StrataResult<Self> {
        let defs: Vec<TerrainDef> = serde_json::from_str(json)?;
        Self::new(defs)
    }

    /// Loads a catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> StrataResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Looks up a definition by name.
    pub fn by_name(&self, name: &str) -> StrataResult<&TerrainDef> {
        self.id_of(name).map(|id| &self.defs[id.0 as usize])
    }

    /// Resolves a name to its id.
    pub fn id_of(&self, name: &str) -> StrataResult<TerrainId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| StrataError::UnknownTerrain(name.to_string()))
    }

    /// Looks up a definition by id.
    pub fn get(&self, id: TerrainId) -> Option<&TerrainDef> {
        self.defs.get(id.0 as usize)
    }

    /// Whether a terrain with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Iterates definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = (TerrainId, &TerrainDef)> {
        self.defs
            .iter()
            .enumerate()
            .map(|(index, def)| (TerrainId(index as u16), def))
    }
}

impl Default for TerrainCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
