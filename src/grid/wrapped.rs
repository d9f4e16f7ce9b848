//! # Wrapped Grids
//!
//! The persisted form of painted terrain: grid dimensions plus a map from
//! `"(x, y, z)"` keys to terrain names. Names, not ids, are stored so files
//! stay valid when a catalog is reordered.

use super::{Grid, GridDimensions, GridPos};
use crate::{StrataError, StrataResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serializable snapshot of a grid's terrain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedGrid {
    pub dimensions: GridDimensions,
    pub tiles: BTreeMap<GridPos, String>,
}

impl WrappedGrid {
    /// Parses a wrapped grid from JSON.
    pub fn from_json(json: &str) -> StrataResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json(&self) -> StrataResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Grid {
    /// Captures every painted cell.
    pub fn wrap(&self) -> WrappedGrid {
        self.wrap_excluding(&[])
    }

    /// Captures every painted cell except those painted with an excluded name.
    pub fn wrap_excluding(&self, excluded: &[&str]) -> WrappedGrid {
        let tiles = self
            .painted()
            .filter(|(_, def)| !excluded.contains(&def.name.as_str()))
            .map(|(pos, def)| (pos, def.name.clone()))
            .collect();

        WrappedGrid {
            dimensions: self.dimensions(),
            tiles,
        }
    }

    /// Paints a wrapped mapping onto this grid.
    ///
    /// Every name is resolved and every key bounds-checked before anything is
    /// painted, so a bad snapshot leaves the grid untouched.
    pub fn unwrap(&mut self, wrapped: &WrappedGrid) -> StrataResult<()> {
        let mut resolved = Vec::with_capacity(wrapped.tiles.len());
        for (pos, name) in &wrapped.tiles {
            if !self.contains(*pos) {
                return Err(StrataError::OutOfBounds {
                    x: pos.x,
                    y: pos.y,
                    layer: pos.layer,
                });
            }
            resolved.push((*pos, self.catalog().id_of(name)?));
        }

        for (pos, id) in resolved {
            self.paint_id(pos, id)?;
        }
        Ok(())
    }
}
