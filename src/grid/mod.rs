//! # Grid Module
//!
//! The multi-layer tile grid and everything needed to address it.
//!
//! This module contains the fundamental building blocks of the dungeon:
//! - Centered 3D coordinates and their persisted text form
//! - The terrain catalog shared by every component
//! - Cells carrying occupancy, and the grid that owns them
//! - The wrapped (persisted) representation of painted terrain

pub mod cell;
pub mod map;
pub mod terrain;
pub mod wrapped;

pub use cell::*;
pub use map::*;
pub use terrain::*;
pub use wrapped::*;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A cell coordinate: centered `x`/`y` plus a zero-based `layer`.
///
/// The text form is `"(x, y, z)"`, which is also the key format used by
/// persisted room templates and wrapped grids.
///
/// # Examples
///
/// ```
/// use strata::GridPos;
///
/// let pos = GridPos::new(3, -2, 1);
/// assert_eq!(pos.to_string(), "(3, -2, 1)");
/// assert_eq!("(3, -2, 1)".parse::<GridPos>().unwrap(), pos);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
    pub layer: i32,
}

impl GridPos {
    /// Creates a new position with the given coordinates.
    pub const fn new(x: i32, y: i32, layer: i32) -> Self {
        Self { x, y, layer }
    }

    /// Returns the origin of the bottom layer.
    pub const fn origin() -> Self {
        Self::new(0, 0, 0)
    }

    /// Returns the same lateral position shifted by `delta` layers.
    pub fn shifted_layer(self, delta: i32) -> Self {
        Self::new(self.x, self.y, self.layer + delta)
    }

    /// Returns the cell directly above this one.
    pub fn above(self) -> Self {
        self.shifted_layer(1)
    }

    /// Returns the cell directly below this one.
    pub fn below(self) -> Self {
        self.shifted_layer(-1)
    }

    /// Returns the position moved laterally by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.layer)
    }

    /// Calculates the Chebyshev (king move) distance, ignoring layers.
    pub fn chebyshev_distance(self, other: GridPos) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx.max(dy)
    }

    /// Calculates the Euclidean distance, counting one layer as one cell.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::GridPos;
    ///
    /// let a = GridPos::new(0, 0, 0);
    /// let b = GridPos::new(3, 4, 0);
    /// assert_eq!(a.euclidean_distance(b), 5.0);
    /// ```
    pub fn euclidean_distance(self, other: GridPos) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        let dz = (self.layer - other.layer) as f64;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Returns the 8 positions surrounding this one on the same layer.
    pub fn lateral_neighbors(self) -> [GridPos; 8] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
            self.offset(-1, -1),
            self.offset(-1, 1),
            self.offset(1, -1),
            self.offset(1, 1),
        ]
    }
}

impl std::ops::Add for GridPos {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.layer + other.layer)
    }
}

impl std::ops::Sub for GridPos {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.layer - other.layer)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.layer)
    }
}

/// Error returned when a `"(x, y, z)"` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cell coordinate {input:?}: expected \"(x, y, z)\"")]
pub struct ParseGridPosError {
    pub input: String,
}

impl FromStr for GridPos {
    type Err = ParseGridPosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseGridPosError {
            input: s.to_string(),
        };

        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(err)?;

        let mut parts = inner.split(',').map(|part| part.trim().parse::<i32>());
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(x)), Some(Ok(y)), Some(Ok(layer)), None) => Ok(GridPos::new(x, y, layer)),
            _ => Err(err()),
        }
    }
}

impl Serialize for GridPos {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GridPos {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Grid extents: lateral size plus number of layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

impl GridDimensions {
    /// Creates a new set of dimensions.
    pub const fn new(width: u32, height: u32, layers: u32) -> Self {
        Self {
            width,
            height,
            layers,
        }
    }

    /// Total number of cells across every layer.
    pub fn volume(&self) -> usize {
        self.width as usize * self.height as usize * self.layers as usize
    }

    /// Smallest centered x coordinate.
    pub fn min_x(&self) -> i32 {
        -(self.width as i32 / 2)
    }

    /// Largest centered x coordinate.
    pub fn max_x(&self) -> i32 {
        self.width as i32 - 1 - self.width as i32 / 2
    }

    /// Smallest centered y coordinate.
    pub fn min_y(&self) -> i32 {
        -(self.height as i32 / 2)
    }

    /// Largest centered y coordinate.
    pub fn max_y(&self) -> i32 {
        self.height as i32 - 1 - self.height as i32 / 2
    }

    /// Index of the highest layer.
    pub fn top_layer(&self) -> i32 {
        self.layers as i32 - 1
    }

    /// Whether `(x, y)` lies inside the lateral extent, regardless of layer.
    pub fn contains_lateral(&self, x: i32, y: i32) -> bool {
        x >= self.min_x() && x <= self.max_x() && y >= self.min_y() && y <= self.max_y()
    }

    /// Whether the position lies inside the grid.
    pub fn contains(&self, pos: GridPos) -> bool {
        self.contains_lateral(pos.x, pos.y) && pos.layer >= 0 && pos.layer < self.layers as i32
    }
}
