//! # Grid Mathematics
//!
//! Distance metrics and a small continuous-space vector type.

use crate::GridPos;
use serde::{Deserialize, Serialize};

/// Octile distance between two lateral offsets: diagonal steps first, then
/// the straight remainder.
///
/// # Examples
///
/// ```
/// use strata::octile_distance;
///
/// // Three diagonal steps and two straight ones.
/// assert_eq!(octile_distance(5, 3, 14, 10), 3 * 14 + 2 * 10);
/// ```
pub fn octile_distance(dx: u32, dy: u32, diagonal_cost: u32, straight_cost: u32) -> u32 {
    let diagonal = dx.min(dy);
    let straight = dx.max(dy) - diagonal;
    diagonal_cost
        .saturating_mul(diagonal)
        .saturating_add(straight_cost.saturating_mul(straight))
}

/// Absolute per-axis separation of two positions.
pub fn axis_deltas(a: GridPos, b: GridPos) -> (u32, u32, u32) {
    (
        (a.x - b.x).unsigned_abs(),
        (a.y - b.y).unsigned_abs(),
        (a.layer - b.layer).unsigned_abs(),
    )
}

/// A point in continuous space; one unit is one cell, `z` counts layers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The point at a cell's integer coordinates.
    pub fn from_pos(pos: GridPos) -> Self {
        Self::new(pos.x as f64, pos.y as f64, pos.layer as f64)
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn normalized(self) -> Self {
        let length = self.length();
        if length == 0.0 {
            return Self::default();
        }
        self.scale(1.0 / length)
    }

    /// Multiplies every component by `factor`.
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Rounds each component to the nearest cell coordinate.
    pub fn round_to_pos(self) -> GridPos {
        GridPos::new(
            self.x.round() as i32,
            self.y.round() as i32,
            self.z.round() as i32,
        )
    }
}

impl std::ops::Add for Point3 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl std::ops::Sub for Point3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_octile_distance() {
        assert_eq!(octile_distance(0, 0, 14, 10), 0);
        assert_eq!(octile_distance(5, 5, 14, 10), 70);
        assert_eq!(octile_distance(4, 0, 14, 10), 40);
        assert_eq!(octile_distance(2, 7, 14, 10), 2 * 14 + 5 * 10);
    }

    #[test]
    fn test_axis_deltas() {
        let a = GridPos::new(-3, 4, 0);
        let b = GridPos::new(2, 1, 2);
        assert_eq!(axis_deltas(a, b), (5, 3, 2));
        assert_eq!(axis_deltas(b, a), (5, 3, 2));
    }

    #[test]
    fn test_point_normalize() {
        let v = Point3::new(3.0, 0.0, 4.0);
        assert_eq!(v.length(), 5.0);
        let unit = v.normalized();
        assert!((unit.length() - 1.0).abs() < 1e-12);
        assert_eq!(Point3::default().normalized(), Point3::default());
    }

    #[test]
    fn test_round_to_pos() {
        assert_eq!(
            Point3::new(1.4, -2.6, 0.5).round_to_pos(),
            GridPos::new(1, -3, 1)
        );
    }
}
