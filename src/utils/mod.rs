//! # Utilities Module
//!
//! Grid mathematics, pathfinding, and line of sight.

pub mod math;
pub mod pathfinding;
pub mod visibility;

pub use self::math::*;
pub use self::pathfinding::*;
pub use self::visibility::*;
