//! # Strata
//!
//! Simulation core for a multi-layer, grid-based dungeon.
//!
//! ## Architecture Overview
//!
//! The crate is built from four tightly coupled pieces:
//!
//! - **Grid**: a fixed `width × height × layers` array of cells with per-layer
//!   terrain, addressed by centered coordinates
//! - **Pathfinder**: A* search with stair-aware layer transitions and optional
//!   traversal of void (untiled) cells
//! - **Visibility**: ray-marched line of sight with a configurable obstruction
//!   policy
//! - **Generation**: room templates stamped by rejection sampling, then stitched
//!   together with corridors carved by the pathfinder
//!
//! Generation never yields mid-build. Every grid edit is recorded as a
//! [`GenerationEvent`] so a host can replay the build at its own pace.

pub mod generation;
pub mod grid;
pub mod rendering;
pub mod utils;

pub use generation::*;
pub use grid::*;
pub use rendering::*;
pub use utils::*;

/// Core error type for the Strata engine.
#[derive(thiserror::Error, Debug)]
pub enum StrataError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A coordinate fell outside the grid
    #[error("Position ({x}, {y}, {layer}) is out of bounds")]
    OutOfBounds { x: i32, y: i32, layer: i32 },

    /// A terrain name has no entry in the catalog
    #[error("Unknown terrain: {0}")]
    UnknownTerrain(String),

    /// Two catalog entries share a name
    #[error("Duplicate terrain name: {0}")]
    DuplicateTerrain(String),

    /// A room template could not be read or resolved
    #[error("Failed to load template {template}: {reason}")]
    TemplateLoad { template: String, reason: String },

    /// A caller passed an argument the operation cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration values are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Strata codebase.
pub type StrataResult<T> = Result<T, StrataError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine configuration constants.
pub mod config {
    /// Default grid width in cells
    pub const DEFAULT_GRID_WIDTH: u32 = 51;

    /// Default grid height in cells
    pub const DEFAULT_GRID_HEIGHT: u32 = 51;

    /// Default number of vertical layers
    pub const DEFAULT_LAYER_COUNT: u32 = 6;

    /// Upper bound on A* node expansions before a search gives up
    pub const MAX_SEARCH_ITERATIONS: u32 = 100_000;

    /// Attempts made to place a single room before it is skipped
    pub const ROOM_PLACEMENT_ATTEMPTS: u32 = 50;

    /// Terrain used by templates to reserve space between rooms
    pub const PLACEHOLDER_TERRAIN: &str = "OccupiedSpace";

    /// Editor-only border terrain, never persisted into templates
    pub const BARRIER_TERRAIN: &str = "Barrier";
}
