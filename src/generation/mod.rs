//! # Generation Module
//!
//! Procedural level generation: room templates, rejection-sampled room
//! placement, pathfinder-carved corridors and occupant spawning.
//!
//! The generator works in strictly ordered, synchronous stages. Every grid
//! edit it makes is also recorded as a [`GenerationEvent`], so a host that
//! wants to animate the build can replay it afterwards.

pub mod corridor;
pub mod dungeon;
pub mod encounters;
pub mod events;
pub mod templates;

pub use corridor::*;
pub use dungeon::*;
pub use encounters::*;
pub use events::*;
pub use templates::*;

use crate::{config, PathCosts, StrataError, StrataResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One row of the cumulative room table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomChance {
    /// Room type selected by this row
    pub room_type: RoomType,
    /// Cumulative percentage; a roll below this value selects the row
    pub cumulative: u32,
}

impl RoomChance {
    /// Creates a table row.
    pub fn new(room_type: RoomType, cumulative: u32) -> Self {
        Self {
            room_type,
            cumulative,
        }
    }
}

/// Configuration for level generation.
///
/// Controls grid size, room count and mix, placement spread and the
/// corridor carving style. Every field has a default, so a JSON config
/// only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Grid width in cells
    pub width: u32,
    /// Grid height in cells
    pub height: u32,
    /// Number of layers
    pub layers: u32,
    /// Layer the start room is stamped on
    pub hub_layer: u32,
    /// Start room template name; the first `Small` template when unset
    pub start_room: Option<String>,
    /// Rooms to attempt after the start room
    pub room_count: u32,
    /// Offsets tried per room before it is skipped
    pub placement_attempts: u32,
    /// Cumulative percentage table, in ascending order, ending at 100
    pub room_chances: Vec<RoomChance>,
    /// Exclusive upper bound of the root of a lateral offset
    pub offset_root_max: i32,
    /// Lateral offset sum per layer of drift away from the hub layer
    pub layer_spread: i32,
    /// Terrain that reserves space between rooms and is scrubbed afterwards
    pub placeholder_terrain: String,
    /// Terrain painted along corridors
    pub floor_terrain: String,
    /// Stair painted where a corridor climbs along the x axis
    pub stair_x_terrain: String,
    /// Stair painted where a corridor climbs along the y axis
    pub stair_y_terrain: String,
    /// Paint flanking cells beside straight corridor segments
    pub widen_straight_corridors: bool,
    /// Spawn one occupant per connected room
    pub spawn_occupants: bool,
    /// Record every grid edit as a generation event
    pub record_events: bool,
    /// Cost model used to carve corridors
    pub carving_costs: PathCosts,
}

impl GenerationConfig {
    /// Creates a configuration with default settings and the given seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            width: 121,
            height: 121,
            layers: config::DEFAULT_LAYER_COUNT,
            hub_layer: 3,
            start_room: None,
            room_count: 5,
            placement_attempts: config::ROOM_PLACEMENT_ATTEMPTS,
            room_chances: vec![
                RoomChance::new(RoomType::Small, 40),
                RoomChance::new(RoomType::IShape, 65),
                RoomChance::new(RoomType::LShape, 85),
                RoomChance::new(RoomType::Large, 100),
            ],
            offset_root_max: 8,
            layer_spread: 40,
            placeholder_terrain: config::PLACEHOLDER_TERRAIN.to_string(),
            floor_terrain: "Floor".to_string(),
            stair_x_terrain: "StairX".to_string(),
            stair_y_terrain: "StairY".to_string(),
            widen_straight_corridors: true,
            spawn_occupants: true,
            record_events: true,
            carving_costs: PathCosts::for_carving(),
        }
    }

    /// Creates a configuration for testing with a smaller, single-layer grid.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            width: 61,
            height: 61,
            layers: 1,
            hub_layer: 0,
            room_count: 4,
            offset_root_max: 5,
            ..Self::new(seed)
        }
    }

    /// Loads a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> StrataResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration is internally consistent.
    pub fn validate(&self) -> StrataResult<()> {
        if self.width == 0 || self.height == 0 || self.layers == 0 {
            return Err(invalid("grid dimensions must be non-zero"));
        }
        if self.hub_layer >= self.layers {
            return Err(invalid(format!(
                "hub layer {} is outside {} layers",
                self.hub_layer, self.layers
            )));
        }
        if self.placement_attempts == 0 {
            return Err(invalid("placement_attempts must be at least 1"));
        }
        if self.offset_root_max <= 0 {
            return Err(invalid("offset_root_max must be positive"));
        }
        if self.layer_spread <= 0 {
            return Err(invalid("layer_spread must be positive"));
        }
        let reach = i64::from(self.offset_root_max - 1).pow(2);
        let extent = i64::from(self.width.max(self.height));
        if reach > extent {
            return Err(invalid(format!(
                "offset_root_max {} reaches {} cells, beyond the {}-cell grid",
                self.offset_root_max, reach, extent
            )));
        }

        let mut previous = 0;
        for chance in &self.room_chances {
            if chance.cumulative < previous {
                return Err(invalid("room_chances must be cumulative and ascending"));
            }
            previous = chance.cumulative;
        }
        if previous != 100 {
            return Err(invalid(format!("room_chances must total 100, got {}", previous)));
        }

        Ok(())
    }

    /// Picks the room type for a percentage roll in `0..100`.
    pub fn room_type_for_roll(&self, roll: u32) -> Option<RoomType> {
        self.room_chances
            .iter()
            .find(|chance| roll < chance.cumulative)
            .map(|chance| chance.room_type)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

fn invalid(reason: impl Into<String>) -> StrataError {
    StrataError::InvalidConfig(reason.into())
}

/// Trait for procedural generators.
///
/// Generators receive their configuration and random source explicitly so
/// the same generator can be driven with different seeds.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> StrataResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> StrataResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use crate::{Grid, GridPos, Pathfinder};
    use ::pathfinding::prelude::bfs_reach;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Every cell an agent can walk to from `start` without void traversal,
    /// `start` included.
    pub fn walkable_region(grid: &Grid, start: GridPos) -> Vec<GridPos> {
        let pathfinder = Pathfinder::new(grid);
        bfs_reach(start, |pos| {
            pathfinder.adjacent_cells(*pos, false).unwrap_or_default()
        })
        .collect()
    }

    /// Validates that a level has a walkable hub with nothing directly above it.
    pub fn validate_hub(grid: &Grid, hub: GridPos) -> StrataResult<()> {
        let Some(terrain) = grid.terrain_at(hub) else {
            return Err(StrataError::GenerationFailed(format!("hub {} has no floor", hub)));
        };
        if !terrain.walkable {
            return Err(StrataError::GenerationFailed(format!(
                "hub {} is covered by non-walkable {}",
                hub, terrain.name
            )));
        }
        if let Some(roof) = grid.terrain_name_at(hub.above()) {
            return Err(StrataError::GenerationFailed(format!(
                "hub {} is roofed by {} above it",
                hub, roof
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Grid, GridPos, TerrainCatalog};
    use std::sync::Arc;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(12345);
        assert_eq!(config.seed, 12345);
        assert_eq!(config.room_count, 5);
        assert_eq!(config.placement_attempts, 50);
        assert!(config.hub_layer < config.layers);
        assert!(config.validate().is_ok());
        assert!(GenerationConfig::for_testing(1).validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = GenerationConfig::new(1);
        config.hub_layer = config.layers;
        assert!(matches!(config.validate(), Err(StrataError::InvalidConfig(_))));

        let mut config = GenerationConfig::new(1);
        config.room_chances = vec![
            RoomChance::new(RoomType::Small, 60),
            RoomChance::new(RoomType::Large, 50),
        ];
        assert!(config.validate().is_err());

        let mut config = GenerationConfig::new(1);
        config.room_chances = vec![RoomChance::new(RoomType::Small, 90)];
        assert!(config.validate().is_err());

        let mut config = GenerationConfig::new(1);
        config.layer_spread = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_offset_root_is_bounded_by_grid() {
        let mut config = GenerationConfig::new(1);
        config.offset_root_max = 100_000;
        assert!(matches!(config.validate(), Err(StrataError::InvalidConfig(_))));

        config.offset_root_max = i32::MAX;
        assert!(config.validate().is_err());

        // 11^2 fits the 121-cell default, 12^2 does not.
        config.offset_root_max = 12;
        assert!(config.validate().is_ok());
        config.offset_root_max = 13;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_room_type_for_roll() {
        let config = GenerationConfig::new(1);
        assert_eq!(config.room_type_for_roll(0), Some(RoomType::Small));
        assert_eq!(config.room_type_for_roll(39), Some(RoomType::Small));
        assert_eq!(config.room_type_for_roll(40), Some(RoomType::IShape));
        assert_eq!(config.room_type_for_roll(84), Some(RoomType::LShape));
        assert_eq!(config.room_type_for_roll(99), Some(RoomType::Large));
        assert_eq!(config.room_type_for_roll(100), None);
    }

    #[test]
    fn test_partial_config_json() {
        let config: GenerationConfig = serde_json::from_str(r#"{"seed": 9, "room_count": 2}"#).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.room_count, 2);
        assert_eq!(config.width, 121);
        assert_eq!(config.carving_costs.headroom_penalty, 100);
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"seed": 3, "hub_layer": 9}"#).unwrap();
        assert!(matches!(
            GenerationConfig::load(&path),
            Err(StrataError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_utils_rng_is_seeded() {
        use rand::Rng;
        let config = GenerationConfig::new(12345);
        let a: u64 = utils::create_rng(&config).gen();
        let b: u64 = utils::create_rng(&config).gen();
        assert_eq!(a, b);
    }

    #[test]
    fn test_walkable_region() {
        let mut grid = Grid::new(11, 11, 1, Arc::new(TerrainCatalog::standard())).unwrap();
        grid.fill_rectangle(GridPos::new(-2, 0, 0), GridPos::new(2, 0, 0), "Floor")
            .unwrap();
        grid.paint(GridPos::new(4, 0, 0), "Floor").unwrap();

        let region = utils::walkable_region(&grid, GridPos::new(0, 0, 0));
        assert_eq!(region.len(), 5);
        assert!(!region.contains(&GridPos::new(4, 0, 0)));
    }

    #[test]
    fn test_validate_hub() {
        let mut grid = Grid::new(5, 5, 1, Arc::new(TerrainCatalog::standard())).unwrap();
        let hub = GridPos::origin();
        assert!(utils::validate_hub(&grid, hub).is_err());
        grid.paint(hub, "Wall").unwrap();
        assert!(utils::validate_hub(&grid, hub).is_err());
        grid.paint(hub, "Floor").unwrap();
        assert!(utils::validate_hub(&grid, hub).is_ok());
    }

    #[test]
    fn test_validate_hub_rejects_roofed_hub() {
        let mut grid = Grid::new(5, 5, 3, Arc::new(TerrainCatalog::standard())).unwrap();
        let hub = GridPos::new(0, 0, 1);
        grid.paint(hub, "Floor").unwrap();
        grid.paint(hub.above(), "Floor").unwrap();

        let err = utils::validate_hub(&grid, hub).unwrap_err();
        assert!(err.to_string().contains("roofed"), "{}", err);

        grid.clear(hub.above()).unwrap();
        assert!(utils::validate_hub(&grid, hub).is_ok());
    }
}
