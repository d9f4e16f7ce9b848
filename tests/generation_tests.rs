//! Integration tests for level generation with the bundled room templates.

use std::path::PathBuf;
use std::sync::Arc;
use strata::{
    generation::utils, GenerationConfig, Generator, Grid, LevelGenerator, Pathfinder, StrataResult,
    TerrainCatalog, WrappedGrid,
};

fn bundled_generator() -> StrataResult<LevelGenerator> {
    let rooms = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets").join("rooms");
    LevelGenerator::from_template_dir(Arc::new(TerrainCatalog::standard()), rooms)
}

#[test]
fn test_default_levels_leave_no_room_orphaned() -> StrataResult<()> {
    let generator = bundled_generator()?;
    for seed in [1, 42, 77] {
        let mut config = GenerationConfig::new(seed);
        config.spawn_occupants = false;

        let level = generator.generate_level(&config)?;
        generator.validate(&level.grid, &config)?;

        let report = &level.report;
        assert_eq!(report.hub.layer, config.hub_layer as i32);
        assert!(report.unreachable.is_empty(), "seed {}: orphaned {:?}", seed, report.unreachable);
        assert_eq!(report.connected.len(), report.rooms.len(), "seed {}", seed);
        assert!(level.grid.is_valid_floor(report.hub), "seed {}: hub is roofed", seed);

        let pathfinder = Pathfinder::new(&level.grid);
        for room in &report.rooms {
            assert!(level.grid.is_valid_floor(room.anchor), "seed {}: anchor {} is roofed", seed, room.anchor);
            let path = pathfinder.find_path(report.hub, room.anchor, true)?;
            assert!(path.is_some(), "seed {}: anchor {} is cut off from the hub", seed, room.anchor);
        }
    }
    Ok(())
}

#[test]
fn test_single_layer_levels_are_walkable() -> StrataResult<()> {
    let generator = bundled_generator()?;
    for seed in [5, 31, 2718] {
        let mut config = GenerationConfig::for_testing(seed);
        config.spawn_occupants = false;

        let level = generator.generate_level(&config)?;
        let report = &level.report;
        assert!(report.unreachable.is_empty(), "seed {}: orphaned {:?}", seed, report.unreachable);
        assert_eq!(report.connected.len(), report.rooms.len(), "seed {}", seed);

        let region = utils::walkable_region(&level.grid, report.hub);
        for room in &report.rooms {
            assert!(region.contains(&room.anchor), "seed {}: anchor {} is not walkable from the hub", seed, room.anchor);
        }
    }
    Ok(())
}

#[test]
fn test_generation_is_deterministic_per_seed() -> StrataResult<()> {
    let generator = bundled_generator()?;
    let config = GenerationConfig::new(1234);

    let first = generator.generate_level(&config)?;
    let second = generator.generate_level(&config)?;
    assert_eq!(first.grid.wrap(), second.grid.wrap());
    assert_eq!(first.report, second.report);
    assert_eq!(first.placements, second.placements);

    let mut rng = utils::create_rng(&config);
    let via_trait = generator.generate(&config, &mut rng)?;
    assert_eq!(via_trait.wrap(), first.grid.wrap());
    Ok(())
}

#[test]
fn test_saved_level_loads_back() -> StrataResult<()> {
    let dir = tempfile::tempdir()?;
    let generator = bundled_generator()?;
    let config = GenerationConfig::new(7);
    let level = generator.generate_level(&config)?;

    let path = dir.path().join("level.json");
    std::fs::write(&path, level.grid.wrap().to_json()?)?;

    let wrapped = WrappedGrid::from_json(&std::fs::read_to_string(&path)?)?;
    assert_eq!(wrapped.dimensions, level.grid.dimensions());

    let mut restored = Grid::new(
        wrapped.dimensions.width,
        wrapped.dimensions.height,
        wrapped.dimensions.layers,
        Arc::clone(generator.catalog()),
    )?;
    restored.unwrap(&wrapped)?;
    assert_eq!(restored.wrap(), level.grid.wrap());
    Ok(())
}
