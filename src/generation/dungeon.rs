//! # Level Generation
//!
//! Builds a level from prefabricated rooms.
//!
//! The generator:
//! 1. Clears the grid
//! 2. Stamps the start room, whose anchor becomes the hub
//! 3. Places further rooms by rejection sampling around the hub
//! 4. Scrubs the placeholder tiles that kept rooms apart
//! 5. Carves a corridor from each room anchor to the hub, nearest first,
//!    then clears the headroom above the hub and every anchor
//! 6. Optionally spawns one occupant per connected room

use super::{
    clear_headroom, in_headroom, utils, Canvas, CorridorPlan, CorridorTerrain, EncounterSpawner, GenerationConfig, GenerationEvent,
    Generator, OccupantPlacement, OccupantSink, RoomTemplate, RoomType, TemplateLibrary,
};
use crate::{Grid, GridPos, OccupantId, Pathfinder, StrataError, StrataResult, TerrainCatalog};
use rand::{rngs::StdRng, Rng};
use std::path::Path;
use std::sync::Arc;

/// A room stamped into the level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedRoom {
    pub template: String,
    pub room_type: RoomType,
    /// Grid position of the template origin
    pub offset: GridPos,
    /// Grid position of the room's anchor
    pub anchor: GridPos,
}

/// Summary of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelReport {
    /// Anchor of the start room
    pub hub: GridPos,
    /// Rooms placed after the start room, in placement order
    pub rooms: Vec<PlacedRoom>,
    /// Rooms that ran out of placement attempts or had no template
    pub skipped_rooms: u32,
    /// Anchors joined to the hub, in connection order
    pub connected: Vec<GridPos>,
    /// Anchors no corridor could reach
    pub unreachable: Vec<GridPos>,
    /// Ids of spawned occupants
    pub occupants: Vec<OccupantId>,
    /// Every edit, in the order it was made
    pub events: Vec<GenerationEvent>,
}

/// A finished level with its report and spawned occupants.
#[derive(Debug, Clone)]
pub struct GeneratedLevel {
    pub grid: Grid,
    pub report: LevelReport,
    pub placements: Vec<OccupantPlacement>,
}

/// Room-and-corridor level generator.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use std::sync::Arc;
/// use strata::{GenerationConfig, GridPos, LevelGenerator, RoomTemplate, RoomType, TemplateLibrary, TerrainCatalog};
///
/// let mut tiles = BTreeMap::new();
/// for y in 0..3 {
///     for x in 0..3 {
///         tiles.insert(GridPos::new(x, y, 0), "Floor".to_string());
///     }
/// }
/// let room = RoomTemplate::new("tiny", RoomType::Small, GridPos::new(1, 1, 0), tiles);
/// let generator = LevelGenerator::new(
///     Arc::new(TerrainCatalog::standard()),
///     TemplateLibrary::from_templates(vec![room]),
/// );
///
/// let level = generator.generate_level(&GenerationConfig::for_testing(1)).unwrap();
/// assert_eq!(level.report.hub, GridPos::new(1, 1, 0));
/// assert!(level.grid.has_terrain(level.report.hub));
/// ```
#[derive(Debug, Clone)]
pub struct LevelGenerator {
    catalog: Arc<TerrainCatalog>,
    templates: TemplateLibrary,
    spawner: EncounterSpawner,
}

impl LevelGenerator {
    /// Creates a generator from a catalog and loaded templates.
    pub fn new(catalog: Arc<TerrainCatalog>, templates: TemplateLibrary) -> Self {
        Self {
            catalog,
            templates,
            spawner: EncounterSpawner::default(),
        }
    }

    /// Creates a generator loading templates from a directory.
    pub fn from_template_dir(catalog: Arc<TerrainCatalog>, dir: impl AsRef<Path>) -> StrataResult<Self> {
        let templates = TemplateLibrary::load_dir(dir, &catalog)?;
        Ok(Self::new(catalog, templates))
    }

    /// Replaces the occupant spawner.
    pub fn with_spawner(mut self, spawner: EncounterSpawner) -> Self {
        self.spawner = spawner;
        self
    }

    /// The terrain catalog new grids are built with.
    pub fn catalog(&self) -> &Arc<TerrainCatalog> {
        &self.catalog
    }

    /// The loaded templates.
    pub fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    /// Builds a level on a fresh grid sized by the config, seeded from the
    /// config seed, collecting occupants into the result.
    pub fn generate_level(&self, config: &GenerationConfig) -> StrataResult<GeneratedLevel> {
        let mut rng = utils::create_rng(config);
        let mut grid = Grid::new(config.width, config.height, config.layers, Arc::clone(&self.catalog))?;
        let mut placements = Vec::new();
        let report = self.generate_into(&mut grid, config, &mut rng, &mut placements)?;
        Ok(GeneratedLevel {
            grid,
            report,
            placements,
        })
    }

    /// Builds a level into an existing grid.
    ///
    /// Room placement failures and unreachable anchors are not errors; they
    /// are logged and counted in the report. The build fails when the config
    /// is invalid, the start room is missing or does not fit, or a terrain
    /// name does not resolve.
    pub fn generate_into(
        &self,
        grid: &mut Grid,
        config: &GenerationConfig,
        rng: &mut StdRng,
        sink: &mut dyn OccupantSink,
    ) -> StrataResult<LevelReport> {
        config.validate()?;
        let corridor_terrain = CorridorTerrain::resolve(
            grid.catalog(),
            &config.floor_terrain,
            &config.stair_x_terrain,
            &config.stair_y_terrain,
        )?;

        let mut canvas = Canvas::new(grid, config.record_events);
        canvas.clear_all();
        canvas.grid_mut().clear_occupants();

        let hub = self.seed_start_room(&mut canvas, config)?;
        let (rooms, skipped_rooms) = self.populate(&mut canvas, config, hub, rng)?;
        self.scrub_placeholders(&mut canvas, config)?;

        let anchors: Vec<GridPos> = rooms.iter().map(|room| room.anchor).collect();
        let (connected, unreachable) = self.connect(&mut canvas, config, corridor_terrain, hub, anchors)?;

        let occupants = if config.spawn_occupants {
            self.spawner.spawn(&mut canvas, &connected, rng, sink)?
        } else {
            Vec::new()
        };

        log::info!(
            "generated level: {} rooms placed, {} skipped, {} connected, {} unreachable, {} occupants",
            rooms.len(),
            skipped_rooms,
            connected.len(),
            unreachable.len(),
            occupants.len()
        );

        Ok(LevelReport {
            hub,
            rooms,
            skipped_rooms,
            connected,
            unreachable,
            occupants,
            events: canvas.into_events(),
        })
    }

    /// The configured start template, or the first `Small` one.
    pub fn start_template(&self, config: &GenerationConfig) -> StrataResult<&RoomTemplate> {
        match &config.start_room {
            Some(name) => self.templates.get(name).ok_or_else(|| {
                StrataError::GenerationFailed(format!("start room template {:?} is not loaded", name))
            }),
            None => self.templates.by_type(RoomType::Small).first().ok_or_else(|| {
                StrataError::GenerationFailed("no Small template to start from".to_string())
            }),
        }
    }

    /// Where the start room is stamped.
    pub fn hub_offset(config: &GenerationConfig) -> GridPos {
        GridPos::new(0, 0, config.hub_layer as i32)
    }

    fn seed_start_room(&self, canvas: &mut Canvas<'_>, config: &GenerationConfig) -> StrataResult<GridPos> {
        let template = self.start_template(config)?;
        let offset = Self::hub_offset(config);
        if !template.fits_at(canvas.grid(), offset) {
            return Err(StrataError::GenerationFailed(format!(
                "start room {} does not fit at {}",
                template.name, offset
            )));
        }

        let hub = offset + template.anchor;
        stamp(canvas, template, offset)?;
        log::debug!("start room {} stamped, hub at {}", template.name, hub);
        Ok(hub)
    }

    fn populate(
        &self,
        canvas: &mut Canvas<'_>,
        config: &GenerationConfig,
        hub: GridPos,
        rng: &mut StdRng,
    ) -> StrataResult<(Vec<PlacedRoom>, u32)> {
        let mut rooms = Vec::new();
        let mut reserved = vec![hub];
        let mut skipped = 0;
        let top_layer = canvas.grid().dimensions().top_layer();

        for index in 0..config.room_count {
            let roll = rng.gen_range(0..100);
            let Some(room_type) = config.room_type_for_roll(roll) else {
                skipped += 1;
                continue;
            };

            let candidates = self.templates.by_type(room_type);
            if candidates.is_empty() {
                log::warn!("room {} skipped: no {:?} templates loaded", index, room_type);
                skipped += 1;
                continue;
            }
            let template = &candidates[rng.gen_range(0..candidates.len())];

            let mut placed = None;
            for _ in 0..config.placement_attempts {
                let dx = rng.gen_range(-1i32..=1) * rng.gen_range(0..config.offset_root_max).pow(2);
                let dy = rng.gen_range(-1i32..=1) * rng.gen_range(0..config.offset_root_max).pow(2);
                let layer = (config.hub_layer as i32 + (dx + dy) / config.layer_spread + rng.gen_range(-2i32..=1))
                    .clamp(0, top_layer);
                let offset = GridPos::new(dx, dy, layer);

                if template.fits_at(canvas.grid(), offset) && keeps_headroom(template, offset, &reserved) {
                    placed = Some(offset);
                    break;
                }
            }

            match placed {
                Some(offset) => {
                    stamp(canvas, template, offset)?;
                    log::debug!("room {} ({}) placed at {}", index, template.name, offset);
                    reserved.push(offset + template.anchor);
                    rooms.push(PlacedRoom {
                        template: template.name.clone(),
                        room_type,
                        offset,
                        anchor: offset + template.anchor,
                    });
                }
                None => {
                    log::debug!(
                        "room {} ({}) skipped after {} attempts",
                        index,
                        template.name,
                        config.placement_attempts
                    );
                    skipped += 1;
                }
            }
        }

        Ok((rooms, skipped))
    }

    fn scrub_placeholders(&self, canvas: &mut Canvas<'_>, config: &GenerationConfig) -> StrataResult<()> {
        let placeholders: Vec<GridPos> = canvas
            .grid()
            .painted()
            .filter(|(_, def)| def.name == config.placeholder_terrain)
            .map(|(pos, _)| pos)
            .collect();

        for &pos in &placeholders {
            canvas.erase(pos)?;
        }
        log::debug!("scrubbed {} placeholder cells", placeholders.len());
        Ok(())
    }

    fn connect(
        &self,
        canvas: &mut Canvas<'_>,
        config: &GenerationConfig,
        terrain: CorridorTerrain,
        hub: GridPos,
        mut pending: Vec<GridPos>,
    ) -> StrataResult<(Vec<GridPos>, Vec<GridPos>)> {
        let mut protected = pending.clone();
        protected.push(hub);

        let mut connected = Vec::new();
        let mut unreachable = Vec::new();

        while let Some(index) = nearest(&pending, hub) {
            let anchor = pending.remove(index);

            let path = Pathfinder::with_costs(canvas.grid(), config.carving_costs).find_path(anchor, hub, true)?;
            let Some(path) = path else {
                log::warn!("no corridor from {} to hub {}", anchor, hub);
                unreachable.push(anchor);
                continue;
            };

            let plan = CorridorPlan::from_path(canvas.grid(), &path, config.widen_straight_corridors);
            plan.apply(canvas, terrain, &protected)?;
            canvas.record(GenerationEvent::CorridorCarved {
                from: anchor,
                to: hub,
                cells: plan.painted_len(),
            });
            log::debug!("corridor {} -> {} ({} cells, cost {})", anchor, hub, path.len(), path.cost);
            connected.push(anchor);
        }

        for &pos in &protected {
            clear_headroom(canvas, pos, &protected)?;
        }

        Ok((connected, unreachable))
    }
}

/// Index of the anchor closest to the hub; the earliest wins ties.
fn nearest(anchors: &[GridPos], hub: GridPos) -> Option<usize> {
    anchors
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.euclidean_distance(hub).total_cmp(&b.euclidean_distance(hub)))
        .map(|(index, _)| index)
}

/// Whether a room at `offset` leaves the headroom of every reserved cell free,
/// and has no reserved cell in its own anchor's headroom.
fn keeps_headroom(template: &RoomTemplate, offset: GridPos, reserved: &[GridPos]) -> bool {
    let anchor = offset + template.anchor;
    if reserved.iter().any(|&cell| in_headroom(anchor, cell)) {
        return false;
    }
    !template
        .footprint_at(offset)
        .any(|(pos, _)| reserved.iter().any(|&cell| in_headroom(cell, pos)))
}

fn stamp(canvas: &mut Canvas<'_>, template: &RoomTemplate, offset: GridPos) -> StrataResult<()> {
    for (pos, name) in template.footprint_at(offset) {
        let id = canvas.grid().catalog().id_of(name)?;
        canvas.paint(pos, id)?;
    }
    canvas.record(GenerationEvent::RoomPlaced {
        template: template.name.clone(),
        offset,
        anchor: offset + template.anchor,
    });
    Ok(())
}

impl Generator<Grid> for LevelGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> StrataResult<Grid> {
        let mut grid = Grid::new(config.width, config.height, config.layers, Arc::clone(&self.catalog))?;
        let mut placements: Vec<OccupantPlacement> = Vec::new();
        self.generate_into(&mut grid, config, rng, &mut placements)?;
        Ok(grid)
    }

    fn validate(&self, grid: &Grid, config: &GenerationConfig) -> StrataResult<()> {
        let hub = Self::hub_offset(config) + self.start_template(config)?.anchor;
        utils::validate_hub(grid, hub)
    }

    fn generator_type(&self) -> &'static str {
        "LevelGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PLACEHOLDER_TERRAIN;
    use crate::RoomChance;
    use std::collections::BTreeMap;

    /// A square room: placeholder margin, walls with a doorway in each side,
    /// floor inside, anchor in the middle.
    fn room(name: &str, room_type: RoomType, size: i32) -> RoomTemplate {
        let mid = size / 2;
        let mut tiles = BTreeMap::new();
        for y in 0..size {
            for x in 0..size {
                let ring = x.min(y).min(size - 1 - x).min(size - 1 - y);
                let doorway = x == mid || y == mid;
                let terrain = match ring {
                    0 => PLACEHOLDER_TERRAIN,
                    1 if !doorway => "Wall",
                    _ => "Floor",
                };
                tiles.insert(GridPos::new(x, y, 0), terrain.to_string());
            }
        }
        RoomTemplate::new(name, room_type, GridPos::new(mid, mid, 0), tiles)
    }

    /// A walled room with no way out.
    fn sealed(name: &str, room_type: RoomType) -> RoomTemplate {
        let mut tiles = BTreeMap::new();
        for y in 0..5 {
            for x in 0..5 {
                let edge = x == 0 || y == 0 || x == 4 || y == 4;
                let terrain = if edge { "Wall" } else { "Floor" };
                tiles.insert(GridPos::new(x, y, 0), terrain.to_string());
            }
        }
        RoomTemplate::new(name, room_type, GridPos::new(2, 2, 0), tiles)
    }

    fn generator(templates: Vec<RoomTemplate>) -> LevelGenerator {
        LevelGenerator::new(
            Arc::new(TerrainCatalog::standard()),
            TemplateLibrary::from_templates(templates),
        )
    }

    fn standard_generator() -> LevelGenerator {
        generator(vec![
            room("hub", RoomType::Small, 9),
            room("small", RoomType::Small, 7),
            room("hall", RoomType::IShape, 9),
            room("corner", RoomType::LShape, 11),
            room("large", RoomType::Large, 13),
        ])
    }

    #[test]
    fn test_generation_with_small_level() {
        let mut config = GenerationConfig::for_testing(12345);
        config.spawn_occupants = false;
        let level = standard_generator().generate_level(&config).unwrap();
        let report = &level.report;

        assert_eq!(report.hub, GridPos::new(4, 4, 0));
        assert!(level.grid.is_valid_floor(report.hub));
        assert_eq!(report.rooms.len() as u32 + report.skipped_rooms, config.room_count);
        assert_eq!(report.connected.len() + report.unreachable.len(), report.rooms.len());
        assert!(report.occupants.is_empty());
        assert!(level.placements.is_empty());

        assert!(level
            .grid
            .painted()
            .all(|(_, def)| def.name != PLACEHOLDER_TERRAIN));
    }

    #[test]
    fn test_single_layer_rooms_are_walkable_from_hub() {
        let mut config = GenerationConfig::for_testing(777);
        config.spawn_occupants = false;
        let level = standard_generator().generate_level(&config).unwrap();
        let pathfinder = Pathfinder::new(&level.grid);
        assert!(level.report.unreachable.is_empty());
        assert_eq!(level.report.connected.len(), level.report.rooms.len());

        for &anchor in &level.report.connected {
            let path = pathfinder.find_path(level.report.hub, anchor, false).unwrap();
            assert!(path.is_some(), "anchor {} is cut off from the hub", anchor);
        }
    }

    #[test]
    fn test_same_seed_same_level() {
        let generator = standard_generator();
        let config = GenerationConfig::for_testing(99);
        let a = generator.generate_level(&config).unwrap();
        let b = generator.generate_level(&config).unwrap();

        assert_eq!(a.grid.wrap(), b.grid.wrap());
        assert_eq!(a.report, b.report);
        assert_eq!(a.placements, b.placements);
    }

    #[test]
    fn test_events_replay_to_the_same_terrain() {
        let config = GenerationConfig::for_testing(5);
        let level = standard_generator().generate_level(&config).unwrap();

        let mut replay = Grid::new(config.width, config.height, config.layers, Arc::new(TerrainCatalog::standard()))
            .unwrap();
        for event in &level.report.events {
            match event {
                GenerationEvent::Cleared => replay.clear_all(),
                GenerationEvent::Painted { pos, terrain } => replay.paint(*pos, terrain).unwrap(),
                GenerationEvent::Erased { pos } => replay.clear(*pos).unwrap(),
                _ => {}
            }
        }
        assert_eq!(replay.wrap(), level.grid.wrap());
        assert_eq!(level.report.events.first(), Some(&GenerationEvent::Cleared));
    }

    #[test]
    fn test_one_occupant_per_connected_room() {
        let config = GenerationConfig::for_testing(31);
        let level = standard_generator().generate_level(&config).unwrap();

        assert_eq!(level.placements.len(), level.report.connected.len());
        assert_eq!(level.report.occupants.len(), level.report.connected.len());
        for placement in &level.placements {
            let cell = level.grid.cell_at(placement.pos).unwrap();
            assert_eq!(cell.occupant, Some(placement.descriptor.id));
        }
    }

    #[test]
    fn test_sealed_room_is_reported_unreachable() {
        let mut config = GenerationConfig::for_testing(8);
        config.room_count = 1;
        config.room_chances = vec![RoomChance::new(RoomType::Large, 100)];
        let generator = generator(vec![room("hub", RoomType::Small, 9), sealed("vault", RoomType::Large)]);

        let level = generator.generate_level(&config).unwrap();
        assert_eq!(level.report.rooms.len(), 1);
        assert!(level.report.connected.is_empty());
        assert_eq!(level.report.unreachable, vec![level.report.rooms[0].anchor]);
        assert!(level.placements.is_empty());
    }

    #[test]
    fn test_missing_start_room() {
        let mut config = GenerationConfig::for_testing(1);
        config.start_room = Some("nowhere".to_string());
        assert!(matches!(
            standard_generator().generate_level(&config),
            Err(StrataError::GenerationFailed(_))
        ));

        let only_large = generator(vec![room("large", RoomType::Large, 13)]);
        assert!(matches!(
            only_large.generate_level(&GenerationConfig::for_testing(1)),
            Err(StrataError::GenerationFailed(_))
        ));
    }

    #[test]
    fn test_named_start_room() {
        let mut config = GenerationConfig::for_testing(1);
        config.start_room = Some("large".to_string());
        let level = standard_generator().generate_level(&config).unwrap();
        assert_eq!(level.report.hub, GridPos::new(6, 6, 0));
    }

    #[test]
    fn test_missing_room_type_is_skipped() {
        let mut config = GenerationConfig::for_testing(3);
        config.room_chances = vec![RoomChance::new(RoomType::IShape, 100)];
        let level = generator(vec![room("hub", RoomType::Small, 9)])
            .generate_level(&config)
            .unwrap();
        assert!(level.report.rooms.is_empty());
        assert_eq!(level.report.skipped_rooms, config.room_count);
    }

    #[test]
    fn test_multi_layer_anchors_reachable_with_void() {
        let mut config = GenerationConfig::for_testing(2024);
        config.layers = 4;
        config.hub_layer = 2;
        config.layer_spread = 8;
        config.spawn_occupants = false;
        let level = standard_generator().generate_level(&config).unwrap();
        let pathfinder = Pathfinder::new(&level.grid);
        assert!(level.report.unreachable.is_empty());
        assert_eq!(level.report.connected.len(), level.report.rooms.len());

        for &anchor in &level.report.connected {
            let path = pathfinder.find_path(level.report.hub, anchor, true).unwrap();
            assert!(path.is_some(), "anchor {} is cut off from the hub", anchor);
        }
        assert!(level.report.rooms.iter().all(|room| (0..4).contains(&room.offset.layer)));
        assert!(level.grid.is_valid_floor(level.report.hub));
        for room in &level.report.rooms {
            assert!(level.grid.is_valid_floor(room.anchor), "anchor {} is roofed", room.anchor);
        }
    }

    #[test]
    fn test_rooms_never_roof_the_hub() {
        let mut config = GenerationConfig::for_testing(6);
        config.layers = 3;
        config.hub_layer = 1;
        config.offset_root_max = 1;
        config.room_chances = vec![RoomChance::new(RoomType::Large, 100)];
        let generator = generator(vec![room("hub", RoomType::Small, 9), room("large", RoomType::Large, 13)]);

        let level = generator.generate_level(&config).unwrap();
        let report = &level.report;

        // Directly above the hub is refused, directly below is allowed once.
        assert_eq!(report.rooms.len(), 1);
        let below = &report.rooms[0];
        assert_eq!(below.offset, GridPos::new(0, 0, 0));
        assert_eq!(report.connected, vec![below.anchor]);

        assert!(level.grid.is_valid_floor(report.hub));
        assert!(level.grid.is_valid_floor(below.anchor));
        assert!(!level.grid.has_terrain(below.anchor.above()));
        assert!(generator.validate(&level.grid, &config).is_ok());
    }

    #[test]
    fn test_generator_trait() {
        let generator = standard_generator();
        let config = GenerationConfig::for_testing(12);
        let mut rng = utils::create_rng(&config);

        let mut grid = generator.generate(&config, &mut rng).unwrap();
        assert_eq!(generator.generator_type(), "LevelGenerator");
        assert!(generator.validate(&grid, &config).is_ok());

        grid.clear(GridPos::new(4, 4, 0)).unwrap();
        assert!(generator.validate(&grid, &config).is_err());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = GenerationConfig::for_testing(1);
        config.floor_terrain = "Lava".to_string();
        assert!(matches!(
            standard_generator().generate_level(&config),
            Err(StrataError::UnknownTerrain(_))
        ));

        let mut config = GenerationConfig::for_testing(1);
        config.placement_attempts = 0;
        assert!(matches!(
            standard_generator().generate_level(&config),
            Err(StrataError::InvalidConfig(_))
        ));

        let mut config = GenerationConfig::for_testing(1);
        config.offset_root_max = 100_000;
        assert!(matches!(
            standard_generator().generate_level(&config),
            Err(StrataError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_prohibitive_carving_costs_do_not_overflow() {
        let mut config = GenerationConfig::for_testing(4);
        config.carving_costs.void_penalty = u32::MAX;
        config.carving_costs.headroom_penalty = u32::MAX;
        config.carving_costs.layer_change = u32::MAX;

        let level = standard_generator().generate_level(&config).unwrap();
        let report = &level.report;
        assert_eq!(report.connected.len() + report.unreachable.len(), report.rooms.len());
    }
}
