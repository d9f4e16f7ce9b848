//! # Generation Events
//!
//! Ordered record of every edit made while building a level.

use crate::{Grid, GridPos, OccupantId, StrataResult, TerrainId};
use serde::{Deserialize, Serialize};

/// A single step of a level build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationEvent {
    /// All terrain was erased
    Cleared,
    /// Terrain was painted at a cell
    Painted { pos: GridPos, terrain: String },
    /// Terrain was removed from a cell
    Erased { pos: GridPos },
    /// A room template was stamped
    RoomPlaced {
        template: String,
        offset: GridPos,
        anchor: GridPos,
    },
    /// A corridor between two anchors was painted
    CorridorCarved {
        from: GridPos,
        to: GridPos,
        cells: usize,
    },
    /// An occupant was handed to the sink
    OccupantSpawned { pos: GridPos, id: OccupantId },
}

/// Grid handle that mirrors every edit into an event log.
pub struct Canvas<'a> {
    grid: &'a mut Grid,
    events: Vec<GenerationEvent>,
    recording: bool,
}

impl<'a> Canvas<'a> {
    /// Wraps a grid. When `recording` is off, edits still apply and no
    /// events are kept.
    pub fn new(grid: &'a mut Grid, recording: bool) -> Self {
        Self {
            grid,
            events: Vec::new(),
            recording,
        }
    }

    /// Read access to the grid being edited.
    pub fn grid(&self) -> &Grid {
        self.grid
    }

    /// Mutable access for edits that are not terrain, such as occupants.
    pub fn grid_mut(&mut self) -> &mut Grid {
        self.grid
    }

    /// Erases all terrain.
    pub fn clear_all(&mut self) {
        self.grid.clear_all();
        self.record(GenerationEvent::Cleared);
    }

    /// Paints terrain by id.
    pub fn paint(&mut self, pos: GridPos, id: TerrainId) -> StrataResult<()> {
        self.grid.paint_id(pos, id)?;
        if self.recording {
            let terrain = self
                .grid
                .catalog()
                .get(id)
                .map(|def| def.name.clone())
                .unwrap_or_default();
            self.events.push(GenerationEvent::Painted { pos, terrain });
        }
        Ok(())
    }

    /// Removes terrain. Cells that were already void produce no event.
    pub fn erase(&mut self, pos: GridPos) -> StrataResult<()> {
        let had_terrain = self.grid.has_terrain(pos);
        self.grid.clear(pos)?;
        if had_terrain {
            self.record(GenerationEvent::Erased { pos });
        }
        Ok(())
    }

    /// Appends an event.
    pub fn record(&mut self, event: GenerationEvent) {
        if self.recording {
            self.events.push(event);
        }
    }

    /// Consumes the canvas, returning the recorded events.
    pub fn into_events(self) -> Vec<GenerationEvent> {
        self.events
    }
}
