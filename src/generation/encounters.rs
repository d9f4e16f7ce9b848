//! # Encounter Placement
//!
//! Spawns one occupant per connected room and hands each to the host through
//! an [`OccupantSink`].

use super::{Canvas, GenerationEvent};
use crate::{GridPos, Occupancy, OccupantId, StrataResult};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What the host needs to instantiate a spawned occupant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupantDescriptor {
    /// Id also recorded on the grid cell
    pub id: OccupantId,
    /// Occupancy written to the cell
    pub occupancy: Occupancy,
    /// Layer the occupant starts on
    pub starting_layer: i32,
    /// Host-facing kind, such as "enemy"
    pub kind: String,
}

/// A spawned occupant and where it stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupantPlacement {
    pub pos: GridPos,
    pub descriptor: OccupantDescriptor,
}

/// Receives occupants as the generator spawns them.
pub trait OccupantSink {
    /// Accepts one occupant at `pos`.
    fn place(&mut self, pos: GridPos, descriptor: OccupantDescriptor) -> StrataResult<()>;
}

impl OccupantSink for Vec<OccupantPlacement> {
    fn place(&mut self, pos: GridPos, descriptor: OccupantDescriptor) -> StrataResult<()> {
        self.push(OccupantPlacement { pos, descriptor });
        Ok(())
    }
}

/// Places one creature on each anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterSpawner {
    /// Kind reported to the sink
    pub kind: String,
}

impl EncounterSpawner {
    /// Creates a spawner reporting the given kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }

    /// Spawns an occupant on every anchor, in order.
    ///
    /// Ids come from `rng`, so a seeded build always produces the same ids.
    /// Each cell is marked as holding a creature before the sink is called.
    pub fn spawn(
        &self,
        canvas: &mut Canvas<'_>,
        anchors: &[GridPos],
        rng: &mut StdRng,
        sink: &mut dyn OccupantSink,
    ) -> StrataResult<Vec<OccupantId>> {
        let mut spawned = Vec::with_capacity(anchors.len());

        for &pos in anchors {
            let id = uuid::Builder::from_random_bytes(rng.gen()).into_uuid();
            canvas
                .grid_mut()
                .set_occupant(pos, Occupancy::Creature, Some(id))?;

            let descriptor = OccupantDescriptor {
                id,
                occupancy: Occupancy::Creature,
                starting_layer: pos.layer,
                kind: self.kind.clone(),
            };
            sink.place(pos, descriptor)?;
            canvas.record(GenerationEvent::OccupantSpawned { pos, id });
            log::debug!("spawned {} {} at {}", self.kind, id, pos);
            spawned.push(id);
        }

        Ok(spawned)
    }
}

impl Default for EncounterSpawner {
    fn default() -> Self {
        Self::new("enemy")
    }
}
