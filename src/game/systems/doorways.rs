//! Doorway Resync
//!
//! A doorway is a two-sided declaration. The wall segment it sits in only
//! opens when the structures on both sides declare a doorway at the same
//! half-grid point; an exterior side (no structure) keeps it shut.
//!
//! Passability depends only on the immediate neighbor across each wall, so
//! after a placement or removal only the changed footprint and its
//! edge-adjacent structures need to be recomputed.

use std::collections::BTreeSet;

use glam::Vec3;
use thiserror::Error;
use tracing::{debug, error};

use super::build_world::BuildWorld;
use crate::game::structure::{DoorwayState, Structure, StructureId};
use crate::world::{Axis, GridError, GridIndex, HalfGridIndex};

/// Grid and geometry disagree. Never a user error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsistencyError {
    #[error("doorway {position} of {structure} is not on a wall crossed along {axis:?}")]
    MisalignedDoorway {
        structure: StructureId,
        position: HalfGridIndex,
        axis: Axis,
    },
    #[error("doorway {position} of {structure} does not have its owner on exactly one side")]
    DoorwayDesync {
        structure: StructureId,
        position: HalfGridIndex,
    },
    #[error("grid refers to {0}, which is not a live structure")]
    UnknownStructure(StructureId),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// One resolved doorway, as handed to the visual sink.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DoorwayUpdate {
    pub structure: StructureId,
    pub marker: usize,
    pub position: HalfGridIndex,
    pub world_position: Vec3,
    pub axis: Axis,
    pub state: DoorwayState,
    /// Whether the state differs from before this resync
    pub changed: bool,
}

/// Receives passable/blocked results and structure lifecycle events.
pub trait DoorwaySink {
    fn doorway_changed(&mut self, update: &DoorwayUpdate);

    fn structure_placed(&mut self, _structure: &Structure) {}

    fn structure_removed(&mut self, _structure: StructureId) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DoorwaySink for NullSink {
    fn doorway_changed(&mut self, _update: &DoorwayUpdate) {}
}

/// Keeps every event, oldest first.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub updates: Vec<DoorwayUpdate>,
    pub placed: Vec<StructureId>,
    pub removed: Vec<StructureId>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent state reported for a doorway.
    pub fn latest(&self, structure: StructureId, position: HalfGridIndex) -> Option<DoorwayState> {
        self.updates
            .iter()
            .rev()
            .find(|u| u.structure == structure && u.position == position)
            .map(|u| u.state)
    }

    pub fn clear(&mut self) {
        self.updates.clear();
        self.placed.clear();
        self.removed.clear();
    }
}

impl DoorwaySink for RecordingSink {
    fn doorway_changed(&mut self, update: &DoorwayUpdate) {
        self.updates.push(*update);
    }

    fn structure_placed(&mut self, structure: &Structure) {
        self.placed.push(structure.id());
    }

    fn structure_removed(&mut self, structure: StructureId) {
        self.removed.push(structure);
    }
}

/// Structures that must be resynced after `changed_cells` changed hands:
/// whatever now owns each changed cell and whatever owns its four
/// neighbors. A just-removed structure is no longer in the grid, so it
/// drops out on its own.
pub fn affected_structures(world: &BuildWorld, changed_cells: &[GridIndex]) -> BTreeSet<StructureId> {
    let mut affected = BTreeSet::new();
    for &cell in changed_cells {
        for neighbor in cell.manhattan_neighbors() {
            if let Some(id) = world.grid.lookup(neighbor) {
                affected.insert(id);
            }
        }
        if let Some(id) = world.grid.lookup(cell) {
            affected.insert(id);
        }
    }
    affected
}

/// Resync every structure affected by a change to `changed_cells`.
///
/// Returns the number of doorways whose state flipped.
pub fn resync_around(
    world: &mut BuildWorld,
    changed_cells: &[GridIndex],
    sink: &mut dyn DoorwaySink,
) -> Result<usize, ConsistencyError> {
    let affected = affected_structures(world, changed_cells);
    debug!(count = affected.len(), "doorway_resync_set");

    let mut flipped = 0;
    for id in affected {
        flipped += resync_doorways(world, id, sink)?;
    }
    Ok(flipped)
}

/// Recompute every doorway of one structure against its current neighbors.
pub fn resync_doorways(
    world: &mut BuildWorld,
    id: StructureId,
    sink: &mut dyn DoorwaySink,
) -> Result<usize, ConsistencyError> {
    let resolved = resolve_doorways(world, id).inspect_err(|err| {
        error!(structure = %id, error = %err, "doorway_resync_failed");
    })?;

    let config = world.config;
    let structure = world
        .structures
        .get_mut(&id)
        .ok_or(ConsistencyError::UnknownStructure(id))?;

    let mut flipped = 0;
    for (marker, position, axis, state) in resolved {
        let changed = structure.set_doorway_state(marker, state);
        if changed {
            flipped += 1;
            debug!(structure = %id, %position, ?state, "doorway_changed");
        }
        sink.doorway_changed(&DoorwayUpdate {
            structure: id,
            marker,
            position,
            world_position: config.half_position_of(position),
            axis,
            state,
            changed,
        });
    }
    Ok(flipped)
}

fn resolve_doorways(
    world: &BuildWorld,
    id: StructureId,
) -> Result<Vec<(usize, HalfGridIndex, Axis, DoorwayState)>, ConsistencyError> {
    let structure = world
        .structures
        .get(&id)
        .ok_or(ConsistencyError::UnknownStructure(id))?;

    let mut resolved = Vec::new();
    for doorway in structure.doorways() {
        let (low, high) = doorway.position.straddling(doorway.axis).ok_or(
            ConsistencyError::MisalignedDoorway {
                structure: id,
                position: doorway.position,
                axis: doorway.axis,
            },
        )?;

        let low_owner = world.grid.lookup(low);
        let high_owner = world.grid.lookup(high);
        let neighbor = match (low_owner == Some(id), high_owner == Some(id)) {
            (true, false) => high_owner,
            (false, true) => low_owner,
            _ => {
                return Err(ConsistencyError::DoorwayDesync {
                    structure: id,
                    position: doorway.position,
                });
            }
        };

        let state = match neighbor {
            None => DoorwayState::Blocked,
            Some(other) => {
                let other = world
                    .structures
                    .get(&other)
                    .ok_or(ConsistencyError::UnknownStructure(other))?;
                if other.has_doorway(doorway.position) {
                    DoorwayState::Passable
                } else {
                    DoorwayState::Blocked
                }
            }
        };
        resolved.push((doorway.marker, doorway.position, doorway.axis, state));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::game::structure::{Geometry, Pose, StructureTemplate};
    use crate::world::{GridConfig, Orientation};

    fn room(doorways: &[Vec3]) -> Arc<StructureTemplate> {
        let geometry = Geometry::from_markers(&GridConfig::default(), &[Vec3::ZERO], doorways).unwrap();
        Arc::new(StructureTemplate::building("room", "Room", geometry))
    }

    /// Register a structure without going through the engine.
    fn insert(world: &mut BuildWorld, raw: u32, template: Arc<StructureTemplate>, origin: GridIndex) -> StructureId {
        let id = StructureId(raw);
        let structure = Structure::new(id, template, Pose::new(origin, Orientation::Deg0));
        for cell in structure.occupied_cells() {
            world.grid.reserve(cell, id).unwrap();
        }
        world.structures.insert(id, structure);
        id
    }

    #[test]
    fn matching_doorways_open() {
        let mut world = BuildWorld::new(GridConfig::default());
        let east = room(&[Vec3::new(0.5, 0.0, 0.0)]);
        let west = room(&[Vec3::new(-0.5, 0.0, 0.0)]);
        let a = insert(&mut world, 1, east, GridIndex::new(0, 0));
        let b = insert(&mut world, 2, west, GridIndex::new(1, 0));

        let mut sink = RecordingSink::new();
        let flipped = resync_around(&mut world, &[GridIndex::new(1, 0)], &mut sink).unwrap();
        assert_eq!(flipped, 2);
        assert_eq!(sink.latest(a, HalfGridIndex::new(1, 0)), Some(DoorwayState::Passable));
        assert_eq!(sink.latest(b, HalfGridIndex::new(1, 0)), Some(DoorwayState::Passable));
    }

    #[test]
    fn one_sided_doorway_stays_blocked() {
        let mut world = BuildWorld::new(GridConfig::default());
        let a = insert(&mut world, 1, room(&[Vec3::new(0.5, 0.0, 0.0)]), GridIndex::new(0, 0));
        insert(&mut world, 2, room(&[]), GridIndex::new(1, 0));

        let mut sink = RecordingSink::new();
        resync_around(&mut world, &[GridIndex::new(1, 0)], &mut sink).unwrap();
        assert_eq!(sink.latest(a, HalfGridIndex::new(1, 0)), Some(DoorwayState::Blocked));
        assert_eq!(world.structure(a).unwrap().passable_doorway_count(), 0);
    }

    #[test]
    fn resync_is_idempotent() {
        let mut world = BuildWorld::new(GridConfig::default());
        insert(&mut world, 1, room(&[Vec3::new(0.5, 0.0, 0.0)]), GridIndex::new(0, 0));
        insert(&mut world, 2, room(&[Vec3::new(-0.5, 0.0, 0.0)]), GridIndex::new(1, 0));

        let mut sink = NullSink;
        assert_eq!(resync_around(&mut world, &[GridIndex::new(0, 0)], &mut sink).unwrap(), 2);
        assert_eq!(resync_around(&mut world, &[GridIndex::new(0, 0)], &mut sink).unwrap(), 0);
    }

    #[test]
    fn affected_set_covers_neighbors_only() {
        let mut world = BuildWorld::new(GridConfig::default());
        let near = insert(&mut world, 1, room(&[]), GridIndex::new(0, 1));
        let far = insert(&mut world, 2, room(&[]), GridIndex::new(2, 2));
        let own = insert(&mut world, 3, room(&[]), GridIndex::new(0, 0));

        let affected = affected_structures(&world, &[GridIndex::new(0, 0)]);
        assert!(affected.contains(&near));
        assert!(affected.contains(&own));
        assert!(!affected.contains(&far));
    }

    #[test]
    fn unregistered_owner_is_desync() {
        let mut world = BuildWorld::new(GridConfig::default());
        let id = StructureId(9);
        // Known to the world but missing from the grid
        world.structures.insert(
            id,
            Structure::new(id, room(&[Vec3::new(0.5, 0.0, 0.0)]), Pose::default()),
        );

        let err = resync_doorways(&mut world, id, &mut NullSink).unwrap_err();
        assert_eq!(
            err,
            ConsistencyError::DoorwayDesync {
                structure: id,
                position: HalfGridIndex::new(1, 0),
            }
        );
    }
}
