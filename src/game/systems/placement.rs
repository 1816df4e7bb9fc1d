//! Placement Engine
//!
//! Places and removes whole structures on the occupancy grid:
//! - Every check runs against the full candidate footprint before any cell
//!   is reserved, so a structure is never partially placed
//! - Removal takes the whole structure owning the clicked cell
//! - Both end with a doorway resync around the changed footprint
//!
//! User rejections leave the world untouched. Consistency failures abort
//! the operation and are surfaced as [`PlacementError::Internal`]. Raw
//! positions that are not finite or lie past the grid extent are user
//! input, so they are rejected as [`PlacementError::OutOfBounds`].

use std::sync::Arc;

use glam::Vec3;
use thiserror::Error;
use tracing::{error, info, warn};

use super::build_world::BuildWorld;
use super::doorways::{ConsistencyError, DoorwaySink, NullSink, resync_around};
use crate::game::structure::{Pose, Structure, StructureId, StructureTemplate, TemplateLibrary};
use crate::world::{GridConfig, GridError, GridIndex, Orientation};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    #[error("That building would overlap another building.")]
    Overlap { cell: GridIndex, occupant: StructureId },
    #[error("Standing in a construction zone is dangerous.")]
    DangerousPlacement { cell: GridIndex },
    #[error("There is nothing to remove.")]
    NothingToRemove { cell: GridIndex },
    #[error("That spot is outside the buildable area.")]
    OutOfBounds { x: f32, z: f32 },
    #[error("There is no buildable called '{0}'.")]
    UnknownTemplate(String),
    #[error("'{0}' cannot be built.")]
    NotBuildable(String),
    #[error("internal consistency failure: {0}")]
    Internal(#[from] ConsistencyError),
}

impl PlacementError {
    /// Expected outcome of a user action, as opposed to a broken invariant.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, PlacementError::Internal(_))
    }
}

/// Owns the build world and every live structure's lifetime.
pub struct PlacementEngine<S: DoorwaySink = NullSink> {
    world: BuildWorld,
    library: TemplateLibrary,
    sink: S,
    next_id: u32,
}

impl PlacementEngine<NullSink> {
    pub fn new(config: GridConfig, library: TemplateLibrary) -> Self {
        Self::with_sink(config, library, NullSink)
    }
}

impl<S: DoorwaySink> PlacementEngine<S> {
    pub fn with_sink(config: GridConfig, library: TemplateLibrary, sink: S) -> Self {
        Self {
            world: BuildWorld::new(config),
            library,
            sink,
            next_id: 1,
        }
    }

    pub fn world(&self) -> &BuildWorld {
        &self.world
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn config(&self) -> &GridConfig {
        &self.world.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn snap_to_grid(&self, position: Vec3) -> Vec3 {
        self.world.config.snap_to_grid(position)
    }

    pub fn structure_at(&self, position: Vec3) -> Option<&Structure> {
        self.world.structure_at(position)
    }

    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.world.structure(id)
    }

    pub fn structures(&self) -> Vec<&Structure> {
        self.world.structures()
    }

    /// Cells a template would claim at a pose, without touching the world.
    pub fn preview_cells(
        &self,
        template_id: &str,
        position: Vec3,
        orientation: Orientation,
    ) -> Result<Vec<GridIndex>, PlacementError> {
        let template = self.template(template_id)?;
        let preview = self.materialize(template, position, orientation)?;
        Ok(preview.occupied_cells().collect())
    }

    /// Run every placement check without committing.
    pub fn check_placement(
        &self,
        template_id: &str,
        position: Vec3,
        orientation: Orientation,
        occupant: Option<Vec3>,
    ) -> Result<(), PlacementError> {
        let template = self.buildable(template_id)?;
        let candidate = self.materialize(template, position, orientation)?;
        self.check_footprint(&candidate, occupant)
    }

    /// Place a structure with its origin at the cell under `position`.
    ///
    /// `occupant` is the position of whoever must not be built on.
    pub fn attempt_place(
        &mut self,
        template_id: &str,
        position: Vec3,
        orientation: Orientation,
        occupant: Option<Vec3>,
    ) -> Result<StructureId, PlacementError> {
        let result = self.place(template_id, position, orientation, occupant);
        log_outcome("place", template_id, &result);
        result
    }

    /// Remove the whole structure owning the cell under `position`.
    pub fn attempt_remove(&mut self, position: Vec3) -> Result<StructureId, PlacementError> {
        let result = self.remove(position);
        log_outcome("remove", "", &result);
        result
    }

    fn place(
        &mut self,
        template_id: &str,
        position: Vec3,
        orientation: Orientation,
        occupant: Option<Vec3>,
    ) -> Result<StructureId, PlacementError> {
        let template = self.buildable(template_id)?;
        let candidate = self.materialize(template, position, orientation)?;
        self.check_footprint(&candidate, occupant)?;

        // Every cell was checked above; reservation cannot collide
        let id = candidate.id();
        let cells: Vec<GridIndex> = candidate.occupied_cells().collect();
        for &cell in &cells {
            self.world
                .grid
                .reserve(cell, id)
                .map_err(ConsistencyError::from)?;
        }
        self.next_id += 1;
        self.sink.structure_placed(&candidate);
        self.world.structures.insert(id, candidate);

        resync_around(&mut self.world, &cells, &mut self.sink)?;
        Ok(id)
    }

    fn remove(&mut self, position: Vec3) -> Result<StructureId, PlacementError> {
        let cell = self.cell_under(position)?;
        let Some(target_id) = self.world.grid.lookup(cell) else {
            return Err(PlacementError::NothingToRemove { cell });
        };
        let target = self
            .world
            .structures
            .remove(&target_id)
            .ok_or(ConsistencyError::UnknownStructure(target_id))?;

        let cells: Vec<GridIndex> = target.occupied_cells().collect();
        for &cell in &cells {
            self.world
                .grid
                .release(cell, target_id)
                .map_err(ConsistencyError::from)?;
        }

        // The removed footprint lets neighbors see the vacancy
        resync_around(&mut self.world, &cells, &mut self.sink)?;
        self.sink.structure_removed(target_id);
        Ok(target_id)
    }

    fn template(&self, template_id: &str) -> Result<Arc<StructureTemplate>, PlacementError> {
        self.library
            .get(template_id)
            .cloned()
            .ok_or_else(|| PlacementError::UnknownTemplate(template_id.to_string()))
    }

    fn buildable(&self, template_id: &str) -> Result<Arc<StructureTemplate>, PlacementError> {
        let template = self.template(template_id)?;
        if template.is_removal_tool() {
            return Err(PlacementError::NotBuildable(template.name().to_string()));
        }
        Ok(template)
    }

    /// Grid cell under a raw input position.
    fn cell_under(&self, position: Vec3) -> Result<GridIndex, PlacementError> {
        let out_of_bounds = PlacementError::OutOfBounds {
            x: position.x,
            z: position.z,
        };
        if !position.x.is_finite() || !position.z.is_finite() {
            return Err(out_of_bounds);
        }
        let config = &self.world.config;
        match config.index_of(config.snap_to_grid(position)) {
            Ok(cell) => Ok(cell),
            Err(GridError::OutOfBounds { .. }) => Err(out_of_bounds),
            Err(err) => Err(ConsistencyError::from(err).into()),
        }
    }

    /// Instance at a pose with the next free id, not yet registered.
    fn materialize(
        &self,
        template: Arc<StructureTemplate>,
        position: Vec3,
        orientation: Orientation,
    ) -> Result<Structure, PlacementError> {
        let origin = self.cell_under(position)?;
        Ok(Structure::new(
            StructureId(self.next_id),
            template,
            Pose::new(origin, orientation),
        ))
    }

    fn check_footprint(&self, candidate: &Structure, occupant: Option<Vec3>) -> Result<(), PlacementError> {
        // An occupant off the grid cannot stand in the footprint
        let occupant_cell = occupant.and_then(|p| self.world.config.index_of_world(p).ok());
        for cell in candidate.occupied_cells() {
            if let Some(owner) = self.world.grid.lookup(cell) {
                return Err(PlacementError::Overlap {
                    cell,
                    occupant: owner,
                });
            }
            if occupant_cell == Some(cell) {
                return Err(PlacementError::DangerousPlacement { cell });
            }
        }
        Ok(())
    }
}

fn log_outcome(action: &str, template: &str, result: &Result<StructureId, PlacementError>) {
    match result {
        Ok(id) => info!(action, template, structure = %id, "build_committed"),
        Err(err) if err.is_rejection() => {
            warn!(action, template, reason = %err, "build_rejected")
        }
        Err(err) => error!(action, template, error = %err, "build_failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::structure::Geometry;

    fn library() -> TemplateLibrary {
        let grid = GridConfig::default();
        let mut library = TemplateLibrary::new();
        library.insert(StructureTemplate::building(
            "pair",
            "Pair",
            Geometry::from_markers(&grid, &[Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)], &[]).unwrap(),
        ));
        library.insert(StructureTemplate::removal_tool("demolish", "Demolish"));
        library
    }

    fn engine() -> PlacementEngine {
        PlacementEngine::new(GridConfig::default(), library())
    }

    #[test]
    fn place_claims_every_cell() {
        let mut engine = engine();
        let id = engine
            .attempt_place("pair", Vec3::new(0.2, 3.0, -0.1), Orientation::Deg0, None)
            .unwrap();
        assert_eq!(engine.world().grid().lookup(GridIndex::new(0, 0)), Some(id));
        assert_eq!(engine.world().grid().lookup(GridIndex::new(1, 0)), Some(id));
        assert_eq!(engine.world().grid().len(), 2);
    }

    #[test]
    fn overlap_rejected_without_mutation() {
        let mut engine = engine();
        let first = engine
            .attempt_place("pair", Vec3::ZERO, Orientation::Deg0, None)
            .unwrap();
        let before = engine.world().grid().clone();

        let err = engine
            .attempt_place("pair", Vec3::new(1.0, 0.0, 0.0), Orientation::Deg0, None)
            .unwrap_err();
        assert_eq!(
            err,
            PlacementError::Overlap {
                cell: GridIndex::new(1, 0),
                occupant: first,
            }
        );
        assert_eq!(engine.world().grid(), &before);
        assert_eq!(engine.structures().len(), 1);
    }

    #[test]
    fn building_on_occupant_rejected() {
        let mut engine = engine();
        let err = engine
            .attempt_place(
                "pair",
                Vec3::ZERO,
                Orientation::Deg0,
                Some(Vec3::new(0.9, 1.7, 0.3)),
            )
            .unwrap_err();
        assert_eq!(
            err,
            PlacementError::DangerousPlacement {
                cell: GridIndex::new(1, 0)
            }
        );
        assert!(engine.world().grid().is_empty());
    }

    #[test]
    fn removal_tool_is_not_buildable() {
        let mut engine = engine();
        let err = engine
            .attempt_place("demolish", Vec3::ZERO, Orientation::Deg0, None)
            .unwrap_err();
        assert_eq!(err, PlacementError::NotBuildable("Demolish".to_string()));
        assert!(err.is_rejection());
    }

    #[test]
    fn unknown_template_rejected() {
        let mut engine = engine();
        assert_eq!(
            engine.attempt_place("castle", Vec3::ZERO, Orientation::Deg0, None),
            Err(PlacementError::UnknownTemplate("castle".to_string()))
        );
    }

    #[test]
    fn remove_clears_whole_structure() {
        let mut engine = engine();
        let id = engine
            .attempt_place("pair", Vec3::ZERO, Orientation::Deg90, None)
            .unwrap();
        assert_eq!(engine.attempt_remove(Vec3::new(0.0, 0.0, -1.0)), Ok(id));
        assert!(engine.world().grid().is_empty());
        assert!(engine.structure(id).is_none());
    }

    #[test]
    fn remove_empty_cell_rejected() {
        let mut engine = engine();
        assert_eq!(
            engine.attempt_remove(Vec3::new(4.0, 0.0, 4.0)),
            Err(PlacementError::NothingToRemove {
                cell: GridIndex::new(4, 4)
            })
        );
    }

    #[test]
    fn non_finite_input_is_rejection() {
        let mut engine = engine();
        for position in [
            Vec3::new(f32::NAN, 0.0, 0.0),
            Vec3::new(0.0, 0.0, f32::NEG_INFINITY),
        ] {
            let err = engine.attempt_remove(position).unwrap_err();
            assert!(matches!(err, PlacementError::OutOfBounds { .. }));
            assert!(err.is_rejection());

            let err = engine
                .attempt_place("pair", position, Orientation::Deg0, None)
                .unwrap_err();
            assert!(matches!(err, PlacementError::OutOfBounds { .. }));
        }
        assert!(engine.world().grid().is_empty());
    }

    #[test]
    fn far_positions_rejected_without_overflow() {
        let mut engine = engine();
        let err = engine
            .attempt_place("pair", Vec3::new(1.5e9, 0.0, 0.0), Orientation::Deg0, None)
            .unwrap_err();
        assert!(matches!(err, PlacementError::OutOfBounds { .. }));
        assert!(engine.check_placement("pair", Vec3::new(0.0, 0.0, -3e38), Orientation::Deg90, None).is_err());
        assert!(engine.preview_cells("pair", Vec3::new(f32::INFINITY, 0.0, 0.0), Orientation::Deg0).is_err());
        assert!(engine.structure_at(Vec3::new(f32::NAN, 0.0, 0.0)).is_none());

        // A NaN occupant blocks nothing
        assert!(engine
            .attempt_place("pair", Vec3::ZERO, Orientation::Deg0, Some(Vec3::splat(f32::NAN)))
            .is_ok());
    }

    #[test]
    fn check_placement_is_dry_run() {
        let engine = engine();
        assert!(engine
            .check_placement("pair", Vec3::ZERO, Orientation::Deg0, None)
            .is_ok());
        assert!(engine.world().grid().is_empty());
        assert_eq!(
            engine.preview_cells("pair", Vec3::ZERO, Orientation::Deg180).unwrap(),
            vec![GridIndex::new(0, 0), GridIndex::new(-1, 0)]
        );
    }
}
