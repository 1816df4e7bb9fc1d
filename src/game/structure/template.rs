//! Structure Templates
//!
//! Authoring-time geometry for each buildable type. Templates are validated
//! once, when they enter the [`TemplateLibrary`](super::TemplateLibrary),
//! and are shared read-only by every instance placed from them.

use glam::{Vec2, Vec3};
use thiserror::Error;

use crate::world::{Axis, GridConfig, GridIndex, HalfGridIndex};

/// Authoring errors found while validating template markers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("a building must occupy at least one cell")]
    EmptyFootprint,
    #[error("occupied marker ({x}, {y}, {z}) is not on the grid")]
    OccupiedOffGrid { x: f32, y: f32, z: f32 },
    #[error("occupied cell {cell} is listed twice")]
    DuplicateCell { cell: GridIndex },
    #[error("marker at height {y} is not on the ground plane")]
    AboveGround { y: f32 },
    #[error("doorway ({x}, {z}) must sit on the grid along exactly one axis")]
    DoorwayNotOnWall { x: f32, z: f32 },
    #[error("doorway {position} must separate one occupied cell from one empty cell")]
    DoorwayNotOnEdge { position: HalfGridIndex },
    #[error("doorway {position} is listed twice")]
    DuplicateDoorway { position: HalfGridIndex },
    #[error("marker ({x}, {z}) is outside the grid")]
    MarkerOutOfBounds { x: f32, z: f32 },
}

/// A declared opening, in template-local half-grid space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DoorwayMarker {
    pub position: HalfGridIndex,
    /// Axis the passage runs along at authoring orientation
    pub axis: Axis,
}

/// Validated footprint and doorways of a building.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    occupied: Vec<GridIndex>,
    doorways: Vec<DoorwayMarker>,
}

impl Geometry {
    /// Validate raw authored markers (template-local offsets).
    ///
    /// Markers live in the template's own frame, whose floor is `y = 0`
    /// wherever the world ground plane sits. Occupied markers must sit
    /// within `marker_tolerance` of a cell center on that floor. Doorway
    /// markers are rounded to the half-grid and must lie on a wall between
    /// one occupied and one empty cell.
    pub fn from_markers(
        grid: &GridConfig,
        occupied: &[Vec3],
        doorways: &[Vec3],
    ) -> Result<Self, GeometryError> {
        if occupied.is_empty() {
            return Err(GeometryError::EmptyFootprint);
        }

        let mut cells: Vec<GridIndex> = Vec::with_capacity(occupied.len());
        for &marker in occupied {
            let cell = validate_occupied(grid, marker)?;
            if cells.contains(&cell) {
                return Err(GeometryError::DuplicateCell { cell });
            }
            cells.push(cell);
        }

        let mut geometry = Geometry {
            occupied: cells,
            doorways: Vec::with_capacity(doorways.len()),
        };
        for &marker in doorways {
            let doorway = geometry.validate_doorway(grid, marker)?;
            if geometry.has_doorway(doorway.position) {
                return Err(GeometryError::DuplicateDoorway {
                    position: doorway.position,
                });
            }
            geometry.doorways.push(doorway);
        }
        Ok(geometry)
    }

    pub fn occupied(&self) -> &[GridIndex] {
        &self.occupied
    }

    pub fn doorways(&self) -> &[DoorwayMarker] {
        &self.doorways
    }

    pub fn has_occupied(&self, cell: GridIndex) -> bool {
        self.occupied.contains(&cell)
    }

    pub fn has_doorway(&self, position: HalfGridIndex) -> bool {
        self.doorways.iter().any(|d| d.position == position)
    }

    fn validate_doorway(&self, grid: &GridConfig, marker: Vec3) -> Result<DoorwayMarker, GeometryError> {
        check_ground(grid, marker)?;

        let position = grid
            .round_to_half_grid(marker)
            .map_err(|_| out_of_bounds(marker))?;
        let Some(axis) = position.passage_axis() else {
            return Err(GeometryError::DoorwayNotOnWall {
                x: marker.x,
                z: marker.z,
            });
        };
        let Some((low, high)) = position.straddling(axis) else {
            return Err(GeometryError::DoorwayNotOnWall {
                x: marker.x,
                z: marker.z,
            });
        };
        if self.has_occupied(low) == self.has_occupied(high) {
            return Err(GeometryError::DoorwayNotOnEdge { position });
        }
        Ok(DoorwayMarker { position, axis })
    }
}

fn out_of_bounds(marker: Vec3) -> GeometryError {
    GeometryError::MarkerOutOfBounds {
        x: marker.x,
        z: marker.z,
    }
}

/// Markers must sit on the template floor, local `y = 0`.
fn check_ground(grid: &GridConfig, marker: Vec3) -> Result<(), GeometryError> {
    if marker.y.is_nan() || marker.y.abs() >= grid.marker_tolerance {
        return Err(GeometryError::AboveGround { y: marker.y });
    }
    Ok(())
}

fn validate_occupied(grid: &GridConfig, marker: Vec3) -> Result<GridIndex, GeometryError> {
    check_ground(grid, marker)?;
    let cell = grid
        .index_of_world(marker)
        .map_err(|_| out_of_bounds(marker))?;
    let center = Vec2::new(cell.x as f32, cell.z as f32) * grid.grid_size;
    if center.distance(Vec2::new(marker.x, marker.z)) >= grid.marker_tolerance {
        return Err(GeometryError::OccupiedOffGrid {
            x: marker.x,
            y: marker.y,
            z: marker.z,
        });
    }
    Ok(cell)
}

/// What a template builds.
#[derive(Clone, Debug, PartialEq)]
pub enum StructureKind {
    Building(Geometry),
    /// The deletion cursor: no cells, no doorways, never placed.
    RemovalTool,
}

/// An immutable, validated buildable type.
#[derive(Clone, Debug, PartialEq)]
pub struct StructureTemplate {
    id: String,
    name: String,
    kind: StructureKind,
}

impl StructureTemplate {
    pub fn building(id: impl Into<String>, name: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: StructureKind::Building(geometry),
        }
    }

    pub fn removal_tool(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: StructureKind::RemovalTool,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &StructureKind {
        &self.kind
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        match &self.kind {
            StructureKind::Building(geometry) => Some(geometry),
            StructureKind::RemovalTool => None,
        }
    }

    pub fn is_removal_tool(&self) -> bool {
        matches!(self.kind, StructureKind::RemovalTool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridConfig {
        GridConfig::default()
    }

    #[test]
    fn house_geometry_validates() {
        let geometry = Geometry::from_markers(
            &grid(),
            &[Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)],
            &[Vec3::new(0.0, 0.0, 0.5)],
        )
        .unwrap();
        assert_eq!(geometry.occupied(), &[GridIndex::new(0, 0), GridIndex::new(1, 0)]);
        assert_eq!(
            geometry.doorways(),
            &[DoorwayMarker {
                position: HalfGridIndex::new(0, 1),
                axis: Axis::Z,
            }]
        );
    }

    #[test]
    fn markers_within_tolerance_snap() {
        let geometry =
            Geometry::from_markers(&grid(), &[Vec3::new(2.03, 0.02, -0.98)], &[]).unwrap();
        assert_eq!(geometry.occupied(), &[GridIndex::new(2, -1)]);
    }

    #[test]
    fn empty_footprint_rejected() {
        assert_eq!(
            Geometry::from_markers(&grid(), &[], &[]),
            Err(GeometryError::EmptyFootprint)
        );
    }

    #[test]
    fn off_grid_occupied_rejected() {
        let err = Geometry::from_markers(&grid(), &[Vec3::new(0.4, 0.0, 0.0)], &[]).unwrap_err();
        assert!(matches!(err, GeometryError::OccupiedOffGrid { .. }));
    }

    #[test]
    fn raised_marker_rejected() {
        let err = Geometry::from_markers(&grid(), &[Vec3::new(0.0, 1.0, 0.0)], &[]).unwrap_err();
        assert_eq!(err, GeometryError::AboveGround { y: 1.0 });
    }

    #[test]
    fn duplicate_cell_rejected() {
        let err = Geometry::from_markers(
            &grid(),
            &[Vec3::ZERO, Vec3::new(0.01, 0.0, 0.0)],
            &[],
        )
        .unwrap_err();
        assert_eq!(err, GeometryError::DuplicateCell { cell: GridIndex::ZERO });
    }

    #[test]
    fn doorway_at_corner_or_center_rejected() {
        let cells = [Vec3::ZERO];
        // Corner: half-offset on both axes
        let err = Geometry::from_markers(&grid(), &cells, &[Vec3::new(0.5, 0.0, 0.5)]).unwrap_err();
        assert!(matches!(err, GeometryError::DoorwayNotOnWall { .. }));
        // Cell center: aligned on both axes
        let err = Geometry::from_markers(&grid(), &cells, &[Vec3::ZERO]).unwrap_err();
        assert!(matches!(err, GeometryError::DoorwayNotOnWall { .. }));
    }

    #[test]
    fn interior_wall_doorway_rejected() {
        // Both sides occupied
        let err = Geometry::from_markers(
            &grid(),
            &[Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)],
            &[Vec3::new(0.5, 0.0, 0.0)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            GeometryError::DoorwayNotOnEdge {
                position: HalfGridIndex::new(1, 0)
            }
        );
    }

    #[test]
    fn detached_doorway_rejected() {
        // Neither side occupied
        let err = Geometry::from_markers(&grid(), &[Vec3::ZERO], &[Vec3::new(3.5, 0.0, 0.0)])
            .unwrap_err();
        assert!(matches!(err, GeometryError::DoorwayNotOnEdge { .. }));
    }

    #[test]
    fn x_facing_doorway_axis() {
        let geometry =
            Geometry::from_markers(&grid(), &[Vec3::ZERO], &[Vec3::new(-0.5, 0.0, 0.0)]).unwrap();
        assert_eq!(geometry.doorways()[0].axis, Axis::X);
        assert!(geometry.has_doorway(HalfGridIndex::new(-1, 0)));
    }

    #[test]
    fn markers_are_local_to_template_floor() {
        // A raised world ground plane does not move the template floor
        let raised = GridConfig {
            ground_y: 4.0,
            ..GridConfig::default()
        };
        let geometry = Geometry::from_markers(
            &raised,
            &[Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)],
            &[Vec3::new(1.5, 0.0, 0.0)],
        )
        .unwrap();
        assert_eq!(geometry.occupied(), &[GridIndex::new(0, 0), GridIndex::new(1, 0)]);

        let err = Geometry::from_markers(&raised, &[Vec3::new(0.0, 4.0, 0.0)], &[]).unwrap_err();
        assert_eq!(err, GeometryError::AboveGround { y: 4.0 });
    }

    #[test]
    fn unbounded_markers_rejected() {
        let err = Geometry::from_markers(&grid(), &[Vec3::new(f32::NAN, 0.0, 0.0)], &[]).unwrap_err();
        assert!(matches!(err, GeometryError::MarkerOutOfBounds { .. }));

        let err = Geometry::from_markers(&grid(), &[Vec3::ZERO], &[Vec3::new(0.5, 0.0, 1e12)])
            .unwrap_err();
        assert!(matches!(err, GeometryError::MarkerOutOfBounds { .. }));

        let err = Geometry::from_markers(&grid(), &[Vec3::new(0.0, f32::NAN, 0.0)], &[]).unwrap_err();
        assert!(matches!(err, GeometryError::AboveGround { .. }));
    }

    #[test]
    fn removal_tool_has_no_geometry() {
        let tool = StructureTemplate::removal_tool("demolish", "Demolish");
        assert!(tool.is_removal_tool());
        assert!(tool.geometry().is_none());
    }
}
