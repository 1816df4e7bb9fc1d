//! Placed structure instances.
//!
//! An instance pairs a shared template with its own pose and doorway state.
//! World-space cells and doorways are recomputed from the template on every
//! query; footprints are a handful of cells, so nothing is cached.

use std::fmt;
use std::sync::Arc;

use glam::Vec3;

use super::template::{DoorwayMarker, StructureTemplate};
use crate::world::{Axis, GridConfig, GridIndex, HalfGridIndex, Orientation};

/// Opaque handle of a live structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureId(pub(crate) u32);

impl StructureId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a structure sits: the grid cell of its template origin and its
/// quarter-turn orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pose {
    pub origin: GridIndex,
    pub orientation: Orientation,
}

impl Pose {
    pub fn new(origin: GridIndex, orientation: Orientation) -> Self {
        Self { origin, orientation }
    }

    /// Template-local cell to world cell.
    pub fn cell(&self, local: GridIndex) -> GridIndex {
        let rotated = self.orientation.rotate_cell(local);
        self.origin.offset(rotated.x, rotated.z)
    }

    /// Template-local half-grid point to world half-grid point.
    pub fn half(&self, local: HalfGridIndex) -> HalfGridIndex {
        let rotated = self.orientation.rotate_half(local);
        let base = HalfGridIndex::from_cell(self.origin);
        HalfGridIndex::new(base.x + rotated.x, base.z + rotated.z)
    }
}

/// Passability of one doorway.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DoorwayState {
    /// Wall segment present.
    #[default]
    Blocked,
    /// Wall segment removed; both sides agreed on an opening.
    Passable,
}

impl DoorwayState {
    pub fn is_passable(self) -> bool {
        matches!(self, DoorwayState::Passable)
    }
}

/// A doorway resolved to world space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Doorway {
    /// Marker index within the template
    pub marker: usize,
    pub position: HalfGridIndex,
    /// Authored axis adjusted for the structure's orientation
    pub axis: Axis,
    pub state: DoorwayState,
}

/// A live structure owned by the placement engine.
#[derive(Clone, Debug)]
pub struct Structure {
    id: StructureId,
    template: Arc<StructureTemplate>,
    pose: Pose,
    doorway_states: Vec<DoorwayState>,
}

impl Structure {
    pub(crate) fn new(id: StructureId, template: Arc<StructureTemplate>, pose: Pose) -> Self {
        let doorway_count = template.geometry().map_or(0, |g| g.doorways().len());
        Self {
            id,
            template,
            pose,
            doorway_states: vec![DoorwayState::Blocked; doorway_count],
        }
    }

    pub fn id(&self) -> StructureId {
        self.id
    }

    pub fn template(&self) -> &Arc<StructureTemplate> {
        &self.template
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    fn markers(&self) -> &[DoorwayMarker] {
        self.template.geometry().map_or(&[][..], |g| g.doorways())
    }

    /// World cells claimed by this structure. Empty for the removal tool.
    pub fn occupied_cells(&self) -> impl Iterator<Item = GridIndex> + Clone + '_ {
        let pose = self.pose;
        self.template
            .geometry()
            .map_or(&[][..], |g| g.occupied())
            .iter()
            .map(move |&local| pose.cell(local))
    }

    /// World positions of the claimed cells; each equals its own grid snap.
    pub fn occupied_positions<'a>(&'a self, grid: &'a GridConfig) -> impl Iterator<Item = Vec3> + 'a {
        self.occupied_cells().map(move |cell| grid.position_of(cell))
    }

    /// Doorways in world space with their current state.
    pub fn doorways(&self) -> impl Iterator<Item = Doorway> + '_ {
        let pose = self.pose;
        self.markers()
            .iter()
            .zip(&self.doorway_states)
            .enumerate()
            .map(move |(marker, (m, &state))| Doorway {
                marker,
                position: pose.half(m.position),
                axis: pose.orientation.rotate_axis(m.axis),
                state,
            })
    }

    pub fn has_occupied(&self, cell: GridIndex) -> bool {
        self.occupied_cells().any(|c| c == cell)
    }

    pub fn has_doorway(&self, position: HalfGridIndex) -> bool {
        self.doorways().any(|d| d.position == position)
    }

    pub fn doorway_state_at(&self, position: HalfGridIndex) -> Option<DoorwayState> {
        self.doorways()
            .find(|d| d.position == position)
            .map(|d| d.state)
    }

    pub fn passable_doorway_count(&self) -> usize {
        self.doorway_states.iter().filter(|s| s.is_passable()).count()
    }

    /// Returns whether the state changed.
    pub(crate) fn set_doorway_state(&mut self, marker: usize, state: DoorwayState) -> bool {
        match self.doorway_states.get_mut(marker) {
            Some(current) if *current != state => {
                *current = state;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::structure::Geometry;

    fn house() -> Arc<StructureTemplate> {
        let geometry = Geometry::from_markers(
            &GridConfig::default(),
            &[Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)],
            &[Vec3::new(0.0, 0.0, 0.5)],
        )
        .unwrap();
        Arc::new(StructureTemplate::building("house", "House", geometry))
    }

    #[test]
    fn occupied_cells_follow_pose() {
        let s = Structure::new(
            StructureId(1),
            house(),
            Pose::new(GridIndex::new(5, 5), Orientation::Deg0),
        );
        let cells: Vec<_> = s.occupied_cells().collect();
        assert_eq!(cells, vec![GridIndex::new(5, 5), GridIndex::new(6, 5)]);

        // Restartable
        assert_eq!(s.occupied_cells().count(), 2);
    }

    #[test]
    fn rotated_cells_and_doorways() {
        let s = Structure::new(
            StructureId(1),
            house(),
            Pose::new(GridIndex::ZERO, Orientation::Deg90),
        );
        let cells: Vec<_> = s.occupied_cells().collect();
        assert_eq!(cells, vec![GridIndex::new(0, 0), GridIndex::new(0, -1)]);

        let door = s.doorways().next().unwrap();
        assert_eq!(door.position, HalfGridIndex::new(1, 0));
        assert_eq!(door.axis, Axis::X);
        assert_eq!(door.state, DoorwayState::Blocked);
    }

    #[test]
    fn occupied_positions_are_on_grid() {
        let grid = GridConfig::new(2.0);
        let s = Structure::new(
            StructureId(3),
            house(),
            Pose::new(GridIndex::new(-1, 2), Orientation::Deg180),
        );
        for pos in s.occupied_positions(&grid) {
            assert!(grid.is_on_grid(pos));
        }
    }

    #[test]
    fn doorway_state_updates_report_change() {
        let mut s = Structure::new(StructureId(1), house(), Pose::default());
        assert!(s.set_doorway_state(0, DoorwayState::Passable));
        assert!(!s.set_doorway_state(0, DoorwayState::Passable));
        assert!(!s.set_doorway_state(4, DoorwayState::Passable));
        assert_eq!(s.passable_doorway_count(), 1);
        assert_eq!(
            s.doorway_state_at(HalfGridIndex::new(0, 1)),
            Some(DoorwayState::Passable)
        );
    }
}
