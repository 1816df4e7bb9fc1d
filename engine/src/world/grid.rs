//! Grid Coordinate Module
//!
//! Maps continuous world positions onto the integer occupancy grid and back.
//!
//! ## Conventions
//! - X and Z are horizontal, Y is up
//! - Building is single-elevation: every grid position sits on the ground plane
//! - 1 cell = `grid_size` world units on each horizontal axis
//!
//! ## Half-grid space
//! Doorways sit on wall midpoints, which are half a cell away from cell
//! centers. They are stored as [`HalfGridIndex`] values in doubled integer
//! coordinates, so a wall midpoint has exactly one odd component.

use std::fmt;

use glam::{IVec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default authoring tolerance for snapping hand-placed markers.
pub const DEFAULT_MARKER_TOLERANCE: f32 = 0.1;

/// Largest absolute cell (or half-cell) coordinate a position may map to.
///
/// World cells are a bounded origin plus a bounded template offset, and
/// half-grid points double that, so everything stays well inside `i32`.
pub const MAX_GRID_EXTENT: i32 = 1 << 28;

/// Failures of the strict grid operations.
///
/// Every variant means a caller broke a precondition; none of them are
/// user-recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GridError {
    /// `index_of` was given a position that is not its own grid snap.
    #[error("tried to get index from ({x}, {y}, {z}) which is off-grid")]
    OffGrid { x: f32, y: f32, z: f32 },
    /// `reserve` on a cell that already has an owner.
    #[error("cell {index} is already occupied")]
    OccupiedCell { index: GridIndex },
    /// `release` on an empty cell or a cell owned by someone else.
    #[error("cell {index} is not owned by the releasing structure")]
    OwnershipMismatch { index: GridIndex },
    /// Position is not finite or lies beyond [`MAX_GRID_EXTENT`] cells.
    #[error("position ({x}, {z}) is outside the grid")]
    OutOfBounds { x: f32, z: f32 },
}

impl GridError {
    pub(crate) fn off_grid(pos: Vec3) -> Self {
        GridError::OffGrid {
            x: pos.x,
            y: pos.y,
            z: pos.z,
        }
    }

    pub(crate) fn out_of_bounds(pos: Vec3) -> Self {
        GridError::OutOfBounds { x: pos.x, z: pos.z }
    }
}

/// Round `value / step` to an integer coordinate inside the grid extent.
fn grid_coord(value: f32, step: f32) -> Option<i32> {
    let scaled = (value / step).round();
    (scaled.is_finite() && scaled.abs() <= MAX_GRID_EXTENT as f32).then_some(scaled as i32)
}

/// Integer cell coordinates (column `x`, row `z`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridIndex {
    pub x: i32,
    pub z: i32,
}

/// Axis-adjacent offsets in fixed order: -x, +x, -z, +z.
const MANHATTAN_OFFSETS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

impl GridIndex {
    pub const ZERO: GridIndex = GridIndex { x: 0, z: 0 };

    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The four edge-sharing neighbors, always in the order -x, +x, -z, +z.
    pub fn manhattan_neighbors(self) -> [GridIndex; 4] {
        MANHATTAN_OFFSETS.map(|(dx, dz)| GridIndex::new(self.x + dx, self.z + dz))
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        GridIndex::new(self.x + dx, self.z + dz)
    }
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

impl From<IVec2> for GridIndex {
    fn from(v: IVec2) -> Self {
        GridIndex::new(v.x, v.y)
    }
}

impl From<GridIndex> for IVec2 {
    fn from(index: GridIndex) -> Self {
        IVec2::new(index.x, index.z)
    }
}

/// Horizontal axis a doorway passage runs along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Passage crosses the wall in the x direction (neighbors at -x/+x).
    X,
    /// Passage crosses the wall in the z direction (neighbors at -z/+z).
    Z,
}

impl Axis {
    pub fn flipped(self) -> Self {
        match self {
            Axis::X => Axis::Z,
            Axis::Z => Axis::X,
        }
    }
}

/// Position on the half-grid in doubled integer coordinates.
///
/// `HalfGridIndex::new(1, 0)` is the world point `(grid_size / 2, 0)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HalfGridIndex {
    pub x: i32,
    pub z: i32,
}

impl HalfGridIndex {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Half-grid index of a cell center.
    pub fn from_cell(cell: GridIndex) -> Self {
        HalfGridIndex::new(cell.x * 2, cell.z * 2)
    }

    /// True when this point is the midpoint of a wall segment: on the full
    /// grid along exactly one axis and half a step off along the other.
    pub fn is_wall_midpoint(self) -> bool {
        (self.x.rem_euclid(2) == 1) != (self.z.rem_euclid(2) == 1)
    }

    /// Axis a passage through this wall midpoint would run along.
    ///
    /// An x-aligned midpoint sits on a wall between two cells stacked in z.
    pub fn passage_axis(self) -> Option<Axis> {
        match (self.x.rem_euclid(2) == 0, self.z.rem_euclid(2) == 0) {
            (true, false) => Some(Axis::Z),
            (false, true) => Some(Axis::X),
            _ => None,
        }
    }

    /// The two cells half a step on either side of this midpoint along
    /// `axis`, lower coordinate first. `None` if the point is not a wall
    /// midpoint crossed by `axis`.
    pub fn straddling(self, axis: Axis) -> Option<(GridIndex, GridIndex)> {
        if self.passage_axis() != Some(axis) {
            return None;
        }
        let cells = match axis {
            Axis::X => {
                let z = self.z / 2;
                (
                    GridIndex::new((self.x - 1).div_euclid(2), z),
                    GridIndex::new((self.x + 1).div_euclid(2), z),
                )
            }
            Axis::Z => {
                let x = self.x / 2;
                (
                    GridIndex::new(x, (self.z - 1).div_euclid(2)),
                    GridIndex::new(x, (self.z + 1).div_euclid(2)),
                )
            }
        };
        Some(cells)
    }
}

impl fmt::Display for HalfGridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}/2, {}/2)", self.x, self.z)
    }
}

/// Grid configuration for world-space operations.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Edge length of one occupancy cell in world units
    pub grid_size: f32,
    /// Height of the building plane
    pub ground_y: f32,
    /// How far an authored marker may sit from its snapped position
    pub marker_tolerance: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_size: 1.0,
            ground_y: 0.0,
            marker_tolerance: DEFAULT_MARKER_TOLERANCE,
        }
    }
}

impl GridConfig {
    pub fn new(grid_size: f32) -> Self {
        Self {
            grid_size,
            ..Self::default()
        }
    }

    /// Snap a position to the grid.
    ///
    /// Rounds X and Z independently to the nearest multiple of `grid_size`;
    /// Y is forced onto the ground plane.
    pub fn snap_to_grid(&self, pos: Vec3) -> Vec3 {
        Vec3::new(
            (pos.x / self.grid_size).round() * self.grid_size,
            self.ground_y,
            (pos.z / self.grid_size).round() * self.grid_size,
        )
    }

    /// True when `pos` is exactly its own grid snap.
    pub fn is_on_grid(&self, pos: Vec3) -> bool {
        pos == self.snap_to_grid(pos)
    }

    /// Integer index of an already-snapped grid position.
    ///
    /// Never re-snaps: an off-grid input is a caller bug and fails with
    /// [`GridError::OffGrid`]. Snapped infinities and positions past
    /// [`MAX_GRID_EXTENT`] fail with [`GridError::OutOfBounds`].
    pub fn index_of(&self, pos: Vec3) -> Result<GridIndex, GridError> {
        if !self.is_on_grid(pos) {
            return Err(GridError::off_grid(pos));
        }
        self.index_of_world(pos)
    }

    /// Index of the cell nearest a raw position, ignoring Y and without the
    /// on-grid precondition.
    pub fn index_of_world(&self, pos: Vec3) -> Result<GridIndex, GridError> {
        match (grid_coord(pos.x, self.grid_size), grid_coord(pos.z, self.grid_size)) {
            (Some(x), Some(z)) => Ok(GridIndex::new(x, z)),
            _ => Err(GridError::out_of_bounds(pos)),
        }
    }

    /// World position of a cell center. Inverse of [`GridConfig::index_of`].
    pub fn position_of(&self, index: GridIndex) -> Vec3 {
        Vec3::new(
            index.x as f32 * self.grid_size,
            self.ground_y,
            index.z as f32 * self.grid_size,
        )
    }

    /// Round a position to the nearest half-grid point.
    pub fn round_to_half_grid(&self, pos: Vec3) -> Result<HalfGridIndex, GridError> {
        let half = self.grid_size / 2.0;
        match (grid_coord(pos.x, half), grid_coord(pos.z, half)) {
            (Some(x), Some(z)) => Ok(HalfGridIndex::new(x, z)),
            _ => Err(GridError::out_of_bounds(pos)),
        }
    }

    /// World position of a half-grid point, on the ground plane.
    pub fn half_position_of(&self, index: HalfGridIndex) -> Vec3 {
        let half = self.grid_size / 2.0;
        Vec3::new(index.x as f32 * half, self.ground_y, index.z as f32 * half)
    }
}
