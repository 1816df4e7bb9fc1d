//! Quarter-turn orientation about the vertical axis.
//!
//! Only 90° multiples exist so rotated cells and wall midpoints stay on the
//! grid. Rotation follows the right-handed turn about +Y: a 90° turn maps
//! local `(x, z)` to `(z, -x)`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::grid::{Axis, GridIndex, HalfGridIndex};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Deg0,
        Orientation::Deg90,
        Orientation::Deg180,
        Orientation::Deg270,
    ];

    /// Parse any multiple of 90 degrees, including negative ones.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        Some(Self::from_quarter_turns(degrees / 90))
    }

    pub fn from_quarter_turns(turns: i32) -> Self {
        match turns.rem_euclid(4) {
            0 => Orientation::Deg0,
            1 => Orientation::Deg90,
            2 => Orientation::Deg180,
            _ => Orientation::Deg270,
        }
    }

    pub fn quarter_turns(self) -> i32 {
        match self {
            Orientation::Deg0 => 0,
            Orientation::Deg90 => 1,
            Orientation::Deg180 => 2,
            Orientation::Deg270 => 3,
        }
    }

    pub fn degrees(self) -> i32 {
        self.quarter_turns() * 90
    }

    pub fn rotated_cw(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + 1)
    }

    pub fn rotated_ccw(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() - 1)
    }

    /// True for 90° and 270°, where x-facing and z-facing swap.
    pub fn swaps_axes(self) -> bool {
        self.quarter_turns() % 2 == 1
    }

    /// Effective axis of something authored along `axis`.
    pub fn rotate_axis(self, axis: Axis) -> Axis {
        if self.swaps_axes() { axis.flipped() } else { axis }
    }

    /// Rotate a pair of integer offsets about the origin.
    pub fn rotate_offset(self, x: i32, z: i32) -> (i32, i32) {
        match self {
            Orientation::Deg0 => (x, z),
            Orientation::Deg90 => (z, -x),
            Orientation::Deg180 => (-x, -z),
            Orientation::Deg270 => (-z, x),
        }
    }

    pub fn rotate_cell(self, cell: GridIndex) -> GridIndex {
        let (x, z) = self.rotate_offset(cell.x, cell.z);
        GridIndex::new(x, z)
    }

    pub fn rotate_half(self, point: HalfGridIndex) -> HalfGridIndex {
        let (x, z) = self.rotate_offset(point.x, point.z);
        HalfGridIndex::new(x, z)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}
