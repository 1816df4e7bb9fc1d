//! World Module
//!
//! World-space grid coordinates, orientation and sparse occupancy.

pub mod grid;
pub mod lookup;
pub mod orientation;

pub use grid::{
    Axis, DEFAULT_MARKER_TOLERANCE, GridConfig, GridError, GridIndex, HalfGridIndex, MAX_GRID_EXTENT,
};
pub use lookup::GridLookup;
pub use orientation::Orientation;
