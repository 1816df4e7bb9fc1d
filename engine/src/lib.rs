//! Hearthgrid Engine Library
//!
//! Grid-based building placement in a continuous 3D world. Free-form
//! positions snap onto an integer occupancy grid, structures claim whole
//! footprints without overlapping, and doorways open only where the
//! structures on both sides of a wall agree on one.
//!
//! # Modules
//!
//! - [`world`] - Grid coordinates, quarter-turn orientation, sparse occupancy
//! - [`game`] - Structure templates, placement engine, doorway resync, build cursor
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use hearthgrid_engine::game::BuildConfig;
//! use hearthgrid_engine::world::Orientation;
//!
//! let mut engine = BuildConfig::default().engine().unwrap();
//! let house = engine
//!     .attempt_place("house", Vec3::new(0.2, 0.0, -0.3), Orientation::Deg0, None)
//!     .unwrap();
//! assert_eq!(engine.structure_at(Vec3::new(1.0, 0.0, 0.0)).map(|s| s.id()), Some(house));
//! assert!(engine.attempt_remove(Vec3::new(5.0, 0.0, 5.0)).is_err());
//! ```

pub mod world;

// Building systems (located in src/game/ directory)
#[path = "../../src/game/mod.rs"]
pub mod game;

// Re-export world types for convenience
pub use world::{GridConfig, GridIndex, GridLookup, HalfGridIndex, Orientation};
// Re-export the engine surface
pub use game::{BuildConfig, PlacementEngine, PlacementError, StructureId};
