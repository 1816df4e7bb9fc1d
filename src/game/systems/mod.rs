//! Game systems: the build world, placement and doorway resync.

pub mod build_world;
pub mod doorways;
pub mod placement;

pub use build_world::BuildWorld;
pub use doorways::{
    ConsistencyError, DoorwaySink, DoorwayUpdate, NullSink, RecordingSink, affected_structures,
    resync_around, resync_doorways,
};
pub use placement::{PlacementEngine, PlacementError};
