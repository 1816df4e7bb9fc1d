//! Game Module
//!
//! Building systems that sit on top of the engine's world grid.

pub mod builder;
pub mod config;
pub mod structure;
pub mod systems;

pub use builder::{BuildAction, BuildCursor};
pub use config::{BuildConfig, ConfigError, TemplateDefinition, TemplateKind};
pub use structure::{
    Doorway, DoorwayState, Geometry, GeometryError, Pose, Structure, StructureId, StructureKind,
    StructureTemplate, TemplateLibrary,
};
pub use systems::{
    BuildWorld, ConsistencyError, DoorwaySink, DoorwayUpdate, NullSink, PlacementEngine,
    PlacementError, RecordingSink,
};
