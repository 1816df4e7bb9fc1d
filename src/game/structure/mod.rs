//! Structure Module
//!
//! Buildable templates, their validated geometry, and placed instances.

pub mod instance;
pub mod library;
pub mod template;

pub use instance::{Doorway, DoorwayState, Pose, Structure, StructureId};
pub use library::TemplateLibrary;
pub use template::{DoorwayMarker, Geometry, GeometryError, StructureKind, StructureTemplate};
