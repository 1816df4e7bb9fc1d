//! Build Configuration
//!
//! Grid size and the buildable catalogue, loaded from JSON. `Default`
//! returns the built-in catalogue used by the simulation binary.
//!
//! ```json
//! {
//!   "grid_size": 1.0,
//!   "templates": [
//!     { "id": "house", "name": "House",
//!       "occupied": [[0, 0, 0], [1, 0, 0]],
//!       "doorways": [[0, 0, 0.5]] },
//!     { "id": "demolish", "name": "Demolish", "kind": "removal_tool" }
//!   ]
//! }
//! ```

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::game::structure::{Geometry, GeometryError, StructureTemplate, TemplateLibrary};
use crate::game::systems::{DoorwaySink, PlacementEngine};
use crate::world::{DEFAULT_MARKER_TOLERANCE, GridConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read build config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid build config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("grid size must be a positive finite number, got {0}")]
    InvalidGridSize(f32),
    #[error("marker tolerance must be positive and under a quarter cell, got {0}")]
    InvalidTolerance(f32),
    #[error("template id '{0}' is defined twice")]
    DuplicateTemplate(String),
    #[error("removal tool '{0}' must not declare cells or doorways")]
    ToolWithGeometry(String),
    #[error("template '{id}': {source}")]
    Geometry {
        id: String,
        #[source]
        source: GeometryError,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    #[default]
    Building,
    RemovalTool,
}

/// One buildable as authored: markers are offsets from the template origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub id: String,
    /// Display name; defaults to the id
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: TemplateKind,
    #[serde(default)]
    pub occupied: Vec<Vec3>,
    #[serde(default)]
    pub doorways: Vec<Vec3>,
}

impl TemplateDefinition {
    pub fn building(id: &str, name: &str, occupied: &[[f32; 3]], doorways: &[[f32; 3]]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: TemplateKind::Building,
            occupied: occupied.iter().map(|&p| Vec3::from_array(p)).collect(),
            doorways: doorways.iter().map(|&p| Vec3::from_array(p)).collect(),
        }
    }

    pub fn removal_tool(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: TemplateKind::RemovalTool,
            occupied: Vec::new(),
            doorways: Vec::new(),
        }
    }

    fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }

    /// Validate the markers into an immutable template.
    pub fn validate(&self, grid: &GridConfig) -> Result<StructureTemplate, ConfigError> {
        match self.kind {
            TemplateKind::RemovalTool => {
                if !self.occupied.is_empty() || !self.doorways.is_empty() {
                    return Err(ConfigError::ToolWithGeometry(self.id.clone()));
                }
                Ok(StructureTemplate::removal_tool(&self.id, self.display_name()))
            }
            TemplateKind::Building => {
                let geometry = Geometry::from_markers(grid, &self.occupied, &self.doorways)
                    .map_err(|source| ConfigError::Geometry {
                        id: self.id.clone(),
                        source,
                    })?;
                Ok(StructureTemplate::building(&self.id, self.display_name(), geometry))
            }
        }
    }
}

fn default_tolerance() -> f32 {
    DEFAULT_MARKER_TOLERANCE
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Edge length of one cell in world units
    pub grid_size: f32,
    /// Height of the building plane
    #[serde(default)]
    pub ground_y: f32,
    /// Authoring snap tolerance for template markers
    #[serde(default = "default_tolerance")]
    pub marker_tolerance: f32,
    pub templates: Vec<TemplateDefinition>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            grid_size: 1.0,
            ground_y: 0.0,
            marker_tolerance: DEFAULT_MARKER_TOLERANCE,
            templates: vec![
                TemplateDefinition::building(
                    "house",
                    "House",
                    &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
                    &[[0.0, 0.0, 0.5], [1.5, 0.0, 0.0]],
                ),
                TemplateDefinition::building(
                    "hall",
                    "Hall",
                    &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 1.0]],
                    &[[-0.5, 0.0, 0.0], [1.5, 0.0, 1.0], [0.0, 0.0, -0.5], [1.0, 0.0, 1.5]],
                ),
                TemplateDefinition::building(
                    "corridor",
                    "Corridor",
                    &[[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0, 2.0]],
                    &[[0.0, 0.0, -0.5], [0.0, 0.0, 2.5]],
                ),
                TemplateDefinition::building(
                    "tower",
                    "Tower",
                    &[[0.0, 0.0, 0.0]],
                    &[[0.5, 0.0, 0.0], [-0.5, 0.0, 0.0], [0.0, 0.0, 0.5], [0.0, 0.0, -0.5]],
                ),
                TemplateDefinition::removal_tool("demolish", "Demolish"),
            ],
        }
    }
}

impl BuildConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn grid(&self) -> Result<GridConfig, ConfigError> {
        if !self.grid_size.is_finite() || self.grid_size <= 0.0 {
            return Err(ConfigError::InvalidGridSize(self.grid_size));
        }
        if !(self.marker_tolerance > 0.0 && self.marker_tolerance < self.grid_size / 4.0) {
            return Err(ConfigError::InvalidTolerance(self.marker_tolerance));
        }
        Ok(GridConfig {
            grid_size: self.grid_size,
            ground_y: self.ground_y,
            marker_tolerance: self.marker_tolerance,
        })
    }

    /// Validate every template once and collect them in catalogue order.
    pub fn library(&self) -> Result<TemplateLibrary, ConfigError> {
        let grid = self.grid()?;
        let mut library = TemplateLibrary::new();
        for definition in &self.templates {
            let template = definition.validate(&grid)?;
            if !library.insert(template) {
                return Err(ConfigError::DuplicateTemplate(definition.id.clone()));
            }
        }
        info!(count = library.len(), grid_size = grid.grid_size, "templates_loaded");
        Ok(library)
    }

    pub fn engine(&self) -> Result<PlacementEngine, ConfigError> {
        Ok(PlacementEngine::new(self.grid()?, self.library()?))
    }

    pub fn engine_with_sink<S: DoorwaySink>(&self, sink: S) -> Result<PlacementEngine<S>, ConfigError> {
        Ok(PlacementEngine::with_sink(self.grid()?, self.library()?, sink))
    }
}
