//! Build World - the explicit placement context.
//!
//! Holds the occupancy grid and every live structure. The placement engine
//! is the only writer; doorway resync reads the grid and writes doorway
//! state on structures, never occupancy.

use std::collections::HashMap;

use glam::Vec3;

use crate::game::structure::{Structure, StructureId};
use crate::world::{GridConfig, GridIndex, GridLookup};

#[derive(Debug, Clone)]
pub struct BuildWorld {
    pub(crate) config: GridConfig,
    pub(crate) grid: GridLookup<StructureId>,
    pub(crate) structures: HashMap<StructureId, Structure>,
}

impl BuildWorld {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            grid: GridLookup::new(),
            structures: HashMap::new(),
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Read-only view of cell ownership.
    pub fn grid(&self) -> &GridLookup<StructureId> {
        &self.grid
    }

    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structures.get(&id)
    }

    /// Live structures ordered by id.
    pub fn structures(&self) -> Vec<&Structure> {
        let mut all: Vec<&Structure> = self.structures.values().collect();
        all.sort_by_key(|s| s.id());
        all
    }

    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }

    pub fn structure_at_index(&self, cell: GridIndex) -> Option<&Structure> {
        self.grid
            .lookup(cell)
            .and_then(|id| self.structures.get(&id))
    }

    /// Structure owning the cell under a raw world position.
    pub fn structure_at(&self, position: Vec3) -> Option<&Structure> {
        let cell = self.config.index_of_world(position).ok()?;
        self.structure_at_index(cell)
    }
}
