//! Build Cursor
//!
//! The ghost structure that follows the pointer. Scrolling turns it in
//! quarter steps, the hotbar cycles through the catalogue, and clicking
//! either places the selected building or, with the removal tool selected,
//! demolishes whatever is under the cursor.

use std::sync::Arc;

use glam::Vec3;
use tracing::debug;

use crate::game::structure::{Structure, StructureId, StructureKind, StructureTemplate, TemplateLibrary};
use crate::game::systems::{DoorwaySink, PlacementEngine, PlacementError};
use crate::world::{GridConfig, GridIndex, Orientation};

/// What a committed cursor click did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildAction {
    Placed(StructureId),
    Removed(StructureId),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildCursor {
    /// Catalogue position of the selected template
    selected: usize,
    /// Snapped world position under the pointer
    position: Vec3,
    orientation: Orientation,
}

impl BuildCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_template<'a>(&self, library: &'a TemplateLibrary) -> Option<&'a Arc<StructureTemplate>> {
        library.by_position(self.selected)
    }

    /// Move to the grid cell under a raw pointer hit.
    pub fn follow(&mut self, config: &GridConfig, hit_point: Vec3) {
        self.position = config.snap_to_grid(hit_point);
    }

    pub fn rotate_cw(&mut self) {
        self.orientation = self.orientation.rotated_cw();
    }

    pub fn rotate_ccw(&mut self) {
        self.orientation = self.orientation.rotated_ccw();
    }

    pub fn select_next(&mut self, library: &TemplateLibrary) {
        self.step_selection(library, 1);
    }

    pub fn select_previous(&mut self, library: &TemplateLibrary) {
        self.step_selection(library, -1);
    }

    /// Select by template id. Returns `false` if the id is unknown.
    pub fn select(&mut self, library: &TemplateLibrary, id: &str) -> bool {
        match library.position_of(id) {
            Some(position) => {
                self.set_selection(position);
                true
            }
            None => false,
        }
    }

    fn step_selection(&mut self, library: &TemplateLibrary, delta: i32) {
        if library.is_empty() {
            return;
        }
        let len = library.len() as i32;
        let next = (self.selected as i32 + delta).rem_euclid(len);
        self.set_selection(next as usize);
    }

    fn set_selection(&mut self, position: usize) {
        // A fresh ghost starts unrotated
        self.selected = position;
        self.orientation = Orientation::Deg0;
        debug!(selected = position, "cursor_selection");
    }

    /// Cells the ghost would claim. Empty for the removal tool.
    pub fn footprint<S: DoorwaySink>(&self, engine: &PlacementEngine<S>) -> Vec<GridIndex> {
        let Some(template) = self.selected_template(engine.library()) else {
            return Vec::new();
        };
        match template.kind() {
            StructureKind::Building(_) => engine
                .preview_cells(template.id(), self.position, self.orientation)
                .unwrap_or_default(),
            StructureKind::RemovalTool => Vec::new(),
        }
    }

    /// Structure the removal tool would demolish, for highlighting.
    pub fn highlighted<'a, S: DoorwaySink>(&self, engine: &'a PlacementEngine<S>) -> Option<&'a Structure> {
        let template = self.selected_template(engine.library())?;
        match template.kind() {
            StructureKind::RemovalTool => engine.structure_at(self.position),
            StructureKind::Building(_) => None,
        }
    }

    /// Apply the selected tool at the cursor.
    pub fn commit<S: DoorwaySink>(
        &self,
        engine: &mut PlacementEngine<S>,
        occupant: Option<Vec3>,
    ) -> Result<BuildAction, PlacementError> {
        let template = self
            .selected_template(engine.library())
            .cloned()
            .ok_or_else(|| PlacementError::UnknownTemplate(format!("#{}", self.selected)))?;
        match template.kind() {
            StructureKind::Building(_) => engine
                .attempt_place(template.id(), self.position, self.orientation, occupant)
                .map(BuildAction::Placed),
            StructureKind::RemovalTool => engine.attempt_remove(self.position).map(BuildAction::Removed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::structure::Geometry;

    fn library() -> TemplateLibrary {
        let mut library = TemplateLibrary::new();
        library.insert(StructureTemplate::building(
            "hut",
            "Hut",
            Geometry::from_markers(&GridConfig::default(), &[Vec3::ZERO], &[]).unwrap(),
        ));
        library.insert(StructureTemplate::removal_tool("demolish", "Demolish"));
        library
    }

    #[test]
    fn selection_wraps_both_ways() {
        let library = library();
        let mut cursor = BuildCursor::new();
        cursor.select_previous(&library);
        assert_eq!(cursor.selected_index(), 1);
        cursor.select_next(&library);
        assert_eq!(cursor.selected_index(), 0);
    }

    #[test]
    fn selection_resets_rotation() {
        let library = library();
        let mut cursor = BuildCursor::new();
        cursor.rotate_cw();
        assert_eq!(cursor.orientation(), Orientation::Deg90);
        assert!(cursor.select(&library, "demolish"));
        assert_eq!(cursor.orientation(), Orientation::Deg0);
        assert!(!cursor.select(&library, "castle"));
        assert_eq!(cursor.selected_index(), 1);
    }

    #[test]
    fn follow_snaps_to_ground_cell() {
        let mut cursor = BuildCursor::new();
        cursor.follow(&GridConfig::default(), Vec3::new(2.6, 4.0, -0.4));
        assert_eq!(cursor.position(), Vec3::new(3.0, 0.0, 0.0));
    }
}
