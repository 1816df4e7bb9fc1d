//! Template Library
//!
//! Catalogue of validated templates, keyed by id, in authoring order.

use std::collections::HashMap;
use std::sync::Arc;

use super::template::StructureTemplate;

#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: Vec<Arc<StructureTemplate>>,
    by_id: HashMap<String, usize>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template. Returns `false` (and keeps the existing entry) when
    /// the id is already taken.
    pub fn insert(&mut self, template: StructureTemplate) -> bool {
        if self.by_id.contains_key(template.id()) {
            return false;
        }
        self.by_id
            .insert(template.id().to_string(), self.templates.len());
        self.templates.push(Arc::new(template));
        true
    }

    pub fn get(&self, id: &str) -> Option<&Arc<StructureTemplate>> {
        self.by_id.get(id).map(|&i| &self.templates[i])
    }

    /// Catalogue entry by position, for cycling selections.
    pub fn by_position(&self, position: usize) -> Option<&Arc<StructureTemplate>> {
        self.templates.get(position)
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<StructureTemplate>> {
        self.templates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_ids_are_refused() {
        let mut library = TemplateLibrary::new();
        assert!(library.insert(StructureTemplate::removal_tool("demolish", "Demolish")));
        assert!(!library.insert(StructureTemplate::removal_tool("demolish", "Other")));
        assert_eq!(library.len(), 1);
        assert_eq!(library.get("demolish").unwrap().name(), "Demolish");
    }

    #[test]
    fn catalogue_order_is_kept() {
        let mut library = TemplateLibrary::new();
        library.insert(StructureTemplate::removal_tool("b", "B"));
        library.insert(StructureTemplate::removal_tool("a", "A"));
        assert_eq!(library.by_position(0).unwrap().id(), "b");
        assert_eq!(library.position_of("a"), Some(1));
        assert!(library.get("missing").is_none());
    }
}
