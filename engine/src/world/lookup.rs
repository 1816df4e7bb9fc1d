//! Sparse occupancy lookup.
//!
//! Column-major map of `x -> z -> owner`. Columns that lose their last cell
//! are dropped so memory tracks live cells rather than the explored area.

use std::collections::HashMap;

use super::grid::{GridError, GridIndex};

/// Sparse grid of at most one owner per cell.
///
/// Owners are identity handles; the lookup never owns what they refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLookup<T> {
    columns: HashMap<i32, HashMap<i32, T>>,
    len: usize,
}

impl<T> Default for GridLookup<T> {
    fn default() -> Self {
        Self {
            columns: HashMap::new(),
            len: 0,
        }
    }
}

impl<T: Copy + PartialEq> GridLookup<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, index: GridIndex) -> Option<T> {
        self.columns
            .get(&index.x)
            .and_then(|column| column.get(&index.z))
            .copied()
    }

    pub fn is_occupied(&self, index: GridIndex) -> bool {
        self.lookup(index).is_some()
    }

    /// Claim an empty cell for `owner`.
    pub fn reserve(&mut self, index: GridIndex, owner: T) -> Result<(), GridError> {
        let column = self.columns.entry(index.x).or_default();
        if column.contains_key(&index.z) {
            return Err(GridError::OccupiedCell { index });
        }
        column.insert(index.z, owner);
        self.len += 1;
        Ok(())
    }

    /// Clear a cell currently owned by `owner`.
    pub fn release(&mut self, index: GridIndex, owner: T) -> Result<(), GridError> {
        let Some(column) = self.columns.get_mut(&index.x) else {
            return Err(GridError::OwnershipMismatch { index });
        };
        match column.get(&index.z) {
            Some(current) if *current == owner => {
                column.remove(&index.z);
                self.len -= 1;
            }
            _ => return Err(GridError::OwnershipMismatch { index }),
        }
        if column.is_empty() {
            self.columns.remove(&index.x);
        }
        Ok(())
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of backing columns still allocated.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// All occupied cells, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (GridIndex, T)> + '_ {
        self.columns.iter().flat_map(|(&x, column)| {
            column
                .iter()
                .map(move |(&z, &owner)| (GridIndex::new(x, z), owner))
        })
    }
}
