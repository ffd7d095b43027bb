//! Bounded multi-select over sticker indices.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A toggle set capped at a target size.
///
/// Toggling a present id removes it. Toggling an absent id inserts it only
/// while the set is below the target; at capacity the toggle is silently
/// ignored rather than treated as an error. Downstream progression is
/// gated on [`SelectionSet::is_satisfied`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    target: usize,
    selected: BTreeSet<usize>,
}

impl SelectionSet {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            selected: BTreeSet::new(),
        }
    }

    /// Toggles `id` and reports whether it is selected afterwards.
    pub fn toggle(&mut self, id: usize) -> bool {
        if self.selected.remove(&id) {
            return false;
        }
        if self.selected.len() < self.target {
            self.selected.insert(id);
            return true;
        }
        false
    }

    pub fn contains(&self, id: usize) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// True once exactly the target number of ids is selected.
    pub fn is_satisfied(&self) -> bool {
        self.selected.len() == self.target
    }

    pub fn target(&self) -> usize {
        self.target
    }

    /// Selected ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}
