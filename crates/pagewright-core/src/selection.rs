//! Selection state for items.
//!
//! Tracks the ordered set of selected items plus at most one text-focused
//! item, separately from the items themselves. Methods report whether the
//! selected set changed so the editor can broadcast exactly one
//! selection-changed notification per net change.

use crate::item::ItemId;
use std::collections::HashSet;

/// The UI state of one item, derived from the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemUiState {
    /// Not part of the selection.
    #[default]
    Normal,
    /// Selected as a unit; shows a selection outline.
    Selected,
    /// Holds text focus for in-place editing.
    Editing,
}

impl ItemUiState {
    /// Whether the item reads as selected (selected or editing).
    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Selected | Self::Editing)
    }
}

/// The current selection: ordered selected items and the focused text item.
///
/// The first entry of the selected list is the primary item, the one drag
/// operations act on. The focused text item need not be in the selected
/// list; page body text is editable without being selectable as a unit.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: Vec<ItemId>,
    focused_text: Option<ItemId>,
}

impl SelectionState {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// The selected items in selection order.
    pub fn selected(&self) -> &[ItemId] {
        &self.selected
    }

    /// The primary selected item.
    pub fn primary(&self) -> Option<ItemId> {
        self.selected.first().copied()
    }

    /// Whether `id` is selected.
    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selected.contains(&id)
    }

    /// The item holding text focus, if any.
    pub fn focused_text(&self) -> Option<ItemId> {
        self.focused_text
    }

    /// The UI state of `id`.
    pub fn state(&self, id: ItemId) -> ItemUiState {
        if self.focused_text == Some(id) {
            ItemUiState::Editing
        } else if self.is_selected(id) {
            ItemUiState::Selected
        } else {
            ItemUiState::Normal
        }
    }

    /// Replace the selection with `items` (deduplicated, order kept).
    /// Returns whether the selected set changed.
    pub fn replace(&mut self, items: Vec<ItemId>) -> bool {
        let mut seen = HashSet::new();
        let next: Vec<ItemId> = items.into_iter().filter(|id| seen.insert(*id)).collect();
        if next == self.selected {
            return false;
        }
        self.selected = next;
        true
    }

    /// Add `items` to the selection, keeping existing order. Returns
    /// whether the selected set changed.
    pub fn union(&mut self, items: Vec<ItemId>) -> bool {
        let mut changed = false;
        for id in items {
            if !self.selected.contains(&id) {
                self.selected.push(id);
                changed = true;
            }
        }
        changed
    }

    /// Remove `id` from the selection. Returns whether it was present.
    pub fn deselect(&mut self, id: ItemId) -> bool {
        let before = self.selected.len();
        self.selected.retain(|&s| s != id);
        self.selected.len() != before
    }

    /// Empty the selection. Returns whether it held anything.
    pub fn clear(&mut self) -> bool {
        if self.selected.is_empty() {
            return false;
        }
        self.selected.clear();
        true
    }

    /// Move text focus, returning the previous holder so the caller can
    /// flush its pending edit state first.
    pub fn set_focused_text(&mut self, item: Option<ItemId>) -> Option<ItemId> {
        std::mem::replace(&mut self.focused_text, item)
    }

    /// Drop every reference to items that are no longer live. Returns
    /// whether the selected set changed; a cleared focus alone does not
    /// count, the selection-changed broadcast concerns selected items only.
    pub fn prune(&mut self, is_live: impl Fn(ItemId) -> bool) -> bool {
        let before = self.selected.len();
        self.selected.retain(|&id| is_live(id));
        if let Some(focused) = self.focused_text
            && !is_live(focused)
        {
            self.focused_text = None;
        }
        self.selected.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_and_primary() {
        let mut state = SelectionState::new();
        let (a, b) = (ItemId::new(), ItemId::new());

        assert!(state.replace(vec![a, b, a]));
        assert_eq!(state.selected(), &[a, b]);
        assert_eq!(state.primary(), Some(a));

        // Same set again is not a change.
        assert!(!state.replace(vec![a, b]));
    }

    #[test]
    fn test_union_keeps_order() {
        let mut state = SelectionState::new();
        let (a, b, c) = (ItemId::new(), ItemId::new(), ItemId::new());
        state.replace(vec![a]);

        assert!(state.union(vec![b, a, c]));
        assert_eq!(state.selected(), &[a, b, c]);
        assert!(!state.union(vec![b]));
    }

    #[test]
    fn test_deselect_absent_is_noop() {
        let mut state = SelectionState::new();
        let (a, b) = (ItemId::new(), ItemId::new());
        state.replace(vec![a]);

        assert!(!state.deselect(b));
        assert!(state.deselect(a));
        assert!(state.selected().is_empty());
    }

    #[test]
    fn test_ui_state() {
        let mut state = SelectionState::new();
        let (a, b) = (ItemId::new(), ItemId::new());
        state.replace(vec![a]);
        state.set_focused_text(Some(b));

        assert_eq!(state.state(a), ItemUiState::Selected);
        assert_eq!(state.state(b), ItemUiState::Editing);
        assert!(state.state(b).is_selected());
        assert_eq!(state.state(ItemId::new()), ItemUiState::Normal);
    }

    #[test]
    fn test_focus_handoff_returns_previous() {
        let mut state = SelectionState::new();
        let (a, b) = (ItemId::new(), ItemId::new());

        assert_eq!(state.set_focused_text(Some(a)), None);
        assert_eq!(state.set_focused_text(Some(b)), Some(a));
        assert_eq!(state.focused_text(), Some(b));
    }

    #[test]
    fn test_prune_drops_dead_items_and_focus() {
        let mut state = SelectionState::new();
        let (a, b) = (ItemId::new(), ItemId::new());
        state.replace(vec![a, b]);
        state.set_focused_text(Some(b));

        assert!(state.prune(|id| id == a));
        assert_eq!(state.selected(), &[a]);
        assert_eq!(state.focused_text(), None);

        // Nothing left to prune.
        assert!(!state.prune(|id| id == a));
    }
}
