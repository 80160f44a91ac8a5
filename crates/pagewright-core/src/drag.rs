//! Visual feedback for drag-and-drop.
//!
//! Tracks the highlighted drop target and the drop caret shown while a drag
//! is over the editor. Both are decoration state only: they own no document
//! content and are fully decoupled from the live selection.

use crate::dom::{DomRange, NodeId};
use crate::error::{EditorError, EditorResult};
use crate::surface::DocumentSurface;
use kurbo::Rect;

/// Drag feedback: at most one highlighted node and one drop caret.
#[derive(Debug, Clone, Copy, Default)]
pub struct DragFeedbackState {
    highlight_node: Option<NodeId>,
    caret_range: Option<DomRange>,
}

impl DragFeedbackState {
    /// Create empty drag feedback.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently highlighted drop target.
    pub fn highlight_node(&self) -> Option<NodeId> {
        self.highlight_node
    }

    /// The current drop caret.
    pub fn caret_range(&self) -> Option<DomRange> {
        self.caret_range
    }

    /// Highlight `node` as the drop target, replacing any prior highlight.
    /// `None` removes the highlight.
    pub fn move_drag_highlight_to_node(&mut self, node: Option<NodeId>) {
        self.highlight_node = node;
    }

    /// Move the drop caret to `range`, which must be collapsed. A
    /// non-collapsed range is rejected without touching the caret.
    pub fn move_drag_caret_to_range(&mut self, range: DomRange) -> EditorResult<()> {
        if !range.is_collapsed() {
            log::error!("drag caret moved to a non-collapsed range");
            return Err(EditorError::InvalidDragCaretRange);
        }
        self.caret_range = Some(range);
        Ok(())
    }

    /// Remove the drop caret.
    pub fn remove_drag_caret(&mut self) {
        self.caret_range = None;
    }

    /// Drop all feedback, e.g. when a drag exits or completes.
    pub fn clear(&mut self) {
        self.highlight_node = None;
        self.caret_range = None;
    }

    /// The visual rect of the drop caret, if it has layout.
    pub fn drag_caret_rect(&self, surface: &dyn DocumentSurface) -> Option<Rect> {
        let range = self.caret_range?;
        surface.bounds_of_range(&range)
    }

    /// The visual rect of the highlighted drop target, if it has layout.
    pub fn drag_highlight_rect(&self, surface: &dyn DocumentSurface) -> Option<Rect> {
        let node = self.highlight_node?;
        let range = surface.node_range(node)?;
        surface.bounds_of_range(&range)
    }
}
