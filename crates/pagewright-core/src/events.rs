//! Notifications broadcast by the editor.

/// A broadcast drained by the host through
/// [`Editor::take_events`](crate::editor::Editor::take_events).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    /// The set of selected items changed. Carries no payload; observers
    /// re-query the current selection.
    SelectionDidChange,
}
