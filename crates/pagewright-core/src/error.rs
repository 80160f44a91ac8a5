//! Error taxonomy for the editing core.

use thiserror::Error;

/// Errors surfaced by editing-core operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EditorError {
    /// Operation attempted on a controller or item whose document node has
    /// not been located yet. Recoverable: locate or load first.
    #[error("element not loaded")]
    NotLoaded,
    /// The expected document node is missing, e.g. the content was removed
    /// behind the editor's back. Callers treat the owning item as destroyed
    /// and prune it.
    #[error("document node not found: {0}")]
    NodeNotFound(String),
    /// A selection operation was handed an item without the selectable
    /// capability. Contract violation: callers must check first.
    #[error("item is not selectable")]
    InvalidSelection,
    /// A non-collapsed range was passed as a drag caret. Contract violation:
    /// drag carets are insertion points, never spans.
    #[error("drag caret range must be collapsed")]
    InvalidDragCaretRange,
    /// Text editing attempted while the surface does not permit it.
    /// Refused without any state change.
    #[error("text editing is not permitted")]
    EditNotPermitted,
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;
