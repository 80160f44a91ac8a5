//! Pagewright Editing Core
//!
//! The structured-editing layer of the Pagewright site builder: keeps an
//! application-owned tree of editable items synchronized with an externally
//! rendered document, and layers selection, hit-testing, drag feedback and
//! undo-aware text editing on top of it.

pub mod controller;
pub mod data_source;
pub mod dom;
pub mod drag;
pub mod editing;
pub mod editor;
pub mod error;
pub mod events;
pub mod item;
pub mod memory;
pub mod selection;
pub mod surface;

pub use controller::{ControllerRegistry, ElementController, ElementModel};
pub use data_source::{
    DragInfo, DropOperation, EditorDataSource, EditorDelegate, NavigationAction, Pasteboard,
    ITEM_FLAVOR,
};
pub use dom::{DomPosition, DomRange, NodeId};
pub use drag::DragFeedbackState;
pub use editing::{EditPhase, EditingSession, UndoStack, UndoStep};
pub use editor::Editor;
pub use error::{EditorError, EditorResult};
pub use events::EditorEvent;
pub use item::{Item, ItemId, ItemKind, ItemTree};
pub use memory::MemorySurface;
pub use selection::{ItemUiState, SelectionState};
pub use surface::DocumentSurface;
