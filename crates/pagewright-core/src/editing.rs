//! The editing session coordinator.
//!
//! Gatekeeps text mutation of the rendered document. The rendering engine
//! gives no "will edit" notification of its own, so callers announce edits
//! through [`EditingSession::will_edit_text_in_range`]; the session opens a
//! recording scope there and closes it into one undo step when the change
//! lands. At most one scope is open at any time.

use crate::dom::DomRange;
use crate::error::{EditorError, EditorResult};
use crate::surface::DocumentSurface;

/// Maximum number of undo steps to keep.
const MAX_UNDO_HISTORY: usize = 50;

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditPhase {
    /// No edit underway and none permitted yet.
    #[default]
    Idle,
    /// The surface holds focus; an edit may begin.
    EditPermitted,
    /// An announced edit is in flight; a recording scope is open.
    EditInProgress,
}

/// The open recording boundary of one text-mutation interval.
#[derive(Debug, Clone)]
struct UndoScope {
    range: DomRange,
    before: String,
}

/// One recorded text edit: the range it covered and the content on both
/// sides of the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoStep {
    /// The edited range.
    pub range: DomRange,
    /// Content of the range before the edit.
    pub before: String,
    /// Content of the range after the edit.
    pub after: String,
}

/// Bounded undo/redo history of text edits.
#[derive(Debug, Clone)]
pub struct UndoStack {
    undo: Vec<UndoStep>,
    redo: Vec<UndoStep>,
    allows_undo: bool,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    /// Create an empty stack with recording enabled.
    pub fn new() -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            allows_undo: true,
        }
    }

    /// Whether steps are being recorded.
    pub fn allows_undo(&self) -> bool {
        self.allows_undo
    }

    /// Enable or disable recording. Disabling does not drop history.
    pub fn set_allows_undo(&mut self, allows: bool) {
        self.allows_undo = allows;
    }

    /// Record a completed step. New steps clear the redo stack.
    pub fn record(&mut self, step: UndoStep) {
        if !self.allows_undo {
            return;
        }
        self.undo.push(step);
        self.redo.clear();
        if self.undo.len() > MAX_UNDO_HISTORY {
            self.undo.remove(0);
        }
    }

    /// Pop the newest step for reverting. The step moves to the redo stack.
    pub fn undo(&mut self) -> Option<UndoStep> {
        let step = self.undo.pop()?;
        self.redo.push(step.clone());
        Some(step)
    }

    /// Pop the newest reverted step for re-applying. The step moves back to
    /// the undo stack.
    pub fn redo(&mut self) -> Option<UndoStep> {
        let step = self.redo.pop()?;
        self.undo.push(step.clone());
        Some(step)
    }

    /// Whether an undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether a redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Drop all recorded steps.
    pub fn remove_all_actions(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

/// Coordinates edit permission, will/did change bracketing, and undo
/// recording. Driven strictly from the single UI event stream.
#[derive(Debug, Clone, Default)]
pub struct EditingSession {
    phase: EditPhase,
    scope: Option<UndoScope>,
    undo_stack: UndoStack,
}

impl EditingSession {
    /// Create an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current phase.
    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    /// The undo history.
    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo_stack
    }

    /// Mutable undo history access.
    pub fn undo_stack_mut(&mut self) -> &mut UndoStack {
        &mut self.undo_stack
    }

    /// Whether a text edit may begin right now. Re-evaluated on every
    /// attempt; no change is allowed unless the surface holds focus.
    pub fn can_edit_text(&self, surface: &dyn DocumentSurface) -> bool {
        surface.is_first_responder()
    }

    /// Announce an upcoming text mutation of `range`. Opens the recording
    /// scope, capturing the range's current content. Refused without any
    /// state change while editing is not permitted.
    pub fn will_edit_text_in_range(
        &mut self,
        range: DomRange,
        surface: &dyn DocumentSurface,
    ) -> EditorResult<()> {
        if !self.can_edit_text(surface) {
            return Err(EditorError::EditNotPermitted);
        }
        self.phase = EditPhase::EditPermitted;
        if let Some(open) = self.scope.take() {
            // Announcing an edit while a scope is open is a caller bug;
            // commit the open scope rather than losing it.
            log::error!("edit announced while one is in progress");
            self.commit_scope(open, surface);
        }
        let before = surface.text_in_range(&range).unwrap_or_default();
        self.scope = Some(UndoScope { range, before });
        self.phase = EditPhase::EditInProgress;
        Ok(())
    }

    /// Report that the announced mutation landed. Closes the scope into one
    /// undo step and returns it so the caller can resynchronize the owning
    /// text block. Returns `None` when no edit was announced.
    pub fn did_change_text_in_range(
        &mut self,
        range: DomRange,
        surface: &dyn DocumentSurface,
    ) -> Option<UndoStep> {
        let scope = self.scope.take()?;
        let after = surface.text_in_range(&range).unwrap_or_default();
        let step = UndoStep {
            range,
            before: scope.before,
            after,
        };
        self.undo_stack.record(step.clone());
        self.phase = EditPhase::Idle;
        Some(step)
    }

    /// Force the session back to idle, on loss of focus or document unload.
    /// An open scope is committed with the range's current content; partial
    /// edits are recorded, not discarded. Returns the committed step, if
    /// there was one, so the caller can resynchronize the owning item.
    pub fn interrupt(&mut self, surface: &dyn DocumentSurface) -> Option<UndoStep> {
        let committed = self.scope.take().map(|scope| {
            log::debug!("committing interrupted edit scope");
            self.commit_scope(scope, surface)
        });
        self.phase = EditPhase::Idle;
        committed
    }

    fn commit_scope(&mut self, scope: UndoScope, surface: &dyn DocumentSurface) -> UndoStep {
        let after = surface.text_in_range(&scope.range).unwrap_or_default();
        let step = UndoStep {
            range: scope.range,
            before: scope.before,
            after,
        };
        self.undo_stack.record(step.clone());
        step
    }
}
