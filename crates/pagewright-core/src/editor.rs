//! The structured-editing facade.
//!
//! [`Editor`] wraps a rendering surface the way a table view wraps its
//! cells: it knows how to select, hit-test and edit arbitrary content but
//! owns none of it, pulling the item hierarchy from a data source and
//! reporting lifecycle through a delegate. Hosts are expected to go through
//! this API for every document mutation; the rendered tree is only ever
//! written by element controllers and the editing session.

use crate::controller::{ControllerRegistry, ElementController, ElementModel};
use crate::data_source::{
    DragInfo, DropOperation, EditorDataSource, EditorDelegate, NavigationAction, Pasteboard,
};
use crate::dom::{DomRange, NodeId};
use crate::drag::DragFeedbackState;
use crate::editing::{EditingSession, UndoStep};
use crate::error::{EditorError, EditorResult};
use crate::events::EditorEvent;
use crate::item::{ItemId, ItemTree};
use crate::selection::SelectionState;
use crate::surface::DocumentSurface;
use kurbo::{Point, Rect};
use std::time::Instant;

/// The structured-editing overlay over one rendering surface.
pub struct Editor<S: DocumentSurface> {
    surface: S,
    data_source: Box<dyn EditorDataSource>,
    delegate: Option<Box<dyn EditorDelegate>>,
    tree: ItemTree,
    selection: SelectionState,
    session: EditingSession,
    drag: DragFeedbackState,
    controllers: ControllerRegistry,
    events: Vec<EditorEvent>,
    load_pending: bool,
    loaded: bool,
}

impl<S: DocumentSurface> Editor<S> {
    /// Create an editor over `surface`, pulling content from `data_source`.
    pub fn new(surface: S, data_source: Box<dyn EditorDataSource>) -> Self {
        Self {
            surface,
            data_source,
            delegate: None,
            tree: ItemTree::new(),
            selection: SelectionState::new(),
            session: EditingSession::new(),
            drag: DragFeedbackState::new(),
            controllers: ControllerRegistry::new(),
            events: Vec::new(),
            load_pending: false,
            loaded: false,
        }
    }

    /// Install the lifecycle delegate.
    pub fn set_delegate(&mut self, delegate: Option<Box<dyn EditorDelegate>>) {
        self.delegate = delegate;
    }

    /// The wrapped surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable surface access, for feeding it host events. Do not edit the
    /// rendered document through this; that is what the editor API is for.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The live item tree.
    pub fn tree(&self) -> &ItemTree {
        &self.tree
    }

    /// The current selection.
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// The current drag feedback.
    pub fn drag_feedback(&self) -> &DragFeedbackState {
        &self.drag
    }

    // Loading

    /// Begin loading a hypertext string resolved against `base_url`. Any
    /// open edit is committed first; selection, drag feedback and the item
    /// tree reset since their document references are about to die.
    pub fn load_html(&mut self, html: &str, base_url: &str) {
        if let Some(step) = self.session.interrupt(&self.surface) {
            self.resync_text_block(&step.range, &step.after);
        }
        if self.selection.clear() {
            self.events.push(EditorEvent::SelectionDidChange);
        }
        self.selection.set_focused_text(None);
        self.drag.clear();
        self.controllers.unbind_all();
        self.tree.clear();
        self.loaded = false;
        self.load_pending = true;
        self.surface.load_html(html, base_url);
    }

    /// Whether a load is still in flight.
    pub fn is_loading(&self) -> bool {
        self.surface.is_loading()
    }

    /// Whether a document is loaded and its items are live.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Advance the surface's event loop by one step and pick up load
    /// completion. Hosts call this once per turn of their own loop.
    pub fn pump(&mut self) {
        self.surface.pump_event_loop();
        self.check_load_finished();
    }

    /// Block until loading finishes or `deadline` passes, pumping the
    /// surface's event loop cooperatively. Returns whether loading
    /// finished. Missing the deadline is the only way to give up on a
    /// load; there is no mid-load abort.
    pub fn load_until_deadline(&mut self, deadline: Instant) -> bool {
        loop {
            if !self.surface.is_loading() {
                self.check_load_finished();
                return true;
            }
            if Instant::now() >= deadline {
                log::warn!("document load missed its deadline");
                return false;
            }
            self.surface.pump_event_loop();
        }
    }

    fn check_load_finished(&mut self) {
        if self.load_pending && !self.surface.is_loading() {
            self.finish_loading();
        }
    }

    /// Build the item tree for the freshly loaded document: pull the
    /// hierarchy from the data source, resolve each item's node and range,
    /// and claim nodes with controllers bottom-up. Runs before the delegate
    /// hears about the load, so no item is observable without its range.
    fn finish_loading(&mut self) {
        self.load_pending = false;
        self.loaded = true;
        self.tree.reload(&*self.data_source);

        for id in self.tree.ids_in_document_order() {
            let (element_id, text_editable) = match self.tree.get(id) {
                Some(item) => (item.element_id.clone(), item.is_text_editable()),
                None => continue,
            };
            let Some(element_id) = element_id else {
                continue;
            };
            let Some(node) = self.surface.find_node_by_attribute("id", &element_id) else {
                log::warn!("no document node carries id {element_id}");
                continue;
            };
            let range = self.surface.node_range(node);
            let text = if text_editable {
                range.as_ref().and_then(|r| self.surface.text_in_range(r))
            } else {
                None
            };

            if let Some(item) = self.tree.get_mut(id) {
                item.node = Some(node);
                item.range = range;
                if text.is_some() {
                    item.text = text.clone();
                }
            }

            let mut model = ElementModel::new(element_id);
            model.text = text;
            self.controllers.register(id, ElementController::new(model));
            // Cannot fail: the controller was registered just above.
            let _ = self.controllers.attach(id, node);
        }

        log::info!("document loaded with {} items", self.tree.len());
        let title = self.surface.title();
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.did_finish_loading();
            if let Some(title) = &title {
                delegate.did_receive_title(title);
            }
        }
    }

    // Hit testing

    /// The item whose controller or binding claims `node`, if any.
    pub fn item_for_node(&self, node: NodeId) -> Option<ItemId> {
        self.tree
            .ids_in_document_order()
            .into_iter()
            .find(|&id| self.tree.get(id).and_then(|item| item.node) == Some(node))
    }

    /// Hit-test `point` against the item tree: strike the rendered surface,
    /// then walk ancestor nodes until one belongs to a live item. `None`
    /// for chrome, background, or an unloaded document.
    pub fn item_at_point(&self, point: Point) -> Option<ItemId> {
        if !self.loaded {
            return None;
        }
        let mut node = self.surface.node_at_point(point)?;
        loop {
            if let Some(item) = self.item_for_node(node) {
                return Some(item);
            }
            node = self.surface.parent_node(node)?;
        }
    }

    /// Every item intersecting `range`, in document order. Containers are
    /// reported as units; the walk descends into a container only when the
    /// query range lies entirely inside it, so a range spanning a container
    /// boundary yields the container once rather than its partially covered
    /// children.
    pub fn items_in_range(&self, range: &DomRange) -> Vec<ItemId> {
        let mut out = Vec::new();
        if self.loaded {
            self.collect_items_in_range(None, range, &mut out);
        }
        out
    }

    fn collect_items_in_range(
        &self,
        parent: Option<ItemId>,
        range: &DomRange,
        out: &mut Vec<ItemId>,
    ) {
        for &id in self.tree.children(parent) {
            let Some(item) = self.tree.get(id) else {
                continue;
            };
            let Some(item_range) = item.range else {
                continue;
            };
            if !self.surface.ranges_intersect(&item_range, range) {
                continue;
            }
            if item.is_container() && self.surface.range_contains(&item_range, range) {
                let before = out.len();
                self.collect_items_in_range(Some(id), range, out);
                // A query inside the container but between its children
                // still reports the container itself.
                if out.len() == before {
                    out.push(id);
                }
            } else {
                out.push(id);
            }
        }
    }

    /// The current visual bounds of an item, if its range has layout.
    pub fn item_bounds(&self, id: ItemId) -> Option<Rect> {
        let range = self.tree.get(id)?.range?;
        self.surface.bounds_of_range(&range)
    }

    // Selection

    /// Select `items`, replacing the selection or extending it. Extension
    /// only operates across siblings: when any new item has a different
    /// parent than the current primary item, the selection resets to the
    /// new items alone. Emits at most one selection-changed broadcast.
    pub fn select_items(&mut self, items: &[ItemId], extend: bool) -> EditorResult<()> {
        for &id in items {
            let item = self.tree.get(id).ok_or(EditorError::InvalidSelection)?;
            if !item.is_selectable() {
                log::error!("attempt to select non-selectable item {:?}", id);
                return Err(EditorError::InvalidSelection);
            }
        }
        let changed = if extend && !self.selection.selected().is_empty() {
            let anchor_parent = self.selection.primary().and_then(|p| self.tree.parent(p));
            let siblings = items.iter().all(|&id| self.tree.parent(id) == anchor_parent);
            if siblings {
                self.selection.union(items.to_vec())
            } else {
                self.selection.replace(items.to_vec())
            }
        } else {
            self.selection.replace(items.to_vec())
        };
        if changed {
            self.events.push(EditorEvent::SelectionDidChange);
        }
        Ok(())
    }

    /// Remove one item from the selection. A no-op, with no broadcast, when
    /// the item is not selected.
    pub fn deselect_item(&mut self, id: ItemId) {
        if self.selection.deselect(id) {
            self.events.push(EditorEvent::SelectionDidChange);
        }
    }

    /// Empty the selection.
    pub fn deselect_all(&mut self) {
        if self.selection.clear() {
            self.events.push(EditorEvent::SelectionDidChange);
        }
    }

    /// The selected items in selection order.
    pub fn selected_items(&self) -> &[ItemId] {
        self.selection.selected()
    }

    /// The primary selected item.
    pub fn selected_item(&self) -> Option<ItemId> {
        self.selection.primary()
    }

    /// Move text focus to `item`, or clear it with `None`. The previous
    /// holder's pending edit state is flushed first. Only text-editable
    /// items may take focus.
    pub fn set_focused_text(&mut self, item: Option<ItemId>) -> EditorResult<()> {
        if let Some(id) = item {
            let target = self.tree.get(id).ok_or(EditorError::InvalidSelection)?;
            if !target.is_text_editable() {
                log::error!("attempt to focus non-editable item {:?}", id);
                return Err(EditorError::InvalidSelection);
            }
        }
        if self.selection.focused_text() == item {
            return Ok(());
        }
        if let Some(step) = self.session.interrupt(&self.surface) {
            self.resync_text_block(&step.range, &step.after);
        }
        self.selection.set_focused_text(item);
        Ok(())
    }

    /// The item holding text focus.
    pub fn focused_text(&self) -> Option<ItemId> {
        self.selection.focused_text()
    }

    // Editing

    /// Whether a text edit may begin right now.
    pub fn can_edit_text(&self) -> bool {
        self.session.can_edit_text(&self.surface)
    }

    /// Announce an upcoming text mutation of `range`.
    pub fn will_edit_text_in_range(&mut self, range: DomRange) -> EditorResult<()> {
        self.session.will_edit_text_in_range(range, &self.surface)
    }

    /// Report that the announced mutation landed. Records one undo step and
    /// resynchronizes the text block owning `range` from the document.
    pub fn did_change_text_in_range(&mut self, range: DomRange) -> Option<UndoStep> {
        let step = self.session.did_change_text_in_range(range, &self.surface)?;
        self.resync_text_block(&step.range, &step.after);
        Some(step)
    }

    /// React to the surface resigning first responder. Commits any open
    /// edit scope; partial edits are kept.
    pub fn did_resign_first_responder(&mut self) {
        if let Some(step) = self.session.interrupt(&self.surface) {
            self.resync_text_block(&step.range, &step.after);
        }
    }

    fn resync_text_block(&mut self, range: &DomRange, content: &str) {
        let Some(id) = self.data_source.text_block_for_range(range) else {
            return;
        };
        if let Some(item) = self.tree.get_mut(id) {
            item.text = Some(content.to_string());
        }
        if let Some(controller) = self.controllers.get_mut(id) {
            controller.model_mut().text = Some(content.to_string());
        }
    }

    // Undo

    /// Whether an undo step is available.
    pub fn can_undo(&self) -> bool {
        self.session.undo_stack().can_undo()
    }

    /// Whether a redo step is available.
    pub fn can_redo(&self) -> bool {
        self.session.undo_stack().can_redo()
    }

    /// Revert the newest recorded edit. Returns whether anything happened.
    pub fn undo(&mut self) -> bool {
        let Some(step) = self.session.undo_stack_mut().undo() else {
            return false;
        };
        self.surface.set_text_in_range(&step.range, &step.before);
        self.resync_text_block(&step.range, &step.before);
        true
    }

    /// Re-apply the newest reverted edit. Returns whether anything
    /// happened.
    pub fn redo(&mut self) -> bool {
        let Some(step) = self.session.undo_stack_mut().redo() else {
            return false;
        };
        self.surface.set_text_in_range(&step.range, &step.after);
        self.resync_text_block(&step.range, &step.after);
        true
    }

    /// Whether edits are being recorded for undo.
    pub fn allows_undo(&self) -> bool {
        self.session.undo_stack().allows_undo()
    }

    /// Enable or disable undo recording.
    pub fn set_allows_undo(&mut self, allows: bool) {
        self.session.undo_stack_mut().set_allows_undo(allows);
    }

    /// Drop the entire undo history.
    pub fn remove_all_undo_actions(&mut self) {
        self.session.undo_stack_mut().remove_all_actions();
    }

    // Commands

    /// Write the selected items to `pasteboard` through the data source.
    pub fn copy_selection(&mut self, pasteboard: &mut Pasteboard) -> bool {
        let items = self.selection.selected().to_vec();
        if items.is_empty() {
            return false;
        }
        self.data_source.write_items_to_pasteboard(&items, pasteboard)
    }

    /// Delete the selected items through the data source, then prune them.
    pub fn delete_selection(&mut self) -> bool {
        let items = self.selection.selected().to_vec();
        if items.is_empty() {
            return false;
        }
        if !self.data_source.delete_items(&items) {
            return false;
        }
        self.items_removed(&items);
        true
    }

    /// Copy the selected items, then delete them.
    pub fn cut_selection(&mut self, pasteboard: &mut Pasteboard) -> bool {
        self.copy_selection(pasteboard) && self.delete_selection()
    }

    // Tree changes

    /// Inform the editor that content backing the given items was removed.
    /// Their subtrees leave the item tree and the selection is pruned, with
    /// at most one selection-changed broadcast.
    pub fn items_removed(&mut self, ids: &[ItemId]) {
        let mut dead = Vec::new();
        for &id in ids {
            dead.extend(self.tree.remove(id));
        }
        if dead.is_empty() {
            return;
        }
        if let Some(focused) = self.selection.focused_text()
            && dead.contains(&focused)
        {
            // The focused block is going away mid-edit; keep the partial
            // edit on the undo stack.
            self.session.interrupt(&self.surface);
        }
        for &id in &dead {
            self.controllers.remove(id);
        }
        log::debug!("pruned {} items from the tree", dead.len());
        if self.selection.prune(|id| !dead.contains(&id)) {
            self.events.push(EditorEvent::SelectionDidChange);
        }
    }

    // Deferred updates

    /// Mark an item's controller as needing a model push. Redundant marks
    /// coalesce until the next flush.
    pub fn set_needs_update(&mut self, item: ItemId) {
        self.controllers.set_needs_update(item);
    }

    /// Push every pending model change into the document. Hosts call this
    /// once per event-loop turn, before decorations are built. Items whose
    /// nodes vanished are treated as destroyed and pruned.
    pub fn flush_pending_updates(&mut self) {
        let failed = self.controllers.flush(&mut self.surface);
        if !failed.is_empty() {
            self.items_removed(&failed);
        }
    }

    // Drag and drop

    /// Highlight `node` as the drop target, or clear with `None`.
    pub fn move_drag_highlight_to_node(&mut self, node: Option<NodeId>) {
        self.drag.move_drag_highlight_to_node(node);
    }

    /// Move the drop caret to a collapsed `range`.
    pub fn move_drag_caret_to_range(&mut self, range: DomRange) -> EditorResult<()> {
        self.drag.move_drag_caret_to_range(range)
    }

    /// Remove the drop caret.
    pub fn remove_drag_caret(&mut self) {
        self.drag.remove_drag_caret();
    }

    /// Drop all drag feedback.
    pub fn clear_drag_feedback(&mut self) {
        self.drag.clear();
    }

    /// Ask the data source whether it claims `info`'s drop. Falls back to
    /// `proposed` when the data source leaves it to the editor.
    pub fn validate_drop(&mut self, info: &DragInfo, proposed: DropOperation) -> DropOperation {
        self.data_source
            .should_handle_drop(info)
            .unwrap_or(proposed)
    }

    // Notifications

    /// Forward a navigation request from the document to the delegate.
    pub fn navigation_requested(&mut self, action: &NavigationAction) {
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.handle_navigation_action(action);
        }
    }

    /// Drain pending broadcasts.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::ITEM_FLAVOR;
    use crate::dom::DomPosition;
    use crate::item::{Item, ItemKind};
    use crate::memory::MemorySurface;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Default)]
    struct SourceInner {
        roots: Vec<Item>,
        children: HashMap<ItemId, Vec<Item>>,
        text_blocks: HashMap<NodeId, ItemId>,
        deleted: Vec<ItemId>,
        refuse_delete: bool,
        drop_claim: Option<DropOperation>,
    }

    #[derive(Clone, Default)]
    struct TestSource {
        inner: Rc<RefCell<SourceInner>>,
    }

    impl EditorDataSource for TestSource {
        fn children_of_item(&self, item: Option<&Item>) -> Vec<Item> {
            let inner = self.inner.borrow();
            match item {
                None => inner.roots.clone(),
                Some(parent) => inner.children.get(&parent.id).cloned().unwrap_or_default(),
            }
        }

        fn text_block_for_range(&self, range: &DomRange) -> Option<ItemId> {
            self.inner.borrow().text_blocks.get(&range.start.node).copied()
        }

        fn delete_items(&mut self, items: &[ItemId]) -> bool {
            let mut inner = self.inner.borrow_mut();
            if inner.refuse_delete {
                return false;
            }
            inner.deleted.extend_from_slice(items);
            true
        }

        fn write_items_to_pasteboard(&self, items: &[ItemId], pasteboard: &mut Pasteboard) -> bool {
            let payload = serde_json::to_vec(items).unwrap();
            pasteboard.set_data(ITEM_FLAVOR, payload);
            true
        }

        fn should_handle_drop(&mut self, _info: &DragInfo) -> Option<DropOperation> {
            self.inner.borrow().drop_claim
        }
    }

    struct Fixture {
        editor: Editor<MemorySurface>,
        source: TestSource,
        a: ItemId,
        b: ItemId,
        b1: ItemId,
        b2: ItemId,
        c: ItemId,
        node_a: NodeId,
        node_b1: NodeId,
        node_b2: NodeId,
    }

    /// Three top-level items where `b` is a container holding a graphic
    /// `b1` and a text block `b2`.
    fn fixture() -> Fixture {
        let mut surface = MemorySurface::new();
        let root = surface.add_node(None);
        let node_a = surface.add_node(Some(root));
        let node_b = surface.add_node(Some(root));
        let node_b1 = surface.add_node(Some(node_b));
        let node_b2 = surface.add_node(Some(node_b));
        let node_c = surface.add_node(Some(root));

        for (node, id) in [
            (node_a, "a"),
            (node_b, "b"),
            (node_b1, "b1"),
            (node_b2, "b2"),
            (node_c, "c"),
        ] {
            surface.set_attribute(node, "id", id);
        }
        surface.set_text(node_b2, "callout body");
        surface.set_frame(root, Rect::new(0.0, 0.0, 800.0, 600.0));
        surface.set_frame(node_a, Rect::new(0.0, 0.0, 200.0, 100.0));
        surface.set_frame(node_b, Rect::new(0.0, 150.0, 400.0, 400.0));
        surface.set_frame(node_b1, Rect::new(20.0, 170.0, 180.0, 250.0));
        surface.set_frame(node_b2, Rect::new(20.0, 270.0, 380.0, 380.0));
        surface.set_frame(node_c, Rect::new(0.0, 450.0, 200.0, 550.0));
        surface.set_first_responder(true);
        surface.set_title("Home");

        let a = Item::new(ItemKind::Graphic, "a");
        let b = Item::new(ItemKind::Container, "b");
        let b1 = Item::new(ItemKind::Graphic, "b1");
        let b2 = Item::new(ItemKind::TextBlock, "b2");
        let c = Item::new(ItemKind::Graphic, "c");
        let (a_id, b_id, b1_id, b2_id, c_id) = (a.id, b.id, b1.id, b2.id, c.id);

        let source = TestSource::default();
        {
            let mut inner = source.inner.borrow_mut();
            inner.children.insert(b_id, vec![b1, b2]);
            inner.roots = vec![a, b, c];
            inner.text_blocks.insert(node_b2, b2_id);
        }

        let mut editor = Editor::new(surface, Box::new(source.clone()));
        editor.load_html("<html>site</html>", "file:///site/");
        assert!(editor.load_until_deadline(Instant::now() + Duration::from_secs(5)));
        assert!(editor.is_loaded());

        Fixture {
            editor,
            source,
            a: a_id,
            b: b_id,
            b1: b1_id,
            b2: b2_id,
            c: c_id,
            node_a,
            node_b1,
            node_b2,
        }
    }

    fn span(from_node: NodeId, from: u32, to_node: NodeId, to: u32) -> DomRange {
        DomRange::new(DomPosition::new(from_node, from), DomPosition::new(to_node, to))
    }

    #[test]
    fn test_load_resolves_item_ranges() {
        let fx = fixture();
        for id in [fx.a, fx.b, fx.b1, fx.b2, fx.c] {
            let item = fx.editor.tree().get(id).unwrap();
            assert!(item.node.is_some());
            assert!(item.range.is_some());
        }
        assert_eq!(
            fx.editor.tree().get(fx.b2).unwrap().text.as_deref(),
            Some("callout body")
        );
    }

    #[test]
    fn test_item_at_point_containment() {
        let fx = fixture();
        // Strictly inside b1's frame resolves to b1, never an unrelated item.
        assert_eq!(fx.editor.item_at_point(Point::new(100.0, 200.0)), Some(fx.b1));
        // Inside b but outside both children resolves to the container.
        assert_eq!(fx.editor.item_at_point(Point::new(390.0, 160.0)), Some(fx.b));
        // Background strikes nothing.
        assert_eq!(fx.editor.item_at_point(Point::new(700.0, 50.0)), None);
    }

    #[test]
    fn test_item_at_point_before_load_is_none() {
        let fx = fixture();
        let mut editor = Editor::new(MemorySurface::new(), Box::new(fx.source.clone()));
        assert_eq!(editor.item_at_point(Point::new(1.0, 1.0)), None);
        editor.pump();
    }

    #[test]
    fn test_items_in_range_spanning_container_boundary() {
        let fx = fixture();
        // From inside a to inside b1: a intersects, b is only partially
        // covered so it reports as a unit.
        let range = span(fx.node_a, 0, fx.node_b1, 0);
        assert_eq!(fx.editor.items_in_range(&range), vec![fx.a, fx.b]);
    }

    #[test]
    fn test_items_in_range_descends_into_containing_container() {
        let fx = fixture();
        let range = span(fx.node_b1, 0, fx.node_b2, 2);
        assert_eq!(fx.editor.items_in_range(&range), vec![fx.b1, fx.b2]);
    }

    #[test]
    fn test_items_in_range_inside_single_child() {
        let fx = fixture();
        let range = span(fx.node_b2, 1, fx.node_b2, 3);
        assert_eq!(fx.editor.items_in_range(&range), vec![fx.b2]);
    }

    #[test]
    fn test_sibling_extension_unions() {
        let mut fx = fixture();
        fx.editor.select_items(&[fx.b1], false).unwrap();
        fx.editor.select_items(&[fx.b2], true).unwrap();
        assert_eq!(fx.editor.selected_items(), &[fx.b1, fx.b2]);
        assert_eq!(fx.editor.selected_item(), Some(fx.b1));
    }

    #[test]
    fn test_incompatible_extension_resets() {
        let mut fx = fixture();
        fx.editor.select_items(&[fx.a, fx.b], false).unwrap();
        // c is top-level, but the reset rule is about the new items'
        // parent: b1 lives inside b, so extending with it starts over.
        fx.editor.select_items(&[fx.b1], true).unwrap();
        assert_eq!(fx.editor.selected_items(), &[fx.b1]);
    }

    #[test]
    fn test_selection_broadcasts_once_per_change() {
        let mut fx = fixture();
        fx.editor.select_items(&[fx.a, fx.c], false).unwrap();
        assert_eq!(
            fx.editor.take_events(),
            vec![EditorEvent::SelectionDidChange]
        );

        // Re-selecting the same set is not a change.
        fx.editor.select_items(&[fx.a, fx.c], false).unwrap();
        assert!(fx.editor.take_events().is_empty());

        // Deselecting something that is not selected is a no-op.
        fx.editor.deselect_item(fx.b1);
        assert!(fx.editor.take_events().is_empty());

        fx.editor.deselect_item(fx.a);
        assert_eq!(
            fx.editor.take_events(),
            vec![EditorEvent::SelectionDidChange]
        );
        assert_eq!(fx.editor.selected_items(), &[fx.c]);
    }

    #[test]
    fn test_selecting_unselectable_item_is_refused() {
        let mut fx = fixture();
        let body = Item::new(ItemKind::TextBlock, "body").with_selectable(false);
        let body_id = fx.editor.tree.insert(body, None);

        assert_eq!(
            fx.editor.select_items(&[body_id], false),
            Err(EditorError::InvalidSelection)
        );
        assert!(fx.editor.selected_items().is_empty());
        assert!(fx.editor.take_events().is_empty());
    }

    #[test]
    fn test_removed_item_leaves_selection_with_one_broadcast() {
        let mut fx = fixture();
        fx.editor.select_items(&[fx.b1, fx.b2], false).unwrap();
        fx.editor.take_events();

        fx.editor.items_removed(&[fx.b2]);

        assert_eq!(fx.editor.selected_items(), &[fx.b1]);
        assert!(!fx.editor.tree().contains(fx.b2));
        assert_eq!(
            fx.editor.take_events(),
            vec![EditorEvent::SelectionDidChange]
        );
    }

    #[test]
    fn test_removing_container_prunes_descendants() {
        let mut fx = fixture();
        fx.editor.select_items(&[fx.b1], false).unwrap();
        fx.editor.take_events();

        fx.editor.items_removed(&[fx.b]);

        assert!(fx.editor.selected_items().is_empty());
        assert!(!fx.editor.tree().contains(fx.b1));
        assert_eq!(
            fx.editor.take_events(),
            vec![EditorEvent::SelectionDidChange]
        );
    }

    #[test]
    fn test_load_until_past_deadline_does_not_hang() {
        let fx = fixture();
        let mut surface = MemorySurface::new();
        surface.set_pumps_until_loaded(None);
        let mut editor = Editor::new(surface, Box::new(fx.source.clone()));
        editor.load_html("<html>slow</html>", "file:///site/");

        let deadline = Instant::now() - Duration::from_secs(1);
        assert!(!editor.load_until_deadline(deadline));
        assert!(!editor.is_loaded());
    }

    #[test]
    fn test_edit_round_trip_resyncs_model() {
        let mut fx = fixture();
        fx.editor.set_focused_text(Some(fx.b2)).unwrap();
        let range = fx.editor.tree().get(fx.b2).unwrap().range.unwrap();

        fx.editor.will_edit_text_in_range(range).unwrap();
        fx.editor
            .surface_mut()
            .set_text_in_range(&range, "callout edited");
        // The change notification carries the range of the new content.
        let edited = span(fx.node_b2, 0, fx.node_b2, 14);
        let step = fx.editor.did_change_text_in_range(edited).unwrap();

        assert_eq!(step.before, "callout body");
        assert_eq!(step.after, "callout edited");
        assert!(fx.editor.can_undo());
        assert_eq!(
            fx.editor.tree().get(fx.b2).unwrap().text.as_deref(),
            Some("callout edited")
        );
    }

    #[test]
    fn test_undo_and_redo_restore_text() {
        let mut fx = fixture();
        let range = fx.editor.tree().get(fx.b2).unwrap().range.unwrap();
        fx.editor.will_edit_text_in_range(range).unwrap();
        fx.editor
            .surface_mut()
            .set_text_in_range(&range, "callout edited");
        let edited = span(fx.node_b2, 0, fx.node_b2, 14);
        fx.editor.did_change_text_in_range(edited).unwrap();

        assert!(fx.editor.undo());
        assert_eq!(
            fx.editor.surface().text_in_range(&range).as_deref(),
            Some("callout body")
        );
        assert_eq!(
            fx.editor.tree().get(fx.b2).unwrap().text.as_deref(),
            Some("callout body")
        );

        assert!(fx.editor.redo());
        assert_eq!(
            fx.editor.tree().get(fx.b2).unwrap().text.as_deref(),
            Some("callout edited")
        );
        assert!(!fx.editor.redo());
    }

    #[test]
    fn test_edit_refused_without_first_responder() {
        let mut fx = fixture();
        fx.editor.surface_mut().set_first_responder(false);
        let range = fx.editor.tree().get(fx.b2).unwrap().range.unwrap();

        assert!(!fx.editor.can_edit_text());
        assert_eq!(
            fx.editor.will_edit_text_in_range(range),
            Err(EditorError::EditNotPermitted)
        );
        assert!(!fx.editor.can_undo());
    }

    #[test]
    fn test_resign_commits_partial_edit() {
        let mut fx = fixture();
        let range = fx.editor.tree().get(fx.b2).unwrap().range.unwrap();
        fx.editor.will_edit_text_in_range(range).unwrap();
        fx.editor
            .surface_mut()
            .set_text_in_range(&range, "half done");

        fx.editor.did_resign_first_responder();

        assert!(fx.editor.can_undo());
        assert_eq!(
            fx.editor.tree().get(fx.b2).unwrap().text.as_deref(),
            Some("half done")
        );
    }

    #[test]
    fn test_copy_and_delete_selection() {
        let mut fx = fixture();
        fx.editor.select_items(&[fx.a], false).unwrap();

        let mut board = Pasteboard::new();
        assert!(fx.editor.copy_selection(&mut board));
        assert!(board.has_flavor(ITEM_FLAVOR));

        assert!(fx.editor.delete_selection());
        assert_eq!(fx.source.inner.borrow().deleted, vec![fx.a]);
        assert!(!fx.editor.tree().contains(fx.a));
        assert!(fx.editor.selected_items().is_empty());
    }

    #[test]
    fn test_delete_refused_by_data_source() {
        let mut fx = fixture();
        fx.source.inner.borrow_mut().refuse_delete = true;
        fx.editor.select_items(&[fx.a], false).unwrap();
        fx.editor.take_events();

        assert!(!fx.editor.delete_selection());
        assert!(fx.editor.tree().contains(fx.a));
        assert_eq!(fx.editor.selected_items(), &[fx.a]);
    }

    #[test]
    fn test_copy_with_empty_selection_fails() {
        let mut fx = fixture();
        let mut board = Pasteboard::new();
        assert!(!fx.editor.copy_selection(&mut board));
        assert!(!board.has_flavor(ITEM_FLAVOR));
    }

    #[test]
    fn test_validate_drop_prefers_data_source_claim() {
        let mut fx = fixture();
        let info = DragInfo {
            location: Point::new(10.0, 10.0),
            items: vec![fx.a],
        };
        assert_eq!(
            fx.editor.validate_drop(&info, DropOperation::Copy),
            DropOperation::Copy
        );

        fx.source.inner.borrow_mut().drop_claim = Some(DropOperation::Move);
        assert_eq!(
            fx.editor.validate_drop(&info, DropOperation::Copy),
            DropOperation::Move
        );
    }

    #[test]
    fn test_flush_prunes_items_with_dead_nodes() {
        let mut fx = fixture();
        fx.editor.select_items(&[fx.a], false).unwrap();
        fx.editor.take_events();
        fx.editor.set_needs_update(fx.a);
        fx.editor.surface_mut().remove_node(fx.node_a);

        fx.editor.flush_pending_updates();

        assert!(!fx.editor.tree().contains(fx.a));
        assert!(fx.editor.selected_items().is_empty());
        assert_eq!(
            fx.editor.take_events(),
            vec![EditorEvent::SelectionDidChange]
        );
    }

    #[test]
    fn test_flush_pushes_coalesced_model_changes() {
        let mut fx = fixture();
        {
            let controller = fx.editor.controllers.get_mut(fx.a).unwrap();
            controller
                .model_mut()
                .attributes
                .insert("class".to_string(), "pagelet".into());
        }
        fx.editor.set_needs_update(fx.a);
        fx.editor.set_needs_update(fx.a);

        fx.editor.flush_pending_updates();

        assert_eq!(
            fx.editor
                .surface()
                .node_attribute(fx.node_a, "class")
                .as_deref(),
            Some("pagelet")
        );
    }

    #[test]
    fn test_focus_handoff_commits_open_edit() {
        let mut fx = fixture();
        fx.editor.set_focused_text(Some(fx.b2)).unwrap();
        let range = fx.editor.tree().get(fx.b2).unwrap().range.unwrap();
        fx.editor.will_edit_text_in_range(range).unwrap();
        fx.editor
            .surface_mut()
            .set_text_in_range(&range, "interrupted");

        fx.editor.set_focused_text(None).unwrap();

        assert!(fx.editor.can_undo());
        assert_eq!(fx.editor.focused_text(), None);
    }

    #[test]
    fn test_focus_rejects_non_editable_item() {
        let mut fx = fixture();
        assert_eq!(
            fx.editor.set_focused_text(Some(fx.a)),
            Err(EditorError::InvalidSelection)
        );
        assert_eq!(fx.editor.focused_text(), None);
    }

    #[test]
    fn test_reload_resets_state() {
        let mut fx = fixture();
        fx.editor.select_items(&[fx.a], false).unwrap();
        fx.editor.take_events();

        fx.editor.load_html("<html>again</html>", "file:///site/");
        assert!(!fx.editor.is_loaded());
        assert!(fx.editor.selected_items().is_empty());
        assert_eq!(
            fx.editor.take_events(),
            vec![EditorEvent::SelectionDidChange]
        );

        assert!(fx.editor.load_until_deadline(Instant::now() + Duration::from_secs(5)));
        assert!(fx.editor.is_loaded());
        assert_eq!(fx.editor.tree().len(), 5);
    }

    #[test]
    fn test_delegate_hears_load_and_title() {
        #[derive(Default)]
        struct RecordingDelegate {
            log: Rc<RefCell<Vec<String>>>,
        }
        impl EditorDelegate for RecordingDelegate {
            fn did_finish_loading(&mut self) {
                self.log.borrow_mut().push("loaded".to_string());
            }
            fn did_receive_title(&mut self, title: &str) {
                self.log.borrow_mut().push(format!("title:{title}"));
            }
            fn handle_navigation_action(&mut self, action: &NavigationAction) {
                self.log.borrow_mut().push(format!("nav:{}", action.url));
            }
        }

        let fx = fixture();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut surface = MemorySurface::new();
        surface.set_title("About");
        let mut editor = Editor::new(surface, Box::new(fx.source.clone()));
        editor.set_delegate(Some(Box::new(RecordingDelegate { log: log.clone() })));

        editor.load_html("<html>about</html>", "file:///site/about/");
        editor.pump();
        editor.navigation_requested(&NavigationAction {
            url: "https://example.com/".to_string(),
        });

        assert_eq!(
            log.borrow().as_slice(),
            &[
                "loaded".to_string(),
                "title:About".to_string(),
                "nav:https://example.com/".to_string()
            ]
        );
    }
}
