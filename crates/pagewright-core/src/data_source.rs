//! Host-side collaborators of the editor.
//!
//! The editor knows how to display and manipulate arbitrary content but
//! owns none of it; a data source supplies the item hierarchy and performs
//! model mutations, while a delegate receives fire-and-forget lifecycle
//! notifications.

use crate::dom::DomRange;
use crate::item::{Item, ItemId};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pasteboard flavor used for the editor's default item serialization.
pub const ITEM_FLAVOR: &str = "application/x-pagewright-items";

/// A named-flavor pasteboard.
///
/// The serialization formats themselves belong to the host; this is only
/// the carrier the data source writes into.
#[derive(Debug, Clone, Default)]
pub struct Pasteboard {
    flavors: HashMap<String, Vec<u8>>,
}

impl Pasteboard {
    /// Create an empty pasteboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` under `flavor`, replacing prior contents.
    pub fn set_data(&mut self, flavor: &str, data: Vec<u8>) {
        self.flavors.insert(flavor.to_string(), data);
    }

    /// Read the data stored under `flavor`.
    pub fn data(&self, flavor: &str) -> Option<&[u8]> {
        self.flavors.get(flavor).map(Vec::as_slice)
    }

    /// Whether `flavor` is present.
    pub fn has_flavor(&self, flavor: &str) -> bool {
        self.flavors.contains_key(flavor)
    }

    /// Drop every flavor.
    pub fn clear(&mut self) {
        self.flavors.clear();
    }
}

/// The operation a drop would perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropOperation {
    /// Refuse the drop.
    None,
    /// Copy the dragged content in.
    Copy,
    /// Move the dragged content.
    Move,
    /// Insert a reference to the dragged content.
    Link,
}

/// What the editor knows about an in-flight drag when validating a drop.
#[derive(Debug, Clone)]
pub struct DragInfo {
    /// Pointer location in surface coordinates.
    pub location: Point,
    /// Items being dragged, when the drag originated inside the editor.
    pub items: Vec<ItemId>,
}

/// Pull-based supplier of content. All queries are made on demand; the
/// editor caches nothing across tree rebuilds.
pub trait EditorDataSource {
    /// Ordered children of `item`, or the top-level items for `None`.
    fn children_of_item(&self, item: Option<&Item>) -> Vec<Item>;

    /// The text block owning `range`. Looked up on demand after each edit
    /// rather than cached by the editor.
    fn text_block_for_range(&self, range: &DomRange) -> Option<ItemId>;

    /// Delete the given items from the model. Returns false if the model
    /// refused.
    fn delete_items(&mut self, items: &[ItemId]) -> bool;

    /// Serialize the given items onto `pasteboard`. Returns false if the
    /// items could not be written.
    fn write_items_to_pasteboard(&self, items: &[ItemId], pasteboard: &mut Pasteboard) -> bool;

    /// Claim a drop by returning the operation to perform, or `None` to let
    /// the editor fall back to its default insertion.
    fn should_handle_drop(&mut self, info: &DragInfo) -> Option<DropOperation>;
}

/// A navigation the rendered document asked to perform, e.g. a followed
/// link. The delegate decides whether anything happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationAction {
    /// Destination of the request.
    pub url: String,
}

/// Push-based observer of editor lifecycle. All notifications are
/// fire-and-forget; the default bodies ignore them.
pub trait EditorDelegate {
    /// The document finished loading and items are ready.
    fn did_finish_loading(&mut self) {}

    /// The document reported its title.
    fn did_receive_title(&mut self, _title: &str) {}

    /// The document requested a navigation.
    fn handle_navigation_action(&mut self, _action: &NavigationAction) {}
}
