//! The application-owned tree of editable items.
//!
//! Items are the semantic units the user selects and edits: placed graphics,
//! editable text regions, and containers such as callouts and collections.
//! They are plain values held in a registry; parent links are ids, never
//! owning references, and the whole tree can be rebuilt from the data source
//! at any time.

use crate::data_source::EditorDataSource;
use crate::dom::{DomRange, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Mint a fresh id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

/// The content variant of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// A placed graphic: image, embedded media, plugin output.
    Graphic,
    /// An editable region of body text.
    TextBlock,
    /// A container grouping child items: callout, collection, sidebar.
    Container,
}

/// One editable unit of content.
///
/// Capabilities are queries on the value rather than a type hierarchy:
/// every item can normally be selected, text blocks can additionally take
/// text focus, containers can hold children. A text block may opt out of
/// unit selection (`selectable: false`) while staying editable in place,
/// which is how page body text behaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Identity, stable for the item's lifetime.
    pub id: ItemId,
    /// Content variant.
    pub kind: ItemKind,
    /// Whether the item can be selected as a unit.
    pub selectable: bool,
    /// The `id` attribute of the item's element in the rendered document.
    pub element_id: Option<String>,
    /// Bound document node, once located.
    pub node: Option<NodeId>,
    /// Current document range. `None` until the document finishes loading.
    pub range: Option<DomRange>,
    /// Model text for text blocks, resynced after each edit.
    pub text: Option<String>,
}

impl Item {
    /// Create an item of `kind` backed by the element carrying `element_id`.
    pub fn new(kind: ItemKind, element_id: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            kind,
            selectable: true,
            element_id: Some(element_id.into()),
            node: None,
            range: None,
            text: None,
        }
    }

    /// Override unit selectability.
    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    /// Whether the item can be selected as a unit.
    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    /// Whether the item can take text focus.
    pub fn is_text_editable(&self) -> bool {
        matches!(self.kind, ItemKind::TextBlock)
    }

    /// Whether the item holds child items.
    pub fn is_container(&self) -> bool {
        matches!(self.kind, ItemKind::Container)
    }
}

/// Registry of live items with parent/child links expressed as ids.
///
/// Children lists preserve document order. The tree owns no document
/// content; it mirrors what the data source reports and is cheap to rebuild.
#[derive(Debug, Clone, Default)]
pub struct ItemTree {
    items: HashMap<ItemId, Item>,
    parents: HashMap<ItemId, ItemId>,
    children: HashMap<ItemId, Vec<ItemId>>,
    roots: Vec<ItemId>,
}

impl ItemTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `item` under `parent` (`None` for top level), after any
    /// existing siblings.
    pub fn insert(&mut self, item: Item, parent: Option<ItemId>) -> ItemId {
        let id = item.id;
        self.items.insert(id, item);
        match parent {
            Some(p) => {
                self.parents.insert(id, p);
                self.children.entry(p).or_default().push(id);
            }
            None => self.roots.push(id),
        }
        id
    }

    /// Remove an item and its subtree. Returns every removed id, the
    /// requested one included, or an empty list if it was not present.
    pub fn remove(&mut self, id: ItemId) -> Vec<ItemId> {
        if !self.items.contains_key(&id) {
            return Vec::new();
        }
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.items.remove(&current).is_none() {
                continue;
            }
            removed.push(current);
            if let Some(children) = self.children.remove(&current) {
                stack.extend(children);
            }
            self.parents.remove(&current);
        }
        self.roots.retain(|&r| r != id);
        for list in self.children.values_mut() {
            list.retain(|c| !removed.contains(c));
        }
        removed
    }

    /// Drop every item.
    pub fn clear(&mut self) {
        self.items.clear();
        self.parents.clear();
        self.children.clear();
        self.roots.clear();
    }

    /// Look up an item.
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Look up an item mutably.
    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    /// Whether `id` is live in the tree.
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// The parent of `id`, if it has one.
    pub fn parent(&self, id: ItemId) -> Option<ItemId> {
        self.parents.get(&id).copied()
    }

    /// Ordered children of `parent` (`None` for the top level).
    pub fn children(&self, parent: Option<ItemId>) -> &[ItemId] {
        match parent {
            Some(p) => self.children.get(&p).map(Vec::as_slice).unwrap_or(&[]),
            None => &self.roots,
        }
    }

    /// Whether `id` sits somewhere below `ancestor`.
    pub fn is_descendant_of(&self, id: ItemId, ancestor: ItemId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Every live id in document order, depth first.
    pub fn ids_in_document_order(&self) -> Vec<ItemId> {
        let mut out = Vec::with_capacity(self.items.len());
        let mut stack: Vec<ItemId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(children) = self.children.get(&id) {
                stack.extend(children.iter().rev());
            }
        }
        out
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the tree holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rebuild the whole tree from the data source's item hierarchy.
    pub fn reload(&mut self, data_source: &dyn EditorDataSource) {
        self.clear();
        let top = data_source.children_of_item(None);
        for item in top {
            self.insert_recursively(item, None, data_source);
        }
    }

    fn insert_recursively(
        &mut self,
        item: Item,
        parent: Option<ItemId>,
        data_source: &dyn EditorDataSource,
    ) {
        let children = data_source.children_of_item(Some(&item));
        let id = self.insert(item, parent);
        for child in children {
            self.insert_recursively(child, Some(id), data_source);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> (ItemTree, ItemId, ItemId, ItemId, ItemId) {
        let mut tree = ItemTree::new();
        let a = tree.insert(Item::new(ItemKind::Graphic, "a"), None);
        let b = tree.insert(Item::new(ItemKind::Container, "b"), None);
        let b1 = tree.insert(Item::new(ItemKind::Graphic, "b1"), Some(b));
        let b2 = tree.insert(Item::new(ItemKind::TextBlock, "b2"), Some(b));
        (tree, a, b, b1, b2)
    }

    #[test]
    fn test_parent_and_children() {
        let (tree, a, b, b1, b2) = sample_tree();
        assert_eq!(tree.children(None), &[a, b]);
        assert_eq!(tree.children(Some(b)), &[b1, b2]);
        assert_eq!(tree.parent(b1), Some(b));
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn test_remove_subtree() {
        let (mut tree, a, b, b1, b2) = sample_tree();
        let removed = tree.remove(b);
        assert_eq!(removed.len(), 3);
        assert!(removed.contains(&b) && removed.contains(&b1) && removed.contains(&b2));
        assert!(tree.contains(a));
        assert!(!tree.contains(b1));
        assert_eq!(tree.children(None), &[a]);
    }

    #[test]
    fn test_remove_missing_is_empty() {
        let (mut tree, ..) = sample_tree();
        assert!(tree.remove(ItemId::new()).is_empty());
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_descendant_query() {
        let (tree, a, b, b1, _) = sample_tree();
        assert!(tree.is_descendant_of(b1, b));
        assert!(!tree.is_descendant_of(b1, a));
        assert!(!tree.is_descendant_of(b, b1));
    }

    #[test]
    fn test_document_order() {
        let (tree, a, b, b1, b2) = sample_tree();
        assert_eq!(tree.ids_in_document_order(), vec![a, b, b1, b2]);
    }

    #[test]
    fn test_capabilities() {
        let graphic = Item::new(ItemKind::Graphic, "g");
        let body = Item::new(ItemKind::TextBlock, "body").with_selectable(false);
        let callout = Item::new(ItemKind::Container, "callout");

        assert!(graphic.is_selectable() && !graphic.is_text_editable());
        assert!(body.is_text_editable() && !body.is_selectable());
        assert!(callout.is_container() && callout.is_selectable());
    }
}
