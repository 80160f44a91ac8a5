//! The boundary to the external document engine.

use crate::dom::{DomPosition, DomRange, NodeId};
use kurbo::{Point, Rect};
use std::cmp::Ordering;

/// The rendering engine that owns the document tree.
///
/// The editing core never walks or mutates the rendered tree on its own;
/// every query and write goes through this trait. The engine is the
/// authority on node and range identity, ordering, and visual layout.
///
/// Write methods (`set_node_attribute`, `set_text_in_range`) are reserved
/// for element controllers and the editing session coordinator. All other
/// components are read-only with respect to the rendered tree.
pub trait DocumentSurface {
    // Load lifecycle

    /// Begin loading a hypertext string resolved against `base_url`.
    fn load_html(&mut self, html: &str, base_url: &str);

    /// Whether a load is still in flight.
    fn is_loading(&self) -> bool;

    /// Advance pending engine work by one cooperative step.
    fn pump_event_loop(&mut self);

    /// The document title, once received.
    fn title(&self) -> Option<String>;

    // Node queries

    /// Hit-test the rendered surface. Returns the deepest node whose visual
    /// bounds contain `point`, or `None` for chrome and background.
    fn node_at_point(&self, point: Point) -> Option<NodeId>;

    /// The parent of `node`, or `None` at the document root.
    fn parent_node(&self, node: NodeId) -> Option<NodeId>;

    /// Read one attribute of `node`.
    fn node_attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Find the first node carrying `name="value"`, in document order.
    fn find_node_by_attribute(&self, name: &str, value: &str) -> Option<NodeId>;

    /// Write one attribute of `node`.
    fn set_node_attribute(&mut self, node: NodeId, name: &str, value: &str);

    /// The range spanning the full content of `node`, if the node is live.
    fn node_range(&self, node: NodeId) -> Option<DomRange>;

    // Range queries

    /// Order two positions by document position.
    fn compare_positions(&self, a: DomPosition, b: DomPosition) -> Ordering;

    /// The visual bounds of `range`, or `None` while it has no layout
    /// (off-screen content, stale handles).
    fn bounds_of_range(&self, range: &DomRange) -> Option<Rect>;

    /// The character data covered by `range`, or `None` for stale handles.
    fn text_in_range(&self, range: &DomRange) -> Option<String>;

    /// Replace the character data covered by `range`.
    fn set_text_in_range(&mut self, range: &DomRange, text: &str);

    // Focus

    /// Whether the surface currently holds keyboard focus.
    fn is_first_responder(&self) -> bool;

    // Derived range relations

    /// Whether two ranges share at least one position.
    fn ranges_intersect(&self, a: &DomRange, b: &DomRange) -> bool {
        self.compare_positions(a.start, b.end) != Ordering::Greater
            && self.compare_positions(b.start, a.end) != Ordering::Greater
    }

    /// Whether `outer` fully contains `inner`.
    fn range_contains(&self, outer: &DomRange, inner: &DomRange) -> bool {
        self.compare_positions(outer.start, inner.start) != Ordering::Greater
            && self.compare_positions(inner.end, outer.end) != Ordering::Greater
    }
}
