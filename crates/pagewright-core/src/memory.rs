//! In-memory document surface.
//!
//! A headless stand-in for the real document engine: a small node tree with
//! per-node frames, attributes and character data, plus a scriptable load
//! lifecycle. Every test in the workspace drives the core through this
//! surface, and hosts can use it to exercise editing logic without a
//! rendering engine attached.

use crate::dom::{DomPosition, DomRange, NodeId};
use crate::surface::DocumentSurface;
use kurbo::{Point, Rect};
use std::cmp::Ordering;
use std::collections::HashMap;

/// One node of the in-memory document tree.
#[derive(Debug, Clone)]
struct MemoryNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: HashMap<String, String>,
    /// Visual frame, if the node has layout.
    frame: Option<Rect>,
    /// The node's own character data.
    text: String,
    /// Document-order interval assigned by `relayout`. The node's own text
    /// sits at the front of the interval, children after it.
    span: (u64, u64),
    depth: usize,
}

impl MemoryNode {
    fn new(parent: Option<NodeId>, depth: usize) -> Self {
        Self {
            parent,
            children: Vec::new(),
            attributes: HashMap::new(),
            frame: None,
            text: String::new(),
            span: (0, 0),
            depth,
        }
    }
}

/// In-memory implementation of [`DocumentSurface`].
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    nodes: HashMap<NodeId, MemoryNode>,
    roots: Vec<NodeId>,
    next_node: u64,
    loading: bool,
    /// Pumps left before a pending load completes. `None` never completes.
    pumps_remaining: Option<u32>,
    pumps_per_load: Option<u32>,
    title: Option<String>,
    first_responder: bool,
}

impl MemorySurface {
    /// Create an empty surface that completes loads after one pump.
    pub fn new() -> Self {
        Self {
            pumps_per_load: Some(1),
            ..Self::default()
        }
    }

    /// Configure how many event-loop pumps a load takes. `None` makes loads
    /// hang forever, for deadline tests.
    pub fn set_pumps_until_loaded(&mut self, pumps: Option<u32>) {
        self.pumps_per_load = pumps;
    }

    /// Set the document title reported to the editor.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Set whether the surface holds keyboard focus.
    pub fn set_first_responder(&mut self, focused: bool) {
        self.first_responder = focused;
    }

    // Tree construction

    /// Add a node under `parent` (`None` for a document root).
    pub fn add_node(&mut self, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        let depth = parent
            .and_then(|p| self.nodes.get(&p))
            .map(|n| n.depth + 1)
            .unwrap_or(0);
        self.nodes.insert(id, MemoryNode::new(parent, depth));
        match parent {
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(&p) {
                    node.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        self.relayout();
        id
    }

    /// Set a node's visual frame.
    pub fn set_frame(&mut self, node: NodeId, frame: Rect) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.frame = Some(frame);
        }
    }

    /// Set a node's character data.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.text = text.into();
        }
        self.relayout();
    }

    /// Set a node attribute during tree construction.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.attributes.insert(name.to_string(), value.to_string());
        }
    }

    /// Remove a node and its subtree, simulating external content removal.
    pub fn remove_node(&mut self, node: NodeId) {
        let Some(removed) = self.nodes.remove(&node) else {
            return;
        };
        for child in removed.children.clone() {
            self.remove_node(child);
        }
        match removed.parent {
            Some(p) => {
                if let Some(parent) = self.nodes.get_mut(&p) {
                    parent.children.retain(|&c| c != node);
                }
            }
            None => self.roots.retain(|&r| r != node),
        }
        self.relayout();
    }

    /// Whether `node` is still part of the tree.
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    // Layout

    /// Reassign document-order spans. Each node reserves one slot on entry,
    /// room for its own character data, then its children, then one slot on
    /// exit, so sibling spans never touch.
    fn relayout(&mut self) {
        let roots = self.roots.clone();
        let mut counter = 0u64;
        for root in roots {
            self.assign_span(root, &mut counter);
        }
    }

    fn assign_span(&mut self, node: NodeId, counter: &mut u64) {
        let (text_len, children) = match self.nodes.get(&node) {
            Some(n) => (n.text.chars().count() as u64, n.children.clone()),
            None => return,
        };
        let start = *counter;
        *counter += 1 + text_len;
        for child in children {
            self.assign_span(child, counter);
        }
        let end = *counter;
        *counter += 1;
        if let Some(n) = self.nodes.get_mut(&node) {
            n.span = (start, end);
        }
    }

    /// Map a position to the document-order line.
    fn linear(&self, pos: DomPosition) -> Option<u64> {
        let node = self.nodes.get(&pos.node)?;
        Some(node.span.0 + 1 + pos.offset as u64)
    }

    fn depth_first(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }
}

impl DocumentSurface for MemorySurface {
    fn load_html(&mut self, html: &str, base_url: &str) {
        log::debug!(
            "memory surface: loading {} bytes against {}",
            html.len(),
            base_url
        );
        self.loading = true;
        self.pumps_remaining = self.pumps_per_load;
    }

    fn is_loading(&self) -> bool {
        self.loading
    }

    fn pump_event_loop(&mut self) {
        if !self.loading {
            return;
        }
        if let Some(remaining) = self.pumps_remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                self.loading = false;
            }
        }
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }

    fn node_at_point(&self, point: Point) -> Option<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.frame.is_some_and(|f| f.contains(point)))
            .max_by_key(|(_, n)| n.depth)
            .map(|(&id, _)| id)
    }

    fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node)?.parent
    }

    fn node_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.get(&node)?.attributes.get(name).cloned()
    }

    fn find_node_by_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
        self.depth_first().into_iter().find(|id| {
            self.nodes
                .get(id)
                .and_then(|n| n.attributes.get(name))
                .is_some_and(|v| v == value)
        })
    }

    fn set_node_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn node_range(&self, node: NodeId) -> Option<DomRange> {
        let n = self.nodes.get(&node)?;
        let extent = (n.span.1 - n.span.0).saturating_sub(1) as u32;
        Some(DomRange::new(
            DomPosition::new(node, 0),
            DomPosition::new(node, extent),
        ))
    }

    fn compare_positions(&self, a: DomPosition, b: DomPosition) -> Ordering {
        match (self.linear(a), self.linear(b)) {
            (Some(la), Some(lb)) => la.cmp(&lb),
            // Stale handles have no order; treat them as equal rather than
            // inventing one.
            _ => Ordering::Equal,
        }
    }

    fn bounds_of_range(&self, range: &DomRange) -> Option<Rect> {
        let start = self.nodes.get(&range.start.node)?.frame?;
        if range.start.node == range.end.node {
            return Some(start);
        }
        let end = self.nodes.get(&range.end.node)?.frame?;
        Some(start.union(end))
    }

    fn text_in_range(&self, range: &DomRange) -> Option<String> {
        let la = self.linear(range.start)?;
        let lb = self.linear(range.end)?;
        let (la, lb) = if la <= lb { (la, lb) } else { (lb, la) };
        let mut out = String::new();
        for id in self.depth_first() {
            let node = &self.nodes[&id];
            let text_start = node.span.0 + 1;
            let text_end = text_start + node.text.chars().count() as u64;
            let from = la.max(text_start);
            let to = lb.min(text_end);
            if from < to {
                out.extend(
                    node.text
                        .chars()
                        .skip((from - text_start) as usize)
                        .take((to - from) as usize),
                );
            }
        }
        Some(out)
    }

    fn set_text_in_range(&mut self, range: &DomRange, text: &str) {
        // Writes are clipped to the start node's character data; the editing
        // core only rewrites text inside a single editable region.
        let node = range.start.node;
        let Some(n) = self.nodes.get_mut(&node) else {
            return;
        };
        let len = n.text.chars().count() as u32;
        let from = range.start.offset.min(len) as usize;
        let to = if range.end.node == node {
            range.end.offset.min(len) as usize
        } else {
            len as usize
        };
        let mut chars: Vec<char> = n.text.chars().collect();
        chars.splice(from..to.max(from), text.chars());
        n.text = chars.into_iter().collect();
        self.relayout();
    }

    fn is_first_responder(&self) -> bool {
        self.first_responder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_siblings() -> (MemorySurface, NodeId, NodeId, NodeId, NodeId) {
        let mut surface = MemorySurface::new();
        let root = surface.add_node(None);
        let a = surface.add_node(Some(root));
        let b = surface.add_node(Some(root));
        let c = surface.add_node(Some(root));
        surface.set_text(a, "alpha");
        surface.set_text(b, "beta");
        surface.set_text(c, "gamma");
        (surface, root, a, b, c)
    }

    #[test]
    fn test_sibling_order() {
        let (surface, _, a, b, c) = three_siblings();
        let pa = DomPosition::new(a, 0);
        let pb = DomPosition::new(b, 0);
        let pc = DomPosition::new(c, 2);
        assert_eq!(surface.compare_positions(pa, pb), Ordering::Less);
        assert_eq!(surface.compare_positions(pc, pb), Ordering::Greater);
        assert_eq!(surface.compare_positions(pa, pa), Ordering::Equal);
    }

    #[test]
    fn test_parent_span_contains_children() {
        let (surface, root, a, _, c) = three_siblings();
        let root_range = surface.node_range(root).unwrap();
        let a_range = surface.node_range(a).unwrap();
        let c_range = surface.node_range(c).unwrap();
        assert!(surface.range_contains(&root_range, &a_range));
        assert!(surface.range_contains(&root_range, &c_range));
        assert!(!surface.ranges_intersect(&a_range, &c_range));
    }

    #[test]
    fn test_hit_test_prefers_deepest_node() {
        let mut surface = MemorySurface::new();
        let root = surface.add_node(None);
        let child = surface.add_node(Some(root));
        surface.set_frame(root, Rect::new(0.0, 0.0, 200.0, 200.0));
        surface.set_frame(child, Rect::new(50.0, 50.0, 150.0, 150.0));

        assert_eq!(
            surface.node_at_point(Point::new(100.0, 100.0)),
            Some(child)
        );
        assert_eq!(surface.node_at_point(Point::new(10.0, 10.0)), Some(root));
        assert_eq!(surface.node_at_point(Point::new(500.0, 500.0)), None);
    }

    #[test]
    fn test_text_round_trip() {
        let (mut surface, _, a, _, _) = three_siblings();
        let range = DomRange::new(DomPosition::new(a, 1), DomPosition::new(a, 4));
        assert_eq!(surface.text_in_range(&range).unwrap(), "lph");

        surface.set_text_in_range(&range, "LPH");
        let whole = surface.node_range(a).unwrap();
        assert_eq!(surface.text_in_range(&whole).unwrap(), "aLPHa");
    }

    #[test]
    fn test_text_across_siblings() {
        let (surface, _, a, b, _) = three_siblings();
        let range = DomRange::new(DomPosition::new(a, 3), DomPosition::new(b, 2));
        assert_eq!(surface.text_in_range(&range).unwrap(), "habe");
    }

    #[test]
    fn test_load_completes_after_configured_pumps() {
        let mut surface = MemorySurface::new();
        surface.set_pumps_until_loaded(Some(3));
        surface.load_html("<p>hi</p>", "file:///site/");
        assert!(surface.is_loading());
        surface.pump_event_loop();
        surface.pump_event_loop();
        assert!(surface.is_loading());
        surface.pump_event_loop();
        assert!(!surface.is_loading());
    }

    #[test]
    fn test_load_can_hang_forever() {
        let mut surface = MemorySurface::new();
        surface.set_pumps_until_loaded(None);
        surface.load_html("<p>hi</p>", "file:///site/");
        for _ in 0..32 {
            surface.pump_event_loop();
        }
        assert!(surface.is_loading());
    }

    #[test]
    fn test_remove_node_drops_subtree() {
        let mut surface = MemorySurface::new();
        let root = surface.add_node(None);
        let parent = surface.add_node(Some(root));
        let child = surface.add_node(Some(parent));
        surface.remove_node(parent);
        assert!(!surface.contains_node(parent));
        assert!(!surface.contains_node(child));
        assert!(surface.contains_node(root));
    }

    #[test]
    fn test_find_node_by_attribute() {
        let mut surface = MemorySurface::new();
        let root = surface.add_node(None);
        let a = surface.add_node(Some(root));
        surface.set_attribute(a, "id", "graphic-7");
        assert_eq!(surface.find_node_by_attribute("id", "graphic-7"), Some(a));
        assert_eq!(surface.find_node_by_attribute("id", "missing"), None);
    }
}
