//! Opaque references into the rendered document tree.
//!
//! Node and range identity belongs to the external document engine. These
//! types carry no tree logic of their own; ordering and containment queries
//! go through the [`DocumentSurface`](crate::surface::DocumentSurface) that
//! issued the handles.

use serde::{Deserialize, Serialize};

/// Opaque handle to a node in the rendered document.
///
/// Valid only while the document that produced it stays loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// A caret position inside a node's character data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomPosition {
    /// The node holding the position.
    pub node: NodeId,
    /// Character offset within the node.
    pub offset: u32,
}

impl DomPosition {
    /// Create a position at `offset` inside `node`.
    pub fn new(node: NodeId, offset: u32) -> Self {
        Self { node, offset }
    }
}

/// A range between two positions in the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomRange {
    /// Start of the range.
    pub start: DomPosition,
    /// End of the range. Equal to `start` for a collapsed range.
    pub end: DomPosition,
}

impl DomRange {
    /// Create a range spanning `start` to `end`.
    pub fn new(start: DomPosition, end: DomPosition) -> Self {
        Self { start, end }
    }

    /// A collapsed range at `position`.
    pub fn caret(position: DomPosition) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Whether the range has zero length.
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}
