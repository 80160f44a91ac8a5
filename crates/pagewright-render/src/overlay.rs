//! Overlay decorations drawn above the rendered document.
//!
//! A pure read path: editor state in, draw commands out. Nothing here
//! mutates the document, and any range that currently has no visual bounds
//! simply contributes no decoration.

use kurbo::{Line, Rect};
use pagewright_core::drag::DragFeedbackState;
use pagewright_core::item::{ItemId, ItemTree};
use pagewright_core::selection::SelectionState;
use pagewright_core::surface::DocumentSurface;
use peniko::Color;

/// Read-only inputs for one decoration pass.
pub struct DecorationContext<'a> {
    /// Current selection.
    pub selection: &'a SelectionState,
    /// Current drag feedback.
    pub drag: &'a DragFeedbackState,
    /// The live item tree.
    pub tree: &'a ItemTree,
    /// The surface that owns layout.
    pub surface: &'a dyn DocumentSurface,
    /// The rectangle being redrawn; decorations outside it are skipped.
    pub dirty_rect: Rect,
    /// Selection outline color.
    pub selection_color: Color,
    /// Focus ring color for the text-focused item.
    pub focus_color: Color,
    /// Drop-target highlight color.
    pub drag_highlight_color: Color,
    /// Drop caret color.
    pub drag_caret_color: Color,
}

impl<'a> DecorationContext<'a> {
    /// Create a context with the default decoration colors.
    pub fn new(
        selection: &'a SelectionState,
        drag: &'a DragFeedbackState,
        tree: &'a ItemTree,
        surface: &'a dyn DocumentSurface,
        dirty_rect: Rect,
    ) -> Self {
        Self {
            selection,
            drag,
            tree,
            surface,
            dirty_rect,
            selection_color: Color::from_rgba8(59, 130, 246, 255),
            focus_color: Color::from_rgba8(16, 185, 129, 255),
            drag_highlight_color: Color::from_rgba8(59, 130, 246, 96),
            drag_caret_color: Color::from_rgba8(30, 64, 175, 255),
        }
    }

    /// Override the selection outline color.
    pub fn with_selection_color(mut self, color: Color) -> Self {
        self.selection_color = color;
        self
    }

    /// Override the focus ring color.
    pub fn with_focus_color(mut self, color: Color) -> Self {
        self.focus_color = color;
        self
    }

    /// Override the drag feedback colors.
    pub fn with_drag_colors(mut self, highlight: Color, caret: Color) -> Self {
        self.drag_highlight_color = highlight;
        self.drag_caret_color = caret;
        self
    }
}

/// One decoration draw command.
#[derive(Debug, Clone, Copy)]
pub enum Decoration {
    /// Outline around a selected item.
    SelectionOutline {
        /// Visual bounds of the item.
        rect: Rect,
        /// Whether this is the primary selected item.
        primary: bool,
        /// Outline color.
        color: Color,
    },
    /// Ring around the text-focused item.
    FocusRing {
        /// Visual bounds of the item.
        rect: Rect,
        /// Ring color.
        color: Color,
    },
    /// Box over the highlighted drop target.
    DragHighlight {
        /// Visual bounds of the target node.
        rect: Rect,
        /// Fill color.
        color: Color,
    },
    /// Vertical caret line at the drop position.
    DragCaret {
        /// The caret line.
        line: Line,
        /// Line color.
        color: Color,
    },
}

/// Backend that paints decorations, e.g. into a layer above the rendering
/// surface.
pub trait OverlayPainter {
    /// Paint one pass of decorations, already clipped to the dirty rect.
    fn draw_overlay(&mut self, decorations: &[Decoration]);
}

/// Produce the decoration commands for the current editor state.
pub fn build_decorations(ctx: &DecorationContext) -> Vec<Decoration> {
    let mut out = Vec::new();

    let primary = ctx.selection.primary();
    for &id in ctx.selection.selected() {
        let Some(rect) = item_bounds(ctx, id) else {
            continue;
        };
        if !intersects(ctx.dirty_rect, rect) {
            continue;
        }
        out.push(Decoration::SelectionOutline {
            rect,
            primary: primary == Some(id),
            color: ctx.selection_color,
        });
    }

    if let Some(focused) = ctx.selection.focused_text()
        && let Some(rect) = item_bounds(ctx, focused)
        && intersects(ctx.dirty_rect, rect)
    {
        out.push(Decoration::FocusRing {
            rect,
            color: ctx.focus_color,
        });
    }

    if let Some(rect) = ctx.drag.drag_highlight_rect(ctx.surface)
        && intersects(ctx.dirty_rect, rect)
    {
        out.push(Decoration::DragHighlight {
            rect,
            color: ctx.drag_highlight_color,
        });
    }

    if let Some(rect) = ctx.drag.drag_caret_rect(ctx.surface) {
        let line = Line::new((rect.x0, rect.y0), (rect.x0, rect.y1));
        if ctx.dirty_rect.x0 <= rect.x0
            && rect.x0 <= ctx.dirty_rect.x1
            && rect.y0 <= ctx.dirty_rect.y1
            && ctx.dirty_rect.y0 <= rect.y1
        {
            out.push(Decoration::DragCaret {
                line,
                color: ctx.drag_caret_color,
            });
        }
    }

    out
}

fn item_bounds(ctx: &DecorationContext, id: ItemId) -> Option<Rect> {
    let range = ctx.tree.get(id)?.range?;
    ctx.surface.bounds_of_range(&range)
}

fn intersects(a: Rect, b: Rect) -> bool {
    a.intersect(b).area() > 0.0
}
