//! Overlay rendering for the Pagewright editor.
//!
//! Turns selection and drag-feedback state into decoration draw commands
//! for whatever paints above the rendering surface.

pub mod overlay;

pub use overlay::{build_decorations, Decoration, DecorationContext, OverlayPainter};
