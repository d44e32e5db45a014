//! Pulse Core
//!
//! Foundational types shared by the pulse crates:
//!
//! - **Geometry**: points, sizes, rectangles and colors, plus helpers for
//!   locating a target's bounds inside its drawing parent
//! - **Draw Context**: the transform stack, stroked paths and images that
//!   decorations render through, with a recording implementation
//!
//! # Example
//!
//! ```
//! use pulse_core::{bounds_in_parent, Rect};
//!
//! let parent = Rect::new(0.0, 56.0, 400.0, 600.0);
//! let target = Rect::new(40.0, 156.0, 96.0, 48.0);
//!
//! assert_eq!(bounds_in_parent(target, parent), Rect::new(40.0, 100.0, 96.0, 48.0));
//! ```

pub mod draw;
pub mod geometry;

pub use draw::{
    DrawCommand, DrawContext, ImageId, ImageOptions, LineCap, LineJoin, Path, PathCommand,
    RecordingContext, Stroke, Transform,
};
pub use geometry::{bounds_in_parent, window_rect, Color, Point, Rect, Size};
