//! Bubble Core
//!
//! Foundational primitives shared by the speech-bubble renderer:
//!
//! - **Geometry**: points, sizes, rectangles, affine transforms, corner radii
//! - **Color**: RGBA colors (hex-serializable) and shadow layers
//! - **Units**: density-independent lengths ([`Dp`])
//! - **Draw Context**: the immediate-mode surface trait, vector paths and a
//!   recording implementation
//!
//! # Example
//!
//! ```
//! use bubble_core::{Color, Dp, Rect};
//!
//! let density = 2.0;
//! let arrow = Dp(8.0).to_px(density);
//! let content = Rect::from_ltrb(arrow, 0.0, 200.0, 80.0);
//!
//! assert_eq!(content.left(), 16.0);
//! assert_eq!(Color::WHITE.darken(0.5).a, 1.0);
//! ```

pub mod color;
pub mod draw;
pub mod geometry;
pub mod units;

pub use color::{Color, Shadow};
pub use draw::{
    DrawCommand, DrawContext, DrawContextExt, Path, PathCommand, RecordingContext, Transform,
};
pub use geometry::{Affine2D, CornerRadius, Point, Rect, Size, Vec2};
pub use units::Dp;
