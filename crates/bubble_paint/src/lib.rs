//! Bubble Paint
//!
//! Speech-bubble geometry and painting: a rounded rectangle with four
//! independent radii, an optional triangular arrow on one edge, and a drop
//! shadow drawn beneath the fill.
//!
//! # Features
//!
//! - Outline construction from a box, corner radii and arrow geometry
//! - Content rect reduction that excludes the arrow strip
//! - Shadow compositing, blurred layer or offset fill
//! - Memoization of geometry keyed on its inputs
//! - lyon tessellation and tiny-skia rasterization of the result
//! - TOML configuration of [`BubbleState`]
//!
//! # Example
//!
//! ```
//! use bubble_paint::{
//!     build_bubble_outline, draw_bubble, Alignment, BubbleShadow, BubbleState, RecordingContext,
//!     Size,
//! };
//!
//! let state = BubbleState::new(Alignment::HorizontalRight).with_shadow(BubbleShadow::default());
//! let size = Size::new(240.0, 96.0);
//!
//! let path = build_bubble_outline(&state, size, 2.0);
//! let mut ctx = RecordingContext::new(size);
//! draw_bubble(&mut ctx, &path, &state, 2.0);
//!
//! // Shadow first, fill last
//! assert_eq!(ctx.paint_commands().count(), 2);
//! ```

pub mod cache;
pub mod content;
pub mod error;
pub mod outline;
pub mod path;
pub mod raster;
pub mod shadow;
pub mod state;
pub mod tessellate;

// ─────────────────────────────────────────────────────────────────────────────
// Core type re-exports from bubble_core
// ─────────────────────────────────────────────────────────────────────────────

pub use bubble_core::{
    // Colors
    Color,
    // Corner radius
    CornerRadius,
    // Draw context
    DrawCommand,
    DrawContext,
    DrawContextExt,
    // Units
    Dp,
    // Geometry
    Point,
    Rect,
    RecordingContext,
    Shadow,
    Size,
    Transform,
};

pub use cache::{BubbleCache, BubbleGeometry};
pub use content::{compute_content_rect, set_content_rect, BubbleRect};
pub use error::{BubbleError, Result};
pub use outline::{add_arrow, add_rounded_rect, build_bubble_outline, build_outline};
pub use path::{Path, PathBuilder, PathCommand};
pub use raster::RasterContext;
pub use shadow::{
    composite, draw_bubble, draw_shadow, BubbleShadow, ShadowPaint, DEFAULT_SHADOW_COLOR,
};
pub use state::{Alignment, ArrowGeometry, ArrowPx, BubbleCornerRadius, BubbleState};
pub use tessellate::{tessellate_fill, PathVertex, TessellatedPath};
