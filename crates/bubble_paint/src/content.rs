//! Content rect reduction
//!
//! The arrow occupies a strip along one edge of the measured box. Whatever
//! renders inside the bubble is placed in the remainder.

use bubble_core::{Dp, Rect};

use crate::state::Alignment;

/// Content area of a bubble in device pixels
///
/// Owned by the layout pass and overwritten in place on every measurement.
/// Spans are not clamped: an arrow wider than the box yields a negative
/// width.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BubbleRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BubbleRect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Overwrite all four edges
    pub fn set(&mut self, left: f32, top: f32, right: f32, bottom: f32) {
        self.left = left;
        self.top = top;
        self.right = right;
        self.bottom = bottom;
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn to_rect(&self) -> Rect {
        Rect::from_ltrb(self.left, self.top, self.right, self.bottom)
    }
}

impl From<BubbleRect> for Rect {
    fn from(r: BubbleRect) -> Self {
        r.to_rect()
    }
}

/// Write the content area of a `width` x `height` box into `rect`
///
/// Alignments are tested in order and the first match wins:
///
/// - HorizontalLeft: `[arrow_width, 0, width, height]`
/// - HorizontalRight: `[0, 0, width - arrow_width, height]`
/// - VerticalBottom: `[0, 0, width, height - arrow_height]`
/// - otherwise the full box
///
/// Arrow lengths are converted with `density`; `width` and `height` are
/// already in pixels.
pub fn set_content_rect(
    alignment: Alignment,
    width: f32,
    height: f32,
    arrow_width: Dp,
    arrow_height: Dp,
    density: f32,
    rect: &mut BubbleRect,
) {
    if alignment.is_horizontal_left() {
        rect.set(arrow_width.to_px(density), 0.0, width, height);
    } else if alignment.is_horizontal_right() {
        rect.set(0.0, 0.0, width - arrow_width.to_px(density), height);
    } else if alignment.is_vertical_bottom() {
        rect.set(0.0, 0.0, width, height - arrow_height.to_px(density));
    } else {
        rect.set(0.0, 0.0, width, height);
    }
}

/// Convenience wrapper returning a fresh rect
pub fn compute_content_rect(
    alignment: Alignment,
    width: f32,
    height: f32,
    arrow_width: Dp,
    arrow_height: Dp,
    density: f32,
) -> BubbleRect {
    let mut rect = BubbleRect::default();
    set_content_rect(
        alignment,
        width,
        height,
        arrow_width,
        arrow_height,
        density,
        &mut rect,
    );
    rect
}
