//! Bubble outline construction
//!
//! The body is a rounded rectangle with four independent radii, traced
//! clockwise from the top-left arc. Each corner is a quarter arc of the
//! circle inscribed in a `2r` x `2r` square tangent to both adjacent edges.
//! A radius of zero collapses the square to a point, which yields a sharp
//! corner without special-casing.
//!
//! The arrow is a separate closed triangle in the strip the content rect
//! reserves. Both contours wind clockwise, so a non-zero fill paints their
//! union.

use bubble_core::{CornerRadius, Path, Point, Rect, Size};

use crate::content::{set_content_rect, BubbleRect};
use crate::path::PathBuilder;
use crate::state::{Alignment, ArrowPx, BubbleState};

/// Append the rounded-rectangle contour of `size` at `top_left`
///
/// Radii are in pixels and not clamped: radii larger than half an adjacent
/// edge produce overlapping arcs.
pub fn add_rounded_rect(
    builder: PathBuilder,
    radii: CornerRadius,
    top_left: Point,
    size: Size,
) -> PathBuilder {
    let (x, y) = (top_left.x, top_left.y);
    let (width, height) = (size.width, size.height);

    // Diameters of the arc bounding squares
    let tl = radii.top_left * 2.0;
    let tr = radii.top_right * 2.0;
    let br = radii.bottom_right * 2.0;
    let bl = radii.bottom_left * 2.0;

    builder
        .arc_to(Rect::new(x, y, tl, tl), 180.0, 90.0, false)
        .line_to(x + width - radii.top_right, y)
        .arc_to(Rect::new(x + width - tr, y, tr, tr), -90.0, 90.0, false)
        .line_to(x + width, y + height - radii.bottom_right)
        .arc_to(
            Rect::new(x + width - br, y + height - br, br, br),
            0.0,
            90.0,
            false,
        )
        .line_to(x + radii.bottom_left, y + height)
        .arc_to(Rect::new(x, y + height - bl, bl, bl), 90.0, 90.0, false)
        .line_to(x, y + radii.top_left)
        .close()
}

/// Build the rounded-rectangle contour on its own
pub fn build_outline(top_left: Point, size: Size, radii: CornerRadius) -> Path {
    add_rounded_rect(PathBuilder::new(), radii, top_left, size).build()
}

/// Append the arrow triangle for `alignment` next to `body`
///
/// The base sits on the body edge starting `arrow.offset` from the top
/// (left/right arrows) or from the left (bottom arrow), and the tip is
/// centred on the base. `VerticalTop` draws nothing.
pub fn add_arrow(
    builder: PathBuilder,
    alignment: Alignment,
    body: Rect,
    arrow: ArrowPx,
) -> PathBuilder {
    match alignment {
        Alignment::HorizontalLeft => {
            let top = body.top() + arrow.offset;
            let bottom = top + arrow.height;
            builder
                .move_to(body.left(), top)
                .line_to(body.left(), bottom)
                .line_to(body.left() - arrow.width, (top + bottom) / 2.0)
                .close()
        }
        Alignment::HorizontalRight => {
            let top = body.top() + arrow.offset;
            let bottom = top + arrow.height;
            builder
                .move_to(body.right(), top)
                .line_to(body.right() + arrow.width, (top + bottom) / 2.0)
                .line_to(body.right(), bottom)
                .close()
        }
        Alignment::VerticalBottom => {
            let left = body.left() + arrow.offset;
            let right = left + arrow.width;
            builder
                .move_to(right, body.bottom())
                .line_to((left + right) / 2.0, body.bottom() + arrow.height)
                .line_to(left, body.bottom())
                .close()
        }
        Alignment::VerticalTop => builder,
    }
}

/// Build the full bubble outline for a measured box
///
/// `size` is the whole box in pixels, arrow strip included. The body is
/// placed on the content rect and the arrow fills the reserved strip, so
/// the outline's bounds equal the box whenever the arrow spans its strip.
pub fn build_bubble_outline(state: &BubbleState, size: Size, density: f32) -> Path {
    let mut content = BubbleRect::default();
    set_content_rect(
        state.alignment,
        size.width,
        size.height,
        state.arrow.width,
        state.arrow.height,
        density,
        &mut content,
    );

    let body = content.to_rect();
    let radii = state.corner_radius.to_px(density);
    let arrow = state.arrow.to_px(density);

    tracing::trace!(
        alignment = ?state.alignment,
        width = size.width,
        height = size.height,
        density,
        "building bubble outline"
    );

    let builder = add_rounded_rect(PathBuilder::new(), radii, body.origin, body.size);
    add_arrow(builder, state.alignment, body, arrow).build()
}
