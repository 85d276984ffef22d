//! Shadow compositing
//!
//! A bubble is painted as shadow first, fill last. Two shadow strategies
//! exist:
//!
//! - **Layered**: the outline is drawn once with a transparent fill and a
//!   blurred shadow layer. Offsets are damped asymmetrically, horizontal by
//!   0.2 and vertical by 0.7, and the horizontal offset is negated.
//! - **Offset fill**: the outline is filled at half the configured offset
//!   with the shadow color. No blur.
//!
//! Left-aligned bubbles are shifted left by the arrow width before anything
//! is painted; shadow offsets are applied inside that shift.

use bubble_core::{Color, DrawContext, DrawContextExt, Dp, Path, Shadow, Transform};
use serde::{Deserialize, Serialize};

use crate::state::{Alignment, BubbleState};

/// Default shadow color (#757575)
pub const DEFAULT_SHADOW_COLOR: Color = Color::rgb(117.0 / 255.0, 117.0 / 255.0, 117.0 / 255.0);

/// Default shadow alpha
pub const DEFAULT_SHADOW_ALPHA: f32 = 0.7;

/// Horizontal offset damping in layered mode
pub const LAYERED_DAMPING_X: f32 = 0.2;

/// Vertical offset damping in layered mode
pub const LAYERED_DAMPING_Y: f32 = 0.7;

/// Offset scale in offset-fill mode
pub const OFFSET_FILL_SCALE: f32 = 0.5;

/// Shadow configuration
///
/// Lengths are logical; they are converted to pixels when the paint is
/// resolved. Construct with [`BubbleShadow::new`] for independent offsets
/// or [`BubbleShadow::with_elevation`] for a single length.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleShadow {
    pub color: Color,
    pub alpha: f32,
    pub offset_x: Dp,
    pub offset_y: Dp,
    pub shadow_radius: Dp,
    /// Blurred layer when true, offset fill when false
    pub use_software_layer: bool,
}

impl Default for BubbleShadow {
    fn default() -> Self {
        Self {
            color: DEFAULT_SHADOW_COLOR,
            alpha: DEFAULT_SHADOW_ALPHA,
            offset_x: Dp(1.0),
            offset_y: Dp(1.0),
            shadow_radius: Dp(1.0),
            use_software_layer: true,
        }
    }
}

impl BubbleShadow {
    pub fn new(
        color: Color,
        alpha: f32,
        use_software_layer: bool,
        offset_x: Dp,
        offset_y: Dp,
        shadow_radius: Dp,
    ) -> Self {
        Self {
            color,
            alpha,
            offset_x,
            offset_y,
            shadow_radius,
            use_software_layer,
        }
    }

    /// Use `elevation` for both offsets and the blur radius
    pub fn with_elevation(
        color: Color,
        alpha: f32,
        use_software_layer: bool,
        elevation: Dp,
    ) -> Self {
        Self::new(color, alpha, use_software_layer, elevation, elevation, elevation)
    }

    /// Shadow color with its alpha replaced by [`BubbleShadow::alpha`]
    pub fn shadow_color(&self) -> Color {
        self.color.with_alpha(self.alpha)
    }
}

/// Layered-mode offsets `(dx, dy)` for pixel offsets
pub fn layered_offsets(offset_x: f32, offset_y: f32) -> (f32, f32) {
    (offset_x * LAYERED_DAMPING_X, offset_y * LAYERED_DAMPING_Y)
}

/// Offset-fill-mode offsets `(dx, dy)` for pixel offsets
pub fn offset_fill_offsets(offset_x: f32, offset_y: f32) -> (f32, f32) {
    (offset_x * OFFSET_FILL_SCALE, offset_y * OFFSET_FILL_SCALE)
}

/// A shadow resolved to pixels, ready to paint
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShadowPaint {
    /// Transparent fill carrying a blurred shadow layer
    Layered { fill: Color, layer: Shadow },
    /// Plain fill translated by `(-dx, dy)`
    OffsetFill { dx: f32, dy: f32, color: Color },
}

impl ShadowPaint {
    pub fn from_shadow(shadow: &BubbleShadow, density: f32) -> Self {
        let offset_x = shadow.offset_x.to_px(density);
        let offset_y = shadow.offset_y.to_px(density);

        if shadow.use_software_layer {
            let (dx, dy) = layered_offsets(offset_x, offset_y);
            ShadowPaint::Layered {
                fill: shadow.color.with_alpha(0.0),
                layer: Shadow::new(
                    -dx,
                    dy,
                    shadow.shadow_radius.to_px(density),
                    shadow.shadow_color(),
                ),
            }
        } else {
            let (dx, dy) = offset_fill_offsets(offset_x, offset_y);
            ShadowPaint::OffsetFill {
                dx,
                dy,
                color: shadow.shadow_color(),
            }
        }
    }

    pub fn is_layered(&self) -> bool {
        matches!(self, ShadowPaint::Layered { .. })
    }

    /// Issue the shadow draw call
    pub fn paint(&self, ctx: &mut dyn DrawContext, path: &Path) {
        match *self {
            ShadowPaint::Layered { fill, layer } => ctx.draw_path_shadow(path, fill, layer),
            ShadowPaint::OffsetFill { dx, dy, color } => {
                ctx.translated(-dx, dy, |c| c.fill_path(path, color));
            }
        }
    }
}

/// Horizontal shift applied before painting, if any
///
/// Only `HorizontalLeft` shifts, by the arrow width to the left.
pub fn alignment_shift(alignment: Alignment, arrow_width: Dp, density: f32) -> Option<f32> {
    alignment
        .is_horizontal_left()
        .then(|| -arrow_width.to_px(density))
}

/// Paint an already resolved shadow beneath a fill
///
/// Order is fixed: optional shift, shadow, fill, unshift. With no shadow
/// the fill is the only paint call.
pub fn composite(
    ctx: &mut dyn DrawContext,
    path: &Path,
    shadow: Option<&ShadowPaint>,
    fill: Color,
    shift_x: Option<f32>,
) {
    if let Some(dx) = shift_x {
        ctx.push_transform(Transform::translate(dx, 0.0));
    }

    if let Some(paint) = shadow {
        tracing::trace!(layered = paint.is_layered(), "painting bubble shadow");
        paint.paint(ctx, path);
    }
    ctx.fill_path(path, fill);

    if shift_x.is_some() {
        ctx.pop_transform();
    }
}

/// Draw `path` with an optional shadow and a `fill` on top
pub fn draw_shadow(
    ctx: &mut dyn DrawContext,
    path: &Path,
    shadow: Option<&BubbleShadow>,
    alignment: Alignment,
    arrow_width: Dp,
    fill: Color,
    density: f32,
) {
    let paint = shadow.map(|s| ShadowPaint::from_shadow(s, density));
    composite(
        ctx,
        path,
        paint.as_ref(),
        fill,
        alignment_shift(alignment, arrow_width, density),
    );
}

/// Draw a bubble outline using everything in `state`
pub fn draw_bubble(ctx: &mut dyn DrawContext, path: &Path, state: &BubbleState, density: f32) {
    draw_shadow(
        ctx,
        path,
        state.shadow.as_ref(),
        state.alignment,
        state.arrow.width,
        state.background_color,
        density,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_core::{DrawCommand, Point, Rect, RecordingContext, Size};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn square() -> Path {
        Path::rect(Rect::new(0.0, 0.0, 10.0, 10.0))
    }

    fn record(state: &BubbleState, density: f32) -> RecordingContext {
        let mut ctx = RecordingContext::new(Size::new(100.0, 100.0));
        draw_bubble(&mut ctx, &square(), state, density);
        ctx
    }

    #[test]
    fn test_constructors() {
        let shadow = BubbleShadow::with_elevation(Color::BLACK, 0.5, false, Dp(3.0));
        assert_eq!(shadow.offset_x, Dp(3.0));
        assert_eq!(shadow.offset_y, Dp(3.0));
        assert_eq!(shadow.shadow_radius, Dp(3.0));
        assert!(!shadow.use_software_layer);

        let shadow = BubbleShadow::new(Color::RED, 0.2, true, Dp(1.0), Dp(2.0), Dp(3.0));
        assert_eq!(shadow.offset_x, Dp(1.0));
        assert_eq!(shadow.offset_y, Dp(2.0));
        assert_eq!(shadow.shadow_radius, Dp(3.0));

        let default = BubbleShadow::default();
        assert_eq!(default.color, DEFAULT_SHADOW_COLOR);
        assert_eq!(default.alpha, 0.7);
        assert!(default.use_software_layer);
        assert_eq!(default.offset_x, Dp(1.0));
        assert_eq!(DEFAULT_SHADOW_COLOR.to_rgba8(), [0x75, 0x75, 0x75, 0xFF]);
    }

    #[test]
    fn test_layered_offset_scaling() {
        let (dx, dy) = layered_offsets(10.0, 10.0);
        assert!(approx(dx, 2.0));
        assert!(approx(dy, 7.0));
    }

    #[test]
    fn test_offset_fill_scaling() {
        let (dx, dy) = offset_fill_offsets(4.0, 6.0);
        assert!(approx(dx, 2.0));
        assert!(approx(dy, 3.0));
    }

    #[test]
    fn test_layered_paint() {
        let shadow = BubbleShadow::new(Color::BLUE, 0.4, true, Dp(10.0), Dp(10.0), Dp(5.0));
        match ShadowPaint::from_shadow(&shadow, 2.0) {
            ShadowPaint::Layered { fill, layer } => {
                assert_eq!(fill.a, 0.0);
                assert!(approx(layer.offset_x, -4.0));
                assert!(approx(layer.offset_y, 14.0));
                assert_eq!(layer.blur, 10.0);
                assert_eq!(layer.color, Color::BLUE.with_alpha(0.4));
            }
            other => panic!("expected layered paint, got {:?}", other),
        }
    }

    #[test]
    fn test_offset_fill_paint() {
        let shadow = BubbleShadow::new(Color::BLUE, 0.4, false, Dp(4.0), Dp(6.0), Dp(5.0));
        assert_eq!(
            ShadowPaint::from_shadow(&shadow, 1.0),
            ShadowPaint::OffsetFill {
                dx: 2.0,
                dy: 3.0,
                color: Color::BLUE.with_alpha(0.4),
            }
        );
    }

    #[test]
    fn test_no_shadow_fills_only() {
        let state = BubbleState::default().with_background_color(Color::GREEN);
        let ctx = record(&state, 1.0);

        assert_eq!(
            ctx.commands(),
            &[DrawCommand::FillPath {
                path: square(),
                color: Color::GREEN,
            }]
        );
    }

    #[test]
    fn test_layered_shadow_precedes_fill() {
        let state = BubbleState::default().with_shadow(BubbleShadow::default());
        let ctx = record(&state, 1.0);
        let paints: Vec<_> = ctx.paint_commands().collect();

        assert_eq!(paints.len(), 2);
        assert!(matches!(paints[0], DrawCommand::DrawPathShadow { .. }));
        assert!(
            matches!(paints[1], DrawCommand::FillPath { color, .. } if *color == Color::WHITE)
        );
    }

    #[test]
    fn test_offset_fill_is_translated() {
        let shadow = BubbleShadow::new(Color::BLACK, 0.5, false, Dp(4.0), Dp(6.0), Dp(0.0));
        let state = BubbleState::default().with_shadow(shadow);
        let ctx = record(&state, 1.0);

        assert_eq!(
            ctx.commands(),
            &[
                DrawCommand::PushTransform(Transform::translate(-2.0, 3.0)),
                DrawCommand::FillPath {
                    path: square(),
                    color: Color::BLACK.with_alpha(0.5),
                },
                DrawCommand::PopTransform,
                DrawCommand::FillPath {
                    path: square(),
                    color: Color::WHITE,
                },
            ]
        );
    }

    #[test]
    fn test_left_alignment_shifts_everything() {
        let state = BubbleState::new(Alignment::HorizontalLeft)
            .with_arrow(crate::state::ArrowGeometry::new(Dp(8.0), Dp(12.0), Dp(0.0)))
            .with_shadow(BubbleShadow::default());
        let ctx = record(&state, 2.0);
        let cmds = ctx.commands();

        assert_eq!(cmds[0], DrawCommand::PushTransform(Transform::translate(-16.0, 0.0)));
        assert!(matches!(cmds[1], DrawCommand::DrawPathShadow { .. }));
        assert!(matches!(cmds[2], DrawCommand::FillPath { .. }));
        assert_eq!(cmds[3], DrawCommand::PopTransform);
        assert_eq!(ctx.current_transform().apply(Point::ZERO), Point::ZERO);
    }

    #[test]
    fn test_left_alignment_applies_without_shadow() {
        let state = BubbleState::new(Alignment::HorizontalLeft);
        let ctx = record(&state, 1.0);

        assert_eq!(ctx.commands().len(), 3);
        assert!(matches!(ctx.commands()[0], DrawCommand::PushTransform(_)));
        assert_eq!(ctx.paint_commands().count(), 1);
    }

    #[test]
    fn test_other_alignments_do_not_shift() {
        for alignment in [
            Alignment::HorizontalRight,
            Alignment::VerticalBottom,
            Alignment::VerticalTop,
        ] {
            assert_eq!(alignment_shift(alignment, Dp(8.0), 2.0), None);
        }
        assert_eq!(alignment_shift(Alignment::HorizontalLeft, Dp(8.0), 2.0), Some(-16.0));
    }

    #[test]
    fn test_redraw_is_idempotent() {
        let state = BubbleState::new(Alignment::VerticalBottom).with_shadow(BubbleShadow::default());
        assert_eq!(record(&state, 3.0).commands(), record(&state, 3.0).commands());
    }
}
