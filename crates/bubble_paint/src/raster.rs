//! CPU rasterization using tiny-skia
//!
//! [`RasterContext`] is a [`DrawContext`] backed by a premultiplied RGBA
//! pixmap. Fills are anti-aliased with the non-zero rule. Shadow layers are
//! rendered into an offscreen coverage mask, blurred with three box passes
//! approximating a Gaussian of sigma `blur / 2`, tinted and composited
//! beneath the fill.
//!
//! Output is a pure function of the draw calls: the same calls produce the
//! same bytes.

use bubble_core::{Color, DrawContext, Path, Shadow, Size, Transform};
use lyon::path::PathEvent;
use smallvec::{smallvec, SmallVec};
use tiny_skia::{FillRule, Paint, Pixmap, PixmapPaint};

use crate::cache::BubbleGeometry;
use crate::error::{BubbleError, Result};
use crate::state::BubbleState;
use crate::tessellate::path_to_lyon_events;

/// Draw context rendering into a CPU pixmap
pub struct RasterContext {
    pixmap: Pixmap,
    transform_stack: SmallVec<[Transform; 4]>,
}

impl RasterContext {
    /// Create a transparent surface
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(BubbleError::Surface { width, height })?;
        Ok(Self {
            pixmap,
            transform_stack: smallvec![Transform::identity()],
        })
    }

    /// Render one bubble onto a surface sized to its box
    pub fn render_bubble(state: &BubbleState, size: Size, density: f32) -> Result<Self> {
        let width = size.width.max(0.0).ceil() as u32;
        let height = size.height.max(0.0).ceil() as u32;
        let mut ctx = Self::new(width, height)?;

        tracing::debug!(width, height, density, "rasterizing bubble");
        BubbleGeometry::build(state, size, density).paint_in_box(&mut ctx);
        Ok(ctx)
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Fill the whole surface, ignoring transforms
    pub fn clear(&mut self, color: Color) {
        let [r, g, b, a] = color.to_rgba8();
        self.pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
    }

    /// Premultiplied RGBA bytes, row-major
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Straight-alpha RGBA bytes, row-major
    pub fn unpremultiplied_pixels(&self) -> Vec<u8> {
        unpremultiply_alpha(self.pixmap.data())
    }

    /// Straight-alpha color of one pixel
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Encode the surface as PNG
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| BubbleError::Encode(e.to_string()))
    }

    /// Encode the surface as PNG and write it to `path`
    pub fn save_png(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let bytes = self.encode_png()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn skia_transform(&self) -> tiny_skia::Transform {
        to_skia_transform(self.current_transform())
    }

    fn fill_with(pixmap: &mut Pixmap, path: &tiny_skia::Path, color: Color, transform: tiny_skia::Transform) {
        let [r, g, b, a] = color.to_rgba8();
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;
        pixmap.fill_path(path, &paint, FillRule::Winding, transform, None);
    }

    fn paint_shadow_layer(&mut self, path: &tiny_skia::Path, shadow: Shadow) {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let Some(mut layer) = Pixmap::new(width, height) else {
            return;
        };

        let offset = Transform::translate(shadow.offset_x, shadow.offset_y);
        let transform = to_skia_transform(self.current_transform().then(&offset));
        Self::fill_with(&mut layer, path, Color::BLACK, transform);

        let mut mask: Vec<f32> = layer
            .data()
            .chunks_exact(4)
            .map(|px| px[3] as f32 / 255.0)
            .collect();
        blur_mask(&mut mask, width as usize, height as usize, shadow.blur / 2.0);

        let [r, g, b, _] = shadow.color.to_rgba8();
        for (px, coverage) in layer.data_mut().chunks_exact_mut(4).zip(&mask) {
            let alpha = (coverage * shadow.color.a * 255.0).round().clamp(0.0, 255.0);
            // Premultiplied, so every channel stays <= alpha
            px[0] = (r as f32 * alpha / 255.0).round() as u8;
            px[1] = (g as f32 * alpha / 255.0).round() as u8;
            px[2] = (b as f32 * alpha / 255.0).round() as u8;
            px[3] = alpha as u8;
        }

        self.pixmap.draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &PixmapPaint::default(),
            tiny_skia::Transform::identity(),
            None,
        );
    }
}

impl DrawContext for RasterContext {
    fn push_transform(&mut self, transform: Transform) {
        let combined = self.current_transform().then(&transform);
        self.transform_stack.push(combined);
    }

    fn pop_transform(&mut self) {
        if self.transform_stack.len() > 1 {
            self.transform_stack.pop();
        } else {
            tracing::warn!("pop_transform called with an empty transform stack");
        }
    }

    fn current_transform(&self) -> Transform {
        self.transform_stack.last().copied().unwrap_or_default()
    }

    fn fill_path(&mut self, path: &Path, color: Color) {
        if color.a <= 0.0 {
            return;
        }
        let Some(skia_path) = to_skia_path(path) else {
            return;
        };
        let transform = self.skia_transform();
        Self::fill_with(&mut self.pixmap, &skia_path, color, transform);
    }

    fn draw_path_shadow(&mut self, path: &Path, fill: Color, shadow: Shadow) {
        let Some(skia_path) = to_skia_path(path) else {
            return;
        };
        if shadow.color.a > 0.0 {
            self.paint_shadow_layer(&skia_path, shadow);
        }
        if fill.a > 0.0 {
            let transform = self.skia_transform();
            Self::fill_with(&mut self.pixmap, &skia_path, fill, transform);
        }
    }

    fn viewport_size(&self) -> Size {
        Size::new(self.pixmap.width() as f32, self.pixmap.height() as f32)
    }
}

fn to_skia_transform(transform: Transform) -> tiny_skia::Transform {
    let [a, b, c, d, tx, ty] = transform.affine().elements;
    tiny_skia::Transform::from_row(a, b, c, d, tx, ty)
}

/// Convert a Path to a tiny-skia path; `None` when nothing would be drawn
fn to_skia_path(path: &Path) -> Option<tiny_skia::Path> {
    let mut builder = tiny_skia::PathBuilder::new();
    for event in path_to_lyon_events(path) {
        match event {
            PathEvent::Begin { at } => builder.move_to(at.x, at.y),
            PathEvent::Line { to, .. } => builder.line_to(to.x, to.y),
            PathEvent::Quadratic { ctrl, to, .. } => builder.quad_to(ctrl.x, ctrl.y, to.x, to.y),
            PathEvent::Cubic {
                ctrl1, ctrl2, to, ..
            } => builder.cubic_to(ctrl1.x, ctrl1.y, ctrl2.x, ctrl2.y, to.x, to.y),
            PathEvent::End { close, .. } => {
                if close {
                    builder.close();
                }
            }
        }
    }
    builder.finish()
}

/// Widths of three box filters approximating a Gaussian of `sigma`
fn gaussian_box_sizes(sigma: f32) -> [usize; 3] {
    let n = 3.0;
    let ideal = (12.0 * sigma * sigma / n + 1.0).sqrt();
    let mut lower = ideal.floor() as i32;
    if lower % 2 == 0 {
        lower -= 1;
    }
    let lower = lower.max(1);
    let upper = lower + 2;
    let wl = lower as f32;
    let m = ((12.0 * sigma * sigma - n * wl * wl - 4.0 * n * wl - 3.0 * n) / (-4.0 * wl - 4.0))
        .round() as i32;

    let mut sizes = [0usize; 3];
    for (i, size) in sizes.iter_mut().enumerate() {
        *size = if (i as i32) < m { lower as usize } else { upper as usize };
    }
    sizes
}

/// Blur a coverage mask in place; outside the surface counts as empty
fn blur_mask(mask: &mut [f32], width: usize, height: usize, sigma: f32) {
    if sigma <= 0.0 || width == 0 || height == 0 {
        return;
    }
    let mut scratch = vec![0.0f32; mask.len()];
    for size in gaussian_box_sizes(sigma) {
        let radius = (size - 1) / 2;
        if radius == 0 {
            continue;
        }
        box_blur_pass(mask, &mut scratch, width, height, radius, false);
        box_blur_pass(&scratch, mask, width, height, radius, true);
    }
}

fn box_blur_pass(
    src: &[f32],
    dst: &mut [f32],
    width: usize,
    height: usize,
    radius: usize,
    vertical: bool,
) {
    let (lines, len) = if vertical { (width, height) } else { (height, width) };
    let index = |line: usize, i: usize| {
        if vertical {
            i * width + line
        } else {
            line * width + i
        }
    };
    let norm = 1.0 / (2 * radius + 1) as f32;
    let mut prefix = vec![0.0f32; len + 1];

    for line in 0..lines {
        for i in 0..len {
            prefix[i + 1] = prefix[i] + src[index(line, i)];
        }
        for i in 0..len {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius + 1).min(len);
            dst[index(line, i)] = (prefix[hi] - prefix[lo]) * norm;
        }
    }
}

/// Convert premultiplied alpha to straight alpha
fn unpremultiply_alpha(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());

    for chunk in data.chunks_exact(4) {
        let a = chunk[3] as f32 / 255.0;
        if a > 0.0 {
            let r = ((chunk[0] as f32 / a).min(255.0)) as u8;
            let g = ((chunk[1] as f32 / a).min(255.0)) as u8;
            let b = ((chunk[2] as f32 / a).min(255.0)) as u8;
            result.extend_from_slice(&[r, g, b, chunk[3]]);
        } else {
            result.extend_from_slice(&[0, 0, 0, 0]);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::BubbleShadow;
    use crate::state::{Alignment, ArrowGeometry, BubbleCornerRadius};
    use bubble_core::{Dp, Rect};

    fn square() -> Path {
        Path::rect(Rect::new(10.0, 10.0, 20.0, 20.0))
    }

    fn alpha_at(ctx: &RasterContext, x: u32, y: u32) -> u8 {
        ctx.pixel(x, y).map_or(0, |p| p[3])
    }

    #[test]
    fn test_zero_size_surface_is_an_error() {
        assert!(matches!(
            RasterContext::new(0, 10),
            Err(BubbleError::Surface { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_fill_path() {
        let mut ctx = RasterContext::new(40, 40).unwrap();
        ctx.fill_path(&square(), Color::RED);

        assert_eq!(ctx.pixel(20, 20), Some([255, 0, 0, 255]));
        assert_eq!(ctx.pixel(5, 5), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_transform_applies_to_fill() {
        let mut ctx = RasterContext::new(40, 40).unwrap();
        ctx.push_transform(Transform::translate(-10.0, -10.0));
        ctx.fill_path(&square(), Color::BLUE);
        ctx.pop_transform();

        assert_eq!(alpha_at(&ctx, 5, 5), 255);
        assert_eq!(alpha_at(&ctx, 25, 25), 0);
    }

    #[test]
    fn test_transparent_fill_draws_only_shadow() {
        let mut ctx = RasterContext::new(60, 60).unwrap();
        let shadow = Shadow::new(10.0, 10.0, 0.0, Color::BLACK);
        ctx.draw_path_shadow(&square(), Color::TRANSPARENT, shadow);

        // Unblurred shadow is the square moved by the offset
        assert_eq!(alpha_at(&ctx, 15, 15), 0);
        assert_eq!(alpha_at(&ctx, 35, 35), 255);
    }

    #[test]
    fn test_blurred_shadow_spreads() {
        let mut ctx = RasterContext::new(60, 60).unwrap();
        let shadow = Shadow::new(0.0, 0.0, 8.0, Color::BLACK);
        ctx.draw_path_shadow(&square(), Color::WHITE, shadow);

        // Fill on top
        assert_eq!(ctx.pixel(20, 20), Some([255, 255, 255, 255]));
        // Soft falloff outside the shape
        let near = alpha_at(&ctx, 32, 20);
        let far = alpha_at(&ctx, 36, 20);
        assert!(near > 0);
        assert!(near > far);
        assert_eq!(alpha_at(&ctx, 55, 55), 0);
    }

    #[test]
    fn test_gaussian_box_sizes() {
        let sizes = gaussian_box_sizes(4.0);
        assert!(sizes.iter().all(|s| s % 2 == 1));
        assert!(sizes[0] <= sizes[2]);

        // Three passes reproduce the target variance
        let variance: f32 = sizes
            .iter()
            .map(|&s| ((s * s) as f32 - 1.0) / 12.0)
            .sum();
        assert!((variance - 16.0).abs() < 4.0);
    }

    #[test]
    fn test_blur_preserves_mass_away_from_edges() {
        let (w, h) = (31, 31);
        let mut mask = vec![0.0f32; w * h];
        mask[15 * w + 15] = 1.0;
        blur_mask(&mut mask, w, h, 2.0);

        let total: f32 = mask.iter().sum();
        assert!((total - 1.0).abs() < 1e-3);
        assert!(mask[15 * w + 15] > mask[15 * w + 18]);
    }

    #[test]
    fn test_render_is_deterministic() {
        let state = BubbleState::new(Alignment::HorizontalLeft)
            .with_corner_radius(BubbleCornerRadius::uniform(Dp(6.0)))
            .with_arrow(ArrowGeometry::new(Dp(8.0), Dp(10.0), Dp(6.0)))
            .with_shadow(BubbleShadow::with_elevation(Color::BLACK, 0.5, true, Dp(3.0)));

        let a = RasterContext::render_bubble(&state, Size::new(80.0, 40.0), 1.0).unwrap();
        let b = RasterContext::render_bubble(&state, Size::new(80.0, 40.0), 1.0).unwrap();
        assert_eq!(a.pixels(), b.pixels());
    }

    #[test]
    fn test_left_bubble_renders_in_box_space() {
        let state = BubbleState::new(Alignment::HorizontalLeft)
            .with_background_color(Color::RED)
            .with_corner_radius(BubbleCornerRadius::uniform(Dp(4.0)))
            .with_arrow(ArrowGeometry::new(Dp(10.0), Dp(20.0), Dp(10.0)));
        let ctx = RasterContext::render_bubble(&state, Size::new(100.0, 50.0), 1.0).unwrap();

        // Body spans x = 10..100, arrow tip reaches x = 0 at y = 20
        assert_eq!(ctx.pixel(50, 25), Some([255, 0, 0, 255]));
        assert_eq!(ctx.pixel(97, 25), Some([255, 0, 0, 255]));
        assert_eq!(alpha_at(&ctx, 8, 20), 255);
        assert_eq!(alpha_at(&ctx, 5, 45), 0);
    }

    #[test]
    fn test_rounded_corner_is_clear_outside_arc() {
        let state = BubbleState::new(Alignment::VerticalTop)
            .with_background_color(Color::RED)
            .with_corner_radius(BubbleCornerRadius::uniform(Dp(16.0)));
        let ctx = RasterContext::render_bubble(&state, Size::new(100.0, 60.0), 1.0).unwrap();

        // Outside the arc centred at (16, 16)
        assert_eq!(alpha_at(&ctx, 0, 0), 0);
        assert_eq!(alpha_at(&ctx, 2, 2), 0);
        assert_eq!(alpha_at(&ctx, 97, 57), 0);
        // Inside the arc and along the straight edges
        assert_eq!(ctx.pixel(7, 7), Some([255, 0, 0, 255]));
        assert_eq!(ctx.pixel(50, 1), Some([255, 0, 0, 255]));
        assert_eq!(ctx.pixel(1, 30), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_offset_fill_shadow_peeks_out() {
        let shadow = BubbleShadow::new(Color::BLACK, 1.0, false, Dp(0.0), Dp(8.0), Dp(0.0));
        let state = BubbleState::new(Alignment::VerticalTop)
            .with_corner_radius(BubbleCornerRadius::uniform(Dp(0.0)))
            .with_shadow(shadow);

        let mut ctx = RasterContext::new(40, 40).unwrap();
        BubbleGeometry::build(&state, Size::new(20.0, 20.0), 1.0).paint_in_box(&mut ctx);

        // Fill covers 0..20, shadow is moved down by 4
        assert_eq!(ctx.pixel(10, 10), Some([255, 255, 255, 255]));
        assert_eq!(ctx.pixel(10, 22), Some([0, 0, 0, 255]));
        assert_eq!(alpha_at(&ctx, 10, 26), 0);
    }

    #[test]
    fn test_png_encoding() {
        let mut ctx = RasterContext::new(8, 8).unwrap();
        ctx.clear(Color::GREEN);
        let png = ctx.encode_png().unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
        assert_eq!(ctx.unpremultiplied_pixels()[..4], [0, 255, 0, 255]);
    }

    #[test]
    fn test_pop_past_root_is_harmless() {
        let mut ctx = RasterContext::new(4, 4).unwrap();
        ctx.pop_transform();
        assert_eq!(ctx.current_transform(), Transform::identity());
        assert_eq!(ctx.viewport_size(), Size::new(4.0, 4.0));
    }
}
