//! Memoized bubble geometry
//!
//! Outline, content rect and resolved shadow paint depend only on the
//! bubble state, the measured size and the density. [`BubbleCache`] keeps
//! the last result and rebuilds it wholesale whenever any of those change.

use bubble_core::{Color, DrawContext, DrawContextExt, Path, Size};

use crate::content::{set_content_rect, BubbleRect};
use crate::outline::build_bubble_outline;
use crate::shadow::{alignment_shift, composite, ShadowPaint};
use crate::state::BubbleState;

/// Everything needed to paint one bubble
#[derive(Clone, Debug, PartialEq)]
pub struct BubbleGeometry {
    pub path: Path,
    pub content: BubbleRect,
    pub shadow: Option<ShadowPaint>,
    pub fill: Color,
    /// Left shift applied while painting
    pub shift_x: Option<f32>,
}

impl BubbleGeometry {
    /// Build from scratch
    pub fn build(state: &BubbleState, size: Size, density: f32) -> Self {
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

        Self {
            path: build_bubble_outline(state, size, density),
            content,
            shadow: state
                .shadow
                .as_ref()
                .map(|s| ShadowPaint::from_shadow(s, density)),
            fill: state.background_color,
            shift_x: alignment_shift(state.alignment, state.arrow.width, density),
        }
    }

    /// Paint in content-local coordinates
    pub fn paint(&self, ctx: &mut dyn DrawContext) {
        composite(ctx, &self.path, self.shadow.as_ref(), self.fill, self.shift_x);
    }

    /// Paint with the surface origin at the box's top-left
    pub fn paint_in_box(&self, ctx: &mut dyn DrawContext) {
        let (left, top) = (self.content.left, self.content.top);
        if left == 0.0 && top == 0.0 {
            self.paint(ctx);
        } else {
            ctx.translated(left, top, |c| self.paint(c));
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct CacheKey {
    state: BubbleState,
    size: Size,
    density: f32,
}

/// Single-entry cache keyed by value equality
#[derive(Debug, Default)]
pub struct BubbleCache {
    key: Option<CacheKey>,
    geometry: Option<BubbleGeometry>,
    rebuilds: u64,
}

impl BubbleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached geometry for these inputs, rebuilding if they changed
    pub fn get(&mut self, state: &BubbleState, size: Size, density: f32) -> &BubbleGeometry {
        let key = CacheKey {
            state: state.clone(),
            size,
            density,
        };

        if self.key.as_ref() != Some(&key) || self.geometry.is_none() {
            tracing::debug!(
                alignment = ?state.alignment,
                width = size.width,
                height = size.height,
                density,
                "rebuilding bubble geometry"
            );
            self.rebuilds += 1;
            self.key = Some(key);
            self.geometry = None;
        } else {
            tracing::trace!("bubble geometry cache hit");
        }

        self.geometry
            .get_or_insert_with(|| BubbleGeometry::build(state, size, density))
    }

    /// Write the content rect for these inputs into `rect`
    pub fn measure(&mut self, state: &BubbleState, size: Size, density: f32, rect: &mut BubbleRect) {
        *rect = self.get(state, size, density).content;
    }

    /// Paint the bubble with the surface origin at the box's top-left
    pub fn draw(
        &mut self,
        ctx: &mut dyn DrawContext,
        state: &BubbleState,
        size: Size,
        density: f32,
    ) {
        self.get(state, size, density).paint_in_box(ctx);
    }

    /// Drop the cached entry
    pub fn invalidate(&mut self) {
        self.key = None;
        self.geometry = None;
    }

    /// Number of times geometry has been built
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::BubbleShadow;
    use crate::state::Alignment;
    use bubble_core::{Dp, DrawCommand, Point, RecordingContext, Transform};

    const SIZE: Size = Size::new(120.0, 60.0);

    #[test]
    fn test_unchanged_inputs_hit_cache() {
        let mut cache = BubbleCache::new();
        let state = BubbleState::new(Alignment::HorizontalRight);

        let first = cache.get(&state, SIZE, 2.0).clone();
        let second = cache.get(&state, SIZE, 2.0).clone();

        assert_eq!(first, second);
        assert_eq!(cache.rebuild_count(), 1);
    }

    #[test]
    fn test_any_change_rebuilds() {
        let mut cache = BubbleCache::new();
        let state = BubbleState::new(Alignment::HorizontalRight);
        cache.get(&state, SIZE, 2.0);

        cache.get(&state, Size::new(121.0, 60.0), 2.0);
        assert_eq!(cache.rebuild_count(), 2);

        cache.get(&state, Size::new(121.0, 60.0), 3.0);
        assert_eq!(cache.rebuild_count(), 3);

        let shadowed = state.clone().with_shadow(BubbleShadow::default());
        let geometry = cache.get(&shadowed, Size::new(121.0, 60.0), 3.0);
        assert!(geometry.shadow.is_some());
        assert_eq!(cache.rebuild_count(), 4);

        cache.invalidate();
        cache.get(&shadowed, Size::new(121.0, 60.0), 3.0);
        assert_eq!(cache.rebuild_count(), 5);
    }

    #[test]
    fn test_cached_matches_fresh_build() {
        let mut cache = BubbleCache::new();
        let state = BubbleState::new(Alignment::VerticalBottom).with_shadow(BubbleShadow::default());
        let cached = cache.get(&state, SIZE, 1.5).clone();
        assert_eq!(cached, BubbleGeometry::build(&state, SIZE, 1.5));
    }

    #[test]
    fn test_measure_writes_content_rect() {
        let mut cache = BubbleCache::new();
        let state = BubbleState::new(Alignment::HorizontalLeft);
        let mut rect = BubbleRect::new(9.0, 9.0, 9.0, 9.0);

        cache.measure(&state, SIZE, 2.0, &mut rect);
        assert_eq!(rect, BubbleRect::new(16.0, 0.0, 120.0, 60.0));
    }

    #[test]
    fn test_draw_left_bubble_in_box_space() {
        let mut cache = BubbleCache::new();
        let state = BubbleState::new(Alignment::HorizontalLeft).with_arrow(
            crate::state::ArrowGeometry::new(Dp(8.0), Dp(12.0), Dp(4.0)),
        );
        let mut ctx = RecordingContext::new(SIZE);
        cache.draw(&mut ctx, &state, SIZE, 2.0);

        let cmds = ctx.commands();
        assert_eq!(cmds[0], DrawCommand::PushTransform(Transform::translate(16.0, 0.0)));
        assert_eq!(cmds[1], DrawCommand::PushTransform(Transform::translate(-16.0, 0.0)));
        assert!(matches!(cmds[2], DrawCommand::FillPath { .. }));
        assert_eq!(ctx.current_transform().apply(Point::ZERO), Point::ZERO);
    }

    #[test]
    fn test_draw_right_bubble_pushes_nothing() {
        let mut cache = BubbleCache::new();
        let state = BubbleState::new(Alignment::HorizontalRight);
        let mut ctx = RecordingContext::new(SIZE);
        cache.draw(&mut ctx, &state, SIZE, 2.0);

        assert_eq!(ctx.commands().len(), 1);
        assert!(matches!(
            ctx.commands()[0],
            DrawCommand::FillPath { color, .. } if color == Color::WHITE
        ));
    }
}
