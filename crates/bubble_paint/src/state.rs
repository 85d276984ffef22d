//! Bubble configuration
//!
//! [`BubbleState`] is the single source of truth for a bubble: which edge
//! carries the arrow, the corner radii, the arrow geometry, the fill color
//! and the optional shadow. It is plain data, compared by value, and can be
//! loaded from TOML:
//!
//! ```toml
//! alignment = "horizontal_left"
//! background_color = "#DCF8C6"
//!
//! [corner_radius]
//! top_left = 4.0
//! top_right = 12.0
//! bottom_right = 12.0
//! bottom_left = 12.0
//!
//! [arrow]
//! width = 8.0
//! height = 12.0
//! offset = 6.0
//!
//! [shadow]
//! alpha = 0.5
//! offset_y = 2.0
//! ```

use bubble_core::{Color, CornerRadius, Dp};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::shadow::BubbleShadow;

/// Which edge of the bubble carries the arrow
///
/// Exactly one alignment is active per bubble. The variants are checked in
/// declaration order wherever behavior depends on them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Arrow on the left edge, pointing left
    HorizontalLeft,
    /// Arrow on the right edge, pointing right
    HorizontalRight,
    /// Arrow on the bottom edge, pointing down
    VerticalBottom,
    /// No arrow
    #[default]
    VerticalTop,
}

impl Alignment {
    pub fn is_horizontal_left(self) -> bool {
        self == Alignment::HorizontalLeft
    }

    pub fn is_horizontal_right(self) -> bool {
        self == Alignment::HorizontalRight
    }

    pub fn is_vertical_bottom(self) -> bool {
        self == Alignment::VerticalBottom
    }

    /// Whether this alignment draws an arrow at all
    pub fn has_arrow(self) -> bool {
        self != Alignment::VerticalTop
    }
}

/// Arrow size and slot position, in logical units
///
/// `width` is always the horizontal extent and `height` the vertical one:
/// a left/right arrow protrudes by `width` and its base spans `height`; a
/// bottom arrow protrudes by `height` and its base spans `width`. `offset`
/// positions the base along its edge, from the top of the body for
/// horizontal arrows and from the left of the body for bottom arrows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowGeometry {
    pub width: Dp,
    pub height: Dp,
    pub offset: Dp,
}

impl Default for ArrowGeometry {
    fn default() -> Self {
        Self {
            width: Dp(8.0),
            height: Dp(12.0),
            offset: Dp(8.0),
        }
    }
}

impl ArrowGeometry {
    pub fn new(width: Dp, height: Dp, offset: Dp) -> Self {
        Self {
            width,
            height,
            offset,
        }
    }

    /// Convert to device pixels
    pub fn to_px(&self, density: f32) -> ArrowPx {
        ArrowPx {
            width: self.width.to_px(density),
            height: self.height.to_px(density),
            offset: self.offset.to_px(density),
        }
    }
}

/// [`ArrowGeometry`] resolved to device pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ArrowPx {
    pub width: f32,
    pub height: f32,
    pub offset: f32,
}

/// Per-corner radii in logical units
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleCornerRadius {
    pub top_left: Dp,
    pub top_right: Dp,
    pub bottom_right: Dp,
    pub bottom_left: Dp,
}

impl Default for BubbleCornerRadius {
    fn default() -> Self {
        Self::uniform(Dp(8.0))
    }
}

impl BubbleCornerRadius {
    pub fn new(top_left: Dp, top_right: Dp, bottom_right: Dp, bottom_left: Dp) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    pub fn uniform(radius: Dp) -> Self {
        Self::new(radius, radius, radius, radius)
    }

    /// Convert to device pixels
    pub fn to_px(&self, density: f32) -> CornerRadius {
        CornerRadius::new(
            self.top_left.to_px(density),
            self.top_right.to_px(density),
            self.bottom_right.to_px(density),
            self.bottom_left.to_px(density),
        )
    }
}

/// Complete description of one bubble
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleState {
    pub alignment: Alignment,
    pub background_color: Color,
    pub corner_radius: BubbleCornerRadius,
    pub arrow: ArrowGeometry,
    /// `None` draws the fill only
    pub shadow: Option<BubbleShadow>,
}

impl Default for BubbleState {
    fn default() -> Self {
        Self {
            alignment: Alignment::default(),
            background_color: Color::WHITE,
            corner_radius: BubbleCornerRadius::default(),
            arrow: ArrowGeometry::default(),
            shadow: None,
        }
    }
}

impl BubbleState {
    pub fn new(alignment: Alignment) -> Self {
        Self {
            alignment,
            ..Default::default()
        }
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_corner_radius(mut self, corner_radius: BubbleCornerRadius) -> Self {
        self.corner_radius = corner_radius;
        self
    }

    pub fn with_arrow(mut self, arrow: ArrowGeometry) -> Self {
        self.arrow = arrow;
        self
    }

    pub fn with_background_color(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_shadow(mut self, shadow: BubbleShadow) -> Self {
        self.shadow = Some(shadow);
        self
    }

    pub fn without_shadow(mut self) -> Self {
        self.shadow = None;
        self
    }

    pub fn is_horizontal_left_aligned(&self) -> bool {
        self.alignment.is_horizontal_left()
    }

    pub fn is_horizontal_right_aligned(&self) -> bool {
        self.alignment.is_horizontal_right()
    }

    pub fn is_vertical_bottom_aligned(&self) -> bool {
        self.alignment.is_vertical_bottom()
    }

    /// Parse a TOML document; missing fields take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Serialize to a TOML document
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
