//! Draw Context - Immediate-mode Rendering API
//!
//! The `DrawContext` trait is the rendering surface the shadow compositor
//! paints into. It is deliberately small: a transform stack, a plain path
//! fill, and a path fill that carries a blurred shadow layer.
//!
//! Two implementations ship with the workspace:
//!
//! - [`RecordingContext`] records [`DrawCommand`]s for inspection or replay
//! - `bubble_paint::RasterContext` rasterizes into a CPU pixmap
//!
//! # Example
//!
//! ```
//! use bubble_core::{Color, DrawContext, Path, RecordingContext, Size, Transform};
//!
//! let mut ctx = RecordingContext::new(Size::new(200.0, 100.0));
//! let path = Path::new().move_to(0.0, 0.0).line_to(10.0, 0.0).line_to(10.0, 10.0).close();
//!
//! ctx.push_transform(Transform::translate(5.0, 5.0));
//! ctx.fill_path(&path, Color::BLUE);
//! ctx.pop_transform();
//!
//! assert_eq!(ctx.commands().len(), 3);
//! ```

use smallvec::{smallvec, SmallVec};

use crate::color::{Color, Shadow};
use crate::geometry::{Affine2D, Point, Rect, Size, Vec2};

// ─────────────────────────────────────────────────────────────────────────────
// Transform Types
// ─────────────────────────────────────────────────────────────────────────────

/// 2D transform pushed onto a draw context
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform(pub Affine2D);

impl Transform {
    /// Create a 2D translation
    pub fn translate(x: f32, y: f32) -> Self {
        Transform(Affine2D::translation(x, y))
    }

    /// Create a 2D scale around the origin (0, 0)
    pub fn scale(sx: f32, sy: f32) -> Self {
        Transform(Affine2D::scale(sx, sy))
    }

    /// Create identity transform
    pub fn identity() -> Self {
        Transform(Affine2D::IDENTITY)
    }

    /// The underlying affine matrix
    pub fn affine(&self) -> Affine2D {
        self.0
    }

    /// Compose: the result applies `other` first, then `self`
    pub fn then(&self, other: &Transform) -> Transform {
        Transform(self.0.then(&other.0))
    }

    /// Map a point through this transform
    pub fn apply(&self, point: Point) -> Point {
        self.0.transform_point(point)
    }
}

impl From<Affine2D> for Transform {
    fn from(t: Affine2D) -> Self {
        Transform(t)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Path Types
// ─────────────────────────────────────────────────────────────────────────────

/// Path command for building vector paths
#[derive(Clone, Debug, PartialEq)]
pub enum PathCommand {
    /// Move to a point
    MoveTo(Point),
    /// Line to a point
    LineTo(Point),
    /// Quadratic Bézier curve
    QuadTo { control: Point, end: Point },
    /// Cubic Bézier curve
    CubicTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    /// Elliptical arc to a point (SVG endpoint parameterization)
    ArcTo {
        radii: Vec2,
        rotation: f32,
        large_arc: bool,
        sweep: bool,
        end: Point,
    },
    /// Close the current subpath
    Close,
}

impl PathCommand {
    /// End point of the command, if it has one
    pub fn end_point(&self) -> Option<Point> {
        match self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(*p),
            PathCommand::QuadTo { end, .. }
            | PathCommand::CubicTo { end, .. }
            | PathCommand::ArcTo { end, .. } => Some(*end),
            PathCommand::Close => None,
        }
    }
}

/// A vector path
///
/// Paths are values: they are built in one go and replaced wholesale when
/// their inputs change, never edited in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    /// Create a new empty path
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Move to a point
    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::MoveTo(Point::new(x, y)));
        self
    }

    /// Line to a point
    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::LineTo(Point::new(x, y)));
        self
    }

    /// Quadratic Bézier curve
    pub fn quad_to(mut self, cx: f32, cy: f32, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::QuadTo {
            control: Point::new(cx, cy),
            end: Point::new(x, y),
        });
        self
    }

    /// Cubic Bézier curve
    pub fn cubic_to(mut self, cx1: f32, cy1: f32, cx2: f32, cy2: f32, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::CubicTo {
            control1: Point::new(cx1, cy1),
            control2: Point::new(cx2, cy2),
            end: Point::new(x, y),
        });
        self
    }

    /// SVG Arc to a point
    ///
    /// - `radii`: The x and y radii of the ellipse
    /// - `rotation`: Rotation angle of the ellipse in radians
    /// - `large_arc`: If true, use the larger arc (> 180 degrees)
    /// - `sweep`: If true, draw clockwise (y-down); if false, counter-clockwise
    /// - `x`, `y`: End point of the arc
    pub fn arc_to(
        mut self,
        radii: Vec2,
        rotation: f32,
        large_arc: bool,
        sweep: bool,
        x: f32,
        y: f32,
    ) -> Self {
        self.commands.push(PathCommand::ArcTo {
            radii,
            rotation,
            large_arc,
            sweep,
            end: Point::new(x, y),
        });
        self
    }

    /// Close the path
    pub fn close(mut self) -> Self {
        self.commands.push(PathCommand::Close);
        self
    }

    /// Append every command of `other`
    pub fn extend(mut self, other: &Path) -> Self {
        self.commands.extend(other.commands.iter().cloned());
        self
    }

    /// Create a rectangle path
    pub fn rect(rect: Rect) -> Self {
        Self::new()
            .move_to(rect.left(), rect.top())
            .line_to(rect.right(), rect.top())
            .line_to(rect.right(), rect.bottom())
            .line_to(rect.left(), rect.bottom())
            .close()
    }

    /// Get the path commands
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Check if the path is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Last point reached by the path, if any
    pub fn current_point(&self) -> Option<Point> {
        self.commands.iter().rev().find_map(PathCommand::end_point)
    }

    /// Number of subpaths (each `MoveTo` starts one)
    pub fn contour_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|cmd| matches!(cmd, PathCommand::MoveTo(_)))
            .count()
    }

    /// True when every subpath ends with `Close`
    pub fn is_closed(&self) -> bool {
        let mut open = false;
        for cmd in &self.commands {
            match cmd {
                PathCommand::MoveTo(_) => {
                    if open {
                        return false;
                    }
                    open = true;
                }
                PathCommand::Close => open = false,
                _ => {}
            }
        }
        !open && !self.commands.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Draw Context Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Immediate-mode drawing surface
///
/// Every call completes before returning. Implementations keep a transform
/// stack; `push_transform` composes with whatever is already on it.
pub trait DrawContext {
    /// Push a transform onto the stack
    fn push_transform(&mut self, transform: Transform);

    /// Pop the top transform from the stack
    fn pop_transform(&mut self);

    /// Get the current combined transform
    fn current_transform(&self) -> Transform;

    /// Fill a path with a solid color (non-zero winding)
    fn fill_path(&mut self, path: &Path, color: Color);

    /// Fill a path with `fill` and paint a blurred shadow layer beneath it
    ///
    /// This is the blur-capable paint primitive: the shadow is a copy of the
    /// path's coverage, blurred by `shadow.blur`, tinted with `shadow.color`
    /// and drawn at `(shadow.offset_x, shadow.offset_y)`. The shadow is
    /// painted even when `fill` is fully transparent.
    fn draw_path_shadow(&mut self, path: &Path, fill: Color, shadow: Shadow);

    /// Get the current viewport size
    fn viewport_size(&self) -> Size;
}

/// Extension trait for DrawContext with scoped helpers
pub trait DrawContextExt: DrawContext {
    /// Run `f` with a translation pushed, popping it afterwards
    fn translated<F: FnOnce(&mut Self)>(&mut self, dx: f32, dy: f32, f: F) {
        self.push_transform(Transform::translate(dx, dy));
        f(self);
        self.pop_transform();
    }
}

// Blanket implementation for all DrawContext implementers
impl<T: DrawContext + ?Sized> DrawContextExt for T {}

// ─────────────────────────────────────────────────────────────────────────────
// Recording Draw Context
// ─────────────────────────────────────────────────────────────────────────────

/// A draw command that can be recorded and replayed
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    PushTransform(Transform),
    PopTransform,
    FillPath {
        path: Path,
        color: Color,
    },
    DrawPathShadow {
        path: Path,
        fill: Color,
        shadow: Shadow,
    },
}

impl DrawCommand {
    /// True for commands that put paint on the surface
    pub fn is_paint(&self) -> bool {
        matches!(
            self,
            DrawCommand::FillPath { .. } | DrawCommand::DrawPathShadow { .. }
        )
    }
}

/// A draw context that records commands for later execution
#[derive(Debug)]
pub struct RecordingContext {
    commands: Vec<DrawCommand>,
    transform_stack: SmallVec<[Transform; 4]>,
    viewport: Size,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new(Size::ZERO)
    }
}

impl RecordingContext {
    /// Create a new recording context
    pub fn new(viewport: Size) -> Self {
        Self {
            commands: Vec::new(),
            transform_stack: smallvec![Transform::identity()],
            viewport,
        }
    }

    /// Get the recorded commands
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Recorded commands that paint, in issue order
    pub fn paint_commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|cmd| cmd.is_paint())
    }

    /// Clear all recorded commands
    pub fn clear(&mut self) {
        self.commands.clear();
        self.transform_stack = smallvec![Transform::identity()];
    }

    /// Replay the recorded commands into another context
    pub fn replay(&self, target: &mut dyn DrawContext) {
        for cmd in &self.commands {
            match cmd {
                DrawCommand::PushTransform(t) => target.push_transform(*t),
                DrawCommand::PopTransform => target.pop_transform(),
                DrawCommand::FillPath { path, color } => target.fill_path(path, *color),
                DrawCommand::DrawPathShadow { path, fill, shadow } => {
                    target.draw_path_shadow(path, *fill, *shadow)
                }
            }
        }
    }
}

impl DrawContext for RecordingContext {
    fn push_transform(&mut self, transform: Transform) {
        self.commands.push(DrawCommand::PushTransform(transform));
        let combined = self.current_transform().then(&transform);
        self.transform_stack.push(combined);
    }

    fn pop_transform(&mut self) {
        self.commands.push(DrawCommand::PopTransform);
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
        self.commands.push(DrawCommand::FillPath {
            path: path.clone(),
            color,
        });
    }

    fn draw_path_shadow(&mut self, path: &Path, fill: Color, shadow: Shadow) {
        self.commands.push(DrawCommand::DrawPathShadow {
            path: path.clone(),
            fill,
            shadow,
        });
    }

    fn viewport_size(&self) -> Size {
        self.viewport
    }
}
