//! Path building
//!
//! Core types are re-exported from bubble_core. PathBuilder provides a fluent
//! API that tracks the cursor, which oval arcs need in order to decide
//! between starting a contour and connecting to it.

// Re-export core types
pub use bubble_core::{Path, PathCommand, Point};

use bubble_core::{Rect, Vec2};

/// Builder for constructing paths with fluent API
///
/// PathBuilder maintains cursor state for relative operations and for
/// [`PathBuilder::arc_to`], which follows canvas `arcTo(oval, start, sweep)`
/// semantics.
#[derive(Clone, Debug, Default)]
pub struct PathBuilder {
    path: Path,
    current: Point,
    contour_start: Point,
    contour_open: bool,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self {
            path: Path::new(),
            current: Point::ZERO,
            contour_start: Point::ZERO,
            contour_open: false,
        }
    }

    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.path = self.path.move_to(x, y);
        self.current = Point::new(x, y);
        self.contour_start = self.current;
        self.contour_open = true;
        self
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        if !self.contour_open {
            // A line after close (or on an empty path) starts from the cursor
            let (cx, cy) = (self.current.x, self.current.y);
            self = self.move_to(cx, cy);
        }
        self.path = self.path.line_to(x, y);
        self.current = Point::new(x, y);
        self
    }

    /// Append an arc of the ellipse inscribed in `oval`
    ///
    /// Angles are in degrees, measured clockwise from the positive x axis
    /// (y points down). If no contour is open, or `force_move_to` is set, the
    /// arc starts a new contour at its start point; otherwise a line joins
    /// the cursor to the arc start when they differ.
    ///
    /// A zero-sized oval yields a zero-length arc at the oval's corner, which
    /// renders as a sharp corner.
    pub fn arc_to(
        mut self,
        oval: Rect,
        start_angle_degrees: f32,
        sweep_angle_degrees: f32,
        force_move_to: bool,
    ) -> Self {
        let center = oval.center();
        let radii = Vec2::new(oval.width() / 2.0, oval.height() / 2.0);
        let point_at = |degrees: f32| {
            let (cos, sin) = unit_vector(degrees);
            Point::new(center.x + radii.x * cos, center.y + radii.y * sin)
        };

        let start = point_at(start_angle_degrees);
        if force_move_to || !self.contour_open {
            self = self.move_to(start.x, start.y);
        } else if self.current != start {
            self = self.line_to(start.x, start.y);
        }

        // SVG arcs cannot express a full turn, so sweep in steps of <= 180°
        let steps = (sweep_angle_degrees.abs() / 180.0).ceil().max(1.0) as usize;
        let step = sweep_angle_degrees / steps as f32;
        for i in 1..=steps {
            let end = point_at(start_angle_degrees + step * i as f32);
            self.path = self
                .path
                .arc_to(radii, 0.0, false, sweep_angle_degrees > 0.0, end.x, end.y);
            self.current = end;
        }
        self
    }

    pub fn close(mut self) -> Self {
        if self.contour_open {
            self.path = self.path.close();
            self.current = self.contour_start;
            self.contour_open = false;
        }
        self
    }

    pub fn build(self) -> Path {
        self.path
    }

    /// Get the current cursor position
    pub fn current_position(&self) -> Point {
        self.current
    }
}

/// `(cos, sin)` of an angle in degrees, exact on quarter turns
fn unit_vector(degrees: f32) -> (f32, f32) {
    let normalized = degrees.rem_euclid(360.0);
    if normalized == 0.0 {
        (1.0, 0.0)
    } else if normalized == 90.0 {
        (0.0, 1.0)
    } else if normalized == 180.0 {
        (-1.0, 0.0)
    } else if normalized == 270.0 {
        (0.0, -1.0)
    } else {
        let radians = normalized.to_radians();
        (radians.cos(), radians.sin())
    }
}
