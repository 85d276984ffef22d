//! Path geometry queries and tessellation
//!
//! Bridges [`Path`] to lyon. SVG arcs are converted to cubic Béziers (at
//! most 90° each), which keeps the bounding box of every quarter-circle
//! corner exact.

use bubble_core::{Color, Path, PathCommand, Point, Rect, Vec2};
use lyon::geom::{CubicBezierSegment, LineSegment, QuadraticBezierSegment};
use lyon::lyon_tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, VertexBuffers,
};
use lyon::math::{point, Box2D};
use lyon::path::iterator::PathIterator;
use lyon::path::PathEvent;

/// Points closer than this are merged when flattening
const MERGE_DISTANCE: f32 = 1e-4;

/// A vertex for path rendering
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PathVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// Tessellated path geometry ready for GPU upload
#[derive(Default)]
pub struct TessellatedPath {
    pub vertices: Vec<PathVertex>,
    pub indices: Vec<u32>,
}

impl TessellatedPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Total area covered by the triangles
    pub fn area(&self) -> f32 {
        self.indices
            .chunks_exact(3)
            .map(|tri| {
                let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| self.vertices[i as usize].position);
                ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])).abs() / 2.0
            })
            .sum()
    }

    /// Raw vertex bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// A flattened subpath
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contour {
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Convert an SVG arc to cubic bezier curves
/// Follows the endpoint-to-center arc conversion in the SVG implementation notes
fn arc_to_cubics(
    from: Point,
    radii: Vec2,
    x_rotation: f32,
    large_arc: bool,
    sweep: bool,
    to: Point,
) -> Vec<(Point, Point, Point)> {
    let mut curves = Vec::new();

    // Handle degenerate cases
    if from == to {
        return curves;
    }

    let mut rx = radii.x.abs();
    let mut ry = radii.y.abs();

    if rx == 0.0 || ry == 0.0 {
        // Treat as a line
        return curves;
    }

    let cos_phi = x_rotation.cos();
    let sin_phi = x_rotation.sin();

    // Step 1: Compute (x1', y1') - transformed start point
    let dx = (from.x - to.x) / 2.0;
    let dy = (from.y - to.y) / 2.0;
    let x1p = cos_phi * dx + sin_phi * dy;
    let y1p = -sin_phi * dx + cos_phi * dy;

    // Step 2: Compute center point (cx', cy')
    let x1p_sq = x1p * x1p;
    let y1p_sq = y1p * y1p;

    // Ensure radii are large enough
    let lambda = x1p_sq / (rx * rx) + y1p_sq / (ry * ry);
    if lambda > 1.0 {
        let lambda_sqrt = lambda.sqrt();
        rx *= lambda_sqrt;
        ry *= lambda_sqrt;
    }

    let rx_sq = rx * rx;
    let ry_sq = ry * ry;

    let sq_numer = (rx_sq * ry_sq - rx_sq * y1p_sq - ry_sq * x1p_sq).max(0.0);
    let sq_denom = rx_sq * y1p_sq + ry_sq * x1p_sq;
    let sq = if sq_denom > 0.0 {
        (sq_numer / sq_denom).sqrt()
    } else {
        0.0
    };

    let sign = if large_arc == sweep { -1.0 } else { 1.0 };
    let cxp = sign * sq * rx * y1p / ry;
    let cyp = sign * sq * -ry * x1p / rx;

    // Step 3: Compute (cx, cy) from (cx', cy')
    let cx = cos_phi * cxp - sin_phi * cyp + (from.x + to.x) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (from.y + to.y) / 2.0;

    // Step 4: Compute theta1 and dtheta
    fn angle(ux: f32, uy: f32, vx: f32, vy: f32) -> f32 {
        let dot = ux * vx + uy * vy;
        let len = (ux * ux + uy * uy).sqrt() * (vx * vx + vy * vy).sqrt();
        let cos_val = (dot / len).clamp(-1.0, 1.0);
        let angle = cos_val.acos();
        if ux * vy - uy * vx < 0.0 {
            -angle
        } else {
            angle
        }
    }

    let theta1 = angle(1.0, 0.0, (x1p - cxp) / rx, (y1p - cyp) / ry);
    let mut dtheta = angle(
        (x1p - cxp) / rx,
        (y1p - cyp) / ry,
        (-x1p - cxp) / rx,
        (-y1p - cyp) / ry,
    );

    // Adjust dtheta based on sweep flag
    if sweep && dtheta < 0.0 {
        dtheta += std::f32::consts::TAU;
    } else if !sweep && dtheta > 0.0 {
        dtheta -= std::f32::consts::TAU;
    }

    // Split arc into segments (max 90 degrees each, with slack for rounding)
    let quarter = std::f32::consts::FRAC_PI_2 * (1.0 + 1e-4);
    let num_segments = ((dtheta.abs() / quarter).ceil() as usize).max(1);
    let segment_angle = dtheta / num_segments as f32;
    // Handle length for a cubic approximating `segment_angle` of arc
    let alpha = (segment_angle / 4.0).tan() * 4.0 / 3.0;

    let point_at = |t: f32| {
        let (sin_t, cos_t) = t.sin_cos();
        Point::new(
            cx + rx * cos_phi * cos_t - ry * sin_phi * sin_t,
            cy + rx * sin_phi * cos_t + ry * cos_phi * sin_t,
        )
    };
    // Derivative of point_at with respect to t
    let tangent_at = |t: f32| {
        let (sin_t, cos_t) = t.sin_cos();
        Vec2::new(
            -rx * cos_phi * sin_t - ry * sin_phi * cos_t,
            -rx * sin_phi * sin_t + ry * cos_phi * cos_t,
        )
    };

    for i in 0..num_segments {
        let t1 = theta1 + i as f32 * segment_angle;
        let t2 = t1 + segment_angle;

        let p0 = if i == 0 { from } else { point_at(t1) };
        // Pin the final end point so contours stay watertight
        let p3 = if i + 1 == num_segments { to } else { point_at(t2) };

        let d1 = tangent_at(t1);
        let d2 = tangent_at(t2);

        // Control points
        let p1 = Point::new(p0.x + alpha * d1.x, p0.y + alpha * d1.y);
        let p2 = Point::new(p3.x - alpha * d2.x, p3.y - alpha * d2.y);

        curves.push((p1, p2, p3));
    }

    curves
}

/// Convert a Path to lyon path events
pub(crate) fn path_to_lyon_events(path: &Path) -> Vec<PathEvent> {
    let mut events = Vec::new();
    let mut first_point: Option<Point> = None;
    let mut current_point = Point::ZERO;

    // Drawing without a MoveTo starts a subpath at the cursor
    fn ensure_begun(events: &mut Vec<PathEvent>, first: &mut Option<Point>, current: Point) {
        if first.is_none() {
            events.push(PathEvent::Begin {
                at: point(current.x, current.y),
            });
            *first = Some(current);
        }
    }

    for cmd in path.commands() {
        match cmd {
            PathCommand::MoveTo(p) => {
                if let Some(first) = first_point {
                    // End previous subpath
                    events.push(PathEvent::End {
                        last: point(current_point.x, current_point.y),
                        first: point(first.x, first.y),
                        close: false,
                    });
                }
                events.push(PathEvent::Begin {
                    at: point(p.x, p.y),
                });
                first_point = Some(*p);
                current_point = *p;
            }
            PathCommand::LineTo(p) => {
                ensure_begun(&mut events, &mut first_point, current_point);
                events.push(PathEvent::Line {
                    from: point(current_point.x, current_point.y),
                    to: point(p.x, p.y),
                });
                current_point = *p;
            }
            PathCommand::QuadTo { control, end } => {
                ensure_begun(&mut events, &mut first_point, current_point);
                events.push(PathEvent::Quadratic {
                    from: point(current_point.x, current_point.y),
                    ctrl: point(control.x, control.y),
                    to: point(end.x, end.y),
                });
                current_point = *end;
            }
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => {
                ensure_begun(&mut events, &mut first_point, current_point);
                events.push(PathEvent::Cubic {
                    from: point(current_point.x, current_point.y),
                    ctrl1: point(control1.x, control1.y),
                    ctrl2: point(control2.x, control2.y),
                    to: point(end.x, end.y),
                });
                current_point = *end;
            }
            PathCommand::ArcTo {
                radii,
                rotation,
                large_arc,
                sweep,
                end,
            } => {
                ensure_begun(&mut events, &mut first_point, current_point);
                let cubics =
                    arc_to_cubics(current_point, *radii, *rotation, *large_arc, *sweep, *end);

                if cubics.is_empty() {
                    // Degenerate arc - treat as line
                    events.push(PathEvent::Line {
                        from: point(current_point.x, current_point.y),
                        to: point(end.x, end.y),
                    });
                } else {
                    let mut prev = current_point;
                    for (ctrl1, ctrl2, end_pt) in cubics {
                        events.push(PathEvent::Cubic {
                            from: point(prev.x, prev.y),
                            ctrl1: point(ctrl1.x, ctrl1.y),
                            ctrl2: point(ctrl2.x, ctrl2.y),
                            to: point(end_pt.x, end_pt.y),
                        });
                        prev = end_pt;
                    }
                }
                current_point = *end;
            }
            PathCommand::Close => {
                if let Some(first) = first_point.take() {
                    events.push(PathEvent::End {
                        last: point(current_point.x, current_point.y),
                        first: point(first.x, first.y),
                        close: true,
                    });
                    current_point = first;
                }
            }
        }
    }

    // Close any remaining open subpath
    if let Some(first) = first_point {
        events.push(PathEvent::End {
            last: point(current_point.x, current_point.y),
            first: point(first.x, first.y),
            close: false,
        });
    }

    events
}

/// Convert a Path into a lyon path
pub fn to_lyon_path(path: &Path) -> lyon::path::Path {
    let mut builder = lyon::path::Path::builder();
    for event in path_to_lyon_events(path) {
        match event {
            PathEvent::Begin { at } => {
                builder.begin(at);
            }
            PathEvent::Line { to, .. } => {
                builder.line_to(to);
            }
            PathEvent::Quadratic { ctrl, to, .. } => {
                builder.quadratic_bezier_to(ctrl, to);
            }
            PathEvent::Cubic {
                ctrl1, ctrl2, to, ..
            } => {
                builder.cubic_bezier_to(ctrl1, ctrl2, to);
            }
            PathEvent::End { close, .. } => builder.end(close),
        }
    }
    builder.build()
}

/// Exact bounding box of the filled area
///
/// Curves contribute their true extrema, not their control points. An empty
/// path has [`Rect::ZERO`] bounds.
pub fn bounds(path: &Path) -> Rect {
    let mut bbox: Option<Box2D> = None;
    let mut include = |b: Box2D| {
        bbox = Some(match bbox {
            // Box2D::union skips empty boxes, which would drop points and axis lines
            Some(acc) => Box2D::new(acc.min.min(b.min), acc.max.max(b.max)),
            None => b,
        });
    };

    for event in path_to_lyon_events(path) {
        match event {
            PathEvent::Begin { at } => include(Box2D::new(at, at)),
            PathEvent::Line { from, to } => include(LineSegment { from, to }.bounding_box()),
            PathEvent::Quadratic { from, ctrl, to } => {
                include(QuadraticBezierSegment { from, ctrl, to }.bounding_box())
            }
            PathEvent::Cubic {
                from,
                ctrl1,
                ctrl2,
                to,
            } => include(
                CubicBezierSegment {
                    from,
                    ctrl1,
                    ctrl2,
                    to,
                }
                .bounding_box(),
            ),
            PathEvent::End { .. } => {}
        }
    }

    bbox.map_or(Rect::ZERO, |b| {
        Rect::from_ltrb(b.min.x, b.min.y, b.max.x, b.max.y)
    })
}

/// Flatten a path into polylines within `tolerance`
///
/// Consecutive points closer than a small merge distance are collapsed, and
/// a closed contour does not repeat its first point at the end.
pub fn flatten(path: &Path, tolerance: f32) -> Vec<Contour> {
    let lyon_path = to_lyon_path(path);
    let mut contours = Vec::new();
    let mut current = Contour::default();

    let push = |contour: &mut Contour, p: Point| {
        let duplicate = contour.points.last().is_some_and(|last| {
            (last.x - p.x).abs() < MERGE_DISTANCE && (last.y - p.y).abs() < MERGE_DISTANCE
        });
        if !duplicate {
            contour.points.push(p);
        }
    };

    for event in lyon_path.iter().flattened(tolerance) {
        match event {
            PathEvent::Begin { at } => {
                current = Contour::default();
                push(&mut current, Point::new(at.x, at.y));
            }
            PathEvent::Line { to, .. } => push(&mut current, Point::new(to.x, to.y)),
            PathEvent::End { close, .. } => {
                if close && current.points.len() > 1 {
                    let first = current.points[0];
                    if let Some(last) = current.points.last() {
                        if (last.x - first.x).abs() < MERGE_DISTANCE
                            && (last.y - first.y).abs() < MERGE_DISTANCE
                        {
                            current.points.pop();
                        }
                    }
                }
                current.closed = close;
                contours.push(std::mem::take(&mut current));
            }
            // Flattening only yields lines
            PathEvent::Quadratic { .. } | PathEvent::Cubic { .. } => {}
        }
    }

    contours
}

/// True when no two non-adjacent edges of the closed polygon cross
///
/// Edges that merely touch or run collinear are not counted as crossings.
pub fn is_simple(points: &[Point]) -> bool {
    let n = points.len();
    if n < 4 {
        return true;
    }

    let edge = |i: usize| (points[i], points[(i + 1) % n]);

    for i in 0..n {
        for j in (i + 2)..n {
            // First and last edges share a vertex
            if i == 0 && j == n - 1 {
                continue;
            }
            let (a1, a2) = edge(i);
            let (b1, b2) = edge(j);
            if segments_cross(a1, a2, b1, b2) {
                return false;
            }
        }
    }
    true
}

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (cx, cy) = (c.x as f64, c.y as f64);
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

fn segments_cross(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    const EPS: f64 = 1e-9;
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);
    ((d1 > EPS && d2 < -EPS) || (d1 < -EPS && d2 > EPS))
        && ((d3 > EPS && d4 < -EPS) || (d3 < -EPS && d4 > EPS))
}

/// Tessellate a path for filling (non-zero winding)
pub fn tessellate_fill(path: &Path, color: Color) -> TessellatedPath {
    let events = path_to_lyon_events(path);

    if events.is_empty() {
        return TessellatedPath::new();
    }

    let mut geometry: VertexBuffers<PathVertex, u32> = VertexBuffers::new();
    let mut tessellator = FillTessellator::new();

    let options = FillOptions::default()
        .with_tolerance(0.1)
        .with_fill_rule(FillRule::NonZero);

    let result = tessellator.tessellate(
        events.iter().cloned(),
        &options,
        &mut BuffersBuilder::new(&mut geometry, |vertex: FillVertex| PathVertex {
            position: vertex.position().to_array(),
            color: color.to_array(),
        }),
    );

    if let Err(err) = result {
        tracing::warn!("Path fill tessellation failed: {:?}", err);
        return TessellatedPath::new();
    }

    TessellatedPath {
        vertices: geometry.vertices,
        indices: geometry.indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathBuilder;

    fn quarter_arc() -> Path {
        PathBuilder::new()
            .arc_to(Rect::new(0.0, 0.0, 20.0, 20.0), 180.0, 90.0, false)
            .build()
    }

    #[test]
    fn test_quarter_arc_is_one_cubic() {
        let events = path_to_lyon_events(&quarter_arc());
        let cubics: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                PathEvent::Cubic { to, .. } => Some(*to),
                _ => None,
            })
            .collect();
        assert_eq!(cubics, vec![point(10.0, 0.0)]);
    }

    #[test]
    fn test_quarter_arc_stays_on_circle() {
        let events = path_to_lyon_events(&quarter_arc());
        let cubic = events
            .iter()
            .find_map(|e| match *e {
                PathEvent::Cubic {
                    from,
                    ctrl1,
                    ctrl2,
                    to,
                } => Some(CubicBezierSegment {
                    from,
                    ctrl1,
                    ctrl2,
                    to,
                }),
                _ => None,
            })
            .unwrap();

        // Handles are 4/3 * tan(pi/8) of the radius long
        assert!((ctrl_len(cubic.from, cubic.ctrl1) - 5.5228).abs() < 1e-3);
        assert!((ctrl_len(cubic.to, cubic.ctrl2) - 5.5228).abs() < 1e-3);

        for i in 0..=8 {
            let p = cubic.sample(i as f32 / 8.0);
            let r = ((p.x - 10.0).powi(2) + (p.y - 10.0).powi(2)).sqrt();
            assert!((r - 10.0).abs() < 0.01, "t = {} r = {}", i, r);
        }
    }

    fn ctrl_len(a: lyon::math::Point, b: lyon::math::Point) -> f32 {
        (a - b).length()
    }

    #[test]
    fn test_bounds_include_points_and_axis_lines() {
        let path = Path::new().move_to(0.0, 0.0).line_to(40.0, 0.0).line_to(40.0, 30.0);
        assert_eq!(bounds(&path), Rect::new(0.0, 0.0, 40.0, 30.0));

        let dot = Path::new().move_to(5.0, 7.0);
        assert_eq!(bounds(&dot), Rect::new(5.0, 7.0, 0.0, 0.0));
    }

    #[test]
    fn test_elliptical_arc_uses_both_radii() {
        // Quarter of an ellipse 40 wide, 10 tall
        let path = PathBuilder::new()
            .arc_to(Rect::new(0.0, 0.0, 40.0, 10.0), 180.0, 90.0, false)
            .build();
        let b = bounds(&path);
        assert!((b.left() - 0.0).abs() < 1e-3);
        assert!((b.top() - 0.0).abs() < 1e-3);
        assert!((b.right() - 20.0).abs() < 1e-3);
        assert!((b.bottom() - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_bounds_of_full_circle() {
        let path = PathBuilder::new()
            .arc_to(Rect::new(10.0, 10.0, 30.0, 30.0), 0.0, 360.0, false)
            .close()
            .build();
        let b = bounds(&path);
        assert!((b.left() - 10.0).abs() < 1e-2);
        assert!((b.right() - 40.0).abs() < 1e-2);
        assert!((b.top() - 10.0).abs() < 1e-2);
        assert!((b.bottom() - 40.0).abs() < 1e-2);
    }

    #[test]
    fn test_bounds_of_empty_path() {
        assert_eq!(bounds(&Path::new()), Rect::ZERO);
    }

    #[test]
    fn test_flatten_rect() {
        let contours = flatten(&Path::rect(Rect::new(0.0, 0.0, 10.0, 5.0)), 0.1);
        assert_eq!(contours.len(), 1);
        assert!(contours[0].closed);
        assert_eq!(
            contours[0].points,
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 5.0),
                Point::new(0.0, 5.0),
            ]
        );
    }

    #[test]
    fn test_flatten_open_path() {
        let path = Path::new().move_to(0.0, 0.0).line_to(5.0, 0.0);
        let contours = flatten(&path, 0.1);
        assert!(!contours[0].closed);
        assert_eq!(contours[0].points.len(), 2);
    }

    #[test]
    fn test_is_simple() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(is_simple(&square));

        let bowtie = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        ];
        assert!(!is_simple(&bowtie));
    }

    #[test]
    fn test_tessellate_rect() {
        let path = Path::rect(Rect::new(0.0, 0.0, 100.0, 50.0));
        let result = tessellate_fill(&path, Color::RED);

        assert!(!result.is_empty());
        assert!((result.area() - 5000.0).abs() < 1e-2);
        assert_eq!(result.vertices[0].color, Color::RED.to_array());
        assert_eq!(result.vertex_bytes().len(), result.vertices.len() * 24);
        assert_eq!(result.index_bytes().len(), result.indices.len() * 4);
    }

    #[test]
    fn test_tessellate_circle_area() {
        let path = PathBuilder::new()
            .arc_to(Rect::new(0.0, 0.0, 50.0, 50.0), 0.0, 360.0, false)
            .close()
            .build();
        let result = tessellate_fill(&path, Color::BLUE);

        let expected = std::f32::consts::PI * 25.0 * 25.0;
        assert!((result.area() - expected).abs() / expected < 0.01);
    }

    #[test]
    fn test_tessellate_empty() {
        assert!(tessellate_fill(&Path::new(), Color::BLACK).is_empty());
    }
}
