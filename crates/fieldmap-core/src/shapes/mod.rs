//! Shape definitions for the annotation canvas.

mod metadata;
mod style;

pub use metadata::{CustomField, Metadata, Photo};
pub use style::{DashStyle, LineEndings, SerializableColor, ShapeStyle};

use crate::geometry::{self, bounding_rect, point_in_polygon, point_near_path};
use crate::scene::SceneError;
use chrono::{DateTime, Utc};
use kurbo::{BezPath, Circle, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Unique identifier for projects.
pub type ProjectId = Uuid;

/// Segments used when a circle has to be expressed as a polygon ring.
const CIRCLE_RING_SEGMENTS: usize = 48;

/// The shape variants, without their geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Polygon,
    /// A two-point line segment.
    Threshold,
    Freehand,
    Circle,
    Square,
    Triangle,
}

impl ShapeKind {
    /// Vertex count a committed shape of this kind must have.
    pub fn arity(self) -> Arity {
        match self {
            ShapeKind::Polygon => Arity::AtLeast(3),
            ShapeKind::Freehand => Arity::AtLeast(2),
            ShapeKind::Threshold | ShapeKind::Circle | ShapeKind::Square | ShapeKind::Triangle => {
                Arity::Exactly(2)
            }
        }
    }

    /// Human-readable label, used for default names and exports.
    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::Polygon => "Polygon",
            ShapeKind::Threshold => "Line",
            ShapeKind::Freehand => "Path",
            ShapeKind::Circle => "Circle",
            ShapeKind::Square => "Square",
            ShapeKind::Triangle => "Triangle",
        }
    }

    /// Whether the shape encloses an area.
    pub fn is_closed(self) -> bool {
        !matches!(self, ShapeKind::Threshold | ShapeKind::Freehand)
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ShapeKind::Polygon => "polygon",
            ShapeKind::Threshold => "threshold",
            ShapeKind::Freehand => "freehand",
            ShapeKind::Circle => "circle",
            ShapeKind::Square => "square",
            ShapeKind::Triangle => "triangle",
        };
        f.write_str(tag)
    }
}

/// Vertex-count contract for a shape kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Geometry of a committed shape. Each variant holds exactly the points its
/// kind needs, so an arity violation cannot be represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    /// Closed ring of three or more vertices.
    Polygon { ring: Vec<Point> },
    /// Line segment.
    Threshold { start: Point, end: Point },
    /// Open path of two or more vertices.
    Freehand { points: Vec<Point> },
    /// Circle centred on `center` passing through `rim`.
    Circle { center: Point, rim: Point },
    /// Axis-aligned rectangle spanned by two opposite corners.
    Square { corner: Point, opposite: Point },
    /// Triangle inscribed in the box spanned by two corners.
    Triangle { corner: Point, opposite: Point },
}

impl Geometry {
    /// Build geometry from a vertex list, enforcing the kind's arity.
    pub fn from_vertices(kind: ShapeKind, vertices: Vec<Point>) -> Result<Self, SceneError> {
        let arity = kind.arity();
        if !arity.accepts(vertices.len()) {
            return Err(SceneError::InvalidGeometry {
                kind,
                expected: arity,
                actual: vertices.len(),
            });
        }
        Ok(match kind {
            ShapeKind::Polygon => Geometry::Polygon { ring: vertices },
            ShapeKind::Freehand => Geometry::Freehand { points: vertices },
            ShapeKind::Threshold => Geometry::Threshold {
                start: vertices[0],
                end: vertices[1],
            },
            ShapeKind::Circle => Geometry::Circle {
                center: vertices[0],
                rim: vertices[1],
            },
            ShapeKind::Square => Geometry::Square {
                corner: vertices[0],
                opposite: vertices[1],
            },
            ShapeKind::Triangle => Geometry::Triangle {
                corner: vertices[0],
                opposite: vertices[1],
            },
        })
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Polygon { .. } => ShapeKind::Polygon,
            Geometry::Threshold { .. } => ShapeKind::Threshold,
            Geometry::Freehand { .. } => ShapeKind::Freehand,
            Geometry::Circle { .. } => ShapeKind::Circle,
            Geometry::Square { .. } => ShapeKind::Square,
            Geometry::Triangle { .. } => ShapeKind::Triangle,
        }
    }

    /// The defining vertices, in the same order `from_vertices` takes them.
    pub fn vertices(&self) -> Vec<Point> {
        match self {
            Geometry::Polygon { ring } => ring.clone(),
            Geometry::Freehand { points } => points.clone(),
            Geometry::Threshold { start: a, end: b }
            | Geometry::Circle { center: a, rim: b }
            | Geometry::Square { corner: a, opposite: b }
            | Geometry::Triangle { corner: a, opposite: b } => vec![*a, *b],
        }
    }

    pub fn vertex_count(&self) -> usize {
        match self {
            Geometry::Polygon { ring } => ring.len(),
            Geometry::Freehand { points } => points.len(),
            _ => 2,
        }
    }

    pub fn vertex(&self, index: usize) -> Option<Point> {
        match self {
            Geometry::Polygon { ring: pts } | Geometry::Freehand { points: pts } => {
                pts.get(index).copied()
            }
            Geometry::Threshold { start: a, end: b }
            | Geometry::Circle { center: a, rim: b }
            | Geometry::Square { corner: a, opposite: b }
            | Geometry::Triangle { corner: a, opposite: b } => match index {
                0 => Some(*a),
                1 => Some(*b),
                _ => None,
            },
        }
    }

    /// Move one defining vertex. Returns false when the index is out of range.
    pub fn set_vertex(&mut self, index: usize, point: Point) -> bool {
        let slot = match self {
            Geometry::Polygon { ring: pts } | Geometry::Freehand { points: pts } => {
                pts.get_mut(index)
            }
            Geometry::Threshold { start: a, end: b }
            | Geometry::Circle { center: a, rim: b }
            | Geometry::Square { corner: a, opposite: b }
            | Geometry::Triangle { corner: a, opposite: b } => match index {
                0 => Some(a),
                1 => Some(b),
                _ => None,
            },
        };
        match slot {
            Some(v) => {
                *v = point;
                true
            }
            None => false,
        }
    }

    /// Closed outline as a polygon ring, `None` for open shapes.
    ///
    /// Circles are approximated; use [`Geometry::circle_radius`] for exact math.
    pub fn ring(&self) -> Option<Vec<Point>> {
        match self {
            Geometry::Polygon { ring } => Some(ring.clone()),
            Geometry::Square { corner, opposite } => Some(square_corners(*corner, *opposite).to_vec()),
            Geometry::Triangle { corner, opposite } => {
                Some(triangle_corners(*corner, *opposite).to_vec())
            }
            Geometry::Circle { center, rim } => {
                let r = geometry::distance(*center, *rim);
                Some(
                    (0..CIRCLE_RING_SEGMENTS)
                        .map(|i| {
                            let t = i as f64 / CIRCLE_RING_SEGMENTS as f64 * std::f64::consts::TAU;
                            Point::new(center.x + r * t.cos(), center.y + r * t.sin())
                        })
                        .collect(),
                )
            }
            Geometry::Threshold { .. } | Geometry::Freehand { .. } => None,
        }
    }

    /// Radius for circles.
    pub fn circle_radius(&self) -> Option<f64> {
        match self {
            Geometry::Circle { center, rim } => Some(geometry::distance(*center, *rim)),
            _ => None,
        }
    }

    /// Path representation for rendering.
    pub fn to_path(&self) -> BezPath {
        match self {
            Geometry::Circle { center, rim } => {
                Circle::new(*center, geometry::distance(*center, *rim)).to_path(0.1)
            }
            Geometry::Threshold { start, end } => polyline_path(&[*start, *end], false),
            Geometry::Freehand { points } => polyline_path(points, false),
            _ => self
                .ring()
                .map(|ring| polyline_path(&ring, true))
                .unwrap_or_default(),
        }
    }

    /// Bounding box in scene coordinates.
    pub fn bounds(&self) -> Rect {
        match self {
            Geometry::Circle { center, rim } => {
                let r = geometry::distance(*center, *rim);
                Rect::new(center.x - r, center.y - r, center.x + r, center.y + r)
            }
            Geometry::Polygon { ring: pts } | Geometry::Freehand { points: pts } => {
                bounding_rect(pts).unwrap_or(Rect::ZERO)
            }
            Geometry::Threshold { start: a, end: b }
            | Geometry::Square { corner: a, opposite: b }
            | Geometry::Triangle { corner: a, opposite: b } => Rect::from_points(*a, *b),
        }
    }

    /// Check if a point hits this geometry. Closed shapes hit on their interior
    /// and near their outline; open shapes only near the path.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        match self {
            Geometry::Circle { center, rim } => {
                geometry::distance(point, *center) <= geometry::distance(*center, *rim) + tolerance
            }
            Geometry::Threshold { start, end } => {
                geometry::point_near_segment(point, *start, *end, tolerance)
            }
            Geometry::Freehand { points } => point_near_path(point, points, tolerance),
            _ => {
                let Some(mut ring) = self.ring() else {
                    return false;
                };
                if point_in_polygon(point, &ring) {
                    return true;
                }
                if let Some(first) = ring.first().copied() {
                    ring.push(first);
                }
                point_near_path(point, &ring, tolerance)
            }
        }
    }
}

/// Corners of the rectangle spanned by two opposite points, clockwise from `a`.
pub fn square_corners(a: Point, b: Point) -> [Point; 4] {
    [a, Point::new(b.x, a.y), b, Point::new(a.x, b.y)]
}

/// Top-middle, bottom-right and bottom-left of the box spanned by two points.
pub fn triangle_corners(a: Point, b: Point) -> [Point; 3] {
    let r = Rect::from_points(a, b);
    [
        Point::new((r.x0 + r.x1) / 2.0, r.y0),
        Point::new(r.x1, r.y1),
        Point::new(r.x0, r.y1),
    ]
}

/// Straight-segment path through `points`.
pub fn polyline_path(points: &[Point], closed: bool) -> BezPath {
    let mut path = BezPath::new();
    let Some((first, rest)) = points.split_first() else {
        return path;
    };
    path.move_to(*first);
    for p in rest {
        path.line_to(*p);
    }
    if closed {
        path.close_path();
    }
    path
}

/// A committed, annotated shape on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapObject {
    pub id: ShapeId,
    pub project_id: ProjectId,
    pub name: String,
    pub geometry: Geometry,
    pub style: ShapeStyle,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MapObject {
    pub fn new(project_id: ProjectId, name: impl Into<String>, geometry: Geometry, style: ShapeStyle) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            name: name.into(),
            geometry,
            style,
            metadata: Metadata::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    pub fn vertices(&self) -> Vec<Point> {
        self.geometry.vertices()
    }

    pub fn bounds(&self) -> Rect {
        self.geometry.bounds()
    }

    /// Hit test with the stroke width folded into the tolerance for open paths.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let tolerance = if self.kind().is_closed() {
            tolerance
        } else {
            tolerance + self.style.stroke_width / 2.0
        };
        self.geometry.hit_test(point, tolerance)
    }

    pub fn to_path(&self) -> BezPath {
        self.geometry.to_path()
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_arity_contract() {
        assert!(Geometry::from_vertices(ShapeKind::Polygon, pts(&[(0.0, 0.0), (1.0, 0.0)])).is_err());
        assert!(Geometry::from_vertices(ShapeKind::Polygon, pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)])).is_ok());
        assert!(Geometry::from_vertices(ShapeKind::Threshold, pts(&[(0.0, 0.0)])).is_err());
        assert!(Geometry::from_vertices(ShapeKind::Threshold, pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)])).is_err());
        assert!(Geometry::from_vertices(ShapeKind::Freehand, pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)])).is_ok());
        for kind in [ShapeKind::Circle, ShapeKind::Square, ShapeKind::Triangle] {
            assert!(Geometry::from_vertices(kind, pts(&[(0.0, 0.0), (4.0, 4.0)])).is_ok());
            assert!(Geometry::from_vertices(kind, pts(&[(0.0, 0.0)])).is_err());
        }
    }

    #[test]
    fn test_invalid_geometry_reports_counts() {
        let err = Geometry::from_vertices(ShapeKind::Polygon, pts(&[(0.0, 0.0)])).unwrap_err();
        match err {
            SceneError::InvalidGeometry { kind, expected, actual } => {
                assert_eq!(kind, ShapeKind::Polygon);
                assert_eq!(expected, Arity::AtLeast(3));
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_vertices_roundtrip_through_kind() {
        let vertices = pts(&[(1.0, 2.0), (3.0, 4.0)]);
        for kind in [ShapeKind::Threshold, ShapeKind::Circle, ShapeKind::Square, ShapeKind::Triangle] {
            let g = Geometry::from_vertices(kind, vertices.clone()).unwrap();
            assert_eq!(g.kind(), kind);
            assert_eq!(g.vertices(), vertices);
        }
    }

    #[test]
    fn test_set_vertex_preserves_arity() {
        let mut g = Geometry::from_vertices(ShapeKind::Square, pts(&[(0.0, 0.0), (10.0, 10.0)])).unwrap();
        assert!(g.set_vertex(1, Point::new(20.0, 20.0)));
        assert!(!g.set_vertex(2, Point::new(1.0, 1.0)));
        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.vertex(1), Some(Point::new(20.0, 20.0)));
    }

    #[test]
    fn test_triangle_corners() {
        let corners = triangle_corners(Point::new(10.0, 10.0), Point::new(0.0, 20.0));
        assert_eq!(corners[0], Point::new(5.0, 10.0));
        assert_eq!(corners[1], Point::new(10.0, 20.0));
        assert_eq!(corners[2], Point::new(0.0, 20.0));
    }

    #[test]
    fn test_hit_test_per_variant() {
        let square = Geometry::from_vertices(ShapeKind::Square, pts(&[(0.0, 0.0), (10.0, 10.0)])).unwrap();
        assert!(square.hit_test(Point::new(5.0, 5.0), 1.0));
        assert!(square.hit_test(Point::new(10.5, 5.0), 1.0));
        assert!(!square.hit_test(Point::new(15.0, 5.0), 1.0));

        let circle = Geometry::from_vertices(ShapeKind::Circle, pts(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
        assert!(circle.hit_test(Point::new(0.0, 9.0), 0.0));
        assert!(!circle.hit_test(Point::new(0.0, 12.0), 1.0));

        let line = Geometry::from_vertices(ShapeKind::Threshold, pts(&[(0.0, 0.0), (100.0, 0.0)])).unwrap();
        assert!(line.hit_test(Point::new(50.0, 2.0), 3.0));
        assert!(!line.hit_test(Point::new(50.0, 20.0), 3.0));
    }

    #[test]
    fn test_bounds() {
        let circle = Geometry::from_vertices(ShapeKind::Circle, pts(&[(5.0, 5.0), (5.0, 8.0)])).unwrap();
        assert_eq!(circle.bounds(), Rect::new(2.0, 2.0, 8.0, 8.0));
        let line = Geometry::from_vertices(ShapeKind::Threshold, pts(&[(10.0, 20.0), (0.0, 5.0)])).unwrap();
        assert_eq!(line.bounds(), Rect::new(0.0, 5.0, 10.0, 20.0));
    }

    #[test]
    fn test_geometry_serde_tag() {
        let g = Geometry::from_vertices(ShapeKind::Threshold, pts(&[(0.0, 0.0), (1.0, 1.0)])).unwrap();
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["type"], "threshold");
        let back: Geometry = serde_json::from_value(json).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn test_open_shape_hit_includes_stroke_width() {
        let geometry = Geometry::from_vertices(ShapeKind::Freehand, pts(&[(0.0, 0.0), (100.0, 0.0)])).unwrap();
        let mut style = ShapeStyle::default();
        style.stroke_width = 10.0;
        let object = MapObject::new(Uuid::new_v4(), "Path 1", geometry, style);
        assert!(object.hit_test(Point::new(50.0, 6.0), 2.0));
        assert!(!object.hit_test(Point::new(50.0, 8.0), 2.0));
    }
}
