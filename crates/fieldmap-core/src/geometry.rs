//! Pure geometry routines used for hit-testing, measurement and hatch fills.
//!
//! Every function here is total: empty or degenerate input yields a zero/false
//! sentinel instead of panicking.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    (b - a).hypot()
}

/// Even-odd ray casting test. The ring is implicitly closed.
pub fn point_in_polygon(point: Point, ring: &[Point]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (pi, pj) = (ring[i], ring[j]);
        let crosses = (pi.y > point.y) != (pj.y > point.y);
        if crosses {
            let x_at_y = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
            if point.x < x_at_y {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Distance from a point to the segment `a -> b`, clamped to the segment ends.
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    distance(point, proj)
}

/// Whether `point` lies within `threshold` of the segment `a -> b`.
pub fn point_near_segment(point: Point, a: Point, b: Point, threshold: f64) -> bool {
    point_to_segment_dist(point, a, b) <= threshold
}

/// Whether `point` lies within `threshold` of any consecutive segment of an open path.
pub fn point_near_path(point: Point, vertices: &[Point], threshold: f64) -> bool {
    match vertices {
        [] => false,
        [only] => distance(point, *only) <= threshold,
        _ => vertices
            .windows(2)
            .any(|w| point_near_segment(point, w[0], w[1], threshold)),
    }
}

/// Unsigned shoelace area in square pixels.
pub fn polygon_area_px(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let twice: f64 = ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice.abs() / 2.0
}

/// Polygon area in square meters.
///
/// Returns 0 when the ring has fewer than three vertices or when no usable
/// calibration ratio is available.
pub fn polygon_area(ring: &[Point], pixels_per_meter: Option<f64>) -> f64 {
    match pixels_per_meter {
        Some(ppm) if ppm > 0.0 && ppm.is_finite() => polygon_area_px(ring) / (ppm * ppm),
        _ => 0.0,
    }
}

/// Total length of an open path. Meters when calibrated, raw pixels otherwise.
pub fn polyline_length(vertices: &[Point], pixels_per_meter: Option<f64>) -> f64 {
    let pixels: f64 = vertices.windows(2).map(|w| distance(w[0], w[1])).sum();
    match pixels_per_meter {
        Some(ppm) if ppm > 0.0 && ppm.is_finite() => pixels / ppm,
        _ => pixels,
    }
}

/// Axis-aligned bounds of a point set.
pub fn bounding_rect(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let init = Rect::from_points(*first, *first);
    Some(points.iter().skip(1).fold(init, |r, p| r.union_pt(*p)))
}

/// Hatch pattern applied on top of a shape's fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HatchPattern {
    #[default]
    None,
    Diagonal,
    Dotted,
    Crosshatch,
}

/// A single hatch primitive, in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HatchPrimitive {
    Line { from: Point, to: Point, width: f64 },
    Dot { center: Point, radius: f64 },
}

/// Enumerate the hatch primitives covering the ring's bounding box.
///
/// Primitives are not clipped; the renderer clips them to the ring.
pub fn hatch_fill_spec(
    ring: &[Point],
    pattern: HatchPattern,
    spacing: f64,
    line_width: f64,
) -> Vec<HatchPrimitive> {
    let Some(bounds) = bounding_rect(ring) else {
        return Vec::new();
    };
    if ring.len() < 3 || !(spacing > 0.0) || pattern == HatchPattern::None {
        return Vec::new();
    }

    let (w, h) = (bounds.width(), bounds.height());
    let mut out = Vec::new();

    match pattern {
        HatchPattern::None => {}
        HatchPattern::Diagonal | HatchPattern::Crosshatch => {
            // Offsets run from -h so the 45 degree family sweeps the whole box.
            let mut offset = -h;
            while offset < w {
                let x = bounds.x0 + offset;
                out.push(HatchPrimitive::Line {
                    from: Point::new(x, bounds.y1),
                    to: Point::new(x + h, bounds.y0),
                    width: line_width,
                });
                if pattern == HatchPattern::Crosshatch {
                    out.push(HatchPrimitive::Line {
                        from: Point::new(x, bounds.y0),
                        to: Point::new(x + h, bounds.y1),
                        width: line_width,
                    });
                }
                offset += spacing;
            }
        }
        HatchPattern::Dotted => {
            let radius = (line_width / 2.0).max(0.5);
            let mut y = bounds.y0 + spacing / 2.0;
            while y < bounds.y1 {
                let mut x = bounds.x0 + spacing / 2.0;
                while x < bounds.x1 {
                    out.push(HatchPrimitive::Dot {
                        center: Point::new(x, y),
                        radius,
                    });
                    x += spacing;
                }
                y += spacing;
            }
        }
    }
    out
}

/// Unit vector from `a` towards `b`, or zero for coincident points.
pub fn direction(a: Point, b: Point) -> Vec2 {
    let d = b - a;
    let len = d.hypot();
    if len < f64::EPSILON { Vec2::ZERO } else { d / len }
}
