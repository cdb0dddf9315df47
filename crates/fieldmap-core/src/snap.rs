//! Vertex snapping for the edit tool.

use crate::scene::Scene;
use crate::shapes::ShapeId;
use kurbo::Point;

/// Distance threshold for vertex snapping (in scene units).
pub const VERTEX_SNAP_THRESHOLD: f64 = 10.0;

/// The vertex a point snapped to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapTarget {
    pub shape: ShapeId,
    pub index: usize,
}

/// Result of a snap operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// The snapped point, or the input point if nothing was close enough.
    pub point: Point,
    pub target: Option<SnapTarget>,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self { point, target: None }
    }

    pub fn is_snapped(&self) -> bool {
        self.target.is_some()
    }
}

/// Snap `point` onto another shape's vertex.
///
/// Shapes are scanned in insertion order and the first vertex within
/// `threshold` wins, even if a later one is closer. `exclude` is skipped.
pub fn snap_to_vertices(point: Point, scene: &Scene, exclude: Option<ShapeId>, threshold: f64) -> SnapResult {
    let threshold_sq = threshold * threshold;
    for object in scene.objects().filter(|o| Some(o.id) != exclude) {
        for (index, vertex) in object.vertices().into_iter().enumerate() {
            let dx = point.x - vertex.x;
            let dy = point.y - vertex.y;
            if dx * dx + dy * dy <= threshold_sq {
                return SnapResult {
                    point: vertex,
                    target: Some(SnapTarget {
                        shape: object.id,
                        index,
                    }),
                };
            }
        }
    }
    SnapResult::none(point)
}
