//! Drawing tools: polygon, line, calibrate, freehand, highlighter and primitives.

use super::{PointerInput, ToolAction, ToolController, ToolKind, ToolState};
use crate::calibration::PendingCalibration;
use crate::geometry::distance;
use crate::shapes::ShapeKind;
use kurbo::Point;

/// Append `point` if it is farther than `smoothing` from the last buffered point.
pub(super) fn extend_stroke(points: &mut Vec<Point>, point: Point, smoothing: f64) {
    match points.last() {
        Some(last) if distance(*last, point) <= smoothing => {}
        _ => points.push(point),
    }
}

impl ToolController {
    pub(super) fn polygon_down(&mut self, input: PointerInput) -> Option<ToolAction> {
        match &mut self.state {
            ToolState::Polygon { vertices, cursor } => {
                vertices.push(input.scene);
                *cursor = Some(input.scene);
            }
            state => {
                *state = ToolState::Polygon {
                    vertices: vec![input.scene],
                    cursor: Some(input.scene),
                }
            }
        }
        None
    }

    /// Finish the polygon in progress.
    ///
    /// With three or more vertices this commits and returns to select mode.
    /// Otherwise the buffer is cleared and the tool stays in polygon mode.
    pub fn finish(&mut self) -> Option<ToolAction> {
        if self.kind != ToolKind::Polygon {
            return None;
        }
        let vertices = match std::mem::take(&mut self.state) {
            ToolState::Polygon { vertices, .. } => vertices,
            _ => Vec::new(),
        };
        if vertices.len() < 3 {
            log::debug!("Discarding polygon with {} vertices", vertices.len());
            return None;
        }
        self.kind = ToolKind::Select;
        Some(ToolAction::Commit {
            kind: ShapeKind::Polygon,
            vertices,
            style: self.style.clone(),
        })
    }

    pub(super) fn two_click_down(&mut self, input: PointerInput) -> Option<ToolAction> {
        let start = match std::mem::take(&mut self.state) {
            ToolState::TwoClick { start, .. } => start,
            _ => {
                self.state = ToolState::TwoClick {
                    start: input.scene,
                    current: input.scene,
                };
                return None;
            }
        };
        let end = input.scene;
        let pixel_distance = distance(start, end);
        if pixel_distance <= f64::EPSILON {
            log::debug!("Discarding zero-length {:?}", self.kind);
            return None;
        }
        if self.kind == ToolKind::Calibrate {
            Some(ToolAction::CalibrationPending(PendingCalibration {
                start,
                end,
                pixel_distance,
            }))
        } else {
            Some(ToolAction::LineCompleted {
                start,
                end,
                pixel_distance,
            })
        }
    }

    pub(super) fn stroke_down(&mut self, input: PointerInput) -> Option<ToolAction> {
        self.state = ToolState::Stroke {
            points: vec![input.scene],
        };
        None
    }

    pub(super) fn finish_stroke(&mut self, points: Vec<Point>) -> Option<ToolAction> {
        if points.len() <= self.settings.min_freehand_points {
            log::debug!("Discarding stroke with {} points", points.len());
            return None;
        }
        Some(ToolAction::Commit {
            kind: ShapeKind::Freehand,
            vertices: points,
            style: self.stroke_style().clone(),
        })
    }

    pub(super) fn primitive_down(&mut self, input: PointerInput) -> Option<ToolAction> {
        self.state = ToolState::Primitive {
            anchor: input.scene,
            current: input.scene,
        };
        None
    }

    pub(super) fn finish_primitive(&mut self, anchor: Point, release: Point) -> Option<ToolAction> {
        let kind = self.kind.primitive()?;
        let degenerate = match kind {
            ShapeKind::Circle => distance(anchor, release) <= f64::EPSILON,
            _ => (anchor.x - release.x).abs() <= f64::EPSILON || (anchor.y - release.y).abs() <= f64::EPSILON,
        };
        if degenerate {
            log::debug!("Discarding zero-size {kind}");
            return None;
        }
        Some(ToolAction::Commit {
            kind,
            vertices: vec![anchor, release],
            style: self.style.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{at, ctx};
    use super::*;
    use crate::scene::Scene;
    use uuid::Uuid;

    #[test]
    fn test_polygon_commit_returns_to_select() {
        let scene = Scene::new(Uuid::new_v4());
        let mut tools = ToolController::default();
        tools.set_tool(ToolKind::Polygon);
        for (x, y) in [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)] {
            assert_eq!(tools.pointer_down(&ctx(&scene), at(x, y)), None);
            assert_eq!(tools.pointer_up(&ctx(&scene), at(x, y)), None);
        }
        match tools.finish() {
            Some(ToolAction::Commit { kind, vertices, .. }) => {
                assert_eq!(kind, ShapeKind::Polygon);
                assert_eq!(vertices.len(), 3);
            }
            other => panic!("expected commit, got {other:?}"),
        }
        assert_eq!(tools.kind(), ToolKind::Select);
    }

    #[test]
    fn test_polygon_finish_with_two_vertices_is_noop() {
        let scene = Scene::new(Uuid::new_v4());
        let mut tools = ToolController::default();
        tools.set_tool(ToolKind::Polygon);
        tools.pointer_down(&ctx(&scene), at(0.0, 0.0));
        tools.pointer_down(&ctx(&scene), at(10.0, 0.0));
        assert_eq!(tools.finish(), None);
        assert_eq!(tools.kind(), ToolKind::Polygon);
        assert_eq!(tools.state(), &ToolState::Idle);
    }

    #[test]
    fn test_line_two_clicks() {
        let scene = Scene::new(Uuid::new_v4());
        let mut tools = ToolController::default();
        tools.set_tool(ToolKind::Line);
        assert_eq!(tools.pointer_down(&ctx(&scene), at(0.0, 0.0)), None);
        assert_eq!(tools.pointer_up(&ctx(&scene), at(0.0, 0.0)), None);
        tools.pointer_move(&ctx(&scene), at(50.0, 0.0));
        assert!(tools.draft().is_some());
        assert_eq!(
            tools.pointer_down(&ctx(&scene), at(30.0, 40.0)),
            Some(ToolAction::LineCompleted {
                start: Point::ZERO,
                end: Point::new(30.0, 40.0),
                pixel_distance: 50.0
            })
        );
        assert!(!tools.is_busy());
        assert_eq!(tools.kind(), ToolKind::Line);
    }

    #[test]
    fn test_calibrate_emits_pending() {
        let scene = Scene::new(Uuid::new_v4());
        let mut tools = ToolController::default();
        tools.set_tool(ToolKind::Calibrate);
        tools.pointer_down(&ctx(&scene), at(0.0, 0.0));
        match tools.pointer_down(&ctx(&scene), at(100.0, 0.0)) {
            Some(ToolAction::CalibrationPending(pending)) => {
                assert!((pending.pixel_distance - 100.0).abs() < 1e-12)
            }
            other => panic!("expected pending calibration, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_length_line_is_discarded() {
        let scene = Scene::new(Uuid::new_v4());
        let mut tools = ToolController::default();
        tools.set_tool(ToolKind::Line);
        tools.pointer_down(&ctx(&scene), at(5.0, 5.0));
        assert_eq!(tools.pointer_down(&ctx(&scene), at(5.0, 5.0)), None);
        assert!(!tools.is_busy());
    }

    #[test]
    fn test_freehand_buffer_is_decimated() {
        let scene = Scene::new(Uuid::new_v4());
        let mut tools = ToolController::default();
        tools.set_tool(ToolKind::Freehand);
        let smoothing = tools.settings.smoothing_distance;
        tools.pointer_down(&ctx(&scene), at(0.0, 0.0));
        let moves = 7;
        for i in 1..=moves {
            let x = i as f64 * (smoothing + 1.0);
            tools.pointer_move(&ctx(&scene), at(x, 0.0));
            // Sub-threshold jitter is dropped.
            tools.pointer_move(&ctx(&scene), at(x + smoothing / 2.0, 0.0));
        }
        match tools.state() {
            ToolState::Stroke { points } => assert_eq!(points.len(), moves + 1),
            other => panic!("expected stroke, got {other:?}"),
        }
        let last = moves as f64 * (smoothing + 1.0);
        match tools.pointer_up(&ctx(&scene), at(last, 0.0)) {
            Some(ToolAction::Commit { kind, vertices, .. }) => {
                assert_eq!(kind, ShapeKind::Freehand);
                assert_eq!(vertices.len(), moves + 1);
            }
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn test_short_stroke_commits_nothing() {
        let scene = Scene::new(Uuid::new_v4());
        let mut tools = ToolController::default();
        tools.set_tool(ToolKind::Freehand);
        tools.pointer_down(&ctx(&scene), at(0.0, 0.0));
        for i in 1..=4 {
            tools.pointer_move(&ctx(&scene), at(i as f64 * 10.0, 0.0));
        }
        // Five points in the buffer: not enough.
        assert_eq!(tools.pointer_up(&ctx(&scene), at(40.0, 0.0)), None);
        assert!(!tools.is_busy());
    }

    #[test]
    fn test_release_point_is_not_added_to_stroke() {
        let scene = Scene::new(Uuid::new_v4());
        let mut tools = ToolController::default();
        tools.set_tool(ToolKind::Freehand);
        tools.pointer_down(&ctx(&scene), at(0.0, 0.0));
        for i in 1..=4 {
            tools.pointer_move(&ctx(&scene), at(i as f64 * 10.0, 0.0));
        }
        // Releasing far from the last point must not push the buffer past the minimum.
        assert_eq!(tools.pointer_up(&ctx(&scene), at(50.0, 0.0)), None);
        assert!(!tools.is_busy());
    }

    #[test]
    fn test_highlighter_uses_preset_style() {
        let scene = Scene::new(Uuid::new_v4());
        let mut tools = ToolController::default();
        tools.set_tool(ToolKind::Highlighter);
        tools.pointer_down(&ctx(&scene), at(0.0, 0.0));
        for i in 1..=6 {
            tools.pointer_move(&ctx(&scene), at(i as f64 * 10.0, 0.0));
        }
        match tools.pointer_up(&ctx(&scene), at(60.0, 0.0)) {
            Some(ToolAction::Commit { kind, style, .. }) => {
                assert_eq!(kind, ShapeKind::Freehand);
                assert_eq!(style, tools.highlighter_style);
            }
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn test_primitives_commit_anchor_and_release() {
        let scene = Scene::new(Uuid::new_v4());
        let mut tools = ToolController::default();
        for tool in [ToolKind::Circle, ToolKind::Square, ToolKind::Triangle] {
            tools.set_tool(tool);
            tools.pointer_down(&ctx(&scene), at(10.0, 10.0));
            tools.pointer_move(&ctx(&scene), at(20.0, 20.0));
            assert!(matches!(tools.draft(), Some(super::super::Draft::Primitive { .. })));
            match tools.pointer_up(&ctx(&scene), at(30.0, 40.0)) {
                Some(ToolAction::Commit { kind, vertices, .. }) => {
                    assert_eq!(Some(kind), tool.primitive());
                    assert_eq!(vertices, vec![Point::new(10.0, 10.0), Point::new(30.0, 40.0)]);
                }
                other => panic!("expected commit, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_zero_size_primitive_is_discarded() {
        let scene = Scene::new(Uuid::new_v4());
        let mut tools = ToolController::default();
        tools.set_tool(ToolKind::Square);
        tools.pointer_down(&ctx(&scene), at(10.0, 10.0));
        assert_eq!(tools.pointer_up(&ctx(&scene), at(10.0, 10.0)), None);
        tools.pointer_down(&ctx(&scene), at(10.0, 10.0));
        assert_eq!(tools.pointer_up(&ctx(&scene), at(30.0, 10.0)), None);
    }
}
