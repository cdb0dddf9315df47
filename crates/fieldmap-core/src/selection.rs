//! Selection state and vertex handles.

use crate::background::ImageId;
use crate::shapes::{MapObject, ShapeId};
use kurbo::Point;

/// What is currently selected. At most one item is selected at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Shape(ShapeId),
    Image(ImageId),
}

impl Selection {
    pub fn shape(&self) -> Option<ShapeId> {
        match self {
            Selection::Shape(id) => Some(*id),
            Selection::Image(_) => None,
        }
    }

    pub fn image(&self) -> Option<ImageId> {
        match self {
            Selection::Image(id) => Some(*id),
            Selection::Shape(_) => None,
        }
    }
}

/// A vertex handle of a selected shape, in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub position: Point,
    /// Index into the shape's defining vertices.
    pub index: usize,
}

impl Handle {
    pub fn new(position: Point, index: usize) -> Self {
        Self { position, index }
    }

    /// Check if a point hits this handle.
    pub fn hit_test(&self, point: Point, radius: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= radius * radius
    }
}

/// Index of the first vertex within `radius` of `point`.
pub fn hit_test_vertices(object: &MapObject, point: Point, radius: f64) -> Option<usize> {
    object
        .vertices()
        .into_iter()
        .enumerate()
        .map(|(i, p)| Handle::new(p, i))
        .find(|h| h.hit_test(point, radius))
        .map(|h| h.index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Geometry, ShapeKind, ShapeStyle};
    use uuid::Uuid;

    #[test]
    fn test_vertex_hit() {
        let geometry = Geometry::from_vertices(
            ShapeKind::Polygon,
            vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0), Point::new(0.0, 50.0)],
        )
        .unwrap();
        let object = MapObject::new(Uuid::new_v4(), "p", geometry, ShapeStyle::default());
        assert_eq!(hit_test_vertices(&object, Point::new(48.0, 3.0), 10.0), Some(1));
        assert_eq!(hit_test_vertices(&object, Point::new(25.0, 25.0), 10.0), None);
    }

    #[test]
    fn test_selection_accessors() {
        let id = Uuid::new_v4();
        assert_eq!(Selection::Shape(id).shape(), Some(id));
        assert_eq!(Selection::Shape(id).image(), None);
        assert_eq!(Selection::Image(id).image(), Some(id));
    }
}
