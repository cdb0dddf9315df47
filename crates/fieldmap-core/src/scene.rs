//! The committed scene: shapes and background images.

use crate::background::{BackgroundImage, ImageId};
use crate::shapes::{Arity, Geometry, MapObject, Metadata, ProjectId, ShapeId, ShapeKind, ShapeStyle};
use kurbo::{Point, Rect};
use std::sync::Arc;
use thiserror::Error;

/// Scene model errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("{kind} needs {expected} vertices, got {actual}")]
    InvalidGeometry {
        kind: ShapeKind,
        expected: Arity,
        actual: usize,
    },
    #[error("no shape with id {0}")]
    NotFound(ShapeId),
    #[error("no image with id {0}")]
    ImageNotFound(ImageId),
    #[error("vertex {index} out of range for shape {id}")]
    VertexOutOfRange { id: ShapeId, index: usize },
}

/// Order in which `find_shape_at` scans shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanOrder {
    /// Most recently inserted first.
    #[default]
    TopToBottom,
    BottomToTop,
}

/// Partial update for a shape. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ShapePatch {
    pub name: Option<String>,
    pub style: Option<ShapeStyle>,
    pub metadata: Option<Metadata>,
    pub vertices: Option<Vec<Point>>,
}

impl ShapePatch {
    pub fn style(style: ShapeStyle) -> Self {
        Self {
            style: Some(style),
            ..Default::default()
        }
    }
}

/// The committed shape collection at one point in time.
///
/// Shapes are shared with the live scene; taking a snapshot copies pointers only.
#[derive(Debug, Clone, Default)]
pub struct SceneSnapshot {
    objects: Vec<Arc<MapObject>>,
}

impl SceneSnapshot {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.objects.iter().any(|o| o.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MapObject> {
        self.objects.iter().map(|o| o.as_ref())
    }
}

impl PartialEq for SceneSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.objects.len() == other.objects.len()
            && self
                .objects
                .iter()
                .zip(&other.objects)
                .all(|(a, b)| Arc::ptr_eq(a, b) || a == b)
    }
}

/// Authoritative in-memory collection of committed shapes and background images.
#[derive(Debug, Clone)]
pub struct Scene {
    project_id: ProjectId,
    /// Shapes in insertion order (back to front).
    objects: Vec<Arc<MapObject>>,
    images: Vec<BackgroundImage>,
}

impl Scene {
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            objects: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Build a scene from stored records.
    pub fn from_parts(project_id: ProjectId, objects: Vec<MapObject>, images: Vec<BackgroundImage>) -> Self {
        Self {
            project_id,
            objects: objects.into_iter().map(Arc::new).collect(),
            images,
        }
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Shapes in insertion order.
    pub fn objects(&self) -> impl DoubleEndedIterator<Item = &MapObject> {
        self.objects.iter().map(|o| o.as_ref())
    }

    pub fn get(&self, id: ShapeId) -> Option<&MapObject> {
        self.objects.iter().find(|o| o.id == id).map(|o| o.as_ref())
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.get(id).is_some()
    }

    /// Mutable access; clones the shape first if a snapshot still shares it.
    fn get_mut(&mut self, id: ShapeId) -> Result<&mut MapObject, SceneError> {
        self.objects
            .iter_mut()
            .find(|o| o.id == id)
            .map(Arc::make_mut)
            .ok_or(SceneError::NotFound(id))
    }

    /// Validate and commit a new shape, naming it after its kind ("Polygon 3").
    pub fn add_shape(
        &mut self,
        kind: ShapeKind,
        vertices: Vec<Point>,
        style: ShapeStyle,
        metadata: Metadata,
    ) -> Result<&MapObject, SceneError> {
        let geometry = Geometry::from_vertices(kind, vertices)?;
        let ordinal = self.objects.iter().filter(|o| o.kind() == kind).count() + 1;
        let mut object = MapObject::new(self.project_id, format!("{} {}", kind.label(), ordinal), geometry, style);
        object.metadata = metadata;
        Ok(self.insert_object(object))
    }

    /// Insert an already built shape on top of the stack.
    pub fn insert_object(&mut self, object: MapObject) -> &MapObject {
        self.objects.push(Arc::new(object));
        let last = self.objects.len() - 1;
        self.objects[last].as_ref()
    }

    /// Merge a partial update into a shape.
    pub fn update_shape(&mut self, id: ShapeId, patch: ShapePatch) -> Result<(), SceneError> {
        // Validate before touching anything so a bad patch leaves the shape intact.
        let geometry = match patch.vertices {
            Some(vertices) => {
                let kind = self.get(id).ok_or(SceneError::NotFound(id))?.kind();
                Some(Geometry::from_vertices(kind, vertices)?)
            }
            None => None,
        };
        let object = self.get_mut(id)?;
        if let Some(name) = patch.name {
            object.name = name;
        }
        if let Some(style) = patch.style {
            object.style = style;
        }
        if let Some(metadata) = patch.metadata {
            object.metadata = metadata;
        }
        if let Some(geometry) = geometry {
            object.geometry = geometry;
        }
        object.touch();
        Ok(())
    }

    /// Remove a shape. Returns it if it was present; absent ids are a no-op.
    pub fn delete_shape(&mut self, id: ShapeId) -> Option<MapObject> {
        let idx = self.objects.iter().position(|o| o.id == id)?;
        let removed = self.objects.remove(idx);
        Some(Arc::unwrap_or_clone(removed))
    }

    /// Move one vertex of a shape without changing its vertex count.
    pub fn set_vertex(&mut self, id: ShapeId, index: usize, point: Point) -> Result<(), SceneError> {
        let object = self.get_mut(id)?;
        if !object.geometry.set_vertex(index, point) {
            return Err(SceneError::VertexOutOfRange { id, index });
        }
        object.touch();
        Ok(())
    }

    /// First shape hit at `point`.
    pub fn find_shape_at(&self, point: Point, tolerance: f64, order: ScanOrder) -> Option<&MapObject> {
        let hit = |o: &&Arc<MapObject>| o.hit_test(point, tolerance);
        let found = match order {
            ScanOrder::TopToBottom => self.objects.iter().rev().find(hit),
            ScanOrder::BottomToTop => self.objects.iter().find(hit),
        };
        found.map(|o| o.as_ref())
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            objects: self.objects.clone(),
        }
    }

    /// Replace the committed shape collection with a snapshot's contents.
    pub fn restore(&mut self, snapshot: &SceneSnapshot) {
        self.objects = snapshot.objects.clone();
    }

    /// Union of all shape bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.objects
            .iter()
            .map(|o| o.bounds())
            .reduce(|a, b| a.union(b))
    }

    /// Union of shape bounds and visible, decoded background images.
    pub fn content_bounds(&self) -> Option<Rect> {
        let images = self
            .images
            .iter()
            .filter(|img| img.visible)
            .filter_map(|img| img.bounds());
        self.objects
            .iter()
            .map(|o| o.bounds())
            .chain(images)
            .reduce(|a, b| a.union(b))
    }

    // --- background images ---

    pub fn add_image(&mut self, mut image: BackgroundImage) -> ImageId {
        if let Some(top) = self.images.iter().map(|i| i.z_index).max() {
            image.z_index = image.z_index.max(top + 1);
        }
        let id = image.id;
        self.images.push(image);
        id
    }

    pub fn remove_image(&mut self, id: ImageId) -> Option<BackgroundImage> {
        let idx = self.images.iter().position(|i| i.id == id)?;
        Some(self.images.remove(idx))
    }

    pub fn image(&self, id: ImageId) -> Option<&BackgroundImage> {
        self.images.iter().find(|i| i.id == id)
    }

    /// Apply an in-place edit to one image.
    pub fn update_image(
        &mut self,
        id: ImageId,
        edit: impl FnOnce(&mut BackgroundImage),
    ) -> Result<(), SceneError> {
        let image = self
            .images
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(SceneError::ImageNotFound(id))?;
        edit(image);
        Ok(())
    }

    /// Images sorted by ascending z-index (stable for ties).
    pub fn images_ordered(&self) -> Vec<&BackgroundImage> {
        let mut ordered: Vec<&BackgroundImage> = self.images.iter().collect();
        ordered.sort_by_key(|i| i.z_index);
        ordered
    }

    pub fn images(&self) -> &[BackgroundImage] {
        &self.images
    }

    /// Topmost visible, unlocked image under `point`.
    pub fn find_image_at(&self, point: Point) -> Option<&BackgroundImage> {
        self.images_ordered()
            .into_iter()
            .rev()
            .find(|img| img.is_interactive() && img.hit_test(point))
    }
}
