//! Backend-independent description of a frame.
//!
//! The builder walks the canvas once per frame and records what to draw,
//! tagged with the layer it belongs to. Backends replay the commands in order.

use crate::renderer::{RenderContext, RenderResult, RendererError};
use fieldmap_core::background::{BackgroundImage, BlendMode, ImageId};
use fieldmap_core::config::GridStyle;
use fieldmap_core::geometry::{HatchPattern, HatchPrimitive, direction, hatch_fill_spec};
use fieldmap_core::shapes::{Geometry, LineEndings, MapObject, SerializableColor, polyline_path};
use fieldmap_core::tools::Draft;
use kurbo::{Affine, BezPath, Circle, Point, Rect, Shape, Vec2};
use std::borrow::Cow;

/// Grid cells smaller than this on screen are not drawn.
const MIN_GRID_CELL_PX: f64 = 4.0;
/// Side of a vertex handle, in screen pixels.
const HANDLE_SIZE: f64 = 8.0;
/// Width of selection, calibration and draft outlines, in screen pixels.
const OVERLAY_STROKE: f64 = 2.0;
const PATH_TOLERANCE: f64 = 0.1;

/// Draw order, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Background,
    Grid,
    Images,
    Shapes,
    Calibration,
    Draft,
    /// Minimap viewport rectangle.
    Indicator,
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    Fill {
        path: BezPath,
        color: SerializableColor,
        transform: Affine,
    },
    Stroke {
        path: BezPath,
        color: SerializableColor,
        /// In the coordinate space of `transform`.
        width: f64,
        /// Empty for a continuous line.
        dash: Vec<f64>,
        transform: Affine,
    },
    /// A decoded background image; `transform` maps image pixels to the target.
    Image {
        id: ImageId,
        transform: Affine,
        opacity: f64,
        blend: BlendMode,
    },
    /// Clip subsequent commands to `path` until the matching `PopClip`.
    PushClip { path: BezPath, transform: Affine },
    PopClip,
}

#[derive(Debug, Clone)]
pub struct DisplayItem {
    pub layer: Layer,
    pub command: DrawCommand,
}

#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    items: Vec<DisplayItem>,
}

impl DisplayList {
    /// Build the main view.
    pub fn build(ctx: &RenderContext) -> RenderResult<DisplayList> {
        let size = ctx.viewport_size();
        if !(size.width > 0.0 && size.height > 0.0) {
            return Err(RendererError::EmptyViewport(size));
        }
        let viewport = &ctx.canvas.viewport;
        let root = Affine::scale(ctx.scale_factor);
        let mut builder = Builder {
            ctx,
            list: DisplayList::default(),
            root,
            view: root * viewport.transform(),
            zoom: viewport.scale(),
        };
        builder.background(size.to_rect());
        builder.grid();
        builder.images();
        builder.shapes();
        builder.calibration();
        builder.draft();
        Ok(builder.list)
    }

    /// Build the overview: images, simplified shapes and the viewport indicator.
    pub fn build_minimap(ctx: &RenderContext) -> DisplayList {
        let layout = ctx.canvas.minimap_layout();
        let root = Affine::scale(ctx.scale_factor);
        let mut builder = Builder {
            ctx,
            list: DisplayList::default(),
            root,
            view: root * layout.transform(),
            zoom: layout.scale,
        };
        builder.background(layout.size.to_rect());
        builder.images();
        for object in ctx.canvas.scene().objects() {
            builder.shape_outline(object);
        }
        let indicator = layout.viewport_indicator(&ctx.canvas.viewport);
        builder.push(
            Layer::Indicator,
            DrawCommand::Stroke {
                path: indicator.to_path(PATH_TOLERANCE),
                color: ctx.display.accent_color,
                width: 1.5,
                dash: Vec::new(),
                transform: root,
            },
        );
        builder.list
    }

    pub fn items(&self) -> &[DisplayItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &DrawCommand> {
        self.items
            .iter()
            .filter(move |item| item.layer == layer)
            .map(|item| &item.command)
    }
}

struct Builder<'a, 'b> {
    ctx: &'b RenderContext<'a>,
    list: DisplayList,
    /// Screen space, HiDPI applied.
    root: Affine,
    /// Scene space to device pixels.
    view: Affine,
    /// Device-independent pixels per scene unit.
    zoom: f64,
}

impl Builder<'_, '_> {
    fn push(&mut self, layer: Layer, command: DrawCommand) {
        self.list.items.push(DisplayItem { layer, command });
    }

    /// Screen pixels to scene units.
    fn px(&self, screen: f64) -> f64 {
        screen / self.zoom
    }

    fn fill(&mut self, layer: Layer, path: BezPath, color: SerializableColor) {
        let transform = self.view;
        self.push(layer, DrawCommand::Fill { path, color, transform });
    }

    fn stroke(&mut self, layer: Layer, path: BezPath, color: SerializableColor, width: f64, dash: Vec<f64>) {
        let transform = self.view;
        self.push(
            layer,
            DrawCommand::Stroke {
                path,
                color,
                width,
                dash,
                transform,
            },
        );
    }

    fn background(&mut self, rect: Rect) {
        let transform = self.root;
        self.push(
            Layer::Background,
            DrawCommand::Fill {
                path: rect.to_path(PATH_TOLERANCE),
                color: self.ctx.display.background_color,
                transform,
            },
        );
    }

    fn grid(&mut self) {
        let ctx = self.ctx;
        let display = &ctx.display;
        let cell = display.grid_size;
        if display.grid_style == GridStyle::None || !(cell > 0.0) || cell * self.zoom < MIN_GRID_CELL_PX {
            return;
        }
        let visible = ctx.canvas.viewport.visible_scene_rect();
        let x0 = (visible.x0 / cell).floor() as i64;
        let x1 = (visible.x1 / cell).ceil() as i64;
        let y0 = (visible.y0 / cell).floor() as i64;
        let y1 = (visible.y1 / cell).ceil() as i64;
        let (top, bottom) = (y0 as f64 * cell, y1 as f64 * cell);
        let (left, right) = (x0 as f64 * cell, x1 as f64 * cell);
        let color = display.grid_color;

        match display.grid_style {
            GridStyle::None => {}
            GridStyle::Lines => {
                let mut path = BezPath::new();
                for i in x0..=x1 {
                    let x = i as f64 * cell;
                    path.move_to((x, top));
                    path.line_to((x, bottom));
                }
                for j in y0..=y1 {
                    let y = j as f64 * cell;
                    path.move_to((left, y));
                    path.line_to((right, y));
                }
                let width = self.px(0.5);
                self.stroke(Layer::Grid, path, color, width, Vec::new());
            }
            GridStyle::Dots => {
                // One batched path for every dot.
                let radius = self.px(1.5);
                let mut path = BezPath::new();
                for i in x0..=x1 {
                    for j in y0..=y1 {
                        let center = Point::new(i as f64 * cell, j as f64 * cell);
                        path.extend(Circle::new(center, radius).path_elements(PATH_TOLERANCE));
                    }
                }
                self.fill(Layer::Grid, path, color);
            }
            GridStyle::Squares => {
                let every = i64::from(display.grid_major_every.max(1));
                let mut minor = BezPath::new();
                let mut major = BezPath::new();
                for i in x0..=x1 {
                    let x = i as f64 * cell;
                    let target = if i.rem_euclid(every) == 0 { &mut major } else { &mut minor };
                    target.move_to((x, top));
                    target.line_to((x, bottom));
                }
                for j in y0..=y1 {
                    let y = j as f64 * cell;
                    let target = if j.rem_euclid(every) == 0 { &mut major } else { &mut minor };
                    target.move_to((left, y));
                    target.line_to((right, y));
                }
                let (minor_width, major_width) = (self.px(0.5), self.px(1.25));
                self.stroke(Layer::Grid, minor, color.with_opacity(0.5), minor_width, Vec::new());
                self.stroke(Layer::Grid, major, color, major_width, Vec::new());
            }
        }
    }

    fn images(&mut self) {
        let canvas = self.ctx.canvas;
        let dragged = match canvas.draft() {
            Some(Draft::Image { image, position }) => Some((image, position)),
            _ => None,
        };
        for image in canvas.scene().images_ordered() {
            if !image.visible || image.opacity <= 0.0 || image.natural_size.is_none() {
                continue;
            }
            if self.ctx.images.get(image.id).is_none() {
                continue;
            }
            let placed = match dragged {
                Some((id, position)) if id == image.id => Cow::Owned(BackgroundImage {
                    position,
                    ..image.clone()
                }),
                _ => Cow::Borrowed(image),
            };
            let transform = self.view * placed.transform();
            self.push(
                Layer::Images,
                DrawCommand::Image {
                    id: image.id,
                    transform,
                    opacity: image.opacity.min(1.0),
                    blend: image.blend_mode,
                },
            );
        }
    }

    fn shapes(&mut self) {
        let canvas = self.ctx.canvas;
        let selected = canvas.selection().and_then(|s| s.shape());
        let dragged = match canvas.draft() {
            Some(Draft::Vertex {
                shape, index, position, ..
            }) => Some((shape, index, position)),
            _ => None,
        };
        for object in canvas.scene().objects() {
            let (geometry, drag_index) = match dragged {
                Some((id, index, position)) if id == object.id => {
                    let mut geometry = object.geometry.clone();
                    geometry.set_vertex(index, position);
                    (Cow::Owned(geometry), Some(index))
                }
                _ => (Cow::Borrowed(&object.geometry), None),
            };
            self.shape(object, &geometry, selected == Some(object.id), drag_index);
        }
    }

    fn shape(&mut self, object: &MapObject, geometry: &Geometry, selected: bool, drag_index: Option<usize>) {
        let style = &object.style;
        let path = geometry.to_path();

        if object.kind().is_closed() {
            let fill = style.fill_color.with_opacity(style.fill_opacity);
            if fill.a > 0 {
                self.fill(Layer::Shapes, path.clone(), fill);
            }
            if style.hatch != HatchPattern::None {
                if let Some(ring) = geometry.ring() {
                    self.hatch(&ring, &path, object);
                }
            }
        }

        if selected {
            let accent = self.ctx.display.accent_color;
            let width = style.stroke_width.max(self.px(OVERLAY_STROKE));
            self.stroke(Layer::Shapes, path, accent, width, style.dash_pattern());
        } else if style.has_stroke() {
            self.stroke(Layer::Shapes, path, style.stroke_color, style.stroke_width, style.dash_pattern());
        }

        let vertices = geometry.vertices();
        if !object.kind().is_closed() {
            self.line_endings(object, &vertices);
        }
        if style.show_points {
            let radius = style.point_size / 2.0;
            for v in &vertices {
                let marker = Circle::new(*v, radius).to_path(PATH_TOLERANCE);
                self.fill(Layer::Shapes, marker, style.stroke_color);
            }
        }
        if selected || drag_index.is_some() {
            self.handles(&vertices, drag_index);
        }
    }

    fn hatch(&mut self, ring: &[Point], outline: &BezPath, object: &MapObject) {
        let style = &object.style;
        let primitives = hatch_fill_spec(ring, style.hatch, style.hatch_spacing, style.hatch_line_width);
        if primitives.is_empty() {
            return;
        }
        let mut lines = BezPath::new();
        let mut dots = BezPath::new();
        for primitive in primitives {
            match primitive {
                HatchPrimitive::Line { from, to, .. } => {
                    lines.move_to(from);
                    lines.line_to(to);
                }
                HatchPrimitive::Dot { center, radius } => {
                    dots.extend(Circle::new(center, radius).path_elements(PATH_TOLERANCE));
                }
            }
        }
        let transform = self.view;
        self.push(
            Layer::Shapes,
            DrawCommand::PushClip {
                path: outline.clone(),
                transform,
            },
        );
        if !lines.elements().is_empty() {
            self.stroke(Layer::Shapes, lines, style.stroke_color, style.hatch_line_width, Vec::new());
        }
        if !dots.elements().is_empty() {
            self.fill(Layer::Shapes, dots, style.stroke_color);
        }
        self.push(Layer::Shapes, DrawCommand::PopClip);
    }

    fn line_endings(&mut self, object: &MapObject, vertices: &[Point]) {
        let style = &object.style;
        let (Some(&first), Some(&last)) = (vertices.first(), vertices.last()) else {
            return;
        };
        match style.line_endings {
            LineEndings::None => {}
            LineEndings::Points => {
                let radius = style.point_size.max(style.stroke_width);
                for p in [first, last] {
                    self.fill(Layer::Shapes, Circle::new(p, radius).to_path(PATH_TOLERANCE), style.stroke_color);
                }
            }
            LineEndings::Arrows => {
                let Some(&before) = vertices.iter().rev().nth(1) else {
                    return;
                };
                let dir = direction(before, last);
                if dir == Vec2::ZERO {
                    return;
                }
                let length = (style.stroke_width * 4.0).max(10.0);
                let normal = Vec2::new(-dir.y, dir.x) * (length / 2.0);
                let base = last - dir * length;
                let mut head = BezPath::new();
                head.move_to(last);
                head.line_to(base + normal);
                head.line_to(base - normal);
                head.close_path();
                self.fill(Layer::Shapes, head, style.stroke_color);
            }
        }
    }

    fn handles(&mut self, vertices: &[Point], drag_index: Option<usize>) {
        let display = &self.ctx.display;
        let (accent, dragged_color) = (display.accent_color, display.draft_color);
        let half = self.px(HANDLE_SIZE) / 2.0;
        let width = self.px(1.0);
        for (i, v) in vertices.iter().enumerate() {
            let rect = Rect::new(v.x - half, v.y - half, v.x + half, v.y + half).to_path(PATH_TOLERANCE);
            let body = if drag_index == Some(i) {
                dragged_color
            } else {
                SerializableColor::white()
            };
            self.fill(Layer::Shapes, rect.clone(), body);
            self.stroke(Layer::Shapes, rect, accent, width, Vec::new());
        }
    }

    fn calibration(&mut self) {
        let canvas = self.ctx.canvas;
        let color = self.ctx.display.calibration_color;
        if let Some(cal) = canvas.calibration() {
            self.calibration_marker(cal.start, cal.end, color, Vec::new());
        }
        if let Some(pending) = canvas.pending_calibration() {
            let dash = vec![self.px(6.0), self.px(4.0)];
            self.calibration_marker(pending.start, pending.end, color, dash);
        }
    }

    fn calibration_marker(&mut self, start: Point, end: Point, color: SerializableColor, dash: Vec<f64>) {
        let width = self.px(OVERLAY_STROKE);
        self.stroke(Layer::Calibration, polyline_path(&[start, end], false), color, width, dash);
        let radius = self.px(4.0);
        for p in [start, end] {
            self.fill(Layer::Calibration, Circle::new(p, radius).to_path(PATH_TOLERANCE), color);
        }
    }

    fn draft(&mut self) {
        let ctx = self.ctx;
        let Some(draft) = ctx.canvas.draft() else {
            return;
        };
        let display = &ctx.display;
        let color = display.draft_color;
        let width = self.px(OVERLAY_STROKE);
        let dash = vec![self.px(6.0), self.px(4.0)];

        match draft {
            Draft::Polygon { vertices, cursor } => {
                if vertices.len() >= 2 {
                    self.stroke(Layer::Draft, polyline_path(vertices, false), color, width, Vec::new());
                }
                if let (Some(&last), Some(cursor)) = (vertices.last(), cursor) {
                    self.stroke(Layer::Draft, polyline_path(&[last, cursor], false), color, width, dash);
                }
                for v in vertices {
                    self.vertex_marker(*v, color);
                }
            }
            Draft::Segment {
                start,
                end,
                calibration,
            } => {
                let color = if calibration { display.calibration_color } else { color };
                self.stroke(Layer::Draft, polyline_path(&[start, end], false), color, width, Vec::new());
                self.vertex_marker(start, color);
                self.vertex_marker(end, color);
            }
            Draft::Stroke { points, style } => {
                if points.len() >= 2 {
                    let stroke_color = color.with_opacity(f64::from(style.stroke_color.a) / 255.0);
                    self.stroke(
                        Layer::Draft,
                        polyline_path(points, false),
                        stroke_color,
                        style.stroke_width,
                        Vec::new(),
                    );
                }
            }
            Draft::Primitive { kind, anchor, current } => {
                if let Ok(geometry) = Geometry::from_vertices(kind, vec![anchor, current]) {
                    self.stroke(Layer::Draft, geometry.to_path(), color, width, dash);
                }
            }
            Draft::Vertex { position, snapped, .. } => {
                if snapped {
                    let ring = Circle::new(position, self.px(HANDLE_SIZE)).to_path(PATH_TOLERANCE);
                    self.stroke(Layer::Draft, ring, color, width, Vec::new());
                }
            }
            Draft::Image { image, position } => {
                self.image_outline(image, position, color, width, dash);
            }
        }
    }

    fn image_outline(&mut self, id: ImageId, position: Point, color: SerializableColor, width: f64, dash: Vec<f64>) {
        let Some(image) = self.ctx.canvas.scene().image(id) else {
            return;
        };
        let Some(size) = image.natural_size else {
            return;
        };
        let moved = BackgroundImage {
            position,
            ..image.clone()
        };
        let transform = moved.transform();
        let rect = size.to_rect();
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ]
        .map(|p| transform * p);
        self.stroke(Layer::Draft, polyline_path(&corners, true), color, width, dash);
    }

    fn vertex_marker(&mut self, p: Point, color: SerializableColor) {
        let radius = self.px(3.0);
        self.fill(Layer::Draft, Circle::new(p, radius).to_path(PATH_TOLERANCE), color);
    }

    /// Minimap rendition of a shape: fill and a hairline outline.
    fn shape_outline(&mut self, object: &MapObject) {
        let style = &object.style;
        let path = object.to_path();
        if object.kind().is_closed() {
            let fill = style.fill_color.with_opacity(style.fill_opacity);
            if fill.a > 0 {
                self.fill(Layer::Shapes, path.clone(), fill);
            }
        }
        let width = self.px(1.0).max(style.stroke_width.min(self.px(3.0)));
        self.stroke(Layer::Shapes, path, style.stroke_color, width, Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_cache::{ImageCache, RasterDecoder};
    use fieldmap_core::background::{ImageFormat, ImageSource};
    use fieldmap_core::canvas::Canvas;
    use fieldmap_core::config::{CanvasConfig, DisplaySettings};
    use fieldmap_core::geometry::HatchPattern;
    use fieldmap_core::input::{MouseButton, PointerEvent};
    use fieldmap_core::selection::Selection;
    use fieldmap_core::shapes::{DashStyle, ShapeId, ShapeKind, ShapeStyle};
    use fieldmap_core::tools::ToolKind;
    use kurbo::Size;
    use pollster::block_on;
    use uuid::Uuid;

    fn canvas() -> Canvas {
        Canvas::new(Uuid::new_v4(), CanvasConfig::default())
    }

    fn stroke_colors(list: &DisplayList, layer: Layer) -> Vec<SerializableColor> {
        list.layer(layer)
            .filter_map(|c| match c {
                DrawCommand::Stroke { color, .. } => Some(*color),
                _ => None,
            })
            .collect()
    }

    fn square(canvas: &mut Canvas, style: ShapeStyle) -> ShapeId {
        canvas
            .commit_shape(
                ShapeKind::Square,
                vec![Point::new(100.0, 100.0), Point::new(200.0, 200.0)],
                style,
            )
            .unwrap()
    }

    fn click(canvas: &mut Canvas, x: f64, y: f64) {
        let position = Point::new(x, y);
        canvas.handle_pointer(PointerEvent::Down {
            position,
            button: MouseButton::Left,
        });
        canvas.handle_pointer(PointerEvent::Up {
            position,
            button: MouseButton::Left,
        });
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_layers_are_in_draw_order() {
        let mut canvas = canvas();
        let id = square(&mut canvas, ShapeStyle::default());
        canvas.select(Some(Selection::Shape(id)));
        canvas.set_tool(ToolKind::Polygon);
        click(&mut canvas, 10.0, 10.0);
        click(&mut canvas, 60.0, 10.0);

        let cache = ImageCache::new();
        let list = DisplayList::build(&RenderContext::new(&canvas, &cache)).unwrap();
        assert!(list.items().windows(2).all(|w| w[0].layer <= w[1].layer));
        assert_eq!(list.items()[0].layer, Layer::Background);
        assert!(list.layer(Layer::Grid).count() > 0);
        assert!(list.layer(Layer::Draft).count() > 0);
    }

    #[test]
    fn test_empty_viewport_is_an_error() {
        let mut canvas = canvas();
        canvas.set_container(Size::new(0.0, 300.0));
        let cache = ImageCache::new();
        let result = DisplayList::build(&RenderContext::new(&canvas, &cache));
        assert!(matches!(result, Err(RendererError::EmptyViewport(_))));
    }

    #[test]
    fn test_grid_none_and_tiny_cells_draw_nothing() {
        let canvas = canvas();
        let cache = ImageCache::new();
        let display = DisplaySettings {
            grid_style: GridStyle::None,
            ..DisplaySettings::default()
        };
        let ctx = RenderContext::new(&canvas, &cache).with_display(display);
        assert_eq!(DisplayList::build(&ctx).unwrap().layer(Layer::Grid).count(), 0);

        let display = DisplaySettings {
            grid_style: GridStyle::Lines,
            grid_size: 1.0,
            ..DisplaySettings::default()
        };
        let ctx = RenderContext::new(&canvas, &cache).with_display(display);
        assert_eq!(DisplayList::build(&ctx).unwrap().layer(Layer::Grid).count(), 0);
    }

    #[test]
    fn test_square_grid_has_major_and_minor_lines() {
        let canvas = canvas();
        let cache = ImageCache::new();
        let display = DisplaySettings {
            grid_style: GridStyle::Squares,
            ..DisplaySettings::default()
        };
        let ctx = RenderContext::new(&canvas, &cache).with_display(display);
        let list = DisplayList::build(&ctx).unwrap();
        let widths: Vec<f64> = list
            .layer(Layer::Grid)
            .filter_map(|c| match c {
                DrawCommand::Stroke { width, .. } => Some(*width),
                _ => None,
            })
            .collect();
        assert_eq!(widths.len(), 2);
        assert!(widths[1] > widths[0]);
    }

    #[test]
    fn test_selected_shape_uses_accent_and_handles() {
        let mut canvas = canvas();
        let style = ShapeStyle::default();
        let stroke = style.stroke_color;
        let id = square(&mut canvas, style);
        let cache = ImageCache::new();
        let accent = canvas.config().display.accent_color;

        let list = DisplayList::build(&RenderContext::new(&canvas, &cache)).unwrap();
        assert_eq!(stroke_colors(&list, Layer::Shapes), vec![stroke]);

        canvas.select(Some(Selection::Shape(id)));
        let list = DisplayList::build(&RenderContext::new(&canvas, &cache)).unwrap();
        let colors = stroke_colors(&list, Layer::Shapes);
        assert_eq!(colors[0], accent);
        // Outline plus one stroked handle per defining vertex.
        assert_eq!(colors.len(), 1 + 2);
    }

    #[test]
    fn test_hatch_is_clipped() {
        let mut canvas = canvas();
        let style = ShapeStyle {
            hatch: HatchPattern::Diagonal,
            ..ShapeStyle::default()
        };
        square(&mut canvas, style);
        let cache = ImageCache::new();
        let list = DisplayList::build(&RenderContext::new(&canvas, &cache)).unwrap();
        let commands: Vec<&DrawCommand> = list.layer(Layer::Shapes).collect();
        let push = commands
            .iter()
            .position(|c| matches!(c, DrawCommand::PushClip { .. }))
            .unwrap();
        let pop = commands
            .iter()
            .position(|c| matches!(c, DrawCommand::PopClip))
            .unwrap();
        assert!(pop > push + 1);
    }

    #[test]
    fn test_dash_none_has_no_outline_unless_selected() {
        let mut canvas = canvas();
        let style = ShapeStyle {
            dash_style: DashStyle::None,
            ..ShapeStyle::default()
        };
        square(&mut canvas, style);
        let cache = ImageCache::new();
        let list = DisplayList::build(&RenderContext::new(&canvas, &cache)).unwrap();
        assert!(stroke_colors(&list, Layer::Shapes).is_empty());
    }

    #[test]
    fn test_images_skip_hidden_and_undecoded() {
        let mut canvas = canvas();
        let shown = canvas.add_image(BackgroundImage::new("a", ImageSource::from_bytes(ImageFormat::Png, &png(4, 4))));
        let hidden = canvas.add_image(BackgroundImage::new("b", ImageSource::from_bytes(ImageFormat::Png, &png(4, 4))));
        let broken = canvas.add_image(BackgroundImage::new("c", ImageSource::from_bytes(ImageFormat::Png, b"nope")));
        canvas.update_image(hidden, |img| img.visible = false).unwrap();

        let mut cache = ImageCache::new();
        let list = DisplayList::build(&RenderContext::new(&canvas, &cache)).unwrap();
        assert_eq!(list.layer(Layer::Images).count(), 0);

        block_on(cache.decode_pending(&RasterDecoder, &mut canvas));
        let list = DisplayList::build(&RenderContext::new(&canvas, &cache)).unwrap();
        let ids: Vec<ImageId> = list
            .layer(Layer::Images)
            .filter_map(|c| match c {
                DrawCommand::Image { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec![shown]);
        assert!(!ids.contains(&broken));
    }

    #[test]
    fn test_draft_uses_draft_color() {
        let mut canvas = canvas();
        canvas.set_tool(ToolKind::Polygon);
        click(&mut canvas, 10.0, 10.0);
        click(&mut canvas, 60.0, 10.0);
        click(&mut canvas, 60.0, 60.0);
        let cache = ImageCache::new();
        let list = DisplayList::build(&RenderContext::new(&canvas, &cache)).unwrap();
        let draft = canvas.config().display.draft_color;
        let colors = stroke_colors(&list, Layer::Draft);
        assert!(!colors.is_empty());
        assert!(colors.iter().all(|c| *c == draft));
        assert_eq!(list.layer(Layer::Shapes).count(), 0);
    }

    #[test]
    fn test_calibration_markers() {
        let mut canvas = canvas();
        let cache = ImageCache::new();
        let list = DisplayList::build(&RenderContext::new(&canvas, &cache)).unwrap();
        assert_eq!(list.layer(Layer::Calibration).count(), 0);

        canvas.set_calibration(Some(
            fieldmap_core::calibration::Calibration::new(Point::ZERO, Point::new(100.0, 0.0), 1.0).unwrap(),
        ));
        let list = DisplayList::build(&RenderContext::new(&canvas, &cache)).unwrap();
        let color = canvas.config().display.calibration_color;
        assert_eq!(stroke_colors(&list, Layer::Calibration), vec![color]);
    }

    #[test]
    fn test_minimap_has_indicator() {
        let mut canvas = canvas();
        square(&mut canvas, ShapeStyle::default());
        let cache = ImageCache::new();
        let list = DisplayList::build_minimap(&RenderContext::new(&canvas, &cache));
        assert!(list.items().windows(2).all(|w| w[0].layer <= w[1].layer));
        assert_eq!(list.layer(Layer::Indicator).count(), 1);
        assert_eq!(list.layer(Layer::Grid).count(), 0);
        assert!(list.layer(Layer::Shapes).count() >= 2);
    }
}
