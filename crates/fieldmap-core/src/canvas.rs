//! Canvas state: the scene plus everything needed to edit it interactively.

use crate::background::{BackgroundImage, ImageId};
use crate::calibration::{Calibration, CalibrationError, Measurement, PendingCalibration, measure};
use crate::config::CanvasConfig;
use crate::history::History;
use crate::input::{KeyCommand, MouseButton, PointerEvent};
use crate::minimap::{Minimap, MinimapLayout};
use crate::scene::{Scene, SceneError, SceneSnapshot, ShapePatch};
use crate::selection::Selection;
use crate::sequence::{SequenceId, Sequences};
use crate::shapes::{Metadata, ProjectId, ShapeId, ShapeKind, ShapeStyle};
use crate::tools::{Draft, PointerInput, ToolAction, ToolContext, ToolController, ToolKind, ToolSettings};
use crate::viewport::Viewport;
use kurbo::{Point, Size};

/// Something the canvas did that the session or UI may care about.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    ShapeCreated(ShapeId),
    ShapeUpdated(ShapeId),
    ShapeDeleted(ShapeId),
    /// Undo or redo replaced the shape collection.
    HistoryRestored,
    SelectionChanged(Option<Selection>),
    /// The line tool committed a segment.
    LineCompleted { shape: ShapeId, pixel_distance: f64 },
    /// The calibrate tool measured a line; a real-world distance is needed.
    CalibrationPending(PendingCalibration),
    CalibrationChanged(Option<Calibration>),
    ImagesChanged,
    SequenceChanged(SequenceId),
    SequenceDeleted(SequenceId),
    ToolChanged(ToolKind),
}

/// The interactive annotation canvas.
#[derive(Debug, Clone)]
pub struct Canvas {
    scene: Scene,
    history: History<SceneSnapshot>,
    pub tools: ToolController,
    pub viewport: Viewport,
    pub minimap: Minimap,
    selection: Option<Selection>,
    calibration: Option<Calibration>,
    pending_calibration: Option<PendingCalibration>,
    sequences: Sequences,
    config: CanvasConfig,
    events: Vec<CanvasEvent>,
    needs_redraw: bool,
}

impl Canvas {
    /// Create an empty canvas for a project.
    pub fn new(project_id: ProjectId, config: CanvasConfig) -> Self {
        Self::from_parts(Scene::new(project_id), None, Sequences::default(), config)
    }

    /// Create a canvas over existing content. History starts at the given scene.
    pub fn from_parts(
        scene: Scene,
        calibration: Option<Calibration>,
        sequences: Sequences,
        config: CanvasConfig,
    ) -> Self {
        let history = History::with_initial(scene.snapshot(), config.max_history);
        Self {
            scene,
            history,
            tools: ToolController::new(ToolSettings::from_config(&config)),
            viewport: Viewport::new(config.min_scale, config.max_scale),
            minimap: Minimap::from_config(&config.minimap),
            selection: None,
            calibration,
            pending_calibration: None,
            sequences,
            config,
            events: Vec::new(),
            needs_redraw: true,
        }
    }

    /// Swap in content reloaded from storage, keeping the view and tool.
    pub fn replace_content(&mut self, scene: Scene, calibration: Option<Calibration>, sequences: Sequences) {
        self.history.reset(scene.snapshot());
        self.scene = scene;
        self.calibration = calibration;
        self.sequences = sequences;
        self.tools.cancel();
        self.tools.recording = false;
        self.drop_stale_selection();
        self.needs_redraw = true;
    }

    pub fn project_id(&self) -> ProjectId {
        self.scene.project_id()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn history(&self) -> &History<SceneSnapshot> {
        &self.history
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    pub fn pending_calibration(&self) -> Option<&PendingCalibration> {
        self.pending_calibration.as_ref()
    }

    pub fn sequences(&self) -> &Sequences {
        &self.sequences
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.kind()
    }

    pub fn draft(&self) -> Option<Draft<'_>> {
        self.tools.draft()
    }

    /// Take the queued events.
    pub fn drain_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether anything visible changed since the last call.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.needs_redraw, false)
    }

    fn emit(&mut self, event: CanvasEvent) {
        self.events.push(event);
        self.needs_redraw = true;
    }

    // --- selection ---

    pub fn select(&mut self, selection: Option<Selection>) {
        if self.selection != selection {
            self.selection = selection;
            self.emit(CanvasEvent::SelectionChanged(selection));
        }
    }

    pub fn clear_selection(&mut self) {
        self.select(None);
    }

    fn drop_stale_selection(&mut self) {
        let stale = match self.selection {
            Some(Selection::Shape(id)) => !self.scene.contains(id),
            Some(Selection::Image(id)) => self.scene.image(id).is_none(),
            None => false,
        };
        if stale {
            self.clear_selection();
        }
    }

    // --- tools and input ---

    pub fn set_tool(&mut self, kind: ToolKind) {
        if self.tools.kind() != kind {
            self.tools.set_tool(kind);
            self.emit(CanvasEvent::ToolChanged(kind));
        }
    }

    /// Feed a screen-space pointer event. Returns whether a redraw is needed.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        let screen = event.position();
        let scene_point = self.viewport.screen_to_scene(screen);
        let input = PointerInput::new(scene_point, screen);
        let tool_before = self.tools.kind();

        let action = {
            let ctx = ToolContext {
                scene: &self.scene,
                selection: self.selection,
                scale: self.viewport.scale(),
            };
            match event {
                PointerEvent::Down { button, .. } if button == MouseButton::Left => {
                    self.tools.pointer_down(&ctx, input)
                }
                PointerEvent::Up { button, .. } if button == MouseButton::Left => self.tools.pointer_up(&ctx, input),
                PointerEvent::Down { .. } | PointerEvent::Up { .. } => return false,
                PointerEvent::Move { .. } => self.tools.pointer_move(&ctx, input),
                PointerEvent::Scroll { delta, .. } => {
                    if delta.y == 0.0 {
                        return false;
                    }
                    let step = 1.0 + self.config.zoom_step;
                    let factor = if delta.y < 0.0 { step } else { 1.0 / step };
                    self.viewport.zoom_at(screen, factor);
                    self.needs_redraw = true;
                    return true;
                }
            }
        };

        if let Some(action) = action {
            self.apply(action);
        }
        if self.tools.kind() != tool_before {
            self.emit(CanvasEvent::ToolChanged(self.tools.kind()));
        }
        // Drafts follow the pointer.
        if self.tools.is_busy() {
            self.needs_redraw = true;
        }
        self.needs_redraw
    }

    /// Run a keyboard command. Returns whether it did anything.
    pub fn handle_key(&mut self, command: KeyCommand) -> bool {
        match command {
            KeyCommand::Cancel => {
                let busy = self.tools.is_busy();
                self.tools.cancel();
                let pending = self.pending_calibration.take().is_some();
                self.needs_redraw |= busy || pending;
                busy || pending
            }
            KeyCommand::FinishPolygon => self.finish_polygon(),
            KeyCommand::Undo => self.undo(),
            KeyCommand::Redo => self.redo(),
            KeyCommand::DeleteSelection => self.delete_selection(),
            KeyCommand::ZoomIn => {
                self.zoom_in();
                true
            }
            KeyCommand::ZoomOut => {
                self.zoom_out();
                true
            }
            KeyCommand::ResetView => {
                self.reset_view();
                true
            }
            KeyCommand::FitToContent => self.fit_to_content(),
            KeyCommand::SetTool(kind) => {
                self.set_tool(kind);
                true
            }
        }
    }

    /// Commit the polygon being drawn. Fewer than three vertices discards it.
    pub fn finish_polygon(&mut self) -> bool {
        let tool_before = self.tools.kind();
        let was_busy = self.tools.is_busy();
        let action = self.tools.finish();
        let committed = action.is_some();
        if let Some(action) = action {
            self.apply(action);
        }
        if self.tools.kind() != tool_before {
            self.emit(CanvasEvent::ToolChanged(self.tools.kind()));
        }
        self.needs_redraw |= was_busy;
        committed
    }

    fn apply(&mut self, action: ToolAction) {
        match action {
            ToolAction::Select(selection) => self.select(Some(selection)),
            ToolAction::ClearSelection => self.clear_selection(),
            ToolAction::AppendToSequence(shape) => {
                if let Some(id) = self.sequences.append_to_active(shape) {
                    self.emit(CanvasEvent::SequenceChanged(id));
                }
            }
            ToolAction::Commit { kind, vertices, style } => {
                self.commit_shape(kind, vertices, style);
            }
            ToolAction::LineCompleted {
                start,
                end,
                pixel_distance,
            } => {
                let style = self.tools.style.clone();
                if let Some(shape) = self.commit_shape(ShapeKind::Threshold, vec![start, end], style) {
                    self.emit(CanvasEvent::LineCompleted { shape, pixel_distance });
                }
            }
            ToolAction::CalibrationPending(pending) => {
                self.pending_calibration = Some(pending);
                self.emit(CanvasEvent::CalibrationPending(pending));
            }
            ToolAction::Erase(id) => {
                self.delete_shape(id);
            }
            ToolAction::PasteStyle { target, style } => {
                if let Err(e) = self.update_shape(target, ShapePatch::style(style)) {
                    log::debug!("Style paste skipped: {}", e);
                }
            }
            ToolAction::CommitVertex { shape, index, position } => {
                self.move_vertex(shape, index, position);
            }
            ToolAction::CommitImage { image, position } => {
                match self.scene.update_image(image, |img| img.position = position) {
                    Ok(()) => self.emit(CanvasEvent::ImagesChanged),
                    Err(e) => log::debug!("Image move skipped: {}", e),
                }
            }
            ToolAction::Pan(delta) => {
                self.viewport.pan(delta);
                self.needs_redraw = true;
            }
        }
    }

    // --- shape edits ---

    fn push_history(&mut self) {
        self.history.push(self.scene.snapshot());
    }

    /// Validate and add a shape with the given style. Invalid vertex counts are a no-op.
    pub fn commit_shape(&mut self, kind: ShapeKind, vertices: Vec<Point>, style: ShapeStyle) -> Option<ShapeId> {
        let id = match self.scene.add_shape(kind, vertices, style, Metadata::default()) {
            Ok(object) => object.id,
            Err(e) => {
                log::debug!("Shape not committed: {}", e);
                return None;
            }
        };
        self.push_history();
        self.emit(CanvasEvent::ShapeCreated(id));
        Some(id)
    }

    pub fn update_shape(&mut self, id: ShapeId, patch: ShapePatch) -> Result<(), SceneError> {
        self.scene.update_shape(id, patch)?;
        self.push_history();
        self.emit(CanvasEvent::ShapeUpdated(id));
        Ok(())
    }

    /// Delete a shape, clearing the selection if it pointed at it.
    pub fn delete_shape(&mut self, id: ShapeId) -> bool {
        if self.scene.delete_shape(id).is_none() {
            log::debug!("Delete of unknown shape {}", id);
            return false;
        }
        if self.selection == Some(Selection::Shape(id)) {
            self.clear_selection();
        }
        self.push_history();
        self.emit(CanvasEvent::ShapeDeleted(id));
        true
    }

    fn move_vertex(&mut self, id: ShapeId, index: usize, position: Point) {
        match self.scene.set_vertex(id, index, position) {
            Ok(()) => {
                self.push_history();
                self.emit(CanvasEvent::ShapeUpdated(id));
            }
            Err(e) => log::debug!("Vertex edit skipped: {}", e),
        }
    }

    /// Delete whatever is selected: a shape, or a background image.
    pub fn delete_selection(&mut self) -> bool {
        match self.selection {
            Some(Selection::Shape(id)) => self.delete_shape(id),
            Some(Selection::Image(id)) => self.remove_image(id).is_some(),
            None => false,
        }
    }

    // --- history ---

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let snapshot = match self.history.undo() {
            Some(s) => s.clone(),
            None => return false,
        };
        self.restore(&snapshot);
        true
    }

    pub fn redo(&mut self) -> bool {
        let snapshot = match self.history.redo() {
            Some(s) => s.clone(),
            None => return false,
        };
        self.restore(&snapshot);
        true
    }

    fn restore(&mut self, snapshot: &SceneSnapshot) {
        self.tools.cancel();
        self.scene.restore(snapshot);
        self.drop_stale_selection();
        self.emit(CanvasEvent::HistoryRestored);
    }

    // --- calibration ---

    /// Confirm the pending calibration line with its real-world length.
    ///
    /// On error the pending line is kept so the distance can be re-entered.
    pub fn confirm_calibration(&mut self, meters: f64) -> Result<Calibration, CalibrationError> {
        let pending = self.pending_calibration.ok_or(CalibrationError::NothingPending)?;
        let calibration = pending.confirm(meters)?;
        self.pending_calibration = None;
        self.set_calibration(Some(calibration));
        Ok(calibration)
    }

    pub fn cancel_calibration(&mut self) {
        if self.pending_calibration.take().is_some() {
            self.needs_redraw = true;
        }
    }

    /// Calibrate from an existing line segment.
    pub fn calibrate_from_line(&mut self, id: ShapeId, meters: f64) -> Result<Calibration, CalibrationError> {
        let object = self.scene.get(id).ok_or(CalibrationError::UnknownShape(id))?;
        let calibration = Calibration::from_line(object, meters)?;
        self.set_calibration(Some(calibration));
        Ok(calibration)
    }

    /// Replace (or clear) the project's calibration.
    pub fn set_calibration(&mut self, calibration: Option<Calibration>) {
        self.calibration = calibration;
        if let Some(c) = &calibration {
            log::info!("Calibrated at {:.3} px/m", c.pixels_per_meter);
        }
        self.emit(CanvasEvent::CalibrationChanged(calibration));
    }

    pub fn measure(&self, id: ShapeId) -> Option<Measurement> {
        self.scene.get(id).map(|o| measure(o, self.calibration.as_ref()))
    }

    // --- sequences ---

    pub fn create_sequence(&mut self, name: impl Into<String>) -> SequenceId {
        let id = self.sequences.create(self.scene.project_id(), name);
        self.emit(CanvasEvent::SequenceChanged(id));
        id
    }

    fn edit_sequence(&mut self, id: SequenceId, edit: impl FnOnce(&mut crate::sequence::Sequence) -> bool) -> bool {
        let changed = match self.sequences.get_mut(id) {
            Some(sequence) => edit(sequence),
            None => {
                log::debug!("No sequence {}", id);
                false
            }
        };
        if changed {
            self.emit(CanvasEvent::SequenceChanged(id));
        }
        changed
    }

    pub fn rename_sequence(&mut self, id: SequenceId, name: impl Into<String>) -> bool {
        let name = name.into();
        self.edit_sequence(id, |s| {
            s.rename(name);
            true
        })
    }

    /// Append a shape to a sequence. Unknown shapes are ignored.
    pub fn append_to_sequence(&mut self, id: SequenceId, shape: ShapeId) -> bool {
        if !self.scene.contains(shape) {
            log::debug!("Not appending unknown shape {} to sequence", shape);
            return false;
        }
        self.edit_sequence(id, |s| {
            s.append(shape);
            true
        })
    }

    pub fn remove_from_sequence(&mut self, id: SequenceId, shape: ShapeId) -> bool {
        self.edit_sequence(id, |s| s.remove(shape))
    }

    pub fn move_sequence_entry(&mut self, id: SequenceId, from: usize, to: usize) -> bool {
        self.edit_sequence(id, |s| s.move_entry(from, to))
    }

    pub fn delete_sequence(&mut self, id: SequenceId) -> bool {
        let deleted = self.sequences.delete(id).is_some();
        if deleted {
            if self.sequences.active().is_none() {
                self.tools.recording = false;
            }
            self.emit(CanvasEvent::SequenceDeleted(id));
        }
        deleted
    }

    /// Start recording select-mode clicks into a sequence, or stop with `None`.
    pub fn set_recording(&mut self, id: Option<SequenceId>) {
        self.sequences.set_active(id);
        self.tools.recording = self.sequences.active().is_some();
    }

    // --- background images ---

    pub fn add_image(&mut self, image: BackgroundImage) -> ImageId {
        let id = self.scene.add_image(image);
        self.emit(CanvasEvent::ImagesChanged);
        id
    }

    pub fn remove_image(&mut self, id: ImageId) -> Option<BackgroundImage> {
        let removed = self.scene.remove_image(id)?;
        if self.selection == Some(Selection::Image(id)) {
            self.clear_selection();
        }
        self.emit(CanvasEvent::ImagesChanged);
        Some(removed)
    }

    pub fn update_image(&mut self, id: ImageId, edit: impl FnOnce(&mut BackgroundImage)) -> Result<(), SceneError> {
        self.scene.update_image(id, edit)?;
        self.emit(CanvasEvent::ImagesChanged);
        Ok(())
    }

    /// Record an image's decoded size. Only affects layout, so nothing is persisted.
    pub fn image_decoded(&mut self, id: ImageId, size: Size) {
        match self.scene.update_image(id, |img| img.natural_size = Some(size)) {
            Ok(()) => self.needs_redraw = true,
            Err(e) => log::debug!("Decoded image no longer present: {}", e),
        }
    }

    // --- viewport ---

    pub fn set_container(&mut self, size: Size) {
        self.viewport.set_container(size);
        self.needs_redraw = true;
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in(self.config.zoom_step);
        self.needs_redraw = true;
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out(self.config.zoom_step);
        self.needs_redraw = true;
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.needs_redraw = true;
    }

    /// Fit shapes and visible images into view. Returns false when there is nothing to fit.
    pub fn fit_to_content(&mut self) -> bool {
        match self.scene.content_bounds() {
            Some(bounds) => {
                self.viewport.fit_to_content(bounds, self.config.fit_margin);
                self.needs_redraw = true;
                true
            }
            None => false,
        }
    }

    pub fn minimap_layout(&self) -> MinimapLayout {
        self.minimap.layout(self.scene.content_bounds(), &self.viewport)
    }

    /// Recentre the main view on the scene point under a minimap click.
    pub fn minimap_click(&mut self, minimap_point: Point) -> Point {
        let layout = self.minimap_layout();
        self.needs_redraw = true;
        self.minimap.click(&layout, minimap_point, &mut self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::{ImageFormat, ImageSource};
    use crate::calibration::MeasurementUnit;
    use crate::input::Modifiers;
    use crate::shapes::Geometry;
    use uuid::Uuid;

    fn canvas() -> Canvas {
        Canvas::new(Uuid::new_v4(), CanvasConfig::default())
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

    fn drag(canvas: &mut Canvas, from: Point, to: Point) {
        canvas.handle_pointer(PointerEvent::Down {
            position: from,
            button: MouseButton::Left,
        });
        canvas.handle_pointer(PointerEvent::Move { position: to });
        canvas.handle_pointer(PointerEvent::Up {
            position: to,
            button: MouseButton::Left,
        });
    }

    fn draw_polygon(canvas: &mut Canvas, points: &[(f64, f64)]) -> ShapeId {
        canvas.set_tool(ToolKind::Polygon);
        for (x, y) in points {
            click(canvas, *x, *y);
        }
        assert!(canvas.finish_polygon());
        canvas.scene().objects().last().unwrap().id
    }

    #[test]
    fn test_calibrated_square_measures_one_square_meter() {
        let mut canvas = canvas();
        canvas.set_tool(ToolKind::Line);
        click(&mut canvas, 0.0, 0.0);
        click(&mut canvas, 100.0, 0.0);
        let line = canvas.scene().objects().next().unwrap().id;
        assert!(canvas
            .drain_events()
            .contains(&CanvasEvent::LineCompleted { shape: line, pixel_distance: 100.0 }));

        let calibration = canvas.calibrate_from_line(line, 5.0).unwrap();
        assert!((calibration.pixels_per_meter - 20.0).abs() < 1e-12);

        let square = draw_polygon(&mut canvas, &[(200.0, 200.0), (220.0, 200.0), (220.0, 220.0), (200.0, 220.0)]);
        let m = canvas.measure(square).unwrap();
        assert_eq!(m.unit, MeasurementUnit::SquareMeters);
        assert!((m.value - 1.0).abs() < 1e-12);
        assert_eq!(m.format(), "1.00 m²");
    }

    #[test]
    fn test_short_polygon_finish_is_noop() {
        let mut canvas = canvas();
        canvas.set_tool(ToolKind::Polygon);
        click(&mut canvas, 0.0, 0.0);
        click(&mut canvas, 10.0, 0.0);
        assert!(!canvas.finish_polygon());
        assert!(canvas.scene().is_empty());
        assert!(canvas.draft().is_none());
        assert_eq!(canvas.tool(), ToolKind::Polygon);
        assert!(!canvas.can_undo());
    }

    #[test]
    fn test_erase_selected_shape_clears_selection() {
        let mut canvas = canvas();
        let id = draw_polygon(&mut canvas, &[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);
        assert_eq!(canvas.tool(), ToolKind::Select);
        click(&mut canvas, 20.0, 20.0);
        assert_eq!(canvas.selection(), Some(Selection::Shape(id)));

        canvas.set_tool(ToolKind::Erase);
        click(&mut canvas, 20.0, 20.0);
        assert!(!canvas.scene().contains(id));
        assert_eq!(canvas.selection(), None);
    }

    #[test]
    fn test_undo_redo_restores_shapes() {
        let mut canvas = canvas();
        let a = draw_polygon(&mut canvas, &[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
        let b = draw_polygon(&mut canvas, &[(50.0, 50.0), (60.0, 50.0), (50.0, 60.0)]);
        canvas.select(Some(Selection::Shape(b)));

        assert!(canvas.undo());
        assert!(canvas.scene().contains(a));
        assert!(!canvas.scene().contains(b));
        // Selection pointed at the shape that vanished.
        assert_eq!(canvas.selection(), None);

        assert!(canvas.redo());
        assert!(canvas.scene().contains(b));
        assert!(!canvas.redo());

        assert!(canvas.undo());
        assert!(canvas.undo());
        assert!(canvas.scene().is_empty());
        assert!(!canvas.undo());
    }

    #[test]
    fn test_new_edit_discards_redo_branch() {
        let mut canvas = canvas();
        draw_polygon(&mut canvas, &[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
        canvas.undo();
        draw_polygon(&mut canvas, &[(5.0, 5.0), (15.0, 5.0), (5.0, 15.0)]);
        assert!(!canvas.can_redo());
    }

    #[test]
    fn test_vertex_drag_snaps_to_other_shape() {
        let mut canvas = canvas();
        let target = draw_polygon(&mut canvas, &[(100.0, 100.0), (200.0, 100.0), (100.0, 200.0)]);
        let edited = draw_polygon(&mut canvas, &[(0.0, 0.0), (50.0, 0.0), (0.0, 50.0)]);
        canvas.select(Some(Selection::Shape(edited)));
        canvas.set_tool(ToolKind::EditVertices);

        drag(&mut canvas, Point::new(50.0, 0.0), Point::new(96.0, 97.0));
        let vertex = canvas.scene().get(edited).unwrap().geometry.vertex(1).unwrap();
        assert_eq!(vertex, Point::new(100.0, 100.0));
        assert!(canvas.scene().get(target).is_some());
        // The drag is one undo step.
        canvas.undo();
        assert_eq!(
            canvas.scene().get(edited).unwrap().geometry.vertex(1),
            Some(Point::new(50.0, 0.0))
        );
    }

    #[test]
    fn test_style_match_pastes_and_returns_to_select() {
        let mut canvas = canvas();
        let source = draw_polygon(&mut canvas, &[(0.0, 0.0), (40.0, 0.0), (0.0, 40.0)]);
        let mut red = ShapeStyle::default();
        red.stroke_color = crate::shapes::SerializableColor::new(255, 0, 0, 255);
        canvas.update_shape(source, ShapePatch::style(red.clone())).unwrap();
        let target = draw_polygon(&mut canvas, &[(100.0, 100.0), (140.0, 100.0), (100.0, 140.0)]);

        canvas.select(Some(Selection::Shape(target)));
        canvas.set_tool(ToolKind::StyleMatch);
        click(&mut canvas, 10.0, 10.0);
        assert_eq!(canvas.scene().get(target).unwrap().style, red);
        assert_eq!(canvas.tool(), ToolKind::Select);
    }

    #[test]
    fn test_calibrate_tool_waits_for_distance() {
        let mut canvas = canvas();
        canvas.set_tool(ToolKind::Calibrate);
        click(&mut canvas, 0.0, 0.0);
        click(&mut canvas, 0.0, 50.0);
        assert!(canvas.scene().is_empty());
        assert_eq!(canvas.pending_calibration().map(|p| p.pixel_distance), Some(50.0));

        assert_eq!(
            canvas.confirm_calibration(-1.0),
            Err(CalibrationError::NonPositiveDistance(-1.0))
        );
        assert!(canvas.pending_calibration().is_some());

        let calibration = canvas.confirm_calibration(2.5).unwrap();
        assert_eq!(calibration.pixels_per_meter, 20.0);
        assert!(canvas.pending_calibration().is_none());
        assert_eq!(canvas.confirm_calibration(1.0), Err(CalibrationError::NothingPending));
    }

    #[test]
    fn test_calibrate_from_non_line_fails() {
        let mut canvas = canvas();
        let polygon = draw_polygon(&mut canvas, &[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
        assert_eq!(canvas.calibrate_from_line(polygon, 1.0), Err(CalibrationError::NotALine));
        let missing = Uuid::new_v4();
        assert_eq!(
            canvas.calibrate_from_line(missing, 1.0),
            Err(CalibrationError::UnknownShape(missing))
        );
        assert!(canvas.calibration().is_none());
    }

    #[test]
    fn test_recording_appends_to_sequence() {
        let mut canvas = canvas();
        let a = draw_polygon(&mut canvas, &[(0.0, 0.0), (40.0, 0.0), (0.0, 40.0)]);
        let b = draw_polygon(&mut canvas, &[(100.0, 100.0), (140.0, 100.0), (100.0, 140.0)]);
        let seq = canvas.create_sequence("Visitor route");
        canvas.set_recording(Some(seq));

        click(&mut canvas, 110.0, 110.0);
        click(&mut canvas, 10.0, 10.0);
        assert_eq!(canvas.selection(), None);
        let sequence = canvas.sequences().get(seq).unwrap();
        assert_eq!(sequence.object_ids, vec![b, a]);

        canvas.delete_shape(b);
        assert_eq!(
            canvas.sequences().get(seq).unwrap().names_in_order(canvas.scene()),
            vec!["Polygon 1".to_string()]
        );
        assert!(canvas.delete_sequence(seq));
        assert!(!canvas.tools.recording);
    }

    #[test]
    fn test_keyboard_commands() {
        let mut canvas = canvas();
        assert!(canvas.handle_key(KeyCommand::from_key("p", Modifiers::NONE).unwrap()));
        assert_eq!(canvas.tool(), ToolKind::Polygon);
        click(&mut canvas, 0.0, 0.0);
        click(&mut canvas, 10.0, 0.0);
        click(&mut canvas, 0.0, 10.0);
        assert!(canvas.handle_key(KeyCommand::FinishPolygon));
        let id = canvas.scene().objects().next().unwrap().id;

        canvas.select(Some(Selection::Shape(id)));
        assert!(canvas.handle_key(KeyCommand::DeleteSelection));
        assert!(canvas.scene().is_empty());
        assert!(canvas.handle_key(KeyCommand::from_key("z", Modifiers::CTRL).unwrap()));
        assert!(canvas.scene().contains(id));

        let scale = canvas.viewport.scale();
        canvas.handle_key(KeyCommand::ZoomIn);
        assert!(canvas.viewport.scale() > scale);
        canvas.handle_key(KeyCommand::ResetView);
        assert_eq!(canvas.viewport.scale(), 1.0);
    }

    #[test]
    fn test_escape_abandons_buffer() {
        let mut canvas = canvas();
        canvas.set_tool(ToolKind::Polygon);
        click(&mut canvas, 0.0, 0.0);
        assert!(canvas.draft().is_some());
        assert!(canvas.handle_key(KeyCommand::Cancel));
        assert!(canvas.draft().is_none());
        assert_eq!(canvas.tool(), ToolKind::Polygon);
    }

    #[test]
    fn test_pointer_maps_through_viewport() {
        let mut canvas = canvas();
        canvas.viewport.set_transform(100.0, 50.0, 2.0);
        canvas.set_tool(ToolKind::Line);
        click(&mut canvas, 100.0, 50.0);
        click(&mut canvas, 300.0, 50.0);
        let line = canvas.scene().objects().next().unwrap();
        assert_eq!(
            line.geometry,
            Geometry::Threshold {
                start: Point::ZERO,
                end: Point::new(100.0, 0.0)
            }
        );
    }

    #[test]
    fn test_scroll_zooms_and_right_button_is_ignored() {
        let mut canvas = canvas();
        assert!(canvas.handle_pointer(PointerEvent::Scroll {
            position: Point::new(400.0, 300.0),
            delta: kurbo::Vec2::new(0.0, -1.0),
        }));
        assert!((canvas.viewport.scale() - 1.2).abs() < 1e-12);

        canvas.set_tool(ToolKind::Polygon);
        assert!(!canvas.handle_pointer(PointerEvent::Down {
            position: Point::ZERO,
            button: MouseButton::Right,
        }));
        assert!(canvas.draft().is_none());
    }

    #[test]
    fn test_image_drag_and_decode() {
        let mut canvas = canvas();
        let source = ImageSource::from_bytes(ImageFormat::Png, &[0x89, b'P', b'N', b'G']);
        let id = canvas.add_image(BackgroundImage::new("Floor plan", source));
        canvas.image_decoded(id, Size::new(200.0, 100.0));
        canvas.drain_events();

        drag(&mut canvas, Point::new(10.0, 10.0), Point::new(60.0, 30.0));
        assert_eq!(canvas.scene().image(id).unwrap().position, Point::new(50.0, 20.0));
        assert_eq!(canvas.selection(), Some(Selection::Image(id)));
        assert!(canvas.drain_events().contains(&CanvasEvent::ImagesChanged));

        assert!(canvas.delete_selection());
        assert!(canvas.scene().image(id).is_none());
        assert_eq!(canvas.selection(), None);
    }

    #[test]
    fn test_minimap_click_recentres() {
        let mut canvas = canvas();
        draw_polygon(&mut canvas, &[(0.0, 0.0), (1000.0, 0.0), (0.0, 500.0)]);
        let layout = canvas.minimap_layout();
        let target = layout.scene_to_minimap(Point::new(500.0, 250.0));
        let scene_point = canvas.minimap_click(target);
        assert!((scene_point.x - 500.0).abs() < 1e-6);
        let centre = canvas.viewport.screen_to_scene(Point::new(400.0, 300.0));
        assert!((centre.x - 500.0).abs() < 1e-6);
        assert!((centre.y - 250.0).abs() < 1e-6);
    }
}
