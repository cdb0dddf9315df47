//! Tool system for the annotation canvas.
//!
//! Exactly one tool is active. Pointer handlers read the scene and return a
//! [`ToolAction`] describing what should happen; the canvas applies it.

mod draw;
mod edit;

use crate::background::ImageId;
use crate::calibration::PendingCalibration;
use crate::config::CanvasConfig;
use crate::input::MouseButton;
use crate::scene::Scene;
use crate::selection::Selection;
use crate::shapes::{ShapeId, ShapeKind, ShapeStyle};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Polygon,
    Line,
    Freehand,
    Calibrate,
    Circle,
    Square,
    Triangle,
    EditVertices,
    Erase,
    StyleMatch,
    Highlighter,
}

impl ToolKind {
    pub const ALL: [ToolKind; 13] = [
        ToolKind::Select,
        ToolKind::Pan,
        ToolKind::Polygon,
        ToolKind::Line,
        ToolKind::Freehand,
        ToolKind::Calibrate,
        ToolKind::Circle,
        ToolKind::Square,
        ToolKind::Triangle,
        ToolKind::EditVertices,
        ToolKind::Erase,
        ToolKind::StyleMatch,
        ToolKind::Highlighter,
    ];

    /// Single-key shortcut.
    pub fn shortcut(self) -> char {
        match self {
            ToolKind::Select => 'v',
            ToolKind::Pan => 'h',
            ToolKind::Polygon => 'p',
            ToolKind::Line => 'l',
            ToolKind::Freehand => 'd',
            ToolKind::Calibrate => 'k',
            ToolKind::Circle => 'c',
            ToolKind::Square => 's',
            ToolKind::Triangle => 't',
            ToolKind::EditVertices => 'e',
            ToolKind::Erase => 'x',
            ToolKind::StyleMatch => 'm',
            ToolKind::Highlighter => 'i',
        }
    }

    pub fn from_shortcut(key: char) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.shortcut() == key)
    }

    /// The primitive committed by the drag-to-draw tools.
    pub fn primitive(self) -> Option<ShapeKind> {
        match self {
            ToolKind::Circle => Some(ShapeKind::Circle),
            ToolKind::Square => Some(ShapeKind::Square),
            ToolKind::Triangle => Some(ShapeKind::Triangle),
            _ => None,
        }
    }
}

/// Transient state of the active tool. Each variant carries only its own buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ToolState {
    #[default]
    Idle,
    /// Polygon vertices placed so far, plus the hover point for the rubber band.
    Polygon { vertices: Vec<Point>, cursor: Option<Point> },
    /// First click of a line or calibration placed.
    TwoClick { start: Point, current: Point },
    /// Freehand or highlighter stroke in progress.
    Stroke { points: Vec<Point> },
    /// Circle, square or triangle being dragged out.
    Primitive { anchor: Point, current: Point },
    VertexDrag {
        shape: ShapeId,
        index: usize,
        origin: Point,
        position: Point,
        snapped: bool,
    },
    ImageDrag {
        image: ImageId,
        grab_offset: Vec2,
        origin: Point,
        position: Point,
    },
    Panning { last_screen: Point },
}

/// What the canvas should do in response to a pointer event.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    Select(Selection),
    ClearSelection,
    /// Sequence-record sub-mode hit a shape.
    AppendToSequence(ShapeId),
    Commit {
        kind: ShapeKind,
        vertices: Vec<Point>,
        style: ShapeStyle,
    },
    LineCompleted {
        start: Point,
        end: Point,
        pixel_distance: f64,
    },
    CalibrationPending(PendingCalibration),
    Erase(ShapeId),
    PasteStyle {
        target: ShapeId,
        style: ShapeStyle,
    },
    CommitVertex {
        shape: ShapeId,
        index: usize,
        position: Point,
    },
    CommitImage {
        image: ImageId,
        position: Point,
    },
    /// Screen-space pan delta.
    Pan(Vec2),
}

/// Read-only view of the canvas handed to the tool.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    pub scene: &'a Scene,
    pub selection: Option<Selection>,
    /// Current viewport scale, used to turn screen radii into scene units.
    pub scale: f64,
}

impl ToolContext<'_> {
    fn scene_len(&self, screen_len: f64) -> f64 {
        if self.scale > 0.0 { screen_len / self.scale } else { screen_len }
    }
}

/// A pointer event already mapped into scene space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub scene: Point,
    pub screen: Point,
    pub button: MouseButton,
}

impl PointerInput {
    pub fn new(scene: Point, screen: Point) -> Self {
        Self {
            scene,
            screen,
            button: MouseButton::Left,
        }
    }
}

/// Interaction tunables, taken from [`CanvasConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    /// Screen pixels.
    pub hit_tolerance: f64,
    /// Screen pixels.
    pub vertex_hit_radius: f64,
    /// Scene units.
    pub snap_threshold: f64,
    /// Scene units.
    pub smoothing_distance: f64,
    pub min_freehand_points: usize,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::from_config(&CanvasConfig::default())
    }
}

impl ToolSettings {
    pub fn from_config(config: &CanvasConfig) -> Self {
        Self {
            hit_tolerance: config.hit_tolerance,
            vertex_hit_radius: config.vertex_hit_radius,
            snap_threshold: config.snap_threshold,
            smoothing_distance: config.smoothing_distance,
            min_freehand_points: config.min_freehand_points,
        }
    }
}

/// Uncommitted geometry to draw on top of the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Draft<'a> {
    Polygon { vertices: &'a [Point], cursor: Option<Point> },
    Segment { start: Point, end: Point, calibration: bool },
    Stroke { points: &'a [Point], style: &'a ShapeStyle },
    Primitive { kind: ShapeKind, anchor: Point, current: Point },
    Vertex { shape: ShapeId, index: usize, position: Point, snapped: bool },
    Image { image: ImageId, position: Point },
}

/// Manages the current tool and its state.
#[derive(Debug, Clone)]
pub struct ToolController {
    kind: ToolKind,
    state: ToolState,
    pub settings: ToolSettings,
    /// Style applied to new shapes.
    pub style: ShapeStyle,
    /// Style applied to highlighter strokes.
    pub highlighter_style: ShapeStyle,
    /// Select-mode clicks append to the active sequence instead of selecting.
    pub recording: bool,
}

impl Default for ToolController {
    fn default() -> Self {
        Self::new(ToolSettings::default())
    }
}

impl ToolController {
    pub fn new(settings: ToolSettings) -> Self {
        Self {
            kind: ToolKind::Select,
            state: ToolState::Idle,
            settings,
            style: ShapeStyle::default(),
            highlighter_style: ShapeStyle::highlighter(),
            recording: false,
        }
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    pub fn state(&self) -> &ToolState {
        &self.state
    }

    /// Switch tools, abandoning any transient buffer.
    pub fn set_tool(&mut self, kind: ToolKind) {
        if self.state != ToolState::Idle {
            log::debug!("Abandoning {:?} buffer on switch to {:?}", self.kind, kind);
        }
        self.kind = kind;
        self.state = ToolState::Idle;
    }

    /// Drop the transient buffer but stay in the current tool.
    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
    }

    pub fn is_busy(&self) -> bool {
        self.state != ToolState::Idle
    }

    pub fn pointer_down(&mut self, ctx: &ToolContext, input: PointerInput) -> Option<ToolAction> {
        match self.kind {
            ToolKind::Select => self.select_down(ctx, input),
            ToolKind::Pan => self.pan_down(input),
            ToolKind::Polygon => self.polygon_down(input),
            ToolKind::Line | ToolKind::Calibrate => self.two_click_down(input),
            ToolKind::Freehand | ToolKind::Highlighter => self.stroke_down(input),
            ToolKind::Circle | ToolKind::Square | ToolKind::Triangle => self.primitive_down(input),
            ToolKind::EditVertices => self.vertex_down(ctx, input),
            ToolKind::Erase => self.erase_down(ctx, input),
            ToolKind::StyleMatch => self.style_match_down(ctx, input),
        }
    }

    pub fn pointer_move(&mut self, ctx: &ToolContext, input: PointerInput) -> Option<ToolAction> {
        let smoothing = self.settings.smoothing_distance;
        let snap_threshold = self.settings.snap_threshold;
        match &mut self.state {
            ToolState::Idle => None,
            ToolState::Polygon { cursor, .. } => {
                *cursor = Some(input.scene);
                None
            }
            ToolState::TwoClick { current, .. } | ToolState::Primitive { current, .. } => {
                *current = input.scene;
                None
            }
            ToolState::Stroke { points } => {
                draw::extend_stroke(points, input.scene, smoothing);
                None
            }
            ToolState::VertexDrag {
                shape,
                position,
                snapped,
                ..
            } => {
                let snap = crate::snap::snap_to_vertices(input.scene, ctx.scene, Some(*shape), snap_threshold);
                *position = snap.point;
                *snapped = snap.is_snapped();
                None
            }
            ToolState::ImageDrag {
                grab_offset, position, ..
            } => {
                *position = input.scene - *grab_offset;
                None
            }
            ToolState::Panning { last_screen } => {
                let delta = input.screen - *last_screen;
                *last_screen = input.screen;
                Some(ToolAction::Pan(delta))
            }
        }
    }

    pub fn pointer_up(&mut self, ctx: &ToolContext, input: PointerInput) -> Option<ToolAction> {
        match std::mem::take(&mut self.state) {
            // Multi-click flows keep their buffer across releases.
            state @ (ToolState::Polygon { .. } | ToolState::TwoClick { .. } | ToolState::Idle) => {
                self.state = state;
                None
            }
            ToolState::Stroke { points } => self.finish_stroke(points),
            ToolState::Primitive { anchor, .. } => self.finish_primitive(anchor, input.scene),
            ToolState::VertexDrag {
                shape,
                index,
                origin,
                ..
            } => {
                // Re-snap at the release point so the committed position is exact.
                let snap = crate::snap::snap_to_vertices(input.scene, ctx.scene, Some(shape), self.settings.snap_threshold);
                (snap.point != origin).then_some(ToolAction::CommitVertex {
                    shape,
                    index,
                    position: snap.point,
                })
            }
            ToolState::ImageDrag {
                image,
                grab_offset,
                origin,
                ..
            } => {
                let position = input.scene - grab_offset;
                (position != origin).then_some(ToolAction::CommitImage { image, position })
            }
            ToolState::Panning { last_screen } => {
                let delta = input.screen - last_screen;
                (delta != Vec2::ZERO).then_some(ToolAction::Pan(delta))
            }
        }
    }

    /// Geometry of the in-progress interaction, for rendering.
    pub fn draft(&self) -> Option<Draft<'_>> {
        match &self.state {
            ToolState::Idle | ToolState::Panning { .. } => None,
            ToolState::Polygon { vertices, cursor } => Some(Draft::Polygon {
                vertices,
                cursor: *cursor,
            }),
            ToolState::TwoClick { start, current } => Some(Draft::Segment {
                start: *start,
                end: *current,
                calibration: self.kind == ToolKind::Calibrate,
            }),
            ToolState::Stroke { points } => Some(Draft::Stroke {
                points,
                style: self.stroke_style(),
            }),
            ToolState::Primitive { anchor, current } => self.kind.primitive().map(|kind| Draft::Primitive {
                kind,
                anchor: *anchor,
                current: *current,
            }),
            ToolState::VertexDrag {
                shape,
                index,
                position,
                snapped,
                ..
            } => Some(Draft::Vertex {
                shape: *shape,
                index: *index,
                position: *position,
                snapped: *snapped,
            }),
            ToolState::ImageDrag { image, position, .. } => Some(Draft::Image {
                image: *image,
                position: *position,
            }),
        }
    }

    fn stroke_style(&self) -> &ShapeStyle {
        if self.kind == ToolKind::Highlighter {
            &self.highlighter_style
        } else {
            &self.style
        }
    }
}
