//! FieldMap Core Library
//!
//! Platform-agnostic data structures and logic for the FieldMap annotation canvas.

pub mod background;
pub mod calibration;
pub mod canvas;
pub mod config;
pub mod geometry;
pub mod history;
pub mod input;
pub mod minimap;
pub mod project;
pub mod scene;
pub mod selection;
pub mod sequence;
pub mod session;
pub mod shapes;
pub mod snap;
pub mod storage;
pub mod tools;
pub mod viewport;

pub use background::{BackgroundImage, BlendMode, ColorAdjustments, ImageFormat, ImageId, ImageSource};
pub use calibration::{Calibration, CalibrationError, Measurement, MeasurementUnit, PendingCalibration, measure};
pub use canvas::{Canvas, CanvasEvent};
pub use config::{CanvasConfig, ConfigError, DisplaySettings, GridStyle, MinimapConfig};
pub use history::{DEFAULT_MAX_HISTORY, History};
pub use input::{KeyCommand, Modifiers, MouseButton, PointerEvent};
pub use minimap::{Minimap, MinimapLayout};
pub use project::{Dataset, DatasetId, Project};
pub use scene::{ScanOrder, Scene, SceneError, SceneSnapshot, ShapePatch};
pub use selection::{Handle, Selection};
pub use sequence::{Sequence, SequenceId, Sequences};
pub use session::{SaveStatus, Session};
pub use shapes::{Geometry, MapObject, Metadata, ProjectId, ShapeId, ShapeKind, ShapeStyle};
pub use snap::{SnapResult, SnapTarget, VERTEX_SNAP_THRESHOLD, snap_to_vertices};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, StorageExt};
pub use tools::{Draft, ToolAction, ToolController, ToolKind, ToolState};
pub use viewport::Viewport;
