//! Canvas configuration, loaded from a JSON file with defaults for every field.

use crate::shapes::SerializableColor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Grid display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridStyle {
    /// No grid (plain background).
    None,
    /// Ruled lines.
    #[default]
    Lines,
    /// Dot at every cell corner.
    Dots,
    /// Major/minor square grid.
    Squares,
}

impl GridStyle {
    /// Get display name for this grid style.
    pub fn name(self) -> &'static str {
        match self {
            GridStyle::None => "None",
            GridStyle::Lines => "Lines",
            GridStyle::Dots => "Dots",
            GridStyle::Squares => "Squares",
        }
    }
}

/// Presentation settings consumed by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplaySettings {
    pub grid_style: GridStyle,
    /// Grid cell size in scene units.
    pub grid_size: f64,
    /// Minor cells per major cell for the square grid.
    pub grid_major_every: u32,
    pub background_color: SerializableColor,
    pub grid_color: SerializableColor,
    /// Selection and vertex-handle color.
    pub accent_color: SerializableColor,
    /// Color reserved for uncommitted geometry.
    pub draft_color: SerializableColor,
    pub calibration_color: SerializableColor,
    pub show_minimap: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            grid_style: GridStyle::Lines,
            grid_size: 20.0,
            grid_major_every: 5,
            background_color: SerializableColor::new(250, 250, 250, 255),
            grid_color: SerializableColor::new(220, 220, 225, 255),
            accent_color: SerializableColor::new(59, 130, 246, 255),
            draft_color: SerializableColor::new(236, 72, 153, 255),
            calibration_color: SerializableColor::new(220, 38, 38, 255),
            show_minimap: true,
        }
    }
}

/// Minimap geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MinimapConfig {
    pub width: f64,
    pub height: f64,
    /// Inner padding around the fitted content, in minimap pixels.
    pub padding: f64,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 150.0,
            padding: 8.0,
        }
    }
}

/// Tunables for interaction, history and viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    pub max_history: usize,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Fractional zoom step for the zoom in/out commands.
    pub zoom_step: f64,
    /// Share of the viewport filled by `fit_to_content`.
    pub fit_margin: f64,
    /// General hit tolerance in screen pixels.
    pub hit_tolerance: f64,
    /// Vertex handle hit radius in screen pixels.
    pub vertex_hit_radius: f64,
    /// Vertex snap threshold in scene units.
    pub snap_threshold: f64,
    /// Minimum distance between buffered freehand points, in scene units.
    pub smoothing_distance: f64,
    /// A freehand stroke needs more than this many points to commit.
    pub min_freehand_points: usize,
    pub minimap: MinimapConfig,
    pub display: DisplaySettings,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            max_history: crate::history::DEFAULT_MAX_HISTORY,
            min_scale: 0.1,
            max_scale: 10.0,
            zoom_step: 0.2,
            fit_margin: 0.9,
            hit_tolerance: 5.0,
            vertex_hit_radius: 10.0,
            snap_threshold: crate::snap::VERTEX_SNAP_THRESHOLD,
            smoothing_distance: 3.0,
            min_freehand_points: 5,
            minimap: MinimapConfig::default(),
            display: DisplaySettings::default(),
        }
    }
}

impl CanvasConfig {
    /// Default location: `<config dir>/fieldmap/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fieldmap").join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` (or the default path), falling back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => p,
            None => return Self::default(),
        };
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_scale > 0.0) || self.min_scale > self.max_scale {
            return Err(ConfigError::Invalid(format!(
                "scale range [{}, {}]",
                self.min_scale, self.max_scale
            )));
        }
        if self.max_history == 0 {
            return Err(ConfigError::Invalid("max history must be > 0".to_string()));
        }
        if !(self.fit_margin > 0.0 && self.fit_margin <= 1.0) {
            return Err(ConfigError::Invalid(format!("fit margin {}", self.fit_margin)));
        }
        if !(self.display.grid_size > 0.0) {
            return Err(ConfigError::Invalid("grid size must be > 0".to_string()));
        }
        Ok(())
    }
}
