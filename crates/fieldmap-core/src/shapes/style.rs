//! Presentation data attached to every shape.

use crate::geometry::HatchPattern;
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let r = byte(&hex[0..1])? * 17;
                let g = byte(&hex[1..2])? * 17;
                let b = byte(&hex[2..3])? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => Some(Self::new(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?, 255)),
            8 => Some(Self::new(
                byte(&hex[0..2])?,
                byte(&hex[2..4])?,
                byte(&hex[4..6])?,
                byte(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Multiply the alpha channel by `opacity` (clamped to 0..=1).
    pub fn with_opacity(self, opacity: f64) -> Self {
        let a = (self.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Stroke dash style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    /// No outline at all.
    None,
}

/// Decoration drawn at the ends of a threshold line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEndings {
    #[default]
    None,
    Points,
    Arrows,
}

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    pub fill_color: SerializableColor,
    /// Fill opacity (0.0 = no visible fill).
    #[serde(default = "default_fill_opacity")]
    pub fill_opacity: f64,
    pub stroke_color: SerializableColor,
    pub stroke_width: f64,
    #[serde(default)]
    pub dash_style: DashStyle,
    /// Gap length for dashed/dotted strokes, in scene pixels.
    #[serde(default = "default_dash_spacing")]
    pub dash_spacing: f64,
    #[serde(default)]
    pub hatch: HatchPattern,
    #[serde(default = "default_hatch_spacing")]
    pub hatch_spacing: f64,
    #[serde(default = "default_hatch_line_width")]
    pub hatch_line_width: f64,
    #[serde(default)]
    pub line_endings: LineEndings,
    #[serde(default)]
    pub show_points: bool,
    #[serde(default = "default_point_size")]
    pub point_size: f64,
}

fn default_fill_opacity() -> f64 {
    0.3
}

fn default_dash_spacing() -> f64 {
    6.0
}

fn default_hatch_spacing() -> f64 {
    10.0
}

fn default_hatch_line_width() -> f64 {
    1.0
}

fn default_point_size() -> f64 {
    4.0
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill_color: SerializableColor::new(59, 130, 246, 255),
            fill_opacity: default_fill_opacity(),
            stroke_color: SerializableColor::new(30, 64, 175, 255),
            stroke_width: 2.0,
            dash_style: DashStyle::Solid,
            dash_spacing: default_dash_spacing(),
            hatch: HatchPattern::None,
            hatch_spacing: default_hatch_spacing(),
            hatch_line_width: default_hatch_line_width(),
            line_endings: LineEndings::None,
            show_points: false,
            point_size: default_point_size(),
        }
    }
}

impl ShapeStyle {
    /// The highlighter preset: a wide, translucent freehand stroke.
    pub fn highlighter() -> Self {
        Self {
            fill_opacity: 0.0,
            stroke_color: SerializableColor::new(250, 204, 21, 128),
            stroke_width: 16.0,
            ..Self::default()
        }
    }

    /// Get the stroke color as a peniko Color.
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }

    /// Fill color with the fill opacity applied, or `None` when fully transparent.
    pub fn fill(&self) -> Option<Color> {
        let color = self.fill_color.with_opacity(self.fill_opacity);
        (color.a > 0).then(|| color.into())
    }

    /// Whether an outline should be drawn at all.
    pub fn has_stroke(&self) -> bool {
        self.dash_style != DashStyle::None && self.stroke_width > 0.0
    }

    /// Dash array for the stroke, empty for continuous lines.
    pub fn dash_pattern(&self) -> Vec<f64> {
        let gap = self.dash_spacing.max(1.0);
        match self.dash_style {
            DashStyle::Solid | DashStyle::None => Vec::new(),
            DashStyle::Dashed => vec![gap * 2.0, gap],
            DashStyle::Dotted => vec![self.stroke_width.max(1.0), gap],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let c = SerializableColor::from_hex("#1e40af").unwrap();
        assert_eq!(c, SerializableColor::new(0x1e, 0x40, 0xaf, 255));
        assert_eq!(c.to_hex(), "#1e40af");
        assert_eq!(SerializableColor::from_hex("#fff"), Some(SerializableColor::white()));
        assert_eq!(
            SerializableColor::from_hex("#00000080").map(|c| c.a),
            Some(0x80)
        );
        assert!(SerializableColor::from_hex("red").is_none());
    }

    #[test]
    fn test_fill_opacity() {
        let mut style = ShapeStyle::default();
        assert!(style.fill().is_some());
        style.fill_opacity = 0.0;
        assert!(style.fill().is_none());
    }

    #[test]
    fn test_dash_pattern() {
        let mut style = ShapeStyle {
            dash_spacing: 4.0,
            ..Default::default()
        };
        assert!(style.dash_pattern().is_empty());
        style.dash_style = DashStyle::Dashed;
        assert_eq!(style.dash_pattern(), vec![8.0, 4.0]);
        style.dash_style = DashStyle::Dotted;
        assert_eq!(style.dash_pattern(), vec![2.0, 4.0]);
        style.dash_style = DashStyle::None;
        assert!(!style.has_stroke());
    }

    #[test]
    fn test_style_deserializes_with_defaults() {
        let json = r#"{
            "fillColor": {"r": 1, "g": 2, "b": 3, "a": 255},
            "strokeColor": {"r": 0, "g": 0, "b": 0, "a": 255},
            "strokeWidth": 3.0
        }"#;
        let style: ShapeStyle = serde_json::from_str(json).unwrap();
        assert_eq!(style.hatch, HatchPattern::None);
        assert_eq!(style.line_endings, LineEndings::None);
        assert!((style.dash_spacing - 6.0).abs() < f64::EPSILON);
    }
}
