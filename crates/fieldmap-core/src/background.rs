//! Background raster layers placed under the annotations.

use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for background images.
pub type ImageId = Uuid;

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::WebP => "webp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// Embedded raster source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSource {
    pub format: ImageFormat,
    /// Base64 (standard alphabet) encoded file bytes.
    pub data_base64: String,
}

impl ImageSource {
    pub fn from_bytes(format: ImageFormat, data: &[u8]) -> Self {
        Self {
            format,
            data_base64: STANDARD.encode(data),
        }
    }

    pub fn bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data_base64)
    }
}

/// Per-layer color adjustments. The neutral value of every field leaves pixels untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorAdjustments {
    /// 0 = color, 1 = fully gray.
    pub grayscale: f64,
    /// 1 = unchanged.
    pub saturation: f64,
    /// 1 = unchanged.
    pub brightness: f64,
    /// 1 = unchanged.
    pub contrast: f64,
    /// 0 = none, 1 = full sepia tone.
    pub sepia: f64,
}

impl Default for ColorAdjustments {
    fn default() -> Self {
        Self {
            grayscale: 0.0,
            saturation: 1.0,
            brightness: 1.0,
            contrast: 1.0,
            sepia: 0.0,
        }
    }
}

impl ColorAdjustments {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the adjustments to one straight-alpha RGB pixel.
    pub fn apply(&self, rgb: [u8; 3]) -> [u8; 3] {
        let mut c = rgb.map(|v| v as f64 / 255.0);
        let luma = |c: &[f64; 3]| 0.2126 * c[0] + 0.7152 * c[1] + 0.0722 * c[2];

        if self.grayscale > 0.0 {
            let l = luma(&c);
            let t = self.grayscale.clamp(0.0, 1.0);
            c = c.map(|v| v + (l - v) * t);
        }
        if self.saturation != 1.0 {
            let l = luma(&c);
            let s = self.saturation.max(0.0);
            c = c.map(|v| l + (v - l) * s);
        }
        if self.sepia > 0.0 {
            let t = self.sepia.clamp(0.0, 1.0);
            let sep = [
                0.393 * c[0] + 0.769 * c[1] + 0.189 * c[2],
                0.349 * c[0] + 0.686 * c[1] + 0.168 * c[2],
                0.272 * c[0] + 0.534 * c[1] + 0.131 * c[2],
            ];
            c = [0, 1, 2].map(|i| c[i] + (sep[i] - c[i]) * t);
        }
        let b = self.brightness.max(0.0);
        let k = self.contrast.max(0.0);
        c.map(|v| (((v * b - 0.5) * k + 0.5).clamp(0.0, 1.0) * 255.0).round() as u8)
    }
}

/// Compositing mode of a background layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
}

/// A transformable raster layer owned by the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundImage {
    pub id: ImageId,
    pub name: String,
    pub source: ImageSource,
    /// Scene position of the unrotated top-left corner.
    pub position: Point,
    pub scale: f64,
    /// Radians, about the image centre.
    pub rotation: f64,
    pub opacity: f64,
    pub visible: bool,
    pub locked: bool,
    pub z_index: i32,
    #[serde(default)]
    pub adjustments: ColorAdjustments,
    #[serde(default)]
    pub blend_mode: BlendMode,
    /// Pixel size, known once the decoder has run.
    #[serde(skip)]
    pub natural_size: Option<Size>,
}

impl BackgroundImage {
    pub fn new(name: impl Into<String>, source: ImageSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            source,
            position: Point::ZERO,
            scale: 1.0,
            rotation: 0.0,
            opacity: 1.0,
            visible: true,
            locked: false,
            z_index: 0,
            adjustments: ColorAdjustments::default(),
            blend_mode: BlendMode::Normal,
            natural_size: None,
        }
    }

    /// Size in scene units, if decoded.
    pub fn display_size(&self) -> Option<Size> {
        self.natural_size.map(|s| s * self.scale)
    }

    /// Image-pixel to scene transform.
    pub fn transform(&self) -> Affine {
        let size = self.display_size().unwrap_or(Size::ZERO);
        let center = Point::new(size.width / 2.0, size.height / 2.0);
        Affine::translate(self.position.to_vec2())
            * Affine::rotate_about(self.rotation, center)
            * Affine::scale(self.scale)
    }

    /// Scene bounding box of the rotated layer.
    pub fn bounds(&self) -> Option<Rect> {
        let size = self.natural_size?;
        Some(self.transform().transform_rect_bbox(size.to_rect()))
    }

    pub fn hit_test(&self, point: Point) -> bool {
        let Some(size) = self.natural_size else {
            return false;
        };
        if self.scale <= 0.0 {
            return false;
        }
        let local = self.transform().inverse() * point;
        size.to_rect().contains(local)
    }

    /// Whether select-mode may pick or drag this layer.
    pub fn is_interactive(&self) -> bool {
        self.visible && !self.locked
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }
}
