//! Journey photo strips: the photos of a sequence's shapes laid out left to right.

use crate::error::ExportResult;
use fieldmap_core::scene::Scene;
use fieldmap_core::sequence::Sequence;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Layout of a strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripOptions {
    /// Every photo is scaled to this height, keeping its aspect ratio.
    pub thumb_height: u32,
    /// Space between and around photos, in pixels.
    pub gap: u32,
    pub background: Rgba<u8>,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            thumb_height: 240,
            gap: 8,
            background: Rgba([255, 255, 255, 255]),
        }
    }
}

/// Decoded photos of the sequence in journey order. Undecodable photos are skipped.
fn journey_photos(sequence: &Sequence, scene: &Scene) -> Vec<DynamicImage> {
    let mut photos = Vec::new();
    for object in sequence.resolve(scene) {
        for photo in &object.metadata.photos {
            let decoded = photo
                .decode()
                .map_err(|e| e.to_string())
                .and_then(|bytes| image::load_from_memory(&bytes).map_err(|e| e.to_string()));
            match decoded {
                Ok(img) => photos.push(img),
                Err(e) => log::warn!("Skipping photo '{}' of {}: {}", photo.name, object.name, e),
            }
        }
    }
    photos
}

/// Compose the strip. Returns `None` when the journey has no usable photos.
pub fn compose(sequence: &Sequence, scene: &Scene, options: &StripOptions) -> Option<RgbaImage> {
    let height = options.thumb_height.max(1);
    let thumbs: Vec<RgbaImage> = journey_photos(sequence, scene)
        .into_iter()
        .map(|img| {
            let width = ((img.width() as f64 * height as f64 / img.height().max(1) as f64).round() as u32).max(1);
            imageops::resize(&img.to_rgba8(), width, height, FilterType::Triangle)
        })
        .collect();
    if thumbs.is_empty() {
        return None;
    }

    let gap = options.gap;
    let width = thumbs.iter().map(|t| t.width() + gap).sum::<u32>() + gap;
    let mut strip = RgbaImage::from_pixel(width, height + 2 * gap, options.background);
    let mut x = gap;
    for thumb in &thumbs {
        imageops::overlay(&mut strip, thumb, i64::from(x), i64::from(gap));
        x += thumb.width() + gap;
    }
    Some(strip)
}

/// The strip encoded as PNG.
pub fn render_png(sequence: &Sequence, scene: &Scene, options: &StripOptions) -> ExportResult<Option<Vec<u8>>> {
    let Some(strip) = compose(sequence, scene, options) else {
        return Ok(None);
    };
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(strip).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(Some(bytes))
}
