//! Background image decoding and the decoded-image cache.

use fieldmap_core::background::{BackgroundImage, ColorAdjustments, ImageFormat, ImageId};
use fieldmap_core::canvas::Canvas;
use fieldmap_core::scene::Scene;
use fieldmap_core::storage::BoxFuture;
use kurbo::Size;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Invalid base64 data: {0}")]
    Base64(String),
    #[error("Could not decode image: {0}")]
    Image(String),
    #[error("Image has no pixels")]
    Empty,
}

/// A decoded raster, ready to draw.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Natural size in pixels.
    pub size: Size,
    pub data: peniko::ImageData,
}

/// Turns an embedded image source into pixels.
pub trait ImageDecoder {
    fn decode<'a>(&'a self, image: &BackgroundImage) -> BoxFuture<'a, Result<DecodedImage, DecodeError>>;
}

/// Decoder backed by the `image` crate. Color adjustments are baked into the pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

fn raster_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::WebP => image::ImageFormat::WebP,
    }
}

/// Apply color adjustments to every pixel, leaving alpha untouched.
pub fn bake_adjustments(pixels: &mut image::RgbaImage, adjustments: &ColorAdjustments) {
    if adjustments.is_identity() {
        return;
    }
    for pixel in pixels.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let [r, g, b] = adjustments.apply([r, g, b]);
        pixel.0 = [r, g, b, a];
    }
}

fn decode_raster(image: &BackgroundImage) -> Result<DecodedImage, DecodeError> {
    let bytes = image
        .source
        .bytes()
        .map_err(|e| DecodeError::Base64(e.to_string()))?;
    let decoded = image::load_from_memory_with_format(&bytes, raster_format(image.source.format))
        .map_err(|e| DecodeError::Image(e.to_string()))?;
    let mut rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::Empty);
    }
    bake_adjustments(&mut rgba, &image.adjustments);
    let data = peniko::ImageData {
        data: peniko::Blob::new(Arc::new(rgba.into_vec())),
        format: peniko::ImageFormat::Rgba8,
        width,
        height,
        alpha_type: peniko::ImageAlphaType::Alpha,
    };
    Ok(DecodedImage {
        size: Size::new(width as f64, height as f64),
        data,
    })
}

impl ImageDecoder for RasterDecoder {
    fn decode<'a>(&'a self, image: &BackgroundImage) -> BoxFuture<'a, Result<DecodedImage, DecodeError>> {
        let image = image.clone();
        Box::pin(async move { decode_raster(&image) })
    }
}

#[derive(Debug, Clone)]
enum CacheEntry {
    Ready {
        image: DecodedImage,
        adjustments: ColorAdjustments,
    },
    Failed(DecodeError),
}

/// Decoded images keyed by layer id. Failures are remembered so a broken
/// layer renders as absent instead of being retried every frame.
#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    entries: HashMap<ImageId, CacheEntry>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The decoded pixels, if the layer decoded successfully.
    pub fn get(&self, id: ImageId) -> Option<&DecodedImage> {
        match self.entries.get(&id)? {
            CacheEntry::Ready { image, .. } => Some(image),
            CacheEntry::Failed(_) => None,
        }
    }

    pub fn error(&self, id: ImageId) -> Option<&DecodeError> {
        match self.entries.get(&id)? {
            CacheEntry::Failed(e) => Some(e),
            CacheEntry::Ready { .. } => None,
        }
    }

    /// Whether the layer has never been decoded, or its adjustments changed since.
    pub fn needs_decode(&self, image: &BackgroundImage) -> bool {
        match self.entries.get(&image.id) {
            None => true,
            Some(CacheEntry::Ready { adjustments, .. }) => *adjustments != image.adjustments,
            Some(CacheEntry::Failed(_)) => false,
        }
    }

    /// Store a decode result. Returns the natural size on success.
    pub fn insert(
        &mut self,
        image: &BackgroundImage,
        result: Result<DecodedImage, DecodeError>,
    ) -> Option<Size> {
        match result {
            Ok(decoded) => {
                let size = decoded.size;
                self.entries.insert(
                    image.id,
                    CacheEntry::Ready {
                        image: decoded,
                        adjustments: image.adjustments,
                    },
                );
                Some(size)
            }
            Err(e) => {
                log::warn!("Background image {} unavailable: {}", image.name, e);
                self.entries.insert(image.id, CacheEntry::Failed(e));
                None
            }
        }
    }

    /// Forget a layer so it is decoded again on the next pass.
    pub fn invalidate(&mut self, id: ImageId) {
        self.entries.remove(&id);
    }

    /// Drop entries for layers no longer in the scene.
    pub fn retain(&mut self, scene: &Scene) {
        self.entries.retain(|id, _| scene.image(*id).is_some());
    }

    /// Decode every layer that needs it and report sizes back to the canvas.
    /// Returns how many layers decoded successfully.
    pub async fn decode_pending<D: ImageDecoder + ?Sized>(&mut self, decoder: &D, canvas: &mut Canvas) -> usize {
        self.retain(canvas.scene());
        let pending: Vec<BackgroundImage> = canvas
            .scene()
            .images()
            .iter()
            .filter(|img| self.needs_decode(img))
            .cloned()
            .collect();

        let mut decoded = 0;
        for image in pending {
            let result = decoder.decode(&image).await;
            if let Some(size) = self.insert(&image, result) {
                canvas.image_decoded(image.id, size);
                decoded += 1;
            }
        }
        decoded
    }
}
