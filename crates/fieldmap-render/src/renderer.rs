//! Renderer trait abstraction.

use crate::display_list::DisplayList;
use crate::image_cache::ImageCache;
use fieldmap_core::canvas::Canvas;
use fieldmap_core::config::DisplaySettings;
use kurbo::Size;
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Viewport has no area: {0:?}")]
    EmptyViewport(Size),
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The canvas to render.
    pub canvas: &'a Canvas,
    /// Decoded background images. Layers missing from the cache are skipped.
    pub images: &'a ImageCache,
    /// Grid, colors and minimap visibility.
    pub display: DisplaySettings,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
}

impl<'a> RenderContext<'a> {
    /// Create a render context using the canvas' own display settings.
    pub fn new(canvas: &'a Canvas, images: &'a ImageCache) -> Self {
        Self {
            canvas,
            images,
            display: canvas.config().display.clone(),
            scale_factor: 1.0,
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_display(mut self, display: DisplaySettings) -> Self {
        self.display = display;
        self
    }

    /// Container size in logical pixels.
    pub fn viewport_size(&self) -> Size {
        self.canvas.viewport.container
    }

    pub fn background_color(&self) -> Color {
        self.display.background_color.into()
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Build the frame for the given context.
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()>;

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color()
    }
}

/// Backend that keeps the display list itself, for headless use and tests.
#[derive(Debug, Default)]
pub struct DisplayListRenderer {
    list: DisplayList,
    minimap: Option<DisplayList>,
}

impl DisplayListRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_list(&self) -> &DisplayList {
        &self.list
    }

    /// The minimap of the last frame, when the display settings enable it.
    pub fn minimap(&self) -> Option<&DisplayList> {
        self.minimap.as_ref()
    }
}

impl Renderer for DisplayListRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        self.list = DisplayList::build(ctx)?;
        self.minimap = ctx.display.show_minimap.then(|| DisplayList::build_minimap(ctx));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldmap_core::config::CanvasConfig;
    use uuid::Uuid;

    #[test]
    fn test_minimap_follows_display_settings() {
        let canvas = Canvas::new(Uuid::new_v4(), CanvasConfig::default());
        let images = ImageCache::new();
        let mut renderer = DisplayListRenderer::new();

        renderer.build_scene(&RenderContext::new(&canvas, &images)).unwrap();
        assert!(!renderer.display_list().is_empty());
        assert!(renderer.minimap().is_some());

        let display = DisplaySettings {
            show_minimap: false,
            ..DisplaySettings::default()
        };
        let ctx = RenderContext::new(&canvas, &images).with_display(display);
        renderer.build_scene(&ctx).unwrap();
        assert!(renderer.minimap().is_none());
    }

    #[test]
    fn test_background_color_comes_from_display() {
        let canvas = Canvas::new(Uuid::new_v4(), CanvasConfig::default());
        let images = ImageCache::new();
        let ctx = RenderContext::new(&canvas, &images);
        let renderer = DisplayListRenderer::new();
        let expected: Color = canvas.config().display.background_color.into();
        assert_eq!(renderer.background_color(&ctx).to_rgba8(), expected.to_rgba8());
    }
}
