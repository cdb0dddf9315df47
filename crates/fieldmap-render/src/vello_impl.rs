//! Vello-based renderer implementation.

use crate::display_list::{DisplayList, DrawCommand};
use crate::image_cache::ImageCache;
use crate::renderer::{RenderContext, RenderResult, Renderer};
use fieldmap_core::background::BlendMode;
use kurbo::{Affine, Shape, Stroke};
use peniko::{Color, Fill, Mix};
use vello::Scene;

fn mix(blend: BlendMode) -> Mix {
    match blend {
        BlendMode::Normal => Mix::Normal,
        BlendMode::Multiply => Mix::Multiply,
        BlendMode::Screen => Mix::Screen,
        BlendMode::Overlay => Mix::Overlay,
        BlendMode::Darken => Mix::Darken,
        BlendMode::Lighten => Mix::Lighten,
    }
}

/// Vello-based renderer for GPU-accelerated 2D graphics.
pub struct VelloRenderer {
    /// The Vello scene being built.
    scene: Scene,
    /// The overview, rebuilt when the minimap is enabled.
    minimap: Option<Scene>,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloRenderer {
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            minimap: None,
        }
    }

    /// Get the built scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the built scene, leaving an empty one.
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    pub fn minimap(&self) -> Option<&Scene> {
        self.minimap.as_ref()
    }

    /// Replay a display list into `scene`.
    pub fn encode(scene: &mut Scene, list: &DisplayList, images: &ImageCache) {
        for item in list.items() {
            match &item.command {
                DrawCommand::Fill { path, color, transform } => {
                    let color: Color = (*color).into();
                    scene.fill(Fill::NonZero, *transform, color, None, path);
                }
                DrawCommand::Stroke {
                    path,
                    color,
                    width,
                    dash,
                    transform,
                } => {
                    let color: Color = (*color).into();
                    let mut stroke = Stroke::new(*width);
                    if !dash.is_empty() {
                        stroke = stroke.with_dashes(0.0, dash.iter().copied());
                    }
                    scene.stroke(&stroke, *transform, color, None, path);
                }
                DrawCommand::Image {
                    id,
                    transform,
                    opacity,
                    blend,
                } => {
                    let Some(decoded) = images.get(*id) else {
                        continue;
                    };
                    let bounds = decoded.size.to_rect();
                    scene.push_layer(mix(*blend), *opacity as f32, *transform, &bounds);
                    scene.draw_image(&decoded.data.clone().into(), *transform);
                    scene.pop_layer();
                }
                DrawCommand::PushClip { path, transform } => {
                    scene.push_layer(Mix::Normal, 1.0, *transform, path);
                }
                DrawCommand::PopClip => scene.pop_layer(),
            }
        }
    }
}

impl Renderer for VelloRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        self.scene.reset();
        let list = DisplayList::build(ctx)?;
        Self::encode(&mut self.scene, &list, ctx.images);

        self.minimap = if ctx.display.show_minimap {
            let mut scene = self.minimap.take().unwrap_or_default();
            scene.reset();
            let clip = ctx.canvas.minimap.size.to_rect();
            scene.push_layer(Mix::Normal, 1.0, Affine::scale(ctx.scale_factor), &clip.to_path(0.1));
            Self::encode(&mut scene, &DisplayList::build_minimap(ctx), ctx.images);
            scene.pop_layer();
            Some(scene)
        } else {
            None
        };
        Ok(())
    }
}
