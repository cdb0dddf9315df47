//! Tools that act on committed content: select, pan, edit vertices, erase, style match.

use super::{PointerInput, ToolAction, ToolContext, ToolController, ToolKind, ToolState};
use crate::scene::ScanOrder;
use crate::selection::{Selection, hit_test_vertices};

impl ToolController {
    pub(super) fn select_down(&mut self, ctx: &ToolContext, input: PointerInput) -> Option<ToolAction> {
        let tolerance = ctx.scene_len(self.settings.hit_tolerance);
        if let Some(shape) = ctx.scene.find_shape_at(input.scene, tolerance, ScanOrder::TopToBottom) {
            return Some(if self.recording {
                ToolAction::AppendToSequence(shape.id)
            } else {
                ToolAction::Select(Selection::Shape(shape.id))
            });
        }
        if let Some(image) = ctx.scene.find_image_at(input.scene) {
            self.state = ToolState::ImageDrag {
                image: image.id,
                grab_offset: input.scene - image.position,
                origin: image.position,
                position: image.position,
            };
            return Some(ToolAction::Select(Selection::Image(image.id)));
        }
        Some(ToolAction::ClearSelection)
    }

    pub(super) fn pan_down(&mut self, input: PointerInput) -> Option<ToolAction> {
        self.state = ToolState::Panning {
            last_screen: input.screen,
        };
        None
    }

    pub(super) fn vertex_down(&mut self, ctx: &ToolContext, input: PointerInput) -> Option<ToolAction> {
        let Some(shape_id) = ctx.selection.and_then(|s| s.shape()) else {
            log::debug!("Vertex edit without a selected shape");
            return None;
        };
        let object = ctx.scene.get(shape_id)?;
        let radius = ctx.scene_len(self.settings.vertex_hit_radius);
        let index = hit_test_vertices(object, input.scene, radius)?;
        let origin = object.geometry.vertex(index)?;
        self.state = ToolState::VertexDrag {
            shape: shape_id,
            index,
            origin,
            position: origin,
            snapped: false,
        };
        None
    }

    pub(super) fn erase_down(&mut self, ctx: &ToolContext, input: PointerInput) -> Option<ToolAction> {
        let tolerance = ctx.scene_len(self.settings.hit_tolerance);
        ctx.scene
            .find_shape_at(input.scene, tolerance, ScanOrder::TopToBottom)
            .map(|shape| ToolAction::Erase(shape.id))
    }

    pub(super) fn style_match_down(&mut self, ctx: &ToolContext, input: PointerInput) -> Option<ToolAction> {
        let tolerance = ctx.scene_len(self.settings.hit_tolerance);
        let source = ctx.scene.find_shape_at(input.scene, tolerance, ScanOrder::TopToBottom)?;
        self.kind = ToolKind::Select;
        match ctx.selection.and_then(|s| s.shape()) {
            Some(target) => Some(ToolAction::PasteStyle {
                target,
                style: source.style.clone(),
            }),
            None => {
                log::debug!("Style match with nothing selected");
                None
            }
        }
    }
}
