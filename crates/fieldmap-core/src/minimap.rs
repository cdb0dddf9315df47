//! Overview map: a fixed-size, independently scaled view of the whole scene.

use crate::config::MinimapConfig;
use crate::viewport::Viewport;
use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Mapping between scene space and minimap pixels for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapLayout {
    /// Scene units to minimap pixels.
    pub scale: f64,
    /// Minimap position of the scene origin.
    pub offset: Vec2,
    /// Scene region the layout was fitted to.
    pub fitted: Rect,
    pub size: Size,
}

impl MinimapLayout {
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    pub fn scene_to_minimap(&self, p: Point) -> Point {
        self.transform() * p
    }

    pub fn minimap_to_scene(&self, p: Point) -> Point {
        Point::new((p.x - self.offset.x) / self.scale, (p.y - self.offset.y) / self.scale)
    }

    /// The viewport's visible scene rectangle, in minimap pixels.
    pub fn viewport_indicator(&self, viewport: &Viewport) -> Rect {
        let r = viewport.visible_scene_rect();
        Rect::from_points(
            self.scene_to_minimap(Point::new(r.x0, r.y0)),
            self.scene_to_minimap(Point::new(r.x1, r.y1)),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Minimap {
    pub size: Size,
    pub padding: f64,
}

impl Default for Minimap {
    fn default() -> Self {
        Self::from_config(&MinimapConfig::default())
    }
}

impl Minimap {
    pub fn from_config(config: &MinimapConfig) -> Self {
        Self {
            size: Size::new(config.width, config.height),
            padding: config.padding,
        }
    }

    /// Fit the content bounds (or the visible rect when there is no content) into the minimap.
    pub fn layout(&self, content: Option<Rect>, viewport: &Viewport) -> MinimapLayout {
        let fitted = content
            .filter(|r| r.width() > 0.0 || r.height() > 0.0)
            .unwrap_or_else(|| viewport.visible_scene_rect());
        let avail = Size::new(
            (self.size.width - 2.0 * self.padding).max(1.0),
            (self.size.height - 2.0 * self.padding).max(1.0),
        );
        let sx = if fitted.width() > 0.0 { avail.width / fitted.width() } else { f64::INFINITY };
        let sy = if fitted.height() > 0.0 { avail.height / fitted.height() } else { f64::INFINITY };
        let mut scale = sx.min(sy);
        if !scale.is_finite() || scale <= 0.0 {
            scale = 1.0;
        }
        let centre = fitted.center();
        let offset = Vec2::new(
            self.size.width / 2.0 - centre.x * scale,
            self.size.height / 2.0 - centre.y * scale,
        );
        MinimapLayout {
            scale,
            offset,
            fitted,
            size: self.size,
        }
    }

    /// Recentre the main view on the scene point under a minimap click.
    pub fn click(&self, layout: &MinimapLayout, minimap_point: Point, viewport: &mut Viewport) -> Point {
        let scene_point = layout.minimap_to_scene(minimap_point);
        viewport.center_on(scene_point);
        scene_point
    }
}
