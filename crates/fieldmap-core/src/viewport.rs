//! Pan/zoom transform between screen and scene space.

use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Viewport manages the view transform for the canvas.
///
/// `screen = scene * scale + offset`. Pan is unbounded; scale is clamped to
/// `[min_scale, max_scale]` after every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Current translation offset (pan), in screen pixels.
    pub offset: Vec2,
    scale: f64,
    min_scale: f64,
    max_scale: f64,
    /// Size of the drawing surface in screen pixels.
    pub container: Size,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.1, 10.0)
    }
}

impl Viewport {
    pub fn new(min_scale: f64, max_scale: f64) -> Self {
        let (min_scale, max_scale) = if min_scale <= max_scale {
            (min_scale, max_scale)
        } else {
            (max_scale, min_scale)
        };
        Self {
            offset: Vec2::ZERO,
            scale: 1.0_f64.clamp(min_scale, max_scale),
            min_scale,
            max_scale,
            container: Size::new(800.0, 600.0),
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        if scale.is_finite() {
            scale.clamp(self.min_scale, self.max_scale)
        } else {
            self.scale
        }
    }

    pub fn set_container(&mut self, size: Size) {
        self.container = size;
    }

    fn center(&self) -> Point {
        Point::new(self.container.width / 2.0, self.container.height / 2.0)
    }

    /// Scene to screen transform, for rendering.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Screen to scene transform, for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    pub fn screen_to_scene(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn scene_to_screen(&self, scene_point: Point) -> Point {
        self.transform() * scene_point
    }

    /// Scene-space rectangle currently visible in the container.
    pub fn visible_scene_rect(&self) -> Rect {
        Rect::from_points(
            self.screen_to_scene(Point::ZERO),
            self.screen_to_scene(Point::new(self.container.width, self.container.height)),
        )
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `factor`, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_scale = self.clamp_scale(self.scale * factor);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }
        let scene_point = self.screen_to_scene(screen_point);
        self.scale = new_scale;
        let new_screen = self.scene_to_screen(scene_point);
        self.offset += screen_point - new_screen;
    }

    /// Zoom in by a fractional step around the container centre.
    pub fn zoom_in(&mut self, step: f64) {
        self.zoom_at(self.center(), 1.0 + step.max(0.0));
    }

    pub fn zoom_out(&mut self, step: f64) {
        self.zoom_at(self.center(), 1.0 / (1.0 + step.max(0.0)));
    }

    /// Reset to identity pan and unit scale.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.scale = self.clamp_scale(1.0);
    }

    /// Set pan and scale directly.
    pub fn set_transform(&mut self, x: f64, y: f64, scale: f64) {
        self.offset = Vec2::new(x, y);
        self.scale = self.clamp_scale(scale);
    }

    /// Pan so `scene_point` lands in the middle of the container, at the current scale.
    pub fn center_on(&mut self, scene_point: Point) {
        let c = self.center();
        self.set_transform(
            c.x - scene_point.x * self.scale,
            c.y - scene_point.y * self.scale,
            self.scale,
        );
    }

    /// Fit `bounds` into the container, filling `margin` of it, and centre.
    pub fn fit_to_content(&mut self, bounds: Rect, margin: f64) {
        if bounds.width() <= 0.0 && bounds.height() <= 0.0 {
            self.reset();
            self.center_on(bounds.center());
            return;
        }
        let avail = Size::new(self.container.width * margin, self.container.height * margin);
        let sx = if bounds.width() > 0.0 { avail.width / bounds.width() } else { f64::INFINITY };
        let sy = if bounds.height() > 0.0 { avail.height / bounds.height() } else { f64::INFINITY };
        self.scale = self.clamp_scale(sx.min(sy));
        self.center_on(bounds.center());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_screen_to_scene_with_offset_and_scale() {
        let mut viewport = Viewport::default();
        viewport.set_transform(50.0, 100.0, 2.0);
        let scene = viewport.screen_to_scene(Point::new(150.0, 300.0));
        assert!(approx(scene.x, 50.0));
        assert!(approx(scene.y, 100.0));
        let back = viewport.scene_to_screen(scene);
        assert!(approx(back.x, 150.0) && approx(back.y, 300.0));
    }

    #[test]
    fn test_scale_clamped_on_every_mutation() {
        let mut viewport = Viewport::new(0.5, 4.0);
        viewport.set_transform(0.0, 0.0, 100.0);
        assert!(approx(viewport.scale(), 4.0));
        viewport.zoom_at(Point::ZERO, 0.0001);
        assert!(approx(viewport.scale(), 0.5));
        for _ in 0..50 {
            viewport.zoom_in(0.5);
        }
        assert!(approx(viewport.scale(), 4.0));
        viewport.fit_to_content(Rect::new(0.0, 0.0, 1e9, 1e9), 0.9);
        assert!(approx(viewport.scale(), 0.5));
    }

    #[test]
    fn test_zoom_in_out_are_inverse() {
        let mut viewport = Viewport::default();
        viewport.pan(Vec2::new(13.0, -7.0));
        let before = viewport.clone();
        viewport.zoom_in(0.2);
        assert!(viewport.scale() > before.scale());
        viewport.zoom_out(0.2);
        assert!(approx(viewport.scale(), before.scale()));
        assert!(approx(viewport.offset.x, before.offset.x));
        assert!(approx(viewport.offset.y, before.offset.y));
    }

    #[test]
    fn test_zoom_keeps_centre_fixed() {
        let mut viewport = Viewport::default();
        viewport.set_container(Size::new(400.0, 200.0));
        let centre_scene = viewport.screen_to_scene(Point::new(200.0, 100.0));
        viewport.zoom_in(1.0);
        let after = viewport.scene_to_screen(centre_scene);
        assert!(approx(after.x, 200.0) && approx(after.y, 100.0));
    }

    #[test]
    fn test_fit_to_content_centres() {
        let mut viewport = Viewport::default();
        viewport.set_container(Size::new(1000.0, 500.0));
        let bounds = Rect::new(100.0, 100.0, 300.0, 200.0);
        viewport.fit_to_content(bounds, 0.9);
        // 900/200 = 4.5, 450/100 = 4.5
        assert!(approx(viewport.scale(), 4.5));
        let c = viewport.scene_to_screen(bounds.center());
        assert!(approx(c.x, 500.0) && approx(c.y, 250.0));
        let visible = viewport.visible_scene_rect();
        assert!(visible.contains(Point::new(100.5, 100.5)));
        assert!(visible.contains(Point::new(299.5, 199.5)));
    }

    #[test]
    fn test_center_on() {
        let mut viewport = Viewport::default();
        viewport.set_container(Size::new(200.0, 200.0));
        viewport.set_transform(0.0, 0.0, 2.0);
        viewport.center_on(Point::new(500.0, -40.0));
        let c = viewport.scene_to_screen(Point::new(500.0, -40.0));
        assert!(approx(c.x, 100.0) && approx(c.y, 100.0));
        assert!(approx(viewport.scale(), 2.0));
    }

    #[test]
    fn test_reset() {
        let mut viewport = Viewport::default();
        viewport.set_transform(10.0, 10.0, 3.0);
        viewport.reset();
        assert_eq!(viewport.offset, Vec2::ZERO);
        assert!(approx(viewport.scale(), 1.0));
    }
}
