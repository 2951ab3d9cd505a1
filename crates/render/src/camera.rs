use glam::{Mat4, Vec2};

/// 2D orthographic camera with optional smooth follow and pixel snapping.
///
/// World space is Y-up with the camera position at the view center. Screen
/// space is in viewport pixels with the origin at the top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera2D {
    position: Vec2,
    target: Vec2,
    zoom: f32,
    viewport: Vec2,
    smoothing: bool,
    smooth_speed: f32,
    pixel_snap: bool,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl Camera2D {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            target: Vec2::ZERO,
            zoom: 1.0,
            viewport: Vec2::new(viewport_width, viewport_height),
            smoothing: false,
            smooth_speed: 5.0,
            pixel_snap: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.viewport
    }

    pub fn smoothing(&self) -> bool {
        self.smoothing
    }

    pub fn smooth_speed(&self) -> f32 {
        self.smooth_speed
    }

    pub fn pixel_snap(&self) -> bool {
        self.pixel_snap
    }

    /// Move the camera immediately. Also moves the target so smoothing does
    /// not pull it back.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.target = position;
    }

    /// Set the follow target. Without smoothing the camera snaps to it.
    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
        if !self.smoothing {
            self.position = target;
        }
    }

    /// Shift position and target together.
    pub fn translate(&mut self, delta: Vec2) {
        self.set_position(self.position + delta);
    }

    /// Shift only the target.
    pub fn move_target(&mut self, delta: Vec2) {
        self.set_target(self.target + delta);
    }

    /// Set the zoom factor. Non-positive values are rejected.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom > 0.0 && zoom.is_finite() {
            self.zoom = zoom;
        } else {
            tracing::warn!(zoom, "ignoring non-positive camera zoom");
        }
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }

    pub fn set_smoothing(&mut self, enabled: bool) {
        self.smoothing = enabled;
    }

    pub fn set_smooth_speed(&mut self, speed: f32) {
        self.smooth_speed = speed;
    }

    pub fn set_pixel_snap(&mut self, enabled: bool) {
        self.pixel_snap = enabled;
    }

    /// Advance smooth follow by `dt` seconds.
    ///
    /// Easing is exponential and frame-rate independent:
    /// `t = 1 - exp(-speed * dt)`.
    pub fn update(&mut self, dt: f32) {
        if !self.smoothing || self.smooth_speed <= 0.0 {
            self.position = self.target;
            return;
        }
        let t = 1.0 - (-self.smooth_speed * dt).exp();
        self.position = self.position.lerp(self.target, t);
    }

    /// Position used for rendering: floored per component when pixel snap is on.
    pub fn render_position(&self) -> Vec2 {
        if self.pixel_snap {
            self.position.floor()
        } else {
            self.position
        }
    }

    /// Half of the visible world extent on each axis.
    pub fn half_extents(&self) -> Vec2 {
        self.viewport * 0.5 / self.zoom
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let half = self.half_extents();
        Mat4::orthographic_rh_gl(-half.x, half.x, -half.y, half.y, -1.0, 1.0)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(-self.render_position().extend(0.0))
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let half_viewport = self.viewport * 0.5;
        let offset = Vec2::new(screen.x - half_viewport.x, half_viewport.y - screen.y);
        offset / self.zoom + self.render_position()
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let half_viewport = self.viewport * 0.5;
        let offset = (world - self.render_position()) * self.zoom;
        Vec2::new(half_viewport.x + offset.x, half_viewport.y - offset.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn default_camera() {
        let cam = Camera2D::default();
        assert_eq!(cam.position(), Vec2::ZERO);
        assert_eq!(cam.zoom(), 1.0);
        assert_eq!(cam.viewport_size(), Vec2::new(800.0, 600.0));
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn smoothing_approaches_without_reaching() {
        let mut cam = Camera2D::new(800.0, 600.0);
        cam.set_smoothing(true);
        cam.set_smooth_speed(5.0);
        cam.set_target(Vec2::new(100.0, -50.0));
        assert_eq!(cam.position(), Vec2::ZERO);

        cam.update(1.0);
        let p = cam.position();
        let target = cam.target();
        assert_ne!(p, target);
        assert!(p.distance(target) < target.length());
        assert!(p.x > 0.0 && p.x < 100.0);
        assert!(p.y < 0.0 && p.y > -50.0);
    }

    #[test]
    fn smoothing_at_target_stays_put() {
        let mut cam = Camera2D::new(800.0, 600.0);
        cam.set_smoothing(true);
        cam.set_position(Vec2::new(3.0, 4.0));
        cam.update(1.0);
        assert_eq!(cam.position(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn disabled_smoothing_snaps() {
        let mut cam = Camera2D::new(800.0, 600.0);
        cam.set_target(Vec2::new(7.0, 9.0));
        assert_eq!(cam.position(), Vec2::new(7.0, 9.0));

        cam.move_target(Vec2::new(1.0, 0.0));
        cam.update(0.001);
        assert_eq!(cam.position(), cam.target());
    }

    #[test]
    fn zero_speed_snaps_even_when_smoothing() {
        let mut cam = Camera2D::new(800.0, 600.0);
        cam.set_smoothing(true);
        cam.set_smooth_speed(0.0);
        cam.set_target(Vec2::new(5.0, 5.0));
        cam.update(0.016);
        assert_eq!(cam.position(), Vec2::new(5.0, 5.0));
    }

    #[test]
    fn set_position_moves_target() {
        let mut cam = Camera2D::new(800.0, 600.0);
        cam.set_smoothing(true);
        cam.set_position(Vec2::new(10.0, 10.0));
        cam.update(0.5);
        assert_eq!(cam.position(), Vec2::new(10.0, 10.0));
        assert_eq!(cam.target(), Vec2::new(10.0, 10.0));

        cam.translate(Vec2::new(-2.0, 1.0));
        assert_eq!(cam.target(), Vec2::new(8.0, 11.0));
    }

    #[test]
    fn rejects_non_positive_zoom() {
        let mut cam = Camera2D::default();
        cam.set_zoom(2.0);
        cam.set_zoom(0.0);
        cam.set_zoom(-1.0);
        assert_eq!(cam.zoom(), 2.0);
    }

    #[test]
    fn view_projection_maps_viewport_edges_to_ndc() {
        let mut cam = Camera2D::new(800.0, 600.0);
        cam.set_position(Vec2::new(100.0, 50.0));
        cam.set_zoom(2.0);
        let vp = cam.view_projection();

        // half extents are 200 x 150 at zoom 2
        let right_top = vp * Vec4::new(300.0, 200.0, 0.0, 1.0);
        assert!(right_top.truncate().abs_diff_eq(glam::Vec3::new(1.0, 1.0, 0.0), 1e-5));
        let center = vp * Vec4::new(100.0, 50.0, 0.0, 1.0);
        assert!(center.truncate().abs_diff_eq(glam::Vec3::ZERO, 1e-5));
    }

    #[test]
    fn pixel_snap_only_affects_rendering() {
        let mut cam = Camera2D::new(800.0, 600.0);
        cam.set_pixel_snap(true);
        cam.set_position(Vec2::new(10.7, -3.2));
        assert_eq!(cam.position(), Vec2::new(10.7, -3.2));
        assert_eq!(cam.render_position(), Vec2::new(10.0, -4.0));
        assert_eq!(
            cam.view_matrix(),
            Mat4::from_translation(glam::Vec3::new(-10.0, 4.0, 0.0))
        );
    }

    #[test]
    fn screen_center_is_camera_position() {
        let mut cam = Camera2D::new(800.0, 600.0);
        cam.set_position(Vec2::new(40.0, -20.0));
        assert_eq!(cam.screen_to_world(Vec2::new(400.0, 300.0)), Vec2::new(40.0, -20.0));
        // screen top-left is world up-left
        let top_left = cam.screen_to_world(Vec2::ZERO);
        assert_eq!(top_left, Vec2::new(40.0 - 400.0, -20.0 + 300.0));
    }

    #[test]
    fn screen_world_round_trip() {
        let mut cam = Camera2D::new(1280.0, 720.0);
        cam.set_position(Vec2::new(-33.25, 812.5));
        for zoom in [0.25, 1.0, 3.5] {
            cam.set_zoom(zoom);
            for p in [
                Vec2::ZERO,
                Vec2::new(123.4, -56.7),
                Vec2::new(-1000.0, 2500.0),
            ] {
                let back = cam.screen_to_world(cam.world_to_screen(p));
                assert!(back.abs_diff_eq(p, 1e-3), "{p} -> {back} at zoom {zoom}");
            }
        }
    }

    #[test]
    fn round_trip_with_pixel_snap() {
        let mut cam = Camera2D::new(640.0, 480.0);
        cam.set_pixel_snap(true);
        cam.set_position(Vec2::new(5.5, 5.5));
        let p = Vec2::new(17.0, -3.0);
        assert!(cam.screen_to_world(cam.world_to_screen(p)).abs_diff_eq(p, 1e-4));
    }
}
