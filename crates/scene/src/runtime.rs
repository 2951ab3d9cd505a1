use std::time::{Duration, Instant};

use ember_input::Input;
use ember_render::{Camera2D, Renderer2D};

use crate::scene::UpdateContext;
use crate::stack::SceneStack;

/// Frame loop settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeConfig {
    /// Frames per second to pace to. 0 disables pacing.
    pub target_fps: u32,
    /// Upper bound on the delta handed to `update`, in seconds.
    pub max_frame_dt: f32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            max_frame_dt: 0.1,
        }
    }
}

/// Owns everything a frame touches. The platform layer feeds events into
/// [`Runtime::input`] and calls [`Runtime::frame`] once per redraw.
pub struct Runtime {
    pub renderer: Renderer2D,
    pub camera: Camera2D,
    pub scenes: SceneStack,
    pub input: Input,
    quit: bool,
}

impl Runtime {
    pub fn new(renderer: Renderer2D, camera: Camera2D) -> Self {
        Self {
            renderer,
            camera,
            scenes: SceneStack::new(),
            input: Input::new(),
            quit: false,
        }
    }

    /// Scene logic, then camera follow.
    pub fn update(&mut self, dt: f32) {
        let mut ctx = UpdateContext::new(dt, &self.input, &mut self.camera);
        self.scenes.update(&mut ctx);
        if ctx.quit_requested() {
            tracing::info!("quit requested by scene");
            self.quit = true;
        }
        self.camera.update(dt);
    }

    /// Draw the active scene and present.
    pub fn render(&mut self) {
        self.renderer.begin_frame(&self.camera);
        self.scenes.render(&mut self.renderer);
        self.renderer.end_frame();
        self.renderer.present();
    }

    /// One full frame: update, roll input edge state, render.
    pub fn frame(&mut self, dt: f32) {
        self.update(dt);
        self.input.end_frame();
        self.render();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport_size(width as f32, height as f32);
        self.renderer.resize(width, height);
    }

    /// True once a scene asked to quit or the last scene left the stack.
    pub fn should_quit(&self) -> bool {
        self.quit || (self.scenes.is_empty() && !self.scenes.has_pending())
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    /// Exit all scenes, then release the renderer.
    pub fn shutdown(&mut self) {
        self.scenes.clear();
        self.renderer.shutdown();
    }
}

/// Measures frame deltas and sleeps off the rest of each target interval.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Option<Duration>,
    max_dt: f32,
    last: Instant,
}

impl FramePacer {
    pub fn new(config: &RuntimeConfig) -> Self {
        let interval = (config.target_fps > 0)
            .then(|| Duration::from_secs_f64(1.0 / config.target_fps as f64));
        Self {
            interval,
            max_dt: config.max_frame_dt,
            last: Instant::now(),
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Seconds since the previous tick, clamped to `max_frame_dt`.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = clamp_dt(now - self.last, self.max_dt);
        self.last = now;
        dt
    }

    /// Time left in the current interval, measured from the last tick.
    pub fn remaining(&self) -> Duration {
        match self.interval {
            Some(interval) => interval.saturating_sub(self.last.elapsed()),
            None => Duration::ZERO,
        }
    }

    pub fn sleep_remainder(&self) {
        let remaining = self.remaining();
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }
}

/// Convert an elapsed duration to seconds, capped at `max_dt`.
pub fn clamp_dt(elapsed: Duration, max_dt: f32) -> f32 {
    elapsed.as_secs_f32().min(max_dt.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Scene, Transitions};
    use ember_common::Color;
    use ember_input::Key;
    use ember_render::{RecordingDevice, RecordingLog, RendererConfig};
    use glam::Vec2;

    /// Draws one rect, follows a target and quits on Escape.
    struct Walker {
        position: Vec2,
    }

    impl Scene for Walker {
        fn update(&mut self, ctx: &mut UpdateContext<'_>, _transitions: &mut Transitions) {
            self.position.x += ctx.input.axis(Key::Left, Key::Right) * 100.0 * ctx.dt;
            ctx.camera.set_target(self.position);
            if ctx.input.just_pressed(Key::Escape) {
                ctx.request_quit();
            }
        }

        fn render(&mut self, renderer: &mut Renderer2D) {
            renderer.draw_rect(self.position, Vec2::splat(16.0), Color::GREEN);
        }
    }

    fn runtime() -> (Runtime, RecordingLog) {
        let device = RecordingDevice::new();
        let log = device.log();
        let mut renderer = Renderer2D::new(Box::new(device), RendererConfig::default());
        renderer.init().unwrap();
        let mut runtime = Runtime::new(renderer, Camera2D::new(320.0, 240.0));
        runtime.scenes.push_scene(Box::new(Walker {
            position: Vec2::ZERO,
        }));
        (runtime, log)
    }

    #[test]
    fn frame_updates_then_draws() {
        let (mut rt, log) = runtime();
        rt.input.press(Key::Right);
        rt.frame(0.5);

        assert_eq!(rt.camera.position(), Vec2::new(50.0, 0.0));
        let draws = log.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].quad_count(), 1);
        assert_eq!(draws[0].view_proj, Some(rt.camera.view_projection()));
        assert_eq!(log.state().frames_presented, 1);
    }

    #[test]
    fn camera_smoothing_runs_after_scene() {
        let (mut rt, _log) = runtime();
        rt.camera.set_smoothing(true);
        rt.input.press(Key::Right);
        rt.update(1.0);
        let p = rt.camera.position();
        assert!(p.x > 0.0 && p.x < 100.0);
    }

    #[test]
    fn escape_requests_quit() {
        let (mut rt, _log) = runtime();
        rt.frame(0.016);
        assert!(!rt.should_quit());
        rt.input.press(Key::Escape);
        rt.frame(0.016);
        assert!(rt.should_quit());
    }

    #[test]
    fn empty_stack_quits_only_after_commit() {
        let (mut rt, _log) = runtime();
        assert!(!rt.should_quit());
        rt.frame(0.016);
        rt.scenes.pop_scene();
        assert!(!rt.should_quit());
        rt.frame(0.016);
        assert!(rt.scenes.is_empty());
        assert!(rt.should_quit());
    }

    #[test]
    fn shutdown_clears_scenes_and_renderer() {
        let (mut rt, log) = runtime();
        rt.frame(0.016);
        rt.shutdown();
        assert!(rt.scenes.is_empty());
        assert!(!rt.renderer.is_initialized());
        rt.frame(0.016);
        assert_eq!(log.draw_count(), 1);
    }

    #[test]
    fn resize_updates_viewport() {
        let (mut rt, log) = runtime();
        rt.resize(1024, 768);
        assert_eq!(rt.camera.viewport_size(), Vec2::new(1024.0, 768.0));
        assert_eq!(log.state().resizes, vec![(1024, 768)]);
    }

    #[test]
    fn dt_is_clamped() {
        assert_eq!(clamp_dt(Duration::from_millis(500), 0.1), 0.1);
        assert_eq!(clamp_dt(Duration::from_millis(250), 1.0), 0.25);
        assert_eq!(clamp_dt(Duration::from_secs(1), -1.0), 0.0);
    }

    #[test]
    fn pacer_interval_follows_target() {
        let pacer = FramePacer::new(&RuntimeConfig::default());
        let interval = pacer.interval().unwrap();
        assert!((interval.as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
        assert!(pacer.remaining() <= interval);

        let uncapped = FramePacer::new(&RuntimeConfig {
            target_fps: 0,
            ..Default::default()
        });
        assert_eq!(uncapped.remaining(), Duration::ZERO);
    }

    #[test]
    fn tick_never_exceeds_max() {
        let mut pacer = FramePacer::new(&RuntimeConfig::default());
        let dt = pacer.tick();
        assert!((0.0..=0.1).contains(&dt));
    }
}
