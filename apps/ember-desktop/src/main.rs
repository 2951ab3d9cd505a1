mod assets;
mod demo;
mod keymap;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ember_render::{Camera2D, Renderer2D, RendererConfig};
use ember_render_wgpu::WgpuDevice;
use ember_scene::{FramePacer, Runtime, RuntimeConfig};
use glam::Vec2;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::assets::DemoAssets;
use crate::demo::GameScene;

/// Pixels of touchpad scroll that count as one wheel notch.
const PIXELS_PER_LINE: f32 = 40.0;

#[derive(Parser)]
#[command(name = "ember-desktop", about = "Ember 2D runtime demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Window width in pixels
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value = "720")]
    height: u32,

    /// Frame rate cap, 0 for uncapped
    #[arg(long, default_value = "60")]
    fps: u32,

    /// Directory holding atlas.json and animations.json
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Quads per batch before a flush
    #[arg(long, default_value_t = ember_render::MAX_QUADS)]
    max_quads: usize,
}

struct App {
    cli: Cli,
    window: Option<Arc<Window>>,
    runtime: Option<Runtime>,
    pacer: FramePacer,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(cli: Cli) -> Self {
        let pacer = FramePacer::new(&RuntimeConfig {
            target_fps: cli.fps,
            ..RuntimeConfig::default()
        });
        Self {
            cli,
            window: None,
            runtime: None,
            pacer,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Ember")
            .with_inner_size(PhysicalSize::new(self.cli.width, self.cli.height));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);
        let size = window.inner_size();

        let device = WgpuDevice::new(window.clone(), size.width, size.height)?;
        let mut renderer = Renderer2D::new(
            Box::new(device),
            RendererConfig {
                max_quads: self.cli.max_quads,
                ..RendererConfig::default()
            },
        );
        renderer.init()?;

        let assets = DemoAssets::load(&mut renderer, self.cli.assets.as_deref())?;

        let mut camera = Camera2D::new(size.width.max(1) as f32, size.height.max(1) as f32);
        camera.set_smoothing(true);
        camera.set_pixel_snap(true);

        let mut runtime = Runtime::new(renderer, camera);
        runtime.scenes.push_scene(Box::new(GameScene::new(assets)));

        tracing::info!(
            backend = runtime.renderer.backend_name(),
            width = size.width,
            height = size.height,
            "runtime started"
        );
        self.window = Some(window);
        self.runtime = Some(runtime);
        Ok(())
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(runtime) = &mut self.runtime {
            runtime.shutdown();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            tracing::error!("startup failed: {e:#}");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(runtime) = &mut self.runtime else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.stop(event_loop);
            }
            WindowEvent::Resized(new_size) => {
                runtime.resize(new_size.width.max(1), new_size.height.max(1));
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(key) = keymap::map_key(code) {
                    match state {
                        ElementState::Pressed => runtime.input.press(key),
                        ElementState::Released => runtime.input.release(key),
                    }
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                runtime
                    .input
                    .set_mouse_button(keymap::map_button(button), state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let screen = Vec2::new(position.x as f32, position.y as f32);
                runtime.input.set_mouse_position(screen);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(x, y),
                    MouseScrollDelta::PixelDelta(p) => {
                        Vec2::new(p.x as f32, p.y as f32) / PIXELS_PER_LINE
                    }
                };
                runtime.input.add_scroll(delta);
            }
            WindowEvent::Focused(false) => {
                runtime.input.reset();
            }
            WindowEvent::RedrawRequested => {
                let dt = self.pacer.tick();
                runtime.frame(dt);
                if runtime.should_quit() {
                    self.stop(event_loop);
                    return;
                }
                self.pacer.sleep_remainder();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("ember-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(cli);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
