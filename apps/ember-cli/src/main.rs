use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use ember_common::Color;
use ember_render::{
    AnimationSet, AssetError, Camera2D, FrameStats, Quad, RecordingDevice, Renderer2D,
    RendererConfig, SpriteAtlas, Texture, TextureFilter,
};
use glam::Vec2;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ember-cli", about = "Asset checks and batching bench for ember")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Load a sprite atlas descriptor and list its sprites
    CheckAtlas {
        /// Path to the atlas JSON
        path: PathBuf,
    },
    /// Load an animation descriptor and list its animations
    CheckAnimations {
        /// Path to the animations JSON
        path: PathBuf,
        /// Atlas to cross-check frame sprites against
        #[arg(long)]
        atlas: Option<PathBuf>,
    },
    /// Batch quads through a recording device and report flushes
    Bench {
        /// Quads to submit
        #[arg(short, long, default_value = "25000")]
        quads: usize,
        /// Distinct textures to cycle through
        #[arg(short, long, default_value = "4")]
        textures: usize,
        /// Quads per batch
        #[arg(long, default_value_t = ember_render::MAX_QUADS)]
        max_quads: usize,
        /// Print the frame statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("ember-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", ember_common::crate_info());
            println!("input: {}", ember_input::crate_info());
            println!("render: {}", ember_render::crate_info());
            println!("render-wgpu: {}", ember_render_wgpu::crate_info());
            println!("scene: {}", ember_scene::crate_info());
            println!(
                "batch: {} quads, {} texture slots",
                ember_render::MAX_QUADS,
                ember_render::MAX_TEXTURE_SLOTS
            );
        }
        Commands::CheckAtlas { path } => {
            let mut renderer = headless(RendererConfig::default())?;
            let atlas = load_atlas(&mut renderer, &path)?;
            let texture = atlas.texture();
            println!(
                "Atlas {}: texture {}x{}, {} sprites",
                path.display(),
                texture.width,
                texture.height,
                atlas.len()
            );
            for name in atlas.names() {
                if let Some(sprite) = atlas.sprite(name) {
                    println!(
                        "  {name}: {}x{} uv=({:.4}, {:.4})..({:.4}, {:.4})",
                        sprite.pixel_width,
                        sprite.pixel_height,
                        sprite.uv.min.x,
                        sprite.uv.min.y,
                        sprite.uv.max.x,
                        sprite.uv.max.y
                    );
                }
            }
        }
        Commands::CheckAnimations { path, atlas } => {
            let set = AnimationSet::load(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            let atlas = match atlas {
                Some(atlas_path) => {
                    let mut renderer = headless(RendererConfig::default())?;
                    Some(load_atlas(&mut renderer, &atlas_path)?)
                }
                None => None,
            };

            println!("Animations {}: {}", path.display(), set.len());
            let mut missing = 0;
            for animation in set.iter() {
                println!(
                    "  {}: {} frames, {:.3}s, {}",
                    animation.name,
                    animation.len(),
                    animation.total_duration(),
                    if animation.looping { "loop" } else { "once" }
                );
                let Some(atlas) = &atlas else {
                    continue;
                };
                for frame in &animation.frames {
                    if !atlas.contains(&frame.sprite) {
                        println!("    missing sprite: {}", frame.sprite);
                        missing += 1;
                    }
                }
            }
            if missing > 0 {
                anyhow::bail!("{missing} frame(s) reference sprites absent from the atlas");
            }
        }
        Commands::Bench {
            quads,
            textures,
            max_quads,
            json,
        } => {
            let config = RendererConfig {
                max_quads,
                ..RendererConfig::default()
            };
            let report = bench(config, quads, textures)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report.stats)?);
                return Ok(());
            }
            println!(
                "Submitted {quads} quads over {textures} textures (batch {}):",
                report.max_quads
            );
            println!(
                "  draw calls={}, texture flushes={}, capacity flushes={}",
                report.stats.draw_calls, report.stats.texture_flushes, report.stats.capacity_flushes
            );
            println!(
                "  recorded quads={}, elapsed={:.3}ms",
                report.recorded_quads,
                report.elapsed.as_secs_f64() * 1000.0
            );
        }
    }

    Ok(())
}

fn headless(config: RendererConfig) -> anyhow::Result<Renderer2D> {
    let mut renderer = Renderer2D::new(Box::new(RecordingDevice::new()), config);
    renderer.init().context("initializing headless renderer")?;
    tracing::debug!(backend = renderer.backend_name(), "headless renderer ready");
    Ok(renderer)
}

fn load_atlas(renderer: &mut Renderer2D, path: &Path) -> anyhow::Result<SpriteAtlas> {
    SpriteAtlas::load(path, |texture| image_texture(renderer, texture))
        .with_context(|| format!("loading {}", path.display()))
}

/// Registers a texture sized from the image header. Pixel data is not needed
/// by the recording device, so a flat buffer stands in for it.
fn image_texture(renderer: &mut Renderer2D, path: &Path) -> Result<Texture, AssetError> {
    let (width, height) = image::image_dimensions(path)
        .map_err(|e| AssetError::Texture(format!("{}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), width, height, "atlas image probed");
    let pixels = vec![255u8; width as usize * height as usize * 4];
    Ok(renderer.create_texture(width, height, &pixels, TextureFilter::Nearest)?)
}

struct BenchReport {
    max_quads: usize,
    stats: FrameStats,
    recorded_quads: usize,
    elapsed: std::time::Duration,
}

/// One frame of `quads` quads, cycling through `textures` textures.
fn bench(config: RendererConfig, quads: usize, textures: usize) -> anyhow::Result<BenchReport> {
    let device = RecordingDevice::new();
    let log = device.log();
    let mut renderer = Renderer2D::new(Box::new(device), config);
    renderer.init()?;
    let max_quads = renderer.config().max_quads;

    let pool = (0..textures)
        .map(|i| {
            let shade = (i * 37 % 256) as u8;
            renderer.create_texture(1, 1, &[shade, shade, shade, 255], TextureFilter::Nearest)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let camera = Camera2D::new(1280.0, 720.0);
    let start = std::time::Instant::now();
    renderer.begin_frame(&camera);
    for i in 0..quads {
        let position = Vec2::new((i % 100) as f32 * 12.0, (i / 100 % 60) as f32 * 12.0);
        let mut quad = Quad::new(position, Vec2::splat(10.0)).tint(Color::WHITE);
        if !pool.is_empty() {
            quad = quad.texture(pool[i % pool.len()]);
        }
        renderer.draw_quad(&quad);
    }
    renderer.end_frame();
    let elapsed = start.elapsed();
    let stats = renderer.stats();
    tracing::debug!(?stats, ?elapsed, "bench frame submitted");
    renderer.present();

    let recorded_quads = log.draws().iter().map(|d| d.quad_count()).sum();
    renderer.shutdown();
    Ok(BenchReport {
        max_quads,
        stats,
        recorded_quads,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bench_splits_on_capacity() {
        let config = RendererConfig {
            max_quads: 100,
            ..RendererConfig::default()
        };
        let report = bench(config, 250, 1).unwrap();
        assert_eq!(report.recorded_quads, 250);
        assert_eq!(report.stats.draw_calls, 3);
        assert_eq!(report.stats.capacity_flushes, 2);
        assert_eq!(report.stats.texture_flushes, 0);
    }

    #[test]
    fn bench_splits_on_texture_slots() {
        // 15 slots after the white default; 20 textures overflow once.
        let report = bench(RendererConfig::default(), 20, 20).unwrap();
        assert_eq!(report.recorded_quads, 20);
        assert_eq!(report.stats.draw_calls, 2);
        assert_eq!(report.stats.texture_flushes, 1);
    }

    #[test]
    fn bench_without_textures_uses_white() {
        let report = bench(RendererConfig::default(), 10, 0).unwrap();
        assert_eq!(report.stats.draw_calls, 1);
        assert_eq!(report.recorded_quads, 10);
    }

    #[test]
    fn atlas_texture_sized_from_image() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbaImage::new(64, 32)
            .save(dir.path().join("sheet.png"))
            .unwrap();
        let path = dir.path().join("atlas.json");
        std::fs::write(
            &path,
            r#"{"texture":"sheet.png","sprites":{"a":{"x":0,"y":0,"w":32,"h":32}}}"#,
        )
        .unwrap();

        let mut renderer = headless(RendererConfig::default()).unwrap();
        let atlas = load_atlas(&mut renderer, &path).unwrap();
        assert_eq!((atlas.texture().width, atlas.texture().height), (64, 32));
        let sprite = atlas.sprite("a").unwrap();
        assert_eq!(sprite.uv.max.x, 0.5);
    }
}
