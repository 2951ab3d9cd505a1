use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use ember_render::{
    Animation, AnimationSet, AssetError, Renderer2D, SpriteAtlas, Texture, TextureFilter,
};
use image::{Rgba, RgbaImage};

/// Edge length of one procedural atlas cell, in pixels.
pub const CELL: u32 = 16;

const TILE_NAMES: [&str; 3] = ["grass", "stone", "water"];
const HERO_NAMES: [&str; 5] = ["hero_idle_0", "hero_idle_1", "hero_walk_0", "hero_walk_1", "hero_walk_2"];

/// Atlas and animation library shared by the demo scenes.
#[derive(Clone)]
pub struct DemoAssets {
    pub atlas: Arc<SpriteAtlas>,
    pub animations: Arc<AnimationSet>,
}

impl DemoAssets {
    /// Load `atlas.json` and `animations.json` from `dir`, or build the
    /// procedural set when no directory is given.
    pub fn load(renderer: &mut Renderer2D, dir: Option<&Path>) -> anyhow::Result<Self> {
        let Some(dir) = dir else {
            tracing::info!("no asset directory, using procedural atlas");
            return Ok(Self {
                atlas: Arc::new(procedural_atlas(renderer)?),
                animations: Arc::new(default_animations()),
            });
        };

        let atlas = SpriteAtlas::load(dir.join("atlas.json"), |path| load_png(renderer, path))
            .with_context(|| format!("loading atlas from {}", dir.display()))?;
        let animations = AnimationSet::load(dir.join("animations.json"))
            .with_context(|| format!("loading animations from {}", dir.display()))?;

        for animation in animations.iter() {
            for frame in &animation.frames {
                if !atlas.contains(&frame.sprite) {
                    tracing::warn!(
                        animation = %animation.name,
                        sprite = %frame.sprite,
                        "animation frame has no atlas sprite"
                    );
                }
            }
        }

        Ok(Self {
            atlas: Arc::new(atlas),
            animations: Arc::new(animations),
        })
    }
}

/// Decode an image file to RGBA8 rows ordered bottom row first.
pub fn decode_rgba(path: &Path) -> Result<(u32, u32, Vec<u8>), AssetError> {
    let image = image::open(path)
        .map_err(|e| AssetError::Texture(format!("{}: {e}", path.display())))?
        .flipv()
        .into_rgba8();
    let (width, height) = image.dimensions();
    Ok((width, height, image.into_raw()))
}

pub fn load_png(renderer: &mut Renderer2D, path: &Path) -> Result<Texture, AssetError> {
    let (width, height, pixels) = decode_rgba(path)?;
    let texture = renderer.create_texture(width, height, &pixels, TextureFilter::Nearest)?;
    tracing::debug!(path = %path.display(), width, height, "texture loaded");
    Ok(texture)
}

/// One row of cells: terrain tiles followed by hero frames.
fn procedural_image() -> RgbaImage {
    let cells = (TILE_NAMES.len() + HERO_NAMES.len()) as u32;
    RgbaImage::from_fn(cells * CELL, CELL, |x, y| {
        let cell = (x / CELL) as usize;
        let (lx, ly) = (x % CELL, y % CELL);
        match cell {
            0 => checker(lx, ly, [70, 150, 60], [60, 130, 50]),
            1 => checker(lx, ly, [120, 120, 128], [100, 100, 110]),
            2 => checker(lx, ly, [40, 90, 190], [50, 110, 210]),
            n => hero_pixel(lx, ly, n - TILE_NAMES.len()),
        }
    })
}

pub fn procedural_atlas(renderer: &mut Renderer2D) -> Result<SpriteAtlas, AssetError> {
    let image = image::imageops::flip_vertical(&procedural_image());
    let (width, height) = image.dimensions();
    let texture = renderer.create_texture(width, height, image.as_raw(), TextureFilter::Nearest)?;

    let mut atlas = SpriteAtlas::new(texture);
    for (i, name) in TILE_NAMES.iter().chain(HERO_NAMES.iter()).enumerate() {
        atlas.add_sprite(*name, i as u32 * CELL, 0, CELL, CELL);
    }
    Ok(atlas)
}

pub fn default_animations() -> AnimationSet {
    let mut set = AnimationSet::new();
    let idle = Animation::new("idle").with_frames(["hero_idle_0", "hero_idle_1"], 0.4);
    let walk = Animation::new("walk").with_frames(["hero_walk_0", "hero_walk_1", "hero_walk_2"], 0.12);
    for animation in [idle, walk] {
        if let Err(e) = set.insert(animation) {
            tracing::warn!(error = %e, "skipping built-in animation");
        }
    }
    set
}

fn checker(x: u32, y: u32, a: [u8; 3], b: [u8; 3]) -> Rgba<u8> {
    let [r, g, bl] = if (x / 4 + y / 4) % 2 == 0 { a } else { b };
    Rgba([r, g, bl, 255])
}

/// A small figure whose legs shift with the frame number.
fn hero_pixel(x: u32, y: u32, frame: usize) -> Rgba<u8> {
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);
    let body = Rgba([220, 90, 60, 255]);
    let head = Rgba([250, 210, 170, 255]);
    let legs = Rgba([50, 50, 80, 255]);

    let stride = (frame % 3) as u32;
    match y {
        2..=5 if (6..=9).contains(&x) => head,
        6..=11 if (5..=10).contains(&x) => body,
        12..=15 if x == 5 + stride || x == 10 - stride => legs,
        _ => CLEAR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_render::{RecordingDevice, RendererConfig};

    fn renderer() -> Renderer2D {
        let mut renderer = Renderer2D::new(Box::new(RecordingDevice::new()), RendererConfig::default());
        renderer.init().unwrap();
        renderer
    }

    #[test]
    fn procedural_atlas_defines_every_sprite() {
        let mut renderer = renderer();
        let atlas = procedural_atlas(&mut renderer).unwrap();
        assert_eq!(atlas.len(), TILE_NAMES.len() + HERO_NAMES.len());
        assert_eq!(atlas.texture().height, CELL);
        let grass = atlas.sprite("grass").unwrap();
        assert_eq!(grass.pixel_width, CELL);
        assert_eq!(grass.uv.min.x, 0.0);
    }

    #[test]
    fn built_in_animations_use_atlas_sprites() {
        let mut renderer = renderer();
        let atlas = procedural_atlas(&mut renderer).unwrap();
        let animations = default_animations();
        assert!(animations.contains("idle"));
        assert!(animations.contains("walk"));
        for animation in animations.iter() {
            for frame in &animation.frames {
                assert!(atlas.contains(&frame.sprite), "{}", frame.sprite);
            }
        }
    }

    #[test]
    fn decoded_rows_are_bottom_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strip.png");
        let mut image = RgbaImage::new(1, 2);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        image.save(&path).unwrap();

        let (w, h, pixels) = decode_rgba(&path).unwrap();
        assert_eq!((w, h), (1, 2));
        assert_eq!(&pixels[..4], &[0, 0, 255, 255]);
        assert_eq!(&pixels[4..], &[255, 0, 0, 255]);
    }

    #[test]
    fn load_reads_descriptor_directory() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::new(32, 16).save(dir.path().join("sheet.png")).unwrap();
        std::fs::write(
            dir.path().join("atlas.json"),
            r#"{"texture":"sheet.png","sprites":{"a":{"x":0,"y":0,"w":16,"h":16}}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("animations.json"),
            r#"{"animations":{"spin":{"frames":[{"sprite":"a"}]}}}"#,
        )
        .unwrap();

        let mut renderer = renderer();
        let assets = DemoAssets::load(&mut renderer, Some(dir.path())).unwrap();
        assert!(assets.atlas.contains("a"));
        assert_eq!(assets.atlas.texture().width, 32);
        assert!(assets.animations.contains("spin"));
    }

    #[test]
    fn missing_image_is_an_error() {
        let mut renderer = renderer();
        let err = load_png(&mut renderer, Path::new("/nonexistent/sheet.png")).unwrap_err();
        assert!(matches!(err, AssetError::Texture(_)));
    }
}
