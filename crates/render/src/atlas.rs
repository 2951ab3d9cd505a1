//! Named sprite regions over one texture.
//!
//! Descriptor format:
//! ```json
//! { "texture": "atlas.png",
//!   "sprites": { "player_idle": { "x": 0, "y": 0, "w": 32, "h": 32 } } }
//! ```
//! Pixel rectangles have their origin at the image's top-left. UVs are
//! V-inverted to match textures uploaded bottom row first.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::device::Texture;
use crate::error::AssetError;
use crate::quad::UvRect;

/// One atlas region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub uv: UvRect,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl Sprite {
    /// Width over height; 1.0 for a zero-height sprite.
    pub fn aspect_ratio(&self) -> f32 {
        if self.pixel_height == 0 {
            1.0
        } else {
            self.pixel_width as f32 / self.pixel_height as f32
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpriteAtlas {
    texture: Texture,
    sprites: BTreeMap<String, Sprite>,
}

impl SpriteAtlas {
    /// Empty atlas over `texture`; regions are added with [`SpriteAtlas::add_sprite`].
    pub fn new(texture: Texture) -> Self {
        Self {
            texture,
            sprites: BTreeMap::new(),
        }
    }

    /// Load a descriptor file. The texture path is resolved relative to the
    /// descriptor's directory and handed to `load_texture`.
    pub fn load<F>(path: impl AsRef<Path>, load_texture: F) -> Result<Self, AssetError>
    where
        F: FnOnce(&Path) -> Result<Texture, AssetError>,
    {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| AssetError::io(path, e))?;
        let base = path.parent().unwrap_or(Path::new(""));
        let atlas = Self::from_json_str(&data, base, load_texture)?;
        tracing::info!(path = %path.display(), sprites = atlas.len(), "sprite atlas loaded");
        Ok(atlas)
    }

    /// Parse a descriptor, resolving its texture path against `base_dir`.
    pub fn from_json_str<F>(json: &str, base_dir: &Path, load_texture: F) -> Result<Self, AssetError>
    where
        F: FnOnce(&Path) -> Result<Texture, AssetError>,
    {
        let root: Value = serde_json::from_str(json)?;
        let texture_path = root
            .get("texture")
            .and_then(Value::as_str)
            .ok_or_else(|| AssetError::Invalid("missing 'texture' string".into()))?;
        let sprites = root
            .get("sprites")
            .and_then(Value::as_object)
            .ok_or_else(|| AssetError::Invalid("missing 'sprites' object".into()))?;

        let texture = load_texture(&resolve(base_dir, texture_path))?;
        let mut atlas = Self::new(texture);

        for (name, entry) in sprites {
            let field = |key: &str| {
                entry
                    .get(key)
                    .and_then(Value::as_u64)
                    .and_then(|v| u32::try_from(v).ok())
            };
            let (Some(x), Some(y), Some(w), Some(h)) = (field("x"), field("y"), field("w"), field("h"))
            else {
                tracing::warn!(sprite = %name, "skipping sprite without valid x/y/w/h");
                continue;
            };
            if x.checked_add(w).is_none() || y.checked_add(h).is_none() {
                tracing::warn!(sprite = %name, x, y, w, h, "skipping sprite with out-of-range rectangle");
                continue;
            }
            atlas.add_sprite(name, x, y, w, h);
        }
        if atlas.is_empty() {
            tracing::warn!("sprite atlas defines no sprites");
        }
        Ok(atlas)
    }

    /// Register a pixel rectangle, replacing any sprite with the same name.
    pub fn add_sprite(&mut self, name: impl Into<String>, x: u32, y: u32, width: u32, height: u32) {
        let tex_w = self.texture.width.max(1) as f32;
        let tex_h = self.texture.height.max(1) as f32;
        let right = u64::from(x) + u64::from(width);
        let top = u64::from(y) + u64::from(height);
        let uv = UvRect::new(
            x as f32 / tex_w,
            1.0 - top as f32 / tex_h,
            right as f32 / tex_w,
            1.0 - y as f32 / tex_h,
        );
        self.sprites.insert(
            name.into(),
            Sprite {
                uv,
                pixel_width: width,
                pixel_height: height,
            },
        );
    }

    pub fn sprite(&self, name: &str) -> Option<Sprite> {
        self.sprites.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sprites.contains_key(name)
    }

    pub fn texture(&self) -> Texture {
        self.texture
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Sprite names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sprites.keys().map(String::as_str)
    }
}

fn resolve(base_dir: &Path, relative: &str) -> PathBuf {
    let path = Path::new(relative);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::TextureId;
    use std::io::Write;

    fn texture(width: u32, height: u32) -> Texture {
        Texture {
            id: TextureId(7),
            width,
            height,
        }
    }

    #[test]
    fn converts_pixels_to_inverted_uvs() {
        let mut atlas = SpriteAtlas::new(texture(128, 64));
        atlas.add_sprite("hero", 32, 0, 32, 16);
        let sprite = atlas.sprite("hero").unwrap();
        assert_eq!(sprite.uv, UvRect::new(0.25, 0.75, 0.5, 1.0));
        assert_eq!(sprite.pixel_width, 32);
        assert_eq!(sprite.aspect_ratio(), 2.0);
    }

    #[test]
    fn unknown_sprite_is_none() {
        let atlas = SpriteAtlas::new(texture(16, 16));
        assert!(atlas.sprite("nope").is_none());
        assert!(!atlas.contains("nope"));
        assert!(atlas.is_empty());
    }

    #[test]
    fn zero_height_aspect_is_one() {
        let sprite = Sprite {
            uv: UvRect::FULL,
            pixel_width: 10,
            pixel_height: 0,
        };
        assert_eq!(sprite.aspect_ratio(), 1.0);
    }

    #[test]
    fn parses_descriptor_and_skips_bad_entries() {
        let json = r#"{
            "texture": "sheet.png",
            "sprites": {
                "a": { "x": 0, "y": 0, "w": 8, "h": 8 },
                "b": { "x": 8, "y": 8, "w": 8 },
                "c": { "x": 8, "y": 0, "w": 8, "h": 8 }
            }
        }"#;
        let mut requested = PathBuf::new();
        let atlas = SpriteAtlas::from_json_str(json, Path::new("assets"), |p| {
            requested = p.to_path_buf();
            Ok(texture(16, 16))
        })
        .unwrap();

        assert_eq!(requested, Path::new("assets").join("sheet.png"));
        assert_eq!(atlas.len(), 2);
        assert_eq!(atlas.names().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(atlas.sprite("c").unwrap().uv, UvRect::new(0.5, 0.5, 1.0, 1.0));
        assert_eq!(atlas.texture().id, TextureId(7));
    }

    #[test]
    fn out_of_range_rectangles_are_skipped() {
        let json = r#"{
            "texture": "sheet.png",
            "sprites": {
                "edge": { "x": 4294967295, "y": 0, "w": 4, "h": 4 },
                "huge": { "x": 0, "y": 4294967296, "w": 4, "h": 4 },
                "negative": { "x": -1, "y": 0, "w": 4, "h": 4 },
                "ok": { "x": 0, "y": 0, "w": 8, "h": 8 }
            }
        }"#;
        let atlas = SpriteAtlas::from_json_str(json, Path::new(""), |_| Ok(texture(16, 16))).unwrap();
        assert_eq!(atlas.names().collect::<Vec<_>>(), vec!["ok"]);
    }

    #[test]
    fn add_sprite_at_u32_limit_does_not_overflow() {
        let mut atlas = SpriteAtlas::new(texture(16, 16));
        atlas.add_sprite("far", u32::MAX, u32::MAX, 4, 4);
        let sprite = atlas.sprite("far").unwrap();
        assert!(sprite.uv.max.x.is_finite() && sprite.uv.min.y.is_finite());
        assert_eq!(sprite.pixel_width, 4);
    }

    #[test]
    fn missing_texture_field_is_invalid() {
        let err = SpriteAtlas::from_json_str(r#"{"sprites": {}}"#, Path::new(""), |_| {
            Ok(texture(1, 1))
        })
        .unwrap_err();
        assert!(matches!(err, AssetError::Invalid(_)));
    }

    #[test]
    fn texture_loader_error_propagates() {
        let json = r#"{"texture": "missing.png", "sprites": {}}"#;
        let err = SpriteAtlas::from_json_str(json, Path::new(""), |_| {
            Err(AssetError::Texture("decode failed".into()))
        })
        .unwrap_err();
        assert!(matches!(err, AssetError::Texture(_)));
    }

    #[test]
    fn loads_from_file_relative_to_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"texture": "atlas.png", "sprites": {{"tile": {{"x": 0, "y": 0, "w": 4, "h": 4}}}}}}"#
        )
        .unwrap();

        let expected = dir.path().join("atlas.png");
        let atlas = SpriteAtlas::load(&path, |p| {
            assert_eq!(p, expected);
            Ok(texture(4, 4))
        })
        .unwrap();
        assert_eq!(atlas.sprite("tile").unwrap().uv, UvRect::FULL);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SpriteAtlas::load(dir.path().join("none.json"), |_| Ok(texture(1, 1)))
            .unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }
}
