use std::sync::Arc;

use ember_common::Color;
use glam::{IVec2, Vec2};

use crate::atlas::SpriteAtlas;
use crate::batch::Renderer2D;
use crate::quad::Quad;

/// Grid of tile indices drawn from a sprite atlas.
///
/// Cell `(0, 0)` is the bottom-left tile. Indices map to sprite names via
/// [`Tilemap::set_tile_sprite`]; empty cells and unmapped indices are skipped
/// when drawing.
#[derive(Debug, Clone)]
pub struct Tilemap {
    width: u32,
    height: u32,
    tile_size: f32,
    tiles: Vec<Option<u32>>,
    tile_sprites: Vec<Option<String>>,
    atlas: Option<Arc<SpriteAtlas>>,
}

impl Tilemap {
    pub fn new(width: u32, height: u32, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_size,
            tiles: vec![None; width as usize * height as usize],
            tile_sprites: Vec::new(),
            atlas: None,
        }
    }

    pub fn bind_atlas(&mut self, atlas: Arc<SpriteAtlas>) {
        self.atlas = Some(atlas);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn world_width(&self) -> f32 {
        self.width as f32 * self.tile_size
    }

    pub fn world_height(&self) -> f32 {
        self.height as f32 * self.tile_size
    }

    /// Map tile index `tile` to an atlas sprite name.
    pub fn set_tile_sprite(&mut self, tile: u32, sprite: impl Into<String>) {
        let index = tile as usize;
        if index >= self.tile_sprites.len() {
            self.tile_sprites.resize(index + 1, None);
        }
        self.tile_sprites[index] = Some(sprite.into());
    }

    /// Set or clear a cell. Out-of-bounds coordinates are ignored.
    pub fn set_tile(&mut self, x: i32, y: i32, tile: Option<u32>) {
        if let Some(i) = self.index(x, y) {
            self.tiles[i] = tile;
        }
    }

    /// Tile at a cell; `None` when empty or out of bounds.
    pub fn tile(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).and_then(|i| self.tiles[i])
    }

    pub fn fill(&mut self, tile: u32) {
        self.tiles.fill(Some(tile));
    }

    pub fn clear(&mut self) {
        self.tiles.fill(None);
    }

    /// Submit one quad per drawable tile. `offset` is the world position of
    /// the map's bottom-left corner.
    pub fn draw(&self, renderer: &mut Renderer2D, offset: Vec2) {
        let Some(atlas) = &self.atlas else {
            return;
        };
        let texture = atlas.texture();
        let size = Vec2::splat(self.tile_size);

        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let Some(sprite) = self
                    .tile(x, y)
                    .and_then(|t| self.tile_sprites.get(t as usize))
                    .and_then(|name| name.as_deref())
                    .and_then(|name| atlas.sprite(name))
                else {
                    continue;
                };
                let quad = Quad::new(self.grid_to_world(x, y, offset), size)
                    .texture(texture)
                    .uv(sprite.uv)
                    .tint(Color::WHITE);
                renderer.draw_quad(&quad);
            }
        }
    }

    /// Fractional grid coordinates of a world position. May be out of bounds.
    pub fn world_to_grid(&self, world: Vec2, offset: Vec2) -> Vec2 {
        (world - offset) / self.tile_size
    }

    /// Cell containing a world position, if it is inside the map.
    pub fn cell_at(&self, world: Vec2, offset: Vec2) -> Option<IVec2> {
        let cell = self.world_to_grid(world, offset).floor().as_ivec2();
        self.index(cell.x, cell.y).map(|_| cell)
    }

    /// World-space center of a cell.
    pub fn grid_to_world(&self, x: i32, y: i32, offset: Vec2) -> Vec2 {
        offset + (Vec2::new(x as f32, y as f32) + 0.5) * self.tile_size
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let in_bounds = x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height;
        in_bounds.then(|| y as usize * self.width as usize + x as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::RendererConfig;
    use crate::camera::Camera2D;
    use crate::device::TextureFilter;
    use crate::recording::RecordingDevice;

    #[test]
    fn out_of_bounds_is_empty_and_ignored() {
        let mut map = Tilemap::new(4, 3, 16.0);
        map.set_tile(-1, 0, Some(1));
        map.set_tile(4, 0, Some(1));
        map.set_tile(0, 3, Some(1));
        assert_eq!(map.tile(-1, 0), None);
        assert_eq!(map.tile(4, 0), None);
        assert!((0..3).all(|y| (0..4).all(|x| map.tile(x, y).is_none())));
    }

    #[test]
    fn fill_and_clear() {
        let mut map = Tilemap::new(2, 2, 1.0);
        map.fill(3);
        assert_eq!(map.tile(1, 1), Some(3));
        map.set_tile(0, 0, None);
        assert_eq!(map.tile(0, 0), None);
        map.clear();
        assert_eq!(map.tile(1, 1), None);
    }

    #[test]
    fn grid_world_conversions() {
        let map = Tilemap::new(10, 5, 32.0);
        let offset = Vec2::new(-100.0, 50.0);
        assert_eq!(map.grid_to_world(0, 0, offset), Vec2::new(-84.0, 66.0));
        assert_eq!(map.grid_to_world(2, 1, offset), Vec2::new(-20.0, 98.0));
        assert_eq!(
            map.world_to_grid(Vec2::new(-20.0, 98.0), offset),
            Vec2::new(2.5, 1.5)
        );
        assert_eq!(map.cell_at(Vec2::new(-20.0, 98.0), offset), Some(IVec2::new(2, 1)));
        assert_eq!(map.cell_at(Vec2::new(-101.0, 60.0), offset), None);
        assert_eq!(map.world_width(), 320.0);
        assert_eq!(map.world_height(), 160.0);
    }

    #[test]
    fn draws_only_mapped_tiles() {
        let device = RecordingDevice::new();
        let log = device.log();
        let mut renderer = Renderer2D::new(Box::new(device), RendererConfig::default());
        renderer.init().unwrap();
        let texture = renderer
            .create_texture(2, 1, &[255; 8], TextureFilter::Nearest)
            .unwrap();

        let mut atlas = SpriteAtlas::new(texture);
        atlas.add_sprite("grass", 0, 0, 1, 1);
        atlas.add_sprite("stone", 1, 0, 1, 1);

        let mut map = Tilemap::new(3, 2, 10.0);
        map.bind_atlas(Arc::new(atlas));
        map.set_tile_sprite(0, "grass");
        map.set_tile_sprite(2, "missing");
        map.set_tile(0, 0, Some(0));
        map.set_tile(1, 0, Some(1));
        map.set_tile(2, 0, Some(2));
        map.set_tile(1, 1, Some(0));

        renderer.begin_frame(&Camera2D::default());
        map.draw(&mut renderer, Vec2::ZERO);
        renderer.end_frame();

        let vertices = log.all_vertices();
        assert_eq!(vertices.len(), 8);
        // bottom-left corner of tile (0,0), then of tile (1,1)
        assert_eq!(vertices[0].position, [0.0, 0.0]);
        assert_eq!(vertices[4].position, [10.0, 10.0]);
        assert_eq!(vertices[0].uv, [0.0, 0.0]);
        assert_eq!(vertices[2].uv, [0.5, 1.0]);
    }

    #[test]
    fn draw_without_atlas_is_noop() {
        let device = RecordingDevice::new();
        let log = device.log();
        let mut renderer = Renderer2D::new(Box::new(device), RendererConfig::default());
        renderer.init().unwrap();

        let mut map = Tilemap::new(2, 2, 8.0);
        map.set_tile_sprite(0, "grass");
        map.fill(0);
        renderer.begin_frame(&Camera2D::default());
        map.draw(&mut renderer, Vec2::ZERO);
        renderer.end_frame();
        assert_eq!(log.draw_count(), 0);
    }
}
