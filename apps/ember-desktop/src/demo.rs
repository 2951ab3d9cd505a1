//! Demo scenes: a walkable tilemap and a pause overlay pushed on top of it.

use ember_common::{Aabb, Color};
use ember_input::Key;
use ember_render::tilemap::Tilemap;
use ember_render::{Flip, Quad, Renderer2D, SpriteAnimator};
use ember_scene::{Scene, Transitions, UpdateContext};
use glam::Vec2;

use crate::assets::DemoAssets;

const MAP_WIDTH: u32 = 40;
const MAP_HEIGHT: u32 = 24;
const TILE_SIZE: f32 = 32.0;
const HERO_SIZE: f32 = 48.0;
const WALK_SPEED: f32 = 180.0;
const ZOOM_STEP: f32 = 0.1;

const GRASS: u32 = 0;
const STONE: u32 = 1;
const WATER: u32 = 2;

pub struct GameScene {
    assets: DemoAssets,
    tilemap: Tilemap,
    hero: SpriteAnimator,
    position: Vec2,
    facing_left: bool,
}

impl GameScene {
    pub fn new(assets: DemoAssets) -> Self {
        let mut tilemap = Tilemap::new(MAP_WIDTH, MAP_HEIGHT, TILE_SIZE);
        tilemap.bind_atlas(assets.atlas.clone());
        tilemap.set_tile_sprite(GRASS, "grass");
        tilemap.set_tile_sprite(STONE, "stone");
        tilemap.set_tile_sprite(WATER, "water");
        paint_terrain(&mut tilemap);

        let mut hero = SpriteAnimator::new(assets.animations.clone());
        hero.bind_atlas(assets.atlas.clone());

        let position = Vec2::new(tilemap.world_width(), tilemap.world_height()) * 0.5;
        Self {
            assets,
            tilemap,
            hero,
            position,
            facing_left: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    fn bounds(&self) -> Aabb {
        let half = HERO_SIZE * 0.5;
        Aabb::new(
            Vec2::splat(half),
            Vec2::new(self.tilemap.world_width(), self.tilemap.world_height()) - half,
        )
    }
}

impl Scene for GameScene {
    fn name(&self) -> &str {
        "game"
    }

    fn on_enter(&mut self) {
        self.hero.play("idle");
    }

    fn on_pause(&mut self) {
        self.hero.pause();
    }

    fn on_resume(&mut self) {
        self.hero.resume();
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>, transitions: &mut Transitions) {
        let input = ctx.input;
        if input.just_pressed(Key::Escape) {
            ctx.request_quit();
            return;
        }
        if input.just_pressed(Key::P) {
            transitions.push(Box::new(PauseScene::new()));
        }

        let dir = Vec2::new(
            input.axis(Key::A, Key::D) + input.axis(Key::Left, Key::Right),
            input.axis(Key::S, Key::W) + input.axis(Key::Down, Key::Up),
        )
        .clamp(Vec2::NEG_ONE, Vec2::ONE)
        .normalize_or_zero();

        if dir == Vec2::ZERO {
            self.hero.play_if_not("idle");
        } else {
            self.hero.play_if_not("walk");
            if dir.x != 0.0 {
                self.facing_left = dir.x < 0.0;
            }
            let bounds = self.bounds();
            self.position = (self.position + dir * WALK_SPEED * ctx.dt).clamp(bounds.min, bounds.max);
        }
        self.hero.update(ctx.dt);

        let scroll = input.scroll_delta().y;
        if scroll != 0.0 {
            let zoom = ctx.camera.zoom() * (1.0 + scroll * ZOOM_STEP);
            ctx.camera.set_zoom(zoom);
        }
        ctx.camera.set_target(self.position);
    }

    fn render(&mut self, renderer: &mut Renderer2D) {
        self.tilemap.draw(renderer, Vec2::ZERO);

        let Some(sprite) = self.hero.current_sprite() else {
            return;
        };
        let quad = Quad::new(self.position, Vec2::splat(HERO_SIZE))
            .texture(self.assets.atlas.texture())
            .uv(sprite.uv)
            .flip(Flip::from_axes(self.facing_left, false));
        renderer.draw_quad(&quad);
    }
}

/// Water border, a stone path through the middle and grass elsewhere.
fn paint_terrain(tilemap: &mut Tilemap) {
    tilemap.fill(GRASS);
    let (w, h) = (tilemap.width() as i32, tilemap.height() as i32);
    for x in 0..w {
        tilemap.set_tile(x, 0, Some(WATER));
        tilemap.set_tile(x, h - 1, Some(WATER));
        tilemap.set_tile(x, h / 2, Some(STONE));
    }
    for y in 0..h {
        tilemap.set_tile(0, y, Some(WATER));
        tilemap.set_tile(w - 1, y, Some(WATER));
    }
}

/// Freezes the game underneath. P or Escape pops back.
#[derive(Debug, Default)]
pub struct PauseScene {
    elapsed: f32,
    center: Vec2,
}

impl PauseScene {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scene for PauseScene {
    fn name(&self) -> &str {
        "pause"
    }

    fn on_enter(&mut self) {
        tracing::info!("paused");
    }

    fn on_exit(&mut self) {
        tracing::info!(seconds = self.elapsed, "resumed");
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>, transitions: &mut Transitions) {
        self.elapsed += ctx.dt;
        self.center = ctx.camera.position();
        if ctx.input.just_pressed(Key::P) || ctx.input.just_pressed(Key::Escape) {
            transitions.pop();
        }
    }

    fn render(&mut self, renderer: &mut Renderer2D) {
        let pulse = 0.6 + 0.4 * (self.elapsed * 3.0).sin().abs();
        let bar = Vec2::new(24.0, 96.0);
        let tint = Color::WHITE.with_alpha(pulse);
        renderer.draw_rect(self.center, Vec2::splat(4000.0), Color::rgba(0.0, 0.0, 0.0, 0.6));
        renderer.draw_rect(self.center - Vec2::new(24.0, 0.0), bar, tint);
        renderer.draw_rect(self.center + Vec2::new(24.0, 0.0), bar, tint);
    }
}
