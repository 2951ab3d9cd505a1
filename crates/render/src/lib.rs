//! 2D rendering core: quad batching, camera transforms, sprite atlases and
//! frame animation, over a backend-agnostic GPU device trait.
//!
//! # Invariants
//! - Texture slot indices stay in `[0, 16)`. Slot 0 is the white default texture.
//! - A batch never holds more than `max_quads` quads; the batcher flushes first.
//! - No quad is ever dropped, and flush output preserves submission order.
//! - An animator's frame index is always valid for its current animation.
//!
//! # Backends
//! [`GpuDevice`] is implemented by `ember-render-wgpu` for windows and by
//! [`RecordingDevice`] for headless runs and tests. Consumers only see
//! [`Renderer2D`].

pub mod animation;
pub mod atlas;
pub mod batch;
pub mod camera;
pub mod device;
mod error;
pub mod quad;
pub mod recording;
pub mod shaders;
pub mod tilemap;

pub use animation::{
    Animation, AnimationError, AnimationFrame, AnimationSet, PlaybackState, SpriteAnimator,
};
pub use atlas::{Sprite, SpriteAtlas};
pub use batch::{
    FrameStats, MAX_QUADS, MAX_TEXTURE_SLOTS, QUAD_CAPACITY_LIMIT, Renderer2D, RendererConfig,
};
pub use camera::Camera2D;
pub use device::{
    BufferId, DeviceError, GpuDevice, ProgramId, ShaderSource, Texture, TextureDesc,
    TextureFilter, TextureId, Uniform,
};
pub use error::{AssetError, RenderError};
pub use quad::{Flip, Quad, QuadVertex, UvRect};
pub use recording::{RecordedDraw, RecordingDevice, RecordingLog};

pub fn crate_info() -> &'static str {
    "ember-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
