//! wgpu backend for the ember 2D renderer.
//!
//! [`WgpuDevice`] implements `ember_render::GpuDevice` over a window surface.
//! The renderer stays backend-agnostic; only the platform layer names this crate.
//!
//! # Invariants
//! - The quad pipeline layout matches `ember_render::shaders::QUAD_SHADER`.
//! - Textures are stored bottom row first, so atlas V coordinates need no flip.

mod gpu;

pub use gpu::WgpuDevice;

pub fn crate_info() -> &'static str {
    "ember-render-wgpu v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("wgpu"));
    }
}
