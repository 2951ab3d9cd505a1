//! GPU device adapter: the capability set the batcher needs from a backend.
//!
//! A backend is constructed once by the platform layer and moved into
//! [`crate::Renderer2D`]. Handles are plain indices owned by the device.

use glam::{Mat4, Vec2, Vec4};

/// Handle to a compiled shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Handle to a vertex or index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Handle to a texture. Equality is texture identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// A texture uploaded through the device, with its pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Texture {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

/// Sampling filter for a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFilter {
    /// Crisp texels, for pixel art.
    #[default]
    Nearest,
    Linear,
}

/// Description of an RGBA8 texture upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub filter: TextureFilter,
}

/// Shader source handed to the device for compilation.
#[derive(Debug, Clone, Copy)]
pub struct ShaderSource<'a> {
    pub label: &'a str,
    pub wgsl: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
}

/// Uniform values a program can receive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Mat4(Mat4),
    Vec4(Vec4),
    Vec2(Vec2),
    Float(f32),
    Int(i32),
}

/// Errors reported by a device backend.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("shader '{label}' failed to compile: {message}")]
    ShaderCompile { label: String, message: String },
    #[error("buffer creation failed: {0}")]
    BufferCreation(String),
    #[error("texture creation failed: {0}")]
    TextureCreation(String),
    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },
    #[error("no frame in progress")]
    NoFrame,
    #[error("surface unavailable: {0}")]
    Surface(String),
}

/// Capabilities a 2D backend provides to the batcher.
///
/// Frames are bracketed by [`GpuDevice::begin_frame`] and
/// [`GpuDevice::present`]. Draws issued outside a frame fail with
/// [`DeviceError::NoFrame`].
pub trait GpuDevice {
    /// Short backend name for diagnostics.
    fn backend_name(&self) -> &str;

    fn compile_program(&mut self, source: &ShaderSource<'_>) -> Result<ProgramId, DeviceError>;

    fn bind_program(&mut self, program: ProgramId) -> Result<(), DeviceError>;

    /// Immutable vertex buffer initialized with `data`.
    fn create_static_vertex_buffer(&mut self, data: &[u8]) -> Result<BufferId, DeviceError>;

    /// Vertex buffer of `size` bytes, written later through `update_vertex_buffer`.
    fn create_dynamic_vertex_buffer(&mut self, size: u64) -> Result<BufferId, DeviceError>;

    /// Overwrite the start of a dynamic buffer in place.
    fn update_vertex_buffer(&mut self, buffer: BufferId, data: &[u8]) -> Result<(), DeviceError>;

    fn create_index_buffer(&mut self, indices: &[u32]) -> Result<BufferId, DeviceError>;

    /// Upload tightly packed RGBA8 pixels, bottom row first.
    fn create_texture(
        &mut self,
        desc: &TextureDesc<'_>,
        rgba: &[u8],
    ) -> Result<TextureId, DeviceError>;

    fn bind_texture(&mut self, slot: u32, texture: TextureId) -> Result<(), DeviceError>;

    /// Set a named uniform on the bound program. Unknown names are ignored.
    fn set_uniform(&mut self, name: &str, value: Uniform);

    /// Acquire the backbuffer and schedule a clear to `clear_color`.
    fn begin_frame(&mut self, clear_color: Vec4) -> Result<(), DeviceError>;

    /// Draw `index_count` indices from `indices` over `vertices` with the
    /// bound program, uniforms and texture slots.
    fn draw_indexed(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        index_count: u32,
    ) -> Result<(), DeviceError>;

    /// Finish the frame and show it.
    fn present(&mut self) -> Result<(), DeviceError>;

    fn resize(&mut self, width: u32, height: u32);
}
