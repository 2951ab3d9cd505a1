//! Frame batcher: accumulates quads into one vertex stream and flushes them
//! with as few indexed draws as the slot and capacity limits allow.

use ember_common::Color;
use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};

use crate::atlas::Sprite;
use crate::camera::Camera2D;
use crate::device::{
    BufferId, GpuDevice, ProgramId, ShaderSource, Texture, TextureDesc, TextureFilter, TextureId,
    Uniform,
};
use crate::error::RenderError;
use crate::quad::{INDICES_PER_QUAD, Quad, QuadVertex, VERTICES_PER_QUAD, quad_indices};
use crate::shaders::{QUAD_FRAGMENT_ENTRY, QUAD_SHADER, QUAD_VERTEX_ENTRY, VIEW_PROJ_UNIFORM};

/// Default upper bound on quads per batch.
pub const MAX_QUADS: usize = 10_000;
/// Largest accepted batch capacity. Keeps u32 vertex indices in range and
/// the dynamic vertex buffer (144 bytes per quad) under 256 MiB.
pub const QUAD_CAPACITY_LIMIT: usize = 1 << 20;
/// Texture slots per batch, slot 0 included.
pub const MAX_TEXTURE_SLOTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Quads per batch before a capacity flush. Clamped to at least 1.
    pub max_quads: usize,
    pub clear_color: Color,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_quads: MAX_QUADS,
            clear_color: Color::rgb(0.1, 0.1, 0.12),
        }
    }
}

/// Counters for the current frame, reset at [`Renderer2D::begin_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FrameStats {
    pub quads: u32,
    pub draw_calls: u32,
    /// Batches cut short because all texture slots were taken.
    pub texture_flushes: u32,
    /// Batches cut short because the quad capacity was reached.
    pub capacity_flushes: u32,
}

/// Device objects created by [`Renderer2D::init`].
#[derive(Debug, Clone, Copy)]
struct GpuResources {
    program: ProgramId,
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    white: Texture,
}

/// Batched quad renderer over a [`GpuDevice`].
///
/// Drawing before a successful [`Renderer2D::init`] or after
/// [`Renderer2D::shutdown`] is a silent no-op.
pub struct Renderer2D {
    device: Box<dyn GpuDevice>,
    config: RendererConfig,
    gpu: Option<GpuResources>,
    shut_down: bool,
    vertices: Vec<QuadVertex>,
    index_count: u32,
    slots: [Option<TextureId>; MAX_TEXTURE_SLOTS],
    slot_cursor: usize,
    view_projection: Mat4,
    in_frame: bool,
    stats: FrameStats,
}

impl Renderer2D {
    pub fn new(device: Box<dyn GpuDevice>, config: RendererConfig) -> Self {
        let max_quads = config.max_quads.clamp(1, QUAD_CAPACITY_LIMIT);
        if max_quads != config.max_quads {
            tracing::warn!(requested = config.max_quads, max_quads, "batch capacity clamped");
        }
        let config = RendererConfig { max_quads, ..config };
        Self {
            device,
            config,
            gpu: None,
            shut_down: false,
            vertices: Vec::new(),
            index_count: 0,
            slots: [None; MAX_TEXTURE_SLOTS],
            slot_cursor: 1,
            view_projection: Mat4::IDENTITY,
            in_frame: false,
            stats: FrameStats::default(),
        }
    }

    /// Build the quad program, buffers and the white default texture.
    pub fn init(&mut self) -> Result<(), RenderError> {
        if self.shut_down {
            return Err(RenderError::ShutDown);
        }
        if self.gpu.is_some() {
            return Ok(());
        }

        let program = self.device.compile_program(&ShaderSource {
            label: "quad",
            wgsl: QUAD_SHADER,
            vertex_entry: QUAD_VERTEX_ENTRY,
            fragment_entry: QUAD_FRAGMENT_ENTRY,
        })?;
        self.device.bind_program(program)?;

        let max_quads = self.config.max_quads;
        let vertex_bytes =
            (max_quads * VERTICES_PER_QUAD * std::mem::size_of::<QuadVertex>()) as u64;
        let vertex_buffer = self.device.create_dynamic_vertex_buffer(vertex_bytes)?;
        let index_buffer = self.device.create_index_buffer(&quad_indices(max_quads))?;

        let white_desc = TextureDesc {
            label: "white",
            width: 1,
            height: 1,
            filter: TextureFilter::Nearest,
        };
        let white_id = self.device.create_texture(&white_desc, &[255; 4])?;

        self.gpu = Some(GpuResources {
            program,
            vertex_buffer,
            index_buffer,
            white: Texture {
                id: white_id,
                width: 1,
                height: 1,
            },
        });
        self.vertices.reserve(max_quads * VERTICES_PER_QUAD);
        self.start_batch();

        tracing::info!(
            backend = self.device.backend_name(),
            max_quads,
            "2D renderer initialized"
        );
        Ok(())
    }

    /// Release GPU state. Later draws are no-ops and `init` is refused.
    pub fn shutdown(&mut self) {
        if self.gpu.take().is_some() {
            tracing::info!("2D renderer shut down");
        }
        self.shut_down = true;
        self.in_frame = false;
        self.vertices.clear();
        self.index_count = 0;
    }

    pub fn is_initialized(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &str {
        self.device.backend_name()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// The 1x1 white texture bound to slot 0.
    pub fn white_texture(&self) -> Option<Texture> {
        self.gpu.map(|gpu| gpu.white)
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.config.clear_color = color;
    }

    /// Upload RGBA8 pixels, bottom row first.
    pub fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
        filter: TextureFilter,
    ) -> Result<Texture, RenderError> {
        if self.shut_down {
            return Err(RenderError::ShutDown);
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected || expected == 0 {
            return Err(RenderError::TextureSize {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        let desc = TextureDesc {
            label: "texture",
            width,
            height,
            filter,
        };
        let id = self.device.create_texture(&desc, rgba)?;
        tracing::debug!(id = id.0, width, height, "texture created");
        Ok(Texture { id, width, height })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.device.resize(width, height);
    }

    /// Capture the camera transform, clear the backbuffer and open a batch.
    pub fn begin_frame(&mut self, camera: &Camera2D) {
        if self.gpu.is_none() {
            return;
        }
        self.view_projection = camera.view_projection();
        self.stats = FrameStats::default();
        self.start_batch();
        match self.device.begin_frame(self.config.clear_color.into()) {
            Ok(()) => self.in_frame = true,
            Err(err) => {
                self.in_frame = false;
                tracing::warn!(%err, "could not begin frame");
            }
        }
    }

    /// Flush whatever is left in the batch.
    pub fn end_frame(&mut self) {
        self.flush();
    }

    /// Show the finished frame.
    pub fn present(&mut self) {
        if !self.in_frame {
            return;
        }
        self.in_frame = false;
        if let Err(err) = self.device.present() {
            tracing::warn!(%err, "present failed");
        }
    }

    pub fn draw_quad(&mut self, quad: &Quad) {
        if self.gpu.is_none() {
            return;
        }

        if self.quad_count() >= self.config.max_quads {
            self.stats.capacity_flushes += 1;
            self.flush();
        }

        let slot = self.resolve_slot(quad.texture);
        let color = quad.tint.to_array();
        let corners = quad.corners();
        let uvs = quad.tex_coords();
        for (corner, uv) in corners.iter().zip(uvs) {
            self.vertices.push(QuadVertex {
                position: corner.to_array(),
                uv: uv.to_array(),
                color,
                tex_index: slot as f32,
            });
        }
        self.index_count += INDICES_PER_QUAD as u32;
        self.stats.quads += 1;
    }

    /// Solid untextured rectangle centered on `position`.
    pub fn draw_rect(&mut self, position: Vec2, size: Vec2, color: Color) {
        self.draw_quad(&Quad::new(position, size).tint(color));
    }

    /// Whole texture stretched over the quad.
    pub fn draw_texture(&mut self, position: Vec2, size: Vec2, texture: Texture, tint: Color) {
        self.draw_quad(&Quad::new(position, size).texture(texture).tint(tint));
    }

    /// Atlas region of `texture` described by `sprite`.
    pub fn draw_sprite(
        &mut self,
        position: Vec2,
        size: Vec2,
        texture: Texture,
        sprite: &Sprite,
        tint: Color,
    ) {
        self.draw_quad(
            &Quad::new(position, size)
                .texture(texture)
                .uv(sprite.uv)
                .tint(tint),
        );
    }

    /// Submit the pending batch and start a new one. No-op when empty.
    pub fn flush(&mut self) {
        let Some(gpu) = self.gpu else {
            return;
        };
        if self.index_count == 0 {
            return;
        }

        if self.in_frame {
            match self.submit(gpu) {
                Ok(()) => {
                    self.stats.draw_calls += 1;
                    tracing::trace!(
                        quads = self.quad_count(),
                        slots = self.slot_cursor,
                        "batch flushed"
                    );
                }
                Err(err) => tracing::warn!(%err, "batch flush failed"),
            }
        } else {
            tracing::trace!(quads = self.quad_count(), "discarding batch outside a frame");
        }
        self.start_batch();
    }

    fn submit(&mut self, gpu: GpuResources) -> Result<(), RenderError> {
        self.device
            .update_vertex_buffer(gpu.vertex_buffer, bytemuck::cast_slice(&self.vertices))?;
        self.device.bind_program(gpu.program)?;
        self.device
            .set_uniform(VIEW_PROJ_UNIFORM, Uniform::Mat4(self.view_projection));
        for (slot, texture) in self.slots.iter().enumerate() {
            let id = texture.unwrap_or(gpu.white.id);
            self.device.bind_texture(slot as u32, id)?;
        }
        self.device
            .draw_indexed(gpu.vertex_buffer, gpu.index_buffer, self.index_count)?;
        Ok(())
    }

    fn start_batch(&mut self) {
        self.vertices.clear();
        self.index_count = 0;
        self.slots = [None; MAX_TEXTURE_SLOTS];
        self.slots[0] = self.gpu.map(|gpu| gpu.white.id);
        self.slot_cursor = 1;
    }

    /// Slot for `texture`, flushing first if every slot is taken.
    fn resolve_slot(&mut self, texture: Option<Texture>) -> usize {
        let Some(texture) = texture else {
            return 0;
        };
        if self.slots[0] == Some(texture.id) {
            return 0;
        }
        if let Some(slot) = (1..self.slot_cursor).find(|&i| self.slots[i] == Some(texture.id)) {
            return slot;
        }
        if self.slot_cursor >= MAX_TEXTURE_SLOTS {
            self.stats.texture_flushes += 1;
            self.flush();
        }
        let slot = self.slot_cursor;
        self.slots[slot] = Some(texture.id);
        self.slot_cursor += 1;
        slot
    }

    fn quad_count(&self) -> usize {
        self.index_count as usize / INDICES_PER_QUAD
    }
}
