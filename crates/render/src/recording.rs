//! Headless device that records every submission instead of drawing.
//!
//! Used by tests and by the CLI bench. The log is shared through a cheap
//! handle so it stays readable after the device is moved into a renderer.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use glam::{Mat4, Vec4};

use crate::device::{
    BufferId, DeviceError, GpuDevice, ProgramId, ShaderSource, TextureDesc, TextureId, Uniform,
};
use crate::quad::QuadVertex;
use crate::shaders::VIEW_PROJ_UNIFORM;

/// Number of texture slots the recording device exposes.
const SLOTS: usize = 16;

/// One indexed draw as the device saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    /// Vertices referenced by the draw, decoded from the bound buffer.
    pub vertices: Vec<QuadVertex>,
    pub index_count: u32,
    /// Texture bound to each slot at draw time.
    pub slots: [Option<TextureId>; SLOTS],
    pub view_proj: Option<Mat4>,
    pub program: Option<ProgramId>,
}

impl RecordedDraw {
    pub fn quad_count(&self) -> usize {
        self.index_count as usize / 6
    }
}

#[derive(Debug, Default)]
pub struct LogState {
    pub draws: Vec<RecordedDraw>,
    pub clears: Vec<Vec4>,
    pub frames_begun: u32,
    pub frames_presented: u32,
    pub textures_created: u32,
    pub resizes: Vec<(u32, u32)>,
}

/// Shared view of a [`RecordingDevice`]'s log.
#[derive(Debug, Clone, Default)]
pub struct RecordingLog(Rc<RefCell<LogState>>);

impl RecordingLog {
    pub fn state(&self) -> Ref<'_, LogState> {
        self.0.borrow()
    }

    pub fn draws(&self) -> Vec<RecordedDraw> {
        self.0.borrow().draws.clone()
    }

    pub fn draw_count(&self) -> usize {
        self.0.borrow().draws.len()
    }

    /// Every drawn vertex, concatenated in submission order.
    pub fn all_vertices(&self) -> Vec<QuadVertex> {
        self.0
            .borrow()
            .draws
            .iter()
            .flat_map(|d| d.vertices.iter().copied())
            .collect()
    }

    pub fn clear(&self) {
        *self.0.borrow_mut() = LogState::default();
    }
}

enum Buffer {
    Vertex(Vec<u8>),
    Index(Vec<u32>),
}

/// Device backend that keeps buffers in memory and logs draws.
pub struct RecordingDevice {
    log: RecordingLog,
    programs: Vec<String>,
    bound_program: Option<ProgramId>,
    buffers: Vec<Buffer>,
    textures: Vec<(u32, u32)>,
    slots: [Option<TextureId>; SLOTS],
    view_proj: Option<Mat4>,
    in_frame: bool,
    fail_compile: bool,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            log: RecordingLog::default(),
            programs: Vec::new(),
            bound_program: None,
            buffers: Vec::new(),
            textures: Vec::new(),
            slots: [None; SLOTS],
            view_proj: None,
            in_frame: false,
            fail_compile: false,
        }
    }

    /// A device whose shader compilation always fails.
    pub fn failing_compile() -> Self {
        Self {
            fail_compile: true,
            ..Self::new()
        }
    }

    pub fn log(&self) -> RecordingLog {
        self.log.clone()
    }

    fn vertex_bytes(&self, id: BufferId) -> Result<&[u8], DeviceError> {
        match self.buffers.get(id.0 as usize) {
            Some(Buffer::Vertex(bytes)) => Ok(bytes),
            _ => Err(DeviceError::UnknownHandle {
                kind: "vertex buffer",
                id: id.0,
            }),
        }
    }

    fn push_buffer(&mut self, buffer: Buffer) -> BufferId {
        self.buffers.push(buffer);
        BufferId(self.buffers.len() as u32 - 1)
    }
}

impl GpuDevice for RecordingDevice {
    fn backend_name(&self) -> &str {
        "recording"
    }

    fn compile_program(&mut self, source: &ShaderSource<'_>) -> Result<ProgramId, DeviceError> {
        let has_entries = source.wgsl.contains(source.vertex_entry)
            && source.wgsl.contains(source.fragment_entry);
        if self.fail_compile || !has_entries {
            return Err(DeviceError::ShaderCompile {
                label: source.label.to_string(),
                message: "entry points not found".into(),
            });
        }
        self.programs.push(source.label.to_string());
        Ok(ProgramId(self.programs.len() as u32 - 1))
    }

    fn bind_program(&mut self, program: ProgramId) -> Result<(), DeviceError> {
        if program.0 as usize >= self.programs.len() {
            return Err(DeviceError::UnknownHandle {
                kind: "program",
                id: program.0,
            });
        }
        self.bound_program = Some(program);
        Ok(())
    }

    fn create_static_vertex_buffer(&mut self, data: &[u8]) -> Result<BufferId, DeviceError> {
        Ok(self.push_buffer(Buffer::Vertex(data.to_vec())))
    }

    fn create_dynamic_vertex_buffer(&mut self, size: u64) -> Result<BufferId, DeviceError> {
        Ok(self.push_buffer(Buffer::Vertex(vec![0; size as usize])))
    }

    fn update_vertex_buffer(&mut self, buffer: BufferId, data: &[u8]) -> Result<(), DeviceError> {
        match self.buffers.get_mut(buffer.0 as usize) {
            Some(Buffer::Vertex(bytes)) if data.len() <= bytes.len() => {
                bytes[..data.len()].copy_from_slice(data);
                Ok(())
            }
            Some(Buffer::Vertex(bytes)) => Err(DeviceError::BufferCreation(format!(
                "update of {} bytes exceeds buffer of {} bytes",
                data.len(),
                bytes.len()
            ))),
            _ => Err(DeviceError::UnknownHandle {
                kind: "vertex buffer",
                id: buffer.0,
            }),
        }
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> Result<BufferId, DeviceError> {
        Ok(self.push_buffer(Buffer::Index(indices.to_vec())))
    }

    fn create_texture(
        &mut self,
        desc: &TextureDesc<'_>,
        rgba: &[u8],
    ) -> Result<TextureId, DeviceError> {
        if rgba.len() != desc.width as usize * desc.height as usize * 4 {
            return Err(DeviceError::TextureCreation(format!(
                "'{}' expects {}x{} RGBA pixels",
                desc.label, desc.width, desc.height
            )));
        }
        self.textures.push((desc.width, desc.height));
        self.log.0.borrow_mut().textures_created += 1;
        Ok(TextureId(self.textures.len() as u32 - 1))
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureId) -> Result<(), DeviceError> {
        if texture.0 as usize >= self.textures.len() {
            return Err(DeviceError::UnknownHandle {
                kind: "texture",
                id: texture.0,
            });
        }
        match self.slots.get_mut(slot as usize) {
            Some(s) => {
                *s = Some(texture);
                Ok(())
            }
            None => Err(DeviceError::UnknownHandle {
                kind: "texture slot",
                id: slot,
            }),
        }
    }

    fn set_uniform(&mut self, name: &str, value: Uniform) {
        match (name, value) {
            (VIEW_PROJ_UNIFORM, Uniform::Mat4(m)) => self.view_proj = Some(m),
            _ => tracing::trace!(name, "recording device ignores uniform"),
        }
    }

    fn begin_frame(&mut self, clear_color: Vec4) -> Result<(), DeviceError> {
        self.in_frame = true;
        let mut log = self.log.0.borrow_mut();
        log.frames_begun += 1;
        log.clears.push(clear_color);
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        index_count: u32,
    ) -> Result<(), DeviceError> {
        if !self.in_frame {
            return Err(DeviceError::NoFrame);
        }
        let index_len = match self.buffers.get(indices.0 as usize) {
            Some(Buffer::Index(idx)) => idx.len(),
            _ => {
                return Err(DeviceError::UnknownHandle {
                    kind: "index buffer",
                    id: indices.0,
                });
            }
        };
        if index_count as usize > index_len {
            return Err(DeviceError::BufferCreation(format!(
                "draw of {index_count} indices exceeds index buffer of {index_len}"
            )));
        }

        let stride = std::mem::size_of::<QuadVertex>();
        let vertex_count = index_count as usize / 6 * 4;
        let bytes = self.vertex_bytes(vertices)?;
        let used = bytes.get(..vertex_count * stride).ok_or_else(|| {
            DeviceError::BufferCreation("draw reads past the vertex buffer".into())
        })?;
        let decoded = used
            .chunks_exact(stride)
            .map(bytemuck::pod_read_unaligned::<QuadVertex>)
            .collect();

        let draw = RecordedDraw {
            vertices: decoded,
            index_count,
            slots: self.slots,
            view_proj: self.view_proj,
            program: self.bound_program,
        };
        self.log.0.borrow_mut().draws.push(draw);
        Ok(())
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        if !self.in_frame {
            return Err(DeviceError::NoFrame);
        }
        self.in_frame = false;
        self.log.0.borrow_mut().frames_presented += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.log.0.borrow_mut().resizes.push((width, height));
    }
}
