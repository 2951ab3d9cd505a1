use bytemuck::{Pod, Zeroable};
use ember_render::shaders::{VIEW_PROJ_UNIFORM, sampler_binding, texture_binding};
use ember_render::{
    BufferId, DeviceError, GpuDevice, MAX_TEXTURE_SLOTS, ProgramId, QuadVertex, ShaderSource,
    TextureDesc, TextureFilter, TextureId, Uniform,
};
use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

enum BufferKind {
    Vertex,
    Index,
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    kind: BufferKind,
}

struct GpuTexture {
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

/// Backbuffer acquired by `begin_frame`, held until `present`.
struct Frame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    /// Pending clear, consumed by the first pass of the frame.
    clear: Option<wgpu::Color>,
}

/// [`GpuDevice`] over a wgpu surface.
///
/// Every indexed draw records and submits its own render pass. The first
/// pass of a frame clears; later passes load.
pub struct WgpuDevice {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    backend: String,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    uniform_buffer: wgpu::Buffer,
    programs: Vec<wgpu::RenderPipeline>,
    bound_program: Option<usize>,
    buffers: Vec<GpuBuffer>,
    textures: Vec<GpuTexture>,
    slots: [Option<TextureId>; MAX_TEXTURE_SLOTS],
    view_proj: Mat4,
    frame: Option<Frame>,
}

impl WgpuDevice {
    /// Create a device presenting to `target`, e.g. an `Arc<winit::window::Window>`.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, DeviceError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(target)
            .map_err(|e| DeviceError::Surface(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| DeviceError::Surface("no compatible GPU adapter".into()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("ember_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| DeviceError::Surface(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| DeviceError::Surface("surface reports no formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_uniforms"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quad_bind_group_layout"),
            entries: &bind_group_layout_entries(),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quad_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let backend = adapter.get_info().backend.to_str().to_string();
        tracing::info!("GPU initialized with {} backend", backend);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            backend,
            bind_group_layout,
            pipeline_layout,
            uniform_buffer,
            programs: Vec::new(),
            bound_program: None,
            buffers: Vec::new(),
            textures: Vec::new(),
            slots: [None; MAX_TEXTURE_SLOTS],
            view_proj: Mat4::IDENTITY,
            frame: None,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn push_buffer(&mut self, buffer: wgpu::Buffer, kind: BufferKind) -> BufferId {
        self.buffers.push(GpuBuffer { buffer, kind });
        BufferId(self.buffers.len() as u32 - 1)
    }

    fn buffer(&self, id: BufferId, kind: &'static str) -> Result<&GpuBuffer, DeviceError> {
        self.buffers
            .get(id.0 as usize)
            .ok_or(DeviceError::UnknownHandle { kind, id: id.0 })
    }

    fn texture(&self, id: TextureId) -> Result<&GpuTexture, DeviceError> {
        self.textures
            .get(id.0 as usize)
            .ok_or(DeviceError::UnknownHandle {
                kind: "texture",
                id: id.0,
            })
    }

    fn build_bind_group(&self) -> Result<wgpu::BindGroup, DeviceError> {
        let mut bound = Vec::with_capacity(MAX_TEXTURE_SLOTS);
        for (slot, texture) in self.slots.iter().enumerate() {
            let id = texture.ok_or(DeviceError::UnknownHandle {
                kind: "texture slot",
                id: slot as u32,
            })?;
            bound.push(self.texture(id)?);
        }

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: self.uniform_buffer.as_entire_binding(),
        }];
        for (slot, texture) in bound.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: texture_binding(slot as u32),
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: sampler_binding(slot as u32),
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            });
        }

        Ok(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quad_bind_group"),
            layout: &self.bind_group_layout,
            entries: &entries,
        }))
    }

    fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

impl GpuDevice for WgpuDevice {
    fn backend_name(&self) -> &str {
        &self.backend
    }

    fn compile_program(&mut self, source: &ShaderSource<'_>) -> Result<ProgramId, DeviceError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(source.label),
                source: wgpu::ShaderSource::Wgsl(source.wgsl.into()),
            });
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(source.label),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some(source.vertex_entry),
                    compilation_options: Default::default(),
                    buffers: &[quad_vertex_layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some(source.fragment_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: Default::default(),
                multiview: None,
                cache: None,
            });

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(DeviceError::ShaderCompile {
                label: source.label.to_string(),
                message: err.to_string(),
            });
        }

        self.programs.push(pipeline);
        Ok(ProgramId(self.programs.len() as u32 - 1))
    }

    fn bind_program(&mut self, program: ProgramId) -> Result<(), DeviceError> {
        if program.0 as usize >= self.programs.len() {
            return Err(DeviceError::UnknownHandle {
                kind: "program",
                id: program.0,
            });
        }
        self.bound_program = Some(program.0 as usize);
        Ok(())
    }

    fn create_static_vertex_buffer(&mut self, data: &[u8]) -> Result<BufferId, DeviceError> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("static_vertices"),
                contents: data,
                usage: wgpu::BufferUsages::VERTEX,
            });
        Ok(self.push_buffer(buffer, BufferKind::Vertex))
    }

    fn create_dynamic_vertex_buffer(&mut self, size: u64) -> Result<BufferId, DeviceError> {
        if size == 0 || size % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(DeviceError::BufferCreation(format!(
                "dynamic buffer size {size} must be a non-zero multiple of {}",
                wgpu::COPY_BUFFER_ALIGNMENT
            )));
        }
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("dynamic_vertices"),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Ok(self.push_buffer(buffer, BufferKind::Vertex))
    }

    fn update_vertex_buffer(&mut self, buffer: BufferId, data: &[u8]) -> Result<(), DeviceError> {
        let target = self.buffer(buffer, "vertex buffer")?;
        if !matches!(target.kind, BufferKind::Vertex) {
            return Err(DeviceError::UnknownHandle {
                kind: "vertex buffer",
                id: buffer.0,
            });
        }
        if data.len() as u64 > target.buffer.size() {
            return Err(DeviceError::BufferCreation(format!(
                "update of {} bytes exceeds buffer of {} bytes",
                data.len(),
                target.buffer.size()
            )));
        }
        self.queue.write_buffer(&target.buffer, 0, data);
        Ok(())
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> Result<BufferId, DeviceError> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("quad_indices"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        Ok(self.push_buffer(buffer, BufferKind::Index))
    }

    fn create_texture(
        &mut self,
        desc: &TextureDesc<'_>,
        rgba: &[u8],
    ) -> Result<TextureId, DeviceError> {
        let expected = desc.width as usize * desc.height as usize * 4;
        if desc.width == 0 || desc.height == 0 || rgba.len() != expected {
            return Err(DeviceError::TextureCreation(format!(
                "'{}' needs {expected} bytes for {}x{}, got {}",
                desc.label,
                desc.width,
                desc.height,
                rgba.len()
            )));
        }

        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        // Row 0 is the image's bottom row, so v = 0 samples the bottom.
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * desc.width),
                rows_per_image: Some(desc.height),
            },
            size,
        );

        let filter = filter_mode(desc.filter);
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(desc.label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        self.textures.push(GpuTexture {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            sampler,
        });
        Ok(TextureId(self.textures.len() as u32 - 1))
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureId) -> Result<(), DeviceError> {
        self.texture(texture)?;
        let target = self
            .slots
            .get_mut(slot as usize)
            .ok_or(DeviceError::UnknownHandle {
                kind: "texture slot",
                id: slot,
            })?;
        *target = Some(texture);
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: Uniform) {
        match (name, value) {
            (VIEW_PROJ_UNIFORM, Uniform::Mat4(m)) => self.view_proj = m,
            _ => tracing::debug!(name, "quad program has no such uniform"),
        }
    }

    fn begin_frame(&mut self, clear_color: Vec4) -> Result<(), DeviceError> {
        // An unpresented frame is dropped.
        self.frame = None;

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.reconfigure();
                return Err(DeviceError::Surface("surface lost, reconfigured".into()));
            }
            Err(e) => return Err(DeviceError::Surface(e.to_string())),
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.frame = Some(Frame {
            surface_texture,
            view,
            clear: Some(to_wgpu_color(clear_color)),
        });
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        index_count: u32,
    ) -> Result<(), DeviceError> {
        let clear = match self.frame.as_mut() {
            Some(frame) => frame.clear.take(),
            None => return Err(DeviceError::NoFrame),
        };
        let program = self
            .bound_program
            .and_then(|i| self.programs.get(i))
            .ok_or(DeviceError::UnknownHandle {
                kind: "program",
                id: u32::MAX,
            })?;
        let vertex_buffer = &self.buffer(vertices, "vertex buffer")?.buffer;
        let index_buffer = &self.buffer(indices, "index buffer")?.buffer;

        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: self.view_proj.to_cols_array_2d(),
            }),
        );
        let bind_group = self.build_bind_group()?;
        let frame = self.frame.as_ref().ok_or(DeviceError::NoFrame)?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("quad_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quad_pass"),
                color_attachments: &[Some(color_attachment(&frame.view, clear))],
                ..Default::default()
            });
            pass.set_pipeline(program);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..index_count, 0, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        let mut frame = self.frame.take().ok_or(DeviceError::NoFrame)?;

        // Nothing was drawn: the clear still has to happen.
        if let Some(clear) = frame.clear.take() {
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("clear_encoder"),
                });
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear_pass"),
                color_attachments: &[Some(color_attachment(&frame.view, Some(clear)))],
                ..Default::default()
            });
            self.queue.submit(std::iter::once(encoder.finish()));
        }

        frame.surface_texture.present();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
    }
}

fn bind_group_layout_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = vec![wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }];
    for slot in 0..MAX_TEXTURE_SLOTS as u32 {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: texture_binding(slot),
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: sampler_binding(slot),
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    entries
}

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x2,
    1 => Float32x2,
    2 => Float32x4,
    3 => Float32,
];

fn quad_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &QUAD_ATTRIBUTES,
    }
}

fn color_attachment(
    view: &wgpu::TextureView,
    clear: Option<wgpu::Color>,
) -> wgpu::RenderPassColorAttachment<'_> {
    wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load: clear.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
            store: wgpu::StoreOp::Store,
        },
    }
}

fn filter_mode(filter: TextureFilter) -> wgpu::FilterMode {
    match filter {
        TextureFilter::Nearest => wgpu::FilterMode::Nearest,
        TextureFilter::Linear => wgpu::FilterMode::Linear,
    }
}

fn to_wgpu_color(color: Vec4) -> wgpu::Color {
    wgpu::Color {
        r: color.x as f64,
        g: color.y as f64,
        b: color.z as f64,
        a: color.w as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_covers_quad_vertex() {
        let layout = quad_vertex_layout();
        assert_eq!(layout.array_stride, 36);
        let end = QUAD_ATTRIBUTES
            .iter()
            .map(|a| a.offset + a.format.size())
            .max()
            .unwrap();
        assert_eq!(end, layout.array_stride);
        assert_eq!(QUAD_ATTRIBUTES[3].shader_location, 3);
    }

    #[test]
    fn layout_has_uniform_and_slot_pairs() {
        let entries = bind_group_layout_entries();
        assert_eq!(entries.len(), 1 + 2 * MAX_TEXTURE_SLOTS);
        let mut bindings: Vec<u32> = entries.iter().map(|e| e.binding).collect();
        bindings.sort_unstable();
        assert_eq!(bindings, (0..=32).collect::<Vec<_>>());
    }

    #[test]
    fn uniforms_are_one_matrix() {
        assert_eq!(std::mem::size_of::<Uniforms>(), 64);
    }

    #[test]
    fn clear_color_conversion() {
        let c = to_wgpu_color(Vec4::new(0.5, 0.25, 0.0, 1.0));
        assert_eq!((c.r, c.g, c.b, c.a), (0.5, 0.25, 0.0, 1.0));
        assert_eq!(filter_mode(TextureFilter::Linear), wgpu::FilterMode::Linear);
    }
}
