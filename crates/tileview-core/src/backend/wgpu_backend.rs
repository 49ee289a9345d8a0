//! Offscreen wgpu renderer (Metal / Vulkan / DX12).
//!
//! Draws are recorded during a frame and encoded into a single render pass
//! at `end_frame`. Tile textures are expanded to RGBA on the CPU and written
//! with `Queue::write_texture`, so transfer buffers are not offered.

use bytemuck::{Pod, Zeroable};
use tracing::{debug, error, info};
use wgpu::util::DeviceExt;

use super::{
    DriverFeature, FilterMode, GraphicsBackend, ProgramId, ProgramSource, Quad, TextureDesc,
    TextureId, Viewport,
};
use crate::color::shader::COLOR_PROGRAM_WGSL;
use crate::color::ColorParams;
use crate::error::{Result, TileViewError};
use crate::format::{decode_texels, TextureStorage};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

// ---------------------------------------------------------------------------
// Uniform and vertex layouts (must match the WGSL structs exactly)
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct FrameUniforms {
    viewport: [f32; 2],
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ColorUniforms {
    gain: f32,
    gamma: f32,
    channel_view: i32,
    image_channels: i32,
    pixel_view: u32,
    linear_interp: u32,
    width: i32,
    height: i32,
}

impl From<&ColorParams> for ColorUniforms {
    fn from(p: &ColorParams) -> Self {
        Self {
            gain: p.gain,
            gamma: p.gamma,
            channel_view: p.channel_view,
            image_channels: p.image_channels,
            pixel_view: p.pixel_view as u32,
            linear_interp: p.linear_interpolation as u32,
            width: p.width,
            height: p.height,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Vertex {
    position: [f32; 2],
    tex_coord: [f32; 2],
    color: [f32; 4],
}

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

/// One fragment entry point, blended and opaque.
struct PipelinePair {
    blended: wgpu::RenderPipeline,
    opaque: wgpu::RenderPipeline,
}

impl PipelinePair {
    fn get(&self, opaque: bool) -> &wgpu::RenderPipeline {
        if opaque {
            &self.opaque
        } else {
            &self.blended
        }
    }
}

fn create_pipeline_pair(
    device: &wgpu::Device,
    module: &wgpu::ShaderModule,
    vertex_entry: &str,
    fragment_entry: &str,
) -> PipelinePair {
    let premultiplied = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    let make = |blend: wgpu::BlendState| {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(fragment_entry),
            layout: None,
            vertex: wgpu::VertexState {
                module,
                entry_point: Some(vertex_entry),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &VERTEX_ATTRIBUTES,
                }],
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some(fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview_mask: None,
            cache: None,
        })
    };
    PipelinePair {
        blended: make(wgpu::BlendState {
            color: premultiplied,
            alpha: premultiplied,
        }),
        opaque: make(wgpu::BlendState::REPLACE),
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    desc: TextureDesc,
}

struct Program {
    pipelines: PipelinePair,
    params: Option<ColorUniforms>,
}

enum DrawKind {
    Solid,
    Textured(TextureId, FilterMode),
    Shaded(TextureId, FilterMode, ProgramId, ColorUniforms),
}

struct DrawCommand {
    kind: DrawKind,
    opaque: bool,
    first_vertex: u32,
}

struct RenderTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    viewport: Viewport,
}

fn storage_format(storage: TextureStorage) -> wgpu::TextureFormat {
    match storage {
        TextureStorage::Default | TextureStorage::Unorm8 => wgpu::TextureFormat::Rgba8Unorm,
        TextureStorage::Srgb8 | TextureStorage::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureStorage::Unorm16 | TextureStorage::Float16 | TextureStorage::Float32 => {
            wgpu::TextureFormat::Rgba16Float
        }
    }
}

// ---------------------------------------------------------------------------
// WgpuBackend
// ---------------------------------------------------------------------------

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    max_texture_dimension: u32,
    module: wgpu::ShaderModule,
    solid: PipelinePair,
    textured: PipelinePair,
    nearest_sampler: wgpu::Sampler,
    linear_sampler: wgpu::Sampler,
    textures: Vec<GpuTexture>,
    programs: Vec<Program>,
    active_program: Option<ProgramId>,
    target: Option<RenderTarget>,
    clear: [f32; 4],
    vertices: Vec<Vertex>,
    commands: Vec<DrawCommand>,
}

impl WgpuBackend {
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| TileViewError::Backend(format!("No suitable GPU adapter found: {e}")))?;

        let adapter_name = adapter.get_info().name.clone();
        info!("GPU adapter: {adapter_name}");
        let max_texture_dimension = adapter.limits().max_texture_dimension_2d;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("tileview"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits {
                max_texture_dimension_2d: max_texture_dimension,
                ..wgpu::Limits::default()
            },
            ..Default::default()
        }))
        .map_err(|e| TileViewError::Backend(format!("Failed to create GPU device: {e}")))?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tileview-color"),
            source: wgpu::ShaderSource::Wgsl(COLOR_PROGRAM_WGSL.into()),
        });
        let solid = create_pipeline_pair(&device, &module, "vs_main", "fs_solid");
        let textured = create_pipeline_pair(&device, &module, "vs_main", "fs_texture");

        let sampler = |filter: wgpu::FilterMode| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: None,
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter,
                min_filter: filter,
                ..Default::default()
            })
        };
        let nearest_sampler = sampler(wgpu::FilterMode::Nearest);
        let linear_sampler = sampler(wgpu::FilterMode::Linear);

        Ok(Self {
            adapter_name,
            max_texture_dimension,
            module,
            solid,
            textured,
            nearest_sampler,
            linear_sampler,
            textures: Vec::new(),
            programs: Vec::new(),
            active_program: None,
            target: None,
            clear: [0.0; 4],
            vertices: Vec::new(),
            commands: Vec::new(),
            device,
            queue,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Copy the last finished frame back to the CPU.
    pub fn read_pixels(&self) -> Result<image::RgbaImage> {
        let target = self.target.as_ref().ok_or(TileViewError::NotReady)?;
        let Viewport { width, height } = target.viewport;
        let unpadded = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size: padded as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut enc = self.device.create_command_encoder(&Default::default());
        enc.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(enc.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        slice.map_async(wgpu::MapMode::Read, move |r| {
            tx.send(r).ok();
        });
        self.device.poll(wgpu::PollType::wait_indefinitely()).ok();
        rx.recv()
            .map_err(|_| TileViewError::Backend("GPU channel closed".into()))?
            .map_err(|e| TileViewError::Backend(format!("Buffer mapping failed: {e}")))?;

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((unpadded * height) as usize);
        for row in data.chunks_exact(padded as usize) {
            pixels.extend_from_slice(&row[..unpadded as usize]);
        }
        drop(data);
        staging.unmap();

        image::RgbaImage::from_raw(width, height, pixels)
            .ok_or(TileViewError::InvalidDimensions { width, height })
    }

    fn gpu_texture(&self, texture: TextureId) -> Result<&GpuTexture> {
        self.textures
            .get(texture.0 as usize)
            .ok_or_else(|| TileViewError::Backend(format!("unknown texture {}", texture.0)))
    }

    fn allocate(&self, desc: &TextureDesc) -> Result<GpuTexture> {
        let max = self.max_texture_dimension;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(TileViewError::InvalidDimensions {
                width: desc.width,
                height: desc.height,
            });
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tile"),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: storage_format(desc.format.storage),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(GpuTexture {
            texture,
            view,
            desc: *desc,
        })
    }

    fn ensure_target(&mut self, viewport: Viewport) {
        if self.target.as_ref().is_some_and(|t| t.viewport == viewport) {
            return;
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("frame"),
            size: wgpu::Extent3d {
                width: viewport.width.max(1),
                height: viewport.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        debug!(
            width = viewport.width,
            height = viewport.height,
            "Allocated render target"
        );
        self.target = Some(RenderTarget {
            texture,
            view,
            viewport,
        });
    }

    fn texture_bind_group(
        &self,
        pipeline: &wgpu::RenderPipeline,
        texture: TextureId,
        filter: FilterMode,
    ) -> Result<wgpu::BindGroup> {
        let tex = self.gpu_texture(texture)?;
        let sampler = match filter {
            FilterMode::Nearest => &self.nearest_sampler,
            FilterMode::Linear => &self.linear_sampler,
        };
        Ok(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &pipeline.get_bind_group_layout(1),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&tex.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        }))
    }

    fn uniform_bind_group<T: Pod>(
        &self,
        pipeline: &wgpu::RenderPipeline,
        group: u32,
        data: &T,
    ) -> wgpu::BindGroup {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: None,
                contents: bytemuck::bytes_of(data),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &pipeline.get_bind_group_layout(group),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }
}

impl GraphicsBackend for WgpuBackend {
    fn name(&self) -> &str {
        "wgpu"
    }

    fn has_feature(&self, feature: DriverFeature) -> bool {
        match feature {
            DriverFeature::CoreShading
            | DriverFeature::SrgbTextures
            | DriverFeature::HalfFloatPixels
            | DriverFeature::FloatTextures => true,
            DriverFeature::ShadingExtension | DriverFeature::TransferBuffers => false,
        }
    }

    fn max_texture_dimension(&self) -> u32 {
        self.max_texture_dimension
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId> {
        let tex = self.allocate(desc)?;
        self.textures.push(tex);
        Ok(TextureId(self.textures.len() as u32 - 1))
    }

    fn respecify_texture(&mut self, texture: TextureId, desc: &TextureDesc) -> Result<()> {
        self.gpu_texture(texture)?;
        let tex = self.allocate(desc)?;
        self.textures[texture.0 as usize] = tex;
        Ok(())
    }

    fn set_filter(&mut self, texture: TextureId, filter: FilterMode) {
        if let Some(t) = self.textures.get_mut(texture.0 as usize) {
            t.desc.filter = filter;
        }
    }

    fn upload_region(
        &mut self,
        texture: TextureId,
        width: u32,
        height: u32,
        row_stride: usize,
        data: &[u8],
    ) -> Result<()> {
        let tex = self.gpu_texture(texture)?;
        if width == 0 || height == 0 {
            return Ok(());
        }
        if width > tex.desc.width || height > tex.desc.height {
            return Err(TileViewError::RegionOutOfBounds {
                x: 0,
                y: 0,
                width,
                height,
            });
        }
        let texels = decode_texels(&tex.desc.format, width, height, row_stride, data)?;
        let (bytes, texel_bytes): (Vec<u8>, u32) = match storage_format(tex.desc.format.storage) {
            wgpu::TextureFormat::Rgba16Float => (
                texels
                    .iter()
                    .flatten()
                    .flat_map(|v| half::f16::from_f32(*v).to_le_bytes())
                    .collect(),
                8,
            ),
            _ => (
                texels
                    .iter()
                    .flatten()
                    .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
                    .collect(),
                4,
            ),
        };

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &tex.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * texel_bytes),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn map_transfer_buffer(&mut self, _index: usize, _size: usize) -> Result<&mut [u8]> {
        Err(TileViewError::Backend(
            "transfer buffers are not supported".into(),
        ))
    }

    fn unmap_transfer_buffer(&mut self, _index: usize) {}

    fn upload_from_transfer_buffer(
        &mut self,
        _texture: TextureId,
        index: usize,
        _width: u32,
        _height: u32,
    ) -> Result<()> {
        Err(TileViewError::TransferMap { index })
    }

    fn compile_program(&mut self, source: &ProgramSource) -> Result<ProgramId> {
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source.label),
            source: wgpu::ShaderSource::Wgsl(source.wgsl.into()),
        });
        let info = pollster::block_on(module.get_compilation_info());
        let errors: Vec<String> = info
            .messages
            .iter()
            .filter(|m| m.message_type == wgpu::CompilationMessageType::Error)
            .map(|m| m.message.clone())
            .collect();
        if !errors.is_empty() {
            let log = errors.join("\n");
            error!(label = source.label, "Colour program failed to compile");
            return Err(TileViewError::ShaderCompile(log));
        }

        let pipelines =
            create_pipeline_pair(&self.device, &module, source.vertex_entry, source.fragment_entry);
        self.programs.push(Program {
            pipelines,
            params: None,
        });
        Ok(ProgramId(self.programs.len() as u32 - 1))
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.active_program = program;
    }

    fn set_color_params(&mut self, program: ProgramId, params: &ColorParams) {
        if let Some(p) = self.programs.get_mut(program.0 as usize) {
            p.params = Some(ColorUniforms::from(params));
        }
    }

    fn begin_frame(&mut self, viewport: Viewport, clear: [f32; 4]) {
        self.ensure_target(viewport);
        self.clear = clear;
        self.vertices.clear();
        self.commands.clear();
    }

    fn draw_quad(&mut self, quad: &Quad) {
        let kind = match quad.texture {
            None => DrawKind::Solid,
            Some(texture) => {
                let filter = self
                    .textures
                    .get(texture.0 as usize)
                    .map_or(FilterMode::Linear, |t| t.desc.filter);
                let program = self.active_program.and_then(|id| {
                    self.programs
                        .get(id.0 as usize)
                        .and_then(|p| p.params)
                        .map(|params| (id, params))
                });
                match program {
                    Some((id, params)) => DrawKind::Shaded(texture, filter, id, params),
                    None => DrawKind::Textured(texture, filter),
                }
            }
        };

        let first_vertex = self.vertices.len() as u32;
        for i in [0usize, 1, 2, 0, 2, 3] {
            self.vertices.push(Vertex {
                position: quad.corners[i],
                tex_coord: quad.tex_coords[i],
                color: quad.color,
            });
        }
        self.commands.push(DrawCommand {
            kind,
            opaque: quad.opaque,
            first_vertex,
        });
    }

    fn end_frame(&mut self) -> Result<()> {
        let target = self.target.as_ref().ok_or(TileViewError::NotReady)?;
        let frame = FrameUniforms {
            viewport: [
                target.viewport.width.max(1) as f32,
                target.viewport.height.max(1) as f32,
            ],
            _pad: [0.0; 2],
        };

        // Resolve every command's pipeline and bind groups before the pass
        // borrows them.
        let mut prepared = Vec::with_capacity(self.commands.len());
        for cmd in &self.commands {
            let (pipeline, texture_group, params_group) = match &cmd.kind {
                DrawKind::Solid => (self.solid.get(cmd.opaque), None, None),
                DrawKind::Textured(texture, filter) => {
                    let pipeline = self.textured.get(cmd.opaque);
                    let group = self.texture_bind_group(pipeline, *texture, *filter)?;
                    (pipeline, Some(group), None)
                }
                DrawKind::Shaded(texture, filter, program, params) => {
                    let pipeline = self
                        .programs
                        .get(program.0 as usize)
                        .map(|p| p.pipelines.get(cmd.opaque))
                        .ok_or_else(|| TileViewError::Backend(format!("unknown program {}", program.0)))?;
                    let group = self.texture_bind_group(pipeline, *texture, *filter)?;
                    let params = self.uniform_bind_group(pipeline, 2, params);
                    (pipeline, Some(group), Some(params))
                }
            };
            let frame_group = self.uniform_bind_group(pipeline, 0, &frame);
            prepared.push((pipeline, frame_group, texture_group, params_group, cmd.first_vertex));
        }

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("quads"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let mut enc = self.device.create_command_encoder(&Default::default());
        {
            let [r, g, b, a] = self.clear.map(f64::from);
            let mut pass = enc.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
            if !self.vertices.is_empty() {
                pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            }
            for (pipeline, frame_group, texture_group, params_group, first) in &prepared {
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, frame_group, &[]);
                if let Some(group) = texture_group {
                    pass.set_bind_group(1, group, &[]);
                }
                if let Some(group) = params_group {
                    pass.set_bind_group(2, group, &[]);
                }
                pass.draw(*first..*first + 6, 0..1);
            }
        }
        self.queue.submit(std::iter::once(enc.finish()));
        self.device.poll(wgpu::PollType::wait_indefinitely()).ok();
        Ok(())
    }
}
