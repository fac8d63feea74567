//! The `wgpu` implementation of [`RenderDevice`].
//!
//! Texture units are realised as one `binding_array<texture_2d<f32>>` bind
//! group: whatever is bound to units `0..N` becomes the array contents, with
//! unused entries padded by a 1x1 white fallback view. The bind group is
//! rebuilt lazily, only when the set of bound texture ids changes. Named
//! uniforms map to uniform buffers declared per shader.

use std::borrow::Cow;
use std::num::NonZeroU32;
use std::sync::Arc;

use ahash::HashMap;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::device::{
    BufferDescriptor, BufferUsage, RenderDevice, ShaderDescriptor, ShaderSource,
    TextureDescriptor, TextureFormat,
};
use crate::error::GpuError;
use crate::handles::{
    BufferInner, GpuBuffer, GpuShader, GpuTexture, ShaderInner, TextureInner, next_resource_id,
};

/// Number of texture units the backend exposes. Matches the size of the
/// `binding_array` declared by batch shaders.
pub const TEXTURE_UNITS: u32 = 32;

/// GPU-side data backing a [`GpuShader`] handle.
#[derive(Debug)]
pub struct ShaderData {
    pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    uniform_bind_group: wgpu::BindGroup,
    /// Named uniform buffers, e.g. `u_projection`.
    uniforms: HashMap<String, wgpu::Buffer>,
}

/// Mutable binding state, behind a mutex so the device can stay `&self`.
struct DeviceState {
    bound_shader: Option<GpuShader>,
    units: Vec<Option<GpuTexture>>,
    /// Texture ids the current bind group was built from.
    bound_unit_ids: Vec<u64>,
    texture_bind_group: Option<wgpu::BindGroup>,
    target: Option<Arc<wgpu::TextureView>>,
}

/// [`RenderDevice`] over a `wgpu` device and queue.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target_format: wgpu::TextureFormat,
    sampler: wgpu::Sampler,
    _fallback_texture: wgpu::Texture,
    fallback_view: wgpu::TextureView,
    state: Mutex<DeviceState>,
}

impl WgpuDevice {
    /// Request an adapter and device suitable for batch rendering.
    ///
    /// Requires texture binding arrays with non-uniform indexing; adapters
    /// without them are rejected with [`GpuError::DeviceRequest`].
    pub fn new() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| GpuError::AdapterRequest(format!("{e}")))?;

        let info = adapter.get_info();
        info!(name = %info.name, backend = ?info.backend, "selected GPU adapter");

        let mut limits = wgpu::Limits::default();
        limits.max_binding_array_elements_per_shader_stage = limits
            .max_binding_array_elements_per_shader_stage
            .max(TEXTURE_UNITS);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("pyrite_device"),
            required_features: wgpu::Features::TEXTURE_BINDING_ARRAY
                | wgpu::Features::SAMPLED_TEXTURE_AND_STORAGE_BUFFER_ARRAY_NON_UNIFORM_INDEXING,
            required_limits: limits,
            ..Default::default()
        }))
        .map_err(|e| GpuError::DeviceRequest(format!("{e}")))?;

        device.on_uncaptured_error(std::sync::Arc::new(|e| {
            error!("uncaptured GPU error: {e}");
        }));

        Ok(Self::from_raw(
            device,
            queue,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ))
    }

    /// Wrap an already-created device and queue, e.g. one owned by a
    /// windowing layer with a surface of `target_format`.
    pub fn from_raw(
        device: wgpu::Device,
        queue: wgpu::Queue,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let fallback_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("pyrite_fallback_texture"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &fallback_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[255, 255, 255, 255],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        let fallback_view = fallback_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("pyrite_batch_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            device,
            queue,
            target_format,
            sampler,
            _fallback_texture: fallback_texture,
            fallback_view,
            state: Mutex::new(DeviceState {
                bound_shader: None,
                units: vec![None; TEXTURE_UNITS as usize],
                bound_unit_ids: Vec::new(),
                texture_bind_group: None,
                target: None,
            }),
        }
    }

    /// Set the texture view draws are submitted against. Draws issued with
    /// no target are dropped with a warning.
    pub fn set_render_target(&self, view: Arc<wgpu::TextureView>) {
        self.state.lock().target = Some(view);
    }

    pub fn clear_render_target(&self) {
        self.state.lock().target = None;
    }

    fn resolve_source(source: &ShaderSource) -> Result<Cow<'static, str>, GpuError> {
        match source {
            ShaderSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|e| GpuError::Io {
                    path: path.clone(),
                    source: e,
                }),
            ShaderSource::String(text) => Ok(text.clone()),
        }
    }

    /// Rebuild the texture-array bind group if the bound units changed,
    /// returning the group to draw with.
    fn refresh_texture_bind_group(
        &self,
        state: &mut DeviceState,
        layout: &wgpu::BindGroupLayout,
    ) -> wgpu::BindGroup {
        let ids: Vec<u64> = state
            .units
            .iter()
            .map(|u| u.as_ref().map_or(0, |t| t.id))
            .collect();
        if ids == state.bound_unit_ids
            && let Some(bind_group) = &state.texture_bind_group
        {
            return bind_group.clone();
        }

        let mut views: Vec<&wgpu::TextureView> = Vec::with_capacity(TEXTURE_UNITS as usize);
        for unit in &state.units {
            match unit.as_ref().and_then(|t| t.view()) {
                Some(view) => views.push(view.as_ref()),
                None => views.push(&self.fallback_view),
            }
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pyrite_texture_array_bg"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureViewArray(&views),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        state.texture_bind_group = Some(bind_group.clone());
        state.bound_unit_ids = ids;
        bind_group
    }
}

/// Vertex layout all batch shaders consume: position, uv, color, slot.
fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRS: &[wgpu::VertexAttribute] = &wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2, // uv
        2 => Float32x4, // color
        3 => Uint32,    // texture slot
    ];
    wgpu::VertexBufferLayout {
        array_stride: 36,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: ATTRS,
    }
}

impl RenderDevice for WgpuDevice {
    fn create_buffer(&self, desc: &BufferDescriptor<'_>) -> Result<GpuBuffer, GpuError> {
        let usage = match desc.usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            BufferUsage::Index => wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        };
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: desc.label,
            size: desc.size,
            usage,
            mapped_at_creation: false,
        });
        Ok(GpuBuffer {
            id: next_resource_id(),
            size: desc.size,
            inner: BufferInner::Real(buffer),
        })
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        let Some(raw) = buffer.raw() else {
            error!(buffer = buffer.id, "write_buffer on a non-wgpu buffer handle");
            return;
        };
        self.queue.write_buffer(raw, offset, data);
    }

    fn create_texture(
        &self,
        desc: &TextureDescriptor<'_>,
        pixels: &[u8],
    ) -> Result<GpuTexture, GpuError> {
        let format = match desc.format {
            TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureFormat::R8 => wgpu::TextureFormat::R8Unorm,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: desc.label,
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(desc.width * desc.format.bytes_per_pixel()),
                rows_per_image: Some(desc.height),
            },
            wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(GpuTexture {
            id: next_resource_id(),
            width: desc.width,
            height: desc.height,
            inner: TextureInner::Real {
                texture: Arc::new(texture),
                view: Arc::new(view),
            },
        })
    }

    fn create_shader(&self, desc: &ShaderDescriptor<'_>) -> Result<GpuShader, GpuError> {
        let source = Self::resolve_source(&desc.source)?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: desc.label,
                source: wgpu::ShaderSource::Wgsl(source),
            });
        if let Some(e) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(GpuError::ShaderCompile(format!("{e}")));
        }

        let texture_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("pyrite_texture_array_layout"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: NonZeroU32::new(TEXTURE_UNITS),
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ],
                });

        let uniform_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("pyrite_uniform_layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });

        let projection = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pyrite_u_projection"),
            size: 64, // mat4x4<f32>
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pyrite_uniform_bg"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: projection.as_entire_binding(),
            }],
        });

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline_layout =
            self.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: desc.label,
                    bind_group_layouts: &[&texture_layout, &uniform_layout],
                    push_constant_ranges: &[],
                });
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: desc.label,
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_main"),
                    buffers: &[vertex_layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.target_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None, // 2D quads, no culling
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });
        if let Some(e) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(GpuError::PipelineLink(format!("{e}")));
        }

        let mut uniforms = HashMap::default();
        uniforms.insert("u_projection".to_string(), projection);

        debug!(label = ?desc.label, "created shader pipeline");
        Ok(GpuShader {
            id: next_resource_id(),
            inner: ShaderInner::Real(Arc::new(ShaderData {
                pipeline,
                texture_layout,
                uniform_bind_group,
                uniforms,
            })),
        })
    }

    fn bind_shader(&self, shader: &GpuShader) {
        self.state.lock().bound_shader = Some(shader.clone());
    }

    fn unbind_shader(&self) {
        self.state.lock().bound_shader = None;
    }

    fn set_uniform_mat4(&self, name: &str, value: &[[f32; 4]; 4]) {
        let state = self.state.lock();
        let Some(data) = state.bound_shader.as_ref().and_then(|s| s.data()) else {
            warn!(name, "set_uniform_mat4 with no shader bound");
            return;
        };
        match data.uniforms.get(name) {
            Some(buffer) => self.queue.write_buffer(buffer, 0, bytemuck::bytes_of(value)),
            None => warn!(name, "unknown mat4 uniform"),
        }
    }

    fn set_uniform_int_array(&self, name: &str, values: &[i32]) {
        // Sampler slot mapping is fixed by the pipeline layout; nothing to
        // upload at runtime.
        debug!(name, len = values.len(), "int array uniform fixed by layout");
    }

    fn bind_texture_unit(&self, unit: u32, texture: &GpuTexture) {
        if unit >= TEXTURE_UNITS {
            warn!(unit, "texture unit out of range");
            return;
        }
        self.state.lock().units[unit as usize] = Some(texture.clone());
    }

    fn draw_indexed(&self, vertices: &GpuBuffer, indices: &GpuBuffer, index_count: u32) {
        let mut state = self.state.lock();
        let Some(shader) = state.bound_shader.clone() else {
            warn!("draw_indexed with no shader bound");
            return;
        };
        let Some(data) = shader.data() else {
            error!("draw_indexed with a non-wgpu shader handle");
            return;
        };
        let Some(target) = state.target.clone() else {
            warn!("draw_indexed with no render target set");
            return;
        };
        let (Some(vbo), Some(ibo)) = (vertices.raw(), indices.raw()) else {
            error!("draw_indexed with non-wgpu buffer handles");
            return;
        };

        let texture_bg = self.refresh_texture_bind_group(&mut state, &data.texture_layout);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("pyrite_batch_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("pyrite_batch_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.as_ref(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&data.pipeline);
            pass.set_bind_group(0, &texture_bg, &[]);
            pass.set_bind_group(1, &data.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, vbo.slice(..));
            pass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..index_count, 0, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}
