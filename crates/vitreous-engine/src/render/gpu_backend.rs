use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::compose::SurfaceId;
use crate::coords::PixelSize;
use crate::program::{ShaderProgram, ShaderVariant};

use super::{
    BackendError, NestedUniforms, QuadVertex, StandaloneUniforms, SurfaceBackend, SurfaceDraw,
    QUAD_VERTICES,
};

/// Format of every surface target. Colour is stored unmultiplied.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct VariantPipeline {
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
}

#[derive(Default)]
struct SurfaceTarget {
    /// Bumped on every reconfigure so samplers of this target rebind.
    generation: u64,
    texture: Option<wgpu::Texture>,
    view: Option<wgpu::TextureView>,

    variant: Option<ShaderVariant>,
    ubo: Option<wgpu::Buffer>,
    bind_group: Option<wgpu::BindGroup>,
    bound_parent: Option<(SurfaceId, u64)>,
}

/// `wgpu` implementation of [`SurfaceBackend`].
///
/// Draws are recorded into one encoder per tick and submitted by `flush`.
pub struct GpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    max_dimension: u32,

    quad_vbo: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,
    pipelines: HashMap<ShaderVariant, VariantPipeline>,
    targets: HashMap<SurfaceId, SurfaceTarget>,
    encoder: Option<wgpu::CommandEncoder>,
}

impl GpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let max_dimension = device.limits().max_texture_dimension_2d;
        Self {
            device,
            queue,
            max_dimension,
            quad_vbo: None,
            sampler: None,
            pipelines: HashMap::new(),
            targets: HashMap::new(),
            encoder: None,
        }
    }

    /// The current view of a surface target and its generation.
    ///
    /// `None` while the surface is unallocated or has an empty size.
    pub fn target_view(&self, id: SurfaceId) -> Option<(&wgpu::TextureView, u64)> {
        let target = self.targets.get(&id)?;
        target.view.as_ref().map(|view| (view, target.generation))
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_static_buffers(&mut self) {
        if self.quad_vbo.is_some() {
            return;
        }
        self.quad_vbo = Some(self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("vitreous quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));
    }

    fn ensure_sampler(&mut self) {
        if self.sampler.is_some() {
            return;
        }
        self.sampler = Some(self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("vitreous parent sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        }));
    }

    fn ensure_pipeline(&mut self, variant: ShaderVariant, program: &ShaderProgram) {
        if self.pipelines.contains_key(&variant) {
            return;
        }

        let module = program.create_module(&self.device);
        let bind_group_layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(program.label()),
                entries: &layout_entries(variant),
            });

        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(program.label()),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(program.label()),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(program.vertex_entry()),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(program.fragment_entry()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("pipeline created for {}", program.label());
        self.pipelines.insert(
            variant,
            VariantPipeline {
                bind_group_layout,
                pipeline,
            },
        );
    }
}

impl SurfaceBackend for GpuBackend {
    fn allocate(&mut self, id: SurfaceId) -> Result<(), BackendError> {
        self.targets.entry(id).or_default();
        Ok(())
    }

    fn configure(&mut self, id: SurfaceId, size: PixelSize) -> Result<(), BackendError> {
        if size.width > self.max_dimension || size.height > self.max_dimension {
            return Err(BackendError::ResourceUnavailable {
                id,
                reason: format!(
                    "{}x{} exceeds the device limit of {}",
                    size.width, size.height, self.max_dimension
                ),
            });
        }

        let target = self
            .targets
            .get_mut(&id)
            .ok_or(BackendError::UnknownSurface(id))?;

        target.generation += 1;
        target.texture = None;
        target.view = None;

        if !size.is_empty() {
            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("vitreous surface target"),
                size: wgpu::Extent3d {
                    width: size.width,
                    height: size.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TARGET_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            target.view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
            target.texture = Some(texture);
        }

        log::trace!("{id} target configured at {}x{}", size.width, size.height);
        Ok(())
    }

    fn install_program(
        &mut self,
        id: SurfaceId,
        variant: ShaderVariant,
        program: &ShaderProgram,
    ) -> Result<(), BackendError> {
        if !self.targets.contains_key(&id) {
            return Err(BackendError::UnknownSurface(id));
        }
        self.ensure_pipeline(variant, program);

        let ubo_size = match variant {
            ShaderVariant::Standalone => std::mem::size_of::<StandaloneUniforms>(),
            ShaderVariant::Nested => std::mem::size_of::<NestedUniforms>(),
        };
        let ubo = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vitreous surface ubo"),
            size: ubo_size as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let target = self
            .targets
            .get_mut(&id)
            .ok_or(BackendError::UnknownSurface(id))?;

        target.bind_group = match (variant, self.pipelines.get(&variant)) {
            (ShaderVariant::Standalone, Some(p)) => {
                Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("vitreous standalone bind group"),
                    layout: &p.bind_group_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: ubo.as_entire_binding(),
                    }],
                }))
            }
            // Nested groups need the parent view; built at draw time.
            _ => None,
        };
        target.variant = Some(variant);
        target.ubo = Some(ubo);
        target.bound_parent = None;
        Ok(())
    }

    fn draw(&mut self, id: SurfaceId, draw: &SurfaceDraw) -> Result<(), BackendError> {
        let parent = match draw.parent {
            Some(parent) => {
                let unavailable = BackendError::ParentUnavailable { id, parent };
                let p = self.targets.get(&parent).ok_or(unavailable.clone())?;
                let view = p.view.clone().ok_or(unavailable)?;
                Some((parent, p.generation, view))
            }
            None => None,
        };

        self.ensure_static_buffers();
        self.ensure_sampler();

        let target = self
            .targets
            .get_mut(&id)
            .ok_or(BackendError::UnknownSurface(id))?;
        let variant = target.variant.ok_or(BackendError::NoProgram(id))?;
        let pipeline = self
            .pipelines
            .get(&variant)
            .ok_or(BackendError::NoProgram(id))?;
        let Some(view) = target.view.as_ref() else {
            // Empty size: nothing to draw into.
            return Ok(());
        };
        let ubo = target.ubo.as_ref().ok_or(BackendError::NoProgram(id))?;

        self.queue.write_buffer(ubo, 0, draw.uniforms.as_bytes());

        if let Some((parent_id, generation, parent_view)) = &parent {
            let key = (*parent_id, *generation);
            if target.bound_parent != Some(key) || target.bind_group.is_none() {
                let Some(sampler) = self.sampler.as_ref() else {
                    return Ok(());
                };
                target.bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("vitreous nested bind group"),
                    layout: &pipeline.bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: ubo.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(parent_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(sampler),
                        },
                    ],
                }));
                target.bound_parent = Some(key);
            }
        }

        let bind_group = target.bind_group.as_ref().ok_or(BackendError::NoProgram(id))?;
        let Some(quad_vbo) = self.quad_vbo.as_ref() else {
            return Ok(());
        };

        let encoder = self.encoder.get_or_insert_with(|| {
            self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("vitreous surface encoder"),
            })
        });

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("vitreous surface pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&pipeline.pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
        Ok(())
    }

    fn release(&mut self, id: SurfaceId) {
        if self.targets.remove(&id).is_some() {
            log::trace!("{id} target released");
        }
    }

    fn flush(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
    }
}

fn layout_entries(variant: ShaderVariant) -> Vec<wgpu::BindGroupLayoutEntry> {
    let ubo_size = match variant {
        ShaderVariant::Standalone => std::mem::size_of::<StandaloneUniforms>(),
        ShaderVariant::Nested => std::mem::size_of::<NestedUniforms>(),
    };
    let mut entries = vec![wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(ubo_size as u64),
        },
        count: None,
    }];
    if variant == ShaderVariant::Nested {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    entries
}
