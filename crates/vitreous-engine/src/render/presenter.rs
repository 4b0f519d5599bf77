use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::compose::SurfaceId;
use crate::coords::Rect;
use crate::program::{ProgramSource, ShaderProgram};
use crate::render::{GpuBackend, QuadVertex, RenderCtx, RenderTarget, QUAD_VERTICES};

/// One surface to composite, at its on-screen rect.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PresentItem {
    pub id: SurfaceId,
    pub rect: Rect,
}

struct Slot {
    ubo: wgpu::Buffer,
    bind_group: Option<wgpu::BindGroup>,
    generation: u64,
}

/// Composites surface targets onto the window frame in the given order.
///
/// Surfaces are alpha blended over whatever the frame already holds; the
/// host draws its backdrop first.
#[derive(Default)]
pub struct Presenter {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    sampler: Option<wgpu::Sampler>,
    quad_vbo: Option<wgpu::Buffer>,
    slots: HashMap<SurfaceId, Slot>,
    failed: bool,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        backend: &GpuBackend,
        items: &[PresentItem],
    ) {
        if !ctx.viewport.is_valid() {
            return;
        }
        self.ensure_pipeline(ctx);
        self.ensure_static_buffers(ctx);
        self.slots.retain(|id, _| items.iter().any(|item| item.id == *id));

        let Some(bgl) = self.bind_group_layout.as_ref() else { return; };
        let Some(sampler) = self.sampler.as_ref() else { return; };

        let mut visible = Vec::with_capacity(items.len());
        for item in items {
            let rect = item.rect.normalized();
            if rect.is_empty() {
                continue;
            }
            let Some((view, generation)) = backend.target_view(item.id) else { continue; };

            let slot = self.slots.entry(item.id).or_insert_with(|| Slot {
                ubo: ctx.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("vitreous present ubo"),
                    size: std::mem::size_of::<PresentUniform>() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
                bind_group: None,
                generation: 0,
            });

            if slot.bind_group.is_none() || slot.generation != generation {
                slot.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("vitreous present bind group"),
                    layout: bgl,
                    entries: &[
                        wgpu::BindGroupEntry { binding: 0, resource: slot.ubo.as_entire_binding() },
                        wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(view) },
                        wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(sampler) },
                    ],
                }));
                slot.generation = generation;
            }

            ctx.queue.write_buffer(
                &slot.ubo,
                0,
                bytemuck::bytes_of(&PresentUniform {
                    viewport: [ctx.viewport.width, ctx.viewport.height],
                    origin: rect.origin.to_array(),
                    size: rect.size.to_array(),
                    _pad0: [0.0; 2],
                }),
            );
            visible.push(item.id);
        }

        if visible.is_empty() {
            return;
        }

        let Some(pipeline) = self.pipeline.as_ref() else { return; };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return; };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("vitreous present pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        for id in visible {
            let Some(bind_group) = self.slots.get(&id).and_then(|s| s.bind_group.as_ref()) else { continue; };
            rpass.set_bind_group(0, bind_group, &[]);
            rpass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
        }
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.failed || (self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some()) {
            return;
        }

        let program = match ShaderProgram::compile(ProgramSource {
            label: "vitreous.present",
            wgsl: include_str!("shaders/present.wgsl"),
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            attributes: &["texcoord"],
            uniforms: &["params", "surface_texture", "surface_sampler"],
        }) {
            Ok(program) => program,
            Err(err) => {
                log::error!("{err}");
                self.failed = true;
                return;
            }
        };
        let shader = program.create_module(ctx.device);

        let bind_group_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("vitreous present bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<PresentUniform>() as u64),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("vitreous present pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("vitreous present pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(program.vertex_entry()),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(program.fragment_entry()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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

        self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("vitreous present sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        }));
        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        self.slots.clear();
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() {
            return;
        }
        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("vitreous present quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct PresentUniform {
    viewport: [f32; 2],
    origin: [f32; 2],
    size: [f32; 2],
    _pad0: [f32; 2],
}
