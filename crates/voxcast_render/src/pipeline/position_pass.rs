//! Position pass
//!
//! Renders the volume's bounding box twice into a pair of off-screen targets:
//! once with back faces culled (ray entry points) and once with front faces
//! culled (ray exit points). Each target stores box-local coordinates as RGB
//! and coverage as alpha.
//!
//! The targets are owned by this pass and are recreated whenever the
//! viewport size changes.

use wgpu::util::DeviceExt;

use super::types::{BoxVertex, PositionUniforms, DEPTH_FORMAT, POSITION_FORMAT};

/// Unit cube corners, corner `i` = `(i & 1, (i >> 1) & 1, (i >> 2) & 1)`
pub const BOX_VERTICES: [BoxVertex; 8] = [
    BoxVertex { position: [0.0, 0.0, 0.0] },
    BoxVertex { position: [1.0, 0.0, 0.0] },
    BoxVertex { position: [0.0, 1.0, 0.0] },
    BoxVertex { position: [1.0, 1.0, 0.0] },
    BoxVertex { position: [0.0, 0.0, 1.0] },
    BoxVertex { position: [1.0, 0.0, 1.0] },
    BoxVertex { position: [0.0, 1.0, 1.0] },
    BoxVertex { position: [1.0, 1.0, 1.0] },
];

/// Twelve triangles, counter-clockwise when seen from outside
pub const BOX_INDICES: [u16; 36] = [
    0, 4, 6, 0, 6, 2, // -X
    1, 3, 7, 1, 7, 5, // +X
    0, 1, 5, 0, 5, 4, // -Y
    2, 6, 7, 2, 7, 3, // +Y
    0, 2, 3, 0, 3, 1, // -Z
    4, 5, 7, 4, 7, 6, // +Z
];

/// Which faces of the box a render keeps
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoxFaces {
    /// Faces towards the camera: ray entry
    Front,
    /// Faces away from the camera: ray exit
    Back,
}

/// Front and back position targets plus a shared depth buffer
pub struct RenderTargetPair {
    pub front: wgpu::TextureView,
    pub back: wgpu::TextureView,
    depth: wgpu::TextureView,
    size: (u32, u32),
}

impl RenderTargetPair {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let target = |label: &str, format: wgpu::TextureFormat, usage: wgpu::TextureUsages| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };
        let color_usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;

        Self {
            front: target("Front Position Target", POSITION_FORMAT, color_usage),
            back: target("Back Position Target", POSITION_FORMAT, color_usage),
            depth: target("Position Depth Texture", DEPTH_FORMAT, wgpu::TextureUsages::RENDER_ATTACHMENT),
            size: (width, height),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    fn view(&self, faces: BoxFaces) -> &wgpu::TextureView {
        match faces {
            BoxFaces::Front => &self.front,
            BoxFaces::Back => &self.back,
        }
    }
}

/// Render pipeline pair for entry/exit positions
pub struct PositionPass {
    front_pipeline: wgpu::RenderPipeline,
    back_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    targets: Option<RenderTargetPair>,
}

impl PositionPass {
    /// Create the pass (targets are created by [`Self::ensure_targets`])
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Position Bind Group Layout"),
            entries: &[
                // Uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Position Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Position Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/position.wgsl").into()),
        });

        let front_pipeline = Self::create_pipeline(device, &pipeline_layout, &shader, BoxFaces::Front);
        let back_pipeline = Self::create_pipeline(device, &pipeline_layout, &shader, BoxFaces::Back);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Position Uniform Buffer"),
            contents: bytemuck::bytes_of(&PositionUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Position Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Box Vertex Buffer"),
            contents: bytemuck::cast_slice(&BOX_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Box Index Buffer"),
            contents: bytemuck::cast_slice(&BOX_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            front_pipeline,
            back_pipeline,
            uniform_buffer,
            bind_group,
            vertex_buffer,
            index_buffer,
            targets: None,
        }
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        faces: BoxFaces,
    ) -> wgpu::RenderPipeline {
        let (label, cull_mode) = match faces {
            BoxFaces::Front => ("Position Front Pipeline", wgpu::Face::Back),
            BoxFaces::Back => ("Position Back Pipeline", wgpu::Face::Front),
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[Self::vertex_buffer_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: POSITION_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(cull_mode),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    /// Get the vertex buffer layout for BoxVertex
    fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BoxVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position: vec3<f32>
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
            ],
        }
    }

    /// Ensure the render targets exist and match the viewport
    ///
    /// Returns `true` if they were (re)created, which invalidates any bind
    /// group holding the old views.
    pub fn ensure_targets(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        let (width, height) = (width.max(1), height.max(1));
        if self.targets.as_ref().is_some_and(|t| t.size == (width, height)) {
            return false;
        }
        log::debug!("Recreating position targets at {}x{}", width, height);
        self.targets = Some(RenderTargetPair::new(device, width, height));
        true
    }

    /// Current targets, if created
    pub fn targets(&self) -> Option<&RenderTargetPair> {
        self.targets.as_ref()
    }

    /// Update uniforms
    pub fn update_uniforms(&self, queue: &wgpu::Queue, uniforms: &PositionUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Render entry and exit positions
    ///
    /// Does nothing until [`Self::ensure_targets`] has been called.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder) {
        let Some(targets) = self.targets.as_ref() else {
            log::warn!("Position targets missing; skipping position pass");
            return;
        };
        self.render_faces(encoder, targets, BoxFaces::Front);
        self.render_faces(encoder, targets, BoxFaces::Back);
    }

    fn render_faces(&self, encoder: &mut wgpu::CommandEncoder, targets: &RenderTargetPair, faces: BoxFaces) {
        let (label, pipeline) = match faces {
            BoxFaces::Front => ("Position Front Pass", &self.front_pipeline),
            BoxFaces::Back => ("Position Back Pass", &self.back_pipeline),
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: targets.view(faces),
                resolve_target: None,
                ops: wgpu::Operations {
                    // Alpha 0 marks pixels the box does not cover
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &targets.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..BOX_INDICES.len() as u32, 0, 0..1);
    }
}
