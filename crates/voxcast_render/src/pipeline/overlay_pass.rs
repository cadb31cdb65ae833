//! Cutting-plane overlay
//!
//! Draws the plane as a half-transparent square with a red arrow along its
//! normal. The overlay is drawn after the raycast pass without clearing and
//! without depth testing, so it stays visible whatever the volume looks like.

use wgpu::util::DeviceExt;

use super::types::{OverlayUniforms, OverlayVertex};
use voxcast_core::{Color, PLANE_EXTENT};
use voxcast_math::Vec3;

/// Total arrow length in world units
pub const ARROW_LENGTH: f32 = 35.0;
/// Length of the arrow head
pub const ARROW_HEAD_LENGTH: f32 = 20.0;
/// Diameter of the arrow head base
pub const ARROW_HEAD_WIDTH: f32 = 10.0;

const PLANE_OPACITY: f32 = 0.5;
const ARROW_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const SHAFT_HALF_WIDTH: f32 = 0.75;
const HEAD_SEGMENTS: usize = 12;

/// Vertices in the overlay mesh
pub const OVERLAY_VERTEX_COUNT: usize = 6 + 12 + HEAD_SEGMENTS * 6;

/// Plane quad plus normal arrow, in plane-local space (normal = +Z)
pub fn overlay_geometry(plane_color: Color) -> Vec<OverlayVertex> {
    let mut vertices = Vec::with_capacity(OVERLAY_VERTEX_COUNT);
    let [r, g, b] = plane_color.to_array();
    let plane_rgba = [r, g, b, PLANE_OPACITY];

    // Plane quad
    let h = PLANE_EXTENT / 2.0;
    let corners = [
        Vec3::new(-h, -h, 0.0),
        Vec3::new(h, -h, 0.0),
        Vec3::new(h, h, 0.0),
        Vec3::new(-h, h, 0.0),
    ];
    push_quad(&mut vertices, corners, plane_rgba);

    // Shaft: two crossed quads so it reads from any angle
    let shaft_end = ARROW_LENGTH - ARROW_HEAD_LENGTH;
    let w = SHAFT_HALF_WIDTH;
    push_quad(
        &mut vertices,
        [
            Vec3::new(-w, 0.0, 0.0),
            Vec3::new(w, 0.0, 0.0),
            Vec3::new(w, 0.0, shaft_end),
            Vec3::new(-w, 0.0, shaft_end),
        ],
        ARROW_COLOR,
    );
    push_quad(
        &mut vertices,
        [
            Vec3::new(0.0, -w, 0.0),
            Vec3::new(0.0, w, 0.0),
            Vec3::new(0.0, w, shaft_end),
            Vec3::new(0.0, -w, shaft_end),
        ],
        ARROW_COLOR,
    );

    // Head: cone with a closed base
    let radius = ARROW_HEAD_WIDTH / 2.0;
    let tip = Vec3::new(0.0, 0.0, ARROW_LENGTH);
    let base_centre = Vec3::new(0.0, 0.0, shaft_end);
    let rim = |i: usize| {
        let angle = i as f32 / HEAD_SEGMENTS as f32 * std::f32::consts::TAU;
        Vec3::new(radius * angle.cos(), radius * angle.sin(), shaft_end)
    };
    for i in 0..HEAD_SEGMENTS {
        let (a, b) = (rim(i), rim(i + 1));
        for p in [a, b, tip, b, a, base_centre] {
            vertices.push(OverlayVertex::new(p, ARROW_COLOR));
        }
    }

    vertices
}

fn push_quad(vertices: &mut Vec<OverlayVertex>, corners: [Vec3; 4], color: [f32; 4]) {
    for i in [0, 1, 2, 0, 2, 3] {
        vertices.push(OverlayVertex::new(corners[i], color));
    }
}

/// Render pipeline for the cutting-plane overlay
pub struct OverlayPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
}

impl OverlayPass {
    /// Create a new overlay pass
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Overlay Bind Group Layout"),
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
            label: Some("Overlay Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/overlay.wgsl").into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Overlay Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Self::vertex_buffer_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Both sides of the plane are visible
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay Uniform Buffer"),
            contents: bytemuck::bytes_of(&OverlayUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Overlay Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay Vertex Buffer"),
            contents: bytemuck::cast_slice(&overlay_geometry(Color::WHITE)),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
            vertex_buffer,
        }
    }

    /// Get the vertex buffer layout for OverlayVertex
    fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OverlayVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position: vec3<f32>
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                // color: vec4<f32>
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 12,
                    shader_location: 1,
                },
            ],
        }
    }

    /// Update the transform and plane colour
    pub fn update(&self, queue: &wgpu::Queue, uniforms: &OverlayUniforms, plane_color: Color) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&overlay_geometry(plane_color)));
    }

    /// Draw the overlay on top of whatever `view` already holds
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
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

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..OVERLAY_VERTEX_COUNT as u32, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_count() {
        assert_eq!(overlay_geometry(Color::WHITE).len(), OVERLAY_VERTEX_COUNT);
    }

    #[test]
    fn test_vertex_buffer_layout_stride() {
        let layout = OverlayPass::vertex_buffer_layout();
        assert_eq!(layout.array_stride, std::mem::size_of::<OverlayVertex>() as u64);
    }

    #[test]
    fn test_plane_is_half_transparent_in_plane_colour() {
        let color = Color::new(0.2, 0.4, 0.6);
        let vertices = overlay_geometry(color);
        for v in &vertices[..6] {
            assert_eq!(v.color, [0.2, 0.4, 0.6, PLANE_OPACITY]);
            assert_eq!(v.position[2], 0.0);
            assert_eq!(v.position[0].abs(), PLANE_EXTENT / 2.0);
        }
    }

    #[test]
    fn test_arrow_spans_normal() {
        let vertices = overlay_geometry(Color::WHITE);
        let arrow = &vertices[6..];
        assert!(arrow.iter().all(|v| v.color == ARROW_COLOR));
        let max_z = arrow.iter().map(|v| v.position[2]).fold(f32::MIN, f32::max);
        let min_z = arrow.iter().map(|v| v.position[2]).fold(f32::MAX, f32::min);
        assert_eq!(max_z, ARROW_LENGTH);
        assert_eq!(min_z, 0.0);
    }

    #[test]
    fn test_head_radius() {
        let vertices = overlay_geometry(Color::WHITE);
        let head = &vertices[18..];
        let widest = head
            .iter()
            .map(|v| (v.position[0] * v.position[0] + v.position[1] * v.position[1]).sqrt())
            .fold(0.0f32, f32::max);
        assert!((widest - ARROW_HEAD_WIDTH / 2.0).abs() < 1e-4);
    }
}
