//! GPU-compatible data types for the raycasting passes
//!
//! These types are designed to match the shader layouts exactly.
//! All types derive Pod and Zeroable for safe GPU buffer operations.

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use voxcast_core::RayMarchParameters;
use voxcast_math::{mat4, Mat4, Vec3};

/// A bounding-box corner in box-local coordinates, `[0, 1]^3`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BoxVertex {
    pub position: [f32; 3],
}

/// A vertex of the cutting-plane overlay, in plane-local coordinates
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct OverlayVertex {
    pub position: [f32; 3],
    /// RGBA color (straight alpha)
    pub color: [f32; 4],
}

impl OverlayVertex {
    pub fn new(position: Vec3, color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            color,
        }
    }
}

/// Uniforms for the position pass
/// Layout: 128 bytes total (must match position.wgsl PositionUniforms)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PositionUniforms {
    /// Projection * view (64 bytes)
    pub view_proj: Mat4,
    /// Box-local to world (64 bytes)
    pub model: Mat4,
}

impl Default for PositionUniforms {
    fn default() -> Self {
        Self {
            view_proj: mat4::IDENTITY,
            model: mat4::IDENTITY,
        }
    }
}

impl PositionUniforms {
    /// Uniforms for a volume of the given extent, centred on the origin
    pub fn new(view_proj: Mat4, volume_extent: Vec3) -> Self {
        Self {
            view_proj,
            model: box_model_matrix(volume_extent),
        }
    }
}

/// Box-local `[0, 1]^3` to world: `world = (local - 0.5) * extent`
pub fn box_model_matrix(volume_extent: Vec3) -> Mat4 {
    mat4::mul(
        mat4::scale(volume_extent),
        mat4::translation(Vec3::splat(-0.5)),
    )
}

bitflags! {
    /// Mode switches packed into [`RaycastUniforms::flags`]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct RaycastFlags: u32 {
        const SHADING = 1 << 0;
        const MIP = 1 << 1;
        const CUT = 1 << 2;
        const JITTER = 1 << 3;
    }
}

/// Uniforms for the raycast pass
/// Layout: 80 bytes total (must match raycast.wgsl RaycastUniforms)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct RaycastUniforms {
    /// Volume size in world units (voxels)
    pub volume_extent: [f32; 3],
    /// World units per sample
    pub step_size: f32,
    /// Cutting plane origin, world space
    pub plane_origin: [f32; 3],
    pub early_termination_alpha: f32,
    /// Cutting plane unit normal, world space
    pub plane_normal: [f32; 3],
    pub max_steps: u32,
    /// Volume texture size in texels
    pub volume_dims: [u32; 3],
    /// [`RaycastFlags`] bits
    pub flags: u32,
    /// Ambient, diffuse, specular, shininess
    pub lighting: [f32; 4],
}

impl RaycastUniforms {
    /// Pack marching parameters for the shader
    pub fn new(params: &RayMarchParameters, volume_dims: (u32, u32, u32), jitter: bool) -> Self {
        let mut flags = RaycastFlags::empty();
        flags.set(RaycastFlags::SHADING, params.shading);
        flags.set(RaycastFlags::MIP, params.mip);
        flags.set(RaycastFlags::CUT, params.cut_enabled);
        flags.set(RaycastFlags::JITTER, jitter);

        let lighting = params.lighting;
        Self {
            volume_extent: params.volume_extent.to_array(),
            step_size: params.step_size,
            plane_origin: params.plane_origin.to_array(),
            early_termination_alpha: params.early_termination_alpha,
            plane_normal: params.plane_normal.to_array(),
            max_steps: params.max_steps,
            volume_dims: [volume_dims.0, volume_dims.1, volume_dims.2],
            flags: flags.bits(),
            lighting: [lighting.ambient, lighting.diffuse, lighting.specular, lighting.shininess],
        }
    }

    pub fn flags(&self) -> RaycastFlags {
        RaycastFlags::from_bits_truncate(self.flags)
    }
}

/// Uniforms for the overlay pass
/// Layout: 128 bytes total (must match overlay.wgsl OverlayUniforms)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct OverlayUniforms {
    /// Projection * view (64 bytes)
    pub view_proj: Mat4,
    /// Plane-local to world (64 bytes)
    pub model: Mat4,
}

impl Default for OverlayUniforms {
    fn default() -> Self {
        Self {
            view_proj: mat4::IDENTITY,
            model: mat4::IDENTITY,
        }
    }
}

/// Format of the entry/exit position targets
pub const POSITION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Format of the depth buffer used inside the position pass
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Format of the volume texture (`sample / 65535`)
pub const VOLUME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

/// Format of the transfer-function texture
pub const TRANSFER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;
    use voxcast_core::Lighting;

    #[test]
    fn test_box_vertex_size() {
        assert_eq!(size_of::<BoxVertex>(), 12);
    }

    #[test]
    fn test_overlay_vertex_size() {
        // 3 floats position + 4 floats color = 28 bytes
        assert_eq!(size_of::<OverlayVertex>(), 28);
    }

    #[test]
    fn test_position_uniforms_size() {
        assert_eq!(size_of::<PositionUniforms>(), 128);
    }

    #[test]
    fn test_raycast_uniforms_size() {
        // 5 rows of 16 bytes, each vec3 followed by a scalar
        assert_eq!(size_of::<RaycastUniforms>(), 80);
    }

    #[test]
    fn test_overlay_uniforms_size() {
        assert_eq!(size_of::<OverlayUniforms>(), 128);
    }

    #[test]
    fn test_alignment() {
        assert_eq!(std::mem::align_of::<BoxVertex>(), 4);
        assert_eq!(std::mem::align_of::<OverlayVertex>(), 4);
        assert_eq!(std::mem::align_of::<PositionUniforms>(), 4);
        assert_eq!(std::mem::align_of::<RaycastUniforms>(), 4);
        assert_eq!(std::mem::align_of::<OverlayUniforms>(), 4);
    }

    #[test]
    fn test_box_model_matrix_centres_volume() {
        let model = box_model_matrix(Vec3::new(10.0, 20.0, 30.0));
        let min = mat4::transform_point(model, Vec3::ZERO);
        let max = mat4::transform_point(model, Vec3::ONE);
        assert_eq!(min, Vec3::new(-5.0, -10.0, -15.0));
        assert_eq!(max, Vec3::new(5.0, 10.0, 15.0));
    }

    #[test]
    fn test_raycast_flags_packing() {
        let mut params = RayMarchParameters::new(Vec3::splat(8.0));
        params.mip = true;
        params.cut_enabled = true;
        params.lighting = Lighting { ambient: 0.1, diffuse: 0.2, specular: 0.3, shininess: 4.0 };

        let uniforms = RaycastUniforms::new(&params, (8, 8, 8), false);
        assert_eq!(uniforms.flags(), RaycastFlags::MIP | RaycastFlags::CUT);
        assert_eq!(uniforms.lighting, [0.1, 0.2, 0.3, 4.0]);
        assert_eq!(uniforms.volume_dims, [8, 8, 8]);

        let jittered = RaycastUniforms::new(&params, (8, 8, 8), true);
        assert!(jittered.flags().contains(RaycastFlags::JITTER));
    }
}
