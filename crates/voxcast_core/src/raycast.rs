//! Reference ray marcher
//!
//! This is the CPU rendition of `raycast.wgsl`. The GPU pass and this module
//! share the same conventions so the marching, clipping and compositing rules
//! can be tested without a device:
//!
//! - Entry and exit points live in box-local space, `[0, 1]^3`.
//! - World space is box-local space centred on the origin and scaled by the
//!   volume extent, one unit per voxel: `world = (local - 0.5) * extent`.
//! - The step size is measured in world units; the number of steps for a ray
//!   is `ceil(|exit - entry|_world / step_size)`, capped at `max_steps`, and
//!   samples are taken at both ends.
//! - Colours are returned premultiplied by coverage.

use voxcast_math::Vec3;

use crate::transfer_function::TransferLookup;

/// Accumulated alpha at which a ray stops marching
pub const DEFAULT_EARLY_TERMINATION_ALPHA: f32 = 0.95;

/// Default step size in world units (half a voxel)
pub const DEFAULT_STEP_SIZE: f32 = 0.5;

/// Default upper bound on samples per ray
pub const DEFAULT_MAX_STEPS: u32 = 2048;

/// Gradients shorter than this are treated as "no surface"
const MIN_GRADIENT_LENGTH: f32 = 1e-6;

/// Something that can be sampled like the volume texture
pub trait VolumeSampler {
    /// Normalised intensity at a box-local position, clamped at the border
    fn sample(&self, p: Vec3) -> f32;

    /// Size of one voxel in box-local units
    fn voxel_size(&self) -> Vec3;

    /// Central-difference gradient in box-local space
    fn gradient(&self, p: Vec3) -> Vec3 {
        let h = self.voxel_size();
        let dx = Vec3::new(h.x, 0.0, 0.0);
        let dy = Vec3::new(0.0, h.y, 0.0);
        let dz = Vec3::new(0.0, 0.0, h.z);
        Vec3::new(
            (self.sample(p + dx) - self.sample(p - dx)) / (2.0 * h.x),
            (self.sample(p + dy) - self.sample(p - dy)) / (2.0 * h.y),
            (self.sample(p + dz) - self.sample(p - dz)) / (2.0 * h.z),
        )
    }
}

/// Headlight Phong coefficients
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0.3,
            diffuse: 0.7,
            specular: 0.2,
            shininess: 24.0,
        }
    }
}

impl Lighting {
    /// Shade a colour with a light placed at the eye
    ///
    /// `normal` and `to_eye` must be unit vectors. Lighting is two-sided so
    /// gradients pointing away from the viewer still light up.
    pub fn shade(&self, color: [f32; 3], normal: Vec3, to_eye: Vec3) -> [f32; 3] {
        let n_dot_l = normal.dot(to_eye).abs();
        // Light and eye coincide, so the half vector is the light direction
        let specular = self.specular * n_dot_l.powf(self.shininess);
        let diffuse = self.ambient + self.diffuse * n_dot_l;
        color.map(|c| (c * diffuse + specular).clamp(0.0, 1.0))
    }
}

/// Per-frame inputs to the ray marcher
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayMarchParameters {
    /// World units per sample, must be positive
    pub step_size: f32,
    /// Apply gradient lighting to samples
    pub shading: bool,
    /// Maximum intensity projection instead of compositing
    pub mip: bool,
    /// Discard samples behind the cutting plane
    pub cut_enabled: bool,
    /// Cutting plane origin, world space
    pub plane_origin: Vec3,
    /// Cutting plane unit normal, world space
    pub plane_normal: Vec3,
    /// Volume dimensions in world units
    pub volume_extent: Vec3,
    /// Accumulated alpha at which a ray terminates
    pub early_termination_alpha: f32,
    /// Upper bound on samples per ray
    pub max_steps: u32,
    pub lighting: Lighting,
}

impl RayMarchParameters {
    /// Defaults for a volume of the given extent: compositing, no cut
    pub fn new(volume_extent: Vec3) -> Self {
        Self {
            step_size: DEFAULT_STEP_SIZE,
            shading: false,
            mip: false,
            cut_enabled: false,
            plane_origin: Vec3::ZERO,
            plane_normal: Vec3::Z,
            volume_extent,
            early_termination_alpha: DEFAULT_EARLY_TERMINATION_ALPHA,
            max_steps: DEFAULT_MAX_STEPS,
            lighting: Lighting::default(),
        }
    }

    /// Map a box-local position to world space
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        (local - Vec3::splat(0.5)).component_mul(self.volume_extent)
    }

    /// Whether the sample at a box-local position survives the cut
    pub fn keeps(&self, local: Vec3) -> bool {
        if !self.cut_enabled {
            return true;
        }
        (self.to_world(local) - self.plane_origin).dot(self.plane_normal) >= 0.0
    }

    /// Number of steps between two box-local points
    ///
    /// Both ends are sampled, so a ray takes `steps + 1` samples. Zero when
    /// the ray has no length (or the parameters are degenerate).
    pub fn step_count(&self, entry: Vec3, exit: Vec3) -> u32 {
        let length = (exit - entry).component_mul(self.volume_extent).length();
        // Written so NaN lengths and step sizes also yield zero
        if !(length > 0.0) || !(self.step_size > 0.0) {
            return 0;
        }
        let steps = (length / self.step_size).ceil();
        if steps >= self.max_steps as f32 {
            self.max_steps
        } else {
            steps as u32
        }
    }
}

/// March one ray and return premultiplied RGBA
///
/// `jitter` in `[0, 1)` offsets the first sample by a fraction of a step.
/// A ray with `entry == exit` returns fully transparent black.
pub fn march<S: VolumeSampler + ?Sized>(
    entry: Vec3,
    exit: Vec3,
    jitter: f32,
    sampler: &S,
    lookup: &TransferLookup,
    params: &RayMarchParameters,
) -> [f32; 4] {
    let steps = params.step_count(entry, exit);
    if steps == 0 {
        return [0.0; 4];
    }

    let delta = exit - entry;
    let to_eye = -delta.component_mul(params.volume_extent).normalized();
    let dt = 1.0 / steps as f32;
    let jitter = if jitter.is_finite() { jitter.clamp(0.0, 1.0) } else { 0.0 };

    let mut color = [0.0f32; 3];
    let mut alpha = 0.0f32;
    let mut brightest: Option<(f32, Vec3)> = None;

    for i in 0..=steps {
        let t = (i as f32 + jitter) * dt;
        if t > 1.0 {
            break;
        }
        let p = entry + delta * t;
        if !params.keeps(p) {
            continue;
        }

        let value = sampler.sample(p);

        if params.mip {
            if brightest.map_or(true, |(max, _)| value > max) {
                brightest = Some((value, p));
            }
            continue;
        }

        let (rgb, a) = lookup.sample(value);
        if a <= 0.0 {
            continue;
        }
        let rgb = if params.shading {
            shade_sample(rgb, p, to_eye, sampler, params)
        } else {
            rgb
        };

        let weight = (1.0 - alpha) * a;
        for (acc, c) in color.iter_mut().zip(rgb) {
            *acc += weight * c;
        }
        alpha += weight;

        if alpha >= params.early_termination_alpha {
            break;
        }
    }

    if params.mip {
        let Some((value, p)) = brightest else {
            return [0.0; 4];
        };
        let (rgb, a) = lookup.sample(value);
        let rgb = if params.shading {
            shade_sample(rgb, p, to_eye, sampler, params)
        } else {
            rgb
        };
        return [rgb[0] * a, rgb[1] * a, rgb[2] * a, a];
    }

    [color[0], color[1], color[2], alpha]
}

fn shade_sample<S: VolumeSampler + ?Sized>(
    rgb: [f32; 3],
    p: Vec3,
    to_eye: Vec3,
    sampler: &S,
    params: &RayMarchParameters,
) -> [f32; 3] {
    // d/dworld = d/dlocal / extent
    let gradient = sampler.gradient(p);
    let world_gradient = Vec3::new(
        gradient.x / params.volume_extent.x,
        gradient.y / params.volume_extent.y,
        gradient.z / params.volume_extent.z,
    );
    if world_gradient.length() < MIN_GRADIENT_LENGTH {
        return rgb;
    }
    params.lighting.shade(rgb, world_gradient.normalized(), to_eye)
}
