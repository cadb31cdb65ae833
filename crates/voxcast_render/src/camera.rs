//! Orbit camera
//!
//! The camera circles the volume centre (the world origin) at a distance
//! derived from the volume size. Yaw spins around world Y, pitch tilts
//! towards the poles. With both at zero the camera sits on +Z looking down -Z.
//!
//! Zooming stops at the volume's bounding sphere. Entry positions come from
//! the box faces in front of the eye, so the eye must never enter the box.

use voxcast_input::CameraControl;
use voxcast_math::{mat4, Mat4, Vec3};

/// Pitch limit, just short of the poles so `look_at` stays well defined
const MAX_PITCH: f32 = 1.5;

/// Camera orbiting a fixed target
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    pub target: Vec3,
    /// Vertical field of view in degrees
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,

    yaw: f32,
    pitch: f32,
    distance: f32,
    home_distance: f32,
    /// Closest allowed distance to the target
    min_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(75.0, 0.5, 5000.0)
    }
}

impl OrbitCamera {
    /// Create a camera with the given projection parameters
    pub fn new(fov_deg: f32, near: f32, far: f32) -> Self {
        Self {
            target: Vec3::ZERO,
            fov_deg,
            near,
            far,
            yaw: 0.0,
            pitch: 0.0,
            distance: 500.0,
            home_distance: 500.0,
            min_distance: near * 2.0,
        }
    }

    /// Reset the view to frame a volume of size `extent`
    ///
    /// The home distance is `distance_factor` times the largest dimension.
    pub fn frame_volume(&mut self, extent: Vec3, distance_factor: f32) {
        self.min_distance = (extent.length() * 0.5 + self.near).max(self.near * 2.0);
        self.home_distance = self.clamp_distance(extent.max_element() * distance_factor);
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.distance = self.home_distance;
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn min_distance(&self) -> f32 {
        self.min_distance
    }

    /// View matrix (right-handed, looking at the target)
    pub fn view_matrix(&self) -> Mat4 {
        mat4::look_at(self.eye(), self.target, Vec3::Y)
    }

    /// Perspective projection for the given aspect ratio
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        mat4::perspective(self.fov_deg.to_radians(), aspect, self.near, self.far)
    }

    /// Projection times view
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        mat4::mul(self.projection_matrix(aspect), self.view_matrix())
    }

    fn clamp_distance(&self, distance: f32) -> f32 {
        let min = self.min_distance;
        let max = (self.far * 0.5).max(min);
        if distance.is_finite() {
            distance.clamp(min, max)
        } else {
            max
        }
    }
}

impl CameraControl for OrbitCamera {
    fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + delta_pitch).clamp(-MAX_PITCH, MAX_PITCH);
    }

    fn zoom(&mut self, factor: f32) {
        self.distance = self.clamp_distance(self.distance * factor);
    }

    fn reset(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.distance = self.home_distance;
    }

    fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + Vec3::new(cp * sy, sp, cp * cy) * self.distance
    }
}
