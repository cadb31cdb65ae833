//! Cutting plane
//!
//! An oriented plane that clips the volume during ray marching. The plane
//! moves along world Z (its height) and rotates about its own centre.
//! Samples on the side its normal points to are kept.

use voxcast_math::{mat4, Mat4, Vec3};

use crate::transfer_function::Color;

/// Side length of the plane quad; heights map onto [-EXTENT/2, EXTENT/2]
pub const PLANE_EXTENT: f32 = 400.0;

/// Derived placement of the plane in world space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneTransform {
    /// Offset along world Z
    pub translation_z: f32,
    /// Rotation about X, degrees
    pub rotation_x_deg: f32,
    /// Rotation about Y, degrees in [0, 360), flip included
    pub rotation_y_deg: f32,
}

impl PlaneTransform {
    /// Transform for the given controls
    pub fn from_controls(height_fraction: f32, rotation_x_deg: f32, rotation_y_deg: f32, flipped: bool) -> Self {
        let flip = if flipped { 180.0 } else { 0.0 };
        Self {
            translation_z: PLANE_EXTENT / 2.0 - PLANE_EXTENT * height_fraction,
            rotation_x_deg: wrap_degrees(rotation_x_deg),
            rotation_y_deg: wrap_degrees(rotation_y_deg + flip),
        }
    }

    /// Rotation part only
    pub fn rotation(&self) -> Mat4 {
        mat4::euler_xyz(
            self.rotation_x_deg.to_radians(),
            self.rotation_y_deg.to_radians(),
            0.0,
        )
    }

    /// Local-to-world matrix (rotate about the centre, then translate)
    pub fn matrix(&self) -> Mat4 {
        mat4::mul(
            mat4::translation(Vec3::new(0.0, 0.0, self.translation_z)),
            self.rotation(),
        )
    }

    /// World-space origin and unit normal
    ///
    /// The normal is the local +Z axis rotated into world space and
    /// renormalised.
    pub fn origin_and_normal(&self) -> (Vec3, Vec3) {
        let origin = mat4::transform_point(self.matrix(), Vec3::ZERO);
        let normal = mat4::transform_direction(self.rotation(), Vec3::Z).normalized();
        (origin, normal)
    }
}

fn wrap_degrees(deg: f32) -> f32 {
    deg.rem_euclid(360.0)
}

/// User-controlled cutting plane state
#[derive(Clone, Debug, PartialEq)]
pub struct CuttingPlane {
    height_fraction: f32,
    rotation_x_deg: f32,
    rotation_y_deg: f32,
    color: Color,
    flipped: bool,
    transform: PlaneTransform,
}

impl Default for CuttingPlane {
    fn default() -> Self {
        Self::new(0.5, 0.0, 0.0, Color::WHITE, false)
    }
}

impl CuttingPlane {
    /// Create a plane from its controls
    pub fn new(height_fraction: f32, rotation_x_deg: f32, rotation_y_deg: f32, color: Color, flipped: bool) -> Self {
        let mut plane = Self {
            height_fraction: 0.0,
            rotation_x_deg: 0.0,
            rotation_y_deg: 0.0,
            color,
            flipped,
            transform: PlaneTransform::from_controls(0.0, 0.0, 0.0, false),
        };
        plane.update(height_fraction, rotation_x_deg, rotation_y_deg, color, flipped);
        plane
    }

    /// Overwrite every control and recompute the transform
    pub fn update(
        &mut self,
        height_fraction: f32,
        rotation_x_deg: f32,
        rotation_y_deg: f32,
        color: Color,
        flipped: bool,
    ) -> PlaneTransform {
        self.height_fraction = height_fraction.clamp(0.0, 1.0);
        self.rotation_x_deg = rotation_x_deg;
        self.rotation_y_deg = rotation_y_deg;
        self.color = color;
        self.flipped = flipped;
        self.transform = PlaneTransform::from_controls(
            self.height_fraction,
            self.rotation_x_deg,
            self.rotation_y_deg,
            self.flipped,
        );
        self.transform
    }

    /// Turn the plane around: adds 180° to the current Y rotation
    ///
    /// Two flips restore the original orientation.
    pub fn flip(&mut self) -> PlaneTransform {
        self.flipped = !self.flipped;
        self.transform.rotation_y_deg = wrap_degrees(self.transform.rotation_y_deg + 180.0);
        self.transform
    }

    pub fn set_height(&mut self, height_fraction: f32) -> PlaneTransform {
        self.update(height_fraction, self.rotation_x_deg, self.rotation_y_deg, self.color, self.flipped)
    }

    pub fn set_rotation_x(&mut self, deg: f32) -> PlaneTransform {
        self.update(self.height_fraction, deg, self.rotation_y_deg, self.color, self.flipped)
    }

    pub fn set_rotation_y(&mut self, deg: f32) -> PlaneTransform {
        self.update(self.height_fraction, self.rotation_x_deg, deg, self.color, self.flipped)
    }

    pub fn set_color(&mut self, color: Color) -> PlaneTransform {
        self.update(self.height_fraction, self.rotation_x_deg, self.rotation_y_deg, color, self.flipped)
    }

    pub fn height_fraction(&self) -> f32 {
        self.height_fraction
    }

    pub fn rotation_x(&self) -> f32 {
        self.rotation_x_deg
    }

    pub fn rotation_y(&self) -> f32 {
        self.rotation_y_deg
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn transform(&self) -> PlaneTransform {
        self.transform
    }

    /// World-space origin and unit normal used for clipping
    pub fn world_origin_and_normal(&self) -> (Vec3, Vec3) {
        self.transform.origin_and_normal()
    }

    /// Whether a world-space point survives the cut
    pub fn keeps(&self, world: Vec3) -> bool {
        let (origin, normal) = self.world_origin_and_normal();
        (world - origin).dot(normal) >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPSILON
    }

    fn transform_approx_eq(a: PlaneTransform, b: PlaneTransform) -> bool {
        (a.translation_z - b.translation_z).abs() < EPSILON
            && (a.rotation_x_deg - b.rotation_x_deg).abs() < EPSILON
            && (a.rotation_y_deg - b.rotation_y_deg).abs() < EPSILON
    }

    #[test]
    fn test_height_mapping() {
        let mut plane = CuttingPlane::default();
        assert_eq!(plane.set_height(0.0).translation_z, 200.0);
        assert_eq!(plane.set_height(1.0).translation_z, -200.0);
        assert_eq!(plane.set_height(0.5).translation_z, 0.0);
        // Out-of-range heights are clamped
        assert_eq!(plane.set_height(2.0).translation_z, -200.0);
    }

    #[test]
    fn test_default_plane_faces_plus_z() {
        let plane = CuttingPlane::default();
        let (origin, normal) = plane.world_origin_and_normal();
        assert!(vec_approx_eq(origin, Vec3::ZERO));
        assert!(vec_approx_eq(normal, Vec3::Z));
        assert!(plane.keeps(Vec3::new(5.0, -3.0, 1.0)));
        assert!(!plane.keeps(Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn test_flipped_update_adds_half_turn() {
        let plane = CuttingPlane::new(0.5, 0.0, 30.0, Color::WHITE, true);
        assert!((plane.transform().rotation_y_deg - 210.0).abs() < EPSILON);
        let (_, normal) = plane.world_origin_and_normal();
        let unflipped = CuttingPlane::new(0.5, 0.0, 30.0, Color::WHITE, false);
        let (_, n2) = unflipped.world_origin_and_normal();
        assert!(vec_approx_eq(normal, -n2));
    }

    #[test]
    fn test_flip_twice_is_identity() {
        let mut plane = CuttingPlane::new(0.3, 25.0, 70.0, Color::WHITE, false);
        let original = plane.transform();
        let flipped = plane.flip();
        assert!(!transform_approx_eq(original, flipped));
        assert!(plane.is_flipped());
        let restored = plane.flip();
        assert!(transform_approx_eq(original, restored));
        assert!(!plane.is_flipped());
    }

    #[test]
    fn test_flip_commutes_with_rotation_update() {
        let mut a = CuttingPlane::default();
        a.set_rotation_y(40.0);
        a.flip();

        let mut b = CuttingPlane::default();
        b.flip();
        b.set_rotation_y(40.0);

        assert!(transform_approx_eq(a.transform(), b.transform()));
    }

    #[test]
    fn test_flip_reverses_normal() {
        let mut plane = CuttingPlane::new(0.5, 35.0, 10.0, Color::WHITE, false);
        let (_, before) = plane.world_origin_and_normal();
        plane.flip();
        let (_, after) = plane.world_origin_and_normal();
        assert!(vec_approx_eq(before, -after));
    }

    #[test]
    fn test_normal_is_unit_length() {
        let plane = CuttingPlane::new(0.1, 123.0, -77.0, Color::WHITE, true);
        let (_, normal) = plane.world_origin_and_normal();
        assert!((normal.length() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_rotation_x_tilts_normal_towards_minus_y() {
        let plane = CuttingPlane::new(0.5, 90.0, 0.0, Color::WHITE, false);
        let (_, normal) = plane.world_origin_and_normal();
        assert!(vec_approx_eq(normal, -Vec3::Y));
    }

    #[test]
    fn test_origin_ignores_rotation() {
        let plane = CuttingPlane::new(0.25, 45.0, 45.0, Color::WHITE, false);
        let (origin, _) = plane.world_origin_and_normal();
        assert!(vec_approx_eq(origin, Vec3::new(0.0, 0.0, 100.0)));
    }
}
