//! 4x4 Matrix utilities for 3D transformations
//!
//! Matrices are column-major (`m[column][row]`), which is the layout WGSL
//! expects for `mat4x4<f32>` uniforms, so they can be uploaded unchanged.

use crate::Vec3;

/// 4x4 matrix type (column-major)
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Translation matrix
pub fn translation(t: Vec3) -> Mat4 {
    let mut m = IDENTITY;
    m[3][0] = t.x;
    m[3][1] = t.y;
    m[3][2] = t.z;
    m
}

/// Non-uniform scale matrix
pub fn scale(s: Vec3) -> Mat4 {
    let mut m = IDENTITY;
    m[0][0] = s.x;
    m[1][1] = s.y;
    m[2][2] = s.z;
    m
}

/// Right-handed rotation about the X axis (radians)
pub fn rotation_x(angle: f32) -> Mat4 {
    let (sn, cs) = angle.sin_cos();
    let mut m = IDENTITY;
    m[1][1] = cs;
    m[1][2] = sn;
    m[2][1] = -sn;
    m[2][2] = cs;
    m
}

/// Right-handed rotation about the Y axis (radians)
pub fn rotation_y(angle: f32) -> Mat4 {
    let (sn, cs) = angle.sin_cos();
    let mut m = IDENTITY;
    m[0][0] = cs;
    m[0][2] = -sn;
    m[2][0] = sn;
    m[2][2] = cs;
    m
}

/// Right-handed rotation about the Z axis (radians)
pub fn rotation_z(angle: f32) -> Mat4 {
    let (sn, cs) = angle.sin_cos();
    let mut m = IDENTITY;
    m[0][0] = cs;
    m[0][1] = sn;
    m[1][0] = -sn;
    m[1][1] = cs;
    m
}

/// Intrinsic X-then-Y-then-Z Euler rotation: `Rx * Ry * Rz`
///
/// A vector is rotated about Z first, then Y, then X.
pub fn euler_xyz(x: f32, y: f32, z: f32) -> Mat4 {
    mul(mul(rotation_x(x), rotation_y(y)), rotation_z(z))
}

/// Multiply two 4x4 matrices: result = a * b
///
/// In column-major convention, this applies b first, then a.
#[allow(clippy::needless_range_loop)]
pub fn mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut result = [[0.0f32; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }

    result
}

/// Transform a point (w = 1) by a 4x4 matrix
pub fn transform_point(m: Mat4, p: Vec3) -> Vec3 {
    Vec3::new(
        m[0][0] * p.x + m[1][0] * p.y + m[2][0] * p.z + m[3][0],
        m[0][1] * p.x + m[1][1] * p.y + m[2][1] * p.z + m[3][1],
        m[0][2] * p.x + m[1][2] * p.y + m[2][2] * p.z + m[3][2],
    )
}

/// Transform a direction (w = 0) by a 4x4 matrix, ignoring translation
pub fn transform_direction(m: Mat4, d: Vec3) -> Vec3 {
    Vec3::new(
        m[0][0] * d.x + m[1][0] * d.y + m[2][0] * d.z,
        m[0][1] * d.x + m[1][1] * d.y + m[2][1] * d.z,
        m[0][2] * d.x + m[1][2] * d.y + m[2][2] * d.z,
    )
}

/// Right-handed perspective projection with a [0, 1] depth range (wgpu clip space)
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y / 2.0).tan();
    let nf = 1.0 / (near - far);

    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, far * nf, -1.0],
        [0.0, 0.0, far * near * nf, 0.0],
    ]
}

/// Right-handed look-at view matrix
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let f = (target - eye).normalized();
    let s = f.cross(up).normalized();
    let u = s.cross(f);

    [
        [s.x, u.x, -f.x, 0.0],
        [s.y, u.y, -f.y, 0.0],
        [s.z, u.z, -f.z, 0.0],
        [-s.dot(eye), -u.dot(eye), f.dot(eye), 1.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPSILON: f32 = 0.0001;

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPSILON
    }

    #[test]
    fn test_identity() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert!(vec_approx_eq(transform_point(IDENTITY, v), v));
    }

    #[test]
    fn test_translation_moves_points_not_directions() {
        let m = translation(Vec3::new(1.0, 2.0, 3.0));
        assert!(vec_approx_eq(transform_point(m, Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0)));
        assert!(vec_approx_eq(transform_direction(m, Vec3::Z), Vec3::Z));
    }

    #[test]
    fn test_rotation_x_quarter_turn() {
        // Y goes to Z, Z goes to -Y
        let m = rotation_x(FRAC_PI_2);
        assert!(vec_approx_eq(transform_direction(m, Vec3::Y), Vec3::Z));
        assert!(vec_approx_eq(transform_direction(m, Vec3::Z), -Vec3::Y));
    }

    #[test]
    fn test_rotation_y_quarter_turn() {
        // Z goes to X, X goes to -Z
        let m = rotation_y(FRAC_PI_2);
        assert!(vec_approx_eq(transform_direction(m, Vec3::Z), Vec3::X));
        assert!(vec_approx_eq(transform_direction(m, Vec3::X), -Vec3::Z));
    }

    #[test]
    fn test_rotation_y_half_turn_flips_z() {
        let m = rotation_y(PI);
        assert!(vec_approx_eq(transform_direction(m, Vec3::Z), -Vec3::Z));
    }

    #[test]
    fn test_euler_order() {
        // Rz applied first, then Ry, then Rx
        let m = euler_xyz(FRAC_PI_2, FRAC_PI_2, 0.0);
        let expected = transform_direction(rotation_x(FRAC_PI_2), transform_direction(rotation_y(FRAC_PI_2), Vec3::Z));
        assert!(vec_approx_eq(transform_direction(m, Vec3::Z), expected));
    }

    #[test]
    fn test_mul_composition() {
        use std::f32::consts::FRAC_PI_4;

        let r45 = rotation_z(FRAC_PI_4);
        let r90 = rotation_z(FRAC_PI_2);
        let composed = mul(r45, r45);
        assert!(vec_approx_eq(
            transform_direction(composed, Vec3::X),
            transform_direction(r90, Vec3::X)
        ));
    }

    #[test]
    fn test_perspective_depth_range() {
        let proj = perspective(FRAC_PI_2, 1.0, 1.0, 10.0);
        // Near plane maps to depth 0, far plane to depth 1
        let near_z = proj[2][2] * -1.0 + proj[3][2];
        let near_w = -(-1.0);
        assert!((near_z / near_w).abs() < EPSILON);
        let far_z = proj[2][2] * -10.0 + proj[3][2];
        let far_w = 10.0;
        assert!((far_z / far_w - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_look_at_places_target_in_front() {
        let view = look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let p = transform_point(view, Vec3::ZERO);
        // Right-handed view space looks down -Z
        assert!(vec_approx_eq(p, Vec3::new(0.0, 0.0, -5.0)));
    }
}
