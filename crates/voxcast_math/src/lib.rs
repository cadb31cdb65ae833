//! 3D Mathematics Library
//!
//! Vector and matrix types shared by the CPU-side volume model and the
//! wgpu render passes.
//!
//! ## Core Types
//!
//! - [`Vec3`] - 3D vector with x, y, z components
//! - [`Mat4`] - 4x4 column-major matrix (plain array, uploadable as-is)

mod vec3;
pub mod mat4;

pub use vec3::Vec3;
pub use mat4::Mat4;
