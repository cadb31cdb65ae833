//! Volume Rendering Library
//!
//! This crate provides the wgpu-based two-pass raycasting pipeline that
//! turns a [`voxcast_core::Volume`] into pixels.
//!
//! ## Key Components
//!
//! - [`context::RenderContext`] - WGPU device, queue, and surface management
//! - [`camera::OrbitCamera`] - Camera orbiting the volume centre
//! - [`pipeline::PositionPass`] - Renders ray entry/exit positions of the bounding box
//! - [`pipeline::RaycastPass`] - Marches rays through the volume texture
//! - [`pipeline::OverlayPass`] - Draws the cutting plane and its normal arrow
//! - [`compositor::Compositor`] - Runs the three passes in order each frame

pub mod context;
pub mod camera;
pub mod pipeline;
pub mod compositor;
mod error;

pub use error::{RenderError, ShaderCompileError};
pub use compositor::{Compositor, FrameInput};
pub use camera::OrbitCamera;

// Re-export core types for convenience
pub use voxcast_core::{Volume, RenderSettings, RedrawReason, CuttingPlane, TransferFunction};
pub use voxcast_math::{Vec3, Mat4};
