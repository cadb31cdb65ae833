//! Core types for the voxcast volume renderer
//!
//! This crate holds the CPU-side model that the GPU passes consume:
//!
//! - [`Volume`] - Raw 16-bit scalar samples plus derived statistics
//! - [`TransferFunction`] - Colour and opacity curves baked into a lookup table
//! - [`CuttingPlane`] - Oriented clipping plane and its world-space frame
//! - [`RayMarchParameters`] - Per-frame ray marching inputs
//! - [`RenderSettings`] - UI-owned render state with redraw scheduling
//! - [`LoadGeneration`] - Last-writer-wins guard for asynchronous volume loads
//!
//! The [`raycast`] module is the reference ray marcher that `raycast.wgsl`
//! mirrors step for step.

mod error;
mod volume;
mod transfer_function;
mod cutting_plane;
pub mod raycast;
mod settings;
mod loader;

pub use error::{FormatError, VolumeError, CurveError};
pub use volume::{Volume, Histogram, HistogramBin, DEFAULT_HISTOGRAM_BINS};
pub use transfer_function::{
    Color, Stop, TransferCurve, TransferFunction, TransferLookup,
    DEFAULT_LOOKUP_RESOLUTION, HARD_STEP_EPSILON,
};
pub use cutting_plane::{CuttingPlane, PlaneTransform, PLANE_EXTENT};
pub use raycast::{RayMarchParameters, Lighting, VolumeSampler};
pub use settings::{RenderSettings, RedrawReason};
pub use loader::{LoadGeneration, LoadTicket};

// Re-export commonly used types from voxcast_math for convenience
pub use voxcast_math::{Vec3, Mat4};
