//! voxcast - interactive GPU volume raycaster
//!
//! Application layer on top of the `voxcast_*` crates: configuration,
//! keyboard mapping, and the window/render/load systems driven by `main`.

pub mod config;
pub mod input;
pub mod systems;
