//! Orbit camera input
//!
//! This crate turns mouse drags and wheel scrolls into orbit-camera
//! movement around the loaded volume.

mod orbit_controller;

pub use orbit_controller::{OrbitController, CameraControl};
