//! Application systems
//!
//! Modular systems extracted from main.rs for better organization and testability.

mod load;
mod render;
mod window;

pub use load::{LoadNotifier, LoadSystem, UserEvent, VolumeLoaded};
pub use render::RenderSystem;
pub use window::{format_title, WindowError, WindowSystem};
