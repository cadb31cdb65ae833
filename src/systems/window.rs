//! Window management system
//!
//! Handles window creation, redraw requests, and title updates.

use std::sync::Arc;
use winit::{
    event_loop::ActiveEventLoop,
    window::Window,
};
use voxcast_core::RenderSettings;
use crate::config::WindowConfig;

/// Manages the application window
pub struct WindowSystem {
    window: Arc<Window>,
    base_title: String,
}

impl WindowSystem {
    /// Create window from config
    pub fn create(
        event_loop: &ActiveEventLoop,
        config: &WindowConfig,
    ) -> Result<Self, WindowError> {
        let attrs = Window::default_attributes()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                config.width,
                config.height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| WindowError::CreationFailed(e.to_string()))?,
        );

        Ok(Self {
            window,
            base_title: config.title.clone(),
        })
    }

    /// Get window reference (for RenderContext creation)
    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Show the loaded file and active modes in the title bar
    pub fn update_title(&self, volume_name: Option<&str>, settings: &RenderSettings) {
        self.window.set_title(&format_title(&self.base_title, volume_name, settings));
    }

    /// Request a redraw
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

/// `"<base> - <file> [modes]"`, or a drop hint when nothing is loaded
pub fn format_title(base: &str, volume_name: Option<&str>, settings: &RenderSettings) -> String {
    let Some(name) = volume_name else {
        return format!("{} - drop a volume file", base);
    };

    let mut modes = Vec::new();
    if settings.mip() {
        modes.push("MIP");
    }
    if settings.shading() {
        modes.push("shaded");
    }
    if settings.cut_enabled() {
        modes.push("cut");
    }

    if modes.is_empty() {
        format!("{} - {}", base, name)
    } else {
        format!("{} - {} [{}]", base, name, modes.join(", "))
    }
}

#[derive(Debug)]
pub enum WindowError {
    CreationFailed(String),
}

impl std::fmt::Display for WindowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowError::CreationFailed(msg) => write!(f, "Window creation failed: {}", msg),
        }
    }
}

impl std::error::Error for WindowError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_without_volume() {
        let title = format_title("voxcast", None, &RenderSettings::default());
        assert!(title.contains("drop a volume"));
    }

    #[test]
    fn test_title_plain() {
        let title = format_title("voxcast", Some("head.raw"), &RenderSettings::default());
        assert_eq!(title, "voxcast - head.raw");
    }

    #[test]
    fn test_title_lists_modes() {
        let mut settings = RenderSettings::default();
        settings.set_mip(true);
        settings.set_cut_enabled(true);
        let title = format_title("voxcast", Some("head.raw"), &settings);
        assert_eq!(title, "voxcast - head.raw [MIP, cut]");
    }
}
