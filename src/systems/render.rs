//! GPU rendering system
//!
//! Manages GPU rendering including:
//! - Render context and surface
//! - The compositor and its three passes
//! - Frame rendering

use std::sync::Arc;
use winit::window::Window;
use voxcast_core::{RenderSettings, Volume};
use voxcast_render::{
    context::RenderContext,
    Compositor, FrameInput, OrbitCamera, RenderError,
};
use crate::config::RenderingConfig;

/// Manages GPU rendering
pub struct RenderSystem {
    context: RenderContext,
    compositor: Compositor,
    background: wgpu::Color,
}

impl RenderSystem {
    /// Create render system from window and config
    ///
    /// Blocks until every pipeline has been validated.
    pub fn new(
        window: Arc<Window>,
        render_config: &RenderingConfig,
        transfer_resolution: u32,
        vsync: bool,
    ) -> Result<Self, RenderError> {
        let context = pollster::block_on(RenderContext::with_vsync(window, vsync))?;

        let mut compositor = pollster::block_on(Compositor::new(
            &context.device,
            context.config.format,
            transfer_resolution,
        ))?;
        compositor.resize(&context.device, context.size.width, context.size.height);

        let bg = &render_config.background_color;
        Ok(Self {
            context,
            compositor,
            background: wgpu::Color {
                r: bg[0] as f64,
                g: bg[1] as f64,
                b: bg[2] as f64,
                a: bg[3] as f64,
            },
        })
    }

    /// Handle window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context
            .resize(winit::dpi::PhysicalSize::new(width, height));
        self.compositor.resize(&self.context.device, width, height);
    }

    /// Upload a freshly loaded volume
    pub fn set_volume(&mut self, volume: &Volume) -> Result<(), RenderError> {
        self.compositor
            .set_volume(&self.context.device, &self.context.queue, volume)
    }

    pub fn has_volume(&self) -> bool {
        self.compositor.has_volume()
    }

    /// Render a single frame
    pub fn render_frame(
        &mut self,
        settings: &RenderSettings,
        camera: &OrbitCamera,
    ) -> Result<(), RenderError> {
        let output = self.context.surface.get_current_texture()?;

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let input = FrameInput {
            view_proj: camera.view_projection(self.context.aspect_ratio()),
            background: self.background,
        };
        self.compositor.frame(
            &self.context.device,
            &self.context.queue,
            &mut encoder,
            &view,
            settings,
            &input,
        );

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Reconfigure the surface after it was lost
    pub fn recover_surface(&mut self) {
        self.context.reconfigure();
    }

    /// Get current surface size
    pub fn size(&self) -> (u32, u32) {
        (self.context.size.width, self.context.size.height)
    }
}
