//! Frame compositor
//!
//! Owns the three passes plus the GPU copies of the volume and transfer
//! function, and records them into one command encoder per frame:
//!
//! 1. position pass (front faces, then back faces) into off-screen targets
//! 2. raycast pass into the surface, cleared to the background colour
//! 3. cutting-plane overlay on top, without clearing or depth testing
//!
//! Without a volume the frame is only cleared.

use voxcast_core::{RenderSettings, Volume};
use voxcast_math::{Mat4, Vec3};

use crate::error::{RenderError, ShaderCompileError};
use crate::pipeline::{
    OverlayPass, OverlayUniforms, PositionPass, PositionUniforms, RaycastInputs, RaycastPass, RaycastUniforms,
    TransferTexture, VolumeTexture,
};

/// Per-frame inputs that do not live in [`RenderSettings`]
#[derive(Clone, Copy, Debug)]
pub struct FrameInput {
    /// Camera projection * view
    pub view_proj: Mat4,
    /// Colour behind the volume
    pub background: wgpu::Color,
}

/// A step of a frame, in recording order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    Position,
    Raycast,
    Overlay,
}

/// Passes a frame records, in order
///
/// The raycast pass always runs because it clears the frame.
pub fn planned_passes(has_volume: bool, plane_visible: bool) -> &'static [Pass] {
    match (has_volume, plane_visible) {
        (false, _) => &[Pass::Raycast],
        (true, false) => &[Pass::Position, Pass::Raycast],
        (true, true) => &[Pass::Position, Pass::Raycast, Pass::Overlay],
    }
}

/// The loaded volume on the GPU
struct LoadedVolume {
    texture: VolumeTexture,
    extent: Vec3,
}

/// Runs the position, raycast and overlay passes in a fixed order
pub struct Compositor {
    position: PositionPass,
    raycast: RaycastPass,
    overlay: OverlayPass,
    transfer: TransferTexture,
    volume: Option<LoadedVolume>,
    /// Raycast inputs changed since the bind group was built
    rebind: bool,
}

impl Compositor {
    /// Build all passes and wait for their pipelines to validate
    ///
    /// Each pass is created inside its own validation error scope. The
    /// scopes are collected first and awaited together, so no frame can be
    /// recorded against a pipeline that failed to build.
    pub async fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        transfer_resolution: u32,
    ) -> Result<Self, ShaderCompileError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let position = PositionPass::new(device);
        let position_scope = device.pop_error_scope();

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let raycast = RaycastPass::new(device, surface_format);
        let raycast_scope = device.pop_error_scope();

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let overlay = OverlayPass::new(device, surface_format);
        let overlay_scope = device.pop_error_scope();

        for (pass, scope) in [
            ("position", position_scope),
            ("raycast", raycast_scope),
            ("overlay", overlay_scope),
        ] {
            if let Some(error) = scope.await {
                let error = ShaderCompileError {
                    pass,
                    message: error.to_string(),
                };
                log::error!("{}", error);
                return Err(error);
            }
        }
        log::info!("Render pipelines created (format {:?})", surface_format);

        Ok(Self {
            position,
            raycast,
            overlay,
            transfer: TransferTexture::new(device, transfer_resolution),
            volume: None,
            rebind: true,
        })
    }

    /// Replace the volume
    ///
    /// On failure the previous volume stays bound.
    pub fn set_volume(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, volume: &Volume) -> Result<(), RenderError> {
        let texture = VolumeTexture::new(device, queue, volume)?;
        self.volume = Some(LoadedVolume {
            texture,
            extent: volume.extent(),
        });
        self.rebind = true;
        Ok(())
    }

    pub fn has_volume(&self) -> bool {
        self.volume.is_some()
    }

    /// World-space size of the loaded volume
    pub fn volume_extent(&self) -> Option<Vec3> {
        self.volume.as_ref().map(|v| v.extent)
    }

    /// Match the position targets to the viewport
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.position.ensure_targets(device, width, height) {
            self.rebind = true;
        }
    }

    /// Record one frame into `encoder`, drawing to `view`
    pub fn frame(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        settings: &RenderSettings,
        input: &FrameInput,
    ) {
        let has_volume = self.volume.is_some() && self.position.targets().is_some();
        if self.volume.is_some() && !has_volume {
            log::warn!("Frame requested before resize; drawing background only");
        }

        for pass in planned_passes(has_volume, settings.plane_visible()) {
            match pass {
                Pass::Position => self.record_position(queue, encoder, input),
                Pass::Raycast => self.record_raycast(device, queue, encoder, view, settings, input, has_volume),
                Pass::Overlay => self.record_overlay(queue, encoder, view, settings, input),
            }
        }
    }

    fn record_position(&self, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder, input: &FrameInput) {
        let Some(volume) = self.volume.as_ref() else {
            return;
        };
        self.position
            .update_uniforms(queue, &PositionUniforms::new(input.view_proj, volume.extent));
        self.position.render(encoder);
    }

    #[allow(clippy::too_many_arguments)]
    fn record_raycast(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        settings: &RenderSettings,
        input: &FrameInput,
        has_volume: bool,
    ) {
        let volume = match (&self.volume, self.position.targets()) {
            (Some(volume), Some(targets)) if has_volume => {
                // Rebuilt from the curves every frame
                let lookup = settings
                    .transfer_function()
                    .build_lookup(settings.transfer_resolution());
                if self.transfer.upload(device, queue, &lookup) {
                    self.rebind = true;
                }

                if self.rebind || !self.raycast.is_bound() {
                    self.raycast.bind(
                        device,
                        &RaycastInputs {
                            front: &targets.front,
                            back: &targets.back,
                            volume: volume.texture.view(),
                            transfer: self.transfer.view(),
                        },
                    );
                    self.rebind = false;
                }
                Some(volume)
            }
            _ => None,
        };

        match volume {
            Some(volume) => {
                let params = settings.ray_march_parameters(volume.extent);
                let uniforms = RaycastUniforms::new(&params, volume.texture.dimensions(), settings.jitter());
                self.raycast.update_uniforms(queue, &uniforms);
            }
            None => self.raycast.unbind(),
        }

        self.raycast.render(encoder, view, input.background);
    }

    fn record_overlay(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        settings: &RenderSettings,
        input: &FrameInput,
    ) {
        let plane = settings.plane();
        let uniforms = OverlayUniforms {
            view_proj: input.view_proj,
            model: plane.transform().matrix(),
        };
        self.overlay.update(queue, &uniforms, plane.color());
        self.overlay.render(encoder, view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_volume_only_clears() {
        assert_eq!(planned_passes(false, true), &[Pass::Raycast]);
        assert_eq!(planned_passes(false, false), &[Pass::Raycast]);
    }

    #[test]
    fn test_fixed_pass_order() {
        assert_eq!(
            planned_passes(true, true),
            &[Pass::Position, Pass::Raycast, Pass::Overlay]
        );
    }

    #[test]
    fn test_hidden_plane_skips_overlay() {
        assert_eq!(planned_passes(true, false), &[Pass::Position, Pass::Raycast]);
    }
}
