//! Render settings and redraw scheduling
//!
//! [`RenderSettings`] is the single owner of everything the UI can change.
//! Every setter records why a new frame is needed in a [`RedrawReason`] set
//! and returns `true` only when the settings go from clean to dirty, so the
//! caller requests exactly one redraw per burst of changes. The renderer
//! clears the set with [`RenderSettings::begin_frame`].

use bitflags::bitflags;
use voxcast_math::Vec3;

use crate::cutting_plane::CuttingPlane;
use crate::raycast::{
    Lighting, RayMarchParameters, DEFAULT_EARLY_TERMINATION_ALPHA, DEFAULT_MAX_STEPS, DEFAULT_STEP_SIZE,
};
use crate::transfer_function::{Color, TransferFunction, DEFAULT_LOOKUP_RESOLUTION};

bitflags! {
    /// Why the next frame has to be drawn
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct RedrawReason: u8 {
        /// Nothing changed
        const NONE = 0;
        /// A new volume was loaded
        const VOLUME = 1 << 0;
        /// A transfer curve was edited
        const TRANSFER_FUNCTION = 1 << 1;
        /// The cutting plane moved, turned, changed colour or visibility
        const PLANE = 1 << 2;
        /// Shading, MIP or cut toggled, or a marching parameter changed
        const MODES = 1 << 3;
        /// The orbit camera moved
        const CAMERA = 1 << 4;
        /// The viewport was resized
        const RESIZE = 1 << 5;
        /// Everything
        const ALL = Self::VOLUME.bits()
            | Self::TRANSFER_FUNCTION.bits()
            | Self::PLANE.bits()
            | Self::MODES.bits()
            | Self::CAMERA.bits()
            | Self::RESIZE.bits();
    }
}

/// UI-owned render state
#[derive(Clone, Debug)]
pub struct RenderSettings {
    plane: CuttingPlane,
    plane_visible: bool,
    cut_enabled: bool,
    shading: bool,
    mip: bool,
    transfer_function: TransferFunction,
    transfer_resolution: u32,
    step_size: f32,
    early_termination_alpha: f32,
    max_steps: u32,
    jitter: bool,
    lighting: Lighting,
    pending: RedrawReason,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::new(CuttingPlane::default(), TransferFunction::default())
    }
}

impl RenderSettings {
    /// Settings with the given plane and transfer function
    ///
    /// A freshly created value is dirty so the first frame gets drawn.
    pub fn new(plane: CuttingPlane, transfer_function: TransferFunction) -> Self {
        Self {
            plane,
            plane_visible: true,
            cut_enabled: false,
            shading: false,
            mip: false,
            transfer_function,
            transfer_resolution: DEFAULT_LOOKUP_RESOLUTION,
            step_size: DEFAULT_STEP_SIZE,
            early_termination_alpha: DEFAULT_EARLY_TERMINATION_ALPHA,
            max_steps: DEFAULT_MAX_STEPS,
            jitter: true,
            lighting: Lighting::default(),
            pending: RedrawReason::ALL,
        }
    }

    /// Builder: marching parameters
    pub fn with_marching(mut self, step_size: f32, early_termination_alpha: f32, max_steps: u32) -> Self {
        if step_size > 0.0 {
            self.step_size = step_size;
        }
        self.early_termination_alpha = early_termination_alpha.clamp(0.0, 1.0);
        self.max_steps = max_steps.max(1);
        self
    }

    /// Builder: lighting coefficients
    pub fn with_lighting(mut self, lighting: Lighting) -> Self {
        self.lighting = lighting;
        self
    }

    /// Builder: initial toggles
    pub fn with_modes(mut self, shading: bool, mip: bool, cut_enabled: bool, plane_visible: bool) -> Self {
        self.shading = shading;
        self.mip = mip;
        self.cut_enabled = cut_enabled;
        self.plane_visible = plane_visible;
        self
    }

    /// Builder: per-pixel ray jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Builder: transfer-function table resolution
    pub fn with_transfer_resolution(mut self, resolution: u32) -> Self {
        self.transfer_resolution = resolution.max(2);
        self
    }

    // --- redraw scheduling ---

    /// Record a reason to redraw
    ///
    /// Returns `true` if this is the first pending reason, i.e. the caller
    /// should request a redraw now.
    pub fn mark(&mut self, reason: RedrawReason) -> bool {
        let was_clean = self.pending.is_empty();
        self.pending |= reason;
        was_clean && !self.pending.is_empty()
    }

    /// Whether a frame is pending
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Pending reasons without clearing them
    pub fn pending(&self) -> RedrawReason {
        self.pending
    }

    /// Take and clear the pending reasons at the start of a frame
    pub fn begin_frame(&mut self) -> RedrawReason {
        std::mem::take(&mut self.pending)
    }

    pub fn volume_changed(&mut self) -> bool {
        self.mark(RedrawReason::VOLUME)
    }

    pub fn camera_moved(&mut self) -> bool {
        self.mark(RedrawReason::CAMERA)
    }

    pub fn resized(&mut self) -> bool {
        self.mark(RedrawReason::RESIZE)
    }

    // --- toggles ---

    pub fn set_shading(&mut self, enabled: bool) -> bool {
        if self.shading == enabled {
            return false;
        }
        self.shading = enabled;
        self.mark(RedrawReason::MODES)
    }

    pub fn set_mip(&mut self, enabled: bool) -> bool {
        if self.mip == enabled {
            return false;
        }
        self.mip = enabled;
        self.mark(RedrawReason::MODES)
    }

    pub fn set_cut_enabled(&mut self, enabled: bool) -> bool {
        if self.cut_enabled == enabled {
            return false;
        }
        self.cut_enabled = enabled;
        self.mark(RedrawReason::MODES)
    }

    pub fn set_plane_visible(&mut self, visible: bool) -> bool {
        if self.plane_visible == visible {
            return false;
        }
        self.plane_visible = visible;
        self.mark(RedrawReason::PLANE)
    }

    pub fn set_step_size(&mut self, step_size: f32) -> bool {
        if !(step_size > 0.0) || self.step_size == step_size {
            return false;
        }
        self.step_size = step_size;
        self.mark(RedrawReason::MODES)
    }

    // --- cutting plane ---

    /// Overwrite every plane control at once
    pub fn update_plane(
        &mut self,
        height_fraction: f32,
        rotation_x_deg: f32,
        rotation_y_deg: f32,
        color: Color,
        flipped: bool,
    ) -> bool {
        self.plane.update(height_fraction, rotation_x_deg, rotation_y_deg, color, flipped);
        self.mark(RedrawReason::PLANE)
    }

    pub fn set_plane_height(&mut self, height_fraction: f32) -> bool {
        self.plane.set_height(height_fraction);
        self.mark(RedrawReason::PLANE)
    }

    pub fn set_plane_rotation_x(&mut self, deg: f32) -> bool {
        self.plane.set_rotation_x(deg);
        self.mark(RedrawReason::PLANE)
    }

    pub fn set_plane_rotation_y(&mut self, deg: f32) -> bool {
        self.plane.set_rotation_y(deg);
        self.mark(RedrawReason::PLANE)
    }

    pub fn set_plane_color(&mut self, color: Color) -> bool {
        self.plane.set_color(color);
        self.mark(RedrawReason::PLANE)
    }

    pub fn flip_plane(&mut self) -> bool {
        self.plane.flip();
        self.mark(RedrawReason::PLANE)
    }

    // --- transfer function ---

    /// Replace both curves
    pub fn set_transfer_function(&mut self, transfer_function: TransferFunction) -> bool {
        self.transfer_function = transfer_function;
        self.mark(RedrawReason::TRANSFER_FUNCTION)
    }

    /// Edit the curves in place
    ///
    /// The closure reports whether it changed anything; only then is a
    /// redraw scheduled.
    pub fn edit_transfer_function<F>(&mut self, edit: F) -> bool
    where
        F: FnOnce(&mut TransferFunction) -> bool,
    {
        if edit(&mut self.transfer_function) {
            self.mark(RedrawReason::TRANSFER_FUNCTION)
        } else {
            false
        }
    }

    pub fn toggle_hard_color(&mut self) -> bool {
        self.edit_transfer_function(|tf| {
            tf.color.toggle_hard_mode();
            true
        })
    }

    pub fn toggle_hard_alpha(&mut self) -> bool {
        self.edit_transfer_function(|tf| {
            tf.alpha.toggle_hard_mode();
            true
        })
    }

    // --- accessors ---

    pub fn plane(&self) -> &CuttingPlane {
        &self.plane
    }

    pub fn plane_visible(&self) -> bool {
        self.plane_visible
    }

    pub fn cut_enabled(&self) -> bool {
        self.cut_enabled
    }

    pub fn shading(&self) -> bool {
        self.shading
    }

    pub fn mip(&self) -> bool {
        self.mip
    }

    pub fn transfer_function(&self) -> &TransferFunction {
        &self.transfer_function
    }

    pub fn transfer_resolution(&self) -> u32 {
        self.transfer_resolution
    }

    pub fn step_size(&self) -> f32 {
        self.step_size
    }

    pub fn jitter(&self) -> bool {
        self.jitter
    }

    /// Frame-scoped marching inputs for a volume of the given extent
    pub fn ray_march_parameters(&self, volume_extent: Vec3) -> RayMarchParameters {
        let (plane_origin, plane_normal) = self.plane.world_origin_and_normal();
        RayMarchParameters {
            step_size: self.step_size,
            shading: self.shading,
            mip: self.mip,
            cut_enabled: self.cut_enabled,
            plane_origin,
            plane_normal,
            volume_extent,
            early_termination_alpha: self.early_termination_alpha,
            max_steps: self.max_steps,
            lighting: self.lighting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean() -> RenderSettings {
        let mut settings = RenderSettings::default();
        settings.begin_frame();
        settings
    }

    #[test]
    fn test_new_settings_are_dirty() {
        let settings = RenderSettings::default();
        assert!(settings.is_dirty());
        assert_eq!(settings.pending(), RedrawReason::ALL);
    }

    #[test]
    fn test_begin_frame_clears() {
        let mut settings = RenderSettings::default();
        let reasons = settings.begin_frame();
        assert!(reasons.contains(RedrawReason::VOLUME));
        assert!(!settings.is_dirty());
        assert_eq!(settings.begin_frame(), RedrawReason::NONE);
    }

    #[test]
    fn test_first_change_requests_one_redraw() {
        let mut settings = clean();
        assert!(settings.set_shading(true));
        // Further changes before the frame piggyback on the pending request
        assert!(!settings.set_mip(true));
        assert!(!settings.set_plane_height(0.2));
        let reasons = settings.begin_frame();
        assert!(reasons.contains(RedrawReason::MODES | RedrawReason::PLANE));
        assert!(!reasons.contains(RedrawReason::CAMERA));
    }

    #[test]
    fn test_unchanged_toggle_does_not_redraw() {
        let mut settings = clean();
        assert!(!settings.set_shading(false));
        assert!(!settings.set_cut_enabled(false));
        assert!(!settings.is_dirty());
    }

    #[test]
    fn test_invalid_step_size_rejected() {
        let mut settings = clean();
        assert!(!settings.set_step_size(0.0));
        assert!(!settings.set_step_size(-1.0));
        assert!(!settings.set_step_size(f32::NAN));
        assert_eq!(settings.step_size(), DEFAULT_STEP_SIZE);
        assert!(settings.set_step_size(0.25));
    }

    #[test]
    fn test_plane_edits_flow_into_parameters() {
        let mut settings = clean();
        settings.set_cut_enabled(true);
        settings.set_plane_height(0.25);
        let params = settings.ray_march_parameters(Vec3::splat(64.0));
        assert!(params.cut_enabled);
        assert!((params.plane_origin.z - 100.0).abs() < 1e-4);
        assert!((params.plane_normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_flip_plane_reverses_normal_in_parameters() {
        let mut settings = clean();
        settings.flip_plane();
        let params = settings.ray_march_parameters(Vec3::ONE);
        assert!((params.plane_normal + Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_edit_transfer_function_without_change() {
        let mut settings = clean();
        assert!(!settings.edit_transfer_function(|_| false));
        assert!(!settings.is_dirty());
        assert!(settings.edit_transfer_function(|tf| tf.color.add_stop(0.5, None).is_some()));
        assert_eq!(settings.pending(), RedrawReason::TRANSFER_FUNCTION);
    }

    #[test]
    fn test_toggle_hard_modes() {
        let mut settings = clean();
        assert!(settings.toggle_hard_color());
        assert!(settings.transfer_function().color.is_hard());
        assert!(!settings.transfer_function().alpha.is_hard());
        settings.toggle_hard_alpha();
        assert!(settings.transfer_function().alpha.is_hard());
    }

    #[test]
    fn test_camera_and_resize_marks() {
        let mut settings = clean();
        assert!(settings.camera_moved());
        assert!(!settings.resized());
        assert_eq!(settings.begin_frame(), RedrawReason::CAMERA | RedrawReason::RESIZE);
    }
}
