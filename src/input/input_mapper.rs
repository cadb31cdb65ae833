//! Input mapping from raw events to semantic actions
//!
//! Maps keyboard input to high-level actions like ToggleMip, FlipPlane, Exit, etc.
//! Mouse drag and scroll are NOT mapped here - they go directly to OrbitController.

use winit::event::ElementState;
use winit::keyboard::KeyCode;
use voxcast_core::RenderSettings;

/// Direction of a stepwise adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nudge {
    Increase,
    Decrease,
}

impl Nudge {
    pub fn sign(self) -> f32 {
        match self {
            Nudge::Increase => 1.0,
            Nudge::Decrease => -1.0,
        }
    }
}

/// Actions triggered by the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Gradient lighting on/off (S key)
    ToggleShading,
    /// Maximum intensity projection on/off (M key)
    ToggleMip,
    /// Clip the volume at the plane (C key)
    ToggleCut,
    /// Show/hide the plane overlay (P key)
    TogglePlane,
    /// Turn the plane around (F key)
    FlipPlane,
    /// Step interpolation for the colour curve (H key)
    ToggleHardColor,
    /// Step interpolation for the opacity curve (J key)
    ToggleHardAlpha,
    /// Move the plane along its slider (Up/Down)
    PlaneHeight(Nudge),
    /// Tilt the plane about X (PageUp/PageDown)
    PlaneRotationX(Nudge),
    /// Turn the plane about Y (Right/Left)
    PlaneRotationY(Nudge),
    /// Reset camera to its framing position (R key)
    ResetCamera,
    /// Exit application (Escape)
    Exit,
}

/// Step sizes for the plane nudges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneSteps {
    /// Slider fraction per press
    pub height: f32,
    /// Degrees per press
    pub rotation: f32,
}

/// Maps raw input events to semantic actions
pub struct InputMapper;

impl InputMapper {
    /// Map keyboard input to an action
    ///
    /// Returns `None` for releases and unbound keys.
    pub fn map_keyboard(key: KeyCode, state: ElementState) -> Option<InputAction> {
        // Only handle key presses, not releases
        if state != ElementState::Pressed {
            return None;
        }

        match key {
            KeyCode::Escape => Some(InputAction::Exit),
            KeyCode::KeyR => Some(InputAction::ResetCamera),
            KeyCode::KeyS => Some(InputAction::ToggleShading),
            KeyCode::KeyM => Some(InputAction::ToggleMip),
            KeyCode::KeyC => Some(InputAction::ToggleCut),
            KeyCode::KeyP => Some(InputAction::TogglePlane),
            KeyCode::KeyF => Some(InputAction::FlipPlane),
            KeyCode::KeyH => Some(InputAction::ToggleHardColor),
            KeyCode::KeyJ => Some(InputAction::ToggleHardAlpha),
            KeyCode::ArrowUp => Some(InputAction::PlaneHeight(Nudge::Increase)),
            KeyCode::ArrowDown => Some(InputAction::PlaneHeight(Nudge::Decrease)),
            KeyCode::PageUp => Some(InputAction::PlaneRotationX(Nudge::Increase)),
            KeyCode::PageDown => Some(InputAction::PlaneRotationX(Nudge::Decrease)),
            KeyCode::ArrowRight => Some(InputAction::PlaneRotationY(Nudge::Increase)),
            KeyCode::ArrowLeft => Some(InputAction::PlaneRotationY(Nudge::Decrease)),
            _ => None,
        }
    }

    /// Push a settings action into `settings`
    ///
    /// Returns `true` if a redraw was scheduled. Actions that do not touch
    /// render settings (camera reset, exit) return `false`.
    pub fn apply(action: InputAction, settings: &mut RenderSettings, steps: PlaneSteps) -> bool {
        match action {
            InputAction::ToggleShading => settings.set_shading(!settings.shading()),
            InputAction::ToggleMip => settings.set_mip(!settings.mip()),
            InputAction::ToggleCut => settings.set_cut_enabled(!settings.cut_enabled()),
            InputAction::TogglePlane => settings.set_plane_visible(!settings.plane_visible()),
            InputAction::FlipPlane => settings.flip_plane(),
            InputAction::ToggleHardColor => settings.toggle_hard_color(),
            InputAction::ToggleHardAlpha => settings.toggle_hard_alpha(),
            InputAction::PlaneHeight(nudge) => {
                let height = (settings.plane().height_fraction() + nudge.sign() * steps.height).clamp(0.0, 1.0);
                settings.set_plane_height(height)
            }
            InputAction::PlaneRotationX(nudge) => {
                let deg = settings.plane().rotation_x() + nudge.sign() * steps.rotation;
                settings.set_plane_rotation_x(deg)
            }
            InputAction::PlaneRotationY(nudge) => {
                let deg = settings.plane().rotation_y() + nudge.sign() * steps.rotation;
                settings.set_plane_rotation_y(deg)
            }
            InputAction::ResetCamera | InputAction::Exit => false,
        }
    }
}
