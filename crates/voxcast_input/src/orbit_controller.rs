//! Orbit controller for inspecting a volume
//!
//! Controls:
//! - Left drag: orbit around the volume centre
//! - Mouse wheel: zoom in/out
//!
//! Input is accumulated between frames and applied in one go by
//! [`OrbitController::update`], which reports whether the camera moved so the
//! caller can schedule a redraw.

use voxcast_math::Vec3;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Pixels per wheel "line" for touchpads reporting pixel deltas
const PIXELS_PER_LINE: f64 = 40.0;

/// Orbit controller for handling input
pub struct OrbitController {
    // Mouse state
    dragging: bool,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_scroll: f32,

    // Configuration
    pub orbit_sensitivity: f32,
    pub zoom_speed: f32,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new()
    }
}

impl OrbitController {
    pub fn new() -> Self {
        Self {
            dragging: false,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_scroll: 0.0,

            orbit_sensitivity: 0.005,
            zoom_speed: 0.1,
        }
    }

    /// Process mouse button input
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.dragging = state == ElementState::Pressed;
        }
    }

    /// Process raw mouse movement
    ///
    /// Motion only counts while dragging. Returns `true` if it was recorded.
    pub fn process_mouse_motion(&mut self, delta_x: f64, delta_y: f64) -> bool {
        if !self.dragging {
            return false;
        }
        self.pending_yaw += delta_x as f32;
        self.pending_pitch += delta_y as f32;
        true
    }

    /// Process a wheel event; positive values zoom in
    pub fn process_scroll(&mut self, delta: MouseScrollDelta) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
        };
        self.pending_scroll += lines;
    }

    /// Apply accumulated input to the camera
    ///
    /// Returns `true` if the camera changed.
    pub fn update<C: CameraControl>(&mut self, camera: &mut C) -> bool {
        let mut moved = false;

        if self.pending_yaw != 0.0 || self.pending_pitch != 0.0 {
            // Dragging right spins the volume right, dragging down tilts it towards the viewer
            camera.orbit(
                -self.pending_yaw * self.orbit_sensitivity,
                self.pending_pitch * self.orbit_sensitivity,
            );
            moved = true;
        }

        if self.pending_scroll != 0.0 {
            camera.zoom((1.0 - self.zoom_speed).powf(self.pending_scroll));
            moved = true;
        }

        self.pending_yaw = 0.0;
        self.pending_pitch = 0.0;
        self.pending_scroll = 0.0;
        moved
    }

    /// Whether the left button is held
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Whether input is waiting to be applied
    pub fn has_pending(&self) -> bool {
        self.pending_yaw != 0.0 || self.pending_pitch != 0.0 || self.pending_scroll != 0.0
    }

    /// Builder: set orbit sensitivity (radians per pixel)
    pub fn with_orbit_sensitivity(mut self, sensitivity: f32) -> Self {
        self.orbit_sensitivity = sensitivity;
        self
    }

    /// Builder: set zoom speed (fractional distance change per wheel line)
    pub fn with_zoom_speed(mut self, speed: f32) -> Self {
        self.zoom_speed = speed.clamp(0.0, 0.9);
        self
    }
}

/// Trait for camera control
/// Allows the controller to work with different camera implementations
pub trait CameraControl {
    /// Rotate around the target (radians)
    fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32);
    /// Scale the distance to the target
    fn zoom(&mut self, factor: f32);
    /// Return to the initial view
    fn reset(&mut self);
    /// Current eye position
    fn eye(&self) -> Vec3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockCamera {
        yaw: f32,
        pitch: f32,
        distance: f32,
    }

    impl CameraControl for MockCamera {
        fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
            self.yaw += delta_yaw;
            self.pitch += delta_pitch;
        }

        fn zoom(&mut self, factor: f32) {
            self.distance *= factor;
        }

        fn reset(&mut self) {
            *self = Self { distance: 10.0, ..Self::default() };
        }

        fn eye(&self) -> Vec3 {
            Vec3::new(0.0, 0.0, self.distance)
        }
    }

    fn camera() -> MockCamera {
        MockCamera { distance: 10.0, ..MockCamera::default() }
    }

    #[test]
    fn test_motion_ignored_without_drag() {
        let mut controller = OrbitController::new();
        assert!(!controller.process_mouse_motion(10.0, 5.0));
        let mut cam = camera();
        assert!(!controller.update(&mut cam));
        assert_eq!(cam.yaw, 0.0);
    }

    #[test]
    fn test_drag_orbits() {
        let mut controller = OrbitController::new().with_orbit_sensitivity(0.01);
        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(controller.is_dragging());
        assert!(controller.process_mouse_motion(10.0, -20.0));
        assert!(controller.has_pending());

        let mut cam = camera();
        assert!(controller.update(&mut cam));
        assert!((cam.yaw + 0.1).abs() < 1e-6);
        assert!((cam.pitch + 0.2).abs() < 1e-6);
        assert!(!controller.has_pending());
    }

    #[test]
    fn test_release_stops_drag() {
        let mut controller = OrbitController::new();
        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        controller.process_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(!controller.process_mouse_motion(3.0, 3.0));
    }

    #[test]
    fn test_right_button_does_not_drag() {
        let mut controller = OrbitController::new();
        controller.process_mouse_button(MouseButton::Right, ElementState::Pressed);
        assert!(!controller.is_dragging());
    }

    #[test]
    fn test_scroll_zooms_in() {
        let mut controller = OrbitController::new().with_zoom_speed(0.5);
        controller.process_scroll(MouseScrollDelta::LineDelta(0.0, 1.0));
        let mut cam = camera();
        assert!(controller.update(&mut cam));
        assert!((cam.distance - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_scroll_out_and_back_cancels() {
        let mut controller = OrbitController::new();
        controller.process_scroll(MouseScrollDelta::LineDelta(0.0, 2.0));
        controller.process_scroll(MouseScrollDelta::LineDelta(0.0, -2.0));
        let mut cam = camera();
        assert!(!controller.update(&mut cam));
        assert_eq!(cam.distance, 10.0);
    }
}
