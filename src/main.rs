//! voxcast - interactive GPU volume raycaster
//!
//! Renders a raw 16-bit volume with a two-pass raycaster, a user-defined
//! transfer function and a movable cutting plane.
//!
//! Usage: `voxcast [VOLUME_FILE]`. Files can also be dropped onto the window.

use std::path::PathBuf;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::PhysicalKey,
    window::WindowId,
};

use voxcast::config::AppConfig;
use voxcast::input::{InputAction, InputMapper, PlaneSteps};
use voxcast::systems::{LoadSystem, RenderSystem, UserEvent, WindowSystem};
use voxcast_core::{RenderSettings, Volume};
use voxcast_input::{CameraControl, OrbitController};
use voxcast_render::{OrbitCamera, RenderError};

/// Main application state
struct App {
    /// Application configuration
    config: AppConfig,
    window: Option<WindowSystem>,
    render: Option<RenderSystem>,
    loads: LoadSystem<EventLoopProxy<UserEvent>>,
    /// Everything the UI can change; setters schedule redraws
    settings: RenderSettings,
    camera: OrbitCamera,
    controller: OrbitController,
    /// Finished loading before the GPU was ready
    pending_volume: Option<(Volume, String)>,
    /// File name of the displayed volume
    volume_name: Option<String>,
    /// Volume to load once the window exists
    startup_path: Option<PathBuf>,
}

impl App {
    fn new(config: AppConfig, proxy: EventLoopProxy<UserEvent>, startup_path: Option<PathBuf>) -> Self {
        let settings = config.render_settings();
        let camera = OrbitCamera::new(config.camera.fov, config.camera.near, config.camera.far);
        let controller = OrbitController::new()
            .with_orbit_sensitivity(config.camera.orbit_sensitivity)
            .with_zoom_speed(config.camera.zoom_speed);
        let loads = LoadSystem::new(proxy, &config.volume);

        Self {
            config,
            window: None,
            render: None,
            loads,
            settings,
            camera,
            controller,
            pending_volume: None,
            volume_name: None,
            startup_path,
        }
    }

    /// Request a redraw if a setter asked for one
    fn schedule(&self, requested: bool) {
        if requested {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }

    fn refresh_title(&self) {
        if let Some(window) = &self.window {
            window.update_title(self.volume_name.as_deref(), &self.settings);
        }
    }

    /// Swap in a freshly loaded volume
    fn install_volume(&mut self, volume: Volume, name: String) {
        let Some(render) = &mut self.render else {
            self.pending_volume = Some((volume, name));
            return;
        };

        if let Err(e) = render.set_volume(&volume) {
            log::error!("Could not upload {}: {}", name, e);
            return;
        }

        self.camera
            .frame_volume(volume.extent(), self.config.camera.distance_factor);
        self.volume_name = Some(name);
        self.refresh_title();
        let requested = self.settings.volume_changed();
        self.schedule(requested);
    }

    fn handle_action(&mut self, event_loop: &ActiveEventLoop, action: InputAction) {
        match action {
            InputAction::Exit => event_loop.exit(),
            InputAction::ResetCamera => {
                self.camera.reset();
                log::info!("Camera reset");
                let requested = self.settings.camera_moved();
                self.schedule(requested);
            }
            _ => {
                let steps = PlaneSteps {
                    height: self.config.plane.height_step,
                    rotation: self.config.plane.rotation_step,
                };
                let requested = InputMapper::apply(action, &mut self.settings, steps);
                log::debug!("{:?}", action);
                self.refresh_title();
                self.schedule(requested);
            }
        }
    }

    /// Apply pending orbit/zoom input to the camera
    fn update_camera(&mut self) {
        if self.controller.update(&mut self.camera) {
            let requested = self.settings.camera_moved();
            self.schedule(requested);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(render) = &mut self.render else {
            return;
        };

        let reasons = self.settings.begin_frame();
        log::trace!("Redraw: {:?}", reasons);

        match render.render_frame(&self.settings, &self.camera) {
            Ok(()) => {}
            Err(RenderError::SurfaceLost) => {
                render.recover_surface();
                let requested = self.settings.resized();
                self.schedule(requested);
            }
            Err(RenderError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("Surface error: {}", e),
        }
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match WindowSystem::create(event_loop, &self.config.window) {
            Ok(window) => window,
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        };

        let render = match RenderSystem::new(
            window.window().clone(),
            &self.config.rendering,
            self.config.raycast.transfer_resolution,
            self.config.window.vsync,
        ) {
            Ok(render) => render,
            Err(e) => {
                log::error!("Cannot render: {}", e);
                event_loop.exit();
                return;
            }
        };

        self.window = Some(window);
        self.render = Some(render);
        self.refresh_title();

        if let Some(path) = self.startup_path.take() {
            self.loads.request(path);
        }
        if let Some((volume, name)) = self.pending_volume.take() {
            self.install_volume(volume, name);
        }

        // Settings start dirty, so the first frame is always drawn
        self.schedule(self.settings.is_dirty());
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::VolumeLoaded(loaded) => {
                let name = loaded
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| loaded.path.display().to_string());
                if let Some(volume) = self.loads.finish(loaded) {
                    self.install_volume(volume, name);
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(render) = &mut self.render {
                    render.resize(physical_size.width, physical_size.height);
                }
                let requested = self.settings.resized();
                self.schedule(requested);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if let Some(action) = InputMapper::map_keyboard(key, event.state) {
                        self.handle_action(event_loop, action);
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                self.controller.process_mouse_button(button, state);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.controller.process_scroll(delta);
                self.update_camera();
            }

            WindowEvent::DroppedFile(path) => {
                self.loads.request(path);
            }

            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }

            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.controller.process_mouse_motion(delta.0, delta.1) {
                self.update_camera();
            }
        }
    }
}

fn main() {
    let loaded = AppConfig::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()),
    )
    .init();
    if let Err(e) = &loaded {
        log::warn!("Failed to load config: {}. Using defaults.", e);
    }
    log::info!("Starting voxcast");

    let startup_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.volume.path.clone());

    let event_loop = EventLoop::<UserEvent>::with_user_event()
        .build()
        .expect("Failed to create event loop");
    // Frames are drawn on demand only
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, event_loop.create_proxy(), startup_path);
    event_loop.run_app(&mut app).expect("Event loop error");
}
