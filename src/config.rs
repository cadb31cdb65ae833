//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`VOXCAST_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use std::path::{Path, PathBuf};

use voxcast_core::{
    Color, CuttingPlane, Lighting, RenderSettings, Stop, TransferCurve, TransferFunction,
    DEFAULT_HISTOGRAM_BINS, DEFAULT_LOOKUP_RESOLUTION,
};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Window configuration
    #[serde(default)]
    pub window: WindowConfig,
    /// Camera configuration
    #[serde(default)]
    pub camera: CameraConfig,
    /// Volume file configuration
    #[serde(default)]
    pub volume: VolumeConfig,
    /// Ray marching configuration
    #[serde(default)]
    pub raycast: RaycastConfig,
    /// Cutting plane configuration
    #[serde(default)]
    pub plane: PlaneConfig,
    /// Initial transfer function
    #[serde(default)]
    pub transfer_function: TransferFunctionConfig,
    /// Rendering configuration
    #[serde(default)]
    pub rendering: RenderingConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`VOXCAST_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        // Optional user overrides
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // Environment variables override everything
        // VOXCAST_VOLUME__PATH=head.raw -> volume.path = "head.raw"
        figment = figment.merge(Env::prefixed("VOXCAST_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }

    /// Initial render state described by this configuration
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings::new(self.plane.cutting_plane(), self.transfer_function.transfer_function())
            .with_marching(
                self.raycast.step_size,
                self.raycast.early_termination_alpha,
                self.raycast.max_steps,
            )
            .with_lighting(self.raycast.lighting())
            .with_modes(
                self.raycast.shading,
                self.raycast.mip,
                self.plane.cut_enabled,
                self.plane.visible,
            )
            .with_jitter(self.raycast.jitter)
            .with_transfer_resolution(self.raycast.transfer_resolution)
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Enable VSync
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "voxcast".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Field of view in degrees
    pub fov: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
    /// Starting distance as a multiple of the volume's largest dimension
    pub distance_factor: f32,
    /// Radians of orbit per pixel dragged
    pub orbit_sensitivity: f32,
    /// Fraction of the distance covered per scroll line
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.5,
            far: 5000.0,
            distance_factor: 2.0,
            orbit_sensitivity: 0.005,
            zoom_speed: 0.1,
        }
    }
}

/// Volume file configuration
///
/// Raw files carry no header, so the dimensions must be known up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// File to load at startup (a CLI argument takes precedence)
    pub path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    /// Number of histogram bins logged after a load
    pub histogram_bins: usize,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            path: None,
            width: 256,
            height: 256,
            depth: 256,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

/// Ray marching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaycastConfig {
    /// Distance between samples in voxels
    pub step_size: f32,
    /// Accumulated opacity at which a ray stops
    pub early_termination_alpha: f32,
    /// Upper bound on samples per ray
    pub max_steps: u32,
    /// Start with gradient shading enabled
    pub shading: bool,
    /// Start in maximum intensity projection mode
    pub mip: bool,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
    /// Texels in the transfer-function lookup
    pub transfer_resolution: u32,
    /// Offset each ray's first sample to hide banding
    pub jitter: bool,
}

impl Default for RaycastConfig {
    fn default() -> Self {
        let lighting = Lighting::default();
        Self {
            step_size: 0.5,
            early_termination_alpha: 0.95,
            max_steps: 2048,
            shading: true,
            mip: false,
            ambient: lighting.ambient,
            diffuse: lighting.diffuse,
            specular: lighting.specular,
            shininess: lighting.shininess,
            transfer_resolution: DEFAULT_LOOKUP_RESOLUTION,
            jitter: true,
        }
    }
}

impl RaycastConfig {
    pub fn lighting(&self) -> Lighting {
        Lighting {
            ambient: self.ambient,
            diffuse: self.diffuse,
            specular: self.specular,
            shininess: self.shininess,
        }
    }
}

/// Cutting plane configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneConfig {
    /// Height slider position in [0, 1]
    pub height: f32,
    /// Rotation about X in degrees
    pub rotation_x: f32,
    /// Rotation about Y in degrees
    pub rotation_y: f32,
    /// Overlay colour as `#rrggbb`
    pub color: String,
    pub flipped: bool,
    /// Clip samples behind the plane
    pub cut_enabled: bool,
    /// Draw the plane overlay
    pub visible: bool,
    /// Height change per key press
    pub height_step: f32,
    /// Rotation change per key press, in degrees
    pub rotation_step: f32,
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            height: 0.5,
            rotation_x: 0.0,
            rotation_y: 0.0,
            color: "#ffffff".to_string(),
            flipped: false,
            cut_enabled: true,
            visible: true,
            height_step: 0.05,
            rotation_step: 5.0,
        }
    }
}

impl PlaneConfig {
    pub fn cutting_plane(&self) -> CuttingPlane {
        let color = parse_color(&self.color).unwrap_or(Color::WHITE);
        CuttingPlane::new(self.height, self.rotation_x, self.rotation_y, color, self.flipped)
    }
}

/// A stop as written in the config: position plus `#rrggbb` colour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopConfig {
    pub position: f32,
    pub color: String,
}

impl StopConfig {
    pub fn new(position: f32, color: &str) -> Self {
        Self {
            position,
            color: color.to_string(),
        }
    }
}

/// Initial transfer function
///
/// Opacity stops are written as grey levels: black is transparent and white
/// is opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferFunctionConfig {
    pub color_stops: Vec<StopConfig>,
    pub alpha_stops: Vec<StopConfig>,
    /// Step interpolation for the colour curve
    pub hard_color: bool,
    /// Step interpolation for the opacity curve
    pub hard_alpha: bool,
}

impl Default for TransferFunctionConfig {
    fn default() -> Self {
        Self {
            color_stops: vec![StopConfig::new(0.0, "#000000"), StopConfig::new(1.0, "#ffffff")],
            alpha_stops: vec![StopConfig::new(0.0, "#000000"), StopConfig::new(1.0, "#ffffff")],
            hard_color: false,
            hard_alpha: false,
        }
    }
}

impl TransferFunctionConfig {
    /// Build the curves, skipping stops with unreadable colours
    pub fn transfer_function(&self) -> TransferFunction {
        let stops = |list: &[StopConfig], make: fn(f32, Color) -> Stop| {
            list.iter()
                .filter_map(|s| parse_color(&s.color).map(|c| make(s.position, c)))
                .collect::<Vec<_>>()
        };
        TransferFunction::new(
            TransferCurve::new(stops(&self.color_stops[..], Stop::color)).with_hard(self.hard_color),
            TransferCurve::new(stops(&self.alpha_stops[..], Stop::from_luminance)).with_hard(self.hard_alpha),
        )
    }
}

fn parse_color(hex: &str) -> Option<Color> {
    let color = Color::from_hex(hex);
    if color.is_none() {
        log::warn!("Ignoring invalid colour '{}' in config", hex);
    }
    color
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// Background color [r, g, b, a]
    pub background_color: [f32; 4],
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            background_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.raycast.step_size, 0.5);
        assert_eq!(config.camera.distance_factor, 2.0);
    }

    #[test]
    fn test_startup_modes() {
        // Viewer opens shaded and cut, not in MIP
        let settings = AppConfig::default().render_settings();
        assert!(settings.shading());
        assert!(settings.cut_enabled());
        assert!(!settings.mip());
        assert!(settings.plane_visible());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("title"));
        assert!(toml.contains("step_size"));
        assert!(toml.contains("color_stops"));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: AppConfig = toml::from_str("[plane]\nheight = 0.25\n").unwrap();
        assert_eq!(config.plane.height, 0.25);
        assert!(config.plane.visible);
        assert_eq!(config.plane.rotation_step, 5.0);
    }

    #[test]
    fn test_render_settings_follow_config() {
        let mut config = AppConfig::default();
        config.raycast.mip = true;
        config.plane.cut_enabled = false;
        config.plane.visible = false;
        config.raycast.transfer_resolution = 64;

        let settings = config.render_settings();
        assert!(settings.mip());
        assert!(!settings.cut_enabled());
        assert!(!settings.plane_visible());
        assert_eq!(settings.transfer_resolution(), 64);
    }

    #[test]
    fn test_default_transfer_function_is_ramp() {
        let lookup = TransferFunctionConfig::default()
            .transfer_function()
            .build_lookup(256);
        assert_eq!(lookup.texels()[0], [0, 0, 0, 0]);
        assert_eq!(lookup.texels()[255], [255, 255, 255, 255]);
    }

    #[test]
    fn test_invalid_stop_colour_is_skipped() {
        let config = TransferFunctionConfig {
            color_stops: vec![StopConfig::new(0.0, "#ff0000"), StopConfig::new(1.0, "nonsense")],
            ..TransferFunctionConfig::default()
        };
        assert_eq!(config.transfer_function().color.len(), 1);
    }

    #[test]
    fn test_plane_colour() {
        let plane = PlaneConfig {
            color: "#00ff00".to_string(),
            ..PlaneConfig::default()
        };
        assert_eq!(plane.cutting_plane().color(), Color::new(0.0, 1.0, 0.0));

        let bad = PlaneConfig {
            color: "green".to_string(),
            ..PlaneConfig::default()
        };
        assert_eq!(bad.cutting_plane().color(), Color::WHITE);
    }
}
