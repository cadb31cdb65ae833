//! Render error types

use std::fmt;

/// A pass whose shaders or pipeline failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderCompileError {
    /// Which pass failed ("position", "raycast", "overlay")
    pub pass: &'static str,
    /// Message reported by the device
    pub message: String,
}

impl fmt::Display for ShaderCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shader compile error in {} pass: {}", self.pass, self.message)
    }
}

impl std::error::Error for ShaderCompileError {}

/// Render error types
#[derive(Debug)]
pub enum RenderError {
    /// Surface was lost (window resized, minimized, etc.)
    SurfaceLost,
    /// GPU out of memory
    OutOfMemory,
    /// A pipeline could not be built; rendering is impossible
    ShaderCompile(ShaderCompileError),
    /// Other surface or device error
    Other(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::SurfaceLost => write!(f, "Surface lost"),
            RenderError::OutOfMemory => write!(f, "Out of memory"),
            RenderError::ShaderCompile(err) => write!(f, "{}", err),
            RenderError::Other(msg) => write!(f, "Render error: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ShaderCompile(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderCompileError> for RenderError {
    fn from(err: ShaderCompileError) -> Self {
        RenderError::ShaderCompile(err)
    }
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => RenderError::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            other => RenderError::Other(format!("{:?}", other)),
        }
    }
}
