//! Error types for particle-field.
//!
//! The simulation itself never fails; these cover the edges around it:
//! loading configuration, exporting frames, and running the desktop host.

use std::fmt;

/// Errors that can occur while loading or validating a [`FieldConfig`](crate::FieldConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    Io(std::io::Error),
    /// The file is not valid JSON for a field configuration.
    Parse(serde_json::Error),
    /// A value is out of range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors that can occur when writing a rendered frame to disk.
#[derive(Debug)]
pub enum ExportError {
    /// The surface has zero width or height.
    EmptySurface,
    /// Failed to encode or write the image.
    Image(image::ImageError),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::EmptySurface => write!(f, "Cannot export a surface with zero area"),
            ExportError::Image(e) => write!(f, "Failed to write image: {}", e),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::EmptySurface => None,
            ExportError::Image(e) => Some(e),
        }
    }
}

impl From<image::ImageError> for ExportError {
    fn from(e: image::ImageError) -> Self {
        ExportError::Image(e)
    }
}

/// Errors that can occur when running the desktop window host.
#[derive(Debug)]
pub enum HostError {
    /// Failed to create or run the event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create the window.
    Window(winit::error::OsError),
    /// Failed to create, resize, or present the software framebuffer.
    Present(softbuffer::SoftBufferError),
    /// The configuration was rejected before the window opened.
    Config(ConfigError),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::EventLoop(e) => write!(f, "Event loop error: {}", e),
            HostError::Window(e) => write!(f, "Failed to create window: {}", e),
            HostError::Present(e) => write!(f, "Failed to present frame: {}", e),
            HostError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostError::EventLoop(e) => Some(e),
            HostError::Window(e) => Some(e),
            HostError::Present(e) => Some(e),
            HostError::Config(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for HostError {
    fn from(e: winit::error::EventLoopError) -> Self {
        HostError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for HostError {
    fn from(e: winit::error::OsError) -> Self {
        HostError::Window(e)
    }
}

impl From<softbuffer::SoftBufferError> for HostError {
    fn from(e: softbuffer::SoftBufferError) -> Self {
        HostError::Present(e)
    }
}

impl From<ConfigError> for HostError {
    fn from(e: ConfigError) -> Self {
        HostError::Config(e)
    }
}
