//! Error types for coinswarm.
//!
//! Runtime data problems (bad entity fields, degenerate axes, missing icons,
//! stray pointer events) are recovered locally and never reach these types.
//! What is left are host-side mistakes that should fail fast: unknown mode
//! strings, invalid configuration, and failures while loading files or
//! bringing up the demo window.

use std::fmt;

/// Errors that can occur during GPU initialization of the demo presenter.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for presenting.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors surfaced by the swarm engine and its host helpers.
#[derive(Debug)]
pub enum SwarmError {
    /// A layout mode string other than `"map"` or `"game"`.
    UnknownMode(String),
    /// A sizing mode string other than `"performance"` or `"capitalization"`.
    UnknownSizingMode(String),
    /// A lookback window string that is not `"1h"`, `"24h"` or `"7d"`.
    UnknownTimeframe(String),
    /// An axis metric string that is not recognized.
    UnknownMetric(String),
    /// A configuration value outside its valid range.
    InvalidConfig(String),
    /// Failed to read or write a file.
    Io(std::io::Error),
    /// Failed to parse or serialize JSON.
    Json(serde_json::Error),
    /// Failed to decode an icon image.
    Icon(image::ImageError),
    /// Failed to create the event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create the window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
}

impl fmt::Display for SwarmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwarmError::UnknownMode(s) => write!(f, "Unknown mode '{}'. Expected \"map\" or \"game\".", s),
            SwarmError::UnknownSizingMode(s) => write!(f, "Unknown sizing mode '{}'. Expected \"performance\" or \"capitalization\".", s),
            SwarmError::UnknownTimeframe(s) => write!(f, "Unknown timeframe '{}'. Expected \"1h\", \"24h\" or \"7d\".", s),
            SwarmError::UnknownMetric(s) => write!(f, "Unknown metric '{}'. Expected \"change\", \"volume\" or \"market_cap\".", s),
            SwarmError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            SwarmError::Io(e) => write!(f, "I/O error: {}", e),
            SwarmError::Json(e) => write!(f, "JSON error: {}", e),
            SwarmError::Icon(e) => write!(f, "Failed to decode icon: {}", e),
            SwarmError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            SwarmError::Window(e) => write!(f, "Failed to create window: {}", e),
            SwarmError::Gpu(e) => write!(f, "GPU error: {}", e),
        }
    }
}

impl std::error::Error for SwarmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SwarmError::Io(e) => Some(e),
            SwarmError::Json(e) => Some(e),
            SwarmError::Icon(e) => Some(e),
            SwarmError::EventLoop(e) => Some(e),
            SwarmError::Window(e) => Some(e),
            SwarmError::Gpu(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SwarmError {
    fn from(e: std::io::Error) -> Self {
        SwarmError::Io(e)
    }
}

impl From<serde_json::Error> for SwarmError {
    fn from(e: serde_json::Error) -> Self {
        SwarmError::Json(e)
    }
}

impl From<image::ImageError> for SwarmError {
    fn from(e: image::ImageError) -> Self {
        SwarmError::Icon(e)
    }
}

impl From<winit::error::EventLoopError> for SwarmError {
    fn from(e: winit::error::EventLoopError) -> Self {
        SwarmError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for SwarmError {
    fn from(e: winit::error::OsError) -> Self {
        SwarmError::Window(e)
    }
}

impl From<GpuError> for SwarmError {
    fn from(e: GpuError) -> Self {
        SwarmError::Gpu(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_unknown_mode_message_names_the_input() {
        let err = SwarmError::UnknownMode("pinball".into());
        assert!(err.to_string().contains("pinball"));
        assert!(err.source().is_none());
    }

    #[test]
    fn test_io_error_has_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SwarmError = io.into();
        assert!(err.source().is_some());
    }
}
