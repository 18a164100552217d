//! Capture configuration.
//!
//! The facing mode is requested as an exact constraint: a device that
//! cannot satisfy it must fail acquisition instead of substituting
//! another camera.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Default bound on the wait for the first "playing" notification.
pub const DEFAULT_START_TIMEOUT_MS: u64 = 5000;

/// Default JPEG quality used for previews and uploads.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Direction the requested camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Towards the user (front camera).
    User,
    /// Away from the user (rear camera).
    Environment,
    /// Towards the user's left.
    Left,
    /// Towards the user's right.
    Right,
}

impl FacingMode {
    /// Returns the constraint keyword for this facing mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
            FacingMode::Left => "left",
            FacingMode::Right => "right",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for camera capture.
///
/// Immutable once a controller has been built from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Facing direction, matched exactly.
    pub facing_mode: FacingMode,
    /// Requested frame width in pixels.
    pub width: u32,
    /// Requested frame height in pixels.
    pub height: u32,
    /// Mirror previews horizontally.
    pub flip_image: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::User,
            width: 640,
            height: 480,
            flip_image: false,
        }
    }
}

impl CaptureConfig {
    /// Creates a configuration for the given facing mode and dimensions.
    pub fn new(facing_mode: FacingMode, width: u32, height: u32) -> Self {
        Self {
            facing_mode,
            width,
            height,
            ..Default::default()
        }
    }

    /// Enables or disables mirrored previews.
    pub fn with_flip(mut self, flip_image: bool) -> Self {
        self.flip_image = flip_image;
        self
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    #[error("stream start timeout must be non-zero")]
    InvalidTimeout,
    #[error("invalid jpeg quality {0} (must be 1-100)")]
    InvalidJpegQuality(u8),
    #[error("invalid preview ratio {0} (must be positive)")]
    InvalidPreviewRatio(f64),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Stream startup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Bound on the wait for playback to begin, in milliseconds.
    pub start_timeout_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            start_timeout_ms: DEFAULT_START_TIMEOUT_MS,
        }
    }
}

impl StreamConfig {
    /// Returns the start timeout as a [`Duration`].
    pub fn start_timeout(&self) -> Duration {
        Duration::from_millis(self.start_timeout_ms)
    }
}

/// Preview rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
    /// Scale factor used by the CLI when showing previews.
    pub preview_ratio: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            preview_ratio: 1.0,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { metrics_port: 9090 }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        if self.stream.start_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if !(1..=100).contains(&self.render.jpeg_quality) {
            return Err(ConfigError::InvalidJpegQuality(self.render.jpeg_quality));
        }
        let ratio = self.render.preview_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ConfigError::InvalidPreviewRatio(ratio));
        }
        Ok(())
    }
}
