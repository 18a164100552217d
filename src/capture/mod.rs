//! Camera stream acquisition and frame handling.
//!
//! This module owns the live stream lifecycle ([`StreamManager`]), the
//! platform seams it is built on ([`MediaDevices`], [`VideoTrack`],
//! [`PlaybackElement`]) and the still-image [`FrameBuffer`] that grabs
//! are painted into.

mod config;
mod device;
mod element;
mod frame;
mod latch;
pub mod mock;
mod stream;

pub use config::{
    CaptureConfig, ConfigError, FacingMode, FileConfig, OutputConfig, RenderConfig, StreamConfig,
    DEFAULT_JPEG_QUALITY, DEFAULT_START_TIMEOUT_MS,
};
pub use device::{
    AcquisitionError, MediaConstraints, MediaDevices, MediaStream, TrackSettings,
    VideoConstraints, VideoTrack,
};
pub use element::{DrawError, PlaybackElement};
pub use frame::FrameBuffer;
pub use latch::PlayListener;
pub use stream::{StreamManager, StreamState};
