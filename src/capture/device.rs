//! Device acquisition abstraction.
//!
//! This module provides a trait-based abstraction over the platform's
//! media device API, allowing for both real camera input and the
//! synthetic implementation in [`super::mock`].

use super::{CaptureConfig, FacingMode};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by the device API when a stream cannot be acquired.
#[derive(Debug, Clone, Error)]
pub enum AcquisitionError {
    #[error("no camera device found")]
    NotFound,
    #[error("constraint could not be satisfied: {constraint}")]
    Overconstrained { constraint: String },
    #[error("permission to use the camera was denied")]
    PermissionDenied,
    #[error("camera could not be read: {0}")]
    NotReadable(String),
    #[error("acquired stream has no video track")]
    NoVideoTrack,
}

/// Video part of a stream request.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoConstraints {
    /// Ideal width in pixels.
    pub width: u32,
    /// Ideal height in pixels.
    pub height: u32,
    /// Facing mode, required to match exactly.
    pub facing_mode: FacingMode,
}

/// Parameters passed to [`MediaDevices::get_user_media`].
#[derive(Debug, Clone, PartialEq)]
pub struct MediaConstraints {
    /// Audio is never requested by the capture controller.
    pub audio: bool,
    pub video: VideoConstraints,
}

impl MediaConstraints {
    /// Builds the video-only request for a capture configuration.
    pub fn for_capture(config: &CaptureConfig) -> Self {
        Self {
            audio: false,
            video: VideoConstraints {
                width: config.width,
                height: config.height,
                facing_mode: config.facing_mode,
            },
        }
    }
}

/// Settings a live track actually runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackSettings {
    pub width: u32,
    pub height: u32,
    pub facing_mode: FacingMode,
}

/// A live hardware video track.
///
/// Tracks are shared handles: the stream bound to the playback element
/// and the stream manager refer to the same track, so `stop` takes
/// `&self`.
pub trait VideoTrack: Send + Sync {
    /// Human-readable label of the source device.
    fn label(&self) -> String;

    /// Whether the track currently delivers no frames.
    fn muted(&self) -> bool;

    /// Resolution and facing mode the device settled on.
    fn settings(&self) -> TrackSettings;

    /// Stops the underlying hardware track.
    fn stop(&self);
}

/// A stream returned by the device API.
#[derive(Clone)]
pub struct MediaStream {
    id: String,
    video_tracks: Vec<Arc<dyn VideoTrack>>,
}

impl MediaStream {
    /// Creates a stream from its video tracks.
    pub fn new(id: impl Into<String>, video_tracks: Vec<Arc<dyn VideoTrack>>) -> Self {
        Self {
            id: id.into(),
            video_tracks,
        }
    }

    /// Returns the stream identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns all video tracks.
    pub fn video_tracks(&self) -> &[Arc<dyn VideoTrack>] {
        &self.video_tracks
    }

    /// Returns the first video track, if any.
    pub fn first_video_track(&self) -> Option<Arc<dyn VideoTrack>> {
        self.video_tracks.first().cloned()
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("video_tracks", &self.video_tracks.len())
            .finish()
    }
}

/// Trait for the platform's device acquisition API.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Requests a live stream matching `constraints`.
    ///
    /// Implementations must fail with
    /// [`AcquisitionError::Overconstrained`] instead of substituting a
    /// camera with a different facing mode.
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, AcquisitionError>;
}
