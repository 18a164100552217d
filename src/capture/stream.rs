//! Stream acquisition, readiness wait and teardown.

use super::latch::ReadyLatch;
use super::{
    AcquisitionError, CaptureConfig, MediaConstraints, MediaDevices, PlaybackElement, VideoTrack,
};
use crate::error::CaptureError;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle state of the live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    /// No stream held.
    Idle,
    /// Waiting for the device and for playback to begin.
    Acquiring,
    /// A live track is held and playback has started.
    Ready,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamState::Idle => "idle",
            StreamState::Acquiring => "acquiring",
            StreamState::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Owns the live camera stream.
///
/// Holds at most one live track. The playback element is bound to each
/// acquired stream and reports readiness through a one-shot latch.
pub struct StreamManager {
    devices: Box<dyn MediaDevices>,
    element: Box<dyn PlaybackElement>,
    constraints: MediaConstraints,
    start_timeout: Duration,
    latch: ReadyLatch,
    track: Option<Arc<dyn VideoTrack>>,
    state: StreamState,
    /// Successful starts so far.
    generation: u64,
    /// Readiness waits that ran out of time.
    start_timeouts: u64,
}

impl StreamManager {
    /// Creates an idle stream manager and registers its play listener
    /// with `element`.
    pub fn new(
        config: &CaptureConfig,
        start_timeout: Duration,
        devices: Box<dyn MediaDevices>,
        mut element: Box<dyn PlaybackElement>,
    ) -> Self {
        let latch = ReadyLatch::new();
        element.set_play_listener(latch.listener());

        Self {
            devices,
            element,
            constraints: MediaConstraints::for_capture(config),
            start_timeout,
            latch,
            track: None,
            state: StreamState::Idle,
            generation: 0,
            start_timeouts: 0,
        }
    }

    /// Acquires a stream and waits for playback to begin.
    ///
    /// Must not be called while another readiness wait is outstanding.
    /// A stream that is already live is stopped first.
    pub async fn enable(&mut self) -> Result<(), CaptureError> {
        if self.track.is_some() {
            debug!("enable called with a live stream; stopping it first");
            self.disable();
        }

        self.state = StreamState::Acquiring;
        match self.acquire().await {
            Ok(track) => {
                self.generation += 1;
                info!(
                    label = %track.label(),
                    generation = self.generation,
                    "Camera stream ready"
                );
                self.track = Some(track);
                self.state = StreamState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = StreamState::Idle;
                Err(e)
            }
        }
    }

    async fn acquire(&mut self) -> Result<Arc<dyn VideoTrack>, CaptureError> {
        let mut pending = PendingStart {
            latch: &self.latch,
            state: &mut self.state,
            track: None,
        };

        let stream = self.devices.get_user_media(&self.constraints).await?;
        let track = stream
            .first_video_track()
            .ok_or(AcquisitionError::NoVideoTrack)?;
        pending.track = Some(Arc::clone(&track));

        // Armed before binding so an immediate "playing" is not lost.
        let ready = self.latch.arm();
        self.element.set_source(stream);

        match tokio::time::timeout(self.start_timeout, ready).await {
            Ok(Ok(())) => {
                pending.complete();
                Ok(track)
            }
            Ok(Err(_)) | Err(_) => {
                self.start_timeouts += 1;
                warn!(
                    timeout_ms = self.start_timeout.as_millis() as u64,
                    "Playback did not start in time"
                );
                Err(CaptureError::StreamStartTimeout(self.start_timeout))
            }
        }
    }

    /// Stops the live track, if any. Idempotent.
    pub fn disable(&mut self) {
        if let Some(track) = self.track.take() {
            track.stop();
            info!(label = %track.label(), "Camera stream stopped");
        }
        self.state = StreamState::Idle;
    }

    /// Whether the live track reports that it delivers no frames.
    pub fn is_muted(&self) -> bool {
        self.track.as_ref().is_some_and(|t| t.muted())
    }

    /// Returns the current state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Returns the live track.
    pub fn track(&self) -> Option<&Arc<dyn VideoTrack>> {
        self.track.as_ref()
    }

    /// Returns the playback element.
    pub fn element(&self) -> &dyn PlaybackElement {
        self.element.as_ref()
    }

    /// Number of successful starts.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of readiness waits that timed out.
    pub fn start_timeouts(&self) -> u64 {
        self.start_timeouts
    }

    pub(crate) fn is_waiting_for_playback(&self) -> bool {
        self.latch.is_armed()
    }
}

/// An acquisition in progress.
///
/// Unless completed, dropping it (on error, or because the `enable`
/// future was dropped mid-wait) disarms the latch, stops the acquired
/// track and returns the manager to `Idle`.
struct PendingStart<'a> {
    latch: &'a ReadyLatch,
    state: &'a mut StreamState,
    track: Option<Arc<dyn VideoTrack>>,
}

impl PendingStart<'_> {
    fn complete(self) {
        *self.state = StreamState::Ready;
    }
}

impl Drop for PendingStart<'_> {
    fn drop(&mut self) {
        if *self.state == StreamState::Ready {
            return;
        }
        self.latch.disarm();
        if let Some(track) = self.track.take() {
            track.stop();
            debug!(label = %track.label(), "Abandoned stream start; track stopped");
        }
        *self.state = StreamState::Idle;
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.disable();
    }
}
