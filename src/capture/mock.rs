//! Synthetic camera host for tests and demonstrations.
//!
//! [`MockDevices`] and [`MockElement`] are cheap to clone; clones share
//! state, so a test can keep a handle after moving one into a
//! controller.

use super::{
    AcquisitionError, DrawError, FacingMode, MediaConstraints, MediaDevices, MediaStream,
    PlayListener, PlaybackElement, TrackSettings, VideoTrack,
};
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// A synthetic video track.
#[derive(Debug)]
pub struct MockTrack {
    label: String,
    settings: TrackSettings,
    muted: AtomicBool,
    stopped: AtomicBool,
}

impl MockTrack {
    fn new(label: String, settings: TrackSettings) -> Self {
        Self {
            label,
            settings,
            muted: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// Simulates a stall (`true`) or recovery (`false`).
    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }

    /// Whether `stop` has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl VideoTrack for MockTrack {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    fn settings(&self) -> TrackSettings {
        self.settings
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct DevicesState {
    facing_modes: Vec<FacingMode>,
    native_resolution: Option<(u32, u32)>,
    permission_denied: bool,
    issued: Vec<Arc<MockTrack>>,
}

/// Synthetic device API.
///
/// Offers a front and a rear camera by default and grants the requested
/// resolution unless a native resolution is configured.
#[derive(Debug, Clone)]
pub struct MockDevices {
    state: Arc<Mutex<DevicesState>>,
}

impl Default for MockDevices {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDevices {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DevicesState {
                facing_modes: vec![FacingMode::User, FacingMode::Environment],
                native_resolution: None,
                permission_denied: false,
                issued: Vec::new(),
            })),
        }
    }

    /// Restricts the available cameras to `modes`.
    pub fn with_facing_modes(self, modes: &[FacingMode]) -> Self {
        self.lock().facing_modes = modes.to_vec();
        self
    }

    /// Makes every camera run at `width` x `height` regardless of the
    /// request.
    pub fn with_native_resolution(self, width: u32, height: u32) -> Self {
        self.lock().native_resolution = Some((width, height));
        self
    }

    /// Rejects every request with [`AcquisitionError::PermissionDenied`].
    pub fn deny_permission(self) -> Self {
        self.lock().permission_denied = true;
        self
    }

    /// All tracks handed out so far, oldest first.
    pub fn tracks(&self) -> Vec<Arc<MockTrack>> {
        self.lock().issued.clone()
    }

    /// The most recently issued track.
    pub fn latest_track(&self) -> Option<Arc<MockTrack>> {
        self.lock().issued.last().cloned()
    }

    /// Number of successful acquisitions.
    pub fn acquisitions(&self) -> usize {
        self.lock().issued.len()
    }

    /// Number of issued tracks that have not been stopped.
    pub fn live_tracks(&self) -> usize {
        self.lock().issued.iter().filter(|t| !t.is_stopped()).count()
    }

    fn lock(&self) -> MutexGuard<'_, DevicesState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl MediaDevices for MockDevices {
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, AcquisitionError> {
        let mut state = self.lock();
        if state.permission_denied {
            return Err(AcquisitionError::PermissionDenied);
        }

        let facing_mode = constraints.video.facing_mode;
        if !state.facing_modes.contains(&facing_mode) {
            return Err(AcquisitionError::Overconstrained {
                constraint: format!("facingMode={}", facing_mode),
            });
        }

        let (width, height) = state
            .native_resolution
            .unwrap_or((constraints.video.width, constraints.video.height));
        let index = state.issued.len() + 1;
        let track = Arc::new(MockTrack::new(
            format!("Mock {} camera", facing_mode),
            TrackSettings {
                width,
                height,
                facing_mode,
            },
        ));
        state.issued.push(Arc::clone(&track));

        let video_track: Arc<dyn VideoTrack> = track;
        Ok(MediaStream::new(format!("mock-stream-{}", index), vec![video_track]))
    }
}

/// When a [`MockElement`] reports that playback started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayBehavior {
    /// As soon as a source is bound.
    Immediate,
    /// After the given delay (requires a tokio runtime).
    Delayed(Duration),
    /// Never.
    Never,
}

#[derive(Default)]
struct ElementState {
    listener: Option<PlayListener>,
    source: Option<MediaStream>,
    behavior: Option<PlayBehavior>,
    scene: Option<RgbImage>,
    sources_bound: u64,
    fail_draws: bool,
}

/// Synthetic playback element.
///
/// Paints either a configured scene or a gradient whose blue channel
/// changes with every bound source.
#[derive(Clone, Default)]
pub struct MockElement {
    state: Arc<Mutex<ElementState>>,
}

impl MockElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets when playback is reported.
    pub fn with_behavior(self, behavior: PlayBehavior) -> Self {
        self.set_behavior(behavior);
        self
    }

    /// Paints `scene` instead of the gradient.
    pub fn with_scene(self, scene: RgbImage) -> Self {
        self.lock().scene = Some(scene);
        self
    }

    /// Changes when playback is reported for subsequent sources.
    pub fn set_behavior(&self, behavior: PlayBehavior) {
        self.lock().behavior = Some(behavior);
    }

    /// Makes every draw fail with [`DrawError::NoFrame`] while set.
    pub fn set_fail_draws(&self, fail: bool) {
        self.lock().fail_draws = fail;
    }

    /// Number of streams bound so far.
    pub fn sources_bound(&self) -> u64 {
        self.lock().sources_bound
    }

    fn lock(&self) -> MutexGuard<'_, ElementState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PlaybackElement for MockElement {
    fn set_play_listener(&mut self, listener: PlayListener) {
        self.lock().listener = Some(listener);
    }

    fn set_source(&mut self, stream: MediaStream) {
        let (listener, behavior) = {
            let mut state = self.lock();
            state.source = Some(stream);
            state.sources_bound += 1;
            (
                state.listener.clone(),
                state.behavior.unwrap_or(PlayBehavior::Immediate),
            )
        };

        let Some(listener) = listener else {
            return;
        };
        match behavior {
            PlayBehavior::Immediate => listener.notify_playing(),
            PlayBehavior::Delayed(delay) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    listener.notify_playing();
                });
            }
            PlayBehavior::Never => {}
        }
    }

    fn video_size(&self) -> (u32, u32) {
        let state = self.lock();
        state
            .source
            .as_ref()
            .and_then(MediaStream::first_video_track)
            .map(|t| {
                let settings = t.settings();
                (settings.width, settings.height)
            })
            .unwrap_or((0, 0))
    }

    fn draw_frame(&self, target: &mut RgbImage) -> Result<(), DrawError> {
        let state = self.lock();
        let track = state
            .source
            .as_ref()
            .and_then(MediaStream::first_video_track)
            .ok_or(DrawError::NoSource)?;
        if track.muted() || state.fail_draws {
            return Err(DrawError::NoFrame);
        }

        let settings = track.settings();
        let (width, height) = (
            settings.width.min(target.width()),
            settings.height.min(target.height()),
        );
        let tint = (state.sources_bound.wrapping_mul(40) % 256) as u8;

        for y in 0..height {
            for x in 0..width {
                let pixel = match &state.scene {
                    Some(scene) if x < scene.width() && y < scene.height() => {
                        *scene.get_pixel(x, y)
                    }
                    Some(_) => Rgb([0, 0, 0]),
                    None => Rgb([
                        (x * 255 / settings.width.max(1)) as u8,
                        (y * 255 / settings.height.max(1)) as u8,
                        tint,
                    ]),
                };
                target.put_pixel(x, y, pixel);
            }
        }
        Ok(())
    }
}
