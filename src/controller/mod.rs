//! The capture controller.
//!
//! Composes the stream manager, the frame buffer, the analyzer and the
//! renderer into one object that a test harness drives sequentially.
//!
//! ```text
//! StreamManager → grab_frame → FrameBuffer → { Analyzer, Renderer }
//!                                                   ↓
//!                                       DisplaySink / Transport
//! ```

mod command;

pub use command::Command;

use crate::analysis::{Analyzer, BarcodeDetector, FaceDetector};
use crate::capture::{
    CaptureConfig, ConfigError, DrawError, FileConfig, FrameBuffer, MediaDevices,
    PlaybackElement, StreamManager, StreamState,
};
use crate::error::CaptureError;
use crate::metrics::CaptureStats;
use crate::render::{DisplaySink, Renderer};
use crate::transport::Transport;
use image::RgbImage;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Platform collaborators the controller is built on.
pub struct CaptureHost {
    pub devices: Box<dyn MediaDevices>,
    pub element: Box<dyn PlaybackElement>,
    pub transport: Arc<dyn Transport>,
    pub display: Box<dyn DisplaySink>,
}

/// Acquires a camera stream and serves stills, analysis and previews
/// from it.
pub struct CaptureController {
    config: CaptureConfig,
    streams: StreamManager,
    frame: FrameBuffer,
    analyzer: Analyzer,
    renderer: Renderer,
    transport: Arc<dyn Transport>,
    display: Box<dyn DisplaySink>,
    stall_restarts: u64,
    uploads: u64,
}

impl CaptureController {
    /// Creates an idle controller from a validated configuration.
    pub fn new(config: &FileConfig, host: CaptureHost) -> Result<Self, ConfigError> {
        config.validate()?;
        let capture = config.capture.clone();

        info!(
            facing_mode = %capture.facing_mode,
            width = capture.width,
            height = capture.height,
            flip_image = capture.flip_image,
            "Capture controller created"
        );

        Ok(Self {
            streams: StreamManager::new(
                &capture,
                config.stream.start_timeout(),
                host.devices,
                host.element,
            ),
            frame: FrameBuffer::new(capture.width, capture.height),
            analyzer: Analyzer::new(),
            renderer: Renderer::new(capture.flip_image, config.render.jpeg_quality),
            transport: host.transport,
            display: host.display,
            stall_restarts: 0,
            uploads: 0,
            config: capture,
        })
    }

    /// Installs a face detection capability.
    pub fn with_face_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.analyzer = self.analyzer.with_face_detector(detector);
        self
    }

    /// Installs a barcode detection capability.
    pub fn with_barcode_detector(mut self, detector: Box<dyn BarcodeDetector>) -> Self {
        self.analyzer = self.analyzer.with_barcode_detector(detector);
        self
    }

    /// Replaces the analyzer.
    pub fn with_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Starts the stream and waits until playback has begun.
    pub async fn enable(&mut self) -> Result<(), CaptureError> {
        self.streams.enable().await
    }

    /// Stops the stream. Idempotent.
    pub fn disable(&mut self) {
        self.streams.disable();
    }

    /// Paints the latest frame into the frame buffer.
    ///
    /// A muted track is restarted once before the copy; failures of that
    /// restart are returned as-is. The buffer takes the element's
    /// reported resolution, which may differ from the requested one.
    /// The buffer is only replaced once the element has painted a
    /// complete frame.
    pub async fn grab_frame(&mut self) -> Result<(), CaptureError> {
        if self.streams.track().is_none() {
            return Err(CaptureError::StreamInactive);
        }

        if self.streams.is_muted() {
            warn!("Video track is muted; restarting stream");
            self.stall_restarts += 1;
            self.streams.disable();
            self.streams.enable().await?;
        }

        let element = self.streams.element();
        let (width, height) = element.video_size();
        if width == 0 || height == 0 {
            return Err(DrawError::NoFrame.into());
        }

        // A failed draw leaves the previous frame in place.
        let mut image = RgbImage::new(width, height);
        element.draw_frame(&mut image)?;
        let since_previous = self.frame.store(image, self.streams.generation());

        debug!(
            width,
            height,
            sequence = self.frame.sequence(),
            generation = self.frame.generation(),
            since_previous_ms = since_previous.map(|d| d.as_millis() as u64),
            "Frame grabbed"
        );
        Ok(())
    }

    /// Grabs a frame and uploads it at full resolution.
    ///
    /// Returns the path reported by the transport.
    pub async fn grab_frame_and_transmit_back(&mut self) -> Result<String, CaptureError> {
        self.grab_frame().await?;
        let payload = self.renderer.transport_payload(self.frame.image())?;
        let path = self.transport.upload_temporary_file(&payload).await?;
        self.uploads += 1;

        info!(path = %path, bytes = payload.len(), "Frame transmitted");
        Ok(path)
    }

    /// Detects a face in the current frame, outlining it when found.
    pub async fn detect_faces(&mut self) -> Result<bool, CaptureError> {
        self.require_frame()?;
        Ok(self.analyzer.detect_faces(&mut self.frame).await?)
    }

    /// Decodes a QR code in the current frame.
    pub async fn scan_qr_code(&mut self) -> Result<Option<String>, CaptureError> {
        self.require_frame()?;
        Ok(self.analyzer.scan_qr_code(&self.frame).await?)
    }

    /// Draws the preview of the current frame at `ratio`, without
    /// encoding it.
    pub fn render_preview(&self, ratio: f64) -> Result<RgbImage, CaptureError> {
        self.require_frame()?;
        Ok(self.renderer.render(self.frame.image(), ratio)?)
    }

    /// Renders the current frame at `ratio`, hands the encoded preview
    /// to the display sink and returns it.
    pub fn show_image(&mut self, ratio: f64) -> Result<String, CaptureError> {
        self.require_frame()?;
        let data_url = self.renderer.render_data_url(self.frame.image(), ratio)?;
        self.display.show_image(&data_url);
        Ok(data_url)
    }

    /// Hides or reveals the displayed preview.
    pub fn hide_image(&mut self, hide: bool) {
        self.display.hide_image(hide);
    }

    /// Forwards an instruction to the display sink.
    pub fn show_instruction(&mut self, text: &str) {
        self.display.show_instruction(text);
    }

    /// Returns the capture configuration.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Returns the frame buffer.
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Returns the stream state.
    pub fn stream_state(&self) -> StreamState {
        self.streams.state()
    }

    /// Returns a snapshot of controller counters.
    pub fn stats(&self) -> CaptureStats {
        CaptureStats {
            stream_state: self.streams.state(),
            stream_starts: self.streams.generation(),
            start_timeouts: self.streams.start_timeouts(),
            stall_restarts: self.stall_restarts,
            frames_grabbed: self.frame.sequence(),
            faces_detected: self.analyzer.faces_detected(),
            qr_codes_decoded: self.analyzer.codes_decoded(),
            uploads: self.uploads,
            frame_width: self.frame.width(),
            frame_height: self.frame.height(),
        }
    }

    fn require_frame(&self) -> Result<(), CaptureError> {
        if self.frame.is_set() {
            Ok(())
        } else {
            Err(CaptureError::FrameBufferUnset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{FaceRegion, StaticFaceDetector, OUTLINE_COLOR};
    use crate::capture::mock::{MockDevices, MockElement, PlayBehavior};
    use crate::capture::FacingMode;
    use crate::render::{decode_payload, RecordingDisplay, JPEG_DATA_URL_PREFIX};
    use crate::transport::{MemoryTransport, TransportError};
    use std::time::Duration;

    struct Harness {
        devices: MockDevices,
        element: MockElement,
        transport: MemoryTransport,
        display: RecordingDisplay,
    }

    impl Harness {
        fn new(devices: MockDevices, element: MockElement) -> Self {
            Self {
                devices,
                element,
                transport: MemoryTransport::new(),
                display: RecordingDisplay::new(),
            }
        }

        fn controller(&self, capture: CaptureConfig) -> CaptureController {
            let config = FileConfig {
                capture,
                ..Default::default()
            };
            CaptureController::new(
                &config,
                CaptureHost {
                    devices: Box::new(self.devices.clone()),
                    element: Box::new(self.element.clone()),
                    transport: Arc::new(self.transport.clone()),
                    display: Box::new(self.display.clone()),
                },
            )
            .unwrap()
        }
    }

    fn selfie_config() -> CaptureConfig {
        CaptureConfig::new(FacingMode::User, 640, 480).with_flip(true)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let harness = Harness::new(MockDevices::new(), MockElement::new());
        let config = FileConfig {
            capture: CaptureConfig::new(FacingMode::User, 0, 480),
            ..Default::default()
        };
        let result = CaptureController::new(
            &config,
            CaptureHost {
                devices: Box::new(harness.devices.clone()),
                element: Box::new(harness.element.clone()),
                transport: Arc::new(harness.transport.clone()),
                display: Box::new(harness.display.clone()),
            },
        );
        assert!(matches!(result, Err(ConfigError::InvalidDimensions)));
    }

    #[tokio::test]
    async fn test_selfie_scenario() {
        let harness = Harness::new(
            MockDevices::new().with_native_resolution(1280, 720),
            MockElement::new(),
        );
        let mut controller = harness.controller(selfie_config());

        controller.enable().await.unwrap();
        assert_eq!(controller.stream_state(), StreamState::Ready);

        controller.grab_frame().await.unwrap();
        assert_eq!(controller.frame().dimensions(), (1280, 720));

        let unmirrored = controller.frame().image().clone();
        let preview = controller.render_preview(1.0).unwrap();
        assert_eq!(preview.dimensions(), (1280, 720));
        assert_eq!(preview.get_pixel(0, 10), unmirrored.get_pixel(1279, 10));

        let data_url = controller.show_image(1.0).unwrap();
        assert!(data_url.starts_with(JPEG_DATA_URL_PREFIX));
        assert_eq!(harness.display.last_image(), Some(data_url.clone()));

        let decoded = image::load_from_memory(&decode_payload(&data_url).unwrap())
            .unwrap()
            .to_rgb8();
        assert_eq!(decoded.dimensions(), (1280, 720));
        // Gradient runs dark to bright left to right; mirrored it reverses.
        assert!(decoded.get_pixel(5, 360).0[0] > decoded.get_pixel(1274, 360).0[0]);
    }

    #[tokio::test]
    async fn test_half_scale_preview_is_mirror_of_unmirrored() {
        let harness = Harness::new(MockDevices::new(), MockElement::new());
        let mut controller = harness.controller(selfie_config());

        controller.enable().await.unwrap();
        controller.grab_frame().await.unwrap();

        let mirrored = controller.render_preview(0.5).unwrap();
        let unmirrored = Renderer::new(false, 90)
            .render(controller.frame().image(), 0.5)
            .unwrap();

        assert_eq!(mirrored.dimensions(), (320, 240));
        for y in (0..240).step_by(7) {
            for x in 0..320 {
                assert_eq!(mirrored.get_pixel(x, y), unmirrored.get_pixel(319 - x, y));
            }
        }
    }

    #[tokio::test]
    async fn test_failed_draw_keeps_previous_frame() {
        let harness = Harness::new(MockDevices::new(), MockElement::new());
        let mut controller = harness.controller(selfie_config());

        controller.enable().await.unwrap();
        controller.grab_frame().await.unwrap();
        let before = controller.frame().image().clone();
        assert_ne!(*before.get_pixel(320, 240), image::Rgb([0, 0, 0]));

        harness.element.set_fail_draws(true);
        let err = controller.grab_frame().await.unwrap_err();
        assert_eq!(err.kind(), "FrameUnavailable");

        assert!(controller.frame().is_set());
        assert_eq!(controller.frame().sequence(), 1);
        assert_eq!(controller.frame().image(), &before);

        harness.element.set_fail_draws(false);
        controller.grab_frame().await.unwrap();
        assert_eq!(controller.frame().sequence(), 2);
    }

    #[tokio::test]
    async fn test_oversized_preview_is_rejected() {
        let harness = Harness::new(MockDevices::new(), MockElement::new());
        let mut controller = harness.controller(selfie_config());

        controller.enable().await.unwrap();
        controller.grab_frame().await.unwrap();

        let err = controller.render_preview(1.0e6).unwrap_err();
        assert_eq!(err.kind(), "RenderFailure");
        assert!(controller.show_image(1.0e6).is_err());
        assert!(harness.display.last_image().is_none());

        // Still usable afterwards.
        assert_eq!(controller.render_preview(0.5).unwrap().dimensions(), (320, 240));
    }

    #[tokio::test]
    async fn test_muted_track_restarts_exactly_once() {
        let harness = Harness::new(
            MockDevices::new().with_native_resolution(800, 600),
            MockElement::new(),
        );
        let mut controller = harness.controller(selfie_config());

        controller.enable().await.unwrap();
        controller.grab_frame().await.unwrap();
        assert_eq!(controller.frame().generation(), 1);

        let stalled = harness.devices.latest_track().unwrap();
        stalled.set_muted(true);

        controller.grab_frame().await.unwrap();

        assert!(stalled.is_stopped());
        assert_eq!(harness.devices.acquisitions(), 2);
        assert_eq!(harness.devices.live_tracks(), 1);
        assert_eq!(harness.element.sources_bound(), 2);
        assert_eq!(controller.frame().generation(), 2);
        assert_eq!(controller.frame().dimensions(), (800, 600));
        assert_eq!(controller.stats().stall_restarts, 1);

        // Healthy track: no further restarts.
        controller.grab_frame().await.unwrap();
        assert_eq!(harness.devices.acquisitions(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_restart_surfaces_once() {
        let harness = Harness::new(MockDevices::new(), MockElement::new());
        let mut controller = harness.controller(selfie_config());

        controller.enable().await.unwrap();
        harness.devices.latest_track().unwrap().set_muted(true);
        harness.element.set_behavior(PlayBehavior::Never);

        let err = controller.grab_frame().await.unwrap_err();
        assert!(matches!(err, CaptureError::StreamStartTimeout(_)));
        assert_eq!(harness.devices.acquisitions(), 2);
        assert_eq!(controller.stream_state(), StreamState::Idle);
        assert!(!controller.frame().is_set());

        // Without a stream the next grab fails fast.
        assert!(matches!(
            controller.grab_frame().await,
            Err(CaptureError::StreamInactive)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_timeout_leaves_no_state() {
        let harness = Harness::new(
            MockDevices::new(),
            MockElement::new().with_behavior(PlayBehavior::Delayed(Duration::from_millis(5001))),
        );
        let mut controller = harness.controller(selfie_config());

        let err = controller.enable().await.unwrap_err();
        assert_eq!(err.kind(), "StreamStartTimeout");
        assert_eq!(controller.stream_state(), StreamState::Idle);
        assert_eq!(harness.devices.live_tracks(), 0);
        assert_eq!(controller.stats().start_timeouts, 1);
    }

    #[tokio::test]
    async fn test_disable_twice() {
        let harness = Harness::new(MockDevices::new(), MockElement::new());
        let mut controller = harness.controller(selfie_config());

        controller.enable().await.unwrap();
        controller.disable();
        assert_eq!(controller.stream_state(), StreamState::Idle);
        controller.disable();
        assert_eq!(controller.stream_state(), StreamState::Idle);
    }

    #[tokio::test]
    async fn test_analysis_before_grab_fails() {
        let harness = Harness::new(MockDevices::new(), MockElement::new());
        let mut controller = harness
            .controller(selfie_config())
            .with_face_detector(Box::new(StaticFaceDetector::new(Vec::new())));

        assert!(matches!(
            controller.detect_faces().await,
            Err(CaptureError::FrameBufferUnset)
        ));
        assert!(matches!(
            controller.scan_qr_code().await,
            Err(CaptureError::FrameBufferUnset)
        ));
        assert!(matches!(
            controller.show_image(1.0),
            Err(CaptureError::FrameBufferUnset)
        ));
    }

    #[tokio::test]
    async fn test_detect_faces_outlines_frame() {
        let harness = Harness::new(MockDevices::new(), MockElement::new());
        let mut controller = harness
            .controller(selfie_config())
            .with_face_detector(Box::new(StaticFaceDetector::new(vec![FaceRegion::new(
                100.0, 80.0, 120.0, 160.0,
            )])));

        controller.enable().await.unwrap();
        controller.grab_frame().await.unwrap();
        let before = controller.frame().image().clone();

        assert!(controller.detect_faces().await.unwrap());
        let after = controller.frame().image();
        assert_eq!(*after.get_pixel(100, 150), OUTLINE_COLOR);
        assert_eq!(after.get_pixel(160, 160), before.get_pixel(160, 160));

        let changed = after
            .enumerate_pixels()
            .filter(|(x, y, p)| *p != before.get_pixel(*x, *y))
            .count();
        // 124x164 outer box minus 116x156 interior.
        assert_eq!(changed, 124 * 164 - 116 * 156);
    }

    #[tokio::test]
    async fn test_detect_faces_without_face_keeps_frame() {
        let harness = Harness::new(MockDevices::new(), MockElement::new());
        let mut controller = harness
            .controller(selfie_config())
            .with_face_detector(Box::new(StaticFaceDetector::new(Vec::new())));

        controller.enable().await.unwrap();
        controller.grab_frame().await.unwrap();
        let before = controller.frame().image().clone();

        assert!(!controller.detect_faces().await.unwrap());
        assert_eq!(controller.frame().image(), &before);
    }

    #[tokio::test]
    async fn test_detection_unavailable_propagates() {
        let harness = Harness::new(MockDevices::new(), MockElement::new());
        let mut controller = harness
            .controller(selfie_config())
            .with_face_detector(Box::new(StaticFaceDetector::unavailable()));

        controller.enable().await.unwrap();
        controller.grab_frame().await.unwrap();

        let err = controller.detect_faces().await.unwrap_err();
        assert_eq!(err.kind(), "DetectionUnavailable");
    }

    #[cfg(feature = "qr")]
    #[tokio::test]
    async fn test_scan_qr_code_from_camera() {
        let scene = crate::analysis::fixtures::qr_image("DUT-SERIAL-0042", 8);
        let (width, height) = scene.dimensions();
        let harness = Harness::new(
            MockDevices::new().with_native_resolution(width, height),
            MockElement::new().with_scene(scene),
        );
        let mut controller = harness.controller(selfie_config());

        controller.enable().await.unwrap();
        controller.grab_frame().await.unwrap();

        assert_eq!(
            controller.scan_qr_code().await.unwrap().as_deref(),
            Some("DUT-SERIAL-0042")
        );
        assert_eq!(controller.stats().qr_codes_decoded, 1);
    }

    #[cfg(feature = "qr")]
    #[tokio::test]
    async fn test_scan_qr_code_absent() {
        let harness = Harness::new(MockDevices::new(), MockElement::new());
        let mut controller = harness.controller(selfie_config());

        controller.enable().await.unwrap();
        controller.grab_frame().await.unwrap();

        assert_eq!(controller.scan_qr_code().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_transmit_uploads_unprefixed_payload() {
        let harness = Harness::new(
            MockDevices::new().with_native_resolution(320, 240),
            MockElement::new(),
        );
        let mut controller = harness.controller(selfie_config());

        controller.enable().await.unwrap();
        let path = controller.grab_frame_and_transmit_back().await.unwrap();

        assert_eq!(path, "/tmp/upload-1");
        let uploads = harness.transport.uploads();
        assert_eq!(uploads.len(), 1);
        assert!(!uploads[0].starts_with("data:"));

        let decoded = image::load_from_memory(&decode_payload(&uploads[0]).unwrap())
            .unwrap()
            .to_rgb8();
        assert_eq!(decoded.dimensions(), (320, 240));
        assert_eq!(controller.stats().uploads, 1);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let harness = Harness::new(MockDevices::new(), MockElement::new());
        let mut controller = harness.controller(selfie_config());
        harness.transport.set_fail_uploads(true);

        controller.enable().await.unwrap();
        let err = controller.grab_frame_and_transmit_back().await.unwrap_err();

        assert!(matches!(
            err,
            CaptureError::Transport(TransportError::Rejected(_))
        ));
        assert_eq!(err.kind(), "TransportFailure");
        // The grab itself succeeded.
        assert!(controller.frame().is_set());
    }

    #[tokio::test]
    async fn test_stats_snapshot() {
        let harness = Harness::new(MockDevices::new(), MockElement::new());
        let mut controller = harness.controller(selfie_config());

        controller.enable().await.unwrap();
        controller.grab_frame().await.unwrap();
        controller.grab_frame().await.unwrap();

        let stats = controller.stats();
        assert_eq!(stats.stream_state, StreamState::Ready);
        assert_eq!(stats.stream_starts, 1);
        assert_eq!(stats.frames_grabbed, 2);
        assert_eq!((stats.frame_width, stats.frame_height), (640, 480));
    }
}
