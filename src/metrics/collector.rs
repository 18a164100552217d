//! Metrics collection and registry.

use crate::capture::StreamState;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of controller state for metrics update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureStats {
    /// Current stream state.
    pub stream_state: StreamState,
    /// Successful stream starts.
    pub stream_starts: u64,
    /// Readiness waits that timed out.
    pub start_timeouts: u64,
    /// Restarts triggered by a muted track.
    pub stall_restarts: u64,
    /// Successful grabs.
    pub frames_grabbed: u64,
    /// Faces outlined.
    pub faces_detected: u64,
    /// QR payloads decoded.
    pub qr_codes_decoded: u64,
    /// Frames uploaded through the transport.
    pub uploads: u64,
    /// Width of the current frame buffer.
    pub frame_width: u32,
    /// Height of the current frame buffer.
    pub frame_height: u32,
}

impl Default for CaptureStats {
    fn default() -> Self {
        Self {
            stream_state: StreamState::Idle,
            stream_starts: 0,
            start_timeouts: 0,
            stall_restarts: 0,
            frames_grabbed: 0,
            faces_detected: 0,
            qr_codes_decoded: 0,
            uploads: 0,
            frame_width: 0,
            frame_height: 0,
        }
    }
}

/// Prometheus metrics registry for capture monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // Stream metrics
    stream_ready: IntGauge,
    stream_starts: IntCounter,
    start_timeouts: IntCounter,
    stall_restarts: IntCounter,

    // Frame metrics
    frames_grabbed: IntCounter,
    frame_width: IntGauge,
    frame_height: IntGauge,

    // Analysis and upload metrics
    faces_detected: IntCounter,
    qr_codes_decoded: IntCounter,
    uploads: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all capture metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let stream_ready = IntGauge::new(
            "camera_capture_stream_ready",
            "Whether a live stream is ready (1=ready, 0=not ready)",
        )?;
        let stream_starts = IntCounter::new(
            "camera_capture_stream_starts_total",
            "Total successful stream starts",
        )?;
        let start_timeouts = IntCounter::new(
            "camera_capture_start_timeouts_total",
            "Total stream starts that timed out waiting for playback",
        )?;
        let stall_restarts = IntCounter::new(
            "camera_capture_stall_restarts_total",
            "Total stream restarts caused by a muted track",
        )?;

        let frames_grabbed = IntCounter::new(
            "camera_capture_frames_grabbed_total",
            "Total frames grabbed into the frame buffer",
        )?;
        let frame_width = IntGauge::new(
            "camera_capture_frame_width",
            "Width of the current frame buffer in pixels",
        )?;
        let frame_height = IntGauge::new(
            "camera_capture_frame_height",
            "Height of the current frame buffer in pixels",
        )?;

        let faces_detected = IntCounter::new(
            "camera_capture_faces_detected_total",
            "Total faces outlined",
        )?;
        let qr_codes_decoded = IntCounter::new(
            "camera_capture_qr_codes_decoded_total",
            "Total QR payloads decoded",
        )?;
        let uploads = IntCounter::new(
            "camera_capture_uploads_total",
            "Total frames uploaded to the collector",
        )?;

        registry.register(Box::new(stream_ready.clone()))?;
        registry.register(Box::new(stream_starts.clone()))?;
        registry.register(Box::new(start_timeouts.clone()))?;
        registry.register(Box::new(stall_restarts.clone()))?;
        registry.register(Box::new(frames_grabbed.clone()))?;
        registry.register(Box::new(frame_width.clone()))?;
        registry.register(Box::new(frame_height.clone()))?;
        registry.register(Box::new(faces_detected.clone()))?;
        registry.register(Box::new(qr_codes_decoded.clone()))?;
        registry.register(Box::new(uploads.clone()))?;

        Ok(Self {
            registry,
            stream_ready,
            stream_starts,
            start_timeouts,
            stall_restarts,
            frames_grabbed,
            frame_width,
            frame_height,
            faces_detected,
            qr_codes_decoded,
            uploads,
        })
    }

    /// Updates all metrics from a snapshot of controller state.
    pub fn update(&self, stats: &CaptureStats) {
        self.stream_ready
            .set(if stats.stream_state == StreamState::Ready { 1 } else { 0 });
        self.frame_width.set(stats.frame_width as i64);
        self.frame_height.set(stats.frame_height as i64);

        // Counters only move forward by the difference
        advance(&self.stream_starts, stats.stream_starts);
        advance(&self.start_timeouts, stats.start_timeouts);
        advance(&self.stall_restarts, stats.stall_restarts);
        advance(&self.frames_grabbed, stats.frames_grabbed);
        advance(&self.faces_detected, stats.faces_detected);
        advance(&self.qr_codes_decoded, stats.qr_codes_decoded);
        advance(&self.uploads, stats.uploads);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}
