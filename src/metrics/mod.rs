//! Prometheus metrics exporter for capture monitoring.
//!
//! # Metrics Exposed
//!
//! ## Stream Metrics
//! - `camera_capture_stream_ready` - Whether a live stream is ready (1/0)
//! - `camera_capture_stream_starts_total` - Successful stream starts
//! - `camera_capture_start_timeouts_total` - Starts that timed out
//! - `camera_capture_stall_restarts_total` - Restarts caused by a muted track
//!
//! ## Frame Metrics
//! - `camera_capture_frames_grabbed_total` - Frames grabbed
//! - `camera_capture_frame_width` / `camera_capture_frame_height` - Current buffer size
//!
//! ## Analysis Metrics
//! - `camera_capture_faces_detected_total` - Faces outlined
//! - `camera_capture_qr_codes_decoded_total` - QR payloads decoded
//! - `camera_capture_uploads_total` - Frames uploaded
//!
//! # Example
//!
//! ```no_run
//! use camera_capture::metrics::{CaptureStats, MetricsRegistry};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! registry.update(&CaptureStats {
//!     frames_grabbed: 12,
//!     ..Default::default()
//! });
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{CaptureStats, MetricsError, MetricsRegistry};
#[cfg(feature = "metrics")]
pub use server::{
    router, MetricsServer, MetricsServerConfig, MetricsState, ServerError, SharedMetrics,
};
