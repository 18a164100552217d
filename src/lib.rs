//! Camera Capture Library
//!
//! A capture controller that acquires a live camera stream, grabs still
//! frames on demand, runs face and QR analysis on them and renders
//! scaled, optionally mirrored, JPEG previews for display or upload.
//!
//! # Architecture
//!
//! ```text
//! capture (StreamManager) → grab_frame → FrameBuffer
//!                                          ↓        ↓
//!                                     analysis    render
//!                                                   ↓
//!                                   transport / display sink
//! ```
//!
//! # Design Principles
//!
//! - **Bounded startup**: the wait for playback is capped (5 s by default)
//! - **Self-healing grabs**: a muted track is restarted once per grab
//! - **No silent misses**: a missing detector is an error, not "not found"
//! - **Explicit wiring**: platform seams are traits passed in at construction
//!
//! # Example
//!
//! ```no_run
//! use camera_capture::{
//!     capture::mock::{MockDevices, MockElement},
//!     render::RecordingDisplay,
//!     transport::MemoryTransport,
//!     CaptureController, CaptureHost, FileConfig,
//! };
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut controller = CaptureController::new(
//!     &FileConfig::default(),
//!     CaptureHost {
//!         devices: Box::new(MockDevices::new()),
//!         element: Box::new(MockElement::new()),
//!         transport: Arc::new(MemoryTransport::new()),
//!         display: Box::new(RecordingDisplay::new()),
//!     },
//! )?;
//!
//! controller.enable().await?;
//! controller.grab_frame().await?;
//! let qr = controller.scan_qr_code().await?;
//! let preview = controller.show_image(0.5)?;
//! controller.disable();
//! # let _ = (qr, preview);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod capture;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod render;
pub mod transport;

// Re-export commonly used types at crate root
pub use analysis::{Analyzer, BarcodeDetector, DetectionError, FaceDetector, FaceRegion};
pub use capture::{CaptureConfig, FacingMode, FileConfig, FrameBuffer, StreamState};
pub use controller::{CaptureController, CaptureHost, Command};
pub use error::CaptureError;
pub use render::{DisplaySink, Renderer};
pub use transport::{EventPayload, Transport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
