//! Visual analysis of grabbed frames.
//!
//! Face-region detection and QR decoding run against the current
//! [`FrameBuffer`]. Detection capabilities are optional at runtime; a
//! missing or failing capability is an error, never "nothing found".

mod barcode;
mod face;
mod stub;

#[cfg(all(test, feature = "qr"))]
pub(crate) use barcode::fixtures;
#[cfg(feature = "qr")]
pub use barcode::RqrrBarcodeDetector;
pub use barcode::{BarcodeDetector, BarcodeFormat, DetectedBarcode};
pub use face::{
    draw_outline, FaceDetector, FaceDetectorOptions, FaceRegion, OUTLINE_COLOR, OUTLINE_WIDTH,
};
pub use stub::{StaticBarcodeDetector, StaticFaceDetector};

use crate::capture::FrameBuffer;
use thiserror::Error;
use tracing::debug;

/// Errors raised by detection capabilities.
#[derive(Debug, Clone, Error)]
pub enum DetectionError {
    #[error("detector unavailable: {0}")]
    Unavailable(String),
    #[error("detection failed: {0}")]
    Failed(String),
}

/// Runs face and QR detection against frames.
pub struct Analyzer {
    faces: Option<Box<dyn FaceDetector>>,
    barcodes: Option<Box<dyn BarcodeDetector>>,
    face_options: FaceDetectorOptions,
    faces_detected: u64,
    codes_decoded: u64,
}

impl Analyzer {
    /// Creates an analyzer with the default capabilities: no face
    /// detector, and the `rqrr` QR decoder when the `qr` feature is on.
    pub fn new() -> Self {
        #[cfg(feature = "qr")]
        let barcodes: Option<Box<dyn BarcodeDetector>> = Some(Box::new(RqrrBarcodeDetector::new()));
        #[cfg(not(feature = "qr"))]
        let barcodes: Option<Box<dyn BarcodeDetector>> = None;

        Self {
            faces: None,
            barcodes,
            face_options: FaceDetectorOptions::default(),
            faces_detected: 0,
            codes_decoded: 0,
        }
    }

    /// Installs a face detection capability.
    pub fn with_face_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.faces = Some(detector);
        self
    }

    /// Installs a barcode detection capability.
    pub fn with_barcode_detector(mut self, detector: Box<dyn BarcodeDetector>) -> Self {
        self.barcodes = Some(detector);
        self
    }

    /// Removes the barcode detection capability.
    pub fn without_barcode_detector(mut self) -> Self {
        self.barcodes = None;
        self
    }

    /// Detects a face in `frame`, outlining it in place when found.
    ///
    /// Returns whether a face was found. `frame` is left untouched when
    /// none is.
    pub async fn detect_faces(
        &mut self,
        frame: &mut FrameBuffer,
    ) -> Result<bool, DetectionError> {
        let detector = self
            .faces
            .as_deref()
            .ok_or_else(|| DetectionError::Unavailable("no face detector installed".to_string()))?;

        let mut faces = detector.detect(frame.image(), &self.face_options).await?;
        faces.truncate(self.face_options.max_detected_faces);
        debug!(faces = faces.len(), sequence = frame.sequence(), "Face detection");

        if faces.is_empty() {
            return Ok(false);
        }
        for face in &faces {
            draw_outline(frame.image_mut(), face, OUTLINE_WIDTH, OUTLINE_COLOR);
        }
        self.faces_detected += faces.len() as u64;
        Ok(true)
    }

    /// Decodes the first QR code in `frame`.
    pub async fn scan_qr_code(
        &mut self,
        frame: &FrameBuffer,
    ) -> Result<Option<String>, DetectionError> {
        let detector = self
            .barcodes
            .as_deref()
            .ok_or_else(|| {
                DetectionError::Unavailable("no barcode detector installed".to_string())
            })?;

        let codes = detector.detect(frame.image(), &[BarcodeFormat::QrCode]).await?;
        debug!(codes = codes.len(), sequence = frame.sequence(), "QR scan");

        let payload = codes.into_iter().next().map(|c| c.raw_value);
        if payload.is_some() {
            self.codes_decoded += 1;
        }
        Ok(payload)
    }

    /// Total faces outlined so far.
    pub fn faces_detected(&self) -> u64 {
        self.faces_detected
    }

    /// Total QR payloads decoded so far.
    pub fn codes_decoded(&self) -> u64 {
        self.codes_decoded
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}
