//! Fixed-answer detectors.
//!
//! Used by tests and by the demo binary, where no real face model is
//! available.

use super::{
    BarcodeDetector, BarcodeFormat, DetectedBarcode, DetectionError, FaceDetector,
    FaceDetectorOptions, FaceRegion,
};
use async_trait::async_trait;
use image::RgbImage;

/// Face detector that reports the same regions for every image.
#[derive(Debug, Clone, Default)]
pub struct StaticFaceDetector {
    regions: Vec<FaceRegion>,
    unavailable: bool,
}

impl StaticFaceDetector {
    pub fn new(regions: Vec<FaceRegion>) -> Self {
        Self {
            regions,
            unavailable: false,
        }
    }

    /// A detector that fails every call with
    /// [`DetectionError::Unavailable`].
    pub fn unavailable() -> Self {
        Self {
            regions: Vec::new(),
            unavailable: true,
        }
    }
}

#[async_trait]
impl FaceDetector for StaticFaceDetector {
    async fn detect(
        &self,
        image: &RgbImage,
        options: &FaceDetectorOptions,
    ) -> Result<Vec<FaceRegion>, DetectionError> {
        if self.unavailable {
            return Err(DetectionError::Unavailable(
                "face detection is not supported on this host".to_string(),
            ));
        }
        let (width, height) = image.dimensions();
        Ok(self
            .regions
            .iter()
            .filter(|r| r.x < width as f64 && r.y < height as f64)
            .take(options.max_detected_faces)
            .copied()
            .collect())
    }
}

/// Barcode detector that reports the same payloads for every image.
#[derive(Debug, Clone, Default)]
pub struct StaticBarcodeDetector {
    codes: Vec<DetectedBarcode>,
}

impl StaticBarcodeDetector {
    /// Reports each value as a QR code.
    pub fn qr(values: &[&str]) -> Self {
        Self {
            codes: values
                .iter()
                .map(|v| DetectedBarcode {
                    format: BarcodeFormat::QrCode,
                    raw_value: (*v).to_string(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl BarcodeDetector for StaticBarcodeDetector {
    async fn detect(
        &self,
        _image: &RgbImage,
        formats: &[BarcodeFormat],
    ) -> Result<Vec<DetectedBarcode>, DetectionError> {
        Ok(self
            .codes
            .iter()
            .filter(|c| formats.contains(&c.format))
            .cloned()
            .collect())
    }
}
