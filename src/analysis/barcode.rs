//! Barcode / QR decoding.

use super::DetectionError;
use async_trait::async_trait;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Barcode symbologies a detector may be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    QrCode,
    DataMatrix,
    Aztec,
    Code128,
    Ean13,
}

/// A decoded barcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedBarcode {
    /// Symbology of the decoded code.
    pub format: BarcodeFormat,
    /// Decoded payload.
    pub raw_value: String,
}

/// Pluggable barcode decoding capability.
#[async_trait]
pub trait BarcodeDetector: Send + Sync {
    /// Decodes every code of one of `formats` found in `image`.
    async fn detect(
        &self,
        image: &RgbImage,
        formats: &[BarcodeFormat],
    ) -> Result<Vec<DetectedBarcode>, DetectionError>;
}

/// QR decoder backed by `rqrr`.
#[cfg(feature = "qr")]
#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrBarcodeDetector;

#[cfg(feature = "qr")]
impl RqrrBarcodeDetector {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "qr")]
#[async_trait]
impl BarcodeDetector for RqrrBarcodeDetector {
    async fn detect(
        &self,
        image: &RgbImage,
        formats: &[BarcodeFormat],
    ) -> Result<Vec<DetectedBarcode>, DetectionError> {
        if !formats.contains(&BarcodeFormat::QrCode) {
            return Ok(Vec::new());
        }

        let (width, height) = image.dimensions();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            width as usize,
            height as usize,
            |x, y| luma(image.get_pixel(x as u32, y as u32).0),
        );

        let grids = prepared.detect_grids();
        tracing::debug!(grids = grids.len(), "QR grid candidates");

        let mut codes = Vec::new();
        for grid in grids {
            match grid.decode() {
                Ok((_, content)) => codes.push(DetectedBarcode {
                    format: BarcodeFormat::QrCode,
                    raw_value: content,
                }),
                Err(e) => tracing::debug!("QR grid decode failed: {:?}", e),
            }
        }
        Ok(codes)
    }
}

/// ITU-R BT.601 luma of an RGB pixel.
#[cfg(feature = "qr")]
fn luma([r, g, b]: [u8; 3]) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

#[cfg(all(test, feature = "qr"))]
pub(crate) mod fixtures {
    use image::{Rgb, RgbImage};

    /// Renders `payload` as a QR code with a four-module quiet zone.
    pub(crate) fn qr_image(payload: &str, module_px: u32) -> RgbImage {
        let code = qrcode::QrCode::new(payload.as_bytes()).unwrap();
        let modules = code.width() as u32;
        let colors = code.to_colors();
        let quiet = 4;
        let side = (modules + 2 * quiet) * module_px;

        RgbImage::from_fn(side, side, |x, y| {
            let (mx, my) = (x / module_px, y / module_px);
            let dark = mx >= quiet
                && my >= quiet
                && mx < quiet + modules
                && my < quiet + modules
                && colors[((my - quiet) * modules + (mx - quiet)) as usize]
                    == qrcode::Color::Dark;
            if dark {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }
}
