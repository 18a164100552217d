//! Preview rendering and encoding.
//!
//! Previews are scaled copies of the current frame, mirrored when the
//! capture is configured to flip, encoded as base64 JPEG data URLs and
//! handed to a [`DisplaySink`].

mod display;
mod encode;
mod scale;

pub use display::{DisplayLog, DisplaySink, FileDisplay, RecordingDisplay};
pub use encode::{
    decode_payload, encode_data_url, encode_jpeg, strip_data_url_prefix, JPEG_DATA_URL_PREFIX,
};
pub use scale::{draw_scaled, scaled_dimensions, MAX_OUTPUT_PIXELS};

use image::RgbImage;
use thiserror::Error;

/// Errors raised while rendering or encoding previews.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("scale ratio must be positive and finite, got {0}")]
    InvalidRatio(f64),
    #[error("scaled image would be {width}x{height}")]
    EmptyOutput { width: u32, height: u32 },
    #[error("scaled image would be {width}x{height}, above the {max}-pixel limit")]
    TooLarge { width: f64, height: f64, max: u64 },
    #[error("jpeg encoding failed: {0}")]
    Encode(String),
    #[error("base64 payload could not be decoded: {0}")]
    Decode(String),
}

/// Renders scaled, optionally mirrored previews.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    mirror: bool,
    jpeg_quality: u8,
}

impl Renderer {
    pub fn new(mirror: bool, jpeg_quality: u8) -> Self {
        Self {
            mirror,
            jpeg_quality,
        }
    }

    /// Whether previews are mirrored.
    pub fn mirror(&self) -> bool {
        self.mirror
    }

    /// Draws the preview image for `frame` at `ratio`.
    pub fn render(&self, frame: &RgbImage, ratio: f64) -> Result<RgbImage, RenderError> {
        draw_scaled(frame, ratio, self.mirror)
    }

    /// Renders and encodes the preview as a data URL.
    pub fn render_data_url(&self, frame: &RgbImage, ratio: f64) -> Result<String, RenderError> {
        encode_data_url(&self.render(frame, ratio)?, self.jpeg_quality)
    }

    /// Encodes `frame` at full resolution, unscaled and unmirrored, as a
    /// raw base64 payload ready for transport.
    pub fn transport_payload(&self, frame: &RgbImage) -> Result<String, RenderError> {
        let url = encode_data_url(frame, self.jpeg_quality)?;
        Ok(strip_data_url_prefix(&url).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_transport_payload_is_full_resolution() {
        let renderer = Renderer::new(true, 90);
        let frame = RgbImage::from_fn(40, 30, |x, _| Rgb([(x * 6) as u8, 0, 0]));

        let payload = renderer.transport_payload(&frame).unwrap();
        assert!(!payload.starts_with(JPEG_DATA_URL_PREFIX));

        let decoded = image::load_from_memory(&decode_payload(&payload).unwrap())
            .unwrap()
            .to_rgb8();
        assert_eq!(decoded.dimensions(), (40, 30));
        // Unmirrored: the dark column stays on the left.
        assert!(decoded.get_pixel(0, 15).0[0] < decoded.get_pixel(39, 15).0[0]);
    }

    #[test]
    fn test_render_respects_mirror_flag() {
        let frame = RgbImage::from_fn(10, 4, |x, _| Rgb([x as u8, 0, 0]));

        let plain = Renderer::new(false, 90).render(&frame, 1.0).unwrap();
        let mirrored = Renderer::new(true, 90).render(&frame, 1.0).unwrap();

        assert_eq!(plain.get_pixel(0, 0).0[0], 0);
        assert_eq!(mirrored.get_pixel(0, 0).0[0], 9);
    }
}
