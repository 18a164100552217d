//! JPEG encoding and data-URL handling.

use super::RenderError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

/// Prefix of every data URL produced by [`encode_data_url`].
pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Encodes `image` as JPEG bytes.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(image)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Encodes `image` as a `data:image/jpeg;base64,...` URL.
pub fn encode_data_url(image: &RgbImage, quality: u8) -> Result<String, RenderError> {
    let bytes = encode_jpeg(image, quality)?;
    Ok(format!("{}{}", JPEG_DATA_URL_PREFIX, STANDARD.encode(bytes)))
}

/// Returns the base64 payload of a JPEG data URL.
///
/// Strings without the prefix are returned unchanged.
pub fn strip_data_url_prefix(data_url: &str) -> &str {
    data_url
        .strip_prefix(JPEG_DATA_URL_PREFIX)
        .unwrap_or(data_url)
}

/// Decodes a base64 payload (with or without data-URL prefix) to bytes.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, RenderError> {
    STANDARD
        .decode(strip_data_url_prefix(payload))
        .map_err(|e| RenderError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_data_url_shape() {
        let image = RgbImage::from_pixel(16, 8, Rgb([10, 200, 30]));
        let url = encode_data_url(&image, 90).unwrap();

        assert!(url.starts_with(JPEG_DATA_URL_PREFIX));
        let payload = strip_data_url_prefix(&url);
        assert!(!payload.starts_with("data:"));
        assert!(!payload.contains(','));

        let bytes = decode_payload(payload).unwrap();
        // JPEG SOI marker.
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Jpeg)
            .unwrap()
            .to_rgb8();
        assert_eq!(decoded.dimensions(), (16, 8));
    }

    #[test]
    fn test_strip_without_prefix_is_noop() {
        assert_eq!(strip_data_url_prefix("QUJD"), "QUJD");
        assert_eq!(
            strip_data_url_prefix("data:image/png;base64,QUJD"),
            "data:image/png;base64,QUJD"
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_payload("not base64!"),
            Err(RenderError::Decode(_))
        ));
    }
}
