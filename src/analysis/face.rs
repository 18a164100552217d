//! Face-region detection and outline overlay.

use super::DetectionError;
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use serde::Serialize;

/// Stroke width of the outline drawn around detected faces.
pub const OUTLINE_WIDTH: f64 = 4.0;

/// Stroke colour of the outline drawn around detected faces.
pub const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Bounding box of a detected face, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaceRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FaceRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Options passed to a [`FaceDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceDetectorOptions {
    /// Upper bound on the number of regions returned.
    pub max_detected_faces: usize,
}

impl Default for FaceDetectorOptions {
    fn default() -> Self {
        Self {
            max_detected_faces: 1,
        }
    }
}

/// Pluggable face detection capability.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Detects up to `options.max_detected_faces` faces in `image`.
    async fn detect(
        &self,
        image: &RgbImage,
        options: &FaceDetectorOptions,
    ) -> Result<Vec<FaceRegion>, DetectionError>;
}

/// Strokes the outline of `region` into `image`.
///
/// The stroke is centred on the region's edge, like a canvas
/// `rect` + `stroke`; pixels are painted when their centre falls inside
/// the stroke. Parts outside the image are clipped.
pub fn draw_outline(image: &mut RgbImage, region: &FaceRegion, line_width: f64, color: Rgb<u8>) {
    let half = line_width / 2.0;
    let (left, top) = (region.x - half, region.y - half);
    let (right, bottom) = (region.x + region.width + half, region.y + region.height + half);
    let (inner_left, inner_top) = (region.x + half, region.y + half);
    let (inner_right, inner_bottom) = (
        region.x + region.width - half,
        region.y + region.height - half,
    );

    let clamp_x = |v: f64| v.floor().clamp(0.0, image.width() as f64) as u32;
    let clamp_y = |v: f64| v.floor().clamp(0.0, image.height() as f64) as u32;
    let (x0, x1) = (clamp_x(left), clamp_x(right + 1.0));
    let (y0, y1) = (clamp_y(top), clamp_y(bottom + 1.0));

    for py in y0..y1 {
        let cy = py as f64 + 0.5;
        if cy < top || cy >= bottom {
            continue;
        }
        for px in x0..x1 {
            let cx = px as f64 + 0.5;
            if cx < left || cx >= right {
                continue;
            }
            let inside =
                cx >= inner_left && cx < inner_right && cy >= inner_top && cy < inner_bottom;
            if !inside {
                image.put_pixel(px, py, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_pixels(image: &RgbImage) -> usize {
        image.pixels().filter(|p| **p == OUTLINE_COLOR).count()
    }

    #[test]
    fn test_outline_is_centred_on_edge() {
        let mut image = RgbImage::new(100, 100);
        draw_outline(
            &mut image,
            &FaceRegion::new(20.0, 20.0, 40.0, 40.0),
            OUTLINE_WIDTH,
            OUTLINE_COLOR,
        );

        assert_eq!(*image.get_pixel(18, 30), OUTLINE_COLOR);
        assert_eq!(*image.get_pixel(21, 30), OUTLINE_COLOR);
        assert_eq!(*image.get_pixel(17, 30), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(22, 30), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(40, 40), Rgb([0, 0, 0]));

        // 44x44 outer box minus 36x36 interior.
        assert_eq!(white_pixels(&image), 44 * 44 - 36 * 36);
    }

    #[test]
    fn test_outline_clipped_at_border() {
        let mut image = RgbImage::new(10, 10);
        draw_outline(
            &mut image,
            &FaceRegion::new(-5.0, -5.0, 8.0, 8.0),
            OUTLINE_WIDTH,
            OUTLINE_COLOR,
        );

        assert_eq!(*image.get_pixel(0, 1), OUTLINE_COLOR);
        assert_eq!(*image.get_pixel(5, 5), Rgb([0, 0, 0]));
    }
}
