//! Scaled, optionally mirrored, copies of a frame.

use super::RenderError;
use image::{Rgb, RgbImage};

/// Upper bound on the pixel count of a scaled image.
pub const MAX_OUTPUT_PIXELS: u64 = 8192 * 8192;

/// Computes the output size for `ratio`, rounding to whole pixels.
///
/// Sizes whose pixel data would exceed [`MAX_OUTPUT_PIXELS`] or the
/// address space are rejected before anything is allocated.
pub fn scaled_dimensions(width: u32, height: u32, ratio: f64) -> Result<(u32, u32), RenderError> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(RenderError::InvalidRatio(ratio));
    }
    let new_width = (width as f64 * ratio).round();
    let new_height = (height as f64 * ratio).round();
    if new_width < 1.0 || new_height < 1.0 {
        return Err(RenderError::EmptyOutput {
            width: new_width as u32,
            height: new_height as u32,
        });
    }

    let too_large = RenderError::TooLarge {
        width: new_width,
        height: new_height,
        max: MAX_OUTPUT_PIXELS,
    };
    if new_width * new_height > MAX_OUTPUT_PIXELS as f64 {
        return Err(too_large);
    }
    let (w, h) = (new_width as u32, new_height as u32);
    (w as usize)
        .checked_mul(h as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or(too_large)?;
    Ok((w, h))
}

/// Draws `source` into a new image scaled by `ratio`.
///
/// Uses bilinear sampling. When `mirror` is set the horizontal draw
/// direction is inverted, so destination column `x` takes the sample of
/// column `width - 1 - x` of the unmirrored draw.
pub fn draw_scaled(source: &RgbImage, ratio: f64, mirror: bool) -> Result<RgbImage, RenderError> {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return Err(RenderError::EmptyOutput { width, height });
    }
    let (new_width, new_height) = scaled_dimensions(width, height, ratio)?;

    let step_x = width as f64 / new_width as f64;
    let step_y = height as f64 / new_height as f64;
    let mut target = RgbImage::new(new_width, new_height);

    for dy in 0..new_height {
        let sy = source_coordinate(dy, step_y, height);
        for dx in 0..new_width {
            let column = if mirror { new_width - 1 - dx } else { dx };
            let sx = source_coordinate(column, step_x, width);
            target.put_pixel(dx, dy, sample_bilinear(source, sx, sy));
        }
    }
    Ok(target)
}

/// Maps a destination pixel index to a continuous source coordinate,
/// aligning pixel centres.
fn source_coordinate(index: u32, step: f64, extent: u32) -> f64 {
    ((index as f64 + 0.5) * step - 0.5).clamp(0.0, (extent - 1) as f64)
}

fn sample_bilinear(source: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let x1 = (x0 + 1).min(source.width() - 1);
    let y1 = (y0 + 1).min(source.height() - 1);
    let (fx, fy) = (x - x0 as f64, y - y0 as f64);

    let p00 = source.get_pixel(x0, y0).0;
    let p10 = source.get_pixel(x1, y0).0;
    let p01 = source.get_pixel(x0, y1).0;
    let p11 = source.get_pixel(x1, y1).0;

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}
