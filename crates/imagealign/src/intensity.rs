//! Floating-point intensity images.

use image::{GrayImage, ImageBuffer, Luma};
use nalgebra::Point2;

/// Single-channel image with `f32` intensities, addressed as `(x, y)` =
/// `(column, row)`.
pub type IntensityImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Smallest accepted side length: one interior pixel plus a one-sample
/// margin on each side.
pub const MIN_IMAGE_SIDE: u32 = 3;

/// Convert an 8-bit gray image to intensities in [0, 1].
pub fn to_intensity(img: &GrayImage) -> IntensityImage {
    const INV_255: f32 = 1.0 / 255.0;
    let (w, h) = img.dimensions();
    let data = img.as_raw().iter().map(|&v| v as f32 * INV_255).collect();
    // Same dimensions and channel count, so the buffer always fits.
    IntensityImage::from_raw(w, h, data).unwrap_or_else(|| IntensityImage::new(w, h))
}

/// Convert intensities in [0, 1] back to 8-bit gray, clamping out-of-range values.
pub fn to_gray_u8(img: &IntensityImage) -> GrayImage {
    let (w, h) = img.dimensions();
    let mut out = GrayImage::new(w, h);
    for (dst, src) in out.pixels_mut().zip(img.pixels()) {
        let v = src[0];
        let v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        *dst = Luma([(v * 255.0).round() as u8]);
    }
    out
}

/// Whether `p` lies strictly inside a `width`×`height` image with `margin`
/// samples to spare on every side.
///
/// Non-finite coordinates are never inside.
#[inline]
pub fn contains_with_margin(p: &Point2<f64>, width: u32, height: u32, margin: u32) -> bool {
    let m = margin as f64;
    p.x >= m && p.y >= m && p.x < width as f64 - m && p.y < height as f64 - m
}
