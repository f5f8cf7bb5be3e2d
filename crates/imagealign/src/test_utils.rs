//! Shared synthetic fixtures for alignment tests.

use std::f64::consts::PI;

use image::Luma;
use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::intensity::IntensityImage;

/// Smooth, non-periodic-looking texture with gradients in every direction.
pub(crate) fn pattern(x: f64, y: f64) -> f64 {
    0.5 + 0.2 * (2.0 * PI * x / 17.0 + 0.4).sin() * (2.0 * PI * y / 19.0 - 0.3).cos()
        + 0.15 * (2.0 * PI * (x + 0.7 * y) / 23.0).sin()
        + 0.1 * (2.0 * PI * (0.6 * x - y) / 13.0).cos()
}

/// Render `pattern` through `source_of`: pixel `(x, y)` gets
/// `pattern(source_of(x, y))`.
pub(crate) fn render_pattern(
    w: u32,
    h: u32,
    source_of: impl Fn(Point2<f64>) -> Point2<f64>,
) -> IntensityImage {
    IntensityImage::from_fn(w, h, |x, y| {
        let s = source_of(Point2::new(x as f64, y as f64));
        Luma([pattern(s.x, s.y) as f32])
    })
}

/// `pattern` sampled on the pixel grid.
pub(crate) fn textured(w: u32, h: u32) -> IntensityImage {
    render_pattern(w, h, |p| p)
}

/// `pattern` moved by `shift`: `out(x) = pattern(x - shift)`.
///
/// A translation warp of exactly `shift` maps the output back onto
/// [`textured`].
pub(crate) fn textured_shifted(w: u32, h: u32, shift: [f64; 2]) -> IntensityImage {
    render_pattern(w, h, |p| Point2::new(p.x - shift[0], p.y - shift[1]))
}

/// Gaussian-smoothed uniform noise in [0, 1], via `imageproc`.
pub(crate) fn smooth_noise(w: u32, h: u32, sigma: f32, seed: u64) -> IntensityImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = IntensityImage::from_fn(w, h, |_, _| Luma([rng.gen_range(0.0f32..1.0f32)]));
    imageproc::filter::gaussian_blur_f32(&noise, sigma)
}

/// Image that varies along x only.
pub(crate) fn vertical_stripes(w: u32, h: u32) -> IntensityImage {
    IntensityImage::from_fn(w, h, |x, _| {
        Luma([(0.5 + 0.4 * (2.0 * PI * x as f64 / 11.0).sin()) as f32])
    })
}
