//! Sub-pixel sampling strategies shared by all alignment variants.
//!
//! A [`Sampler`] looks up intensity at a fractional coordinate and a
//! [`GradientEstimator`] returns the 1×2 intensity gradient there. Both are
//! only defined inside the image; callers bounds-check first (see
//! [`contains_with_margin`](crate::contains_with_margin)).

use nalgebra::{Point2, RowVector2};

use crate::intensity::IntensityImage;

/// Intensity lookup at fractional `(x, y)` coordinates.
pub trait Sampler: Send + Sync {
    /// Sample `img` at `p`. `p` must lie inside the image bounds.
    fn sample(&self, img: &IntensityImage, p: &Point2<f64>) -> f32;
}

/// Intensity gradient `(dI/dx, dI/dy)` at fractional coordinates.
pub trait GradientEstimator: Send + Sync {
    /// Gradient of `img` at `p`. Requires a one-sample neighborhood around `p`.
    fn gradient(&self, img: &IntensityImage, p: &Point2<f64>) -> RowVector2<f64>;
}

/// Bilinear interpolation between the four surrounding pixels.
///
/// Coordinates are clamped into `[0, w-1] × [0, h-1]` first, so the last
/// row and column are reachable and nothing is read outside the buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bilinear;

impl Sampler for Bilinear {
    #[inline]
    fn sample(&self, img: &IntensityImage, p: &Point2<f64>) -> f32 {
        let (w, h) = img.dimensions();
        if w == 0 || h == 0 {
            return 0.0;
        }
        let max_x = (w - 1) as f64;
        let max_y = (h - 1) as f64;
        let x = p.x.clamp(0.0, max_x);
        let y = p.y.clamp(0.0, max_y);

        let x0 = (x.floor() as u32).min(w.saturating_sub(2));
        let y0 = (y.floor() as u32).min(h.saturating_sub(2));
        let x1 = (x0 + 1).min(w - 1);
        let y1 = (y0 + 1).min(h - 1);
        let fx = (x - x0 as f64) as f32;
        let fy = (y - y0 as f64) as f32;

        let stride = w as usize;
        let raw = img.as_raw();
        let p00 = raw[y0 as usize * stride + x0 as usize];
        let p10 = raw[y0 as usize * stride + x1 as usize];
        let p01 = raw[y1 as usize * stride + x0 as usize];
        let p11 = raw[y1 as usize * stride + x1 as usize];

        (1.0 - fx) * (1.0 - fy) * p00
            + fx * (1.0 - fy) * p10
            + (1.0 - fx) * fy * p01
            + fx * fy * p11
    }
}

/// Nearest-neighbor lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nearest;

impl Sampler for Nearest {
    #[inline]
    fn sample(&self, img: &IntensityImage, p: &Point2<f64>) -> f32 {
        let (w, h) = img.dimensions();
        if w == 0 || h == 0 {
            return 0.0;
        }
        let x = p.x.round().clamp(0.0, (w - 1) as f64) as u32;
        let y = p.y.round().clamp(0.0, (h - 1) as f64) as u32;
        img.get_pixel(x, y)[0]
    }
}

/// Central finite differences over ±1 pixel, sampled with `S`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CentralDifference<S = Bilinear> {
    sampler: S,
}

impl<S: Sampler> CentralDifference<S> {
    /// Estimate gradients with the given sampler.
    pub fn new(sampler: S) -> Self {
        Self { sampler }
    }
}

impl<S: Sampler> GradientEstimator for CentralDifference<S> {
    #[inline]
    fn gradient(&self, img: &IntensityImage, p: &Point2<f64>) -> RowVector2<f64> {
        let s = |dx: f64, dy: f64| self.sampler.sample(img, &Point2::new(p.x + dx, p.y + dy));
        let gx = (s(1.0, 0.0) - s(-1.0, 0.0)) * 0.5;
        let gy = (s(0.0, 1.0) - s(0.0, -1.0)) * 0.5;
        RowVector2::new(gx as f64, gy as f64)
    }
}
