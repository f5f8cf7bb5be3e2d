//! Parametric warps from template coordinates to target coordinates.

mod affine;
mod euclidean;
mod similarity;
mod translation;

use nalgebra::{DVector, Matrix2xX, Point2};
use serde::{Deserialize, Serialize};

use crate::error::{AlignError, Result};
use crate::intensity::IntensityImage;
use crate::sampling::Sampler;

pub use affine::Affine;
pub use euclidean::Euclidean;
pub use similarity::Similarity;
pub use translation::Translation;

/// Parametric mapping from template space to target space.
///
/// Alignment variants only need to map points, evaluate the 2×P Jacobian
/// with respect to the parameters and apply an additive update. `P` is
/// fixed for a given warp value and reported by [`Warp::num_params`].
///
/// # Example
///
/// ```
/// use imagealign::{Translation, Warp};
/// use nalgebra::{DVector, Point2};
///
/// let mut w = Translation::identity();
/// w.update_additive(&DVector::from_vec(vec![1.5, -2.0]));
/// assert_eq!(w.apply(&Point2::new(0.0, 0.0)), Point2::new(1.5, -2.0));
/// ```
pub trait Warp: Send + Sync {
    /// Number of parameters `P`.
    fn num_params(&self) -> usize;
    /// Current parameter vector (length `P`).
    fn params(&self) -> DVector<f64>;
    /// Map a template-space point into target space.
    fn apply(&self, p: &Point2<f64>) -> Point2<f64>;
    /// Partial derivatives of [`Warp::apply`] with respect to each parameter at `p`.
    fn jacobian(&self, p: &Point2<f64>) -> Matrix2xX<f64>;
    /// `params += delta`. `delta` has length `P`.
    fn update_additive(&mut self, delta: &DVector<f64>);
}

impl<W: Warp + ?Sized> Warp for Box<W> {
    fn num_params(&self) -> usize {
        (**self).num_params()
    }

    fn params(&self) -> DVector<f64> {
        (**self).params()
    }

    fn apply(&self, p: &Point2<f64>) -> Point2<f64> {
        (**self).apply(p)
    }

    fn jacobian(&self, p: &Point2<f64>) -> Matrix2xX<f64> {
        (**self).jacobian(p)
    }

    fn update_additive(&mut self, delta: &DVector<f64>) {
        (**self).update_additive(delta)
    }
}

/// Built-in warp models, ordered by degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarpKind {
    Translation,
    Euclidean,
    Similarity,
    Affine,
}

impl WarpKind {
    /// All built-in models.
    pub const ALL: [WarpKind; 4] = [
        WarpKind::Translation,
        WarpKind::Euclidean,
        WarpKind::Similarity,
        WarpKind::Affine,
    ];

    /// Parameter count of this model.
    pub fn num_params(self) -> usize {
        match self {
            Self::Translation => 2,
            Self::Euclidean => 3,
            Self::Similarity => 4,
            Self::Affine => 6,
        }
    }

    /// Identity warp of this model.
    pub fn identity(self) -> Box<dyn Warp> {
        match self {
            Self::Translation => Box::new(Translation::identity()),
            Self::Euclidean => Box::new(Euclidean::identity()),
            Self::Similarity => Box::new(Similarity::identity()),
            Self::Affine => Box::new(Affine::identity()),
        }
    }

    /// Warp of this model initialized from `params`.
    pub fn with_params(self, params: &[f64]) -> Result<Box<dyn Warp>> {
        Ok(match self {
            Self::Translation => Box::new(Translation::from_slice(params)?),
            Self::Euclidean => Box::new(Euclidean::from_slice(params)?),
            Self::Similarity => Box::new(Similarity::from_slice(params)?),
            Self::Affine => Box::new(Affine::from_slice(params)?),
        })
    }
}

impl std::fmt::Display for WarpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Translation => "translation",
            Self::Euclidean => "euclidean",
            Self::Similarity => "similarity",
            Self::Affine => "affine",
        };
        f.pad(name)
    }
}

pub(crate) fn check_param_count(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(AlignError::ParameterCount { expected, got });
    }
    Ok(())
}

/// Resample `target` through `warp` into a `width`×`height` image.
///
/// Output pixel `(x, y)` takes the target intensity at `warp(x, y)`, so a
/// well-aligned warp reproduces the template. Locations outside the target
/// are set to `fill`.
pub fn warp_image<W, S>(
    target: &IntensityImage,
    width: u32,
    height: u32,
    warp: &W,
    sampler: &S,
    fill: f32,
) -> IntensityImage
where
    W: Warp + ?Sized,
    S: Sampler,
{
    let (tw, th) = target.dimensions();
    IntensityImage::from_fn(width, height, |x, y| {
        let p = warp.apply(&Point2::new(x as f64, y as f64));
        let inside = p.x >= 0.0
            && p.y >= 0.0
            && p.x <= (tw as f64 - 1.0)
            && p.y <= (th as f64 - 1.0);
        let v = if inside { sampler.sample(target, &p) } else { fill };
        image::Luma([v])
    })
}

#[cfg(test)]
pub(crate) fn finite_difference_jacobian<W: Warp + Clone>(
    warp: &W,
    p: &Point2<f64>,
) -> Matrix2xX<f64> {
    let n = warp.num_params();
    let h = 1e-6;
    let mut jac = Matrix2xX::<f64>::zeros(n);
    for i in 0..n {
        let mut delta = DVector::<f64>::zeros(n);
        delta[i] = h;
        let mut plus = warp.clone();
        plus.update_additive(&delta);
        let mut minus = warp.clone();
        minus.update_additive(&(-delta));
        let d = (plus.apply(p) - minus.apply(p)) / (2.0 * h);
        jac[(0, i)] = d.x;
        jac[(1, i)] = d.y;
    }
    jac
}
