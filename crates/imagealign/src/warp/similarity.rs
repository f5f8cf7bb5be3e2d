use nalgebra::{DVector, Matrix2xX, Point2};
use serde::{Deserialize, Serialize};

use super::{check_param_count, Warp};
use crate::error::Result;

/// Rotation, uniform scale and translation, linear in its parameters.
///
/// ```text
/// x' = (1 + a) x − b y + tx
/// y' = b x + (1 + a) y + ty
/// ```
///
/// Parameters: `[tx, ty, a, b]`. Scale is `|(1 + a, b)|`, rotation is
/// `atan2(b, 1 + a)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Similarity {
    pub tx: f64,
    pub ty: f64,
    pub a: f64,
    pub b: f64,
}

impl Similarity {
    pub fn new(tx: f64, ty: f64, a: f64, b: f64) -> Self {
        Self { tx, ty, a, b }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    /// Build from scale, rotation angle (radians) and translation.
    pub fn from_scale_rotation(scale: f64, theta: f64, tx: f64, ty: f64) -> Self {
        let (s, c) = theta.sin_cos();
        Self::new(tx, ty, scale * c - 1.0, scale * s)
    }

    /// Build from `[tx, ty, a, b]`.
    pub fn from_slice(params: &[f64]) -> Result<Self> {
        check_param_count(4, params.len())?;
        Ok(Self::new(params[0], params[1], params[2], params[3]))
    }

    /// Uniform scale factor.
    pub fn scale(&self) -> f64 {
        (1.0 + self.a).hypot(self.b)
    }

    /// Rotation angle in radians.
    pub fn rotation(&self) -> f64 {
        self.b.atan2(1.0 + self.a)
    }
}

impl Warp for Similarity {
    fn num_params(&self) -> usize {
        4
    }

    fn params(&self) -> DVector<f64> {
        DVector::from_vec(vec![self.tx, self.ty, self.a, self.b])
    }

    #[inline]
    fn apply(&self, p: &Point2<f64>) -> Point2<f64> {
        let k = 1.0 + self.a;
        Point2::new(
            k * p.x - self.b * p.y + self.tx,
            self.b * p.x + k * p.y + self.ty,
        )
    }

    fn jacobian(&self, p: &Point2<f64>) -> Matrix2xX<f64> {
        #[rustfmt::skip]
        let jac = Matrix2xX::from_row_slice(&[
            1.0, 0.0, p.x, -p.y,
            0.0, 1.0, p.y,  p.x,
        ]);
        jac
    }

    fn update_additive(&mut self, delta: &DVector<f64>) {
        debug_assert_eq!(delta.len(), 4);
        self.tx += delta[0];
        self.ty += delta[1];
        self.a += delta[2];
        self.b += delta[3];
    }
}
