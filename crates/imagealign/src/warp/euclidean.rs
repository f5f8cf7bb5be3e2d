use nalgebra::{DVector, Matrix2xX, Point2};
use serde::{Deserialize, Serialize};

use super::{check_param_count, Warp};
use crate::error::Result;

/// Rigid motion: rotation by `theta` about the origin followed by a
/// translation.
///
/// ```text
/// x' = cos(θ) x − sin(θ) y + tx
/// y' = sin(θ) x + cos(θ) y + ty
/// ```
///
/// Parameters: `[tx, ty, theta]`, theta in radians.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Euclidean {
    pub tx: f64,
    pub ty: f64,
    pub theta: f64,
}

impl Euclidean {
    pub fn new(tx: f64, ty: f64, theta: f64) -> Self {
        Self { tx, ty, theta }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    /// Build from `[tx, ty, theta]`.
    pub fn from_slice(params: &[f64]) -> Result<Self> {
        check_param_count(3, params.len())?;
        Ok(Self::new(params[0], params[1], params[2]))
    }
}

impl Warp for Euclidean {
    fn num_params(&self) -> usize {
        3
    }

    fn params(&self) -> DVector<f64> {
        DVector::from_vec(vec![self.tx, self.ty, self.theta])
    }

    #[inline]
    fn apply(&self, p: &Point2<f64>) -> Point2<f64> {
        let (s, c) = self.theta.sin_cos();
        Point2::new(c * p.x - s * p.y + self.tx, s * p.x + c * p.y + self.ty)
    }

    fn jacobian(&self, p: &Point2<f64>) -> Matrix2xX<f64> {
        let (s, c) = self.theta.sin_cos();
        #[rustfmt::skip]
        let jac = Matrix2xX::from_row_slice(&[
            1.0, 0.0, -s * p.x - c * p.y,
            0.0, 1.0,  c * p.x - s * p.y,
        ]);
        jac
    }

    fn update_additive(&mut self, delta: &DVector<f64>) {
        debug_assert_eq!(delta.len(), 3);
        self.tx += delta[0];
        self.ty += delta[1];
        self.theta += delta[2];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warp::finite_difference_jacobian;
    use approx::assert_relative_eq;

    #[test]
    fn quarter_turn_maps_axes() {
        let w = Euclidean::new(1.0, 2.0, std::f64::consts::FRAC_PI_2);
        let q = w.apply(&Point2::new(1.0, 0.0));
        assert_relative_eq!(q, Point2::new(1.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let w = Euclidean::new(0.3, -0.7, 0.21);
        let p = Point2::new(12.5, -4.0);
        assert_relative_eq!(
            w.jacobian(&p),
            finite_difference_jacobian(&w, &p),
            epsilon = 1e-6
        );
    }
}
