use nalgebra::{DVector, Matrix2xX, Matrix3, Point2};
use serde::{Deserialize, Serialize};

use super::{check_param_count, Warp};
use crate::error::Result;

/// General 2D affine warp.
///
/// ```text
/// x' = (1 + p0) x + p2 y + p4
/// y' = p1 x + (1 + p3) y + p5
/// ```
///
/// Parameters are zero at identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Affine {
    pub p: [f64; 6],
}

impl Affine {
    pub fn new(p: [f64; 6]) -> Self {
        Self { p }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    /// Build from `[p0, .., p5]`.
    pub fn from_slice(params: &[f64]) -> Result<Self> {
        check_param_count(6, params.len())?;
        let mut p = [0.0; 6];
        p.copy_from_slice(params);
        Ok(Self::new(p))
    }

    /// Homogeneous 3×3 matrix of the warp (row-major semantics).
    pub fn matrix(&self) -> Matrix3<f64> {
        let p = &self.p;
        Matrix3::new(
            1.0 + p[0],
            p[2],
            p[4],
            p[1],
            1.0 + p[3],
            p[5],
            0.0,
            0.0,
            1.0,
        )
    }
}

impl Warp for Affine {
    fn num_params(&self) -> usize {
        6
    }

    fn params(&self) -> DVector<f64> {
        DVector::from_column_slice(&self.p)
    }

    #[inline]
    fn apply(&self, q: &Point2<f64>) -> Point2<f64> {
        let p = &self.p;
        Point2::new(
            (1.0 + p[0]) * q.x + p[2] * q.y + p[4],
            p[1] * q.x + (1.0 + p[3]) * q.y + p[5],
        )
    }

    fn jacobian(&self, q: &Point2<f64>) -> Matrix2xX<f64> {
        #[rustfmt::skip]
        let jac = Matrix2xX::from_row_slice(&[
            q.x, 0.0, q.y, 0.0, 1.0, 0.0,
            0.0, q.x, 0.0, q.y, 0.0, 1.0,
        ]);
        jac
    }

    fn update_additive(&mut self, delta: &DVector<f64>) {
        debug_assert_eq!(delta.len(), 6);
        for (p, d) in self.p.iter_mut().zip(delta.iter()) {
            *p += d;
        }
    }
}
