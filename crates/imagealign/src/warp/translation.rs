use nalgebra::{DVector, Matrix2xX, Point2, Vector2};
use serde::{Deserialize, Serialize};

use super::{check_param_count, Warp};
use crate::error::Result;

/// Pure translation `(x + tx, y + ty)`. Parameters: `[tx, ty]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Translation {
    pub tx: f64,
    pub ty: f64,
}

impl Translation {
    pub fn new(tx: f64, ty: f64) -> Self {
        Self { tx, ty }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    /// Build from `[tx, ty]`.
    pub fn from_slice(params: &[f64]) -> Result<Self> {
        check_param_count(2, params.len())?;
        Ok(Self::new(params[0], params[1]))
    }

    /// Offset as a vector.
    pub fn offset(&self) -> Vector2<f64> {
        Vector2::new(self.tx, self.ty)
    }
}

impl Warp for Translation {
    fn num_params(&self) -> usize {
        2
    }

    fn params(&self) -> DVector<f64> {
        DVector::from_vec(vec![self.tx, self.ty])
    }

    #[inline]
    fn apply(&self, p: &Point2<f64>) -> Point2<f64> {
        Point2::new(p.x + self.tx, p.y + self.ty)
    }

    fn jacobian(&self, _p: &Point2<f64>) -> Matrix2xX<f64> {
        Matrix2xX::from_row_slice(&[1.0, 0.0, 0.0, 1.0])
    }

    fn update_additive(&mut self, delta: &DVector<f64>) {
        debug_assert_eq!(delta.len(), 2);
        self.tx += delta[0];
        self.ty += delta[1];
    }
}
