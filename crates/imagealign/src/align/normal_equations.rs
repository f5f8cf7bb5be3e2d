use nalgebra::{DMatrix, DVector, RowDVector};

use crate::error::{AlignError, Result};

/// Gauss-Newton normal equations `H δ = b` accumulated over pixels.
///
/// Partial accumulators built over disjoint pixel sets combine with
/// [`NormalEquations::merge`]; the result does not depend on the order of
/// accumulation beyond floating-point rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalEquations {
    /// Approximate Hessian, sum of `sdiᵀ sdi` (P×P). Only the upper
    /// triangle is accumulated; see [`NormalEquations::symmetric_hessian`].
    pub hessian: DMatrix<f64>,
    /// Right-hand side, sum of `sdiᵀ err` (length P).
    pub b: DVector<f64>,
    /// Sum of squared residuals.
    pub sum_squared_error: f64,
    /// Number of accumulated pixels.
    pub num_constraints: usize,
}

impl NormalEquations {
    /// Empty system for `num_params` unknowns.
    pub fn zeros(num_params: usize) -> Self {
        Self {
            hessian: DMatrix::zeros(num_params, num_params),
            b: DVector::zeros(num_params),
            sum_squared_error: 0.0,
            num_constraints: 0,
        }
    }

    pub fn num_params(&self) -> usize {
        self.b.len()
    }

    /// Add one pixel with steepest-descent row `sdi` and residual `err`.
    #[inline]
    pub fn accumulate(&mut self, sdi: &RowDVector<f64>, err: f64) {
        let n = self.num_params();
        debug_assert_eq!(sdi.len(), n);
        for i in 0..n {
            let si = sdi[i];
            self.b[i] += si * err;
            for j in i..n {
                self.hessian[(i, j)] += si * sdi[j];
            }
        }
        self.sum_squared_error += err * err;
        self.num_constraints += 1;
    }

    /// Sum of two partial systems.
    pub fn merge(mut self, other: Self) -> Self {
        self.hessian += other.hessian;
        self.b += other.b;
        self.sum_squared_error += other.sum_squared_error;
        self.num_constraints += other.num_constraints;
        self
    }

    /// Full symmetric Hessian.
    pub fn symmetric_hessian(&self) -> DMatrix<f64> {
        let mut h = self.hessian.clone();
        h.fill_lower_triangle_with_upper_triangle();
        h
    }

    /// Reciprocal condition estimate: smallest over largest eigenvalue of H.
    pub fn rcond(&self) -> f64 {
        let eig = self.symmetric_hessian().symmetric_eigenvalues();
        let max = eig.max();
        let min = eig.min();
        if !(max > 0.0) || !min.is_finite() {
            return 0.0;
        }
        (min / max).max(0.0)
    }

    /// Solve `H δ = b`.
    ///
    /// Fails with [`AlignError::NoValidPixels`] on an empty system and with
    /// [`AlignError::DegenerateSystem`] when `rcond < min_rcond`, the
    /// Cholesky factorization fails or the solution is not finite.
    pub fn solve(&self, min_rcond: f64) -> Result<DVector<f64>> {
        if self.num_constraints == 0 {
            return Err(AlignError::NoValidPixels);
        }
        let degenerate = |rcond: f64| AlignError::DegenerateSystem {
            rcond,
            num_constraints: self.num_constraints,
        };

        let rcond = self.rcond();
        if !(rcond >= min_rcond) || rcond == 0.0 {
            return Err(degenerate(rcond));
        }

        let chol = self
            .symmetric_hessian()
            .cholesky()
            .ok_or_else(|| degenerate(rcond))?;
        let delta = chol.solve(&self.b);
        if delta.iter().any(|v| !v.is_finite()) {
            return Err(degenerate(rcond));
        }
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(v: &[f64]) -> RowDVector<f64> {
        RowDVector::from_row_slice(v)
    }

    #[test]
    fn accumulate_builds_outer_products() {
        let mut ne = NormalEquations::zeros(2);
        ne.accumulate(&row(&[1.0, 2.0]), 0.5);
        ne.accumulate(&row(&[-1.0, 1.0]), 2.0);

        let h = ne.symmetric_hessian();
        assert_relative_eq!(h, DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 5.0]));
        assert_relative_eq!(ne.b, DVector::from_vec(vec![-1.5, 3.0]));
        assert_relative_eq!(ne.sum_squared_error, 4.25);
        assert_eq!(ne.num_constraints, 2);
    }

    #[test]
    fn merge_equals_single_pass() {
        let rows = [[1.0, 0.5], [0.2, -1.0], [3.0, 1.0], [-0.7, 0.4]];
        let errs = [0.1, -0.3, 0.25, 1.0];

        let mut whole = NormalEquations::zeros(2);
        let mut left = NormalEquations::zeros(2);
        let mut right = NormalEquations::zeros(2);
        for (k, (r, e)) in rows.iter().zip(errs).enumerate() {
            whole.accumulate(&row(r), e);
            if k % 2 == 0 {
                left.accumulate(&row(r), e);
            } else {
                right.accumulate(&row(r), e);
            }
        }
        let merged = left.merge(right);
        assert_relative_eq!(merged.hessian, whole.hessian, epsilon = 1e-12);
        assert_relative_eq!(merged.b, whole.b, epsilon = 1e-12);
        assert_eq!(merged.num_constraints, whole.num_constraints);
    }

    #[test]
    fn solve_recovers_known_delta() {
        let truth = DVector::from_vec(vec![0.3, -1.2]);
        let mut ne = NormalEquations::zeros(2);
        for r in [[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, -1.0]] {
            let r = row(&r);
            let err = (&r * &truth)[0];
            ne.accumulate(&r, err);
        }
        let delta = ne.solve(1e-12).unwrap();
        assert_relative_eq!(delta, truth, epsilon = 1e-10);
    }

    #[test]
    fn empty_system_reports_no_data() {
        let ne = NormalEquations::zeros(3);
        assert_eq!(ne.solve(1e-12), Err(AlignError::NoValidPixels));
    }

    #[test]
    fn rank_deficient_system_is_degenerate() {
        let mut ne = NormalEquations::zeros(2);
        for k in 0..10 {
            ne.accumulate(&row(&[1.0, 2.0]), k as f64);
        }
        match ne.solve(1e-12) {
            Err(AlignError::DegenerateSystem {
                num_constraints, ..
            }) => assert_eq!(num_constraints, 10),
            other => panic!("expected degenerate system, got {other:?}"),
        }
    }
}
