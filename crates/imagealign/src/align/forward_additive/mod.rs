//! Forward-additive image alignment.
//!
//! The classic Lucas-Kanade algorithm in the terminology of Baker and
//! Matthews: the warp is applied in the forward direction (template →
//! target) and parameter updates are added to the current parameters.
//!
//! Every step scans the template interior, warps each pixel into the
//! target, and linearizes the residual `T(x) − I(W(x; p))` with the target
//! gradient at `W(x; p)` and the warp Jacobian at the template point `x`.
//! Nothing depends on the template alone, so `prepare` does no work.
//!
//! ## References
//!
//! - Lucas, B. D., Kanade, T. "An iterative image registration technique
//!   with an application to stereo vision." IJCAI 1981.
//! - Baker, S., Matthews, I. "Lucas-Kanade 20 years on: A unifying
//!   framework." IJCV 56(3), 2004.

mod config;

use nalgebra::Point2;

use super::{AlignAlgorithm, AlignImages, NormalEquations, StepResult};
use crate::error::Result;
use crate::intensity::contains_with_margin;
use crate::sampling::{Bilinear, CentralDifference, GradientEstimator, Sampler};
use crate::warp::Warp;

pub use config::{Accumulation, ForwardAdditiveConfig};

/// Pixels closer than this to the target border are skipped; the gradient
/// estimator samples one pixel around the warped location.
const TARGET_MARGIN: u32 = 1;

/// Forward-additive alignment variant.
///
/// Generic over the intensity sampler `S` and the gradient estimator `G`;
/// the defaults are bilinear sampling with central differences.
#[derive(Debug, Clone)]
pub struct ForwardAdditive<S = Bilinear, G = CentralDifference<Bilinear>> {
    sampler: S,
    gradient: G,
    config: ForwardAdditiveConfig,
}

impl ForwardAdditive {
    /// Bilinear sampling and central-difference gradients.
    pub fn new(config: ForwardAdditiveConfig) -> Self {
        Self::with_strategies(Bilinear, CentralDifference::new(Bilinear), config)
    }
}

impl Default for ForwardAdditive {
    fn default() -> Self {
        Self::new(ForwardAdditiveConfig::default())
    }
}

impl<S, G> ForwardAdditive<S, G>
where
    S: Sampler,
    G: GradientEstimator,
{
    /// Use custom sampling and gradient strategies.
    pub fn with_strategies(sampler: S, gradient: G, config: ForwardAdditiveConfig) -> Self {
        Self {
            sampler,
            gradient,
            config,
        }
    }

    pub fn config(&self) -> &ForwardAdditiveConfig {
        &self.config
    }

    /// Accumulate the normal equations over the whole template interior.
    pub fn normal_equations<W: Warp + ?Sized>(
        &self,
        images: &AlignImages,
        warp: &W,
    ) -> NormalEquations {
        let n = warp.num_params();
        let rows = 1..images.template().height().saturating_sub(1);

        match self.config.accumulation {
            Accumulation::Sequential => rows.fold(NormalEquations::zeros(n), |mut acc, y| {
                self.accumulate_row(images, warp, y, &mut acc);
                acc
            }),
            Accumulation::Parallel => self.accumulate_parallel(images, warp, rows),
        }
    }

    #[cfg(feature = "rayon")]
    fn accumulate_parallel<W: Warp + ?Sized>(
        &self,
        images: &AlignImages,
        warp: &W,
        rows: std::ops::Range<u32>,
    ) -> NormalEquations {
        use rayon::prelude::*;

        let n = warp.num_params();
        rows.into_par_iter()
            .fold(
                || NormalEquations::zeros(n),
                |mut acc, y| {
                    self.accumulate_row(images, warp, y, &mut acc);
                    acc
                },
            )
            .reduce(|| NormalEquations::zeros(n), NormalEquations::merge)
    }

    #[cfg(not(feature = "rayon"))]
    fn accumulate_parallel<W: Warp + ?Sized>(
        &self,
        images: &AlignImages,
        warp: &W,
        rows: std::ops::Range<u32>,
    ) -> NormalEquations {
        let n = warp.num_params();
        rows.fold(NormalEquations::zeros(n), |mut acc, y| {
            self.accumulate_row(images, warp, y, &mut acc);
            acc
        })
    }

    /// Add the contributions of template row `y`, border columns excluded.
    fn accumulate_row<W: Warp + ?Sized>(
        &self,
        images: &AlignImages,
        warp: &W,
        y: u32,
        acc: &mut NormalEquations,
    ) {
        let tpl = images.template();
        let target = images.target();
        let (tw, _) = tpl.dimensions();
        let (gw, gh) = target.dimensions();
        let stride = tw as usize;
        let row = &tpl.as_raw()[y as usize * stride..(y as usize + 1) * stride];

        for x in 1..tw.saturating_sub(1) {
            let template_intensity = row[x as usize];
            let p_tpl = Point2::new(x as f64, y as f64);

            // 1. Warp the template pixel into the target.
            let p_tgt = warp.apply(&p_tpl);
            if !contains_with_margin(&p_tgt, gw, gh, TARGET_MARGIN) {
                continue;
            }

            // 2. Residual, template minus warped target.
            let target_intensity = self.sampler.sample(target, &p_tgt);
            let err = (template_intensity - target_intensity) as f64;

            // 3. Target gradient at the warped location, Jacobian at the template point.
            let grad = self.gradient.gradient(target, &p_tgt);
            let jacobian = warp.jacobian(&p_tpl);

            // 4. Steepest descent image, then b += sdiᵀ err and H += sdiᵀ sdi.
            let sdi = grad * jacobian;
            acc.accumulate(&sdi, err);
        }
    }
}

impl<W, S, G> AlignAlgorithm<W> for ForwardAdditive<S, G>
where
    W: Warp + ?Sized,
    S: Sampler,
    G: GradientEstimator,
{
    fn prepare(&mut self, _images: &AlignImages, _warp: &W) -> Result<()> {
        // Gradients are sampled at the warped target location every step.
        Ok(())
    }

    fn compute_step(&self, images: &AlignImages, warp: &W) -> Result<StepResult> {
        let ne = self.normal_equations(images, warp);
        let delta = ne.solve(self.config.min_rcond).map_err(|e| {
            tracing::warn!("forward-additive step failed: {}", e);
            e
        })?;

        Ok(StepResult {
            delta,
            sum_squared_error: ne.sum_squared_error,
            num_constraints: ne.num_constraints,
        })
    }

    fn apply_step(&self, warp: &mut W, step: &StepResult) {
        warp.update_additive(&step.delta);
    }
}
