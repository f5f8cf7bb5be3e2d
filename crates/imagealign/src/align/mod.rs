//! Alignment state machine and variant hooks.
//!
//! An [`Aligner`] owns the template/target pair and drives an
//! [`AlignAlgorithm`] variant through `Unprepared → Prepared → Stepped`.
//! Each [`Aligner::step`] asks the variant for a [`StepResult`], lets the
//! variant apply it to the warp, and hands the diagnostics back. Deciding
//! when to stop is left to the caller, or to the thin loop in
//! [`Aligner::align`].

pub mod forward_additive;
mod normal_equations;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{AlignError, ImageRole, Result};
use crate::intensity::{IntensityImage, MIN_IMAGE_SIDE};
use crate::warp::Warp;

pub use normal_equations::NormalEquations;

/// Template and target images of one alignment run.
#[derive(Debug, Clone)]
pub struct AlignImages {
    template: IntensityImage,
    target: IntensityImage,
}

impl AlignImages {
    /// Validate and pair the images.
    pub fn new(template: IntensityImage, target: IntensityImage) -> Result<Self> {
        check_dimensions(ImageRole::Template, &template)?;
        check_dimensions(ImageRole::Target, &target)?;
        Ok(Self { template, target })
    }

    pub fn template(&self) -> &IntensityImage {
        &self.template
    }

    pub fn target(&self) -> &IntensityImage {
        &self.target
    }
}

fn check_dimensions(role: ImageRole, img: &IntensityImage) -> Result<()> {
    let (width, height) = img.dimensions();
    if width < MIN_IMAGE_SIDE || height < MIN_IMAGE_SIDE {
        return Err(AlignError::InvalidInputDimensions {
            role,
            width,
            height,
            min: MIN_IMAGE_SIDE,
        });
    }
    Ok(())
}

/// Outcome of one refinement step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Parameter update computed by the step.
    pub delta: DVector<f64>,
    /// Sum of squared residuals over contributing pixels, before the update.
    pub sum_squared_error: f64,
    /// Number of template pixels that contributed.
    pub num_constraints: usize,
}

impl StepResult {
    /// `sum_squared_error / num_constraints`.
    pub fn mean_squared_error(&self) -> f64 {
        if self.num_constraints == 0 {
            return f64::NAN;
        }
        self.sum_squared_error / self.num_constraints as f64
    }
}

/// Variant hooks of an alignment algorithm.
///
/// `prepare` may precompute data that depends only on the template.
/// `compute_step` evaluates one update without touching the warp;
/// `apply_step` defines how that update is folded into the warp.
pub trait AlignAlgorithm<W: Warp + ?Sized> {
    fn prepare(&mut self, images: &AlignImages, warp: &W) -> Result<()>;
    fn compute_step(&self, images: &AlignImages, warp: &W) -> Result<StepResult>;
    fn apply_step(&self, warp: &mut W, step: &StepResult);
}

/// Lifecycle of an [`Aligner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignState {
    Unprepared,
    Prepared,
    Stepped { steps: usize },
}

/// Stopping rule for [`Aligner::align`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminationCriteria {
    /// Maximum number of steps.
    pub max_iterations: usize,
    /// Stop once `‖delta‖` falls below this value.
    pub min_delta_norm: f64,
}

impl Default for TerminationCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            min_delta_norm: 1e-4,
        }
    }
}

/// Summary of an [`Aligner::align`] run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignOutcome {
    /// Steps performed.
    pub iterations: usize,
    /// Whether `‖delta‖` dropped below the threshold.
    pub converged: bool,
    /// Norm of the last applied delta.
    pub last_delta_norm: f64,
    /// Sum of squared errors reported by the last step.
    pub sum_squared_error: f64,
    /// Contributing pixels in the last step.
    pub num_constraints: usize,
    /// Sum of squared errors per step.
    pub error_history: Vec<f64>,
}

/// Drives an alignment variant over one template/target pair.
#[derive(Debug, Clone)]
pub struct Aligner<A> {
    images: AlignImages,
    algorithm: A,
    state: AlignState,
}

impl<A> Aligner<A> {
    /// Take ownership of the images and the variant.
    ///
    /// Fails with [`AlignError::InvalidInputDimensions`] when either image is
    /// smaller than [`MIN_IMAGE_SIDE`] in some dimension.
    pub fn new(template: IntensityImage, target: IntensityImage, algorithm: A) -> Result<Self> {
        Ok(Self {
            images: AlignImages::new(template, target)?,
            algorithm,
            state: AlignState::Unprepared,
        })
    }

    pub fn images(&self) -> &AlignImages {
        &self.images
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    pub fn state(&self) -> AlignState {
        self.state
    }

    /// Run the variant's one-time setup. Repeating it restarts the step count.
    pub fn prepare<W>(&mut self, warp: &W) -> Result<()>
    where
        W: Warp + ?Sized,
        A: AlignAlgorithm<W>,
    {
        self.algorithm.prepare(&self.images, warp)?;
        self.state = AlignState::Prepared;
        Ok(())
    }

    /// Perform one refinement step and update `warp` in place.
    ///
    /// On error the warp is left unchanged.
    pub fn step<W>(&mut self, warp: &mut W) -> Result<StepResult>
    where
        W: Warp + ?Sized,
        A: AlignAlgorithm<W>,
    {
        let steps = match self.state {
            AlignState::Unprepared => return Err(AlignError::NotPrepared),
            AlignState::Prepared => 0,
            AlignState::Stepped { steps } => steps,
        };

        let result = self.algorithm.compute_step(&self.images, warp)?;
        self.algorithm.apply_step(warp, &result);
        self.state = AlignState::Stepped { steps: steps + 1 };

        tracing::debug!(
            "step {}: sse={:.6e} constraints={} |delta|={:.3e}",
            steps + 1,
            result.sum_squared_error,
            result.num_constraints,
            result.delta.norm()
        );
        Ok(result)
    }

    /// Step until `criteria` is met, preparing first if needed.
    ///
    /// Errors from any step abort the loop; updates from earlier steps stay
    /// applied to `warp`.
    pub fn align<W>(
        &mut self,
        warp: &mut W,
        criteria: &TerminationCriteria,
    ) -> Result<AlignOutcome>
    where
        W: Warp + ?Sized,
        A: AlignAlgorithm<W>,
    {
        if self.state == AlignState::Unprepared {
            self.prepare(warp)?;
        }

        let mut outcome = AlignOutcome {
            iterations: 0,
            converged: false,
            last_delta_norm: f64::INFINITY,
            sum_squared_error: f64::NAN,
            num_constraints: 0,
            error_history: Vec::with_capacity(criteria.max_iterations),
        };

        for _ in 0..criteria.max_iterations {
            let step = self.step(warp)?;
            outcome.iterations += 1;
            outcome.last_delta_norm = step.delta.norm();
            outcome.sum_squared_error = step.sum_squared_error;
            outcome.num_constraints = step.num_constraints;
            outcome.error_history.push(step.sum_squared_error);

            if outcome.last_delta_norm < criteria.min_delta_norm {
                outcome.converged = true;
                break;
            }
        }

        tracing::info!(
            "alignment finished after {} iterations (converged: {}, mse={:.6e})",
            outcome.iterations,
            outcome.converged,
            outcome.sum_squared_error / outcome.num_constraints.max(1) as f64
        );
        Ok(outcome)
    }
}
