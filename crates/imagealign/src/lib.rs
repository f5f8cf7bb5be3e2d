//! imagealign: intensity-based parametric image alignment.
//!
//! Estimates the parameters of a warp that maps a target image onto a
//! template by minimizing the sum of squared intensity differences with
//! Gauss-Newton (Lucas-Kanade) steps.
//!
//! The building blocks are:
//!
//! 1. **Warp** – parametric point mapping with Jacobian and additive update
//!    ([`Warp`], [`Translation`], [`Euclidean`], [`Similarity`], [`Affine`]).
//! 2. **Sampling** – fractional-coordinate intensity and gradient lookup
//!    ([`Sampler`], [`GradientEstimator`]).
//! 3. **Align** – the [`Aligner`] state machine driving an
//!    [`AlignAlgorithm`] variant such as [`ForwardAdditive`].
//!
//! # Example
//!
//! ```no_run
//! use imagealign::{Aligner, ForwardAdditive, IntensityImage, TerminationCriteria, Translation};
//!
//! # fn run(template: IntensityImage, target: IntensityImage) -> imagealign::Result<()> {
//! let mut aligner = Aligner::new(template, target, ForwardAdditive::new(Default::default()))?;
//! let mut warp = Translation::identity();
//! let outcome = aligner.align(&mut warp, &TerminationCriteria::default())?;
//! println!("t = {:?} after {} steps", warp.offset(), outcome.iterations);
//! # Ok(())
//! # }
//! ```

mod align;
mod error;
mod intensity;
mod sampling;
mod warp;

#[cfg(test)]
pub(crate) mod test_utils;

pub use align::forward_additive::{Accumulation, ForwardAdditive, ForwardAdditiveConfig};
pub use align::{
    AlignAlgorithm, AlignImages, AlignOutcome, AlignState, Aligner, NormalEquations, StepResult,
    TerminationCriteria,
};
pub use error::{AlignError, ImageRole, Result};
pub use intensity::{
    contains_with_margin, to_gray_u8, to_intensity, IntensityImage, MIN_IMAGE_SIDE,
};
pub use sampling::{Bilinear, CentralDifference, GradientEstimator, Nearest, Sampler};
pub use warp::{warp_image, Affine, Euclidean, Similarity, Translation, Warp, WarpKind};
