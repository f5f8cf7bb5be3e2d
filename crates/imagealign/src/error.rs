//! Error type for alignment runs.

use thiserror::Error;

/// Which of the two input images an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Template,
    Target,
}

impl std::fmt::Display for ImageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template => write!(f, "template"),
            Self::Target => write!(f, "target"),
        }
    }
}

/// Errors raised while setting up or stepping an alignment.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignError {
    /// An input image is too small to leave any pixel inside the border margin.
    #[error("{role} image is {width}x{height}, need at least {min}x{min}")]
    InvalidInputDimensions {
        role: ImageRole,
        width: u32,
        height: u32,
        min: u32,
    },

    /// No template pixel warped strictly inside the target.
    #[error("no template pixel maps inside the target image")]
    NoValidPixels,

    /// The normal equations are singular or ill-conditioned.
    #[error("degenerate system: rcond {rcond:.3e} from {num_constraints} constraints")]
    DegenerateSystem { rcond: f64, num_constraints: usize },

    /// `step` was called before `prepare`.
    #[error("aligner must be prepared before stepping")]
    NotPrepared,

    /// A parameter vector does not match the warp's parameter count.
    #[error("warp expects {expected} parameters, got {got}")]
    ParameterCount { expected: usize, got: usize },
}

/// Result alias for alignment operations.
pub type Result<T> = std::result::Result<T, AlignError>;
