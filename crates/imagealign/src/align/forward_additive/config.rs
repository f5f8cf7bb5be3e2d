use serde::{Deserialize, Serialize};

/// How per-pixel contributions are accumulated within one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accumulation {
    /// Single row-major scan.
    Sequential,
    /// Template rows split across rayon workers, partial systems merged at the end.
    ///
    /// Falls back to [`Accumulation::Sequential`] without the `rayon` feature.
    #[default]
    Parallel,
}

/// Configuration for [`ForwardAdditive`](super::ForwardAdditive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardAdditiveConfig {
    /// Accumulation strategy.
    pub accumulation: Accumulation,
    /// Smallest accepted ratio of the smallest to the largest Hessian
    /// eigenvalue. Systems below it fail as degenerate.
    pub min_rcond: f64,
}

impl Default for ForwardAdditiveConfig {
    fn default() -> Self {
        Self {
            accumulation: Accumulation::Parallel,
            min_rcond: 1e-12,
        }
    }
}
