//! # Time-Frequency Transforms
//!
//! The misfit talks to its time-frequency engine through the
//! [`TimeFrequencyTransform`] trait: a single-signal decomposition, a
//! cross-correlation decomposition of two signals, and an inverse that
//! turns a kernel on the (τ, ν) grid back into a time signal.
//!
//! [`GaborTransform`] is the bundled Gaussian-window implementation.
//! Alternative engines (or test doubles injecting crafted grids) only
//! need to implement the trait.

pub mod gabor;

pub use gabor::{GaborTransform, InverseConfig};

use serde::{Deserialize, Serialize};

use crate::error::{MisfitError, MisfitResult};
use crate::grid::TfGrid;
use crate::types::Complex;

/// Parameters shared by forward and inverse transforms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformParams {
    /// Sample spacing of the τ axis (s)
    pub dt_new: f64,
    /// Effective duration of the Gaussian window (s)
    pub width: f64,
    /// Window values below this are neglected
    pub threshold: f64,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            dt_new: 20.0,
            width: 200.0,
            threshold: 1e-2,
        }
    }
}

impl TransformParams {
    pub fn new(dt_new: f64, width: f64, threshold: f64) -> Self {
        Self {
            dt_new,
            width,
            threshold,
        }
    }

    /// Reject parameters the transforms cannot work with.
    pub fn validate(&self) -> MisfitResult<()> {
        positive("dt_new", self.dt_new)?;
        positive("width", self.width)?;
        positive("threshold", self.threshold)?;
        if self.threshold > 1.0 {
            return Err(MisfitError::InvalidParameter {
                name: "threshold",
                value: self.threshold,
                reason: "must not exceed 1",
            });
        }
        Ok(())
    }
}

pub(crate) fn positive(name: &'static str, value: f64) -> MisfitResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MisfitError::InvalidParameter {
            name,
            value,
            reason: "must be positive and finite",
        })
    }
}

/// Output of an inverse transform.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    /// Complex time signal on the kernel's τ axis
    pub signal: Vec<Complex>,
    /// Refinement iterations performed
    pub iterations: usize,
    /// Final relative residual ‖K − T x‖ / ‖K‖
    pub residual: f64,
}

/// A time-frequency engine.
///
/// All three operations are pure. Implementations must be `Sync` so the
/// forward transforms of one misfit evaluation can run concurrently.
pub trait TimeFrequencyTransform: Sync {
    /// Decompose `signal`, sampled on `t`.
    fn transform(&self, t: &[f64], signal: &[f64], params: &TransformParams) -> MisfitResult<TfGrid>;

    /// Joint decomposition capturing the relative phase of `a` with respect to `b`.
    fn transform_cross_correlation(
        &self,
        t: &[f64],
        a: &[f64],
        b: &[f64],
        params: &TransformParams,
    ) -> MisfitResult<TfGrid>;

    /// Reconstruct a time signal on `kernel.tau()` from a (τ, ν) kernel.
    fn inverse(&self, kernel: &TfGrid, params: &TransformParams) -> MisfitResult<Reconstruction>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        assert!(TransformParams::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_nonpositive() {
        let err = TransformParams::new(1.0, 0.0, 0.1).validate().unwrap_err();
        assert!(matches!(err, MisfitError::InvalidParameter { name: "width", .. }));

        let err = TransformParams::new(1.0, 10.0, -0.1).validate().unwrap_err();
        assert!(matches!(err, MisfitError::InvalidParameter { name: "threshold", .. }));

        let err = TransformParams::new(f64::NAN, 10.0, 0.1).validate().unwrap_err();
        assert!(matches!(err, MisfitError::InvalidParameter { name: "dt_new", .. }));

        assert!(TransformParams::new(1.0, 10.0, 1.5).validate().is_err());
    }
}
