//! Time-frequency weighting window.
//!
//! The window combines three factors on the cross-correlation grid and is
//! normalised to a peak of one:
//!
//! ```text
//! W = (1 − exp(−|cc|² / m²))          noise taper, m = max|cc| / divisor
//!   · (1 − exp(−ν² / ν_hp²))          high-pass
//!   · exp(−(ν − ν0)⁴ / ν0⁴)  for ν > ν0, 1 otherwise   low-pass
//! ```

use serde::{Deserialize, Serialize};

use crate::error::MisfitResult;
use crate::grid::{RealField, TfGrid};
use crate::transform::positive;

/// Constants of the weighting window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightingConfig {
    /// Noise floor is the peak cross-correlation amplitude divided by this
    pub noise_divisor: f64,
    /// High-pass corner frequency (Hz)
    pub highpass_corner: f64,
    /// Low-pass transition frequency ν0 (Hz)
    pub lowpass_corner: f64,
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self {
            noise_divisor: 10.0,
            highpass_corner: 0.002,
            lowpass_corner: 0.005,
        }
    }
}

impl WeightingConfig {
    pub fn validate(&self) -> MisfitResult<()> {
        positive("noise_divisor", self.noise_divisor)?;
        positive("highpass_corner", self.highpass_corner)?;
        positive("lowpass_corner", self.lowpass_corner)
    }

    /// High-pass factor at frequency `nu`.
    pub fn highpass(&self, nu: f64) -> f64 {
        1.0 - (-(nu / self.highpass_corner).powi(2)).exp()
    }

    /// Low-pass factor at frequency `nu`: smooth roll-off above ν0, unity below.
    pub fn lowpass(&self, nu: f64) -> f64 {
        let nu0 = self.lowpass_corner;
        if nu > nu0 {
            (-((nu - nu0) / nu0).powi(4)).exp()
        } else {
            1.0
        }
    }
}

/// Real weighting window on the grid of a cross-correlation transform.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightingWindow {
    field: RealField,
}

impl WeightingWindow {
    /// Build the window for `cc`.
    ///
    /// A grid without a positive finite peak has no signal to weight and
    /// gives an all-zero window.
    pub fn build(cc: &TfGrid, config: &WeightingConfig) -> Self {
        let (n_nu, n_tau) = cc.shape();
        let floor = cc.max_norm() / config.noise_divisor;
        if !(floor > 0.0) || !floor.is_finite() {
            return Self {
                field: RealField::zeros(n_nu, n_tau),
            };
        }

        let band: Vec<f64> = cc
            .nu()
            .iter()
            .map(|&nu| config.highpass(nu) * config.lowpass(nu))
            .collect();
        let mut field = cc.map_field(|z| 1.0 - (-z.norm_sqr() / (floor * floor)).exp());
        for (row, gain) in field.values_mut().chunks_mut(n_tau.max(1)).zip(&band) {
            row.iter_mut().for_each(|w| *w *= gain);
        }

        if let Some(peak) = field.max().filter(|p| *p > 0.0 && p.is_finite()) {
            field.values_mut().iter_mut().for_each(|w| *w /= peak);
        }
        Self { field }
    }

    pub fn field(&self) -> &RealField {
        &self.field
    }

    pub fn into_field(self) -> RealField {
        self.field
    }

    /// Peak value (1 after normalisation, 0 for an empty window).
    pub fn peak(&self) -> f64 {
        self.field.max().unwrap_or(0.0)
    }
}
