//! Gaussian-window (Gabor) time-frequency transform.
//!
//! Forward transform of a signal `s` sampled on a uniform τ axis:
//!
//! ```text
//! F(τ_k, ν_j) = dt/√(2π) · Σ_m s(t_m) · g_k(t_m) · exp(−2πi ν_j (t_m − t_0))
//! g_k(t)      = exp(−(t − τ_k)² / width²),   dropped where g_k < threshold
//! ```
//!
//! The cross-correlation transform multiplies the zero-padded
//! (length `2M − 1`) spectra of both windowed signals, `A · conj(B)`, so
//! its phase is the phase of `a` relative to `b`. Because of the padding
//! its ν axis is finer than the single-signal axis.
//!
//! The inverse is the Gaussian synthesis
//!
//! ```text
//! x(t_m) = √(2π)·dν / Σ_k g_k(t_m)² · Σ_k g_k(t_m) Σ_j K(τ_k, ν_j) exp(2πi ν_j (t_m − t_0))
//! ```
//!
//! refined by Landweber iterations `x ← x + S(K − T x)` while the
//! relative residual keeps shrinking. Only non-negative frequencies are
//! kept, so the synthesis of a real signal's transform is (half) its
//! analytic signal.

use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner, Length};
use serde::{Deserialize, Serialize};

use super::{Reconstruction, TimeFrequencyTransform, TransformParams};
use crate::error::{MisfitError, MisfitResult};
use crate::grid::{check_axis, uniform_step, Axis, TfGrid};
use crate::types::complex_ops::l2_norm;
use crate::types::Complex;

const ZERO: Complex = Complex::new(0.0, 0.0);

/// Settings of the iterative inverse transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InverseConfig {
    /// Upper bound on synthesis passes (the direct synthesis counts as one)
    pub max_iterations: usize,
    /// Stop once an iteration improves the relative residual by less than this
    pub tolerance: f64,
}

impl Default for InverseConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            tolerance: 1e-3,
        }
    }
}

impl InverseConfig {
    pub fn validate(&self) -> MisfitResult<()> {
        if self.max_iterations == 0 {
            return Err(MisfitError::InvalidParameter {
                name: "max_iterations",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        if !(self.tolerance >= 0.0) || !self.tolerance.is_finite() {
            return Err(MisfitError::InvalidParameter {
                name: "tolerance",
                value: self.tolerance,
                reason: "must be non-negative and finite",
            });
        }
        Ok(())
    }
}

/// Symmetric Gaussian window tabulated by sample offset.
#[derive(Debug, Clone)]
struct GaussianWindow {
    weights: Vec<f64>,
}

impl GaussianWindow {
    fn new(dt: f64, len: usize, params: &TransformParams) -> Self {
        let weights = (0..len)
            .map(|d| (-((d as f64 * dt) / params.width).powi(2)).exp())
            .take_while(|&w| w >= params.threshold)
            .collect();
        Self { weights }
    }

    /// Sample range `[lo, hi)` covered by the window centred on `k`.
    fn support(&self, k: usize, len: usize) -> std::ops::Range<usize> {
        let half = self.weights.len().saturating_sub(1);
        k.saturating_sub(half)..(k + half + 1).min(len)
    }

    #[inline]
    fn weight(&self, m: usize, k: usize) -> f64 {
        self.weights[m.abs_diff(k)]
    }
}

/// Gabor transform provider.
#[derive(Debug, Clone, Default)]
pub struct GaborTransform {
    inverse: InverseConfig,
}

impl GaborTransform {
    pub fn new(inverse: InverseConfig) -> Self {
        Self { inverse }
    }

    /// Inverse transform settings.
    pub fn inverse_config(&self) -> &InverseConfig {
        &self.inverse
    }

    /// Uniform τ axis starting at `t[0]` with spacing `dt_new` that reaches
    /// at least `t[last]`.
    pub fn tau_axis(t: &[f64], dt_new: f64) -> MisfitResult<Vec<f64>> {
        check_axis(Axis::Time, t, 2)?;
        let span = t[t.len() - 1] - t[0];
        let n = (span / dt_new - 1e-9).ceil().max(0.0) as usize + 1;
        Ok((0..n).map(|k| t[0] + k as f64 * dt_new).collect())
    }

    /// Linear resampling of `signal` onto `axis`; zero past the end of `t`.
    fn resample(t: &[f64], signal: &[f64], axis: &[f64]) -> MisfitResult<Vec<Complex>> {
        if signal.len() != t.len() {
            return Err(MisfitError::LengthMismatch {
                what: "signal samples",
                expected: t.len(),
                actual: signal.len(),
            });
        }
        let last = t.len() - 1;
        Ok(axis
            .iter()
            .map(|&x| {
                if x > t[last] {
                    return ZERO;
                }
                let i = t.partition_point(|&v| v <= x).saturating_sub(1).min(last - 1);
                let f = (x - t[i]) / (t[i + 1] - t[i]);
                Complex::new(signal[i] * (1.0 - f) + signal[i + 1] * f, 0.0)
            })
            .collect())
    }

    /// Windowed spectra of `samples`, `n_bins` rows by `samples.len()` columns.
    fn analyze(
        samples: &[Complex],
        window: &GaussianWindow,
        fft: &Arc<dyn Fft<f64>>,
        n_bins: usize,
        dt: f64,
    ) -> Vec<Complex> {
        let n = samples.len();
        let fft_len = fft.len();
        let scale = dt / (2.0 * PI).sqrt();
        let mut buffer = vec![ZERO; fft_len];
        let mut scratch = vec![ZERO; fft.get_inplace_scratch_len()];
        let mut out = vec![ZERO; n_bins * n];

        for k in 0..n {
            buffer.fill(ZERO);
            for m in window.support(k, n) {
                buffer[m] = samples[m] * window.weight(m, k);
            }
            fft.process_with_scratch(&mut buffer, &mut scratch);
            for (j, bin) in buffer.iter().take(n_bins).enumerate() {
                out[j * n + k] = *bin * scale;
            }
        }
        out
    }

    /// Gaussian synthesis of a kernel with `n_bins` rows and `n` columns.
    fn synthesize(
        kernel: &[Complex],
        window: &GaussianWindow,
        ifft: &Arc<dyn Fft<f64>>,
        n_bins: usize,
        dt: f64,
    ) -> Vec<Complex> {
        let n = ifft.len();
        let dnu = 1.0 / (n as f64 * dt);
        let mut buffer = vec![ZERO; n];
        let mut scratch = vec![ZERO; ifft.get_inplace_scratch_len()];
        let mut acc = vec![ZERO; n];
        let mut norm = vec![0.0; n];

        for k in 0..n {
            buffer.fill(ZERO);
            for j in 0..n_bins {
                buffer[j] = kernel[j * n + k];
            }
            ifft.process_with_scratch(&mut buffer, &mut scratch);
            for m in window.support(k, n) {
                let g = window.weight(m, k);
                acc[m] += buffer[m] * g;
                norm[m] += g * g;
            }
        }

        let scale = (2.0 * PI).sqrt() * dnu;
        acc.iter()
            .zip(&norm)
            .map(|(a, &w)| *a * (scale / w))
            .collect()
    }

    fn relative_residual(target: &[Complex], forward: &[Complex], target_norm: f64) -> f64 {
        let diff: f64 = target
            .iter()
            .zip(forward)
            .map(|(a, b)| (*a - *b).norm_sqr())
            .sum();
        diff.sqrt() / target_norm
    }
}

impl TimeFrequencyTransform for GaborTransform {
    fn transform(&self, t: &[f64], signal: &[f64], params: &TransformParams) -> MisfitResult<TfGrid> {
        params.validate()?;
        let tau = Self::tau_axis(t, params.dt_new)?;
        let samples = Self::resample(t, signal, &tau)?;
        let n = tau.len();
        let n_bins = n / 2 + 1;

        let fft = FftPlanner::<f64>::new().plan_fft_forward(n);
        let window = GaussianWindow::new(params.dt_new, n, params);
        let values = Self::analyze(&samples, &window, &fft, n_bins, params.dt_new);

        let nu = (0..n_bins)
            .map(|j| j as f64 / (n as f64 * params.dt_new))
            .collect();
        TfGrid::new(tau, nu, values)
    }

    fn transform_cross_correlation(
        &self,
        t: &[f64],
        a: &[f64],
        b: &[f64],
        params: &TransformParams,
    ) -> MisfitResult<TfGrid> {
        params.validate()?;
        let tau = Self::tau_axis(t, params.dt_new)?;
        let a = Self::resample(t, a, &tau)?;
        let b = Self::resample(t, b, &tau)?;
        let n = tau.len();
        let fft_len = 2 * n - 1;

        let fft = FftPlanner::<f64>::new().plan_fft_forward(fft_len);
        let window = GaussianWindow::new(params.dt_new, n, params);
        let spec_a = Self::analyze(&a, &window, &fft, n, params.dt_new);
        let spec_b = Self::analyze(&b, &window, &fft, n, params.dt_new);
        let values = spec_a
            .iter()
            .zip(&spec_b)
            .map(|(x, y)| *x * y.conj())
            .collect();

        let nu = (0..n)
            .map(|j| j as f64 / (fft_len as f64 * params.dt_new))
            .collect();
        TfGrid::new(tau, nu, values)
    }

    fn inverse(&self, kernel: &TfGrid, params: &TransformParams) -> MisfitResult<Reconstruction> {
        params.validate()?;
        self.inverse.validate()?;
        let dt = uniform_step(Axis::Tau, kernel.tau())?;
        check_axis(Axis::Nu, kernel.nu(), 2)?;
        let n = kernel.n_tau();
        let n_bins = n / 2 + 1;
        if kernel.n_nu() != n_bins {
            return Err(MisfitError::GridMismatch(format!(
                "inverse expects {n_bins} frequencies for {n} time shifts, got {}",
                kernel.n_nu()
            )));
        }

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n);
        let ifft = planner.plan_fft_inverse(n);
        let window = GaussianWindow::new(dt, n, params);
        let target = kernel.values();
        let target_norm = l2_norm(target);

        let mut signal = Self::synthesize(target, &window, &ifft, n_bins, dt);
        if !(target_norm > 0.0) || !target_norm.is_finite() {
            let residual = if target_norm == 0.0 { 0.0 } else { f64::NAN };
            return Ok(Reconstruction {
                signal,
                iterations: 1,
                residual,
            });
        }

        let mut forward = Self::analyze(&signal, &window, &fft, n_bins, dt);
        let mut residual = Self::relative_residual(target, &forward, target_norm);
        let mut iterations = 1;

        while iterations < self.inverse.max_iterations {
            let correction: Vec<Complex> = target.iter().zip(&forward).map(|(k, f)| *k - *f).collect();
            let update = Self::synthesize(&correction, &window, &ifft, n_bins, dt);
            let candidate: Vec<Complex> = signal.iter().zip(&update).map(|(x, u)| *x + *u).collect();
            let candidate_forward = Self::analyze(&candidate, &window, &fft, n_bins, dt);
            let candidate_residual = Self::relative_residual(target, &candidate_forward, target_norm);
            if !(candidate_residual < residual) {
                break;
            }

            let gain = residual - candidate_residual;
            signal = candidate;
            forward = candidate_forward;
            residual = candidate_residual;
            iterations += 1;
            if gain < self.inverse.tolerance {
                break;
            }
        }

        Ok(Reconstruction {
            signal,
            iterations,
            residual,
        })
    }
}
