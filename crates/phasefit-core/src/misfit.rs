//! # Time-Frequency Phase Misfit
//!
//! Phase misfit and adjoint source after Fichtner et al. (2008).
//!
//! ```text
//! data, w·synth ──► cross-correlation TF ──► resample onto synth grid ──┐
//!                                                                       ▼
//! w·synth ──► TF ───────────────────────────────┐       W (weights), DP (phase diff)
//! synth   ──► TF ─────────────────────────┐     │             │
//!                                         ▼     ▼             ▼
//!                         IDP = W²·DP·TF(w·synth) / (ε + |TF(synth)|²)   Ep = ‖W·DP‖
//!                                         │
//!                                         ▼
//!              inverse TF ─► Im ─► spline onto t ─► /Ep ─► d/dt ─► ·kill ─► reverse
//! ```
//!
//! Three independent gates act on the result:
//!
//! | condition                         | misfit      | kill flag |
//! |-----------------------------------|-------------|-----------|
//! | jump criterion above threshold    | unchanged   | discard   |
//! | misfit not finite                 | forced to 0 | keep      |
//! | misfit above upper bound          | unchanged   | discard   |
//!
//! The gates are applied in that order, so a non-finite misfit resets a
//! discard raised by the jump criterion.
//!
//! ## Example
//!
//! ```rust
//! use phasefit_core::prelude::*;
//! use phasefit_core::synthetic::{time_axis, wave_packet};
//!
//! let t = time_axis(0.0, 6000.0, 6.0);
//! let data = wave_packet(&t, 3000.0, 0.005, 600.0);
//! let synth = wave_packet(&t, 3005.0, 0.005, 600.0);
//! let traces = TaperedTraces::new(&t, &data, &synth, &synth);
//!
//! let params = TransformParams::new(20.0, 200.0, 0.01);
//! let result = PhaseMisfit::default()
//!     .compute(&GaborTransform::default(), &traces, &params)
//!     .unwrap();
//! assert_eq!(result.samples.len(), t.len());
//! assert!(result.misfit > 0.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{MisfitError, MisfitResult};
use crate::grid::{check_axis, Axis, RealField, TfGrid};
use crate::interpolate::{resample_grid, QuadraticSpline};
use crate::phase::{phase_difference, phase_jump_criterion};
use crate::transform::{positive, Reconstruction, TimeFrequencyTransform, TransformParams};
use crate::types::{Complex, EPS};
use crate::weighting::{WeightingConfig, WeightingWindow};

/// Gate on the adjoint-source contribution of one trace pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KillFlag {
    /// Contribution is used
    Keep,
    /// Contribution is zeroed
    Discard,
}

impl KillFlag {
    /// 1.0 for [`KillFlag::Keep`], 0.0 for [`KillFlag::Discard`].
    pub fn factor(self) -> f64 {
        match self {
            KillFlag::Keep => 1.0,
            KillFlag::Discard => 0.0,
        }
    }

    pub fn is_discarded(self) -> bool {
        self == KillFlag::Discard
    }
}

/// Misfit settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MisfitConfig {
    /// Weighting window constants
    pub weighting: WeightingConfig,
    /// Criterion above which a phase jump is assumed
    pub phase_jump_threshold: f64,
    /// Misfits above this discard the adjoint source
    pub misfit_upper_bound: f64,
    /// Run the three forward transforms on the rayon pool
    pub concurrent_transforms: bool,
}

impl Default for MisfitConfig {
    fn default() -> Self {
        Self {
            weighting: WeightingConfig::default(),
            phase_jump_threshold: 0.7,
            misfit_upper_bound: 2.0,
            concurrent_transforms: false,
        }
    }
}

impl MisfitConfig {
    pub fn validate(&self) -> MisfitResult<()> {
        self.weighting.validate()?;
        positive("phase_jump_threshold", self.phase_jump_threshold)?;
        positive("misfit_upper_bound", self.misfit_upper_bound)
    }
}

/// Windowed traces of one station/component, sampled on a common time axis.
#[derive(Debug, Clone, Copy)]
pub struct TaperedTraces<'a> {
    /// Time axis, strictly increasing
    pub t: &'a [f64],
    /// Observed data
    pub data: &'a [f64],
    /// Synthetic seismogram
    pub synthetic: &'a [f64],
    /// Synthetic multiplied by an external envelope
    pub weighted_synthetic: &'a [f64],
}

impl<'a> TaperedTraces<'a> {
    pub fn new(
        t: &'a [f64],
        data: &'a [f64],
        synthetic: &'a [f64],
        weighted_synthetic: &'a [f64],
    ) -> Self {
        Self {
            t,
            data,
            synthetic,
            weighted_synthetic,
        }
    }

    /// Check lengths and the time axis.
    pub fn validate(&self) -> MisfitResult<()> {
        check_axis(Axis::Time, self.t, 2)?;
        for (what, trace) in [
            ("data", self.data),
            ("synthetic", self.synthetic),
            ("weighted synthetic", self.weighted_synthetic),
        ] {
            if trace.len() != self.t.len() {
                return Err(MisfitError::LengthMismatch {
                    what,
                    expected: self.t.len(),
                    actual: trace.len(),
                });
            }
        }
        Ok(())
    }
}

/// Result of one adjoint-source computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjointSource {
    /// Adjoint source, same length and sampling as the input time axis
    pub samples: Vec<f64>,
    /// Phase misfit `Ep`
    pub misfit: f64,
    /// Whether the contribution is kept
    pub kill: KillFlag,
    /// Phase-jump criterion
    pub criterion: f64,
    /// Iterations used by the inverse transform
    pub inverse_iterations: usize,
    /// Relative residual of the inverse transform
    pub inverse_residual: f64,
}

impl AdjointSource {
    /// True when every sample is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.samples.iter().all(|&v| v == 0.0)
    }
}

/// Forward transforms of one evaluation.
struct Spectra {
    cross: TfGrid,
    weighted: TfGrid,
    synthetic: TfGrid,
}

/// Phase misfit and adjoint source computer.
#[derive(Debug, Clone, Default)]
pub struct PhaseMisfit {
    config: MisfitConfig,
}

impl PhaseMisfit {
    pub fn new(config: MisfitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MisfitConfig {
        &self.config
    }

    /// Compute misfit, kill flag and adjoint source for one trace pair.
    ///
    /// Fails only on precondition violations: invalid parameters,
    /// mismatched inputs, or malformed grids from `provider`.
    pub fn compute<P>(
        &self,
        provider: &P,
        traces: &TaperedTraces<'_>,
        params: &TransformParams,
    ) -> MisfitResult<AdjointSource>
    where
        P: TimeFrequencyTransform + ?Sized,
    {
        params.validate()?;
        self.config.validate()?;
        traces.validate()?;

        let _span = tracing::debug_span!("phase_misfit", n_samples = traces.t.len()).entered();

        let spectra = self.forward_transforms(provider, traces, params)?;
        spectra
            .weighted
            .ensure_compatible(&spectra.synthetic, "weighted synthetic vs synthetic")?;
        let tau = spectra.synthetic.tau();
        let nu = spectra.synthetic.nu();
        check_axis(Axis::Nu, nu, 2)?;

        let cc = resample_grid(&spectra.cross, tau, nu)?;
        let window = WeightingWindow::build(&cc, &self.config.weighting);
        let dp = phase_difference(&cc);
        let weighted_phase = window.field().product(&dp);

        let criterion = phase_jump_criterion(&weighted_phase);
        tracing::debug!(criterion, "phase jump criterion");
        let mut kill = KillFlag::Keep;
        if criterion > self.config.phase_jump_threshold {
            tracing::warn!(
                criterion,
                threshold = self.config.phase_jump_threshold,
                "possible phase jump"
            );
            kill = KillFlag::Discard;
        }

        let dnu = nu[1] - nu[0];
        let mut misfit = (weighted_phase.sum_of_squares() * params.dt_new * dnu).sqrt();
        if !misfit.is_finite() {
            tracing::warn!(misfit, "non-finite phase misfit, reset to zero");
            misfit = 0.0;
            kill = KillFlag::Keep;
        }
        tracing::info!(misfit, "phase misfit");

        if misfit > self.config.misfit_upper_bound {
            tracing::warn!(
                misfit,
                bound = self.config.misfit_upper_bound,
                "misfit exceeds upper bound, adjoint source discarded"
            );
            kill = KillFlag::Discard;
        }

        let kernel = adjoint_kernel(
            window.field(),
            &dp,
            &spectra.weighted,
            &spectra.synthetic,
        )?;
        let recon = provider.inverse(&kernel, params)?;
        tracing::debug!(
            iterations = recon.iterations,
            residual = recon.residual,
            "inverse transform"
        );

        let samples = time_domain_source(traces.t, kernel.tau(), &recon, misfit, kill)?;
        Ok(AdjointSource {
            samples,
            misfit,
            kill,
            criterion,
            inverse_iterations: recon.iterations,
            inverse_residual: recon.residual,
        })
    }

    fn forward_transforms<P>(
        &self,
        provider: &P,
        traces: &TaperedTraces<'_>,
        params: &TransformParams,
    ) -> MisfitResult<Spectra>
    where
        P: TimeFrequencyTransform + ?Sized,
    {
        let cross = || {
            provider.transform_cross_correlation(
                traces.t,
                traces.data,
                traces.weighted_synthetic,
                params,
            )
        };
        let weighted = || provider.transform(traces.t, traces.weighted_synthetic, params);
        let synthetic = || provider.transform(traces.t, traces.synthetic, params);

        let (cross, (weighted, synthetic)) = if self.config.concurrent_transforms {
            rayon::join(cross, || rayon::join(weighted, synthetic))
        } else {
            (cross(), (weighted(), synthetic()))
        };
        Ok(Spectra {
            cross: cross?,
            weighted: weighted?,
            synthetic: synthetic?,
        })
    }
}

/// Kernel of the inverse transform, `W²·DP·TF(w·synth) / (ε + |TF(synth)|²)`.
fn adjoint_kernel(
    window: &RealField,
    dp: &RealField,
    weighted: &TfGrid,
    synthetic: &TfGrid,
) -> MisfitResult<TfGrid> {
    let values: Vec<Complex> = window
        .values()
        .iter()
        .zip(dp.values())
        .zip(weighted.values().iter().zip(synthetic.values()))
        .map(|((&w, &p), (&tw, &ts))| tw * (w * w * p / (EPS + ts.norm_sqr())))
        .collect();
    TfGrid::new(synthetic.tau().to_vec(), synthetic.nu().to_vec(), values)
}

/// Turn the inverse transform into the adjoint source on `t`.
///
/// Imaginary part, spline onto `t`, divide by the misfit, forward
/// difference, apply the kill flag, reverse in time and restore the
/// length with a leading zero.
fn time_domain_source(
    t: &[f64],
    tau: &[f64],
    recon: &Reconstruction,
    misfit: f64,
    kill: KillFlag,
) -> MisfitResult<Vec<f64>> {
    if recon.signal.len() != tau.len() {
        return Err(MisfitError::LengthMismatch {
            what: "inverse transform samples",
            expected: tau.len(),
            actual: recon.signal.len(),
        });
    }
    let imag: Vec<f64> = recon.signal.iter().map(|z| z.im).collect();
    let spline = QuadraticSpline::new(tau, &imag)?;
    let resampled = spline.eval_many(t)?;

    if kill.is_discarded() {
        return Ok(vec![0.0; t.len()]);
    }

    let scale = kill.factor() / ((misfit + EPS) * (t[1] - t[0]));
    let mut samples = Vec::with_capacity(t.len());
    samples.push(0.0);
    samples.extend(resampled.windows(2).rev().map(|w| (w[1] - w[0]) * scale));
    Ok(samples)
}
