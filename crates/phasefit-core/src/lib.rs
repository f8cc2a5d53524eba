//! # Time-Frequency Phase Misfit
//!
//! Phase misfit and adjoint source for full-waveform seismic inversion,
//! measured in the time-frequency domain (Fichtner et al., 2008).
//!
//! ## Overview
//!
//! Given a windowed observed trace and the matching synthetic, the
//! library computes:
//!
//! - **Phase misfit**: weighted L2 norm of the time-frequency phase
//!   difference between data and synthetics
//! - **Adjoint source**: time-reversed source whose back-propagation yields
//!   the misfit's sensitivity kernel
//! - **Kill flag**: whether the adjoint source should be used, based on
//!   phase-jump detection and a misfit upper bound
//!
//! The time-frequency engine is pluggable through
//! [`TimeFrequencyTransform`]; [`GaborTransform`] is the built-in
//! Gaussian-window implementation on top of `rustfft`.
//!
//! ## Signal Flow
//!
//! ```text
//! data, synth ─► TF transforms ─► weights, phase difference ─► misfit, kill
//!                                         │
//!                                         ▼
//!                       kernel ─► inverse TF ─► adjoint source
//! ```
//!
//! ## Example
//!
//! ```rust
//! use phasefit_core::prelude::*;
//! use phasefit_core::synthetic::{time_axis, wave_packet};
//!
//! let t = time_axis(0.0, 6000.0, 6.0);
//! let data = wave_packet(&t, 3000.0, 0.005, 600.0);
//! let synth = wave_packet(&t, 3010.0, 0.005, 600.0);
//!
//! let config = PhasefitConfig::default();
//! let computer = PhaseMisfit::new(config.misfit);
//! let provider = GaborTransform::new(config.inverse);
//!
//! let traces = TaperedTraces::new(&t, &data, &synth, &synth);
//! let adjoint = computer.compute(&provider, &traces, &config.transform).unwrap();
//!
//! assert_eq!(adjoint.kill, KillFlag::Keep);
//! assert_eq!(adjoint.samples.len(), t.len());
//! ```

pub mod config;
pub mod error;
pub mod grid;
pub mod interpolate;
pub mod misfit;
pub mod observe;
pub mod phase;
pub mod synthetic;
pub mod transform;
pub mod types;
pub mod weighting;

pub use config::PhasefitConfig;
pub use error::{ConfigError, MisfitError, MisfitResult};
pub use grid::{Axis, RealField, TfGrid};
pub use misfit::{AdjointSource, KillFlag, MisfitConfig, PhaseMisfit, TaperedTraces};
pub use transform::{GaborTransform, InverseConfig, TimeFrequencyTransform, TransformParams};
pub use types::Complex;

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::PhasefitConfig;
    pub use crate::error::{MisfitError, MisfitResult};
    pub use crate::misfit::{AdjointSource, KillFlag, MisfitConfig, PhaseMisfit, TaperedTraces};
    pub use crate::transform::{GaborTransform, TimeFrequencyTransform, TransformParams};
    pub use crate::types::Complex;
}
