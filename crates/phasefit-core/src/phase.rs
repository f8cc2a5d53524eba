//! Phase difference field and phase-jump detection.

use crate::grid::{RealField, TfGrid};
use crate::types::complex_ops::regularized_phase;

/// Instantaneous phase difference carried by a cross-correlation grid.
///
/// Each cell is `Im(ln(ε + cc / (ε + |cc|)))`, which stays finite for
/// `cc = 0`.
pub fn phase_difference(cc: &TfGrid) -> RealField {
    cc.map_field(regularized_phase)
}

/// Discontinuity measure of the weighted phase difference.
///
/// `W·DP` is normalised by its largest magnitude; the criterion is the
/// largest absolute step between neighbours along either axis. A field
/// that is zero everywhere has criterion 0.
pub fn phase_jump_criterion(weighted_phase: &RealField) -> f64 {
    let peak = weighted_phase.max_abs();
    if !(peak > 0.0) || !peak.is_finite() {
        return 0.0;
    }
    let along_tau = weighted_phase.max_abs_diff_tau();
    let along_nu = weighted_phase.max_abs_diff_nu();
    along_tau.max(along_nu) / peak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Complex;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn axis(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_phase_of_constant_rotation() {
        let cc = TfGrid::from_fn(axis(4), axis(3), |_, _| Complex::from_polar(2.0, 0.4));
        let dp = phase_difference(&cc);
        for v in dp.values() {
            assert_relative_eq!(*v, 0.4, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_smooth_field_has_small_criterion() {
        let field = RealField::new(3, 10, (0..30).map(|i| 1.0 + 0.01 * i as f64).collect()).unwrap();
        assert!(phase_jump_criterion(&field) < 0.1);
    }

    #[test]
    fn test_sign_flip_between_bins() {
        // half-cycle jump between frequency rows 1 and 2
        let cc = TfGrid::from_fn(axis(5), axis(4), |j, _| {
            let phase = if j < 2 { FRAC_PI_2 } else { -FRAC_PI_2 };
            Complex::from_polar(1.0, phase)
        });
        let dp = phase_difference(&cc);
        assert_relative_eq!(phase_jump_criterion(&dp), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_field() {
        assert_eq!(phase_jump_criterion(&RealField::zeros(3, 3)), 0.0);
    }
}
