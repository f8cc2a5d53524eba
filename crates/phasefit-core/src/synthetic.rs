//! Synthetic test signals.
//!
//! Gaussian wave packets on a regular time axis, used by the examples,
//! benchmarks and tests.

use std::f64::consts::PI;

/// Regular time axis from `start` to `end` inclusive with step `dt`.
///
/// The number of samples is `round((end - start) / dt) + 1`, so an `end`
/// that is not a whole number of steps away is approached, not exceeded
/// by more than half a step.
pub fn time_axis(start: f64, end: f64, dt: f64) -> Vec<f64> {
    if !(dt > 0.0) || !(end >= start) {
        return Vec::new();
    }
    let n = ((end - start) / dt).round() as usize + 1;
    (0..n).map(|i| start + i as f64 * dt).collect()
}

/// Gaussian wave packet `exp(−((t − c) / σ)²) · sin(2π f (t − c))`.
pub fn wave_packet(t: &[f64], center: f64, frequency: f64, sigma: f64) -> Vec<f64> {
    t.iter()
        .map(|&x| {
            let s = x - center;
            (-(s / sigma).powi(2)).exp() * (2.0 * PI * frequency * s).sin()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_time_axis_inclusive() {
        let t = time_axis(0.0, 6000.0, 6.0);
        assert_eq!(t.len(), 1001);
        assert_eq!(t[0], 0.0);
        assert_relative_eq!(t[1000], 6000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_time_axis_degenerate() {
        assert!(time_axis(0.0, 10.0, 0.0).is_empty());
        assert!(time_axis(10.0, 0.0, 1.0).is_empty());
        assert_eq!(time_axis(5.0, 5.0, 1.0), vec![5.0]);
    }

    #[test]
    fn test_wave_packet_shape() {
        let t = time_axis(0.0, 100.0, 1.0);
        let p = wave_packet(&t, 50.0, 0.05, 10.0);
        assert_eq!(p[50], 0.0);
        // quarter period after the centre
        assert_relative_eq!(p[55], (-0.25f64).exp(), epsilon = 1e-12);
        assert!(p[0].abs() < 1e-10);
    }
}
