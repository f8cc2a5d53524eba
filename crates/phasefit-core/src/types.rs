//! Core numeric types shared across the crate.

use num_complex::Complex64;

/// Complex amplitude of a time-frequency grid cell.
pub type Complex = Complex64;

/// Machine epsilon, used to regularise divisions and logarithms.
pub const EPS: f64 = f64::EPSILON;

/// Helpers for the complex arithmetic used by the misfit.
pub mod complex_ops {
    use super::{Complex, EPS};

    /// Instantaneous phase of `z`, regularised so that `z = 0` maps to 0.
    ///
    /// Equivalent to `Im(ln(ε + z / (ε + |z|)))`.
    #[inline]
    pub fn regularized_phase(z: Complex) -> f64 {
        (z / (EPS + z.norm()) + EPS).ln().im
    }

    /// L2 norm of a slice of complex values.
    pub fn l2_norm(values: &[Complex]) -> f64 {
        values.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::complex_ops::*;
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_regularized_phase_of_zero() {
        assert_eq!(regularized_phase(Complex::new(0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_regularized_phase_positive_real() {
        assert_eq!(regularized_phase(Complex::new(3.5, 0.0)), 0.0);
    }

    #[test]
    fn test_regularized_phase_quadrature() {
        assert_relative_eq!(regularized_phase(Complex::new(0.0, 2.0)), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(regularized_phase(Complex::new(0.0, -2.0)), -FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_l2_norm() {
        let v = [Complex::new(3.0, 4.0), Complex::new(0.0, 0.0)];
        assert_relative_eq!(l2_norm(&v), 5.0);
    }
}
