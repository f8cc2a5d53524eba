//! Time-frequency grids.
//!
//! A grid is indexed by a time-shift axis τ (length `M`) and a frequency
//! axis ν (length `N`). Values are stored row-major with one row per
//! frequency and one column per time shift:
//!
//! ```text
//!   ν_{N-1} │ z[N-1,0]  z[N-1,1]  …  z[N-1,M-1]
//!     ⋮     │    ⋮
//!   ν_1     │ z[1,0]    z[1,1]    …  z[1,M-1]
//!   ν_0     │ z[0,0]    z[0,1]    …  z[0,M-1]
//!           └─────────────────────────────────── τ
//!             τ_0       τ_1          τ_{M-1}
//! ```
//!
//! Grids only check their shape on construction. Whether the axes are
//! strictly increasing is checked by the operations that depend on it
//! (resampling, inverse transforms), so that a malformed grid fails at
//! the point where it would corrupt a result.

use std::fmt;

use crate::error::{MisfitError, MisfitResult};
use crate::types::Complex;

/// Grid axis identifier, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Time-shift axis
    Tau,
    /// Frequency axis
    Nu,
    /// Time axis of an input trace
    Time,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Tau => write!(f, "tau"),
            Axis::Nu => write!(f, "nu"),
            Axis::Time => write!(f, "time"),
        }
    }
}

/// Check that `values` has at least `min` samples and is strictly increasing.
///
/// NaN coordinates fail the monotonicity check.
pub fn check_axis(axis: Axis, values: &[f64], min: usize) -> MisfitResult<()> {
    if values.len() < min {
        return Err(MisfitError::AxisTooShort {
            axis,
            len: values.len(),
            min,
        });
    }
    for (i, w) in values.windows(2).enumerate() {
        if !(w[1] > w[0]) {
            return Err(MisfitError::NonMonotonicAxis { axis, index: i + 1 });
        }
    }
    Ok(())
}

/// Check that `values` is strictly increasing with a constant step and
/// return that step.
pub fn uniform_step(axis: Axis, values: &[f64]) -> MisfitResult<f64> {
    check_axis(axis, values, 2)?;
    let step = values[1] - values[0];
    let tol = 1e-6 * step;
    for (i, w) in values.windows(2).enumerate().skip(1) {
        if ((w[1] - w[0]) - step).abs() > tol {
            return Err(MisfitError::NonUniformAxis { axis, index: i + 1 });
        }
    }
    Ok(step)
}

/// Complex time-frequency grid.
#[derive(Debug, Clone, PartialEq)]
pub struct TfGrid {
    tau: Vec<f64>,
    nu: Vec<f64>,
    values: Vec<Complex>,
}

impl TfGrid {
    /// Create a grid from its axes and row-major values.
    pub fn new(tau: Vec<f64>, nu: Vec<f64>, values: Vec<Complex>) -> MisfitResult<Self> {
        let expected = tau.len() * nu.len();
        if values.len() != expected {
            return Err(MisfitError::LengthMismatch {
                what: "grid values",
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { tau, nu, values })
    }

    /// Create a grid by evaluating `f(j_nu, k_tau)` at every cell.
    pub fn from_fn<F>(tau: Vec<f64>, nu: Vec<f64>, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> Complex,
    {
        let n_tau = tau.len();
        let values = (0..nu.len() * n_tau)
            .map(|idx| f(idx / n_tau, idx % n_tau))
            .collect();
        Self { tau, nu, values }
    }

    /// Time-shift coordinates.
    pub fn tau(&self) -> &[f64] {
        &self.tau
    }

    /// Frequency coordinates.
    pub fn nu(&self) -> &[f64] {
        &self.nu
    }

    /// Row-major cell values.
    pub fn values(&self) -> &[Complex] {
        &self.values
    }

    /// Number of time shifts (columns).
    pub fn n_tau(&self) -> usize {
        self.tau.len()
    }

    /// Number of frequencies (rows).
    pub fn n_nu(&self) -> usize {
        self.nu.len()
    }

    /// `(n_nu, n_tau)`
    pub fn shape(&self) -> (usize, usize) {
        (self.nu.len(), self.tau.len())
    }

    /// Value at frequency row `j`, time-shift column `k`.
    pub fn get(&self, j: usize, k: usize) -> Complex {
        self.values[j * self.tau.len() + k]
    }

    /// Whether both grids sit on identical (τ, ν) coordinates.
    pub fn same_coordinates(&self, other: &TfGrid) -> bool {
        self.tau == other.tau && self.nu == other.nu
    }

    /// Error unless `other` shares this grid's coordinates.
    pub fn ensure_compatible(&self, other: &TfGrid, what: &str) -> MisfitResult<()> {
        if self.same_coordinates(other) {
            Ok(())
        } else {
            Err(MisfitError::GridMismatch(format!(
                "{what}: {}x{} grid vs {}x{} grid on different coordinates",
                self.n_nu(),
                self.n_tau(),
                other.n_nu(),
                other.n_tau()
            )))
        }
    }

    /// Largest magnitude in the grid (NaN cells are skipped).
    pub fn max_norm(&self) -> f64 {
        self.values.iter().map(|v| v.norm()).fold(0.0, f64::max)
    }

    /// Real parts as a field on the same shape.
    pub fn real_part(&self) -> RealField {
        self.map_field(|z| z.re)
    }

    /// Imaginary parts as a field on the same shape.
    pub fn imag_part(&self) -> RealField {
        self.map_field(|z| z.im)
    }

    /// Apply `f` to every cell, producing a real field of the same shape.
    pub fn map_field<F: Fn(Complex) -> f64>(&self, f: F) -> RealField {
        RealField {
            n_nu: self.n_nu(),
            n_tau: self.n_tau(),
            values: self.values.iter().map(|&z| f(z)).collect(),
        }
    }

    /// Consume the grid, returning `(tau, nu, values)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>, Vec<Complex>) {
        (self.tau, self.nu, self.values)
    }
}

/// Real-valued field sharing the shape of a [`TfGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct RealField {
    n_nu: usize,
    n_tau: usize,
    values: Vec<f64>,
}

impl RealField {
    /// Create a field from row-major values.
    pub fn new(n_nu: usize, n_tau: usize, values: Vec<f64>) -> MisfitResult<Self> {
        if values.len() != n_nu * n_tau {
            return Err(MisfitError::LengthMismatch {
                what: "field values",
                expected: n_nu * n_tau,
                actual: values.len(),
            });
        }
        Ok(Self { n_nu, n_tau, values })
    }

    /// A field of zeros.
    pub fn zeros(n_nu: usize, n_tau: usize) -> Self {
        Self {
            n_nu,
            n_tau,
            values: vec![0.0; n_nu * n_tau],
        }
    }

    /// `(n_nu, n_tau)`
    pub fn shape(&self) -> (usize, usize) {
        (self.n_nu, self.n_tau)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn get(&self, j: usize, k: usize) -> f64 {
        self.values[j * self.n_tau + k]
    }

    /// Element-wise product. Panics if shapes differ.
    pub fn product(&self, other: &RealField) -> RealField {
        assert_eq!(self.shape(), other.shape(), "field shapes differ");
        RealField {
            n_nu: self.n_nu,
            n_tau: self.n_tau,
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| a * b)
                .collect(),
        }
    }

    /// Maximum value, skipping NaN. `None` for an empty field.
    pub fn max(&self) -> Option<f64> {
        self.values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f64::max)
    }

    /// Maximum absolute value, skipping NaN (0 for an empty field).
    pub fn max_abs(&self) -> f64 {
        self.values.iter().map(|v| v.abs()).fold(0.0, f64::max)
    }

    /// Largest absolute first difference between neighbouring τ columns.
    pub fn max_abs_diff_tau(&self) -> f64 {
        self.values
            .chunks(self.n_tau.max(1))
            .flat_map(|row| row.windows(2).map(|w| (w[1] - w[0]).abs()))
            .fold(0.0, f64::max)
    }

    /// Largest absolute first difference between neighbouring ν rows.
    pub fn max_abs_diff_nu(&self) -> f64 {
        let n_tau = self.n_tau;
        (n_tau..self.values.len())
            .map(|idx| (self.values[idx] - self.values[idx - n_tau]).abs())
            .fold(0.0, f64::max)
    }

    /// Sum of squared values.
    pub fn sum_of_squares(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(n: usize, step: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 * step).collect()
    }

    #[test]
    fn test_check_axis_accepts_increasing() {
        assert!(check_axis(Axis::Tau, &[0.0, 1.0, 2.5], 2).is_ok());
    }

    #[test]
    fn test_check_axis_rejects_repeat_and_nan() {
        assert_eq!(
            check_axis(Axis::Tau, &[0.0, 1.0, 1.0], 2),
            Err(MisfitError::NonMonotonicAxis { axis: Axis::Tau, index: 2 })
        );
        assert!(matches!(
            check_axis(Axis::Nu, &[0.0, f64::NAN, 2.0], 2),
            Err(MisfitError::NonMonotonicAxis { axis: Axis::Nu, index: 1 })
        ));
        assert!(matches!(
            check_axis(Axis::Nu, &[0.0], 2),
            Err(MisfitError::AxisTooShort { len: 1, min: 2, .. })
        ));
    }

    #[test]
    fn test_uniform_step() {
        assert_eq!(uniform_step(Axis::Tau, &axis(5, 0.5)), Ok(0.5));
        assert!(matches!(
            uniform_step(Axis::Tau, &[0.0, 1.0, 2.0, 3.5]),
            Err(MisfitError::NonUniformAxis { index: 3, .. })
        ));
    }

    #[test]
    fn test_grid_shape_and_indexing() {
        let grid = TfGrid::from_fn(axis(4, 1.0), axis(3, 0.1), |j, k| {
            Complex::new(j as f64, k as f64)
        });
        assert_eq!(grid.shape(), (3, 4));
        assert_eq!(grid.get(2, 1), Complex::new(2.0, 1.0));
        assert!(TfGrid::new(axis(4, 1.0), axis(3, 0.1), vec![Complex::new(0.0, 0.0); 11]).is_err());
    }

    #[test]
    fn test_compatibility() {
        let a = TfGrid::from_fn(axis(4, 1.0), axis(3, 0.1), |_, _| Complex::new(1.0, 0.0));
        let b = TfGrid::from_fn(axis(4, 2.0), axis(3, 0.1), |_, _| Complex::new(1.0, 0.0));
        assert!(a.ensure_compatible(&a.clone(), "self").is_ok());
        assert!(matches!(
            a.ensure_compatible(&b, "shifted"),
            Err(MisfitError::GridMismatch(_))
        ));
    }

    #[test]
    fn test_field_differences() {
        // 2 rows (nu) x 3 columns (tau)
        let field = RealField::new(2, 3, vec![0.0, 0.5, 0.4, 0.1, 0.2, 1.4]).unwrap();
        assert!((field.max_abs_diff_tau() - 1.2).abs() < 1e-12);
        assert!((field.max_abs_diff_nu() - 1.0).abs() < 1e-12);
        assert_eq!(field.max(), Some(1.4));
    }

    #[test]
    fn test_field_max_skips_nan() {
        let field = RealField::new(1, 3, vec![0.2, f64::NAN, -0.9]).unwrap();
        assert_eq!(field.max(), Some(0.2));
        assert_eq!(field.max_abs(), 0.9);
    }
}
