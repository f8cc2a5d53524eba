//! Grid resampling and 1-D spline interpolation.
//!
//! Two interpolants are needed by the misfit:
//!
//! - [`RectBilinear`]: order-1 tensor-product interpolation on a
//!   rectangular grid with zero smoothing. Points outside the grid are
//!   clamped to its boundary.
//! - [`QuadraticSpline`]: interpolating quadratic B-spline with knots at
//!   the midpoints between data sites. Points outside the data range are
//!   rejected.

use crate::error::{MisfitError, MisfitResult};
use crate::grid::{check_axis, Axis, TfGrid};
use crate::types::Complex;

/// Locate `x` on a strictly increasing axis.
///
/// Returns the left cell index and the fractional position inside that
/// cell, clamped to `[0, 1]`.
fn bracket(axis: &[f64], x: f64) -> (usize, f64) {
    let last = axis.len() - 1;
    if !(x > axis[0]) {
        return (0, 0.0);
    }
    if x >= axis[last] {
        return (last - 1, 1.0);
    }
    let i = axis.partition_point(|&a| a <= x) - 1;
    (i, (x - axis[i]) / (axis[i + 1] - axis[i]))
}

/// Bilinear interpolant over a rectangular grid.
#[derive(Debug, Clone)]
pub struct RectBilinear<'a> {
    x: &'a [f64],
    y: &'a [f64],
    /// Row-major, one row per `y`
    z: &'a [f64],
}

impl<'a> RectBilinear<'a> {
    /// Build the interpolant. Both axes must be strictly increasing.
    pub fn new(x: &'a [f64], y: &'a [f64], z: &'a [f64]) -> MisfitResult<Self> {
        check_axis(Axis::Tau, x, 2)?;
        check_axis(Axis::Nu, y, 2)?;
        if z.len() != x.len() * y.len() {
            return Err(MisfitError::LengthMismatch {
                what: "bilinear grid values",
                expected: x.len() * y.len(),
                actual: z.len(),
            });
        }
        Ok(Self { x, y, z })
    }

    /// Evaluate at a single point.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        let (i, fx) = bracket(self.x, x);
        let (j, fy) = bracket(self.y, y);
        self.blend(i, fx, j, fy)
    }

    /// Evaluate on the tensor product `ys × xs`, row-major by `ys`.
    pub fn eval_grid(&self, xs: &[f64], ys: &[f64]) -> Vec<f64> {
        let xb: Vec<(usize, f64)> = xs.iter().map(|&x| bracket(self.x, x)).collect();
        let mut out = Vec::with_capacity(xs.len() * ys.len());
        for &y in ys {
            let (j, fy) = bracket(self.y, y);
            out.extend(xb.iter().map(|&(i, fx)| self.blend(i, fx, j, fy)));
        }
        out
    }

    #[inline]
    fn blend(&self, i: usize, fx: f64, j: usize, fy: f64) -> f64 {
        let nx = self.x.len();
        let z00 = self.z[j * nx + i];
        let z01 = self.z[j * nx + i + 1];
        let z10 = self.z[(j + 1) * nx + i];
        let z11 = self.z[(j + 1) * nx + i + 1];
        let lower = z00 + (z01 - z00) * fx;
        let upper = z10 + (z11 - z10) * fx;
        lower + (upper - lower) * fy
    }
}

/// Resample a complex grid onto new `(tau, nu)` coordinates.
///
/// Real and imaginary parts are interpolated independently and then
/// combined into a fresh grid; the input is left untouched.
pub fn resample_grid(grid: &TfGrid, tau: &[f64], nu: &[f64]) -> MisfitResult<TfGrid> {
    let re = grid.real_part();
    let im = grid.imag_part();
    let re = RectBilinear::new(grid.tau(), grid.nu(), re.values())?.eval_grid(tau, nu);
    let im = RectBilinear::new(grid.tau(), grid.nu(), im.values())?.eval_grid(tau, nu);
    let values = re
        .into_iter()
        .zip(im)
        .map(|(r, i)| Complex::new(r, i))
        .collect();
    TfGrid::new(tau.to_vec(), nu.to_vec(), values)
}

/// Interpolating quadratic B-spline.
///
/// Knots are `x0` (triple), the midpoints between interior data sites,
/// and `x_{n-1}` (triple). The collocation matrix is tridiagonal and
/// is solved with the Thomas algorithm.
#[derive(Debug, Clone)]
pub struct QuadraticSpline {
    knots: Vec<f64>,
    coeffs: Vec<f64>,
    lo: f64,
    hi: f64,
}

impl QuadraticSpline {
    const DEGREE: usize = 2;

    /// Fit the spline through `(x, y)`. Needs at least three points.
    pub fn new(x: &[f64], y: &[f64]) -> MisfitResult<Self> {
        check_axis(Axis::Tau, x, 3)?;
        if y.len() != x.len() {
            return Err(MisfitError::LengthMismatch {
                what: "spline ordinates",
                expected: x.len(),
                actual: y.len(),
            });
        }
        let n = x.len();

        let mut knots = Vec::with_capacity(n + 3);
        knots.extend_from_slice(&[x[0]; 3]);
        knots.extend((2..n - 1).map(|i| 0.5 * (x[i - 1] + x[i])));
        knots.extend_from_slice(&[x[n - 1]; 3]);

        // Clamped ends interpolate their coefficient directly, so rows 0
        // and n-1 are identity rows.
        let mut sub = vec![0.0; n];
        let mut diag = vec![1.0; n];
        let mut sup = vec![0.0; n];
        for i in 1..n - 1 {
            let basis = basis_functions(&knots, i + 1, x[i]);
            sub[i] = basis[0];
            diag[i] = basis[1];
            sup[i] = basis[2];
        }
        let coeffs = solve_tridiagonal(&sub, &diag, &sup, y)?;

        Ok(Self {
            knots,
            coeffs,
            lo: x[0],
            hi: x[n - 1],
        })
    }

    /// Interpolation range `[lo, hi]`.
    pub fn range(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    /// Evaluate at `x`.
    pub fn eval(&self, x: f64) -> MisfitResult<f64> {
        let tol = 1e-9 * (self.hi - self.lo);
        if !(x >= self.lo - tol && x <= self.hi + tol) {
            return Err(MisfitError::OutOfRange {
                x,
                lo: self.lo,
                hi: self.hi,
            });
        }
        let x = x.clamp(self.lo, self.hi);
        let n = self.coeffs.len();
        let span = (self.knots.partition_point(|&k| k <= x).saturating_sub(1))
            .clamp(Self::DEGREE, n - 1);
        let basis = basis_functions(&self.knots, span, x);
        Ok(basis
            .iter()
            .zip(&self.coeffs[span - Self::DEGREE..=span])
            .map(|(b, c)| b * c)
            .sum())
    }

    /// Evaluate at every point of `xs`.
    pub fn eval_many(&self, xs: &[f64]) -> MisfitResult<Vec<f64>> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}

/// Non-zero degree-2 B-spline basis values at `x` inside knot span `span`
/// (Cox–de Boor recursion). Entry `r` belongs to basis function
/// `span - 2 + r`.
fn basis_functions(knots: &[f64], span: usize, x: f64) -> [f64; 3] {
    let mut n = [1.0, 0.0, 0.0];
    let mut left = [0.0; 3];
    let mut right = [0.0; 3];
    for j in 1..=2 {
        left[j] = x - knots[span + 1 - j];
        right[j] = knots[span + j] - x;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let temp = if denom != 0.0 { n[r] / denom } else { 0.0 };
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }
    n
}

/// Solve a tridiagonal system. `sub[0]` and `sup[n-1]` are ignored.
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> MisfitResult<Vec<f64>> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];

    for i in 0..n {
        let (a, prev_c, prev_d) = if i == 0 { (0.0, 0.0, 0.0) } else { (sub[i], c[i - 1], d[i - 1]) };
        let pivot = diag[i] - a * prev_c;
        if pivot == 0.0 || !pivot.is_finite() {
            return Err(MisfitError::SingularSystem(i));
        }
        c[i] = sup[i] / pivot;
        d[i] = (rhs[i] - a * prev_d) / pivot;
    }

    let mut x = d;
    for i in (0..n - 1).rev() {
        x[i] -= c[i] * x[i + 1];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn axis(n: usize, start: f64, step: f64) -> Vec<f64> {
        (0..n).map(|i| start + i as f64 * step).collect()
    }

    #[test]
    fn test_bilinear_reproduces_plane() {
        let x = axis(5, 0.0, 1.0);
        let y = axis(4, 10.0, 2.0);
        let z: Vec<f64> = y
            .iter()
            .flat_map(|&yy| x.iter().map(move |&xx| 2.0 * xx - 0.5 * yy + 1.0))
            .collect();
        let interp = RectBilinear::new(&x, &y, &z).unwrap();
        assert_relative_eq!(interp.eval(1.25, 13.0), 2.5 - 6.5 + 1.0, epsilon = 1e-12);
        assert_relative_eq!(interp.eval(3.9, 10.1), 7.8 - 5.05 + 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bilinear_clamps_outside() {
        let x = [0.0, 1.0];
        let y = [0.0, 1.0];
        let z = [0.0, 1.0, 2.0, 3.0];
        let interp = RectBilinear::new(&x, &y, &z).unwrap();
        assert_eq!(interp.eval(-5.0, -5.0), 0.0);
        assert_eq!(interp.eval(5.0, 5.0), 3.0);
        assert_eq!(interp.eval(5.0, 0.0), 1.0);
    }

    #[test]
    fn test_bilinear_rejects_non_monotonic() {
        let x = [0.0, 2.0, 1.0];
        let y = [0.0, 1.0];
        let z = [0.0; 6];
        assert!(matches!(
            RectBilinear::new(&x, &y, &z),
            Err(MisfitError::NonMonotonicAxis { axis: Axis::Tau, index: 2 })
        ));
    }

    #[test]
    fn test_resample_grid_keeps_complex_parts() {
        let tau = axis(3, 0.0, 1.0);
        let nu = axis(3, 0.0, 1.0);
        let grid = TfGrid::from_fn(tau, nu, |j, k| Complex::new(k as f64, -(j as f64)));
        let out = resample_grid(&grid, &[0.5, 1.5], &[0.25]).unwrap();
        assert_eq!(out.shape(), (1, 2));
        assert_relative_eq!(out.get(0, 0).re, 0.5, epsilon = 1e-12);
        assert_relative_eq!(out.get(0, 0).im, -0.25, epsilon = 1e-12);
        assert_relative_eq!(out.get(0, 1).re, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_quadratic_spline_interpolates_data() {
        let x = axis(9, 0.0, 0.7);
        let y: Vec<f64> = x.iter().map(|v| v.sin()).collect();
        let spline = QuadraticSpline::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert_relative_eq!(spline.eval(*xi).unwrap(), *yi, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_quadratic_spline_reproduces_parabola() {
        let x = [0.0, 0.5, 1.7, 2.0, 3.1, 4.0];
        let y: Vec<f64> = x.iter().map(|v| 1.0 - 2.0 * v + 0.75 * v * v).collect();
        let spline = QuadraticSpline::new(&x, &y).unwrap();
        for &probe in &[0.1, 0.9, 1.85, 2.6, 3.99] {
            let expected = 1.0 - 2.0 * probe + 0.75 * probe * probe;
            assert_relative_eq!(spline.eval(probe).unwrap(), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_quadratic_spline_three_points() {
        let spline = QuadraticSpline::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0]).unwrap();
        assert_relative_eq!(spline.eval(1.5).unwrap(), 2.25, epsilon = 1e-12);
    }

    #[test]
    fn test_quadratic_spline_out_of_range() {
        let spline = QuadraticSpline::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 0.0]).unwrap();
        assert!(matches!(spline.eval(2.5), Err(MisfitError::OutOfRange { .. })));
        assert!(spline.eval(2.0).is_ok());
        assert!(QuadraticSpline::new(&[0.0, 1.0], &[0.0, 1.0]).is_err());
    }
}
