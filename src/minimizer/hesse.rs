//! Finite-difference curvature analysis of an objective at its best point.
//!
//! Derivatives are taken in external coordinates with central differences, using a
//! displacement of a tenth of each parameter step.
//!
//! ```text
//! H_ii = (f(x + h_i) − 2 f(x) + f(x − h_i)) / h_i²
//! H_ij = (f(x + h_i + h_j) − f(x + h_i − h_j) − f(x − h_i + h_j) + f(x − h_i − h_j)) / (4 h_i h_j)
//! V    = 2 · UP · H⁻¹
//! ```
//!
//! A straight track has an exact flat direction (sliding `r0` along the track while shifting
//! `t0` accordingly), so the inversion goes through the eigen decomposition of the scaled
//! Hessian, with eigenvalues floored when needed.

use nalgebra::{DMatrix, DVector};

use crate::objective::Objective;

use super::{HesseOutcome, ParameterSpec};

/// Fraction of the parameter step used as finite-difference displacement.
const STEP_FRACTION: f64 = 0.1;

/// Smallest eigenvalue of the scaled Hessian accepted as is, relative to the largest.
const MIN_RELATIVE_EIGENVALUE: f64 = 1e-6;

/// Relative value given to the smallest eigenvalue of a forced positive definite matrix.
const FORCED_EIGENVALUE_FLOOR: f64 = 1e-3;

/// Hesse status of an error matrix made positive definite.
pub const HESSE_FORCED_POSDEF: i32 = 3;

fn displacements(parameters: &[ParameterSpec]) -> Vec<f64> {
    parameters.iter().map(|p| STEP_FRACTION * p.step).collect()
}

fn shifted(x: &[f64], moves: &[(usize, f64)]) -> Vec<f64> {
    let mut y = x.to_vec();
    for &(i, d) in moves {
        y[i] += d;
    }
    y
}

/// Gradient and diagonal curvature by central differences.
pub fn gradient_and_diagonal(
    objective: &dyn Objective,
    parameters: &[ParameterSpec],
    x: &[f64],
) -> (DVector<f64>, DVector<f64>) {
    let h = displacements(parameters);
    let f0 = objective.value(x);
    let n = x.len();

    let mut grad = DVector::zeros(n);
    let mut diag = DVector::zeros(n);
    for i in 0..n {
        let fp = objective.value(&shifted(x, &[(i, h[i])]));
        let fm = objective.value(&shifted(x, &[(i, -h[i])]));
        grad[i] = (fp - fm) / (2.0 * h[i]);
        diag[i] = (fp - 2.0 * f0 + fm) / (h[i] * h[i]);
    }
    (grad, diag)
}

/// Full symmetric Hessian by central differences.
pub fn hessian(objective: &dyn Objective, parameters: &[ParameterSpec], x: &[f64]) -> DMatrix<f64> {
    let h = displacements(parameters);
    let n = x.len();
    let (_, diag) = gradient_and_diagonal(objective, parameters, x);

    let mut hess = DMatrix::from_diagonal(&diag);
    for i in 0..n {
        for j in (i + 1)..n {
            let fpp = objective.value(&shifted(x, &[(i, h[i]), (j, h[j])]));
            let fpm = objective.value(&shifted(x, &[(i, h[i]), (j, -h[j])]));
            let fmp = objective.value(&shifted(x, &[(i, -h[i]), (j, h[j])]));
            let fmm = objective.value(&shifted(x, &[(i, -h[i]), (j, -h[j])]));
            let hij = (fpp - fpm - fmp + fmm) / (4.0 * h[i] * h[j]);
            hess[(i, j)] = hij;
            hess[(j, i)] = hij;
        }
    }
    hess
}

/// Estimated distance to the minimum from the diagonal curvature only.
///
/// Coordinates with non-positive curvature do not contribute.
pub fn diagonal_edm(objective: &dyn Objective, parameters: &[ParameterSpec], x: &[f64]) -> f64 {
    let (grad, diag) = gradient_and_diagonal(objective, parameters, x);
    0.5 * grad
        .iter()
        .zip(diag.iter())
        .filter(|(_, &c)| c > 0.0)
        .map(|(g, c)| g * g / c)
        .sum::<f64>()
}

/// Error matrix of `objective` at `best`.
///
/// The Hessian is brought to correlation form (unit diagonal) and diagonalized. When its
/// smallest eigenvalue is not clearly positive, which happens along exact flat directions
/// of the objective, every eigenvalue is shifted so that the smallest one becomes a
/// thousandth of the largest before inversion.
///
/// Return
/// ----------
/// * Status 0 with covariance and errors for a positive definite Hessian.
/// * Status [`HESSE_FORCED_POSDEF`] with covariance and errors when the matrix had to be
///   made positive definite.
/// * Status 1 if the curvature along a parameter is not positive, 2 if the Hessian is not
///   finite; errors are then all zero.
pub fn finite_difference_hesse(
    objective: &dyn Objective,
    parameters: &[ParameterSpec],
    best: &[f64],
) -> HesseOutcome {
    let n = best.len();
    if n == 0 {
        return HesseOutcome::failed(1, n);
    }
    let hess = hessian(objective, parameters, best);

    if hess.iter().any(|v| !v.is_finite()) {
        return HesseOutcome::failed(2, n);
    }
    let diag = hess.diagonal();
    if diag.iter().any(|&c| c <= 0.0) {
        return HesseOutcome::failed(1, n);
    }

    let scale = diag.map(|c| c.sqrt().recip());
    let scaled = DMatrix::from_fn(n, n, |i, j| hess[(i, j)] * scale[i] * scale[j]);
    let eigen = scaled.symmetric_eigen();
    let (min, max) = (eigen.eigenvalues.min(), eigen.eigenvalues.max());

    let (status, shift) = if min > MIN_RELATIVE_EIGENVALUE * max {
        (0, 0.0)
    } else {
        (HESSE_FORCED_POSDEF, FORCED_EIGENVALUE_FLOOR * max - min)
    };
    let inverse_values = eigen.eigenvalues.map(|l| (l + shift).recip());
    let scaled_inverse = &eigen.eigenvectors
        * DMatrix::from_diagonal(&inverse_values)
        * eigen.eigenvectors.transpose();

    let up2 = 2.0 * objective.error_def();
    let covariance =
        DMatrix::from_fn(n, n, |i, j| up2 * scaled_inverse[(i, j)] * scale[i] * scale[j]);

    HesseOutcome {
        status,
        errors: covariance.diagonal().iter().map(|v| v.sqrt()).collect(),
        covariance: Some(covariance),
    }
}

#[cfg(test)]
mod hesse_tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Paraboloid chi-squared with known errors and correlation.
    struct Paraboloid;

    impl Objective for Paraboloid {
        fn value(&self, x: &[f64]) -> f64 {
            let (a, b) = (x[0] - 1.0, x[1] + 2.0);
            // V = [[4, 1], [1, 1]] → H/2 = V⁻¹ = [[1, -1], [-1, 4]] / 3
            (a * a - 2.0 * a * b + 4.0 * b * b) / 3.0
        }
    }

    fn specs() -> [ParameterSpec; 2] {
        [
            ParameterSpec::free("a", 0.0, 0.1),
            ParameterSpec::free("b", 0.0, 0.1),
        ]
    }

    #[test]
    fn test_paraboloid_covariance() {
        let out = finite_difference_hesse(&Paraboloid, &specs(), &[1.0, -2.0]);
        assert_eq!(out.status, 0);
        let cov = out.covariance.unwrap();
        assert_relative_eq!(cov[(0, 0)], 4.0, max_relative = 1e-6);
        assert_relative_eq!(cov[(0, 1)], 1.0, max_relative = 1e-6);
        assert_relative_eq!(cov[(1, 1)], 1.0, max_relative = 1e-6);
        assert_relative_eq!(out.errors[0], 2.0, max_relative = 1e-6);
    }

    #[test]
    fn test_edm_vanishes_at_minimum() {
        assert!(diagonal_edm(&Paraboloid, &specs(), &[1.0, -2.0]).abs() < 1e-12);
        // g = (2/3, -2/3), diagonal curvature (2/3, 8/3)
        assert_relative_eq!(
            diagonal_edm(&Paraboloid, &specs(), &[2.0, -2.0]),
            5.0 / 12.0,
            max_relative = 1e-8
        );
    }

    struct Flat;

    impl Objective for Flat {
        fn value(&self, _x: &[f64]) -> f64 {
            7.0
        }
    }

    #[test]
    fn test_flat_objective_is_singular() {
        let out = finite_difference_hesse(&Flat, &specs(), &[0.0, 0.0]);
        assert_eq!(out.status, 1);
        assert_eq!(out.errors, vec![0.0, 0.0]);
        assert!(out.covariance.is_none());
    }

    /// Only `a − b` and `c` are constrained: `a = b` is a flat valley.
    struct Valley;

    impl Objective for Valley {
        fn value(&self, x: &[f64]) -> f64 {
            (x[0] - x[1]).powi(2) + x[2] * x[2]
        }
    }

    #[test]
    fn test_flat_direction_is_forced_positive_definite() {
        let specs = [
            ParameterSpec::free("a", 0.0, 0.1),
            ParameterSpec::free("b", 0.0, 0.1),
            ParameterSpec::free("c", 0.0, 0.1),
        ];
        let out = finite_difference_hesse(&Valley, &specs, &[0.5, 0.5, 0.0]);
        assert_eq!(out.status, HESSE_FORCED_POSDEF);

        // Scaled Hessian eigenvalues (2, 1, 0) are shifted by 2e-3
        let along_valley = (1.002f64 / (1.002 * 1.002 - 1.0)).sqrt();
        assert_relative_eq!(out.errors[0], along_valley, max_relative = 1e-5);
        assert_relative_eq!(out.errors[1], along_valley, max_relative = 1e-5);
        assert_relative_eq!(out.errors[2], 1.002f64.recip().sqrt(), max_relative = 1e-5);
        assert!(out.covariance.is_some());
    }

    #[test]
    fn test_non_finite_curvature() {
        struct Infinite;
        impl Objective for Infinite {
            fn value(&self, _x: &[f64]) -> f64 {
                f64::INFINITY
            }
        }
        let out = finite_difference_hesse(&Infinite, &specs(), &[0.0, 0.0]);
        assert_eq!(out.status, 2);
        assert_eq!(out.errors, vec![0.0, 0.0]);
    }
}
