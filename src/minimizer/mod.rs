//! # Two-phase minimization of a fit objective
//!
//! A [`Minimizer`] runs two sequential phases on an [`Objective`]:
//!
//! 1. [`Minimizer::simplex`] – derivative-free descent from the seed parameters,
//!    producing the best point, the objective value `FCN`, the estimated distance to the
//!    minimum `EDM`, the number of variable parameters and a status code.
//! 2. [`Minimizer::hesse`] – curvature analysis at the best point, producing the error
//!    matrix and the per-parameter errors with their own status code.
//!
//! Parameters are described by a [`ParameterSpec`]: a name, a seed value, a step size and
//! optional bounds. Bounded parameters are handled through the sine transform of
//! [`bounds`], so the descent always runs in an unbounded space.
//!
//! ## Status codes
//!
//! | Phase | 0 | non-zero |
//! |---|---|---|
//! | simplex | converged | 4: iteration limit reached, 1: other termination |
//! | hesse | positive definite error matrix | 3: matrix forced positive definite, 1: non-positive curvature, 2: non-finite curvature |
//!
//! Non-zero codes are informative: the descent values are still usable, and so are the
//! errors of a forced positive definite matrix (status 3).
//!
//! ## See also
//!
//! * [`simplex::ArgminSimplex`] – default implementation on top of `argmin`'s Nelder–Mead.
//! * [`hesse::finite_difference_hesse`] – default curvature phase.

pub mod bounds;
pub mod hesse;
pub mod simplex;

use nalgebra::DMatrix;
use smallvec::SmallVec;

use crate::{constants::N_TRACK_PARAMS, objective::Objective, pandelfit_errors::PandelFitError};

pub use hesse::HESSE_FORCED_POSDEF;
pub use simplex::ArgminSimplex;

/// A named fit parameter with its seed, step size and optional bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub value: f64,
    pub step: f64,
    pub bounds: Option<(f64, f64)>,
}

impl ParameterSpec {
    pub fn free(name: &'static str, value: f64, step: f64) -> Self {
        ParameterSpec {
            name,
            value,
            step,
            bounds: None,
        }
    }

    pub fn bounded(name: &'static str, value: f64, step: f64, lower: f64, upper: f64) -> Self {
        ParameterSpec {
            name,
            value,
            step,
            bounds: Some((lower, upper)),
        }
    }

    /// Map an external value to the unbounded internal coordinate.
    pub fn to_internal(&self, external: f64) -> f64 {
        match self.bounds {
            Some((lo, hi)) => bounds::to_internal(external, lo, hi),
            None => external,
        }
    }

    /// Map an internal coordinate back to the external value.
    pub fn to_external(&self, internal: f64) -> f64 {
        match self.bounds {
            Some((lo, hi)) => bounds::to_external(internal, lo, hi),
            None => internal,
        }
    }

    /// Step size expressed in the internal coordinate at the seed value.
    pub fn internal_step(&self) -> f64 {
        match self.bounds {
            Some((lo, hi)) => bounds::internal_step(self.value, self.step, lo, hi),
            None => self.step,
        }
    }
}

/// Parameters of one fit, stored inline for the six track parameters.
pub type ParameterSet = SmallVec<[ParameterSpec; N_TRACK_PARAMS]>;

/// Result of the descent phase.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplexOutcome {
    /// 0 on convergence, non-zero otherwise
    pub status: i32,
    /// Objective value at the best point
    pub fcn: f64,
    /// Estimated vertical distance to the minimum
    pub edm: f64,
    /// Number of variable parameters
    pub nvars: usize,
    /// Best external parameter values
    pub values: Vec<f64>,
}

/// Result of the curvature phase.
#[derive(Debug, Clone, PartialEq)]
pub struct HesseOutcome {
    /// 0 for a positive definite error matrix, 3 if it was forced positive definite,
    /// 1 or 2 if no error matrix could be built
    pub status: i32,
    /// Parameter errors, all zero when no error matrix could be built
    pub errors: Vec<f64>,
    pub covariance: Option<DMatrix<f64>>,
}

impl HesseOutcome {
    /// Failed curvature analysis for `n` parameters.
    pub fn failed(status: i32, n: usize) -> Self {
        HesseOutcome {
            status,
            errors: vec![0.0; n],
            covariance: None,
        }
    }
}

/// Two-phase minimizer contract.
pub trait Minimizer {
    /// Descent from the seed values of `parameters`.
    ///
    /// Arguments
    /// -----------------
    /// * `objective`: function to minimize.
    /// * `parameters`: seed, step and bounds of every parameter, in objective order.
    ///
    /// Return
    /// ----------
    /// * A [`SimplexOutcome`], or [`PandelFitError::Minimizer`] if the descent could not run.
    fn simplex(
        &self,
        objective: &dyn Objective,
        parameters: &[ParameterSpec],
    ) -> Result<SimplexOutcome, PandelFitError>;

    /// Error matrix at `best`.
    fn hesse(
        &self,
        objective: &dyn Objective,
        parameters: &[ParameterSpec],
        best: &[f64],
    ) -> HesseOutcome {
        hesse::finite_difference_hesse(objective, parameters, best)
    }
}

#[cfg(test)]
mod minimizer_tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_free_parameter_is_identity() {
        let p = ParameterSpec::free("r0x", 3.0, 0.1);
        assert_eq!(p.to_internal(3.0), 3.0);
        assert_eq!(p.to_external(-7.5), -7.5);
        assert_eq!(p.internal_step(), 0.1);
    }

    #[test]
    fn test_bounded_parameter_roundtrip() {
        let p = ParameterSpec::bounded("theta", 1.2, 0.001, 0.0, PI);
        let internal = p.to_internal(1.2);
        approx::assert_relative_eq!(p.to_external(internal), 1.2, epsilon = 1e-12);
        assert!(p.internal_step() > 0.0);
    }
}
