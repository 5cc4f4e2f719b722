//! # Fit objectives
//!
//! An [`Objective`] maps the six track parameters `(x, y, z, theta, phi, t0)` to the scalar
//! minimized by a [`Minimizer`](crate::minimizer::Minimizer). Each objective owns the context
//! of a single fit (selected hits, light propagation model), so independent fits never share
//! state.
//!
//! ## Overview
//!
//! - [`chi2::ChiSquareObjective`] – sum of squared normalized time residuals.
//! - [`pandel::PandelLikelihoodObjective`] – total Convoluted Pandel psi of the trial track.

pub mod chi2;
pub mod pandel;

/// Scalar function of the fit parameters.
pub trait Objective {
    /// Objective value at the external parameter vector `x`.
    fn value(&self, x: &[f64]) -> f64;

    /// Objective change defining one standard deviation (`UP`).
    ///
    /// `1` for a chi-squared.
    fn error_def(&self) -> f64 {
        1.0
    }
}
