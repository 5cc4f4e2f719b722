//! # pandelfit
//!
//! Straight track reconstruction from timed Cherenkov detector hits.
//!
//! First guess tracks are refined by minimizing the chi-squared of the hit time residuals,
//! and every fitted track is scored with the Gauss **Convoluted Pandel** density, which
//! yields a Bayesian plausibility `psi` (dB) used to rank or filter the reconstructed tracks.
//!
//! ## Modules
//!
//! - [`geometry`] – track parametrization, perpendicular distance and Cherenkov arrival time
//! - [`objective`] – chi-squared and Pandel psi objectives handed to the minimizer
//! - [`minimizer`] – two-phase (simplex + Hesse) minimizer contract and its `argmin` adapter
//! - [`cpandel`] – piecewise Convoluted Pandel evaluation with clamping and penalty
//! - [`psi_stats`] – running statistics of the per-hit psi values
//! - [`chi2_fitter`] – per event orchestration of hit selection, fit and scoring
//! - [`event`] – hits, first guess tracks and the event store interface
//! - [`fit_params`] – validated fit configuration
//! - [`fit_result`] – fitted tracks and their statistics

pub mod chi2_fitter;
pub mod constants;
pub mod cpandel;
pub mod event;
pub mod fit_params;
pub mod fit_result;
pub mod geometry;
pub mod minimizer;
pub mod objective;
pub mod pandelfit_errors;
pub mod psi_stats;
