//! # Fit results
//!
//! - [`FitStatistics`] – the ten named quality figures attached to every fitted track.
//! - [`FittedTrack`] – a refined track with its parameter errors, hits and statistics.

use std::fmt;

use hifitime::Epoch;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{HitId, Nanosecond, Radian, TrackId},
    geometry::TrackParameters,
    minimizer::{HesseOutcome, SimplexOutcome},
    pandelfit_errors::PandelFitError,
    psi_stats::PsiSummary,
};

/// Quality figures of one fit.
///
/// | Slot | Meaning |
/// |---|---|
/// | `IERFIT` | descent status (0 = converged) |
/// | `FCN` | objective value at the minimum |
/// | `EDM` | estimated distance to the minimum |
/// | `NVARS` | number of variable parameters |
/// | `IERERR` | error matrix status (0 = valid) |
/// | `PsiSum` | total psi of the track (dB) |
/// | `PsiMedian`, `PsiSpread`, `PsiMean`, `PsiSigma` | statistics of the per-hit psi values |
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FitStatistics {
    pub ierfit: i32,
    pub fcn: f64,
    pub edm: f64,
    pub nvars: usize,
    pub iererr: i32,
    pub psi_sum: f64,
    pub psi_median: f64,
    pub psi_spread: f64,
    pub psi_mean: f64,
    pub psi_sigma: f64,
}

impl FitStatistics {
    /// Slot names, in record order.
    pub const SLOT_NAMES: [&'static str; 10] = [
        "IERFIT",
        "FCN",
        "EDM",
        "NVARS",
        "IERERR",
        "PsiSum",
        "PsiMedian",
        "PsiSpread",
        "PsiMean",
        "PsiSigma",
    ];

    pub fn new(simplex: &SimplexOutcome, hesse: &HesseOutcome, psi: &PsiSummary) -> Self {
        FitStatistics {
            ierfit: simplex.status,
            fcn: simplex.fcn,
            edm: simplex.edm,
            nvars: simplex.nvars,
            iererr: hesse.status,
            psi_sum: psi.sum,
            psi_median: psi.median,
            psi_spread: psi.spread,
            psi_mean: psi.mean,
            psi_sigma: psi.sigma,
        }
    }

    /// Value of a slot by name.
    pub fn get(&self, slot: &str) -> Result<f64, PandelFitError> {
        let value = match slot {
            "IERFIT" => self.ierfit as f64,
            "FCN" => self.fcn,
            "EDM" => self.edm,
            "NVARS" => self.nvars as f64,
            "IERERR" => self.iererr as f64,
            "PsiSum" => self.psi_sum,
            "PsiMedian" => self.psi_median,
            "PsiSpread" => self.psi_spread,
            "PsiMean" => self.psi_mean,
            "PsiSigma" => self.psi_sigma,
            other => return Err(PandelFitError::UnknownFitStatistic(other.to_string())),
        };
        Ok(value)
    }

    /// `(name, value)` pairs of all slots, in record order.
    pub fn slots(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        Self::SLOT_NAMES
            .iter()
            .filter_map(move |&name| self.get(name).ok().map(|v| (name, v)))
    }
}

impl fmt::Display for FitStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.slots() {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            write!(f, "{name}={value:.4}")?;
        }
        Ok(())
    }
}

/// A track refined by the fitter.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedTrack {
    pub id: TrackId,
    /// Base name followed by the subsystem suffix (`C`, `A` or `I`)
    pub name: String,
    pub charge: f64,
    /// Id of the first guess track this fit started from
    pub parent: TrackId,
    pub reference_point: Vector3<f64>,
    pub position_errors: Vector3<f64>,
    /// Unit direction of flight
    pub direction: Vector3<f64>,
    pub theta_error: Radian,
    pub phi_error: Radian,
    /// Passage time at the reference point relative to the event time stamp
    pub t0: Nanosecond,
    /// Absolute passage time at the reference point
    pub timestamp: Epoch,
    pub hits: Vec<HitId>,
    pub fit_details: FitStatistics,
}

impl FittedTrack {
    pub fn track_parameters(&self) -> TrackParameters {
        TrackParameters::new(self.reference_point, self.direction, self.t0)
    }

    pub fn psi(&self) -> f64 {
        self.fit_details.psi_sum
    }

    pub fn n_hits(&self) -> usize {
        self.hits.len()
    }
}

#[cfg(test)]
mod fit_result_tests {
    use super::*;

    fn stats() -> FitStatistics {
        FitStatistics {
            ierfit: 4,
            fcn: 12.5,
            edm: 1e-4,
            nvars: 6,
            iererr: 0,
            psi_sum: 140.0,
            psi_median: 18.0,
            psi_spread: 2.5,
            psi_mean: 20.0,
            psi_sigma: 3.0,
        }
    }

    #[test]
    fn test_slot_lookup() {
        let s = stats();
        assert_eq!(s.get("IERFIT"), Ok(4.0));
        assert_eq!(s.get("NVARS"), Ok(6.0));
        assert_eq!(s.get("PsiSum"), Ok(140.0));
        assert_eq!(
            s.get("Chi2"),
            Err(PandelFitError::UnknownFitStatistic("Chi2".into()))
        );
    }

    #[test]
    fn test_exactly_ten_slots_in_order() {
        let names: Vec<&str> = stats().slots().map(|(n, _)| n).collect();
        assert_eq!(names, FitStatistics::SLOT_NAMES.to_vec());
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_display() {
        let text = stats().to_string();
        assert!(text.starts_with("IERFIT=4.0000 FCN=12.5000"));
        assert!(text.ends_with("PsiSigma=3.0000"));
    }
}
