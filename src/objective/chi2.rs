use std::cell::Cell;

use crate::{
    constants::{Nanosecond, TIME_JITTER},
    event::Hit,
    geometry::{CherenkovGeometry, TrackParameters},
};

use super::Objective;

/// Chi-squared of the hit time residuals for a straight Cherenkov track.
///
/// ```text
/// chi2 = Σ ((le − tgeo) / sigma_t)²
/// ```
///
/// Hits without owning module do not contribute. Every evaluation stores the trial
/// track, which can be read back with [`ChiSquareObjective::last_trial`].
#[derive(Debug)]
pub struct ChiSquareObjective<'a> {
    hits: &'a [&'a Hit],
    geometry: CherenkovGeometry,
    sigma_t: Nanosecond,
    last_trial: Cell<Option<TrackParameters>>,
}

impl<'a> ChiSquareObjective<'a> {
    pub fn new(hits: &'a [&'a Hit], geometry: CherenkovGeometry) -> Self {
        ChiSquareObjective {
            hits,
            geometry,
            sigma_t: TIME_JITTER,
            last_trial: Cell::new(None),
        }
    }

    pub fn with_time_resolution(mut self, sigma_t: Nanosecond) -> Self {
        self.sigma_t = sigma_t;
        self
    }

    /// Chi-squared of a track hypothesis.
    pub fn chi2(&self, track: &TrackParameters) -> f64 {
        self.last_trial.set(Some(*track));
        self.hits
            .iter()
            .filter_map(|hit| self.geometry.residual(track, hit))
            .map(|(_, tres)| (tres / self.sigma_t).powi(2))
            .sum()
    }

    /// Track of the latest evaluation, `None` before the first one.
    pub fn last_trial(&self) -> Option<TrackParameters> {
        self.last_trial.get()
    }
}

impl Objective for ChiSquareObjective<'_> {
    fn value(&self, x: &[f64]) -> f64 {
        self.chi2(&TrackParameters::from_fit_vector(x))
    }
}

#[cfg(test)]
mod chi2_tests {
    use super::*;
    use crate::event::{DetectorKind, OpticalModule};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_chi2_of_shifted_times() {
        let geom = CherenkovGeometry::default();
        let track = TrackParameters::new(Vector3::zeros(), Vector3::z(), 50.0);

        let hits: Vec<Hit> = (0..4)
            .map(|i| {
                let pos = Vector3::new(15.0, 0.0, 10.0 * i as f64);
                let module = OpticalModule::new(DetectorKind::InIce, pos);
                let tgeo = geom.project(&track, &pos).tgeo;
                Hit::new(module, tgeo + 20.0)
            })
            .chain(std::iter::once(Hit::orphan(1e5)))
            .collect();
        let refs: Vec<&Hit> = hits.iter().collect();

        let obj = ChiSquareObjective::new(&refs, geom);
        assert!(obj.last_trial().is_none());
        // 4 hits off by 2 sigma each, orphan ignored
        assert_relative_eq!(obj.value(&track.to_fit_vector()), 16.0, epsilon = 1e-9);

        let trial = obj.last_trial().unwrap();
        assert_relative_eq!(trial.t0, 50.0);
        assert_relative_eq!(trial.direction, Vector3::z(), epsilon = 1e-12);

        // Same residuals are 1 sigma off with a 20 ns resolution
        let coarse = ChiSquareObjective::new(&refs, geom).with_time_resolution(20.0);
        assert_relative_eq!(coarse.value(&track.to_fit_vector()), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_chi2_without_hits_is_zero() {
        let obj = ChiSquareObjective::new(&[], CherenkovGeometry::new(false));
        assert_eq!(obj.value(&[0.0, 0.0, 0.0, 1.0, 1.0, 0.0]), 0.0);
        assert_eq!(obj.error_def(), 1.0);
    }
}
