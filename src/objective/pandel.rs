use std::f64::consts::LN_10;

use tracing::error;

use crate::{cpandel::PandelPsiEvaluator, event::Hit, geometry::TrackParameters};

use super::Objective;

/// Total Convoluted Pandel psi of the trial track over the selected hits.
///
/// Psi is `−10 log10` of the likelihood, so one standard deviation corresponds to an
/// objective change of `5/ln 10` dB.
#[derive(Debug)]
pub struct PandelLikelihoodObjective<'a> {
    hits: &'a [&'a Hit],
    evaluator: &'a PandelPsiEvaluator,
}

impl<'a> PandelLikelihoodObjective<'a> {
    pub fn new(hits: &'a [&'a Hit], evaluator: &'a PandelPsiEvaluator) -> Self {
        PandelLikelihoodObjective { hits, evaluator }
    }
}

impl Objective for PandelLikelihoodObjective<'_> {
    fn value(&self, x: &[f64]) -> f64 {
        let track = TrackParameters::from_fit_vector(x);
        match self.evaluator.psi_sum(&track, self.hits.iter().copied()) {
            Ok(psi) => psi,
            Err(err) => {
                error!(%err, "psi evaluation failed, trial point discarded");
                f64::INFINITY
            }
        }
    }

    fn error_def(&self) -> f64 {
        5.0 / LN_10
    }
}

#[cfg(test)]
mod pandel_objective_tests {
    use super::*;
    use crate::{
        event::{DetectorKind, OpticalModule},
        psi_stats::PsiStatistics,
    };
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_value_matches_total_psi() {
        let evaluator = PandelPsiEvaluator::default();
        let track = TrackParameters::new(Vector3::new(1.0, 2.0, 3.0), Vector3::x(), 10.0);
        let hits: Vec<Hit> = [(20.0, 5.0, 0.0, 90.0), (60.0, -30.0, 10.0, 400.0), (0.0, 0.0, 50.0, -20.0)]
            .iter()
            .map(|&(x, y, z, le)| {
                Hit::new(OpticalModule::new(DetectorKind::Amanda, Vector3::new(x, y, z)), le)
            })
            .collect();
        let refs: Vec<&Hit> = hits.iter().collect();

        let obj = PandelLikelihoodObjective::new(&refs, &evaluator);
        let mut stats = PsiStatistics::new();
        let total = evaluator.total_psi(&track, refs.iter().copied(), &mut stats).unwrap();

        assert_relative_eq!(obj.value(&track.to_fit_vector()), total, max_relative = 1e-12);
        assert_eq!(stats.n(), 3);
        assert_relative_eq!(obj.error_def(), 2.1714724095162588, max_relative = 1e-12);
    }

    #[test]
    fn test_nan_trial_is_infinite() {
        let evaluator = PandelPsiEvaluator::default();
        let hit = Hit::new(OpticalModule::new(DetectorKind::InIce, Vector3::new(5.0, 0.0, 0.0)), 0.0);
        let refs = [&hit];
        let obj = PandelLikelihoodObjective::new(&refs, &evaluator);
        assert_eq!(obj.value(&[f64::NAN, 0.0, 0.0, 0.0, 0.0, 0.0]), f64::INFINITY);
    }
}
