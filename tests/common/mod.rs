#![allow(dead_code)]

use hifitime::{Epoch, Unit};
use nalgebra::Vector3;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

use pandelfit::{
    constants::HitId,
    event::{DetectorKind, FirstGuessTrack, Hit, IceEvent, OpticalModule},
    geometry::{direction_from_angles, CherenkovGeometry, TrackParameters},
    minimizer::{Minimizer, ParameterSpec, SimplexOutcome},
    objective::Objective,
    pandelfit_errors::PandelFitError,
};

/// Hit time jitter of the synthetic events (ns)
pub const JITTER: f64 = 3.0;

pub fn epoch() -> Epoch {
    Epoch::from_gregorian_utc_at_midnight(2008, 6, 1)
}

pub fn true_track() -> TrackParameters {
    TrackParameters::new(Vector3::new(5.0, -3.0, 10.0), direction_from_angles(2.6, 0.8), 1000.0)
}

/// 3x3 strings, 40 m apart, 17 modules each; the x = -40 string column is Amanda.
pub fn detector_modules() -> Vec<OpticalModule> {
    let mut modules = Vec::new();
    for ix in -1..=1 {
        for iy in -1..=1 {
            let kind = if ix == -1 {
                DetectorKind::Amanda
            } else {
                DetectorKind::InIce
            };
            for iz in -8..=8 {
                let pos = Vector3::new(40.0 * ix as f64, 40.0 * iy as f64, 15.0 * iz as f64);
                modules.push(OpticalModule::new(kind, pos));
            }
        }
    }
    modules
}

/// Event with one hit per module within `max_distance` of `truth`.
///
/// Hit times follow the direct Cherenkov arrival time smeared by a Gaussian jitter.
/// Returns the event and the ids of its hits.
pub fn synthetic_event(seed: u64, truth: &TrackParameters, max_distance: f64) -> (IceEvent, Vec<HitId>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let jitter = Normal::new(0.0, JITTER).unwrap();
    let geometry = CherenkovGeometry::default();

    let mut event = IceEvent::new(epoch());
    let ids = detector_modules()
        .into_iter()
        .filter(|m| truth.distance(&m.position) <= max_distance)
        .map(|m| {
            let tgeo = geometry.project(truth, &m.position).tgeo;
            event.add_hit(Hit::new(m, tgeo + jitter.sample(&mut rng)))
        })
        .collect();
    (event, ids)
}

/// First guess close to `truth`, associated with `hits`.
pub fn first_guess(
    id: u32,
    name: &str,
    truth: &TrackParameters,
    hits: impl IntoIterator<Item = HitId>,
) -> FirstGuessTrack {
    let (theta, phi) = truth.angles();
    FirstGuessTrack::new(
        id,
        name,
        truth.r0 + Vector3::new(1.5, -1.0, 0.5),
        epoch() + (truth.t0 + 4.0) * Unit::Nanosecond,
        direction_from_angles(theta + 0.02, phi - 0.03),
    )
    .with_hits(hits)
}

/// Minimizer returning the seed point unchanged.
pub struct SeedMinimizer;

impl Minimizer for SeedMinimizer {
    fn simplex(
        &self,
        objective: &dyn Objective,
        parameters: &[ParameterSpec],
    ) -> Result<SimplexOutcome, PandelFitError> {
        let values: Vec<f64> = parameters.iter().map(|p| p.value).collect();
        Ok(SimplexOutcome {
            status: 0,
            fcn: objective.value(&values),
            edm: 0.0,
            nvars: parameters.len(),
            values,
        })
    }
}
