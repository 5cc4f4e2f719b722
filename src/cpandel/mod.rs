//! # Convoluted Pandel psi evaluation
//!
//! Scores a track hypothesis against the arrival times of its hits with the Gauss
//! **Convoluted Pandel** probability density, which describes the delay of photons in a
//! scattering and absorbing medium smeared by a Gaussian time jitter.
//!
//! ## Overview
//!
//! For each hit, the evaluator
//!
//! 1. projects the hit on the track ([`CherenkovGeometry::project`]),
//! 2. forms the reduced distance `ksi = d / lambda` and the time residual `tres = le − tgeo`,
//! 3. clamps `(ksi, tres)` into the validity rectangle `ksi ∈ [0, 50]`,
//!    `tres ∈ [−25σ, 3500]` ([`ClampedPoint`]),
//! 4. evaluates the density with the expression of the matching [`PandelRegion`],
//! 5. converts it to a plausibility `psi = −10 log10(cpandel)` in dB, adding the configured
//!    penalty when the point had to be clamped.
//!
//! The sum of the hit contributions is the Bayesian psi of the track: lower is better.
//!
//! ## Regions
//!
//! Regions are tested in the order below, the first match wins:
//!
//! | Region | Domain |
//! |---|---|
//! | [`ZeroDistance`](PandelRegion::ZeroDistance) | `ksi ≤ 0` |
//! | [`Exact`](PandelRegion::Exact) | `ksi ≤ 5`, `−5σ ≤ tres ≤ 30σ` |
//! | [`LateTail`](PandelRegion::LateTail) | `ksi ≤ 1`, `30σ < tres ≤ 3500` |
//! | [`EarlyTail`](PandelRegion::EarlyTail) | `ksi ≤ 1`, `−25σ ≤ tres < −5σ` |
//! | [`AsymptoticLate`](PandelRegion::AsymptoticLate) | `ksi ≤ 50`, `0 ≤ tres ≤ 3500` |
//! | [`AsymptoticEarly`](PandelRegion::AsymptoticEarly) | `ksi ≤ 50`, `−25σ ≤ tres < 0` |
//!
//! Together they cover the whole clamped rectangle. A point matching none of them (only NaN
//! can) is reported as [`PandelFitError::RegionPartition`].
//!
//! ## See also
//!
//! * [`PsiStatistics`] – aggregation of the per-hit psi values.
//! * [`PandelLikelihoodObjective`](crate::objective::pandel::PandelLikelihoodObjective) – total psi as a fit objective.

pub(crate) mod regions;
pub mod special;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{
    constants::{
        Decibel, Meter, Nanosecond, ABSORPTION_LENGTH, C_ICE, KSI_MAX, PANDEL_TAU,
        SCATTERING_LENGTH, TIME_JITTER, TRES_MAX, TRES_MIN_SIGMAS,
    },
    event::Hit,
    geometry::{CherenkovGeometry, TrackParameters},
    pandelfit_errors::PandelFitError,
    psi_stats::PsiStatistics,
};

use regions::Kernel;

/// Optical properties of the medium entering the Pandel density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediumParams {
    /// Effective scattering length `lambda` (m)
    pub scattering_length: Meter,
    /// Absorption length `labs` (m)
    pub absorption_length: Meter,
    /// Pandel time scale `tau` (ns)
    pub tau: Nanosecond,
    /// Gaussian time jitter `sigma` (ns)
    pub time_jitter: Nanosecond,
}

impl MediumParams {
    /// Inverse characteristic time `rho = 1/tau + c_ice/labs` in 1/ns.
    pub fn rho(&self) -> f64 {
        1.0 / self.tau + C_ICE / self.absorption_length
    }

    /// Lower edge of the residual axis, `−25σ`.
    pub fn tres_min(&self) -> Nanosecond {
        -TRES_MIN_SIGMAS * self.time_jitter
    }
}

impl Default for MediumParams {
    fn default() -> Self {
        MediumParams {
            scattering_length: SCATTERING_LENGTH,
            absorption_length: ABSORPTION_LENGTH,
            tau: PANDEL_TAU,
            time_jitter: TIME_JITTER,
        }
    }
}

/// Sub-domain of the `(ksi, tres)` plane with its own expression of the density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PandelRegion {
    ZeroDistance,
    Exact,
    LateTail,
    EarlyTail,
    AsymptoticLate,
    AsymptoticEarly,
}

/// A `(ksi, tres)` point moved inside the validity rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampedPoint {
    pub ksi: f64,
    pub tres: Nanosecond,
    /// True if at least one coordinate had to be moved
    pub clamped: bool,
}

impl ClampedPoint {
    /// Clamp `(ksi, tres)` into `[0, 50] × [−25σ, 3500]`.
    pub fn clamp(ksi: f64, tres: Nanosecond, sigma: Nanosecond) -> Self {
        let tres_min = -TRES_MIN_SIGMAS * sigma;
        let mut clamped = false;

        let tres = if tres < tres_min {
            clamped = true;
            tres_min
        } else if tres > TRES_MAX {
            clamped = true;
            TRES_MAX
        } else {
            tres
        };

        let ksi = if ksi > KSI_MAX {
            clamped = true;
            KSI_MAX
        } else if ksi < 0.0 {
            clamped = true;
            0.0
        } else {
            ksi
        };

        ClampedPoint { ksi, tres, clamped }
    }
}

/// Region containing `(ksi, tres)`, `None` for points outside every region.
pub fn select_region(ksi: f64, tres: Nanosecond, sigma: Nanosecond) -> Option<PandelRegion> {
    let tres_min = -TRES_MIN_SIGMAS * sigma;
    let early = tres >= tres_min;

    if ksi <= 0.0 {
        Some(PandelRegion::ZeroDistance)
    } else if ksi <= 5.0 && tres >= -5.0 * sigma && tres <= 30.0 * sigma {
        Some(PandelRegion::Exact)
    } else if ksi <= 1.0 && tres > 30.0 * sigma && tres <= TRES_MAX {
        Some(PandelRegion::LateTail)
    } else if ksi <= 1.0 && early && tres < -5.0 * sigma {
        Some(PandelRegion::EarlyTail)
    } else if ksi <= KSI_MAX && tres >= 0.0 && tres <= TRES_MAX {
        Some(PandelRegion::AsymptoticLate)
    } else if ksi <= KSI_MAX && early && tres < 0.0 {
        Some(PandelRegion::AsymptoticEarly)
    } else {
        None
    }
}

/// `−10 log10(cpandel)` for a positive density, `0` otherwise.
pub fn psi_from_density(cpandel: f64) -> Decibel {
    if cpandel > 0.0 {
        -10.0 * cpandel.log10()
    } else {
        0.0
    }
}

/// Outcome of scoring one `(ksi, tres)` point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitScore {
    /// The point after clamping
    pub point: ClampedPoint,
    pub region: PandelRegion,
    pub cpandel: f64,
    /// Psi contribution in dB, penalty included
    pub psi: Decibel,
}

impl HitScore {
    pub fn clamped(&self) -> bool {
        self.point.clamped
    }
}

/// Per-hit psi evaluator for a given medium, geometry and clamp penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PandelPsiEvaluator {
    geometry: CherenkovGeometry,
    medium: MediumParams,
    penalty: Decibel,
    kernel: Kernel,
}

impl PandelPsiEvaluator {
    /// Arguments
    /// -----------------
    /// * `geometry`: light propagation model used to project hits on a track.
    /// * `medium`: optical properties of the medium.
    /// * `penalty`: psi added (in dB) to each hit whose `(ksi, tres)` had to be clamped.
    pub fn new(geometry: CherenkovGeometry, medium: MediumParams, penalty: Decibel) -> Self {
        PandelPsiEvaluator {
            geometry,
            medium,
            penalty,
            kernel: Kernel {
                rho: medium.rho(),
                sigma: medium.time_jitter,
            },
        }
    }

    pub fn geometry(&self) -> &CherenkovGeometry {
        &self.geometry
    }

    pub fn medium(&self) -> &MediumParams {
        &self.medium
    }

    pub fn penalty(&self) -> Decibel {
        self.penalty
    }

    /// Convoluted Pandel density at a point of the validity rectangle.
    ///
    /// No clamping is applied: callers pass a point already inside the rectangle.
    ///
    /// Return
    /// ----------
    /// * The region used and the density value.
    /// * [`PandelFitError::RegionPartition`] if no region contains the point.
    pub fn cpandel(&self, ksi: f64, tres: Nanosecond) -> Result<(PandelRegion, f64), PandelFitError> {
        let k = &self.kernel;
        let region = select_region(ksi, tres, k.sigma).ok_or_else(|| {
            error!(ksi, tres, "point outside every Convoluted Pandel region");
            PandelFitError::RegionPartition { ksi, tres }
        })?;

        let value = match region {
            PandelRegion::ZeroDistance => k.zero_distance(tres),
            PandelRegion::Exact => k.exact(ksi, tres),
            PandelRegion::LateTail => k.late_tail(ksi, tres),
            PandelRegion::EarlyTail => k.early_tail(ksi, tres),
            PandelRegion::AsymptoticLate => k.asymptotic_late(ksi, tres),
            PandelRegion::AsymptoticEarly => k.asymptotic_early(ksi, tres),
        };
        Ok((region, value))
    }

    /// Clamp, evaluate and convert a raw `(ksi, tres)` point into a psi contribution.
    pub fn psi_at(&self, ksi: f64, tres: Nanosecond) -> Result<HitScore, PandelFitError> {
        let point = ClampedPoint::clamp(ksi, tres, self.kernel.sigma);
        let (region, cpandel) = self.cpandel(point.ksi, point.tres)?;

        let mut psi = psi_from_density(cpandel);
        if point.clamped {
            psi += self.penalty;
        }

        Ok(HitScore {
            point,
            region,
            cpandel,
            psi,
        })
    }

    /// Score one hit against a track.
    ///
    /// Return
    /// ----------
    /// * `Ok(None)` for a hit without owning module.
    /// * `Ok(Some(score))` otherwise.
    pub fn score(&self, track: &TrackParameters, hit: &Hit) -> Result<Option<HitScore>, PandelFitError> {
        match self.geometry.residual(track, hit) {
            Some((proj, tres)) => {
                let ksi = proj.distance / self.medium.scattering_length;
                self.psi_at(ksi, tres).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Total psi of a track over `hits`, entering every contribution into `stats`.
    ///
    /// Arguments
    /// -----------------
    /// * `track`: the track hypothesis.
    /// * `hits`: hits associated with the track; hits without module are skipped.
    /// * `stats`: aggregator receiving each per-hit psi.
    ///
    /// Return
    /// ----------
    /// * The sum of the per-hit psi values.
    pub fn total_psi<'h>(
        &self,
        track: &TrackParameters,
        hits: impl IntoIterator<Item = &'h Hit>,
        stats: &mut PsiStatistics,
    ) -> Result<Decibel, PandelFitError> {
        let mut total = 0.0;
        for hit in hits {
            if let Some(score) = self.score(track, hit)? {
                stats.enter(score.psi);
                total += score.psi;
            }
        }
        Ok(total)
    }

    /// Total psi of a track without keeping per-hit statistics.
    pub fn psi_sum<'h>(
        &self,
        track: &TrackParameters,
        hits: impl IntoIterator<Item = &'h Hit>,
    ) -> Result<Decibel, PandelFitError> {
        hits.into_iter().try_fold(0.0, |acc, hit| {
            Ok(acc + self.score(track, hit)?.map_or(0.0, |s| s.psi))
        })
    }
}

impl Default for PandelPsiEvaluator {
    fn default() -> Self {
        Self::new(CherenkovGeometry::default(), MediumParams::default(), 0.0)
    }
}
