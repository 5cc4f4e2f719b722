//! # Chi-squared track fitter
//!
//! Refines first guess tracks (e.g. from a direct walk) by minimizing the chi-squared of
//! the hit time residuals under a straight Cherenkov track hypothesis, then scores the
//! fitted track with the Convoluted Pandel psi.
//!
//! ## Pipeline
//!
//! For each event accepted by the upstream selector:
//!
//! 1. record the fitter settings as a [`ProcessorRecord`] in the event,
//! 2. for each registered first guess class, take up to the configured number of tracks,
//! 3. for each of them ([`Chi2Fitter::fit_candidate`]):
//!    * gather the candidate hits according to [`HitSelection`] ([`Chi2Fitter::select_hits`]),
//!    * reject the candidate if fewer than 7 hits remain,
//!    * seed the six parameters from the first guess ([`Chi2Fitter::seed_parameters`]),
//!    * run the two minimizer phases on the configured objective,
//!    * build the [`FittedTrack`] and score its hits, filling the [`FitStatistics`],
//! 4. publish the fitted tracks, numbering them after the tracks already in the event.
//!
//! Every attempt goes through the states of [`FitState`]; the outcome of each is returned as
//! a [`FitReport`].
//!
//! ## Example
//!
//! ```rust
//! use hifitime::Epoch;
//! use pandelfit::{chi2_fitter::Chi2Fitter, event::IceEvent, fit_params::FitParams};
//!
//! let fitter = Chi2Fitter::new(FitParams::default());
//! let mut event = IceEvent::new(Epoch::from_gregorian_utc_at_midnight(2008, 6, 1));
//!
//! // No first guess track in the event: nothing is fitted
//! let reports = fitter.process_event(&mut event).unwrap();
//! assert!(reports.is_empty());
//! assert!(event.processor_record("IceChi2").is_some());
//! ```

use std::f64::consts::{PI, TAU};
use std::sync::atomic::{AtomicBool, Ordering};

use hifitime::{Epoch, Unit};
use nalgebra::Vector3;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    constants::{HitId, TrackId, MIN_FIT_HITS},
    cpandel::PandelPsiEvaluator,
    event::{DetectorKind, EventStore, FirstGuessTrack, Hit, ProcessorRecord},
    fit_params::{FitParams, HitSelection, ObjectiveKind},
    fit_result::{FitStatistics, FittedTrack},
    geometry::{angles_from_direction, CherenkovGeometry, TrackParameters},
    minimizer::{
        ArgminSimplex, HesseOutcome, Minimizer, ParameterSet, ParameterSpec, SimplexOutcome,
    },
    objective::{chi2::ChiSquareObjective, pandel::PandelLikelihoodObjective, Objective},
    pandelfit_errors::PandelFitError,
    psi_stats::PsiStatistics,
};

/// Upper bound of the fitted time offset (ns).
const T0_MAX: f64 = 32000.0;

/// Stage reached by a fit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FitState {
    Idle,
    HitsSelected,
    Minimizing,
    Converged,
    Rejected,
    Published,
}

/// Hits gathered for one first guess track and the name suffix they imply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateHits {
    pub ids: Vec<HitId>,
    /// `C` combined, `A` Amanda only, `I` InIce only
    pub suffix: char,
}

/// Outcome of [`Chi2Fitter::fit_candidate`].
#[derive(Debug, Clone, PartialEq)]
pub enum FitAttempt {
    /// Not enough usable hits
    Rejected { parent: TrackId, n_hits: usize },
    /// Minimization done; the track id is assigned at publication
    Fitted(Box<FittedTrack>),
}

impl FitAttempt {
    pub fn state(&self) -> FitState {
        match self {
            FitAttempt::Rejected { .. } => FitState::Rejected,
            FitAttempt::Fitted(_) => FitState::Converged,
        }
    }
}

/// Summary of one attempt after event processing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitReport {
    pub parent: TrackId,
    pub n_hits: usize,
    pub state: FitState,
    /// Id of the published track
    pub track_id: Option<TrackId>,
    pub fit_details: Option<FitStatistics>,
}

/// Name suffix for the subsystems that contributed to a first guess track.
fn subsystem_suffix(amanda: bool, inice: bool) -> Option<char> {
    match (amanda, inice) {
        (true, true) => Some('C'),
        (true, false) => Some('A'),
        (false, true) => Some('I'),
        (false, false) => None,
    }
}

fn is_usable(hit: &Hit) -> bool {
    hit.module.is_some() && hit.is_alive()
}

/// Track fitter holding the configuration and the minimizer.
///
/// The fitter is not modified by fitting: independent events can be processed from several
/// threads with [`Chi2Fitter::process_events`].
#[derive(Debug)]
pub struct Chi2Fitter<M: Minimizer = ArgminSimplex> {
    params: FitParams,
    minimizer: M,
    geometry: CherenkovGeometry,
    evaluator: PandelPsiEvaluator,
    config_logged: AtomicBool,
}

impl Chi2Fitter<ArgminSimplex> {
    /// Fitter using the `argmin` Nelder–Mead minimizer tuned by `params`.
    pub fn new(params: FitParams) -> Self {
        let minimizer = ArgminSimplex::new(params.max_iterations, params.tolerance);
        Self::with_minimizer(params, minimizer)
    }
}

impl<M: Minimizer> Chi2Fitter<M> {
    pub fn with_minimizer(params: FitParams, minimizer: M) -> Self {
        let geometry = CherenkovGeometry::new(params.vgroup);
        let evaluator = PandelPsiEvaluator::new(geometry, params.medium, params.penalty);
        Chi2Fitter {
            params,
            minimizer,
            geometry,
            evaluator,
            config_logged: AtomicBool::new(false),
        }
    }

    pub fn params(&self) -> &FitParams {
        &self.params
    }

    pub fn evaluator(&self) -> &PandelPsiEvaluator {
        &self.evaluator
    }

    /// Gather the candidate hits of a first guess track.
    ///
    /// Arguments
    /// -----------------
    /// * `event`: the event holding the hits.
    /// * `track`: the first guess track.
    ///
    /// Return
    /// ----------
    /// * `Ok(None)` if the track has no associated optical module hit, so no subsystem
    ///   can be inferred (associated modes only).
    /// * `Ok(Some(candidate))` otherwise, with ids of the good hits and the name suffix.
    /// * [`PandelFitError::UnknownHit`] if the track refers to a hit absent from the event.
    pub fn select_hits<E: EventStore + ?Sized>(
        &self,
        event: &E,
        track: &FirstGuessTrack,
    ) -> Result<Option<CandidateHits>, PandelFitError> {
        let all_usable = |keep: &dyn Fn(DetectorKind) -> bool| -> Vec<HitId> {
            event
                .hits()
                .iter()
                .enumerate()
                .filter(|(_, h)| is_usable(h) && h.kind().is_some_and(keep))
                .map(|(id, _)| id)
                .collect()
        };

        if self.params.hit_selection == HitSelection::All {
            return Ok(Some(CandidateHits {
                ids: all_usable(&|_| true),
                suffix: 'C',
            }));
        }

        let mut amanda = false;
        let mut inice = false;
        let mut associated = Vec::with_capacity(track.n_hits());
        for &id in &track.hits {
            let hit = event.hit(id).ok_or(PandelFitError::UnknownHit(id))?;
            match hit.kind() {
                Some(DetectorKind::Amanda) => amanda = true,
                Some(DetectorKind::InIce) => inice = true,
                None => continue,
            }
            if hit.is_alive() {
                associated.push(id);
            }
        }

        let Some(suffix) = subsystem_suffix(amanda, inice) else {
            return Ok(None);
        };

        let ids = match self.params.hit_selection {
            HitSelection::AssociatedOnly => associated,
            _ => all_usable(&|kind| match kind {
                DetectorKind::Amanda => amanda,
                DetectorKind::InIce => inice,
            }),
        };
        Ok(Some(CandidateHits { ids, suffix }))
    }

    /// Seed values, steps and bounds of `(r0x, r0y, r0z, theta, phi, t0)`.
    pub fn seed_parameters(&self, epoch: Epoch, track: &FirstGuessTrack) -> ParameterSet {
        let r0 = track.reference_point;
        let (theta, phi) = angles_from_direction(&track.direction);
        let t0 = (track.timestamp - epoch).to_unit(Unit::Nanosecond);

        ParameterSet::from_buf([
            ParameterSpec::free("r0x", r0.x, 0.1),
            ParameterSpec::free("r0y", r0.y, 0.1),
            ParameterSpec::free("r0z", r0.z, 0.1),
            ParameterSpec::bounded("theta", theta, 0.001, 0.0, PI),
            ParameterSpec::bounded("phi", phi, 0.001, 0.0, TAU),
            ParameterSpec::bounded("t0", t0, 1.0, 0.0, T0_MAX),
        ])
    }

    fn minimize(
        &self,
        objective: &dyn Objective,
        parameters: &[ParameterSpec],
    ) -> Result<(SimplexOutcome, HesseOutcome), PandelFitError> {
        let simplex = self.minimizer.simplex(objective, parameters)?;
        let hesse = self.minimizer.hesse(objective, parameters, &simplex.values);

        if simplex.status != 0 || hesse.status != 0 {
            if self.params.warnings() {
                warn!(ierfit = simplex.status, iererr = hesse.status, "minimization did not fully converge");
            } else {
                debug!(ierfit = simplex.status, iererr = hesse.status, "minimization did not fully converge");
            }
        }
        Ok((simplex, hesse))
    }

    /// Fit one first guess track of `event`.
    ///
    /// Return
    /// ----------
    /// * [`FitAttempt::Rejected`] when fewer than 7 usable hits are found.
    /// * [`FitAttempt::Fitted`] with a track whose id is not yet assigned (0).
    pub fn fit_candidate<E: EventStore + ?Sized>(
        &self,
        event: &E,
        track: &FirstGuessTrack,
    ) -> Result<FitAttempt, PandelFitError> {
        let mut state = FitState::Idle;

        let candidate = match self.select_hits(event, track)? {
            Some(c) if c.ids.len() >= MIN_FIT_HITS => c,
            other => {
                let n_hits = other.map_or(0, |c| c.ids.len());
                debug!(parent = track.id, n_hits, ?state, "candidate rejected");
                return Ok(FitAttempt::Rejected {
                    parent: track.id,
                    n_hits,
                });
            }
        };
        state = FitState::HitsSelected;

        let hits: Vec<&Hit> = candidate
            .ids
            .iter()
            .map(|&id| event.hit(id).ok_or(PandelFitError::UnknownHit(id)))
            .collect::<Result<_, _>>()?;
        debug!(parent = track.id, n_hits = hits.len(), ?state, "candidate hits selected");

        let parameters = self.seed_parameters(event.epoch(), track);
        state = FitState::Minimizing;
        debug!(parent = track.id, ?state, "starting minimization");
        let (simplex, hesse) = match self.params.objective {
            ObjectiveKind::ChiSquare => {
                self.minimize(&ChiSquareObjective::new(&hits, self.geometry), &parameters)?
            }
            ObjectiveKind::PandelPsi => self.minimize(
                &PandelLikelihoodObjective::new(&hits, &self.evaluator),
                &parameters,
            )?,
        };
        state = FitState::Converged;

        let fitted = TrackParameters::from_fit_vector(&simplex.values);
        let mut psi_stats = PsiStatistics::new();
        self.evaluator
            .total_psi(&fitted, hits.iter().copied(), &mut psi_stats)?;
        let fit_details = FitStatistics::new(&simplex, &hesse, &psi_stats.summary());

        let err = &hesse.errors;
        let result = FittedTrack {
            id: 0,
            name: format!("{}{}", self.params.track_name, candidate.suffix),
            charge: self.params.charge,
            parent: track.id,
            reference_point: fitted.r0,
            position_errors: Vector3::new(err[0], err[1], err[2]),
            direction: fitted.direction,
            theta_error: err[3],
            phi_error: err[4],
            t0: fitted.t0,
            timestamp: event.epoch() + fitted.t0 * Unit::Nanosecond,
            hits: candidate.ids,
            fit_details,
        };

        if self.params.verbose() {
            info!(parent = track.id, name = %result.name, ?state, "{fit_details}");
        }
        Ok(FitAttempt::Fitted(Box::new(result)))
    }

    fn log_configuration_once(&self) {
        if !self.config_logged.swap(true, Ordering::Relaxed) {
            info!("chi-squared track fit configuration\n{:#}", self.params);
        }
    }

    /// Fit the selected first guess tracks of one event and publish the results in it.
    ///
    /// Events rejected by the upstream selector are left untouched and yield no report.
    pub fn process_event<E: EventStore + ?Sized>(
        &self,
        event: &mut E,
    ) -> Result<Vec<FitReport>, PandelFitError> {
        if !event.is_selected() {
            debug!("event rejected by the event selector, skipped");
            return Ok(Vec::new());
        }
        self.log_configuration_once();
        event.add_processor_record(self.processor_record());

        let mut attempts = Vec::new();
        {
            let snapshot: &E = event;
            for selection in self.params.first_guess_selections() {
                let tracks = snapshot.tracks_named(&selection.name);
                let n = selection.max.map_or(tracks.len(), |m| m.min(tracks.len()));
                for track in tracks.into_iter().take(n) {
                    attempts.push(self.fit_candidate(snapshot, track)?);
                }
            }
        }

        let mut n_reco = event.n_reco_tracks();
        let reports = attempts
            .into_iter()
            .map(|attempt| match attempt {
                FitAttempt::Rejected { parent, n_hits } => FitReport {
                    parent,
                    n_hits,
                    state: FitState::Rejected,
                    track_id: None,
                    fit_details: None,
                },
                FitAttempt::Fitted(mut track) => {
                    n_reco += 1;
                    track.id = n_reco as TrackId;
                    let report = FitReport {
                        parent: track.parent,
                        n_hits: track.n_hits(),
                        state: FitState::Published,
                        track_id: Some(track.id),
                        fit_details: Some(track.fit_details),
                    };
                    event.add_track(*track);
                    report
                }
            })
            .collect();
        Ok(reports)
    }

    fn processor_record(&self) -> ProcessorRecord {
        self.params.processor_record()
    }
}

impl<M: Minimizer + Sync> Chi2Fitter<M> {
    /// Process independent events in parallel.
    ///
    /// Return
    /// ----------
    /// * One result per event, in input order.
    pub fn process_events<E: EventStore + Send>(
        &self,
        events: &mut [E],
    ) -> Vec<Result<Vec<FitReport>, PandelFitError>> {
        events
            .par_iter_mut()
            .map(|event| self.process_event(event))
            .collect()
    }
}
