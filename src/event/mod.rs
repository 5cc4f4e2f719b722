//! # Event model consumed and fed by the fitter
//!
//! The fitter does not own events. It reads hits and first guess tracks from an
//! [`EventStore`] and publishes its fitted tracks back into it.
//!
//! ## Overview
//!
//! - [`Hit`] – calibrated hit with its owning [`OpticalModule`] and dead channel flags
//! - [`DetectorKind`] – subsystem tag of an optical module (Amanda OM or InIce DOM)
//! - [`FirstGuessTrack`] – input trajectory estimate with its associated hits
//! - [`EventStore`] – read/publish interface used by the fitter
//! - [`IceEvent`] – in-memory implementation of [`EventStore`]
//! - [`ProcessorRecord`] – named slot record describing the settings a processor ran with
//!
//! Hits are addressed by their index in the event ([`HitId`]).

pub mod hit;
pub mod track;

use hifitime::Epoch;
use smallvec::SmallVec;

use crate::{
    constants::{HitId, TrackId},
    fit_result::FittedTrack,
};

pub use hit::{Channel, DeadChannels, DetectorKind, Hit, OpticalModule};
pub use track::FirstGuessTrack;

/// Named scalar slots describing the parameters a processor was run with.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorRecord {
    pub name: String,
    pub slots: SmallVec<[(String, f64); 4]>,
}

impl ProcessorRecord {
    pub fn new(name: impl Into<String>) -> Self {
        ProcessorRecord {
            name: name.into(),
            slots: SmallVec::new(),
        }
    }

    pub fn with_slot(mut self, slot: impl Into<String>, value: f64) -> Self {
        self.slots.push((slot.into(), value));
        self
    }

    pub fn get(&self, slot: &str) -> Option<f64> {
        self.slots
            .iter()
            .find(|(name, _)| name == slot)
            .map(|(_, value)| *value)
    }
}

/// Access to an event as needed by the fitter.
///
/// Implementors expose the event time stamp, the upstream selection decision, the hits,
/// the first guess tracks by name, and accept the fitted tracks and processor records.
pub trait EventStore {
    /// Time stamp of the event; hit times are relative to it.
    fn epoch(&self) -> Epoch;

    /// `false` if an upstream event selector rejected this event.
    fn is_selected(&self) -> bool;

    fn hits(&self) -> &[Hit];

    fn hit(&self, id: HitId) -> Option<&Hit> {
        self.hits().get(id)
    }

    /// First guess tracks with the given name, in insertion order.
    fn tracks_named(&self, name: &str) -> Vec<&FirstGuessTrack>;

    /// Number of reconstructed tracks already present in the event.
    fn n_reco_tracks(&self) -> usize;

    fn add_track(&mut self, track: FittedTrack);

    fn add_processor_record(&mut self, record: ProcessorRecord);
}

/// In-memory event.
#[derive(Debug, Clone)]
pub struct IceEvent {
    epoch: Epoch,
    selected: bool,
    hits: Vec<Hit>,
    first_guess: Vec<FirstGuessTrack>,
    fitted: Vec<FittedTrack>,
    records: Vec<ProcessorRecord>,
}

impl IceEvent {
    pub fn new(epoch: Epoch) -> Self {
        IceEvent {
            epoch,
            selected: true,
            hits: Vec::new(),
            first_guess: Vec::new(),
            fitted: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Store a hit and return its id.
    pub fn add_hit(&mut self, hit: Hit) -> HitId {
        self.hits.push(hit);
        self.hits.len() - 1
    }

    pub fn add_first_guess(&mut self, track: FirstGuessTrack) {
        self.first_guess.push(track);
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn fitted_tracks(&self) -> &[FittedTrack] {
        &self.fitted
    }

    /// Fitted tracks whose name matches exactly (including the subsystem suffix).
    pub fn fitted_tracks_named(&self, name: &str) -> Vec<&FittedTrack> {
        self.fitted.iter().filter(|t| t.name == name).collect()
    }

    pub fn processor_record(&self, name: &str) -> Option<&ProcessorRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn next_track_id(&self) -> TrackId {
        (self.n_reco_tracks() + 1) as TrackId
    }
}

impl EventStore for IceEvent {
    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn hits(&self) -> &[Hit] {
        &self.hits
    }

    fn tracks_named(&self, name: &str) -> Vec<&FirstGuessTrack> {
        self.first_guess.iter().filter(|t| t.name == name).collect()
    }

    fn n_reco_tracks(&self) -> usize {
        self.first_guess.len() + self.fitted.len()
    }

    fn add_track(&mut self, track: FittedTrack) {
        self.fitted.push(track);
    }

    fn add_processor_record(&mut self, record: ProcessorRecord) {
        self.records.push(record);
    }
}

#[cfg(test)]
mod event_tests {
    use super::*;
    use hifitime::Epoch;
    use nalgebra::Vector3;

    #[test]
    fn test_hit_ids_are_indices() {
        let mut evt = IceEvent::new(Epoch::from_gregorian_utc_at_midnight(2008, 6, 1));
        let module = OpticalModule::new(DetectorKind::Amanda, Vector3::zeros());
        let a = evt.add_hit(Hit::new(module, 1.0));
        let b = evt.add_hit(Hit::new(module, 2.0));
        assert_eq!((a, b), (0, 1));
        assert_eq!(evt.hit(b).map(|h| h.le), Some(2.0));
        assert!(evt.hit(5).is_none());
    }

    #[test]
    fn test_tracks_named_and_counts() {
        let epoch = Epoch::from_gregorian_utc_at_midnight(2008, 6, 1);
        let mut evt = IceEvent::new(epoch);
        for (id, name) in [(1, "IceDwalkI"), (2, "IceDwalkA"), (3, "IceDwalkI")] {
            evt.add_first_guess(FirstGuessTrack::new(
                id,
                name,
                Vector3::zeros(),
                epoch,
                Vector3::z(),
            ));
        }
        let ids: Vec<TrackId> = evt.tracks_named("IceDwalkI").iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(evt.n_reco_tracks(), 3);
        assert_eq!(evt.next_track_id(), 4);
    }

    #[test]
    fn test_processor_record_slots() {
        let rec = ProcessorRecord::new("IceChi2")
            .with_slot("Selhits", 2.0)
            .with_slot("Penalty", 0.5);
        assert_eq!(rec.get("Penalty"), Some(0.5));
        assert_eq!(rec.get("Vgroup"), None);
    }
}
