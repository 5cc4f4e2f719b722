use hifitime::Epoch;
use nalgebra::Vector3;

use crate::constants::{HitId, TrackId};

/// A first guess track produced by an upstream reconstruction (e.g. a direct walk).
///
/// The fitter only reads it: the reference point and its time stamp, the direction of
/// flight and the ids of the hits associated with it.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstGuessTrack {
    pub id: TrackId,
    pub name: String,
    pub reference_point: Vector3<f64>,
    pub timestamp: Epoch,
    pub direction: Vector3<f64>,
    pub hits: Vec<HitId>,
}

impl FirstGuessTrack {
    pub fn new(
        id: TrackId,
        name: impl Into<String>,
        reference_point: Vector3<f64>,
        timestamp: Epoch,
        direction: Vector3<f64>,
    ) -> Self {
        FirstGuessTrack {
            id,
            name: name.into(),
            reference_point,
            timestamp,
            direction,
            hits: Vec::new(),
        }
    }

    pub fn with_hits(mut self, hits: impl IntoIterator<Item = HitId>) -> Self {
        self.hits.extend(hits);
        self
    }

    pub fn n_hits(&self) -> usize {
        self.hits.len()
    }
}
