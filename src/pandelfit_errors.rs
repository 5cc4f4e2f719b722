use thiserror::Error;

use crate::constants::HitId;

#[derive(Error, Debug)]
pub enum PandelFitError {
    #[error("Invalid fit parameter: {0}")]
    InvalidFitParameter(String),

    #[error("Minimizer failure: {0}")]
    Minimizer(String),

    #[error(
        "Point (ksi={ksi}, tres={tres}) not covered by any Convoluted Pandel region after clamping"
    )]
    RegionPartition { ksi: f64, tres: f64 },

    #[error("Unknown fit statistic slot: {0}")]
    UnknownFitStatistic(String),

    #[error("Hit {0} referenced by a track is not present in the event")]
    UnknownHit(HitId),
}

impl From<argmin::core::Error> for PandelFitError {
    fn from(err: argmin::core::Error) -> Self {
        PandelFitError::Minimizer(err.to_string())
    }
}

impl PartialEq for PandelFitError {
    fn eq(&self, other: &Self) -> bool {
        use PandelFitError::*;
        match (self, other) {
            (InvalidFitParameter(a), InvalidFitParameter(b)) => a == b,
            (Minimizer(a), Minimizer(b)) => a == b,
            (
                RegionPartition { ksi: k1, tres: t1 },
                RegionPartition { ksi: k2, tres: t2 },
            ) => k1.to_bits() == k2.to_bits() && t1.to_bits() == t2.to_bits(),
            (UnknownFitStatistic(a), UnknownFitStatistic(b)) => a == b,
            (UnknownHit(a), UnknownHit(b)) => a == b,
            _ => false,
        }
    }
}
