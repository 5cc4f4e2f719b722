//! # Cherenkov track geometry
//!
//! Maps a straight track hypothesis and a hit position onto the two quantities every
//! likelihood in this crate is built from:
//!
//! * the **perpendicular distance** `d` between the hit and the track line,
//! * the **geometric arrival time** `tgeo` of direct (unscattered) Cherenkov light.
//!
//! ## Model
//!
//! A track is defined by a reference point `r0`, a unit direction `p` and the time `t0`
//! at which the particle passes `r0`. Light is emitted on the Cherenkov cone with opening
//! angle `thetac = acos(1/n_phase)`. Since the detected photons travel with the group
//! velocity rather than the phase velocity, the effective cone is reduced by
//!
//! ```text
//! alphac = atan((1 - n_phase/n_group) / sqrt(n_phase² - 1))
//! ```
//!
//! which can be switched off. The path length used for the arrival time is
//!
//! ```text
//! dist = p·(r_hit - r0) + d / tan(π/2 - thetac - alphac)
//! tgeo = t0 + dist / c
//! ```
//!
//! All distances are in meters and times in nanoseconds.
//!
//! ## See also
//!
//! * [`ChiSquareObjective`](crate::objective::chi2::ChiSquareObjective) – chi-squared built on [`CherenkovGeometry::project`].
//! * [`PandelPsiEvaluator`](crate::cpandel::PandelPsiEvaluator) – Convoluted Pandel scoring of the same residuals.

use nalgebra::Vector3;
use std::f64::consts::TAU;

use crate::{
    constants::{Meter, Nanosecond, Radian, C_VACUUM, HALF_PI, N_GROUP, N_PHASE, N_TRACK_PARAMS},
    event::Hit,
};

/// Unit vector for polar angle `theta` and azimuth `phi`.
pub fn direction_from_angles(theta: Radian, phi: Radian) -> Vector3<f64> {
    let (st, ct) = theta.sin_cos();
    let (sp, cp) = phi.sin_cos();
    Vector3::new(st * cp, st * sp, ct)
}

/// Polar angle in `[0, π]` and azimuth in `[0, 2π)` of a (not necessarily normalized) vector.
///
/// A null vector yields `(0, 0)`.
pub fn angles_from_direction(direction: &Vector3<f64>) -> (Radian, Radian) {
    let norm = direction.norm();
    if norm <= 0.0 {
        return (0.0, 0.0);
    }
    let theta = (direction.z / norm).clamp(-1.0, 1.0).acos();
    (theta, wrap_azimuth(direction.y.atan2(direction.x)))
}

/// A straight track hypothesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackParameters {
    pub r0: Vector3<f64>,
    /// Unit direction of flight
    pub direction: Vector3<f64>,
    /// Passage time at `r0`, relative to the event time stamp
    pub t0: Nanosecond,
}

impl TrackParameters {
    /// Build a track; the direction is normalized (a null direction is kept as is).
    pub fn new(r0: Vector3<f64>, direction: Vector3<f64>, t0: Nanosecond) -> Self {
        let direction = direction.try_normalize(0.0).unwrap_or(direction);
        TrackParameters { r0, direction, t0 }
    }

    /// Build a track from the minimizer vector `(x, y, z, theta, phi, t0)`.
    ///
    /// Arguments
    /// -----------------
    /// * `x`: slice of at least 6 values in the order above.
    ///
    /// Return
    /// ----------
    /// * The corresponding [`TrackParameters`], direction built with [`direction_from_angles`].
    pub fn from_fit_vector(x: &[f64]) -> Self {
        TrackParameters {
            r0: Vector3::new(x[0], x[1], x[2]),
            direction: direction_from_angles(x[3], x[4]),
            t0: x[5],
        }
    }

    /// Inverse of [`TrackParameters::from_fit_vector`].
    pub fn to_fit_vector(&self) -> [f64; N_TRACK_PARAMS] {
        let (theta, phi) = self.angles();
        [self.r0.x, self.r0.y, self.r0.z, theta, phi, self.t0]
    }

    pub fn angles(&self) -> (Radian, Radian) {
        angles_from_direction(&self.direction)
    }

    /// Perpendicular distance of `position` to the track line.
    pub fn distance(&self, position: &Vector3<f64>) -> Meter {
        (position - self.r0).cross(&self.direction).norm()
    }
}

/// Result of projecting a hit position onto a track hypothesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Perpendicular distance between hit and track (m)
    pub distance: Meter,
    /// Expected arrival time of direct Cherenkov light (ns)
    pub tgeo: Nanosecond,
}

/// Cherenkov light propagation model, with or without the phase/group velocity correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CherenkovGeometry {
    vgroup: bool,
    alphac: Radian,
    inv_tan_cone: f64,
}

impl CherenkovGeometry {
    pub fn new(vgroup: bool) -> Self {
        let alphac = if vgroup {
            ((1.0 - N_PHASE / N_GROUP) / (N_PHASE * N_PHASE - 1.0).sqrt()).atan()
        } else {
            0.0
        };
        let inv_tan_cone = 1.0 / (HALF_PI - Self::cherenkov_angle() - alphac).tan();
        CherenkovGeometry {
            vgroup,
            alphac,
            inv_tan_cone,
        }
    }

    /// Cherenkov angle `acos(1/n_phase)` in radians.
    pub fn cherenkov_angle() -> Radian {
        (1.0 / N_PHASE).acos()
    }

    /// Angular reduction of the cone complement due to the v_phase/v_group difference.
    pub fn alphac(&self) -> Radian {
        self.alphac
    }

    pub fn uses_vgroup(&self) -> bool {
        self.vgroup
    }

    /// Distance and geometric arrival time of a hit position for a track hypothesis.
    ///
    /// Arguments
    /// -----------------
    /// * `track`: the track hypothesis.
    /// * `position`: hit (optical module) position.
    ///
    /// Return
    /// ----------
    /// * A [`Projection`] with the perpendicular distance and `tgeo`.
    pub fn project(&self, track: &TrackParameters, position: &Vector3<f64>) -> Projection {
        let d = track.distance(position);
        let dist = track.direction.dot(&(position - track.r0)) + d * self.inv_tan_cone;
        Projection {
            distance: d,
            tgeo: track.t0 + dist / C_VACUUM,
        }
    }

    /// Project a hit and compute its time residual `le - tgeo`.
    ///
    /// Returns `None` for hits without an owning module.
    pub fn residual(&self, track: &TrackParameters, hit: &Hit) -> Option<(Projection, Nanosecond)> {
        let position = hit.position()?;
        let proj = self.project(track, &position);
        Some((proj, hit.le - proj.tgeo))
    }
}

impl Default for CherenkovGeometry {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Wrap an azimuth into `[0, 2π)`.
pub(crate) fn wrap_azimuth(phi: Radian) -> Radian {
    let wrapped = phi.rem_euclid(TAU);
    // rem_euclid rounds up to exactly 2π for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
